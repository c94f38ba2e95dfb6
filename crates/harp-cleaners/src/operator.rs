//! Phone-operator cleaner: longest-prefix match over a configurable
//! operator prefix table.

use crate::{Classifier, MatchResult};

/// Classifies a phone number to its mobile operator's match value by
/// prefix, after stripping formatting and the country code.
pub struct PhoneOperatorCleaner {
    /// (number prefix, operator match value), matched longest-first.
    prefixes: Vec<(String, String)>,
    country_code: String,
}

impl PhoneOperatorCleaner {
    /// Build a cleaner with an explicit prefix table and country code.
    pub fn new(
        mut prefixes: Vec<(String, String)>,
        country_code: impl Into<String>,
    ) -> Self {
        // Longest prefix first so "252" style overlaps resolve correctly.
        prefixes.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        Self {
            prefixes,
            country_code: country_code.into(),
        }
    }

    /// The Somali operator table used by the radio-survey projects.
    pub fn with_default_prefixes() -> Self {
        let table = [
            ("61", "hormud"),
            ("77", "hormud"),
            ("63", "telesom"),
            ("65", "somtel"),
            ("62", "somtel"),
            ("90", "golis"),
            ("68", "nationlink"),
        ];
        Self::new(
            table
                .iter()
                .map(|(p, o)| ((*p).to_string(), (*o).to_string()))
                .collect(),
            "252",
        )
    }
}

impl Classifier for PhoneOperatorCleaner {
    fn name(&self) -> &'static str {
        "phone_operator"
    }

    fn classify(&self, text: &str) -> MatchResult {
        let digits: String = text.chars().filter(char::is_ascii_digit).collect();
        if digits.is_empty() {
            return MatchResult::NotCoded;
        }
        let national = digits
            .strip_prefix(&self.country_code)
            .unwrap_or(&digits)
            .trim_start_matches('0');

        for (prefix, operator) in &self.prefixes {
            if national.starts_with(prefix.as_str()) {
                return MatchResult::Matched(operator.clone());
            }
        }
        MatchResult::NotCoded
    }
}
