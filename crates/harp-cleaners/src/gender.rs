//! Gender cleaner: token matching over English and Somali gender words.

use crate::{tokenize, Classifier, MatchResult};

const FEMALE_TOKENS: &[&str] = &[
    "female", "f", "woman", "girl", "lady", "naag", "dumar", "gabar", "gabadh",
];
const MALE_TOKENS: &[&str] = &["male", "m", "man", "boy", "nin", "wiil", "rag"];

/// Classifies free-text gender answers to the match values `female` and
/// `male`. A text matching tokens from both sets is not classifiable.
pub struct GenderCleaner;

impl Classifier for GenderCleaner {
    fn name(&self) -> &'static str {
        "gender"
    }

    fn classify(&self, text: &str) -> MatchResult {
        let tokens = tokenize(text);
        let female = tokens.iter().any(|t| FEMALE_TOKENS.contains(&t.as_str()));
        let male = tokens.iter().any(|t| MALE_TOKENS.contains(&t.as_str()));
        match (female, male) {
            (true, false) => MatchResult::Matched("female".to_string()),
            (false, true) => MatchResult::Matched("male".to_string()),
            _ => MatchResult::NotCoded,
        }
    }
}
