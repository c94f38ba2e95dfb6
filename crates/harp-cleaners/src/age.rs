//! Age cleaner: digit extraction with a plausibility range filter.

use crate::{tokenize, Classifier, MatchResult};

/// Ages below this are assumed to be mis-keyed or not about the
/// respondent.
const MIN_AGE: u32 = 10;
/// Ages at or above this are assumed implausible for an SMS respondent.
const MAX_AGE: u32 = 100;

/// Extracts an age from free text. The first integer token in the
/// plausible range `[10, 100)` wins; anything else is not classifiable.
/// The matched value is the age in decimal, matching age-scheme match
/// values.
pub struct AgeCleaner;

impl Classifier for AgeCleaner {
    fn name(&self) -> &'static str {
        "age"
    }

    fn classify(&self, text: &str) -> MatchResult {
        for token in tokenize(text) {
            if let Ok(age) = token.parse::<u32>() {
                if (MIN_AGE..MAX_AGE).contains(&age) {
                    return MatchResult::Matched(age.to_string());
                }
                tracing::debug!(age, "age out of plausible range");
                return MatchResult::NotCoded;
            }
        }
        MatchResult::NotCoded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_plain_and_embedded_ages() {
        let cleaner = AgeCleaner;
        assert_eq!(cleaner.classify("25"), MatchResult::Matched("25".to_string()));
        assert_eq!(
            cleaner.classify("I am 34 years old"),
            MatchResult::Matched("34".to_string())
        );
    }

    #[test]
    fn out_of_range_is_not_coded() {
        let cleaner = AgeCleaner;
        assert_eq!(cleaner.classify("9"), MatchResult::NotCoded);
        assert_eq!(cleaner.classify("100"), MatchResult::NotCoded);
        assert_eq!(cleaner.classify("250"), MatchResult::NotCoded);
    }

    #[test]
    fn boundary_ages() {
        let cleaner = AgeCleaner;
        assert_eq!(cleaner.classify("10"), MatchResult::Matched("10".to_string()));
        assert_eq!(cleaner.classify("99"), MatchResult::Matched("99".to_string()));
    }

    #[test]
    fn no_digits_is_not_coded() {
        let cleaner = AgeCleaner;
        assert_eq!(cleaner.classify("twenty five"), MatchResult::NotCoded);
        assert_eq!(cleaner.classify(""), MatchResult::NotCoded);
    }
}
