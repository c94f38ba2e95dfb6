//! Yes/no cleaner: token matching over English and Somali affirmations.

use crate::{tokenize, Classifier, MatchResult};

const YES_TOKENS: &[&str] = &["yes", "y", "haa", "ha", "yeah"];
const NO_TOKENS: &[&str] = &["no", "n", "maya", "mya"];

/// Classifies free-text answers to the match values `yes` and `no`.
/// A text matching both sets is not classifiable.
pub struct YesNoCleaner;

impl Classifier for YesNoCleaner {
    fn name(&self) -> &'static str {
        "yes_no"
    }

    fn classify(&self, text: &str) -> MatchResult {
        let tokens = tokenize(text);
        let yes = tokens.iter().any(|t| YES_TOKENS.contains(&t.as_str()));
        let no = tokens.iter().any(|t| NO_TOKENS.contains(&t.as_str()));
        match (yes, no) {
            (true, false) => MatchResult::Matched("yes".to_string()),
            (false, true) => MatchResult::Matched("no".to_string()),
            _ => MatchResult::NotCoded,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_affirmations() {
        let cleaner = YesNoCleaner;
        assert_eq!(cleaner.classify("Yes"), MatchResult::Matched("yes".to_string()));
        assert_eq!(cleaner.classify("haa"), MatchResult::Matched("yes".to_string()));
        assert_eq!(cleaner.classify("maya"), MatchResult::Matched("no".to_string()));
    }

    #[test]
    fn mixed_or_unknown_is_not_coded() {
        let cleaner = YesNoCleaner;
        assert_eq!(cleaner.classify("yes no"), MatchResult::NotCoded);
        assert_eq!(cleaner.classify("maybe"), MatchResult::NotCoded);
    }
}
