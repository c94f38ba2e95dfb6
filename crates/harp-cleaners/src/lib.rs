//! # harp-cleaners — Pluggable Text Classifiers
//!
//! Cleaners are the automatic-coding step's classification functions:
//! pure `text → MatchResult` mappings from a raw survey answer to a match
//! value resolvable in the bound code scheme, or a "could not classify"
//! sentinel.
//!
//! Cleaners are injected by name: coding configurations reference a
//! registry name, and the auto-coding phase looks the implementation up
//! in a [`CleanerRegistry`]. Implementations are capability objects
//! behind the [`Classifier`] trait — adding a project-specific cleaner
//! means registering one more implementation, not touching the engine.

use std::collections::HashMap;
use std::sync::Arc;

pub mod age;
pub mod gender;
pub mod operator;
pub mod yes_no;

pub use age::AgeCleaner;
pub use gender::GenderCleaner;
pub use operator::PhoneOperatorCleaner;
pub use yes_no::YesNoCleaner;

/// The outcome of classifying one raw text value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchResult {
    /// The text resolved to a code's match value.
    Matched(String),
    /// The text could not be classified; the coded field becomes the
    /// scheme's not-coded control code.
    NotCoded,
}

/// A pure classification function from raw text to a match value.
pub trait Classifier: Send + Sync {
    /// The registry name coding configurations reference.
    fn name(&self) -> &'static str;

    /// Classify one raw text value.
    fn classify(&self, text: &str) -> MatchResult;
}

/// Name-based lookup of the cleaners available to a run.
pub struct CleanerRegistry {
    cleaners: HashMap<&'static str, Arc<dyn Classifier>>,
}

impl CleanerRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            cleaners: HashMap::new(),
        }
    }

    /// A registry holding the standard cleaners: `gender`, `age`,
    /// `yes_no`, and `phone_operator` with its default prefix table.
    pub fn with_default_cleaners() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(GenderCleaner));
        registry.register(Arc::new(AgeCleaner));
        registry.register(Arc::new(YesNoCleaner));
        registry.register(Arc::new(PhoneOperatorCleaner::with_default_prefixes()));
        registry
    }

    /// Register a cleaner under its own name. A later registration with
    /// the same name replaces the earlier one.
    pub fn register(&mut self, cleaner: Arc<dyn Classifier>) {
        self.cleaners.insert(cleaner.name(), cleaner);
    }

    /// Look up a cleaner by registry name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Classifier>> {
        self.cleaners.get(name).map(Arc::clone)
    }

    /// The registered cleaner names, for diagnostics.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.cleaners.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

impl Default for CleanerRegistry {
    fn default() -> Self {
        Self::with_default_cleaners()
    }
}

/// Lowercase, strip punctuation to spaces, and split into tokens.
/// Shared by the token-matching cleaners.
pub(crate) fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}
