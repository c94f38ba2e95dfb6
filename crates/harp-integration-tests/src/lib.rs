//! Cross-crate end-to-end tests for the HARP pipeline live in `tests/`.
