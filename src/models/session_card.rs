//! Wrapper for words that tracks progress inside one review session.
use super::Word;
use chrono::{DateTime, Utc};

#[derive(Clone, Debug)]
pub struct SessionCard {
    pub word: Word,
    pub passed: bool,
    pub last_graded_at: Option<DateTime<Utc>>,
}

impl SessionCard {
    pub fn new(word: Word) -> Self {
        Self {
            word,
            passed: false,
            last_graded_at: None,
        }
    }

    pub fn mark_graded(&mut self, passed: bool, at: DateTime<Utc>) {
        self.passed = passed;
        self.last_graded_at = Some(at);
    }
}
