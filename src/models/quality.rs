//! Recall quality reported by the learner for a single review.
//!
//! 0 = complete blackout, 1 = wrong but familiar once shown, 2 = wrong but
//! easy to remember once shown, 3 = correct with serious difficulty,
//! 4 = correct after hesitation, 5 = perfect immediate recall.

use crate::error::SrsError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A validated quality score in `[0, 5]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Quality(u8);

impl Quality {
    pub const BLACKOUT: Quality = Quality(0);
    pub const WRONG: Quality = Quality(1);
    pub const HARD: Quality = Quality(2);
    pub const GOOD: Quality = Quality(3);
    pub const EASY: Quality = Quality(4);
    pub const PERFECT: Quality = Quality(5);

    pub const MAX: u8 = 5;

    pub fn new(value: i64) -> Result<Self, SrsError> {
        if (0..=i64::from(Self::MAX)).contains(&value) {
            Ok(Quality(value as u8))
        } else {
            Err(SrsError::InvalidQuality(value))
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// "Good" or better: the streak continues.
    pub fn is_pass(self) -> bool {
        self >= Self::GOOD
    }

    /// Iterates all six levels in ascending order.
    pub fn all() -> impl Iterator<Item = Quality> {
        (0..=Self::MAX).map(Quality)
    }
}

impl TryFrom<i64> for Quality {
    type Error = SrsError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Quality::new(value)
    }
}

impl From<Quality> for u8 {
    fn from(quality: Quality) -> u8 {
        quality.0
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_full_range() {
        for value in 0..=5 {
            assert_eq!(Quality::new(value).map(Quality::value), Ok(value as u8));
        }
    }

    #[test]
    fn test_rejects_out_of_range() {
        assert_eq!(Quality::new(-1), Err(SrsError::InvalidQuality(-1)));
        assert_eq!(Quality::new(6), Err(SrsError::InvalidQuality(6)));
        assert_eq!(Quality::new(i64::MAX), Err(SrsError::InvalidQuality(i64::MAX)));
    }

    #[test]
    fn test_pass_threshold() {
        assert!(!Quality::HARD.is_pass());
        assert!(Quality::GOOD.is_pass());
        assert!(Quality::PERFECT.is_pass());
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: Quality = serde_json::from_str("4").unwrap();
        assert_eq!(ok, Quality::EASY);
        assert!(serde_json::from_str::<Quality>("9").is_err());
    }
}
