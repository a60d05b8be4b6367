use super::due::is_due_at;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Ease factor assigned to a word when it enters a learner's collection.
pub const DEFAULT_EASE_FACTOR: f64 = 2.5;

/// Hard lower bound on the ease factor.
pub const MIN_EASE_FACTOR: f64 = 1.3;

/// SM-2 memory parameters for one learnable item.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SchedulingState {
    pub ease_factor: f64,
    pub repetition_count: u32,
    pub interval_days: u32,
    /// `None` until the first review: the item is due immediately.
    pub next_review_at: Option<DateTime<Utc>>,
    pub last_reviewed_at: Option<DateTime<Utc>>,
}

impl Default for SchedulingState {
    fn default() -> Self {
        Self {
            ease_factor: DEFAULT_EASE_FACTOR,
            repetition_count: 0,
            interval_days: 0,
            next_review_at: None,
            last_reviewed_at: None,
        }
    }
}

impl SchedulingState {
    pub fn is_new(&self) -> bool {
        self.next_review_at.is_none()
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        is_due_at(self.next_review_at, now)
    }
}
