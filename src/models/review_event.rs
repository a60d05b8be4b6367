//! One accepted review, as appended to the review log.
use super::Quality;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReviewEvent {
    pub id: i64,
    pub word_id: i64,
    pub quality: Quality,
    pub ease_before: f64,
    pub ease_after: f64,
    pub interval_after: u32,
    pub reviewed_at: DateTime<Utc>,
}
