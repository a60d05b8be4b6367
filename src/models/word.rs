//! A vocabulary item in a learner's collection together with its
//! scheduling state.
use super::due::Schedulable;
use super::{MasteryStage, SchedulingState};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Word {
    pub id: i64,
    pub learner_id: i64,
    pub term: String,
    pub definition: String,
    pub language: String,
    pub part_of_speech: String,
    pub stage: MasteryStage,
    pub added_at: DateTime<Utc>,
    pub mastered_at: Option<DateTime<Utc>>,
    pub state: SchedulingState,
}

impl Schedulable for Word {
    fn id(&self) -> i64 {
        self.id
    }

    fn next_review_at(&self) -> Option<DateTime<Utc>> {
        self.state.next_review_at
    }

    fn mastery_stage(&self) -> MasteryStage {
        self.stage
    }
}
