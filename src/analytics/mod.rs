pub mod stats;

pub use stats::{
    ChallengingWord, DailyActivity, LearnerStats, MAX_ACTIVITY_DAYS, challenging_words,
    learner_stats, review_activity,
};
