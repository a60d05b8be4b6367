pub mod analytics;
pub mod app;
pub mod config;
pub mod database;
pub mod display;
pub mod error;
pub mod export;
pub mod models;

pub use error::SrsError;
pub use models::sm2::{calculate_next_review, compute_next_state};
pub use models::{
    DueCandidate, DueSet, MasteryStage, Quality, ReviewSession, SchedulingState, Word, select_due,
};
