pub mod due;
pub mod mastery_stage;
pub mod quality;
pub mod review_event;
pub mod review_session;
pub mod scheduling_state;
pub mod session_card;
pub mod sm2;
pub mod word;

pub use due::{DueCandidate, DueSet, Schedulable, default_exclusions, is_due_at, select_due};
pub use mastery_stage::MasteryStage;
pub use quality::Quality;
pub use review_event::ReviewEvent;
pub use review_session::ReviewSession;
pub use scheduling_state::{DEFAULT_EASE_FACTOR, MIN_EASE_FACTOR, SchedulingState};
pub use session_card::SessionCard;
pub use word::Word;
