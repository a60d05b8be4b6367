//! Errors raised by the scheduling engine itself.
//!
//! The engine has exactly one failure mode: a quality score outside `0..=5`.
//! Storage, configuration and import failures live with the host modules.

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SrsError {
    /// Quality was outside the closed range `[0, 5]`.
    #[error("quality must be between 0 and 5, got {0}")]
    InvalidQuality(i64),
}
