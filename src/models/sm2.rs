//! SM-2 (SuperMemo 2) review outcome calculator.
//!
//! Turns a recall quality into updated memory parameters:
//! - Each word has an ease factor (EF) that adjusts after every review
//! - Quality 0-2: repetition streak resets, word comes back the next day
//! - Quality 3-5: interval grows 1 day → 6 days → previous interval × new EF
//! - EF never drops below 1.3
//!
//! Interval rounding is half away from zero (`f64::round`): prior interval 6
//! with a new EF of 2.6 gives `round(15.6) = 16` days.
//!
//! The calculator never reads the clock; callers pass `now`.

use super::{MIN_EASE_FACTOR, Quality, SchedulingState};
use crate::error::SrsError;
use chrono::{DateTime, Duration, Utc};

/// Interval after any failed review.
pub const FAILED_INTERVAL_DAYS: u32 = 1;
/// Interval after the first successful review in a streak.
pub const FIRST_INTERVAL_DAYS: u32 = 1;
/// Interval after the second successful review in a streak.
pub const SECOND_INTERVAL_DAYS: u32 = 6;
/// Upper bound on a scheduled interval (100 years).
pub const MAX_INTERVAL_DAYS: u32 = 36_500;

/// EF' = EF + (0.1 - (5 - q) * (0.08 + (5 - q) * 0.02)), floored at 1.3.
pub fn next_ease_factor(prior_ease: f64, quality: Quality) -> f64 {
    let q = f64::from(quality.value());
    let miss = 5.0 - q;
    let new_ease = prior_ease + (0.1 - miss * (0.08 + miss * 0.02));

    if new_ease < MIN_EASE_FACTOR || new_ease.is_nan() {
        MIN_EASE_FACTOR
    } else {
        new_ease
    }
}

/// Computes the state that follows `prior` after a review scored `quality` at `now`.
pub fn compute_next_state(
    quality: Quality,
    prior: &SchedulingState,
    now: DateTime<Utc>,
) -> SchedulingState {
    let new_ease = next_ease_factor(prior.ease_factor, quality);

    let (interval_days, repetition_count) = if !quality.is_pass() {
        (FAILED_INTERVAL_DAYS, 0)
    } else {
        let new_reps = prior.repetition_count.saturating_add(1);
        let new_int = match new_reps {
            1 => FIRST_INTERVAL_DAYS,
            2 => SECOND_INTERVAL_DAYS,
            // Compounds on the previous interval with the updated EF
            _ => grown_interval(prior.interval_days, new_ease),
        };
        (new_int, new_reps)
    };

    SchedulingState {
        ease_factor: new_ease,
        repetition_count,
        interval_days,
        next_review_at: Some(now + Duration::days(i64::from(interval_days))),
        last_reviewed_at: Some(now),
    }
}

/// Validating entry point for raw client input. Nothing is computed for an
/// out-of-range quality.
pub fn calculate_next_review(
    quality: i64,
    prior: &SchedulingState,
    now: DateTime<Utc>,
) -> Result<SchedulingState, SrsError> {
    let quality = Quality::new(quality)?;
    Ok(compute_next_state(quality, prior, now))
}

fn grown_interval(prior_interval: u32, ease: f64) -> u32 {
    let days = (f64::from(prior_interval) * ease).round();
    days.clamp(1.0, f64::from(MAX_INTERVAL_DAYS)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap()
    }

    fn state(ease: f64, reps: u32, interval: u32) -> SchedulingState {
        SchedulingState {
            ease_factor: ease,
            repetition_count: reps,
            interval_days: interval,
            next_review_at: Some(now()),
            last_reviewed_at: None,
        }
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_first_review() {
        let next = compute_next_state(Quality::EASY, &SchedulingState::default(), now());
        assert_eq!(next.interval_days, 1);
        assert_eq!(next.repetition_count, 1);
    }

    #[test]
    fn test_second_review() {
        let next = compute_next_state(Quality::EASY, &state(2.5, 1, 1), now());
        assert_eq!(next.interval_days, 6);
        assert_eq!(next.repetition_count, 2);
    }

    #[test]
    fn test_third_review_rounds_half_away_from_zero() {
        let next = compute_next_state(Quality::PERFECT, &state(2.5, 2, 6), now());
        assert_close(next.ease_factor, 2.6);
        assert_eq!(next.repetition_count, 3);
        assert_eq!(next.interval_days, 16);
    }

    #[test]
    fn test_growth_uses_updated_ease() {
        // q=3 lowers EF to 2.36 before multiplying: round(10 * 2.36) = 24
        let next = compute_next_state(Quality::GOOD, &state(2.5, 4, 10), now());
        assert_close(next.ease_factor, 2.36);
        assert_eq!(next.interval_days, 24);
    }

    #[test]
    fn test_quality_below_3_resets() {
        let next = compute_next_state(Quality::HARD, &state(2.5, 5, 10), now());
        assert_eq!(next.interval_days, 1);
        assert_eq!(next.repetition_count, 0);
        // EF should still be updated
        assert_close(next.ease_factor, 2.18);
    }

    #[test]
    fn test_ease_deltas_per_quality() {
        let expected = [-0.8, -0.54, -0.32, -0.14, 0.0, 0.1];
        for (quality, delta) in Quality::all().zip(expected) {
            assert_close(next_ease_factor(2.5, quality), 2.5 + delta);
        }
    }

    #[test]
    fn test_ef_floor() {
        let next = compute_next_state(Quality::BLACKOUT, &state(1.3, 1, 1), now());
        assert_eq!(next.ease_factor, MIN_EASE_FACTOR);
    }

    #[test]
    fn test_ef_floor_applies_to_prior_below_floor() {
        let next = compute_next_state(Quality::PERFECT, &state(0.5, 0, 0), now());
        assert_eq!(next.ease_factor, MIN_EASE_FACTOR);
    }

    #[test]
    fn test_zero_prior_interval_never_schedules_same_day() {
        let next = compute_next_state(Quality::PERFECT, &state(2.5, 2, 0), now());
        assert_eq!(next.interval_days, 1);
    }

    #[test]
    fn test_interval_is_capped() {
        let next = compute_next_state(Quality::PERFECT, &state(2.5, 9, MAX_INTERVAL_DAYS), now());
        assert_eq!(next.interval_days, MAX_INTERVAL_DAYS);
    }

    #[test]
    fn test_timestamps_follow_now() {
        let next = compute_next_state(Quality::GOOD, &SchedulingState::default(), now());
        assert_eq!(next.last_reviewed_at, Some(now()));
        assert_eq!(next.next_review_at, Some(now() + Duration::days(1)));
    }

    #[test]
    fn test_invalid_quality_rejected() {
        let prior = state(2.5, 3, 15);
        assert_eq!(
            calculate_next_review(6, &prior, now()),
            Err(SrsError::InvalidQuality(6))
        );
        assert_eq!(
            calculate_next_review(-1, &prior, now()),
            Err(SrsError::InvalidQuality(-1))
        );
    }

    #[test]
    fn test_learning_sequence() {
        let day = Duration::days(1);
        let first = compute_next_state(Quality::PERFECT, &SchedulingState::default(), now());
        assert_close(first.ease_factor, 2.6);
        assert_eq!((first.repetition_count, first.interval_days), (1, 1));

        let second = compute_next_state(Quality::EASY, &first, now() + day);
        assert_close(second.ease_factor, 2.6);
        assert_eq!((second.repetition_count, second.interval_days), (2, 6));

        let third = compute_next_state(Quality::HARD, &second, now() + day * 7);
        assert_close(third.ease_factor, 2.28);
        assert_eq!((third.repetition_count, third.interval_days), (0, 1));
    }

    fn any_quality() -> impl Strategy<Value = Quality> {
        (0i64..=5).prop_map(|q| Quality::new(q).unwrap())
    }

    fn any_state() -> impl Strategy<Value = SchedulingState> {
        (0.0f64..4.0, 0u32..50, 0u32..3650)
            .prop_map(|(ease, reps, interval)| state(ease, reps, interval))
    }

    proptest! {
        #[test]
        fn prop_ease_never_below_floor(quality in any_quality(), prior in any_state()) {
            let next = compute_next_state(quality, &prior, now());
            prop_assert!(next.ease_factor >= MIN_EASE_FACTOR);
        }

        #[test]
        fn prop_repeated_failures_hold_floor(failures in prop::collection::vec(0i64..3, 1..40)) {
            let mut current = SchedulingState::default();
            for q in failures {
                current = compute_next_state(Quality::new(q).unwrap(), &current, now());
                prop_assert!(current.ease_factor >= MIN_EASE_FACTOR);
                prop_assert_eq!(current.repetition_count, 0);
                prop_assert_eq!(current.interval_days, 1);
            }
        }

        #[test]
        fn prop_failure_resets(q in 0i64..3, prior in any_state()) {
            let next = compute_next_state(Quality::new(q).unwrap(), &prior, now());
            prop_assert_eq!(next.repetition_count, 0);
            prop_assert_eq!(next.interval_days, 1);
        }

        #[test]
        fn prop_pass_interval_by_new_count(q in 3i64..=5, prior in any_state()) {
            let next = compute_next_state(Quality::new(q).unwrap(), &prior, now());
            prop_assert_eq!(next.repetition_count, prior.repetition_count + 1);
            let expected = match prior.repetition_count {
                0 => 1,
                1 => 6,
                _ => ((f64::from(prior.interval_days) * next.ease_factor).round() as u32).max(1),
            };
            prop_assert_eq!(next.interval_days, expected);
        }

        #[test]
        fn prop_interval_at_least_one_day(quality in any_quality(), prior in any_state()) {
            let next = compute_next_state(quality, &prior, now());
            prop_assert!(next.interval_days >= 1);
        }

        #[test]
        fn prop_next_review_is_now_plus_interval(quality in any_quality(), prior in any_state()) {
            let next = compute_next_state(quality, &prior, now());
            prop_assert_eq!(
                next.next_review_at,
                Some(now() + Duration::days(i64::from(next.interval_days)))
            );
        }

        #[test]
        fn prop_deterministic(quality in any_quality(), prior in any_state()) {
            prop_assert_eq!(
                compute_next_state(quality, &prior, now()),
                compute_next_state(quality, &prior, now())
            );
        }
    }
}
