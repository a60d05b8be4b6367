//! Learner statistics over the scheduling state and the review log.
//!
//! Read-only aggregates; nothing here feeds back into scheduling.

use crate::database::db::{self, Result, StoreError};
use crate::models::{DEFAULT_EASE_FACTOR, MasteryStage, select_due};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use rusqlite::{Connection, params};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LearnerStats {
    pub total_words: usize,
    pub ghost_words: usize,
    pub liquid_words: usize,
    pub solid_words: usize,
    pub words_due_today: usize,
    pub average_ease_factor: f64,
    /// Counted from the review log.
    pub total_reviews: usize,
    /// Sum of current streaks. Lossy: a failure resets its word's streak.
    pub current_streak_total: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChallengingWord {
    pub word_id: i64,
    pub term: String,
    pub definition: String,
    pub ease_factor: f64,
    pub repetition_count: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DailyActivity {
    pub date: NaiveDate,
    pub reviews: usize,
}

pub fn learner_stats(
    conn: &Connection,
    learner_id: i64,
    now: DateTime<Utc>,
    exclude: &HashSet<MasteryStage>,
) -> Result<LearnerStats> {
    let words = db::get_words_for_learner(conn, learner_id)?;

    let count_stage = |stage: MasteryStage| words.iter().filter(|w| w.stage == stage).count();
    let average_ease_factor = if words.is_empty() {
        DEFAULT_EASE_FACTOR
    } else {
        words.iter().map(|w| w.state.ease_factor).sum::<f64>() / words.len() as f64
    };

    let total_reviews: i64 = conn.query_row(
        "SELECT COUNT(*) FROM review_events e
         JOIN words w ON w.id = e.word_id
         WHERE w.learner_id = ?1",
        params![learner_id],
        |row| row.get(0),
    )?;

    Ok(LearnerStats {
        total_words: words.len(),
        ghost_words: count_stage(MasteryStage::Ghost),
        liquid_words: count_stage(MasteryStage::Liquid),
        solid_words: count_stage(MasteryStage::Solid),
        words_due_today: select_due(&words, now, exclude).len(),
        average_ease_factor,
        total_reviews: total_reviews.max(0) as usize,
        current_streak_total: words
            .iter()
            .map(|w| u64::from(w.state.repetition_count))
            .sum(),
    })
}

/// Lowest-ease words among those with a live streak, hardest first.
pub fn challenging_words(
    conn: &Connection,
    learner_id: i64,
    limit: usize,
) -> Result<Vec<ChallengingWord>> {
    let mut words: Vec<ChallengingWord> = db::get_words_for_learner(conn, learner_id)?
        .into_iter()
        .filter(|w| w.state.repetition_count > 0)
        .map(|w| ChallengingWord {
            word_id: w.id,
            term: w.term,
            definition: w.definition,
            ease_factor: w.state.ease_factor,
            repetition_count: w.state.repetition_count,
        })
        .collect();

    words.sort_by(|a, b| a.ease_factor.total_cmp(&b.ease_factor));
    words.truncate(limit);
    Ok(words)
}

/// Longest activity window `review_activity` will build.
pub const MAX_ACTIVITY_DAYS: u32 = 3660;

/// Reviews per UTC day over the last `days` days ending at `now`, oldest
/// first. Days without reviews are included with a zero count; a window of
/// zero days is empty.
pub fn review_activity(
    conn: &Connection,
    learner_id: i64,
    days: u32,
    now: DateTime<Utc>,
) -> Result<Vec<DailyActivity>> {
    if days == 0 {
        return Ok(Vec::new());
    }
    if days > MAX_ACTIVITY_DAYS {
        return Err(StoreError::InvalidInput(format!(
            "activity window of {days} days exceeds {MAX_ACTIVITY_DAYS}"
        )));
    }

    let today = now.date_naive();
    let first_day = today
        .checked_sub_signed(Duration::days(i64::from(days - 1)))
        .ok_or_else(|| {
            StoreError::InvalidInput(format!("{days} days before {today} is out of range"))
        })?;

    let mut per_day: BTreeMap<NaiveDate, usize> = first_day
        .iter_days()
        .take_while(|d| *d <= today)
        .map(|d| (d, 0))
        .collect();

    let mut stmt = conn.prepare(
        "SELECT e.reviewed_at FROM review_events e
         JOIN words w ON w.id = e.word_id
         WHERE w.learner_id = ?1 AND e.reviewed_at <= ?2",
    )?;
    let timestamps = stmt
        .query_map(params![learner_id, now.timestamp()], |row| row.get::<_, i64>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    for secs in timestamps {
        if let Some(day) = DateTime::from_timestamp(secs, 0).map(|t| t.date_naive()) {
            if let Some(count) = per_day.get_mut(&day) {
                *count += 1;
            }
        }
    }

    Ok(per_day
        .into_iter()
        .map(|(date, reviews)| DailyActivity { date, reviews })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::db::{
        NewWord, add_word, open_in_memory, set_mastery_stage, submit_review,
    };
    use crate::models::{Quality, default_exclusions};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, 8, 0, 0).unwrap()
    }

    fn word(conn: &Connection, term: &str) -> i64 {
        add_word(conn, 1, &NewWord { term, ..Default::default() }, now()).unwrap()
    }

    #[test]
    fn test_stats_for_empty_learner() {
        let conn = open_in_memory().unwrap();
        let stats = learner_stats(&conn, 1, now(), &default_exclusions()).unwrap();
        assert_eq!(stats.total_words, 0);
        assert_eq!(stats.average_ease_factor, DEFAULT_EASE_FACTOR);
        assert_eq!(stats.words_due_today, 0);
    }

    #[test]
    fn test_stats_counts() {
        let mut conn = open_in_memory().unwrap();
        let a = word(&conn, "talo");
        let b = word(&conn, "auto");
        let c = word(&conn, "vesi");
        set_mastery_stage(&conn, c, MasteryStage::Solid, now()).unwrap();

        submit_review(&mut conn, a, Quality::PERFECT, now()).unwrap();
        submit_review(&mut conn, b, Quality::BLACKOUT, now()).unwrap();

        let stats = learner_stats(&conn, 1, now(), &default_exclusions()).unwrap();
        assert_eq!(stats.total_words, 3);
        assert_eq!(stats.ghost_words, 2);
        assert_eq!(stats.solid_words, 1);
        assert_eq!(stats.total_reviews, 2);
        assert_eq!(stats.current_streak_total, 1);
        // a and b are scheduled for tomorrow, c is solid
        assert_eq!(stats.words_due_today, 0);
        assert!((stats.average_ease_factor - (2.6 + 1.7 + 2.5) / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_challenging_words_order() {
        let mut conn = open_in_memory().unwrap();
        let easy = word(&conn, "easy");
        let hard = word(&conn, "hard");
        let unseen = word(&conn, "unseen");

        submit_review(&mut conn, easy, Quality::PERFECT, now()).unwrap();
        submit_review(&mut conn, hard, Quality::GOOD, now()).unwrap();

        let words = challenging_words(&conn, 1, 10).unwrap();
        let ids: Vec<i64> = words.iter().map(|w| w.word_id).collect();
        assert_eq!(ids, vec![hard, easy]);
        assert!(!ids.contains(&unseen));

        assert_eq!(challenging_words(&conn, 1, 1).unwrap().len(), 1);
    }

    #[test]
    fn test_review_activity_buckets_by_day() {
        let mut conn = open_in_memory().unwrap();
        let id = word(&conn, "talo");
        let two_days_ago = now() - Duration::days(2);

        submit_review(&mut conn, id, Quality::GOOD, two_days_ago).unwrap();
        submit_review(&mut conn, id, Quality::GOOD, now()).unwrap();
        submit_review(&mut conn, id, Quality::GOOD, now()).unwrap();

        let activity = review_activity(&conn, 1, 3, now()).unwrap();
        let counts: Vec<usize> = activity.iter().map(|d| d.reviews).collect();
        assert_eq!(counts, vec![1, 0, 2]);
        assert_eq!(activity[2].date, now().date_naive());
    }

    #[test]
    fn test_review_activity_window_bounds() {
        let conn = open_in_memory().unwrap();

        assert!(review_activity(&conn, 1, 0, now()).unwrap().is_empty());
        assert_eq!(review_activity(&conn, 1, 1, now()).unwrap().len(), 1);

        let widest = review_activity(&conn, 1, MAX_ACTIVITY_DAYS, now()).unwrap();
        assert_eq!(widest.len(), MAX_ACTIVITY_DAYS as usize);

        for days in [MAX_ACTIVITY_DAYS + 1, u32::MAX] {
            let err = review_activity(&conn, 1, days, now()).unwrap_err();
            assert!(matches!(err, StoreError::InvalidInput(_)));
        }
    }
}
