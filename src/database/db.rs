//! Database operations for the vocabulary scheduler
//!
//! Handles SQLite initialization, word CRUD, the simulated review clock, and
//! persisting SM-2 outcomes. Review submission is the only writer of
//! scheduling state and runs read-compute-write inside one immediate
//! transaction guarded by a per-row version.

use crate::display::review_message;
use crate::models::due::select_due;
use crate::models::sm2::compute_next_state;
use crate::models::{
    MIN_EASE_FACTOR, MasteryStage, Quality, ReviewEvent, SchedulingState, Word,
};
use chrono::{DateTime, Duration, SubsecRound, Utc};
use rusqlite::{Connection, OptionalExtension, Row, TransactionBehavior, params};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("Word not found: {0}")]
    NotFound(i64),
    /// Another writer updated the word between read and write.
    #[error("Concurrent update to word {0}; retry the review")]
    Conflict(i64),
    /// Stored values break a scheduling invariant.
    #[error("Corrupt record for word {id}: {reason}")]
    Corrupt { id: i64, reason: String },
    /// Caller input the store cannot act on.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// What the host hands back after a review is accepted.
#[derive(Clone, Debug)]
pub struct ReviewOutcome {
    pub word: Word,
    pub next_interval: u32,
    pub message: String,
}

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS words (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        learner_id INTEGER NOT NULL,
        term TEXT NOT NULL,
        definition TEXT NOT NULL DEFAULT '',
        language TEXT NOT NULL DEFAULT '',
        part_of_speech TEXT NOT NULL DEFAULT '',
        stage TEXT NOT NULL DEFAULT 'ghost',
        added_at INTEGER NOT NULL,
        mastered_at INTEGER,
        UNIQUE(learner_id, term)
    );

    CREATE TABLE IF NOT EXISTS scheduling_state (
        word_id INTEGER PRIMARY KEY,
        ease_factor REAL NOT NULL DEFAULT 2.5,
        repetition_count INTEGER NOT NULL DEFAULT 0,
        interval_days INTEGER NOT NULL DEFAULT 0,
        next_review_at INTEGER,
        last_reviewed_at INTEGER,
        version INTEGER NOT NULL DEFAULT 0,
        FOREIGN KEY (word_id) REFERENCES words(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS review_events (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        word_id INTEGER NOT NULL,
        quality INTEGER NOT NULL,
        ease_before REAL NOT NULL,
        ease_after REAL NOT NULL,
        interval_after INTEGER NOT NULL,
        reviewed_at INTEGER NOT NULL,
        FOREIGN KEY (word_id) REFERENCES words(id) ON DELETE CASCADE
    );

    CREATE INDEX IF NOT EXISTS idx_review_events_word ON review_events(word_id);

    CREATE TABLE IF NOT EXISTS app_state (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );
";

const WORD_COLUMNS: &str = "w.id, w.learner_id, w.term, w.definition, w.language, w.part_of_speech,
     w.stage, w.added_at, w.mastered_at,
     s.ease_factor, s.repetition_count, s.interval_days, s.next_review_at, s.last_reviewed_at,
     s.version";

/// Opens (or creates) the database file and ensures the schema exists.
///
/// Seeds the simulated current date with the wall clock on first use.
pub fn init_database(path: impl AsRef<Path>) -> Result<Connection> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let conn = Connection::open(path)?;
    prepare(&conn)?;
    info!(path = %path.display(), "database ready");
    Ok(conn)
}

/// In-memory database with the full schema.
pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    prepare(&conn)?;
    Ok(conn)
}

fn prepare(conn: &Connection) -> Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.execute_batch(SCHEMA)?;

    conn.execute(
        "INSERT OR IGNORE INTO app_state (key, value) VALUES ('current_date', ?1)",
        params![Utc::now().timestamp().to_string()],
    )?;
    Ok(())
}

/// Retrieves the simulated current date
pub fn get_current_date(conn: &Connection) -> Result<DateTime<Utc>> {
    let value: String = conn.query_row(
        "SELECT value FROM app_state WHERE key = 'current_date'",
        [],
        |row| row.get(0),
    )?;

    value
        .parse::<i64>()
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .ok_or_else(|| StoreError::Corrupt {
            id: 0,
            reason: format!("current_date '{value}' is not a unix timestamp"),
        })
}

pub fn set_current_date(conn: &Connection, date: DateTime<Utc>) -> Result<()> {
    conn.execute(
        "INSERT INTO app_state (key, value) VALUES ('current_date', ?1)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        params![date.timestamp().to_string()],
    )?;
    Ok(())
}

/// Advances the simulated date by `days` and returns the new date.
pub fn advance_day(conn: &Connection, days: u32) -> Result<DateTime<Utc>> {
    let current = get_current_date(conn)?;
    let next = current
        .checked_add_signed(Duration::days(i64::from(days)))
        .ok_or_else(|| {
            StoreError::InvalidInput(format!("advancing {current} by {days} days overflows"))
        })?;
    set_current_date(conn, next)?;
    info!(date = %next, "clock advanced");
    Ok(next)
}

/// New word for a learner. Scheduling state starts at the SM-2 defaults.
#[derive(Clone, Debug, Default)]
pub struct NewWord<'a> {
    pub term: &'a str,
    pub definition: &'a str,
    pub language: &'a str,
    pub part_of_speech: &'a str,
}

/// Adds a word to a learner's collection and initializes its scheduling state.
///
/// Returns the word id. If the learner already has the term, the existing id
/// is returned and nothing changes.
pub fn add_word(
    conn: &Connection,
    learner_id: i64,
    word: &NewWord<'_>,
    now: DateTime<Utc>,
) -> Result<i64> {
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO words
             (learner_id, term, definition, language, part_of_speech, stage, added_at)
         VALUES (?1, ?2, ?3, ?4, ?5, 'ghost', ?6)",
        params![
            learner_id,
            word.term,
            word.definition,
            word.language,
            word.part_of_speech,
            now.timestamp()
        ],
    )?;

    let word_id: i64 = conn.query_row(
        "SELECT id FROM words WHERE learner_id = ?1 AND term = ?2",
        params![learner_id, word.term],
        |row| row.get(0),
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO scheduling_state (word_id) VALUES (?1)",
        params![word_id],
    )?;

    if inserted > 0 {
        debug!(word_id, learner_id, term = word.term, "word added");
    }
    Ok(word_id)
}

pub fn get_word(conn: &Connection, word_id: i64) -> Result<Word> {
    load_word(conn, word_id).map(|(word, _)| word)
}

/// All of a learner's words, in insertion order.
pub fn get_words_for_learner(conn: &Connection, learner_id: i64) -> Result<Vec<Word>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {WORD_COLUMNS}
         FROM words w
         JOIN scheduling_state s ON s.word_id = w.id
         WHERE w.learner_id = ?1
         ORDER BY w.id ASC"
    ))?;

    let rows = stmt
        .query_map(params![learner_id], WordRow::from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    rows.into_iter()
        .map(|row| row.into_word().map(|(word, _)| word))
        .collect()
}

/// Deletes a word; its scheduling state and review events go with it.
pub fn delete_word(conn: &Connection, word_id: i64) -> Result<()> {
    let deleted = conn.execute("DELETE FROM words WHERE id = ?1", params![word_id])?;
    if deleted == 0 {
        return Err(StoreError::NotFound(word_id));
    }
    Ok(())
}

/// Words due for a learner at `now`, most urgent first, capped at `limit`.
pub fn due_words(
    conn: &Connection,
    learner_id: i64,
    now: DateTime<Utc>,
    exclude: &HashSet<MasteryStage>,
    limit: Option<usize>,
) -> Result<Vec<Word>> {
    let words = get_words_for_learner(conn, learner_id)?;
    let due = select_due(&words, now, exclude);
    debug!(learner_id, total = words.len(), due = due.len(), "due set selected");

    Ok(due
        .iter()
        .take(limit.unwrap_or(usize::MAX))
        .cloned()
        .collect())
}

/// Applies one review to a word and persists the new state.
///
/// The read, the SM-2 computation, the versioned update and the review-log
/// append share one `BEGIN IMMEDIATE` transaction. If the row version moved
/// underneath us the transaction rolls back with [`StoreError::Conflict`].
///
/// `now` is rounded up to the whole second the store keeps, so the returned
/// state matches the stored row and is never scheduled early.
pub fn submit_review(
    conn: &mut Connection,
    word_id: i64,
    quality: Quality,
    now: DateTime<Utc>,
) -> Result<ReviewOutcome> {
    let now = whole_second_ceil(now);
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let (mut word, version) = load_word(&tx, word_id)?;
    let next = apply_review(&tx, word_id, version, &word.state, quality, now)?;

    tx.commit()?;

    info!(
        word_id,
        quality = quality.value(),
        ease = next.ease_factor,
        repetitions = next.repetition_count,
        interval_days = next.interval_days,
        "review recorded"
    );

    let next_interval = next.interval_days;
    word.state = next;
    Ok(ReviewOutcome {
        word,
        next_interval,
        message: review_message(quality, next_interval),
    })
}

fn whole_second_ceil(t: DateTime<Utc>) -> DateTime<Utc> {
    let floor = t.trunc_subsecs(0);
    if floor == t {
        return t;
    }
    floor.checked_add_signed(Duration::seconds(1)).unwrap_or(floor)
}

/// Computes and writes the next state, guarded by the row `version` read
/// alongside `prior`, and appends the review event.
fn apply_review(
    conn: &Connection,
    word_id: i64,
    version: i64,
    prior: &SchedulingState,
    quality: Quality,
    now: DateTime<Utc>,
) -> Result<SchedulingState> {
    let next = compute_next_state(quality, prior, now);

    let updated = conn.execute(
        "UPDATE scheduling_state
         SET ease_factor = ?1, repetition_count = ?2, interval_days = ?3,
             next_review_at = ?4, last_reviewed_at = ?5, version = version + 1
         WHERE word_id = ?6 AND version = ?7",
        params![
            next.ease_factor,
            next.repetition_count,
            next.interval_days,
            next.next_review_at.map(|t| t.timestamp()),
            next.last_reviewed_at.map(|t| t.timestamp()),
            word_id,
            version
        ],
    )?;

    if updated == 0 {
        warn!(word_id, version, "review lost a concurrent update race");
        return Err(StoreError::Conflict(word_id));
    }

    conn.execute(
        "INSERT INTO review_events
             (word_id, quality, ease_before, ease_after, interval_after, reviewed_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            word_id,
            quality.value(),
            prior.ease_factor,
            next.ease_factor,
            next.interval_days,
            now.timestamp()
        ],
    )?;

    Ok(next)
}

/// Host-side hook for the mastery subsystem. Scheduling never calls this.
///
/// Moving to Solid stamps `mastered_at` once; repeating it keeps the first
/// time. Any other stage clears it.
pub fn set_mastery_stage(
    conn: &Connection,
    word_id: i64,
    stage: MasteryStage,
    now: DateTime<Utc>,
) -> Result<()> {
    let updated = conn.execute(
        "UPDATE words
         SET mastered_at = CASE
                 WHEN ?1 != 'solid' THEN NULL
                 WHEN stage = 'solid' THEN COALESCE(mastered_at, ?2)
                 ELSE ?2
             END,
             stage = ?1
         WHERE id = ?3",
        params![stage.as_str(), now.timestamp(), word_id],
    )?;
    if updated == 0 {
        return Err(StoreError::NotFound(word_id));
    }
    info!(word_id, stage = %stage, "mastery stage changed");
    Ok(())
}

/// Review events for a word, oldest first.
pub fn review_history(conn: &Connection, word_id: i64) -> Result<Vec<ReviewEvent>> {
    // Surfaces NotFound for unknown ids instead of an empty history
    load_word(conn, word_id)?;

    let mut stmt = conn.prepare(
        "SELECT id, word_id, quality, ease_before, ease_after, interval_after, reviewed_at
         FROM review_events WHERE word_id = ?1 ORDER BY reviewed_at ASC, id ASC",
    )?;

    let rows = stmt
        .query_map(params![word_id], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, f64>(3)?,
                row.get::<_, f64>(4)?,
                row.get::<_, i64>(5)?,
                row.get::<_, i64>(6)?,
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    rows.into_iter()
        .map(|row| -> Result<ReviewEvent> {
            let (id, word_id, quality, ease_before, ease_after, interval_after, reviewed_at) = row;
            let corrupt = |reason: String| StoreError::Corrupt { id: word_id, reason };
            let interval_after = u32::try_from(interval_after)
                .map_err(|_| corrupt(format!("negative interval {interval_after} in review log")))?;
            Ok(ReviewEvent {
                id,
                word_id,
                quality: Quality::new(quality).map_err(|e| corrupt(e.to_string()))?,
                ease_before,
                ease_after,
                interval_after,
                reviewed_at: timestamp(word_id, reviewed_at)?,
            })
        })
        .collect()
}

fn load_word(conn: &Connection, word_id: i64) -> Result<(Word, i64)> {
    conn.query_row(
        &format!(
            "SELECT {WORD_COLUMNS}
             FROM words w
             JOIN scheduling_state s ON s.word_id = w.id
             WHERE w.id = ?1"
        ),
        params![word_id],
        WordRow::from_row,
    )
    .optional()?
    .ok_or(StoreError::NotFound(word_id))?
    .into_word()
}

/// Raw columns as stored; validated by `into_word`.
struct WordRow {
    id: i64,
    learner_id: i64,
    term: String,
    definition: String,
    language: String,
    part_of_speech: String,
    stage: String,
    added_at: i64,
    mastered_at: Option<i64>,
    ease_factor: f64,
    repetition_count: i64,
    interval_days: i64,
    next_review_at: Option<i64>,
    last_reviewed_at: Option<i64>,
    version: i64,
}

impl WordRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            learner_id: row.get(1)?,
            term: row.get(2)?,
            definition: row.get(3)?,
            language: row.get(4)?,
            part_of_speech: row.get(5)?,
            stage: row.get(6)?,
            added_at: row.get(7)?,
            mastered_at: row.get(8)?,
            ease_factor: row.get(9)?,
            repetition_count: row.get(10)?,
            interval_days: row.get(11)?,
            next_review_at: row.get(12)?,
            last_reviewed_at: row.get(13)?,
            version: row.get(14)?,
        })
    }

    /// Bad stored values are reported, never clamped.
    fn into_word(self) -> Result<(Word, i64)> {
        let id = self.id;
        let corrupt = |reason: String| StoreError::Corrupt { id, reason };

        if self.ease_factor.is_nan() || self.ease_factor < MIN_EASE_FACTOR {
            return Err(corrupt(format!(
                "ease factor {} below floor {MIN_EASE_FACTOR}",
                self.ease_factor
            )));
        }
        let repetition_count = u32::try_from(self.repetition_count)
            .map_err(|_| corrupt(format!("invalid repetition count {}", self.repetition_count)))?;
        let interval_days = u32::try_from(self.interval_days)
            .map_err(|_| corrupt(format!("invalid interval {}", self.interval_days)))?;
        let stage = self
            .stage
            .parse::<MasteryStage>()
            .map_err(|e| corrupt(e.to_string()))?;

        let word = Word {
            id,
            learner_id: self.learner_id,
            term: self.term,
            definition: self.definition,
            language: self.language,
            part_of_speech: self.part_of_speech,
            stage,
            added_at: timestamp(id, self.added_at)?,
            mastered_at: self.mastered_at.map(|t| timestamp(id, t)).transpose()?,
            state: SchedulingState {
                ease_factor: self.ease_factor,
                repetition_count,
                interval_days,
                next_review_at: self.next_review_at.map(|t| timestamp(id, t)).transpose()?,
                last_reviewed_at: self.last_reviewed_at.map(|t| timestamp(id, t)).transpose()?,
            },
        };
        Ok((word, self.version))
    }
}

fn timestamp(id: i64, secs: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0).ok_or_else(|| StoreError::Corrupt {
        id,
        reason: format!("timestamp {secs} out of range"),
    })
}
