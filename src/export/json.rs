//! JSON import/export of a learner's vocabulary together with its
//! scheduling state.

use crate::database::db::{self, Result};
use crate::models::{MIN_EASE_FACTOR, MasteryStage, SchedulingState};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, params};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

pub const EXPORT_VERSION: &str = "1.0";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExportData {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub words: Vec<WordExport>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WordExport {
    pub term: String,
    #[serde(default)]
    pub definition: String,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub part_of_speech: String,
    #[serde(default)]
    pub stage: String,
    pub added_at: DateTime<Utc>,
    #[serde(default)]
    pub mastered_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub state: SchedulingState,
}

/// Import-side envelope. Records stay raw so one bad record is skipped
/// instead of failing the file.
#[derive(Deserialize)]
struct RawExport {
    exported_at: DateTime<Utc>,
    words: Vec<serde_json::Value>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub imported: usize,
    pub skipped: usize,
}

/// Snapshot of every word a learner owns.
pub fn export_learner(
    conn: &Connection,
    learner_id: i64,
    now: DateTime<Utc>,
) -> Result<ExportData> {
    let words = db::get_words_for_learner(conn, learner_id)?
        .into_iter()
        .map(|w| WordExport {
            term: w.term,
            definition: w.definition,
            language: w.language,
            part_of_speech: w.part_of_speech,
            stage: w.stage.to_string(),
            added_at: w.added_at,
            mastered_at: w.mastered_at,
            state: w.state,
        })
        .collect();

    Ok(ExportData {
        version: EXPORT_VERSION.to_string(),
        exported_at: now,
        words,
    })
}

/// Exports a learner's words to a JSON file at the specified path.
/// Returns the number of words written.
pub fn export_json_to_path(
    conn: &Connection,
    learner_id: i64,
    path: impl AsRef<Path>,
    now: DateTime<Utc>,
) -> Result<usize> {
    let data = export_learner(conn, learner_id, now)?;
    let json_string = serde_json::to_string_pretty(&data)?;
    fs::write(path.as_ref(), json_string)?;

    info!(
        learner_id,
        words = data.words.len(),
        path = %path.as_ref().display(),
        "export written"
    );
    Ok(data.words.len())
}

/// Imports words from a JSON export into a learner's collection.
///
/// Terms the learner already has are skipped, as are records that don't
/// parse or whose stage or scheduling state break an invariant. The whole
/// import is one transaction.
pub fn import_json(
    conn: &mut Connection,
    learner_id: i64,
    path: impl AsRef<Path>,
) -> Result<ImportSummary> {
    let contents = fs::read_to_string(path.as_ref())?;
    let data: RawExport = serde_json::from_str(&contents)?;

    let tx = conn.transaction()?;
    let mut summary = ImportSummary::default();

    for (index, record) in data.words.into_iter().enumerate() {
        let word: WordExport = match serde_json::from_value(record) {
            Ok(word) => word,
            Err(e) => {
                warn!(index, error = %e, "skipping unreadable record");
                summary.skipped += 1;
                continue;
            }
        };
        if let Err(reason) = validate(&word) {
            warn!(term = %word.term, %reason, "skipping invalid record");
            summary.skipped += 1;
            continue;
        }
        let stage = word.stage.parse::<MasteryStage>().unwrap_or_default();
        // Exports without the field fall back to the export time
        let mastered_at = (stage == MasteryStage::Solid)
            .then(|| word.mastered_at.unwrap_or(data.exported_at).timestamp());

        let inserted = tx.execute(
            "INSERT OR IGNORE INTO words
                 (learner_id, term, definition, language, part_of_speech, stage, added_at,
                  mastered_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                learner_id,
                word.term,
                word.definition,
                word.language,
                word.part_of_speech,
                stage.as_str(),
                word.added_at.timestamp(),
                mastered_at,
            ],
        )?;
        if inserted == 0 {
            summary.skipped += 1;
            continue;
        }

        tx.execute(
            "INSERT INTO scheduling_state
                 (word_id, ease_factor, repetition_count, interval_days, next_review_at,
                  last_reviewed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                tx.last_insert_rowid(),
                word.state.ease_factor,
                word.state.repetition_count,
                word.state.interval_days,
                word.state.next_review_at.map(|t| t.timestamp()),
                word.state.last_reviewed_at.map(|t| t.timestamp()),
            ],
        )?;
        summary.imported += 1;
    }

    tx.commit()?;
    info!(
        learner_id,
        imported = summary.imported,
        skipped = summary.skipped,
        "import finished"
    );
    Ok(summary)
}

fn validate(word: &WordExport) -> std::result::Result<(), String> {
    if word.term.trim().is_empty() {
        return Err("empty term".to_string());
    }
    if !word.stage.is_empty() {
        word.stage.parse::<MasteryStage>().map_err(|e| e.to_string())?;
    }
    if word.state.ease_factor.is_nan() || word.state.ease_factor < MIN_EASE_FACTOR {
        return Err(format!("ease factor {} below floor", word.state.ease_factor));
    }
    Ok(())
}
