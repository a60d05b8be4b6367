//! Terminal review session
//!
//! Shows each due word, reveals its definition on request and records the
//! learner's grade. Words graded below 3 come back in a retry round.

use crate::database::db::Result;
use crate::models::{Quality, ReviewSession};
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use std::io::{BufRead, Write};
use tracing::info;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SessionSummary {
    pub reviews: usize,
    pub rounds: usize,
    pub completed: bool,
}

/// Drives `session` from line-based input until every card passes, the
/// learner types `q`, or input ends.
///
/// On each card an empty line toggles the definition and `0`-`5` grades it.
pub fn run_session(
    conn: &mut Connection,
    session: &mut ReviewSession,
    now: DateTime<Utc>,
    mut input: impl BufRead,
    mut output: impl Write,
) -> Result<SessionSummary> {
    let mut summary = SessionSummary::default();
    let mut line = String::new();

    while !session.is_completed() {
        if session.round_number != summary.rounds {
            summary.rounds = session.round_number;
            writeln!(output, "{}", session.phase_message())?;
        }

        let Some(card) = session.current_card() else {
            break;
        };
        let term = card.word.term.clone();
        let definition = card.word.definition.clone();

        writeln!(
            output,
            "[{} / {} passed, {} remaining]",
            session.passed_count(),
            session.total_count(),
            session.remaining_count()
        )?;
        if session.show_definition {
            writeln!(output, "{term}: {definition}")?;
            write!(output, "quality 0-5, q to quit> ")?;
        } else {
            writeln!(output, "{term}")?;
            write!(output, "enter to show definition, 0-5 to grade, q to quit> ")?;
        }
        output.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            break;
        }
        let answer = line.trim();
        if answer.eq_ignore_ascii_case("q") {
            break;
        }
        if answer.is_empty() {
            session.toggle_definition();
            continue;
        }

        let Some(quality) = answer.parse::<i64>().ok().and_then(|q| Quality::new(q).ok()) else {
            writeln!(output, "Enter a quality from 0 to 5")?;
            continue;
        };

        if let Some(outcome) = session.grade_current_card(conn, quality, now)? {
            summary.reviews += 1;
            writeln!(output, "{}", outcome.message)?;
        }
        session.next_card();
    }

    summary.completed = session.is_completed();
    info!(
        reviews = summary.reviews,
        rounds = summary.rounds,
        completed = summary.completed,
        "review session finished"
    );
    Ok(summary)
}
