//! Review session over a learner's due words.
//! Words graded below 3 come back in the next round until every word passes.

use super::{Quality, SessionCard, Word};
use crate::database::db::{self, ReviewOutcome};
use chrono::{DateTime, Utc};
use rusqlite::Connection;

/// Multi-round review of a due set. Each grade is persisted immediately.
pub struct ReviewSession {
    pub cards: Vec<SessionCard>,
    pub current_round: Vec<usize>,
    pub current_index: usize,
    pub show_definition: bool,
    pub round_number: usize,
}

impl ReviewSession {
    /// Starts a session from words already ordered by the due selector.
    pub fn new(due_words: Vec<Word>) -> Self {
        let cards: Vec<_> = due_words.into_iter().map(SessionCard::new).collect();
        let indices: Vec<usize> = (0..cards.len()).collect();

        Self {
            cards,
            current_round: indices,
            current_index: 0,
            show_definition: false,
            round_number: 1,
        }
    }

    pub fn current_card(&self) -> Option<&SessionCard> {
        self.current_round
            .get(self.current_index)
            .and_then(|&idx| self.cards.get(idx))
    }

    pub fn toggle_definition(&mut self) {
        self.show_definition = !self.show_definition;
    }

    pub fn next_card(&mut self) {
        if self.current_index + 1 < self.current_round.len() {
            self.current_index += 1;
            self.show_definition = false;
        } else {
            self.start_next_round();
        }
    }

    /// Starts a new round with the cards that failed this one.
    /// With no failures left the session is complete.
    fn start_next_round(&mut self) {
        let failed: Vec<usize> = self
            .current_round
            .iter()
            .copied()
            .filter(|&idx| self.cards.get(idx).is_some_and(|card| !card.passed))
            .collect();

        if failed.is_empty() {
            return;
        }

        self.current_round = failed;
        self.current_index = 0;
        self.show_definition = false;
        self.round_number += 1;
    }

    /// Grades the current card, persists the SM-2 outcome, and keeps the
    /// in-memory word in sync with the store.
    ///
    /// Returns `Ok(None)` when there is no current card.
    pub fn grade_current_card(
        &mut self,
        conn: &mut Connection,
        quality: Quality,
        now: DateTime<Utc>,
    ) -> db::Result<Option<ReviewOutcome>> {
        let Some(&idx) = self.current_round.get(self.current_index) else {
            return Ok(None);
        };
        let Some(card) = self.cards.get_mut(idx) else {
            return Ok(None);
        };

        let outcome = db::submit_review(conn, card.word.id, quality, now)?;
        card.word = outcome.word.clone();
        card.mark_graded(quality.is_pass(), now);
        Ok(Some(outcome))
    }

    pub fn passed_count(&self) -> usize {
        self.current_round
            .iter()
            .filter(|&&idx| self.cards.get(idx).is_some_and(|card| card.passed))
            .count()
    }

    pub fn total_count(&self) -> usize {
        self.current_round.len()
    }

    pub fn remaining_count(&self) -> usize {
        self.total_count() - self.passed_count()
    }

    /// True when the round is empty or every card in it has passed.
    pub fn is_completed(&self) -> bool {
        self.current_round.is_empty() || self.passed_count() == self.total_count()
    }

    pub fn phase_message(&self) -> String {
        if self.round_number == 1 {
            format!("Round {}: {} words", self.round_number, self.total_count())
        } else {
            format!(
                "Round {} (retry): {} words to repeat",
                self.round_number,
                self.total_count()
            )
        }
    }
}
