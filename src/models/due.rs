//! Due-set selection: which items are eligible for review right now, and in
//! what order.
//!
//! Items whose stage is excluded (conventionally `Solid`) are never due.
//! Everything else is due when it has never been scheduled or its
//! `next_review_at` is at or before `now`. Never-reviewed items come first,
//! then ascending `next_review_at`; ties keep snapshot order.

use super::MasteryStage;
use chrono::{DateTime, Utc};
use std::collections::HashSet;

/// Read-only view of an item the selector can rank.
pub trait Schedulable {
    fn id(&self) -> i64;
    fn next_review_at(&self) -> Option<DateTime<Utc>>;
    fn mastery_stage(&self) -> MasteryStage;
}

/// Minimal snapshot of an item, for hosts that don't hold full records.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DueCandidate {
    pub id: i64,
    pub next_review_at: Option<DateTime<Utc>>,
    pub stage: MasteryStage,
}

impl Schedulable for DueCandidate {
    fn id(&self) -> i64 {
        self.id
    }

    fn next_review_at(&self) -> Option<DateTime<Utc>> {
        self.next_review_at
    }

    fn mastery_stage(&self) -> MasteryStage {
        self.stage
    }
}

/// The due predicate: never scheduled, or scheduled at or before `now`.
pub fn is_due_at(next_review_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    next_review_at.is_none_or(|at| at <= now)
}

/// Stages that are never due unless the caller says otherwise.
pub fn default_exclusions() -> HashSet<MasteryStage> {
    HashSet::from([MasteryStage::Solid])
}

/// Ordered due items borrowed from a snapshot. Can be iterated any number of
/// times; capping is left to the caller.
#[derive(Debug)]
pub struct DueSet<'a, T> {
    items: Vec<&'a T>,
}

impl<'a, T: Schedulable> DueSet<'a, T> {
    pub fn iter(&self) -> impl Iterator<Item = &'a T> + '_ {
        self.items.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Item ids in due order, optionally truncated to `limit`.
    pub fn ids(&self, limit: Option<usize>) -> Vec<i64> {
        self.iter()
            .take(limit.unwrap_or(usize::MAX))
            .map(Schedulable::id)
            .collect()
    }
}

/// Filters `items` down to those due at `now` and orders them.
pub fn select_due<'a, T: Schedulable>(
    items: &'a [T],
    now: DateTime<Utc>,
    exclude: &HashSet<MasteryStage>,
) -> DueSet<'a, T> {
    let mut due: Vec<&T> = items
        .iter()
        .filter(|item| !exclude.contains(&item.mastery_stage()))
        .filter(|item| is_due_at(item.next_review_at(), now))
        .collect();

    // None sorts before Some; sort_by_key is stable
    due.sort_by_key(|item| item.next_review_at());

    DueSet { items: due }
}
