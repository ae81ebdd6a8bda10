//! Translating calendar interactions into completion inserts and deletes.

use crate::models::Day;
use serde::Serialize;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "op", content = "date", rename_all = "lowercase")]
pub enum Mutation {
    Insert(Day),
    Delete(Day),
}

impl Mutation {
    pub fn day(self) -> Day {
        match self {
            Mutation::Insert(day) | Mutation::Delete(day) => day,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    pub mutations: Vec<Mutation>,
    /// What the calendar should show once the mutations are applied.
    pub selection: Vec<Day>,
}

pub fn completed_on(completions: &BTreeSet<Day>, day: Day) -> bool {
    completions.contains(&day)
}

pub fn completed_today(completions: &BTreeSet<Day>) -> bool {
    completed_on(completions, Day::today())
}

pub fn toggle(completions: &BTreeSet<Day>, day: Day) -> Mutation {
    if completed_on(completions, day) {
        Mutation::Delete(day)
    } else {
        Mutation::Insert(day)
    }
}

/// Works out which completions change when the calendar selection moves from `old`
/// to `new`.
///
/// A shrinking selection deletes every deselected day that is actually recorded, in
/// ascending order. Otherwise the last entry of `new` is treated as the day just
/// picked and is inserted unless it is already recorded.
pub fn reconcile_selection(old: &[Day], new: &[Day], completions: &BTreeSet<Day>) -> Reconciliation {
    if new.len() < old.len() {
        let kept: BTreeSet<Day> = new.iter().copied().collect();
        let removed: BTreeSet<Day> = old.iter().copied().filter(|day| !kept.contains(day)).collect();

        let mutations = removed
            .iter()
            .copied()
            .filter(|day| completed_on(completions, *day))
            .map(Mutation::Delete)
            .collect();
        let selection = old.iter().copied().filter(|day| !removed.contains(day)).collect();

        return Reconciliation {
            mutations,
            selection,
        };
    }

    let mut selection = old.to_vec();
    let mut mutations = Vec::new();
    if let Some(&added) = new.last() {
        if !completed_on(completions, added) {
            mutations.push(Mutation::Insert(added));
        }
        if !selection.contains(&added) {
            selection.push(added);
        }
    }

    Reconciliation {
        mutations,
        selection,
    }
}
