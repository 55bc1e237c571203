//! Advisory schedule-conflict detection for defense slots.
//!
//! A defense occupies its final slot once scheduled and its proposed slot
//! before that. Postponed defenses occupy nothing.

use serde::{Deserialize, Serialize};

use crate::defense::Defense;
use crate::schedule::Slot;
use crate::types::DbId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictReport {
    pub has_conflict: bool,
    pub conflicting_defense_ids: Vec<DbId>,
}

/// Defenses whose effective slot collides with `slot`, skipping `exclude`
/// (the defense being rescheduled, if any).
pub fn find_conflicts<'a, I>(defenses: I, slot: &Slot, exclude: Option<DbId>) -> Vec<&'a Defense>
where
    I: IntoIterator<Item = &'a Defense>,
{
    defenses
        .into_iter()
        .filter(|d| Some(d.id) != exclude)
        .filter(|d| !d.is_postponed())
        .filter(|d| d.effective_slot().collides_with(slot))
        .collect()
}

pub fn has_conflict<'a, I>(defenses: I, slot: &Slot, exclude: Option<DbId>) -> bool
where
    I: IntoIterator<Item = &'a Defense>,
{
    !find_conflicts(defenses, slot, exclude).is_empty()
}

pub fn report<'a, I>(defenses: I, slot: &Slot, exclude: Option<DbId>) -> ConflictReport
where
    I: IntoIterator<Item = &'a Defense>,
{
    let ids: Vec<DbId> = find_conflicts(defenses, slot, exclude)
        .into_iter()
        .map(|d| d.id)
        .collect();
    ConflictReport {
        has_conflict: !ids.is_empty(),
        conflicting_defense_ids: ids,
    }
}
