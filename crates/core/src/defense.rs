//! Defense (soutenance) lifecycle state machine.
//!
//! ```text
//! propose ──► PROPOSEE ──validate──► VALIDEE ──┐
//!               │  ▲   ──modify────► MODIFIEE ─┴─evaluate──► (evaluation attached)
//!         reject│  │repropose
//!               ▼  │
//!             REPORTEE
//! ```
//!
//! The lifecycle state carries its own payload so a validated defense always
//! has a final slot and a postponed one always has a reason. On the wire the
//! defense is one flat object: `status`, the `proposed*` and `final*` slot
//! fields, and whichever state fields apply (absent ones are `null`).

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::academic::{self, AcademicYear};
use crate::error::CoreError;
use crate::evaluation::{DefenseEvaluation, EvaluationSubmission};
use crate::jury::{self, JuryMember, JuryMemberInput, JuryRole};
use crate::project::{self, Project};
use crate::roles::{Actor, Role};
use crate::schedule::{hm_time, option_hm_time, Slot};
use crate::types::{DbId, IdSequence, Timestamp};
use crate::users::User;

const ENTITY: &str = "Defense";

#[derive(Debug, Clone, PartialEq)]
pub enum DefenseState {
    Proposed,
    Validated {
        final_slot: Slot,
        validated_at: Timestamp,
        validated_by: DbId,
    },
    Modified {
        final_slot: Slot,
        modification_reason: String,
        modified_at: Timestamp,
        modified_by: DbId,
    },
    Postponed {
        rejection_reason: String,
        postponed_at: Timestamp,
        postponed_by: DbId,
    },
}

/// Payload-free view of [`DefenseState`], used for filtering and messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DefenseStatus {
    #[serde(rename = "PROPOSEE")]
    Proposed,
    #[serde(rename = "VALIDEE")]
    Validated,
    #[serde(rename = "MODIFIEE")]
    Modified,
    #[serde(rename = "REPORTEE")]
    Postponed,
}

impl DefenseStatus {
    pub const ALL: [DefenseStatus; 4] = [
        DefenseStatus::Proposed,
        DefenseStatus::Validated,
        DefenseStatus::Modified,
        DefenseStatus::Postponed,
    ];

    pub fn parse(value: &str) -> Result<Self, CoreError> {
        Self::ALL
            .into_iter()
            .find(|s| s.as_str() == value)
            .ok_or_else(|| CoreError::Validation(format!("Invalid defense status '{value}'")))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DefenseStatus::Proposed => "PROPOSEE",
            DefenseStatus::Validated => "VALIDEE",
            DefenseStatus::Modified => "MODIFIEE",
            DefenseStatus::Postponed => "REPORTEE",
        }
    }
}

impl std::fmt::Display for DefenseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl DefenseState {
    pub fn status(&self) -> DefenseStatus {
        match self {
            DefenseState::Proposed => DefenseStatus::Proposed,
            DefenseState::Validated { .. } => DefenseStatus::Validated,
            DefenseState::Modified { .. } => DefenseStatus::Modified,
            DefenseState::Postponed { .. } => DefenseStatus::Postponed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "DefenseWire", try_from = "DefenseWire")]
pub struct Defense {
    pub id: DbId,
    pub project_id: DbId,
    pub proposed_slot: Slot,
    pub state: DefenseState,
    /// Examiners only; the supervising professor presides implicitly.
    pub jury_members: Vec<JuryMember>,
    pub proposed_by: DbId,
    pub proposed_at: Timestamp,
    pub notes: Option<String>,
    pub evaluation: Option<DefenseEvaluation>,
    /// Bumped each time a postponed defense is proposed again.
    pub revision: u32,
    pub updated_at: Timestamp,
}

impl Defense {
    pub fn status(&self) -> DefenseStatus {
        self.state.status()
    }

    /// Final slot once scheduled, otherwise the proposed one.
    pub fn effective_slot(&self) -> &Slot {
        self.scheduled_slot().unwrap_or(&self.proposed_slot)
    }

    /// `Some` only for validated or modified defenses.
    pub fn scheduled_slot(&self) -> Option<&Slot> {
        match &self.state {
            DefenseState::Validated { final_slot, .. } | DefenseState::Modified { final_slot, .. } => {
                Some(final_slot)
            }
            _ => None,
        }
    }

    pub fn is_scheduled(&self) -> bool {
        self.scheduled_slot().is_some()
    }

    pub fn is_postponed(&self) -> bool {
        matches!(self.state, DefenseState::Postponed { .. })
    }

    pub fn rejection_reason(&self) -> Option<&str> {
        match &self.state {
            DefenseState::Postponed { rejection_reason, .. } => Some(rejection_reason),
            _ => None,
        }
    }

    /// The jury as it sits: the supervising professor as president followed
    /// by the stored examiners.
    pub fn effective_jury(&self, president: &User) -> Vec<JuryMember> {
        let mut jury = Vec::with_capacity(self.jury_members.len() + 1);
        jury.push(JuryMember {
            id: 0,
            name: president.full_name(),
            email: Some(president.email.clone()),
            role: JuryRole::President,
            professor_id: Some(president.id),
        });
        jury.extend(self.jury_members.iter().cloned());
        jury
    }
}

/// Flat JSON shape of a [`Defense`].
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DefenseWire {
    id: DbId,
    project_id: DbId,
    status: DefenseStatus,
    proposed_date: NaiveDate,
    #[serde(with = "hm_time")]
    proposed_time: NaiveTime,
    proposed_room: String,
    #[serde(default)]
    final_date: Option<NaiveDate>,
    #[serde(default, with = "option_hm_time")]
    final_time: Option<NaiveTime>,
    #[serde(default)]
    final_room: Option<String>,
    #[serde(default)]
    validated_at: Option<Timestamp>,
    #[serde(default)]
    validated_by: Option<DbId>,
    #[serde(default)]
    modification_reason: Option<String>,
    #[serde(default)]
    modified_at: Option<Timestamp>,
    #[serde(default)]
    modified_by: Option<DbId>,
    #[serde(default)]
    rejection_reason: Option<String>,
    #[serde(default)]
    postponed_at: Option<Timestamp>,
    #[serde(default)]
    postponed_by: Option<DbId>,
    jury_members: Vec<JuryMember>,
    proposed_by: DbId,
    proposed_at: Timestamp,
    notes: Option<String>,
    evaluation: Option<DefenseEvaluation>,
    revision: u32,
    updated_at: Timestamp,
}

impl From<Defense> for DefenseWire {
    fn from(d: Defense) -> Self {
        let status = d.status();
        let mut wire = DefenseWire {
            id: d.id,
            project_id: d.project_id,
            status,
            proposed_date: d.proposed_slot.date,
            proposed_time: d.proposed_slot.time,
            proposed_room: d.proposed_slot.room,
            final_date: None,
            final_time: None,
            final_room: None,
            validated_at: None,
            validated_by: None,
            modification_reason: None,
            modified_at: None,
            modified_by: None,
            rejection_reason: None,
            postponed_at: None,
            postponed_by: None,
            jury_members: d.jury_members,
            proposed_by: d.proposed_by,
            proposed_at: d.proposed_at,
            notes: d.notes,
            evaluation: d.evaluation,
            revision: d.revision,
            updated_at: d.updated_at,
        };
        match d.state {
            DefenseState::Proposed => {}
            DefenseState::Validated { final_slot, validated_at, validated_by } => {
                wire.set_final_slot(final_slot);
                wire.validated_at = Some(validated_at);
                wire.validated_by = Some(validated_by);
            }
            DefenseState::Modified {
                final_slot,
                modification_reason,
                modified_at,
                modified_by,
            } => {
                wire.set_final_slot(final_slot);
                wire.modification_reason = Some(modification_reason);
                wire.modified_at = Some(modified_at);
                wire.modified_by = Some(modified_by);
            }
            DefenseState::Postponed { rejection_reason, postponed_at, postponed_by } => {
                wire.rejection_reason = Some(rejection_reason);
                wire.postponed_at = Some(postponed_at);
                wire.postponed_by = Some(postponed_by);
            }
        }
        wire
    }
}

impl DefenseWire {
    fn set_final_slot(&mut self, slot: Slot) {
        self.final_date = Some(slot.date);
        self.final_time = Some(slot.time);
        self.final_room = Some(slot.room);
    }

    fn final_slot(&mut self) -> Result<Slot, CoreError> {
        match (self.final_date, self.final_time, self.final_room.take()) {
            (Some(date), Some(time), Some(room)) => Ok(Slot { date, time, room }),
            _ => Err(missing(self.status, "finalDate, finalTime and finalRoom")),
        }
    }
}

fn missing(status: DefenseStatus, fields: &str) -> CoreError {
    CoreError::Validation(format!("{status} defense requires {fields}"))
}

impl TryFrom<DefenseWire> for Defense {
    type Error = CoreError;

    fn try_from(mut w: DefenseWire) -> Result<Self, Self::Error> {
        let state = match w.status {
            DefenseStatus::Proposed => DefenseState::Proposed,
            DefenseStatus::Validated => DefenseState::Validated {
                final_slot: w.final_slot()?,
                validated_at: w.validated_at.unwrap_or(w.updated_at),
                validated_by: w
                    .validated_by
                    .ok_or_else(|| missing(w.status, "validatedBy"))?,
            },
            DefenseStatus::Modified => DefenseState::Modified {
                final_slot: w.final_slot()?,
                modification_reason: w
                    .modification_reason
                    .take()
                    .ok_or_else(|| missing(w.status, "modificationReason"))?,
                modified_at: w.modified_at.unwrap_or(w.updated_at),
                modified_by: w.modified_by.ok_or_else(|| missing(w.status, "modifiedBy"))?,
            },
            DefenseStatus::Postponed => DefenseState::Postponed {
                rejection_reason: w
                    .rejection_reason
                    .take()
                    .ok_or_else(|| missing(w.status, "rejectionReason"))?,
                postponed_at: w.postponed_at.unwrap_or(w.updated_at),
                postponed_by: w
                    .postponed_by
                    .ok_or_else(|| missing(w.status, "postponedBy"))?,
            },
        };
        Ok(Defense {
            id: w.id,
            project_id: w.project_id,
            proposed_slot: Slot {
                date: w.proposed_date,
                time: w.proposed_time,
                room: w.proposed_room,
            },
            state,
            jury_members: w.jury_members,
            proposed_by: w.proposed_by,
            proposed_at: w.proposed_at,
            notes: w.notes,
            evaluation: w.evaluation,
            revision: w.revision,
            updated_at: w.updated_at,
        })
    }
}

/* --------------------------------------------------------------------------
Inputs
-------------------------------------------------------------------------- */

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DefenseProposal {
    pub project_id: DbId,
    pub proposed_date: NaiveDate,
    #[serde(with = "hm_time")]
    pub proposed_time: NaiveTime,
    #[validate(length(min = 1, max = 100, message = "room is required"))]
    pub proposed_room: String,
    pub jury_members: Vec<JuryMemberInput>,
    pub notes: Option<String>,
}

impl DefenseProposal {
    pub fn slot(&self) -> Result<Slot, CoreError> {
        Slot::new(self.proposed_date, self.proposed_time, &self.proposed_room)
            .map_err(|_| CoreError::field("proposed_room", "room is required"))
    }

    /// Field checks for a new or repeated proposal.
    pub fn check(&self, current_year: Option<&AcademicYear>) -> Result<Slot, CoreError> {
        self.validate()?;
        let slot = self.slot()?;
        jury::validate_examiners(&self.jury_members)?;
        academic::ensure_defense_date_allowed(current_year, slot.date)?;
        Ok(slot)
    }
}

/// Admin validation. Absent fields keep the proposed values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DefenseValidation {
    pub final_date: Option<NaiveDate>,
    #[serde(default, with = "option_hm_time")]
    pub final_time: Option<NaiveTime>,
    pub final_room: Option<String>,
    /// Replaces the whole examiner list when present.
    pub jury_members: Option<Vec<JuryMemberInput>>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DefenseModification {
    pub final_date: NaiveDate,
    #[serde(with = "hm_time")]
    pub final_time: NaiveTime,
    #[validate(length(min = 1, max = 100, message = "room is required"))]
    pub final_room: String,
    #[serde(rename = "modificationReason", alias = "reason")]
    #[validate(length(min = 1, message = "a modification reason is required"))]
    pub reason: String,
    pub jury_members: Option<Vec<JuryMemberInput>>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DefenseRejection {
    #[serde(rename = "rejectionReason", alias = "reason")]
    pub reason: String,
}

/// Admin replacement of the examiner list.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JuryUpdate {
    pub jury_members: Vec<JuryMemberInput>,
}

/* --------------------------------------------------------------------------
Guards
-------------------------------------------------------------------------- */

fn ensure_status(
    defense: &Defense,
    action: &'static str,
    allowed: &[DefenseStatus],
) -> Result<(), CoreError> {
    let status = defense.status();
    if allowed.contains(&status) {
        Ok(())
    } else {
        Err(CoreError::InvalidTransition {
            entity: ENTITY,
            action,
            status: status.to_string(),
        })
    }
}

fn required_text(field: &str, value: &str, message: &str) -> Result<String, CoreError> {
    let value = value.trim();
    if value.is_empty() {
        Err(CoreError::field(field, message))
    } else {
        Ok(value.to_string())
    }
}

fn replace_jury(
    current: &[JuryMember],
    replacement: Option<&Vec<JuryMemberInput>>,
    ids: &mut IdSequence,
) -> Result<Vec<JuryMember>, CoreError> {
    match replacement {
        Some(members) => {
            jury::validate_examiners(members)?;
            Ok(jury::build_members(members, ids))
        }
        None => Ok(current.to_vec()),
    }
}

/* --------------------------------------------------------------------------
Transitions
-------------------------------------------------------------------------- */

/// The supervising professor proposes the defense of a project whose final
/// report is in. At most one defense exists per project.
#[allow(clippy::too_many_arguments)]
pub fn propose(
    id: DbId,
    project: &Project,
    actor: &Actor,
    input: &DefenseProposal,
    existing: Option<&Defense>,
    current_year: Option<&AcademicYear>,
    ids: &mut IdSequence,
    now: Timestamp,
) -> Result<Defense, CoreError> {
    project::ensure_ready_for_defense(project, actor)?;
    if let Some(existing) = existing {
        return Err(CoreError::Conflict(format!(
            "Project {} already has defense {} ({})",
            project.id,
            existing.id,
            existing.status()
        )));
    }
    if input.project_id != project.id {
        return Err(CoreError::field(
            "project_id",
            format!("proposal targets project {}, not {}", input.project_id, project.id),
        ));
    }
    let slot = input.check(current_year)?;

    Ok(Defense {
        id,
        project_id: project.id,
        proposed_slot: slot,
        state: DefenseState::Proposed,
        jury_members: jury::build_members(&input.jury_members, ids),
        proposed_by: actor.user_id,
        proposed_at: now,
        notes: input.notes.clone().filter(|n| !n.trim().is_empty()),
        evaluation: None,
        revision: 0,
        updated_at: now,
    })
}

/// Admin confirms a proposal, optionally overriding parts of the slot.
pub fn validate(
    defense: &Defense,
    actor: &Actor,
    input: &DefenseValidation,
    ids: &mut IdSequence,
    now: Timestamp,
) -> Result<Defense, CoreError> {
    actor.require(Role::Admin, "validate a defense")?;
    ensure_status(defense, "validate", &[DefenseStatus::Proposed])?;

    let proposed = &defense.proposed_slot;
    let final_slot = Slot::new(
        input.final_date.unwrap_or(proposed.date),
        input.final_time.unwrap_or(proposed.time),
        input.final_room.as_deref().unwrap_or(&proposed.room),
    )
    .map_err(|_| CoreError::field("final_room", "room cannot be blank"))?;
    let jury_members = replace_jury(&defense.jury_members, input.jury_members.as_ref(), ids)?;

    let mut next = defense.clone();
    next.state = DefenseState::Validated {
        final_slot,
        validated_at: now,
        validated_by: actor.user_id,
    };
    next.jury_members = jury_members;
    next.updated_at = now;
    Ok(next)
}

/// Admin schedules the defense on a different slot, citing a reason.
pub fn modify(
    defense: &Defense,
    actor: &Actor,
    input: &DefenseModification,
    ids: &mut IdSequence,
    now: Timestamp,
) -> Result<Defense, CoreError> {
    actor.require(Role::Admin, "modify a defense")?;
    ensure_status(defense, "modify", &[DefenseStatus::Proposed])?;
    input.validate()?;
    let reason = required_text("reason", &input.reason, "a modification reason is required")?;
    let final_slot = Slot::new(input.final_date, input.final_time, &input.final_room)
        .map_err(|_| CoreError::field("final_room", "room is required"))?;
    let jury_members = replace_jury(&defense.jury_members, input.jury_members.as_ref(), ids)?;

    let mut next = defense.clone();
    next.state = DefenseState::Modified {
        final_slot,
        modification_reason: reason,
        modified_at: now,
        modified_by: actor.user_id,
    };
    next.jury_members = jury_members;
    next.updated_at = now;
    Ok(next)
}

/// Admin postpones (REPORTEE) a proposal.
pub fn reject(
    defense: &Defense,
    actor: &Actor,
    reason: &str,
    now: Timestamp,
) -> Result<Defense, CoreError> {
    actor.require(Role::Admin, "reject a defense")?;
    ensure_status(defense, "reject", &[DefenseStatus::Proposed])?;
    let reason = required_text("reason", reason, "a rejection reason is required")?;

    let mut next = defense.clone();
    next.state = DefenseState::Postponed {
        rejection_reason: reason,
        postponed_at: now,
        postponed_by: actor.user_id,
    };
    next.updated_at = now;
    Ok(next)
}

/// The supervising professor proposes a postponed defense again. The same
/// entity returns to PROPOSEE with a new slot and jury.
#[allow(clippy::too_many_arguments)]
pub fn repropose(
    defense: &Defense,
    project: &Project,
    actor: &Actor,
    input: &DefenseProposal,
    current_year: Option<&AcademicYear>,
    ids: &mut IdSequence,
    now: Timestamp,
) -> Result<Defense, CoreError> {
    project::ensure_ready_for_defense(project, actor)?;
    ensure_status(defense, "repropose", &[DefenseStatus::Postponed])?;
    if input.project_id != defense.project_id {
        return Err(CoreError::field(
            "project_id",
            format!("proposal targets project {}, not {}", input.project_id, defense.project_id),
        ));
    }
    let slot = input.check(current_year)?;

    let mut next = defense.clone();
    next.proposed_slot = slot;
    next.state = DefenseState::Proposed;
    next.jury_members = jury::build_members(&input.jury_members, ids);
    next.proposed_by = actor.user_id;
    next.proposed_at = now;
    next.notes = input.notes.clone().filter(|n| !n.trim().is_empty());
    next.revision += 1;
    next.updated_at = now;
    Ok(next)
}

/// The supervising professor, presiding the jury, records the evaluation.
pub fn evaluate(
    defense: &Defense,
    project: &Project,
    actor: &Actor,
    input: EvaluationSubmission,
    now: Timestamp,
) -> Result<Defense, CoreError> {
    project::ensure_supervisor(project, actor, "evaluate a defense")?;
    ensure_status(
        defense,
        "evaluate",
        &[DefenseStatus::Validated, DefenseStatus::Modified],
    )?;
    if defense.evaluation.is_some() {
        return Err(CoreError::Conflict(format!(
            "Defense {} has already been evaluated",
            defense.id
        )));
    }
    input.check()?;

    let mut next = defense.clone();
    next.evaluation = Some(input.into_evaluation(actor.user_id, now));
    next.updated_at = now;
    Ok(next)
}

/// Admin swaps the examiners of a live defense. A graded jury is final.
pub fn update_jury(
    defense: &Defense,
    actor: &Actor,
    input: &JuryUpdate,
    ids: &mut IdSequence,
    now: Timestamp,
) -> Result<Defense, CoreError> {
    actor.require(Role::Admin, "update a defense jury")?;
    ensure_status(
        defense,
        "update the jury of",
        &[DefenseStatus::Proposed, DefenseStatus::Validated, DefenseStatus::Modified],
    )?;
    if defense.evaluation.is_some() {
        return Err(CoreError::Conflict(format!(
            "Defense {} has been evaluated; its jury can no longer change",
            defense.id
        )));
    }

    let mut next = defense.clone();
    next.jury_members = replace_jury(&defense.jury_members, Some(&input.jury_members), ids)?;
    next.updated_at = now;
    Ok(next)
}

/// Project status implied by a defense that just changed state.
pub fn sync_project(
    defense: &Defense,
    project: &Project,
    now: Timestamp,
) -> Result<Project, CoreError> {
    if defense.evaluation.is_some() {
        return project::mark_evaluated(project, now);
    }
    match defense.state {
        DefenseState::Proposed => Ok(project.clone()),
        DefenseState::Validated { .. } | DefenseState::Modified { .. } => {
            project::mark_defense_scheduled(project, now)
        }
        DefenseState::Postponed { .. } => project::revert_to_final_submission(project, now),
    }
}
