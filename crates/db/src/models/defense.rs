//! Defense, jury member and evaluation rows.

use chrono::{NaiveDate, NaiveTime};
use pfehub_core::defense::{Defense, DefenseState, DefenseStatus};
use pfehub_core::evaluation::DefenseEvaluation;
use pfehub_core::jury::{JuryMember, JuryRole};
use pfehub_core::schedule::Slot;
use pfehub_core::types::{DbId, Timestamp};
use sqlx::FromRow;

use crate::{to_u32, DbError, DbResult};

pub const DEFENSE_COLUMNS: &str = "id, project_id, status, proposed_date, proposed_time, \
    proposed_room, final_date, final_time, final_room, validated_at, validated_by, \
    modification_reason, modified_at, modified_by, rejection_reason, postponed_at, \
    postponed_by, proposed_by, proposed_at, notes, revision, updated_at";

pub const JURY_COLUMNS: &str = "id, defense_id, position, name, email, role, professor_id";

pub const EVALUATION_COLUMNS: &str = "defense_id, presentation_quality, subject_mastery, \
    question_answers, time_respect, final_grade, comments, strengths, improvements, \
    evaluated_at, evaluated_by";

/// A row from the `defenses` table. State-specific columns are NULL unless
/// the status carries them.
#[derive(Debug, Clone, FromRow)]
pub struct DefenseRow {
    pub id: DbId,
    pub project_id: DbId,
    pub status: String,
    pub proposed_date: NaiveDate,
    pub proposed_time: NaiveTime,
    pub proposed_room: String,
    pub final_date: Option<NaiveDate>,
    pub final_time: Option<NaiveTime>,
    pub final_room: Option<String>,
    pub validated_at: Option<Timestamp>,
    pub validated_by: Option<DbId>,
    pub modification_reason: Option<String>,
    pub modified_at: Option<Timestamp>,
    pub modified_by: Option<DbId>,
    pub rejection_reason: Option<String>,
    pub postponed_at: Option<Timestamp>,
    pub postponed_by: Option<DbId>,
    pub proposed_by: DbId,
    pub proposed_at: Timestamp,
    pub notes: Option<String>,
    pub revision: i64,
    pub updated_at: Timestamp,
}

/// State-specific column values of a defense, as written to its row.
#[derive(Debug, Clone, Default)]
pub struct StateColumns {
    pub final_date: Option<NaiveDate>,
    pub final_time: Option<NaiveTime>,
    pub final_room: Option<String>,
    pub validated_at: Option<Timestamp>,
    pub validated_by: Option<DbId>,
    pub modification_reason: Option<String>,
    pub modified_at: Option<Timestamp>,
    pub modified_by: Option<DbId>,
    pub rejection_reason: Option<String>,
    pub postponed_at: Option<Timestamp>,
    pub postponed_by: Option<DbId>,
}

impl StateColumns {
    pub fn of(state: &DefenseState) -> Self {
        let mut columns = StateColumns::default();
        match state {
            DefenseState::Proposed => {}
            DefenseState::Validated { final_slot, validated_at, validated_by } => {
                columns.set_final_slot(final_slot);
                columns.validated_at = Some(*validated_at);
                columns.validated_by = Some(*validated_by);
            }
            DefenseState::Modified {
                final_slot,
                modification_reason,
                modified_at,
                modified_by,
            } => {
                columns.set_final_slot(final_slot);
                columns.modification_reason = Some(modification_reason.clone());
                columns.modified_at = Some(*modified_at);
                columns.modified_by = Some(*modified_by);
            }
            DefenseState::Postponed { rejection_reason, postponed_at, postponed_by } => {
                columns.rejection_reason = Some(rejection_reason.clone());
                columns.postponed_at = Some(*postponed_at);
                columns.postponed_by = Some(*postponed_by);
            }
        }
        columns
    }

    fn set_final_slot(&mut self, slot: &Slot) {
        self.final_date = Some(slot.date);
        self.final_time = Some(slot.time);
        self.final_room = Some(slot.room.clone());
    }
}

impl DefenseRow {
    fn final_slot(&mut self) -> DbResult<Slot> {
        match (self.final_date, self.final_time, self.final_room.take()) {
            (Some(date), Some(time), Some(room)) => Ok(Slot { date, time, room }),
            _ => Err(DbError::corrupt("Defense", self.id, "scheduled without a final slot")),
        }
    }

    fn state(&mut self) -> DbResult<DefenseState> {
        let id = self.id;
        let status = DefenseStatus::parse(&self.status).map_err(|e| DbError::corrupt("Defense", id, e))?;
        let missing = |column: &str| DbError::corrupt("Defense", id, format!("{status} without {column}"));
        Ok(match status {
            DefenseStatus::Proposed => DefenseState::Proposed,
            DefenseStatus::Validated => DefenseState::Validated {
                final_slot: self.final_slot()?,
                validated_at: self.validated_at.ok_or_else(|| missing("validated_at"))?,
                validated_by: self.validated_by.ok_or_else(|| missing("validated_by"))?,
            },
            DefenseStatus::Modified => DefenseState::Modified {
                final_slot: self.final_slot()?,
                modification_reason: self
                    .modification_reason
                    .take()
                    .ok_or_else(|| missing("modification_reason"))?,
                modified_at: self.modified_at.ok_or_else(|| missing("modified_at"))?,
                modified_by: self.modified_by.ok_or_else(|| missing("modified_by"))?,
            },
            DefenseStatus::Postponed => DefenseState::Postponed {
                rejection_reason: self
                    .rejection_reason
                    .take()
                    .ok_or_else(|| missing("rejection_reason"))?,
                postponed_at: self.postponed_at.ok_or_else(|| missing("postponed_at"))?,
                postponed_by: self.postponed_by.ok_or_else(|| missing("postponed_by"))?,
            },
        })
    }

    /// Assemble the defense from its row and child rows.
    pub fn into_defense(
        mut self,
        jury_members: Vec<JuryMember>,
        evaluation: Option<DefenseEvaluation>,
    ) -> DbResult<Defense> {
        let state = self.state()?;
        Ok(Defense {
            id: self.id,
            project_id: self.project_id,
            proposed_slot: Slot {
                date: self.proposed_date,
                time: self.proposed_time,
                room: self.proposed_room,
            },
            state,
            jury_members,
            proposed_by: self.proposed_by,
            proposed_at: self.proposed_at,
            notes: self.notes,
            evaluation,
            revision: to_u32("Defense", self.id, self.revision)?,
            updated_at: self.updated_at,
        })
    }
}

/// A row from the `jury_members` table.
#[derive(Debug, Clone, FromRow)]
pub struct JuryMemberRow {
    pub id: DbId,
    pub defense_id: DbId,
    pub position: i64,
    pub name: String,
    pub email: Option<String>,
    pub role: String,
    pub professor_id: Option<DbId>,
}

impl TryFrom<JuryMemberRow> for JuryMember {
    type Error = DbError;

    fn try_from(row: JuryMemberRow) -> DbResult<Self> {
        let role = JuryRole::parse(&row.role).map_err(|e| DbError::corrupt("JuryMember", row.id, e))?;
        Ok(JuryMember {
            id: row.id,
            name: row.name,
            email: row.email,
            role,
            professor_id: row.professor_id,
        })
    }
}

/// A row from the `defense_evaluations` table.
#[derive(Debug, Clone, FromRow)]
pub struct EvaluationRow {
    pub defense_id: DbId,
    pub presentation_quality: f64,
    pub subject_mastery: f64,
    pub question_answers: f64,
    pub time_respect: f64,
    pub final_grade: f64,
    pub comments: String,
    pub strengths: Option<String>,
    pub improvements: Option<String>,
    pub evaluated_at: Timestamp,
    pub evaluated_by: DbId,
}

impl From<EvaluationRow> for DefenseEvaluation {
    fn from(row: EvaluationRow) -> Self {
        DefenseEvaluation {
            presentation_quality: row.presentation_quality,
            subject_mastery: row.subject_mastery,
            question_answers: row.question_answers,
            time_respect: row.time_respect,
            final_grade: row.final_grade,
            comments: row.comments,
            strengths: row.strengths,
            improvements: row.improvements,
            evaluated_at: row.evaluated_at,
            evaluated_by: row.evaluated_by,
        }
    }
}
