//! Workflow controllers: the boundary a UI binds to.
//!
//! A transition runs in four steps. Feedback from the previous transition is
//! cleared; the same `pfehub-core` guard the server runs is evaluated
//! locally, failing without a request; the predicted entity is shown
//! optimistically; the server's answer is committed, or the prediction is
//! rolled back to the last-confirmed value. Precondition failures (403/409)
//! also refetch the entity since the local copy is evidently stale.

pub mod defense;
pub mod project;

pub use defense::DefenseController;
pub use project::ProjectController;

/// Outcome of the last transition. Success and error are exclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Feedback {
    Success(String),
    Error(String),
}

impl Feedback {
    pub fn message(&self) -> &str {
        match self {
            Feedback::Success(m) | Feedback::Error(m) => m,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Feedback::Error(_))
    }
}

/// Last server-confirmed value and the value currently shown, which differ
/// only while a request is in flight.
#[derive(Debug, Clone)]
pub(crate) struct Tracked<T> {
    confirmed: Option<T>,
    current: Option<T>,
}

impl<T: Clone> Tracked<T> {
    pub(crate) fn empty() -> Self {
        Self {
            confirmed: None,
            current: None,
        }
    }

    pub(crate) fn confirmed(&self) -> Option<&T> {
        self.confirmed.as_ref()
    }

    pub(crate) fn current(&self) -> Option<&T> {
        self.current.as_ref()
    }

    pub(crate) fn predict(&mut self, value: T) {
        self.current = Some(value);
    }

    pub(crate) fn commit(&mut self, value: Option<T>) {
        self.current = value.clone();
        self.confirmed = value;
    }

    pub(crate) fn rollback(&mut self) {
        self.current = self.confirmed.clone();
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{NaiveDate, NaiveTime, Utc};
    use pfehub_core::defense::DefenseProposal;
    use pfehub_core::error::FieldErrors;
    use pfehub_core::jury::JuryMemberInput;
    use pfehub_core::project::{Project, ProjectStatus};
    use pfehub_core::types::DbId;

    use crate::error::{ApiError, ClientError};

    pub(crate) const ADMIN: DbId = 1;
    pub(crate) const PROFESSOR: DbId = 20;
    pub(crate) const STUDENT: DbId = 30;

    pub(crate) fn project(status: ProjectStatus) -> Project {
        let now = Utc::now();
        Project {
            id: 7,
            title: "Titre X".into(),
            description: "Plateforme de gestion des PFE".into(),
            objectives: "Automatiser le suivi".into(),
            context: None,
            methodology: None,
            expected_results: None,
            keywords: vec!["web".into()],
            status,
            student_id: STUDENT,
            professor_id: (status != ProjectStatus::PendingAssignment).then_some(PROFESSOR),
            proposal_file: None,
            submitted_at: now,
            assigned_at: None,
            accepted_at: None,
            final_submitted_at: None,
            final_report: None,
            professor_comments: None,
            rejection_reason: (status == ProjectStatus::Rejected).then(|| "feasibility".into()),
            revision: 0,
            updated_at: now,
        }
    }

    pub(crate) fn proposal(project_id: DbId) -> DefenseProposal {
        DefenseProposal {
            project_id,
            proposed_date: NaiveDate::from_ymd_opt(2025, 6, 15).unwrap(),
            proposed_time: NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
            proposed_room: "A203".into(),
            jury_members: vec![
                JuryMemberInput::examiner("Dr. Amrani", "amrani@univ.ma"),
                JuryMemberInput::examiner("Dr. Bennani", "bennani@univ.ma"),
            ],
            notes: None,
        }
    }

    pub(crate) fn api_error(status: u16, code: &str) -> ClientError {
        ClientError::Api(ApiError {
            status,
            message: format!("{code} from server"),
            code: Some(code.into()),
            field_errors: FieldErrors::new(),
        })
    }
}
