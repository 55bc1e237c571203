//! Project workflow for one actor: submission, assignment, review,
//! resubmission, deliverables and the final report.

use chrono::Utc;
use pfehub_core::deliverable::{Deliverable, DeliverableSubmission};
use pfehub_core::error::CoreError;
use pfehub_core::project::{
    self, AssignmentInput, Project, ProjectResubmission, ProjectStatus, ProjectSubmission,
    RejectionInput, ReviewDecision,
};
use pfehub_core::roles::{Actor, Role};
use pfehub_core::types::{DbId, FileRef};

use crate::api::Attachment;
use crate::controllers::{Feedback, Tracked};
use crate::error::{ClientError, ClientResult};
use crate::gateway::ProjectGateway;

pub struct ProjectController<G> {
    gateway: G,
    actor: Actor,
    project: Tracked<Project>,
    feedback: Option<Feedback>,
}

impl<G: ProjectGateway> ProjectController<G> {
    pub fn new(gateway: G, actor: Actor) -> Self {
        Self {
            gateway,
            actor,
            project: Tracked::empty(),
            feedback: None,
        }
    }

    /// The project as currently shown, including an in-flight prediction.
    pub fn project(&self) -> Option<&Project> {
        self.project.current()
    }

    pub fn confirmed(&self) -> Option<&Project> {
        self.project.confirmed()
    }

    pub fn feedback(&self) -> Option<&Feedback> {
        self.feedback.as_ref()
    }

    pub async fn load(&mut self, id: DbId) -> ClientResult<Option<&Project>> {
        let project = self.gateway.project(id).await?;
        self.project.commit(project);
        Ok(self.project.current())
    }

    /// Load the student's own project; `None` before they submit.
    pub async fn load_for_student(&mut self, student_id: DbId) -> ClientResult<Option<&Project>> {
        let project = self.gateway.project_for_student(student_id).await?;
        self.project.commit(project);
        Ok(self.project.current())
    }

    // ---------------------------------------------------------------------
    // Transitions
    // ---------------------------------------------------------------------

    pub async fn submit(
        &mut self,
        input: ProjectSubmission,
        proposal: Option<Attachment>,
    ) -> ClientResult<Project> {
        self.feedback = None;
        let check = project::submit(
            0,
            &self.actor,
            &input,
            self.project.confirmed(),
            None,
            None,
            Utc::now(),
        );
        self.guard(check)?;
        let outcome = self.gateway.submit(&input, proposal).await;
        self.settle(outcome, "Project submitted").await
    }

    pub async fn assign(&mut self, professor_id: DbId, notes: Option<String>) -> ClientResult<Project> {
        let current = self.begin()?;
        self.guard(project::ensure_assignable(&current, &self.actor))?;
        // Capacity is only known to the server; predict the status change.
        let mut predicted = current.clone();
        predicted.professor_id = Some(professor_id);
        predicted.status = ProjectStatus::UnderReview;
        predicted.assigned_at = Some(Utc::now());
        self.project.predict(predicted);

        let input = AssignmentInput { professor_id, notes };
        let outcome = self.gateway.assign(current.id, &input).await;
        self.settle(outcome, "Supervisor assigned").await
    }

    pub async fn accept(&mut self, comments: Option<String>) -> ClientResult<Project> {
        let current = self.begin()?;
        let predicted = self.guard(project::accept(
            &current,
            &self.actor,
            comments.as_deref(),
            Utc::now(),
        ))?;
        self.project.predict(predicted);

        let outcome = self
            .gateway
            .accept(current.id, &ReviewDecision { comments })
            .await;
        self.settle(outcome, "Project accepted").await
    }

    pub async fn reject(&mut self, reason: String, comments: Option<String>) -> ClientResult<Project> {
        let current = self.begin()?;
        let predicted = self.guard(project::reject(
            &current,
            &self.actor,
            &reason,
            comments.as_deref(),
            Utc::now(),
        ))?;
        self.project.predict(predicted);

        let input = RejectionInput { reason, comments };
        let outcome = self.gateway.reject(current.id, &input).await;
        self.settle(outcome, "Project rejected").await
    }

    pub async fn resubmit(&mut self, update: ProjectResubmission) -> ClientResult<Project> {
        let current = self.begin()?;
        let predicted =
            self.guard(project::resubmit(&current, &self.actor, &update, Utc::now()))?;
        self.project.predict(predicted);

        let outcome = self.gateway.resubmit(current.id, &update).await;
        self.settle(outcome, "Project resubmitted for review").await
    }

    pub async fn submit_final_report(&mut self, report: Attachment) -> ClientResult<Project> {
        let current = self.begin()?;
        let placeholder = FileRef {
            path: String::new(),
            original_name: report.file_name.clone(),
            size_bytes: report.bytes.len() as u64,
            sha256: String::new(),
        };
        let predicted = self.guard(project::submit_final_report(
            &current,
            &self.actor,
            placeholder,
            Utc::now(),
        ))?;
        self.project.predict(predicted);

        let outcome = self.gateway.submit_final_report(current.id, report).await;
        self.settle(outcome, "Final report submitted").await
    }

    /// Deliverables leave the project itself unchanged.
    pub async fn submit_deliverable(
        &mut self,
        mut input: DeliverableSubmission,
        file: Attachment,
    ) -> ClientResult<Deliverable> {
        let current = self.begin()?;
        self.guard(project::ensure_accepts_deliverables(&current, &self.actor))?;
        input.project_id = current.id;

        match self.gateway.submit_deliverable(&input, file).await {
            Ok(deliverable) => {
                tracing::info!(
                    project_id = current.id,
                    deliverable_id = deliverable.id,
                    "Deliverable submitted"
                );
                self.feedback = Some(Feedback::Success("Deliverable submitted".into()));
                Ok(deliverable)
            }
            Err(e) => {
                if e.is_precondition() {
                    self.refetch().await;
                }
                Err(self.fail(e))
            }
        }
    }

    // ---------------------------------------------------------------------
    // Helpers
    // ---------------------------------------------------------------------

    /// Clear feedback and take the last-confirmed project.
    fn begin(&mut self) -> ClientResult<Project> {
        self.feedback = None;
        if let Some(project) = self.project.confirmed() {
            return Ok(project.clone());
        }
        Err(self.fail(ClientError::NotLoaded("project")))
    }

    fn guard<T>(&mut self, check: Result<T, CoreError>) -> ClientResult<T> {
        check.map_err(|e| self.fail(e.into()))
    }

    fn fail(&mut self, error: ClientError) -> ClientError {
        self.feedback = Some(Feedback::Error(error.to_string()));
        error
    }

    async fn settle(
        &mut self,
        outcome: ClientResult<Project>,
        success: &str,
    ) -> ClientResult<Project> {
        match outcome {
            Ok(project) => {
                tracing::info!(
                    project_id = project.id,
                    status = %project.status,
                    user_id = self.actor.user_id,
                    "{success}"
                );
                self.project.commit(Some(project.clone()));
                self.feedback = Some(Feedback::Success(success.to_string()));
                Ok(project)
            }
            Err(e) => {
                tracing::warn!(user_id = self.actor.user_id, error = %e, "Project transition failed");
                self.project.rollback();
                if e.is_precondition() {
                    self.refetch().await;
                }
                Err(self.fail(e))
            }
        }
    }

    /// Replace the local copy with the server's. Failures are logged only;
    /// the original error is what the caller sees.
    async fn refetch(&mut self) {
        let fresh = match self.project.confirmed() {
            Some(project) => self.gateway.project(project.id).await,
            None if self.actor.role == Role::Student => {
                self.gateway.project_for_student(self.actor.user_id).await
            }
            None => return,
        };
        match fresh {
            Ok(project) => self.project.commit(project),
            Err(e) => tracing::warn!(error = %e, "Refetch after failed transition failed"),
        }
    }
}
