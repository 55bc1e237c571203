//! `/projects` endpoints: submission, review, assignment, deliverables.

use async_trait::async_trait;
use pfehub_core::deliverable::{Deliverable, DeliverableSubmission};
use pfehub_core::error::CoreError;
use pfehub_core::project::{
    AssignmentInput, Project, ProjectResubmission, ProjectStatus, ProjectSubmission,
    RejectionInput, ReviewDecision,
};
use pfehub_core::recommendation::Recommendation;
use pfehub_core::types::DbId;
use reqwest::multipart::Form;
use validator::Validate;

use crate::api::{ApiClient, Attachment};
use crate::error::ClientResult;
use crate::gateway::ProjectGateway;

/// Filters for the admin project listing. Unset fields match everything.
#[derive(Debug, Clone, Default)]
pub struct ProjectQuery {
    pub status: Option<ProjectStatus>,
    pub professor_id: Option<DbId>,
    pub student_id: Option<DbId>,
}

impl ProjectQuery {
    fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(status) = self.status {
            pairs.push(("status", status.as_str().to_string()));
        }
        if let Some(id) = self.professor_id {
            pairs.push(("professorId", id.to_string()));
        }
        if let Some(id) = self.student_id {
            pairs.push(("studentId", id.to_string()));
        }
        pairs
    }
}

fn submission_form(input: &ProjectSubmission) -> ClientResult<Form> {
    let mut form = Form::new()
        .text("title", input.title.clone())
        .text("description", input.description.clone())
        .text("objectives", input.objectives.clone())
        .text("keywords", serde_json::to_string(&input.keywords)?);
    let optional = [
        ("context", &input.context),
        ("methodology", &input.methodology),
        ("expectedResults", &input.expected_results),
    ];
    for (name, value) in optional {
        if let Some(value) = value {
            form = form.text(name, value.clone());
        }
    }
    Ok(form)
}

#[derive(Debug, Clone)]
pub struct ProjectService {
    api: ApiClient,
}

impl ProjectService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn list(&self, query: &ProjectQuery) -> ClientResult<Vec<Project>> {
        self.api.get("/projects", &query.to_pairs()).await
    }

    pub async fn get(&self, id: DbId) -> ClientResult<Option<Project>> {
        self.api.get_optional(&format!("/projects/{id}"), &[]).await
    }

    /// The student's single project, `None` before they submit.
    pub async fn by_student(&self, student_id: DbId) -> ClientResult<Option<Project>> {
        self.api
            .get_optional(&format!("/projects/student/{student_id}"), &[])
            .await
    }

    pub async fn by_professor(&self, professor_id: DbId) -> ClientResult<Vec<Project>> {
        self.api
            .get(&format!("/projects/professor/{professor_id}"), &[])
            .await
    }

    pub async fn pending_assignments(&self) -> ClientResult<Vec<Project>> {
        self.api.get("/projects/pending-assignments", &[]).await
    }

    pub async fn ready_for_defense(&self) -> ClientResult<Vec<Project>> {
        self.api.get("/projects/ready-for-defense", &[]).await
    }

    /// Ranked supervisors for a pending project. `limit` defaults server-side.
    pub async fn recommendations(
        &self,
        id: DbId,
        limit: Option<usize>,
    ) -> ClientResult<Vec<Recommendation>> {
        let query: Vec<(&str, String)> = limit
            .map(|l| vec![("limit", l.to_string())])
            .unwrap_or_default();
        self.api
            .get(&format!("/projects/{id}/recommendations"), &query)
            .await
    }

    pub async fn submit(
        &self,
        input: &ProjectSubmission,
        proposal: Option<Attachment>,
    ) -> ClientResult<Project> {
        input.validate()?;
        if input.title.trim().is_empty() {
            return Err(CoreError::field("title", "title is required").into());
        }
        let mut form = submission_form(input)?;
        if let Some(file) = proposal {
            form = form.part("proposalFile", file.into_part());
        }
        self.api.upload("/projects/submit", form).await
    }

    pub async fn assign(&self, id: DbId, input: &AssignmentInput) -> ClientResult<Project> {
        self.api.post(&format!("/projects/{id}/assign"), input).await
    }

    pub async fn accept(&self, id: DbId, input: &ReviewDecision) -> ClientResult<Project> {
        self.api.put(&format!("/projects/{id}/accept"), input).await
    }

    pub async fn reject(&self, id: DbId, input: &RejectionInput) -> ClientResult<Project> {
        if input.reason.trim().is_empty() {
            return Err(CoreError::field("reason", "a rejection reason is required").into());
        }
        self.api.put(&format!("/projects/{id}/reject"), input).await
    }

    pub async fn resubmit(&self, id: DbId, input: &ProjectResubmission) -> ClientResult<Project> {
        input.validate()?;
        self.api.put(&format!("/projects/{id}/resubmit"), input).await
    }

    pub async fn submit_final_report(&self, id: DbId, report: Attachment) -> ClientResult<Project> {
        let form = Form::new().part("finalReport", report.into_part());
        self.api
            .upload(&format!("/projects/{id}/final-submission"), form)
            .await
    }

    pub async fn submit_deliverable(
        &self,
        input: &DeliverableSubmission,
        file: Attachment,
    ) -> ClientResult<Deliverable> {
        input.validate()?;
        let mut form = Form::new()
            .text("projectId", input.project_id.to_string())
            .text("title", input.title.clone())
            .text("description", input.description.clone())
            .text("kind", input.kind.as_str())
            .part("file", file.into_part());
        if let Some(notes) = &input.notes {
            form = form.text("notes", notes.clone());
        }
        self.api.upload("/projects/deliverables", form).await
    }

    pub async fn deliverables(&self, project_id: DbId) -> ClientResult<Vec<Deliverable>> {
        self.api
            .get(&format!("/projects/{project_id}/deliverables"), &[])
            .await
    }
}

#[async_trait]
impl ProjectGateway for ProjectService {
    async fn project(&self, id: DbId) -> ClientResult<Option<Project>> {
        self.get(id).await
    }

    async fn project_for_student(&self, student_id: DbId) -> ClientResult<Option<Project>> {
        self.by_student(student_id).await
    }

    async fn submit(
        &self,
        input: &ProjectSubmission,
        proposal: Option<Attachment>,
    ) -> ClientResult<Project> {
        ProjectService::submit(self, input, proposal).await
    }

    async fn assign(&self, id: DbId, input: &AssignmentInput) -> ClientResult<Project> {
        ProjectService::assign(self, id, input).await
    }

    async fn accept(&self, id: DbId, input: &ReviewDecision) -> ClientResult<Project> {
        ProjectService::accept(self, id, input).await
    }

    async fn reject(&self, id: DbId, input: &RejectionInput) -> ClientResult<Project> {
        ProjectService::reject(self, id, input).await
    }

    async fn resubmit(&self, id: DbId, input: &ProjectResubmission) -> ClientResult<Project> {
        ProjectService::resubmit(self, id, input).await
    }

    async fn submit_final_report(&self, id: DbId, report: Attachment) -> ClientResult<Project> {
        ProjectService::submit_final_report(self, id, report).await
    }

    async fn submit_deliverable(
        &self,
        input: &DeliverableSubmission,
        file: Attachment,
    ) -> ClientResult<Deliverable> {
        ProjectService::submit_deliverable(self, input, file).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_pairs_use_wire_names() {
        let query = ProjectQuery {
            status: Some(ProjectStatus::UnderReview),
            professor_id: Some(7),
            student_id: None,
        };
        assert_eq!(
            query.to_pairs(),
            vec![
                ("status", "EN_REVISION".to_string()),
                ("professorId", "7".to_string())
            ]
        );
        assert!(ProjectQuery::default().to_pairs().is_empty());
    }
}
