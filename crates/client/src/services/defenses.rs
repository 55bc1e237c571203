//! `/defenses` endpoints.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use pfehub_core::conflict::ConflictReport;
use pfehub_core::defense::{
    Defense, DefenseModification, DefenseProposal, DefenseRejection, DefenseValidation,
};
use pfehub_core::error::CoreError;
use pfehub_core::evaluation::{DefenseEvaluation, EvaluationSubmission};
use pfehub_core::jury::JuryMember;
use pfehub_core::project::Project;
use pfehub_core::schedule;
use pfehub_core::types::DbId;
use validator::Validate;

use crate::api::ApiClient;
use crate::error::ClientResult;
use crate::gateway::DefenseGateway;

fn require_reason(reason: &str) -> Result<(), CoreError> {
    if reason.trim().is_empty() {
        Err(CoreError::field("reason", "a reason is required"))
    } else {
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct DefenseService {
    api: ApiClient,
}

impl DefenseService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Date window checks are left to the server, which knows the current year.
    pub async fn propose(&self, input: &DefenseProposal) -> ClientResult<Defense> {
        input.check(None)?;
        self.api.post("/defenses/propose", input).await
    }

    pub async fn validate(&self, id: DbId, input: &DefenseValidation) -> ClientResult<Defense> {
        self.api.put(&format!("/defenses/{id}/validate"), input).await
    }

    pub async fn modify(&self, id: DbId, input: &DefenseModification) -> ClientResult<Defense> {
        input.validate()?;
        require_reason(&input.reason)?;
        self.api.put(&format!("/defenses/{id}/modify"), input).await
    }

    pub async fn reject(&self, id: DbId, input: &DefenseRejection) -> ClientResult<Defense> {
        require_reason(&input.reason)?;
        self.api.put(&format!("/defenses/{id}/reject"), input).await
    }

    pub async fn repropose(&self, id: DbId, input: &DefenseProposal) -> ClientResult<Defense> {
        input.check(None)?;
        self.api.put(&format!("/defenses/{id}/repropose"), input).await
    }

    pub async fn evaluate(&self, id: DbId, input: &EvaluationSubmission) -> ClientResult<Defense> {
        input.check()?;
        self.api.post(&format!("/defenses/{id}/evaluate"), input).await
    }

    pub async fn get(&self, id: DbId) -> ClientResult<Option<Defense>> {
        self.api.get_optional(&format!("/defenses/{id}"), &[]).await
    }

    /// `None` until the defense has been evaluated.
    pub async fn evaluation(&self, id: DbId) -> ClientResult<Option<DefenseEvaluation>> {
        self.api
            .get_optional(&format!("/defenses/{id}/evaluation"), &[])
            .await
    }

    /// The full jury, supervising professor first as president.
    pub async fn jury(&self, id: DbId) -> ClientResult<Vec<JuryMember>> {
        self.api.get(&format!("/defenses/{id}/jury"), &[]).await
    }

    pub async fn check_conflicts(
        &self,
        date: NaiveDate,
        time: NaiveTime,
        room: &str,
        exclude: Option<DbId>,
    ) -> ClientResult<ConflictReport> {
        let mut query = vec![
            ("date", date.to_string()),
            ("time", schedule::format_time(&time)),
            ("room", room.to_string()),
        ];
        if let Some(id) = exclude {
            query.push(("excludeId", id.to_string()));
        }
        self.api.get("/defenses/check-conflicts", &query).await
    }

    pub async fn pending(&self) -> ClientResult<Vec<Defense>> {
        self.api.get("/defenses/pending", &[]).await
    }

    pub async fn by_professor(&self, professor_id: DbId) -> ClientResult<Vec<Defense>> {
        self.api
            .get(&format!("/defenses/professor/{professor_id}"), &[])
            .await
    }

    pub async fn by_student(&self, student_id: DbId) -> ClientResult<Option<Defense>> {
        self.api
            .get_optional(&format!("/defenses/student/{student_id}"), &[])
            .await
    }

    /// Scheduled defenses from `from` onwards (server default: today).
    pub async fn upcoming(&self, from: Option<NaiveDate>) -> ClientResult<Vec<Defense>> {
        let query: Vec<(&str, String)> = from
            .map(|d| vec![("from", d.to_string())])
            .unwrap_or_default();
        self.api.get("/defenses/upcoming", &query).await
    }
}

#[async_trait]
impl DefenseGateway for DefenseService {
    async fn defense(&self, id: DbId) -> ClientResult<Option<Defense>> {
        self.get(id).await
    }

    async fn project(&self, id: DbId) -> ClientResult<Option<Project>> {
        self.api.get_optional(&format!("/projects/{id}"), &[]).await
    }

    async fn propose(&self, input: &DefenseProposal) -> ClientResult<Defense> {
        DefenseService::propose(self, input).await
    }

    async fn validate(&self, id: DbId, input: &DefenseValidation) -> ClientResult<Defense> {
        DefenseService::validate(self, id, input).await
    }

    async fn modify(&self, id: DbId, input: &DefenseModification) -> ClientResult<Defense> {
        DefenseService::modify(self, id, input).await
    }

    async fn reject(&self, id: DbId, input: &DefenseRejection) -> ClientResult<Defense> {
        DefenseService::reject(self, id, input).await
    }

    async fn repropose(&self, id: DbId, input: &DefenseProposal) -> ClientResult<Defense> {
        DefenseService::repropose(self, id, input).await
    }

    async fn evaluate(&self, id: DbId, input: &EvaluationSubmission) -> ClientResult<Defense> {
        DefenseService::evaluate(self, id, input).await
    }
}
