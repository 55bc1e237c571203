//! Seams between the workflow controllers and the network.
//!
//! The HTTP services implement these traits; tests substitute in-memory
//! fakes to exercise rollback without a server.

use async_trait::async_trait;
use pfehub_core::defense::{
    Defense, DefenseModification, DefenseProposal, DefenseRejection, DefenseValidation,
};
use pfehub_core::deliverable::{Deliverable, DeliverableSubmission};
use pfehub_core::evaluation::EvaluationSubmission;
use pfehub_core::project::{
    AssignmentInput, Project, ProjectResubmission, ProjectSubmission, RejectionInput,
    ReviewDecision,
};
use pfehub_core::types::DbId;

use crate::api::Attachment;
use crate::error::ClientResult;

#[async_trait]
pub trait ProjectGateway: Send + Sync {
    /// `None` when the project does not exist or is outside the caller's scope.
    async fn project(&self, id: DbId) -> ClientResult<Option<Project>>;
    async fn project_for_student(&self, student_id: DbId) -> ClientResult<Option<Project>>;
    async fn submit(
        &self,
        input: &ProjectSubmission,
        proposal: Option<Attachment>,
    ) -> ClientResult<Project>;
    async fn assign(&self, id: DbId, input: &AssignmentInput) -> ClientResult<Project>;
    async fn accept(&self, id: DbId, input: &ReviewDecision) -> ClientResult<Project>;
    async fn reject(&self, id: DbId, input: &RejectionInput) -> ClientResult<Project>;
    async fn resubmit(&self, id: DbId, input: &ProjectResubmission) -> ClientResult<Project>;
    async fn submit_final_report(&self, id: DbId, report: Attachment) -> ClientResult<Project>;
    async fn submit_deliverable(
        &self,
        input: &DeliverableSubmission,
        file: Attachment,
    ) -> ClientResult<Deliverable>;
}

#[async_trait]
pub trait DefenseGateway: Send + Sync {
    async fn defense(&self, id: DbId) -> ClientResult<Option<Defense>>;
    /// The project a defense belongs to, for guard checks and status sync.
    async fn project(&self, id: DbId) -> ClientResult<Option<Project>>;
    async fn propose(&self, input: &DefenseProposal) -> ClientResult<Defense>;
    async fn validate(&self, id: DbId, input: &DefenseValidation) -> ClientResult<Defense>;
    async fn modify(&self, id: DbId, input: &DefenseModification) -> ClientResult<Defense>;
    async fn reject(&self, id: DbId, input: &DefenseRejection) -> ClientResult<Defense>;
    async fn repropose(&self, id: DbId, input: &DefenseProposal) -> ClientResult<Defense>;
    async fn evaluate(&self, id: DbId, input: &EvaluationSubmission) -> ClientResult<Defense>;
}
