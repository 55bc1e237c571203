//! Defense workflow for one actor, keeping the owning project's status in
//! step with the defense.

use chrono::Utc;
use pfehub_core::defense::{
    self, Defense, DefenseModification, DefenseProposal, DefenseRejection, DefenseValidation,
};
use pfehub_core::error::CoreError;
use pfehub_core::evaluation::EvaluationSubmission;
use pfehub_core::project::Project;
use pfehub_core::roles::Actor;
use pfehub_core::types::{DbId, IdSequence};

use crate::controllers::{Feedback, Tracked};
use crate::error::{ClientError, ClientResult};
use crate::gateway::DefenseGateway;

pub struct DefenseController<G> {
    gateway: G,
    actor: Actor,
    project: Option<Project>,
    defense: Tracked<Defense>,
    feedback: Option<Feedback>,
    /// Placeholder ids for jury rows in predicted defenses.
    ids: IdSequence,
}

impl<G: DefenseGateway> DefenseController<G> {
    pub fn new(gateway: G, actor: Actor) -> Self {
        Self {
            gateway,
            actor,
            project: None,
            defense: Tracked::empty(),
            feedback: None,
            ids: IdSequence::new(),
        }
    }

    /// The defense as currently shown, including an in-flight prediction.
    pub fn defense(&self) -> Option<&Defense> {
        self.defense.current()
    }

    pub fn confirmed(&self) -> Option<&Defense> {
        self.defense.confirmed()
    }

    /// The owning project as last confirmed by the server.
    pub fn project(&self) -> Option<&Project> {
        self.project.as_ref()
    }

    pub fn feedback(&self) -> Option<&Feedback> {
        self.feedback.as_ref()
    }

    /// Load a project that has no defense yet, ahead of [`propose`](Self::propose).
    pub async fn load_project(&mut self, project_id: DbId) -> ClientResult<Option<&Project>> {
        self.project = self.gateway.project(project_id).await?;
        self.defense.commit(None);
        Ok(self.project.as_ref())
    }

    /// Load a defense together with its project.
    pub async fn load(&mut self, defense_id: DbId) -> ClientResult<Option<&Defense>> {
        let defense = self.gateway.defense(defense_id).await?;
        self.project = match &defense {
            Some(d) => self.gateway.project(d.project_id).await?,
            None => None,
        };
        self.defense.commit(defense);
        Ok(self.defense.current())
    }

    // ---------------------------------------------------------------------
    // Transitions
    // ---------------------------------------------------------------------

    pub async fn propose(&mut self, input: DefenseProposal) -> ClientResult<Defense> {
        self.feedback = None;
        let project = self.require_project()?;
        let check = defense::propose(
            0,
            &project,
            &self.actor,
            &input,
            self.defense.confirmed(),
            None,
            &mut self.ids,
            Utc::now(),
        );
        self.guard(check)?;

        let outcome = self.gateway.propose(&input).await;
        self.settle(outcome, "Defense proposed").await
    }

    /// Omitted overrides keep the proposed slot.
    pub async fn validate(&mut self, input: DefenseValidation) -> ClientResult<Defense> {
        let current = self.begin()?;
        let check = defense::validate(&current, &self.actor, &input, &mut self.ids, Utc::now());
        let predicted = self.guard(check)?;
        self.defense.predict(predicted);

        let outcome = self.gateway.validate(current.id, &input).await;
        self.settle(outcome, "Defense validated").await
    }

    pub async fn modify(&mut self, input: DefenseModification) -> ClientResult<Defense> {
        let current = self.begin()?;
        let check = defense::modify(&current, &self.actor, &input, &mut self.ids, Utc::now());
        let predicted = self.guard(check)?;
        self.defense.predict(predicted);

        let outcome = self.gateway.modify(current.id, &input).await;
        self.settle(outcome, "Defense rescheduled").await
    }

    /// Postpone the defense (`REPORTEE`).
    pub async fn reject(&mut self, reason: String) -> ClientResult<Defense> {
        let current = self.begin()?;
        let predicted = self.guard(defense::reject(&current, &self.actor, &reason, Utc::now()))?;
        self.defense.predict(predicted);

        let outcome = self
            .gateway
            .reject(current.id, &DefenseRejection { reason })
            .await;
        self.settle(outcome, "Defense postponed").await
    }

    pub async fn repropose(&mut self, input: DefenseProposal) -> ClientResult<Defense> {
        let current = self.begin()?;
        let project = self.require_project()?;
        let check = defense::repropose(
            &current,
            &project,
            &self.actor,
            &input,
            None,
            &mut self.ids,
            Utc::now(),
        );
        let predicted = self.guard(check)?;
        self.defense.predict(predicted);

        let outcome = self.gateway.repropose(current.id, &input).await;
        self.settle(outcome, "Defense proposed again").await
    }

    pub async fn evaluate(&mut self, input: EvaluationSubmission) -> ClientResult<Defense> {
        let current = self.begin()?;
        let project = self.require_project()?;
        let check = defense::evaluate(&current, &project, &self.actor, input.clone(), Utc::now());
        let predicted = self.guard(check)?;
        self.defense.predict(predicted);

        let outcome = self.gateway.evaluate(current.id, &input).await;
        self.settle(outcome, "Evaluation recorded").await
    }

    // ---------------------------------------------------------------------
    // Helpers
    // ---------------------------------------------------------------------

    fn begin(&mut self) -> ClientResult<Defense> {
        self.feedback = None;
        if let Some(defense) = self.defense.confirmed() {
            return Ok(defense.clone());
        }
        Err(self.fail(ClientError::NotLoaded("defense")))
    }

    fn require_project(&mut self) -> ClientResult<Project> {
        if let Some(project) = &self.project {
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
        outcome: ClientResult<Defense>,
        success: &str,
    ) -> ClientResult<Defense> {
        match outcome {
            Ok(defense) => {
                tracing::info!(
                    defense_id = defense.id,
                    project_id = defense.project_id,
                    status = %defense.status(),
                    user_id = self.actor.user_id,
                    "{success}"
                );
                self.sync_project(&defense).await;
                self.defense.commit(Some(defense.clone()));
                self.feedback = Some(Feedback::Success(success.to_string()));
                Ok(defense)
            }
            Err(e) => {
                tracing::warn!(user_id = self.actor.user_id, error = %e, "Defense transition failed");
                self.defense.rollback();
                if e.is_precondition() {
                    self.refetch().await;
                }
                Err(self.fail(e))
            }
        }
    }

    /// Mirror the server's project status change locally, falling back to a
    /// fetch when the local copy cannot take it.
    async fn sync_project(&mut self, defense: &Defense) {
        let synced = self
            .project
            .as_ref()
            .and_then(|p| defense::sync_project(defense, p, Utc::now()).ok());
        self.project = match synced {
            Some(project) => Some(project),
            None => match self.gateway.project(defense.project_id).await {
                Ok(project) => project,
                Err(e) => {
                    tracing::warn!(error = %e, "Project refresh failed");
                    self.project.take()
                }
            },
        };
    }

    async fn refetch(&mut self) {
        if let Some(id) = self.defense.confirmed().map(|d| d.id) {
            match self.gateway.defense(id).await {
                Ok(defense) => self.defense.commit(defense),
                Err(e) => tracing::warn!(error = %e, "Refetch after failed transition failed"),
            }
        }
        let project_id = self
            .defense
            .confirmed()
            .map(|d| d.project_id)
            .or(self.project.as_ref().map(|p| p.id));
        if let Some(id) = project_id {
            match self.gateway.project(id).await {
                Ok(project) => self.project = project,
                Err(e) => tracing::warn!(error = %e, "Refetch after failed transition failed"),
            }
        }
    }
}
