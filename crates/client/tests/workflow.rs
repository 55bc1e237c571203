//! End-to-end workflows: the client's controllers and services against a
//! live API server over HTTP.

mod common;

use assert_matches::assert_matches;
use pfehub_client::config::ClientConfig;
use pfehub_client::controllers::defense::DefenseController;
use pfehub_client::controllers::project::ProjectController;
use pfehub_client::error::ClientError;
use pfehub_client::services::{DefenseService, ProjectService};
use pfehub_client::PfeHubClient;
use pfehub_core::defense::{DefenseStatus, DefenseValidation};
use pfehub_core::error::CoreError;
use pfehub_core::project::{ProjectResubmission, ProjectStatus};
use pfehub_core::types::DbId;

use common::*;

/// Drive a fresh submission up to final submission and return its id.
async fn project_ready_for_defense(server: &TestServer) -> DbId {
    let (student, student_actor) = server.client(STUDENT_EMAIL).await;
    let (admin, admin_actor) = server.admin().await;
    let (professor, professor_actor) = server.client(PROFESSOR_EMAIL).await;

    let mut submitting = ProjectController::new(student.projects(), student_actor);
    let id = submitting
        .submit(submission(), Some(proposal_file()))
        .await
        .unwrap()
        .id;

    let mut assigning = ProjectController::new(admin.projects(), admin_actor);
    assigning.load(id).await.unwrap();
    assigning.assign(server.professor_id(), None).await.unwrap();

    let mut reviewing = ProjectController::new(professor.projects(), professor_actor);
    reviewing.load(id).await.unwrap();
    reviewing.accept(Some("Bon sujet".into())).await.unwrap();

    let mut reporting = ProjectController::new(student.projects(), student_actor);
    reporting.load(id).await.unwrap();
    let project = reporting.submit_final_report(final_report()).await.unwrap();
    assert_eq!(project.status, ProjectStatus::FinalSubmission);
    id
}

async fn proposed_defense(server: &TestServer, project_id: DbId) -> DefenseController<DefenseService> {
    let (professor, actor) = server.client(PROFESSOR_EMAIL).await;
    let mut controller = DefenseController::new(professor.defenses(), actor);
    controller.load_project(project_id).await.unwrap();
    controller.propose(proposal(project_id)).await.unwrap();
    controller
}

#[tokio::test]
async fn test_submission_review_and_resubmission() {
    let server = spawn_server().await;
    let (student, student_actor) = server.client(STUDENT_EMAIL).await;
    let (admin, admin_actor) = server.admin().await;
    let (professor, professor_actor) = server.client(PROFESSOR_EMAIL).await;

    // A student submits.
    let mut mine = ProjectController::new(student.projects(), student_actor);
    let submitted = mine.submit(submission(), Some(proposal_file())).await.unwrap();
    assert_eq!(submitted.title, "Titre X");
    assert_eq!(submitted.status, ProjectStatus::PendingAssignment);
    assert!(submitted.professor_id.is_none());
    assert_matches!(mine.feedback(), Some(f) if !f.is_error());

    // An admin assigns the supervisor.
    let mut assigning = ProjectController::new(admin.projects(), admin_actor);
    assigning.load(submitted.id).await.unwrap();
    let assigned = assigning.assign(server.professor_id(), None).await.unwrap();
    assert_eq!(assigned.status, ProjectStatus::UnderReview);
    assert_eq!(assigned.professor_id, Some(server.professor_id()));

    // The supervisor rejects with a reason.
    let mut reviewing = ProjectController::new(professor.projects(), professor_actor);
    reviewing.load(submitted.id).await.unwrap();
    let rejected = reviewing
        .reject("feasibility".into(), Some("scope too broad".into()))
        .await
        .unwrap();
    assert_eq!(rejected.status, ProjectStatus::Rejected);
    assert_eq!(rejected.rejection_reason.as_deref(), Some("feasibility"));

    // The student sees the rejection and resubmits.
    mine.load_for_student(server.student_id()).await.unwrap();
    assert_eq!(mine.project().unwrap().status, ProjectStatus::Rejected);
    let update = ProjectResubmission {
        title: Some("Titre X, périmètre réduit".into()),
        ..ProjectResubmission::default()
    };
    let resubmitted = mine.resubmit(update).await.unwrap();
    assert_eq!(resubmitted.status, ProjectStatus::UnderReview);
    assert_eq!(resubmitted.revision, 1);
    assert!(resubmitted.rejection_reason.is_none());
}

#[tokio::test]
async fn test_second_submission_is_refused_by_the_server() {
    let server = spawn_server().await;
    let (student, actor) = server.client(STUDENT_EMAIL).await;

    let mut first = ProjectController::new(student.projects(), actor);
    first.submit(submission(), None).await.unwrap();

    // A fresh controller has no local project, so only the server can refuse.
    let mut second = ProjectController::new(student.projects(), actor);
    let err = second.submit(submission(), None).await.unwrap_err();
    assert!(err.is_precondition());
    assert_matches!(err, ClientError::Api(api) if api.code.as_deref() == Some("CONFLICT"));
    assert_matches!(second.feedback(), Some(f) if f.is_error());
}

#[tokio::test]
async fn test_proposal_keeps_project_in_final_submission() {
    let server = spawn_server().await;
    let project_id = project_ready_for_defense(&server).await;
    let controller = proposed_defense(&server, project_id).await;

    let defense = controller.defense().unwrap();
    assert_eq!(defense.status(), DefenseStatus::Proposed);
    assert_eq!(defense.proposed_slot.room, "A203");
    assert_eq!(
        controller.project().unwrap().status,
        ProjectStatus::FinalSubmission
    );

    let (admin, _) = server.admin().await;
    let pending = admin.defenses().pending().await.unwrap();
    assert_eq!(pending.len(), 1);
    let jury = admin.defenses().jury(defense.id).await.unwrap();
    assert_eq!(jury.len(), 3);
    assert_eq!(jury[0].professor_id, Some(server.professor_id()));
}

#[tokio::test]
async fn test_reported_defense_cannot_be_evaluated() {
    let server = spawn_server().await;
    let project_id = project_ready_for_defense(&server).await;
    let mut professor_view = proposed_defense(&server, project_id).await;
    let defense_id = professor_view.defense().unwrap().id;

    let (admin, admin_actor) = server.admin().await;
    let mut admin_view = DefenseController::new(admin.defenses(), admin_actor);
    admin_view.load(defense_id).await.unwrap();
    let mut stale = DefenseController::new(admin.defenses(), admin_actor);
    stale.load(defense_id).await.unwrap();

    let reported = admin_view.reject("conflit de salle".into()).await.unwrap();
    assert_eq!(reported.status(), DefenseStatus::Postponed);
    assert_eq!(
        admin_view.project().unwrap().status,
        ProjectStatus::FinalSubmission
    );

    // The stale view still shows a proposal: its local guard passes, the
    // server refuses, and the view resyncs to the postponed defense.
    let err = stale.validate(DefenseValidation::default()).await.unwrap_err();
    assert!(err.is_precondition());
    assert_matches!(stale.feedback(), Some(f) if f.is_error());
    assert_eq!(stale.defense().unwrap().status(), DefenseStatus::Postponed);

    // Evaluation needs a scheduled defense, locally and on the server.
    professor_view.load(defense_id).await.unwrap();
    let err = professor_view.evaluate(evaluation()).await.unwrap_err();
    assert_matches!(err, ClientError::Core(CoreError::InvalidTransition { .. }));
    let (professor, _) = server.client(PROFESSOR_EMAIL).await;
    let err = professor
        .defenses()
        .evaluate(defense_id, &evaluation())
        .await
        .unwrap_err();
    assert_matches!(err, ClientError::Api(api) if api.code.as_deref() == Some("INVALID_TRANSITION"));

    let again = professor_view.repropose(proposal(project_id)).await.unwrap();
    assert_eq!(again.id, defense_id);
    assert_eq!(again.status(), DefenseStatus::Proposed);
    assert_eq!(again.revision, 1);
}

#[tokio::test]
async fn test_validation_without_overrides_keeps_proposed_slot() {
    let server = spawn_server().await;
    let project_id = project_ready_for_defense(&server).await;
    let mut professor_view = proposed_defense(&server, project_id).await;
    let defense_id = professor_view.defense().unwrap().id;

    let (admin, admin_actor) = server.admin().await;
    let mut admin_view = DefenseController::new(admin.defenses(), admin_actor);
    admin_view.load(defense_id).await.unwrap();
    let validated = admin_view
        .validate(DefenseValidation::default())
        .await
        .unwrap();
    assert_eq!(validated.status(), DefenseStatus::Validated);
    assert_eq!(validated.scheduled_slot(), Some(&validated.proposed_slot));
    assert_eq!(
        admin_view.project().unwrap().status,
        ProjectStatus::DefenseScheduled
    );

    // A second validation is refused locally.
    let err = admin_view
        .validate(DefenseValidation::default())
        .await
        .unwrap_err();
    assert_matches!(err, ClientError::Core(CoreError::InvalidTransition { .. }));

    professor_view.load(defense_id).await.unwrap();
    let evaluated = professor_view.evaluate(evaluation()).await.unwrap();
    assert!(evaluated.evaluation.is_some());
    assert_eq!(
        professor_view.project().unwrap().status,
        ProjectStatus::Evaluated
    );
    let stored = admin.defenses().evaluation(defense_id).await.unwrap().unwrap();
    assert_eq!(stored.final_grade, 16.0);
}

#[tokio::test]
async fn test_conflict_check_reports_taken_room() {
    let server = spawn_server().await;
    let project_id = project_ready_for_defense(&server).await;
    let controller = proposed_defense(&server, project_id).await;
    let defense = controller.defense().unwrap();
    let slot = &defense.proposed_slot;

    let (admin, _) = server.admin().await;
    let service = admin.defenses();
    let report = service
        .check_conflicts(slot.date, slot.time, &slot.room, None)
        .await
        .unwrap();
    assert!(report.has_conflict);

    let report = service
        .check_conflicts(slot.date, slot.time, &slot.room, Some(defense.id))
        .await
        .unwrap();
    assert!(!report.has_conflict);
}

#[tokio::test]
async fn test_scoped_reads_come_back_empty() {
    let server = spawn_server().await;
    let (student, _) = server.client(STUDENT_EMAIL).await;
    let (admin, _) = server.admin().await;

    let projects: ProjectService = student.projects();
    assert!(projects.by_student(server.student_id()).await.unwrap().is_none());
    assert!(student
        .defenses()
        .by_student(server.student_id())
        .await
        .unwrap()
        .is_none());
    assert!(admin.admin().current_academic_year().await.unwrap().is_none());

    // Another student's project looks missing rather than forbidden.
    let other = server.seed.student_ids[1];
    assert!(projects.by_student(other).await.unwrap().is_none());
}

#[tokio::test]
async fn test_token_survives_reconnect_until_logout() {
    let server = spawn_server().await;
    let (first, _) = server.client(STUDENT_EMAIL).await;

    let reconnected = PfeHubClient::connect(&server.config(STUDENT_EMAIL))
        .await
        .unwrap();
    let me = reconnected.auth().me().await.unwrap();
    assert_eq!(me.id, server.student_id());

    first.auth().logout().await.unwrap();
    let fresh = PfeHubClient::connect(&server.config(STUDENT_EMAIL))
        .await
        .unwrap();
    let err = fresh.auth().me().await.unwrap_err();
    assert_matches!(err, ClientError::Api(api) if api.status == 401);
}

#[tokio::test]
async fn test_unreachable_server_is_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let config = ClientConfig {
        api_url: "http://127.0.0.1:1/api".into(),
        token_file: dir.path().join("auth_token"),
        timeout_secs: 2,
    };
    let client = PfeHubClient::connect(&config).await.unwrap();
    let err = client
        .auth()
        .login("admin@pfehub.ma", "whatever")
        .await
        .unwrap_err();
    assert!(err.is_unavailable());
    assert!(!err.is_precondition());
}
