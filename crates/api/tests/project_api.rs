//! Project lifecycle over HTTP: submission, assignment, review, resubmission.

mod common;

use axum::http::{Method, StatusCode};
use common::{
    admin_token, body_json, build_test_app, get, login, post_multipart, send_json, submit_project,
    OTHER_PROFESSOR_EMAIL, OTHER_STUDENT_EMAIL, PROFESSOR_EMAIL, STUDENT_EMAIL,
};
use serde_json::json;

#[tokio::test]
async fn test_student_submission_awaits_assignment() {
    let app = build_test_app().await;
    let student = login(&app, STUDENT_EMAIL).await;

    let project = submit_project(&app, &student).await;

    assert_eq!(project["title"], "Titre X");
    assert_eq!(project["status"], "EN_ATTENTE_ASSIGNATION");
    assert_eq!(project["studentId"], app.student_id());
    assert_eq!(project["keywords"], json!(["web", "java"]));
    let stored = project["proposalFile"]["path"].as_str().unwrap();
    assert!(stored.starts_with("proposals/"));
    assert!(app.uploads.path().join(stored).exists());

    // The student's scoped read finds it.
    let response = get(
        &app,
        &format!("/api/projects/student/{}", app.student_id()),
        Some(&student),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_second_submission_conflicts() {
    let app = build_test_app().await;
    let student = login(&app, STUDENT_EMAIL).await;
    submit_project(&app, &student).await;

    let response = post_multipart(
        &app,
        "/api/projects/submit",
        &student,
        &[
            ("title", "Autre sujet"),
            ("description", "Description"),
            ("objectives", "Objectifs"),
        ],
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_blank_title_reports_field_error() {
    let app = build_test_app().await;
    let student = login(&app, STUDENT_EMAIL).await;

    let response = post_multipart(
        &app,
        "/api/projects/submit",
        &student,
        &[("title", "  "), ("description", "d"), ("objectives", "o")],
        None,
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert!(json["errors"]["title"].is_array());
}

#[tokio::test]
async fn test_missing_student_project_is_404() {
    let app = build_test_app().await;
    let student = login(&app, STUDENT_EMAIL).await;
    let response = get(
        &app,
        &format!("/api/projects/student/{}", app.student_id()),
        Some(&student),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_assign_then_reject_with_reason() {
    let app = build_test_app().await;
    let student = login(&app, STUDENT_EMAIL).await;
    let admin = admin_token(&app).await;
    let professor = login(&app, PROFESSOR_EMAIL).await;
    let id = submit_project(&app, &student).await["id"].as_i64().unwrap();

    let response = send_json(
        &app,
        Method::POST,
        &format!("/api/projects/{id}/assign"),
        Some(&admin),
        json!({ "professorId": app.professor_id() }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let assigned = body_json(response).await;
    assert_eq!(assigned["data"]["status"], "EN_REVISION");
    assert_eq!(assigned["data"]["professorId"], app.professor_id());

    let response = send_json(
        &app,
        Method::PUT,
        &format!("/api/projects/{id}/reject"),
        Some(&professor),
        json!({ "reason": "feasibility", "comments": "scope too broad" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let rejected = body_json(response).await;
    assert_eq!(rejected["data"]["status"], "REFUSE");
    assert_eq!(rejected["data"]["rejectionReason"], "feasibility");
    assert_eq!(rejected["data"]["professorComments"], "scope too broad");

    // A rejected project can be sent back for review.
    let response = send_json(
        &app,
        Method::PUT,
        &format!("/api/projects/{id}/resubmit"),
        Some(&student),
        json!({ "description": "Perimetre reduit" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let resubmitted = body_json(response).await;
    assert_eq!(resubmitted["data"]["status"], "EN_REVISION");
    assert_eq!(resubmitted["data"]["revision"], 1);
    assert!(resubmitted["data"]["rejectionReason"].is_null());
}

#[tokio::test]
async fn test_accept_by_wrong_professor_is_forbidden() {
    let app = build_test_app().await;
    let student = login(&app, STUDENT_EMAIL).await;
    let admin = admin_token(&app).await;
    let other = login(&app, OTHER_PROFESSOR_EMAIL).await;
    let id = submit_project(&app, &student).await["id"].as_i64().unwrap();
    send_json(
        &app,
        Method::POST,
        &format!("/api/projects/{id}/assign"),
        Some(&admin),
        json!({ "professorId": app.professor_id() }),
    )
    .await;

    let response = send_json(
        &app,
        Method::PUT,
        &format!("/api/projects/{id}/accept"),
        Some(&other),
        json!({}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Nor may they read it.
    let response = get(&app, &format!("/api/projects/{id}"), Some(&other)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unassigned_project_cannot_be_accepted() {
    let app = build_test_app().await;
    let student = login(&app, STUDENT_EMAIL).await;
    let professor = login(&app, PROFESSOR_EMAIL).await;
    let id = submit_project(&app, &student).await["id"].as_i64().unwrap();

    let response = send_json(
        &app,
        Method::PUT,
        &format!("/api/projects/{id}/accept"),
        Some(&professor),
        json!({}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_students_cannot_assign() {
    let app = build_test_app().await;
    let student = login(&app, STUDENT_EMAIL).await;
    let id = submit_project(&app, &student).await["id"].as_i64().unwrap();

    let response = send_json(
        &app,
        Method::POST,
        &format!("/api/projects/{id}/assign"),
        Some(&student),
        json!({ "professorId": app.professor_id() }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_other_students_project_is_hidden() {
    let app = build_test_app().await;
    let student = login(&app, STUDENT_EMAIL).await;
    let other = login(&app, OTHER_STUDENT_EMAIL).await;
    let id = submit_project(&app, &student).await["id"].as_i64().unwrap();

    let response = get(&app, &format!("/api/projects/{id}"), Some(&other)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let response = get(
        &app,
        &format!("/api/projects/student/{}", app.student_id()),
        Some(&other),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_recommendations_rank_matching_professor_first() {
    let app = build_test_app().await;
    let student = login(&app, STUDENT_EMAIL).await;
    let admin = admin_token(&app).await;
    let id = submit_project(&app, &student).await["id"].as_i64().unwrap();

    let response = get(
        &app,
        &format!("/api/projects/{id}/recommendations?limit=2"),
        Some(&admin),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let ranked = body_json(response).await["data"].clone();
    let ranked = ranked.as_array().unwrap();
    assert_eq!(ranked.len(), 2);
    // Same specialization (GL) and "web"/"java" expertise.
    assert_eq!(ranked[0]["professorId"], app.professor_id());
    let first = ranked[0]["matchPercentage"].as_u64().unwrap();
    let second = ranked[1]["matchPercentage"].as_u64().unwrap();
    assert!(first >= second);
}

#[tokio::test]
async fn test_pending_assignments_lists_new_projects() {
    let app = build_test_app().await;
    let student = login(&app, STUDENT_EMAIL).await;
    let admin = admin_token(&app).await;
    submit_project(&app, &student).await;

    let response = get(&app, "/api/projects/pending-assignments", Some(&admin)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);

    let response = get(&app, "/api/projects?status=EN_REVISION", Some(&admin)).await;
    assert_eq!(body_json(response).await["data"], json!([]));
}

#[tokio::test]
async fn test_deliverable_requires_accepted_project() {
    let app = build_test_app().await;
    let student = login(&app, STUDENT_EMAIL).await;
    let id = submit_project(&app, &student).await["id"].as_i64().unwrap();
    let project_id = id.to_string();

    let response = post_multipart(
        &app,
        "/api/projects/deliverables",
        &student,
        &[
            ("projectId", &project_id),
            ("title", "Rapport d'avancement 1"),
            ("description", "Premier sprint"),
            ("kind", "RAPPORT_AVANCEMENT"),
        ],
        Some(("file", "sprint1.pdf", b"%PDF sprint")),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["code"], "INVALID_TRANSITION");

    // The rejected upload is not left behind.
    let dir = app.uploads.path().join("deliverables");
    let leftover = std::fs::read_dir(&dir).map(|d| d.count()).unwrap_or(0);
    assert_eq!(leftover, 0);
}

#[tokio::test]
async fn test_supervisor_requests_revision() {
    let app = build_test_app().await;
    let student = login(&app, STUDENT_EMAIL).await;
    let professor = login(&app, PROFESSOR_EMAIL).await;
    let admin = admin_token(&app).await;
    let id = submit_project(&app, &student).await["id"].as_i64().unwrap();
    send_json(
        &app,
        Method::POST,
        &format!("/api/projects/{id}/assign"),
        Some(&admin),
        json!({ "professorId": app.professor_id() }),
    )
    .await;

    let uri = format!("/api/projects/{id}/request-revision");
    let response = send_json(&app, Method::PUT, &uri, Some(&professor), json!({ "comments": "  " })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(response).await["errors"]["comments"].is_array());

    let other = login(&app, OTHER_PROFESSOR_EMAIL).await;
    let response = send_json(&app, Method::PUT, &uri, Some(&other), json!({ "comments": "Préciser" })).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = send_json(
        &app,
        Method::PUT,
        &uri,
        Some(&professor),
        json!({ "comments": "Préciser la méthodologie" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let project = body_json(response).await["data"].clone();
    assert_eq!(project["status"], "EN_REVISION");
    assert_eq!(project["professorComments"], "Préciser la méthodologie");
}

#[tokio::test]
async fn test_admin_search_recent_and_stats() {
    let app = build_test_app().await;
    let admin = admin_token(&app).await;
    let first = login(&app, STUDENT_EMAIL).await;
    submit_project(&app, &first).await;
    let response = post_multipart(
        &app,
        "/api/projects/submit",
        &login(&app, OTHER_STUDENT_EMAIL).await,
        &[
            ("title", "Détection de fissures"),
            ("description", "Vision par ordinateur sur des ouvrages"),
            ("objectives", "Classer les images"),
            ("keywords", "vision,ia"),
        ],
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let second = body_json(response).await["data"]["id"].as_i64().unwrap();

    let found = body_json(get(&app, "/api/projects/search?q=FISSURES", Some(&admin)).await).await;
    let found = found["data"].as_array().unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0]["id"], second);

    let response = get(&app, "/api/projects/search?q=%20", Some(&admin)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let response = get(&app, "/api/projects/search?q=pfe", Some(&first)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let recent = body_json(get(&app, "/api/projects/recent?limit=1", Some(&admin)).await).await;
    let recent = recent["data"].as_array().unwrap();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0]["id"], second);

    let stats = body_json(get(&app, "/api/projects/stats", Some(&admin)).await).await["data"].clone();
    assert_eq!(stats["total"], 2);
    assert_eq!(stats["byStatus"]["EN_ATTENTE_ASSIGNATION"], 2);
    assert_eq!(stats["byStatus"]["ACCEPTE"], 0);
    assert_eq!(stats["byDepartment"]["Informatique"], 2);
}
