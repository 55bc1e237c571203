//! Downloading stored uploads.

mod common;

use axum::http::{header, StatusCode};
use common::{
    admin_token, build_test_app, get, login, submit_project, OTHER_STUDENT_EMAIL, PROFESSOR_EMAIL,
    STUDENT_EMAIL,
};
use http_body_util::BodyExt;

async fn body_bytes(response: axum::http::Response<axum::body::Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .expect("read body")
        .to_bytes()
        .to_vec()
}

#[tokio::test]
async fn test_owner_downloads_and_views_proposal() {
    let app = build_test_app().await;
    let student = login(&app, STUDENT_EMAIL).await;
    let project = submit_project(&app, &student).await;
    let path = project["proposalFile"]["path"].as_str().unwrap().to_string();
    assert!(path.starts_with("proposals/"));

    let response = get(&app, &format!("/api/files/download/{path}"), Some(&student)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
    let disposition = response.headers()[header::CONTENT_DISPOSITION].to_str().unwrap().to_string();
    assert!(disposition.starts_with("attachment;"), "{disposition}");
    assert_eq!(body_bytes(response).await, b"%PDF-1.7 proposal");

    let response = get(&app, &format!("/api/files/view/{path}"), Some(&student)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let disposition = response.headers()[header::CONTENT_DISPOSITION].to_str().unwrap();
    assert!(disposition.starts_with("inline;"), "{disposition}");
}

#[tokio::test]
async fn test_files_follow_project_visibility() {
    let app = build_test_app().await;
    let student = login(&app, STUDENT_EMAIL).await;
    let project = submit_project(&app, &student).await;
    let path = project["proposalFile"]["path"].as_str().unwrap().to_string();
    let uri = format!("/api/files/download/{path}");

    let other = login(&app, OTHER_STUDENT_EMAIL).await;
    assert_eq!(get(&app, &uri, Some(&other)).await.status(), StatusCode::NOT_FOUND);

    // Not assigned yet, so the professor cannot see it either.
    let professor = login(&app, PROFESSOR_EMAIL).await;
    assert_eq!(get(&app, &uri, Some(&professor)).await.status(), StatusCode::NOT_FOUND);

    let admin = admin_token(&app).await;
    assert_eq!(get(&app, &uri, Some(&admin)).await.status(), StatusCode::OK);

    assert_eq!(get(&app, &uri, None).await.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unknown_and_traversal_paths_are_not_found() {
    let app = build_test_app().await;
    let admin = admin_token(&app).await;

    for uri in [
        "/api/files/download/proposals/missing.pdf",
        "/api/files/download/secrets/notes.pdf",
        "/api/files/download/proposals/..%2F..%2FCargo.toml",
        "/api/files/view/final-reports/..%2Fproposals%2Fx.pdf",
    ] {
        let response = get(&app, uri, Some(&admin)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
    }
}
