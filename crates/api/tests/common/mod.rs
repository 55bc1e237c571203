#![allow(dead_code)]

use std::path::Path;

use axum::body::Body;
use axum::http::{header, Method, Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use pfehub_api::auth::jwt::JwtConfig;
use pfehub_api::auth::password::hash_password;
use pfehub_api::config::ServerConfig;
use pfehub_api::router::{build_app_router, build_state};
use pfehub_db::fixtures::{seed_demo_data, SeedSummary, ADMIN_EMAIL, DEMO_PASSWORD};

pub const BOUNDARY: &str = "pfehub-test-boundary";

pub const PROFESSOR_EMAIL: &str = "k.alaoui@pfehub.ma";
pub const OTHER_PROFESSOR_EMAIL: &str = "n.tazi@pfehub.ma";
pub const STUDENT_EMAIL: &str = "s.idrissi@pfehub.ma";
pub const OTHER_STUDENT_EMAIL: &str = "y.berrada@pfehub.ma";

/// Build a test `ServerConfig` writing uploads below `upload_dir`.
pub fn test_config(upload_dir: &Path) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        database_url: pfehub_db::MEMORY_URL.to_string(),
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        upload_dir: upload_dir.to_path_buf(),
        seed_demo_data: false,
        recommendation_limit: 5,
        jwt: JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            access_token_expiry_mins: 60,
        },
    }
}

/// Router over a freshly seeded in-memory database. The temp dir lives as long as the app.
pub struct TestApp {
    pub router: Router,
    pub seed: SeedSummary,
    pub uploads: TempDir,
}

impl TestApp {
    pub fn admin_id(&self) -> i64 {
        self.seed.admin_id
    }

    /// Alaoui, the professor used as supervisor in most tests.
    pub fn professor_id(&self) -> i64 {
        self.seed.professor_ids[0]
    }

    pub fn student_id(&self) -> i64 {
        self.seed.student_ids[0]
    }
}

pub async fn build_test_app() -> TestApp {
    let uploads = tempfile::tempdir().expect("temp upload dir");
    let pool = pfehub_db::connect(pfehub_db::MEMORY_URL)
        .await
        .expect("in-memory database");
    let hash = hash_password(DEMO_PASSWORD).expect("hash demo password");
    let seed = seed_demo_data(&pool, &hash).await.expect("seed demo data");
    let router = build_app_router(build_state(pool, test_config(uploads.path())));
    TestApp {
        router,
        seed,
        uploads,
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn send(app: &TestApp, request: Request<Body>) -> Response<Body> {
    app.router
        .clone()
        .oneshot(request)
        .await
        .expect("router is infallible")
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("read body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body is JSON")
}

pub async fn get(app: &TestApp, uri: &str, token: Option<&str>) -> Response<Body> {
    let mut builder = Request::builder().method(Method::GET).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    send(app, builder.body(Body::empty()).unwrap()).await
}

pub async fn send_json(
    app: &TestApp,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Value,
) -> Response<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    send(app, builder.body(Body::from(body.to_string())).unwrap()).await
}

/// Encode text fields plus an optional `(field, file name, bytes)` part.
pub fn multipart_body(fields: &[(&str, &str)], file: Option<(&str, &str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((name, file_name, data)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub async fn post_multipart(
    app: &TestApp,
    uri: &str,
    token: &str,
    fields: &[(&str, &str)],
    file: Option<(&str, &str, &[u8])>,
) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::from(multipart_body(fields, file)))
        .unwrap();
    send(app, request).await
}

// ---------------------------------------------------------------------------
// Workflow helpers
// ---------------------------------------------------------------------------

pub async fn login(app: &TestApp, email: &str) -> String {
    let response = send_json(
        app,
        Method::POST,
        "/api/auth/login",
        None,
        json!({ "email": email, "password": DEMO_PASSWORD }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK, "login for {email}");
    body_json(response).await["data"]["token"]
        .as_str()
        .expect("token")
        .to_string()
}

pub async fn admin_token(app: &TestApp) -> String {
    login(app, ADMIN_EMAIL).await
}

/// Student submits "Titre X" with a proposal file; returns the project JSON.
pub async fn submit_project(app: &TestApp, student_token: &str) -> Value {
    let response = post_multipart(
        app,
        "/api/projects/submit",
        student_token,
        &[
            ("title", "Titre X"),
            ("description", "Plateforme de gestion des PFE"),
            ("objectives", "Automatiser le suivi"),
            ("keywords", r#"["web", "java"]"#),
        ],
        Some(("proposalFile", "proposition.pdf", b"%PDF-1.7 proposal")),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"].clone()
}

/// Drive a fresh project to `SOUMISSION_FINALE` under the first professor.
/// Returns `(project_id, student_token, professor_token, admin_token)`.
pub async fn project_ready_for_defense(app: &TestApp) -> (i64, String, String, String) {
    let student = login(app, STUDENT_EMAIL).await;
    let professor = login(app, PROFESSOR_EMAIL).await;
    let admin = admin_token(app).await;

    let project = submit_project(app, &student).await;
    let id = project["id"].as_i64().unwrap();

    let assigned = send_json(
        app,
        Method::POST,
        &format!("/api/projects/{id}/assign"),
        Some(&admin),
        json!({ "professorId": app.professor_id() }),
    )
    .await;
    assert_eq!(assigned.status(), StatusCode::OK);

    let accepted = send_json(
        app,
        Method::PUT,
        &format!("/api/projects/{id}/accept"),
        Some(&professor),
        json!({ "comments": "Bon sujet" }),
    )
    .await;
    assert_eq!(accepted.status(), StatusCode::OK);

    let final_report = post_multipart(
        app,
        &format!("/api/projects/{id}/final-submission"),
        &student,
        &[],
        Some(("finalReport", "rapport.pdf", b"%PDF-1.7 report")),
    )
    .await;
    assert_eq!(final_report.status(), StatusCode::OK);

    (id, student, professor, admin)
}

pub fn proposal(project_id: i64) -> Value {
    json!({
        "projectId": project_id,
        "proposedDate": "2025-06-15",
        "proposedTime": "14:00",
        "proposedRoom": "A203",
        "juryMembers": [
            { "name": "Dr. Amrani", "email": "amrani@univ.ma", "role": "EXAMINATEUR" },
            { "name": "Dr. Bennani", "email": "bennani@univ.ma", "role": "EXAMINATEUR" }
        ]
    })
}

pub fn evaluation() -> Value {
    json!({
        "presentationQuality": 16.0,
        "subjectMastery": 15.5,
        "questionAnswers": 14.0,
        "timeRespect": 17.0,
        "finalGrade": 16.0,
        "comments": "Travail solide, bonne maitrise du sujet."
    })
}
