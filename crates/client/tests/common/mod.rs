#![allow(dead_code)]

use pfehub_api::auth::jwt::JwtConfig;
use pfehub_api::auth::password::hash_password;
use pfehub_api::config::ServerConfig;
use pfehub_api::router::{build_app_router, build_state};
use pfehub_client::api::Attachment;
use pfehub_client::config::ClientConfig;
use pfehub_client::PfeHubClient;
use pfehub_core::project::ProjectSubmission;
use pfehub_core::roles::Actor;
use pfehub_core::users::User;
use pfehub_db::fixtures::{seed_demo_data, SeedSummary, ADMIN_EMAIL, DEMO_PASSWORD};
use tempfile::TempDir;

pub const PROFESSOR_EMAIL: &str = "k.alaoui@pfehub.ma";
pub const STUDENT_EMAIL: &str = "s.idrissi@pfehub.ma";

/// A seeded API server listening on an ephemeral local port.
pub struct TestServer {
    pub api_url: String,
    pub seed: SeedSummary,
    uploads: TempDir,
    tokens: TempDir,
}

pub async fn spawn_server() -> TestServer {
    let uploads = tempfile::tempdir().expect("temp upload dir");
    let tokens = tempfile::tempdir().expect("temp token dir");

    let pool = pfehub_db::connect(pfehub_db::MEMORY_URL)
        .await
        .expect("in-memory database");
    let hash = hash_password(DEMO_PASSWORD).expect("hash demo password");
    let seed = seed_demo_data(&pool, &hash).await.expect("seed demo data");

    let config = ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        database_url: pfehub_db::MEMORY_URL.to_string(),
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        upload_dir: uploads.path().to_path_buf(),
        seed_demo_data: false,
        recommendation_limit: 5,
        jwt: JwtConfig {
            secret: "client-test-secret-long-enough-for-hmac".to_string(),
            access_token_expiry_mins: 60,
        },
    };
    let router = build_app_router(build_state(pool, config));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("server runs");
    });

    TestServer {
        api_url: format!("http://{addr}/api"),
        seed,
        uploads,
        tokens,
    }
}

impl TestServer {
    pub fn professor_id(&self) -> i64 {
        self.seed.professor_ids[0]
    }

    pub fn student_id(&self) -> i64 {
        self.seed.student_ids[0]
    }

    /// Client config whose token file is private to `name`.
    pub fn config(&self, name: &str) -> ClientConfig {
        ClientConfig {
            api_url: self.api_url.clone(),
            token_file: self.tokens.path().join(name).join("auth_token"),
            timeout_secs: 10,
        }
    }

    /// A client signed in as `email`, plus the actor it acts as.
    pub async fn client(&self, email: &str) -> (PfeHubClient, Actor) {
        let client = PfeHubClient::connect(&self.config(email))
            .await
            .expect("connect");
        let user: User = client
            .auth()
            .login(email, DEMO_PASSWORD)
            .await
            .expect("login");
        let actor = Actor::new(user.id, user.role());
        (client, actor)
    }

    pub async fn admin(&self) -> (PfeHubClient, Actor) {
        self.client(ADMIN_EMAIL).await
    }

    pub fn upload_root(&self) -> &std::path::Path {
        self.uploads.path()
    }
}

pub fn submission() -> ProjectSubmission {
    ProjectSubmission {
        title: "Titre X".into(),
        description: "Plateforme de gestion des PFE".into(),
        objectives: "Automatiser le suivi".into(),
        context: None,
        methodology: None,
        expected_results: None,
        keywords: vec!["web".into(), "java".into()],
    }
}

pub fn proposal_file() -> Attachment {
    Attachment::new("proposition.pdf", b"%PDF-1.7 proposal".to_vec())
}

pub fn final_report() -> Attachment {
    Attachment::new("rapport.pdf", b"%PDF-1.7 report".to_vec())
}

pub fn proposal(project_id: i64) -> pfehub_core::defense::DefenseProposal {
    use chrono::{NaiveDate, NaiveTime};
    use pfehub_core::jury::JuryMemberInput;

    pfehub_core::defense::DefenseProposal {
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

pub fn evaluation() -> pfehub_core::evaluation::EvaluationSubmission {
    pfehub_core::evaluation::EvaluationSubmission {
        presentation_quality: 15.0,
        subject_mastery: 17.0,
        question_answers: 14.5,
        time_respect: 16.0,
        final_grade: 16.0,
        comments: "Travail solide, bonne maitrise technique".into(),
        strengths: Some("Architecture claire".into()),
        improvements: None,
    }
}
