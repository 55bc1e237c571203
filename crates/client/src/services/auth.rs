use pfehub_core::users::User;
use serde::{Deserialize, Serialize};

use crate::api::ApiClient;
use crate::error::ClientResult;

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    /// Token lifetime in seconds.
    pub expires_in: i64,
    pub user: User,
}

#[derive(Debug, Clone)]
pub struct AuthService {
    api: ApiClient,
}

impl AuthService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Sign in and persist the token for later sessions.
    pub async fn login(&self, email: &str, password: &str) -> ClientResult<User> {
        let response: LoginResponse = self
            .api
            .post("/auth/login", &LoginRequest { email, password })
            .await?;
        self.api
            .session()
            .sign_in(response.token, response.user.clone())
            .await?;
        tracing::info!(user_id = response.user.id, role = %response.user.role(), "Signed in");
        Ok(response.user)
    }

    /// Tell the server, then forget the token. The local sign-out happens
    /// even when the server cannot be reached.
    pub async fn logout(&self) -> ClientResult<()> {
        if self.api.session().token().await.is_some() {
            if let Err(e) = self.api.post_empty("/auth/logout").await {
                tracing::warn!(error = %e, "Server logout failed; signing out locally");
            }
        }
        self.api.session().sign_out().await?;
        tracing::info!("Signed out");
        Ok(())
    }

    /// Fetch the caller's profile and attach it to the session.
    pub async fn me(&self) -> ClientResult<User> {
        let user: User = self.api.get("/auth/me", &[]).await?;
        self.api.session().set_user(user.clone()).await;
        Ok(user)
    }
}
