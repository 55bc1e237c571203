use std::path::PathBuf;

/// Client configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the API, including the `/api` prefix.
    pub api_url: String,
    /// File holding the bearer token between runs.
    pub token_file: PathBuf,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl ClientConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var               | Default                     |
    /// |-----------------------|-----------------------------|
    /// | `PFEHUB_API_URL`      | `http://localhost:8080/api` |
    /// | `PFEHUB_TOKEN_FILE`   | `.pfehub/auth_token`        |
    /// | `PFEHUB_TIMEOUT_SECS` | `30`                        |
    pub fn from_env() -> Self {
        let api_url = std::env::var("PFEHUB_API_URL")
            .unwrap_or_else(|_| "http://localhost:8080/api".into());

        let token_file = std::env::var("PFEHUB_TOKEN_FILE")
            .unwrap_or_else(|_| ".pfehub/auth_token".into())
            .into();

        let timeout_secs: u64 = std::env::var("PFEHUB_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("PFEHUB_TIMEOUT_SECS must be a valid u64");

        Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            token_file,
            timeout_secs,
        }
    }
}
