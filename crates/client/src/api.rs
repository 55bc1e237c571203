//! Generic request layer over [`reqwest`].
//!
//! Every request carries the session's bearer token (when signed in) and a
//! fresh `x-request-id`. Success bodies are unwrapped from the `{data}`
//! envelope; failures are decoded into [`ApiError`].

use std::time::Duration;

use pfehub_core::error::FieldErrors;
use reqwest::multipart::Form;
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::ClientConfig;
use crate::error::{ApiError, ClientError, ClientResult};
use crate::session::Session;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

#[derive(Deserialize, Default)]
struct ErrorBody {
    #[serde(default)]
    error: String,
    code: Option<String>,
    #[serde(default)]
    errors: FieldErrors,
}

/// A file attached to a multipart upload.
#[derive(Debug, Clone)]
pub struct Attachment {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl Attachment {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }

    pub(crate) fn into_part(self) -> reqwest::multipart::Part {
        reqwest::multipart::Part::bytes(self.bytes).file_name(self.file_name)
    }
}

/// HTTP client bound to one API base URL and one session.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: Session,
}

impl ApiClient {
    pub fn new(config: &ClientConfig, session: Session) -> ClientResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self::with_client(http, &config.api_url, session))
    }

    /// Reuse an existing [`reqwest::Client`] (shared connection pool).
    pub fn with_client(http: reqwest::Client, base_url: &str, session: Session) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> ClientResult<T> {
        let request = self.request(Method::GET, path).await.query(query);
        self.execute(Method::GET, path, request).await
    }

    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        let request = self.request(Method::POST, path).await.json(body);
        self.execute(Method::POST, path, request).await
    }

    pub async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        let request = self.request(Method::PUT, path).await.json(body);
        self.execute(Method::PUT, path, request).await
    }

    /// DELETE a resource; the server answers 204 with no body.
    pub async fn delete(&self, path: &str) -> ClientResult<()> {
        let request = self.request(Method::DELETE, path).await;
        self.execute_empty(Method::DELETE, path, request).await
    }

    /// POST without a body to an endpoint that answers 204.
    pub async fn post_empty(&self, path: &str) -> ClientResult<()> {
        let request = self.request(Method::POST, path).await;
        self.execute_empty(Method::POST, path, request).await
    }

    /// POST a multipart form. The boundary and content type come from `form`.
    pub async fn upload<T: DeserializeOwned>(&self, path: &str, form: Form) -> ClientResult<T> {
        let request = self.request(Method::POST, path).await.multipart(form);
        self.execute(Method::POST, path, request).await
    }

    /// Like [`get`](Self::get), but a 404 is an empty result rather than an error.
    pub async fn get_optional<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> ClientResult<Option<T>> {
        match self.get(path, query).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    // ---- private helpers ----

    async fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut builder = self
            .http
            .request(method, format!("{}{}", self.base_url, path))
            .header(REQUEST_ID_HEADER, uuid::Uuid::new_v4().to_string());
        if let Some(token) = self.session.token().await {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        request: RequestBuilder,
    ) -> ClientResult<T> {
        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(%method, path, error = %e, "Request failed");
                return Err(e.into());
            }
        };
        let response = Self::ensure_success(response).await.inspect_err(|e| {
            tracing::debug!(%method, path, error = %e, "API returned an error");
        })?;
        let bytes = response.bytes().await?;
        let envelope: DataEnvelope<T> = serde_json::from_slice(&bytes)?;
        Ok(envelope.data)
    }

    async fn execute_empty(
        &self,
        method: Method,
        path: &str,
        request: RequestBuilder,
    ) -> ClientResult<()> {
        let response = request.send().await.inspect_err(|e| {
            tracing::warn!(%method, path, error = %e, "Request failed");
        })?;
        Self::ensure_success(response).await.inspect_err(|e| {
            tracing::debug!(%method, path, error = %e, "API returned an error");
        })?;
        Ok(())
    }

    /// Pass successful responses through; decode the error body otherwise.
    async fn ensure_success(response: reqwest::Response) -> ClientResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let bytes = response.bytes().await.unwrap_or_default();
        let body: ErrorBody = serde_json::from_slice(&bytes).unwrap_or_default();
        let message = if body.error.is_empty() {
            status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string()
        } else {
            body.error
        };
        Err(ClientError::Api(ApiError {
            status: status.as_u16(),
            message,
            code: body.code,
            field_errors: body.errors,
        }))
    }
}
