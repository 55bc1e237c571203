use pfehub_core::error::{CoreError, FieldErrors};
use reqwest::StatusCode;

/// A non-2xx answer from the API, decoded from its `{error, code, errors}` body.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message} ({status})")]
pub struct ApiError {
    pub status: u16,
    pub message: String,
    /// Machine-readable code such as `INVALID_TRANSITION`, when the body had one.
    pub code: Option<String>,
    pub field_errors: FieldErrors,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Input rejected locally before any request was sent.
    #[error("Validation failed: {}", describe_fields(.0))]
    Validation(FieldErrors),

    /// A local guard check failed (wrong role, wrong status, ...).
    #[error(transparent)]
    Core(CoreError),

    #[error("API error: {0}")]
    Api(ApiError),

    #[error("Service unavailable: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Session storage failed: {0}")]
    Session(#[from] std::io::Error),

    /// A controller transition was attempted before anything was loaded.
    #[error("No {0} is loaded")]
    NotLoaded(&'static str),
}

pub type ClientResult<T> = Result<T, ClientError>;

fn describe_fields(errors: &FieldErrors) -> String {
    errors
        .iter()
        .map(|(field, messages)| format!("{field}: {}", messages.join(", ")))
        .collect::<Vec<_>>()
        .join("; ")
}

impl From<CoreError> for ClientError {
    fn from(error: CoreError) -> Self {
        match error {
            CoreError::InvalidFields(fields) => ClientError::Validation(fields),
            other => ClientError::Core(other),
        }
    }
}

impl From<validator::ValidationErrors> for ClientError {
    fn from(errors: validator::ValidationErrors) -> Self {
        CoreError::from(errors).into()
    }
}

impl From<ApiError> for ClientError {
    fn from(error: ApiError) -> Self {
        ClientError::Api(error)
    }
}

impl ClientError {
    /// The server could not be reached or answered as a failing gateway.
    /// Callers may switch to a degraded mode on these.
    pub fn is_unavailable(&self) -> bool {
        match self {
            ClientError::Transport(e) => e.is_connect() || e.is_timeout() || e.is_request(),
            ClientError::Api(e) => matches!(e.status, 502..=504),
            _ => false,
        }
    }

    /// Wrong role, wrong actor or wrong entity status, detected locally or
    /// reported by the server as 403/409.
    pub fn is_precondition(&self) -> bool {
        match self {
            ClientError::Core(e) => e.is_precondition(),
            ClientError::Api(e) => matches!(e.status, 403 | 409),
            _ => false,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::Api(e) if e.status == 404)
    }

    /// Per-field messages, from either the local check or the server.
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            ClientError::Validation(fields) => Some(fields),
            ClientError::Api(e) if !e.field_errors.is_empty() => Some(&e.field_errors),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(status: u16) -> ClientError {
        ClientError::Api(ApiError {
            status,
            message: "nope".into(),
            code: None,
            field_errors: FieldErrors::new(),
        })
    }

    #[test]
    fn test_status_classification() {
        assert!(api(409).is_precondition());
        assert!(api(403).is_precondition());
        assert!(!api(400).is_precondition());
        assert!(api(404).is_not_found());
        assert!(api(503).is_unavailable());
        assert!(!api(500).is_unavailable());
    }

    #[test]
    fn test_field_errors_become_validation() {
        let err: ClientError = CoreError::field("title", "title is required").into();
        assert!(matches!(err, ClientError::Validation(_)));
        assert_eq!(err.field_errors().unwrap()["title"], vec!["title is required"]);
        assert_eq!(err.to_string(), "Validation failed: title: title is required");
    }

    #[test]
    fn test_local_guard_failure_is_precondition() {
        let err: ClientError = CoreError::Forbidden("students only".into()).into();
        assert!(err.is_precondition());
        assert!(!err.is_unavailable());
    }
}
