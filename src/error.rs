use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("upstream error ({provider}): {message}")]
    Upstream { provider: String, message: String },
    #[error("upstream parse error: {0}")]
    UpstreamParse(String),
    #[error("content blocked: {0}")]
    ContentBlocked(String),
    #[error("deadline exceeded: {0}")]
    Deadline(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;

impl CoreError {
    /// Stable wire code carried in the error envelope.
    pub fn code(&self) -> &'static str {
        match self {
            CoreError::Validation(_) => "VALIDATION_ERROR",
            CoreError::Unauthorized(_) => "AUTH_ERROR",
            CoreError::NotFound(_) => "NOT_FOUND",
            CoreError::Upstream { .. } => "UPSTREAM_ERROR",
            CoreError::UpstreamParse(_) => "UPSTREAM_PARSE_ERROR",
            CoreError::ContentBlocked(_) => "CONTENT_BLOCKED",
            CoreError::Deadline(_) => "TIMEOUT",
            CoreError::Config(_) => "CONFIG_ERROR",
            CoreError::Storage(_) | CoreError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<diesel::result::Error> for CoreError {
    fn from(err: diesel::result::Error) -> Self {
        match err {
            diesel::result::Error::NotFound => CoreError::NotFound("row not found".to_string()),
            other => CoreError::Storage(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::Internal(format!("json: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(CoreError::Validation("x".into()).code(), "VALIDATION_ERROR");
        assert_eq!(
            CoreError::UpstreamParse("x".into()).code(),
            "UPSTREAM_PARSE_ERROR"
        );
        assert_eq!(
            CoreError::ContentBlocked("x".into()).code(),
            "CONTENT_BLOCKED"
        );
        assert_eq!(CoreError::Storage("x".into()).code(), "INTERNAL_ERROR");
    }

    #[test]
    fn diesel_not_found_maps_to_not_found() {
        let err: CoreError = diesel::result::Error::NotFound.into();
        assert!(matches!(err, CoreError::NotFound(_)));
    }
}
