use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    #[error("invalid file name: {0:?}")]
    InvalidFileName(String),

    #[error("file type not allowed: {0:?}")]
    UnsupportedType(String),

    #[error("ledger error: {0}")]
    Ledger(#[from] upchain_ledger::LedgerError),

    #[error("fingerprint error: {0}")]
    Fingerprint(#[from] upchain_fingerprint::FingerprintError),

    #[error("journal error: {0}")]
    Journal(#[from] upchain_journal::JournalError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type ServerResult<T> = Result<T, ServerError>;

impl ServerError {
    /// HTTP status and machine-readable code.
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::AuthFailed(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::InvalidFileName(_) => (StatusCode::BAD_REQUEST, "INVALID_FILE_NAME"),
            Self::UnsupportedType(_) => (StatusCode::UNSUPPORTED_MEDIA_TYPE, "UNSUPPORTED_TYPE"),
            Self::Ledger(_)
            | Self::Fingerprint(_)
            | Self::Journal(_)
            | Self::Config(_)
            | Self::Io(_)
            | Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        // Server-side failures are logged in full and reported generically.
        let message = if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
            "an internal error occurred".to_string()
        } else {
            tracing::debug!(error = %self, "request rejected");
            self.to_string()
        };

        let body = json!({ "error": { "code": code, "message": message } });
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_keep_their_message() {
        let resp = ServerError::UnsupportedType("exe".into()).into_response();
        assert_eq!(resp.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);

        let (status, code) = ServerError::AuthFailed("missing bearer token".into()).status_and_code();
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(code, "UNAUTHORIZED");
    }

    #[test]
    fn server_errors_map_to_500() {
        let err = ServerError::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk full"));
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
        let err = ServerError::Ledger(upchain_ledger::LedgerError::EmptyChain);
        assert_eq!(err.status_and_code().1, "INTERNAL_ERROR");
    }
}
