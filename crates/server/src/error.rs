use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

pub type ServerResult<T> = Result<T, ServerError>;

/// Server error types
///
/// Every variant is reported to the client the same way: HTTP 500 with the
/// error message as a plain-text body. A key that is already being processed
/// is not an error and never ends up here.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Missing param {0}")]
    MissingParameter(&'static str),

    #[error(transparent)]
    Processing(#[from] zipgate::ProcessError),
}

impl ServerError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    /// Short label used for logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            ServerError::MissingParameter(_) => "rejected",
            ServerError::Processing(_) => "failed",
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.to_string();

        tracing::warn!(kind = self.kind(), error = %message, "request failed");

        (status, [(CONTENT_TYPE, "text/plain; charset=utf-8")], message).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_parameter_message() {
        let err = ServerError::MissingParameter("key");
        assert_eq!(err.to_string(), "Missing param key");
        assert_eq!(err.kind(), "rejected");
    }

    #[test]
    fn processing_error_is_transparent() {
        let err: ServerError = zipgate::ProcessError::archive_failed("abc", "truncated").into();
        assert_eq!(
            err.to_string(),
            "failed to process archive for key abc: truncated"
        );
        assert_eq!(err.kind(), "failed");
    }

    #[test]
    fn every_error_is_plain_text_500() {
        let errors = vec![
            ServerError::MissingParameter("key"),
            zipgate::ProcessError::archive_failed("abc", "truncated").into(),
        ];

        for err in errors {
            let response = err.into_response();
            assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
            let content_type = response.headers().get(CONTENT_TYPE).unwrap();
            assert!(content_type.to_str().unwrap().starts_with("text/plain"));
        }
    }
}
