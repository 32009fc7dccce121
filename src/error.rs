use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Unified error type for the Pulseboard application
#[derive(Error, Debug)]
pub enum PulseError {
    // Publish errors
    #[error("Unauthorized: Invalid API key")]
    Unauthorized,

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    // Stream errors
    #[error("Subscriber channel closed")]
    ChannelClosed,

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for Pulseboard operations
pub type Result<T> = std::result::Result<T, PulseError>;

impl PulseError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            PulseError::MalformedPayload(_) => StatusCode::BAD_REQUEST,

            // 401 Unauthorized
            PulseError::Unauthorized => StatusCode::UNAUTHORIZED,

            // 410 Gone
            PulseError::ChannelClosed => StatusCode::GONE,

            // 500 Internal Server Error
            PulseError::InvalidConfig(_)
            | PulseError::Io(_)
            | PulseError::Serialization(_)
            | PulseError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Check if this is a client error (4xx)
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }

    /// Check if this is a server error (5xx)
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }
}

impl IntoResponse for PulseError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = json!({
            "error": self.to_string(),
        });

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    #[test]
    fn test_error_status_code_mapping() {
        assert_eq!(
            PulseError::Unauthorized.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            PulseError::MalformedPayload("eof".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            PulseError::InvalidConfig("bad".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            PulseError::Internal("boom".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_error_client_server_helpers() {
        assert!(PulseError::Unauthorized.is_client_error());
        assert!(!PulseError::Unauthorized.is_server_error());

        assert!(PulseError::Internal("boom".to_string()).is_server_error());
        assert!(!PulseError::Internal("boom".to_string()).is_client_error());
    }

    #[tokio::test]
    async fn test_unauthorized_response_body() {
        let response = PulseError::Unauthorized.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, json!({ "error": "Unauthorized: Invalid API key" }));
    }
}
