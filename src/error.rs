use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// The main error type for staffgate
#[derive(Debug, thiserror::Error)]
pub enum StaffgateError {
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

/// Wire format for error responses.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    error: String,
    code: &'static str,
    error_id: String,
}

impl StaffgateError {
    pub fn unauthenticated(msg: impl Into<String>) -> Self {
        Self::Unauthenticated(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Stable machine-readable code for this error kind.
    ///
    /// Clients branch on this value; it never changes for a given variant.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unauthenticated(_) => "unauthenticated",
            Self::Forbidden(_) => "forbidden",
            Self::NotFound(_) => "not_found",
            Self::InvalidState(_) => "invalid_state",
            Self::Config(_) => "config_error",
            Self::BadRequest(_) => "bad_request",
            Self::Internal(_) | Self::Anyhow(_) => "internal",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidState(_) => StatusCode::CONFLICT,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Config(_) | Self::Internal(_) | Self::Anyhow(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message suitable for clients outside dev mode.
    ///
    /// Access denials carry no detail: a client must not learn why it was
    /// refused, or whether a resource it cannot see exists. Server errors are
    /// reduced to a generic message. Full details go to the server log only.
    fn safe_message(&self) -> String {
        match self {
            Self::Unauthenticated(_) => "Unauthenticated".to_string(),
            Self::Forbidden(_) => "Forbidden".to_string(),
            Self::NotFound(_) => "Not found".to_string(),
            Self::InvalidState(msg) => format!("Invalid state: {}", msg),
            Self::BadRequest(msg) => format!("Bad request: {}", msg),
            Self::Config(_) | Self::Internal(_) | Self::Anyhow(_) => {
                "Internal server error".to_string()
            }
        }
    }

    /// Render the error, exposing full messages only when `dev_mode` is set.
    pub fn into_response_with_mode(self, dev_mode: bool) -> Response {
        let status = self.status_code();
        let error_id = uuid::Uuid::new_v4().to_string();

        let message = if dev_mode {
            self.to_string()
        } else {
            self.safe_message()
        };

        if status.is_server_error() {
            tracing::error!(
                status = status.as_u16(),
                error_id = %error_id,
                code = self.code(),
                error = %self,
                "Request failed"
            );
        } else {
            tracing::info!(
                status = status.as_u16(),
                error_id = %error_id,
                code = self.code(),
                error = %self,
                "Request rejected"
            );
        }

        let body = ErrorResponse {
            error: message,
            code: self.code(),
            error_id,
        };

        (status, Json(body)).into_response()
    }
}

impl IntoResponse for StaffgateError {
    fn into_response(self) -> Response {
        self.into_response_with_mode(false)
    }
}

/// Result type alias used throughout staffgate
pub type Result<T> = std::result::Result<T, StaffgateError>;

impl From<serde_json::Error> for StaffgateError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_data() || err.is_syntax() || err.is_eof() {
            StaffgateError::BadRequest(format!("JSON error: {}", err))
        } else {
            StaffgateError::Internal(format!("JSON serialization error: {}", err))
        }
    }
}

impl From<std::io::Error> for StaffgateError {
    fn from(err: std::io::Error) -> Self {
        StaffgateError::Internal(format!("I/O error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(StaffgateError::unauthenticated("x").code(), "unauthenticated");
        assert_eq!(StaffgateError::forbidden("x").code(), "forbidden");
        assert_eq!(StaffgateError::not_found("x").code(), "not_found");
        assert_eq!(StaffgateError::invalid_state("x").code(), "invalid_state");
        assert_eq!(StaffgateError::config("x").code(), "config_error");
        assert_eq!(StaffgateError::bad_request("x").code(), "bad_request");
        assert_eq!(StaffgateError::internal("x").code(), "internal");
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            StaffgateError::unauthenticated("no session").status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(StaffgateError::forbidden("no").status_code(), StatusCode::FORBIDDEN);
        assert_eq!(StaffgateError::not_found("no").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            StaffgateError::invalid_state("already impersonating").status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            StaffgateError::config("bad role").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_display() {
        let err = StaffgateError::invalid_state("not impersonating");
        assert_eq!(err.to_string(), "Invalid state: not impersonating");
    }

    #[test]
    fn test_safe_message_hides_denial_reasons() {
        assert_eq!(
            StaffgateError::forbidden("role viewer lacks manage_billing").safe_message(),
            "Forbidden"
        );
        assert_eq!(
            StaffgateError::not_found("page payroll_admin is hidden").safe_message(),
            "Not found"
        );
        assert_eq!(
            StaffgateError::internal("session store at 10.0.0.4 down").safe_message(),
            "Internal server error"
        );
        assert_eq!(
            StaffgateError::invalid_state("already impersonating").safe_message(),
            "Invalid state: already impersonating"
        );
    }

    #[test]
    fn test_from_serde_json_syntax_error() {
        let result: std::result::Result<serde_json::Value, _> = serde_json::from_str("{ nope");
        let err: StaffgateError = result.unwrap_err().into();
        assert!(matches!(err, StaffgateError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_into_response_body() {
        let response = StaffgateError::invalid_state("already impersonating").into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(json["code"], "invalid_state");
        assert_eq!(json["error"], "Invalid state: already impersonating");
        assert!(uuid::Uuid::parse_str(json["error_id"].as_str().unwrap()).is_ok());
    }

    #[tokio::test]
    async fn test_forbidden_response_has_no_detail() {
        let response = StaffgateError::forbidden("target is a super admin").into_response();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(json["error"], "Forbidden");
        assert!(!body.windows(5).any(|w| w == b"super"));
    }

    #[tokio::test]
    async fn test_dev_mode_shows_details() {
        let response = StaffgateError::internal("pool exhausted").into_response_with_mode(true);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert!(json["error"].as_str().unwrap().contains("pool exhausted"));
    }
}
