use anyhow::Error;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Application error: an HTTP status, a stable machine-readable code, and a
/// human-readable message. Serialized as `{"error": {"message", "code"}}`.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub code: &'static str,
    pub error: Error,
}

impl AppError {
    pub fn new<E>(status: StatusCode, code: &'static str, err: E) -> Self
    where
        E: Into<Error>,
    {
        Self {
            status,
            code,
            error: err.into(),
        }
    }

    pub fn message(status: StatusCode, code: &'static str, msg: impl Into<String>) -> Self {
        Self::new(status, code, Error::msg(msg.into()))
    }

    pub fn unauthorized(code: &'static str, msg: impl Into<String>) -> Self {
        Self::message(StatusCode::UNAUTHORIZED, code, msg)
    }

    pub fn forbidden(code: &'static str, msg: impl Into<String>) -> Self {
        Self::message(StatusCode::FORBIDDEN, code, msg)
    }

    pub fn not_found(code: &'static str, msg: impl Into<String>) -> Self {
        Self::message(StatusCode::NOT_FOUND, code, msg)
    }

    pub fn bad_request(code: &'static str, msg: impl Into<String>) -> Self {
        Self::message(StatusCode::BAD_REQUEST, code, msg)
    }

    pub fn conflict(code: &'static str, msg: impl Into<String>) -> Self {
        Self::message(StatusCode::CONFLICT, code, msg)
    }

    pub fn unprocessable(msg: impl Into<String>) -> Self {
        Self::message(StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR", msg)
    }

    pub fn internal<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "SERVER_ERROR", err)
    }

    pub fn database<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "SERVER_ERROR", err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // 5xx details stay in the logs, not on the wire.
        let message = if self.status.is_server_error() {
            tracing::error!(error = %self.error, code = self.code, "request failed");
            "Internal server error".to_string()
        } else {
            self.error.to_string()
        };

        let body = Json(json!({
            "error": {
                "message": message,
                "code": self.code,
            }
        }));

        (self.status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<Error>,
{
    fn from(err: E) -> Self {
        AppError::internal(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructor_status_and_code() {
        let err = AppError::forbidden("PERMISSION_DENIED", "Permission denied");
        assert_eq!(err.status, StatusCode::FORBIDDEN);
        assert_eq!(err.code, "PERMISSION_DENIED");

        let err = AppError::unprocessable("email is invalid");
        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.code, "VALIDATION_ERROR");
    }

    #[test]
    fn test_from_anyhow_is_internal() {
        let err: AppError = anyhow::anyhow!("boom").into();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.code, "SERVER_ERROR");
    }
}
