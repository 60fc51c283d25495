use axum::extract::rejection::JsonRejection;
use axum::response::IntoResponse;
use axum::Json;
use http::StatusCode;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    /// Missing or invalid field supplied by the caller.
    #[error("{0}")]
    InvalidRequest(String),
    /// The data provider answered with a non-success status or could not be reached.
    #[error("{message}")]
    UpstreamUnavailable {
        status: Option<u16>,
        message: String,
    },
    #[error("Malformed upstream data: {0}")]
    MalformedUpstreamData(String),
    #[error("{0}")]
    PredictionBackendError(String),
    /// Programmer error: call sites validate windows before computing.
    #[error("Invalid moving average window: {0}")]
    InvalidWindowSize(usize),
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::UpstreamUnavailable { status, .. } => status
                .and_then(|s| StatusCode::from_u16(s).ok())
                .filter(|s| s.is_client_error() || s.is_server_error())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            AppError::MalformedUpstreamData(_)
            | AppError::PredictionBackendError(_)
            | AppError::InvalidWindowSize(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(value: JsonRejection) -> Self {
        AppError::InvalidRequest(format!("Invalid request body: {}", value.body_text()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_status_is_propagated() {
        let err = AppError::UpstreamUnavailable {
            status: Some(404),
            message: "not found".into(),
        };
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn upstream_without_status_is_internal() {
        let err = AppError::UpstreamUnavailable {
            status: None,
            message: "connection refused".into(),
        };
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        // A success code from upstream can never be an error status.
        let err = AppError::UpstreamUnavailable {
            status: Some(204),
            message: "odd".into(),
        };
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn invalid_request_is_bad_request() {
        let err = AppError::InvalidRequest("Stock symbol is required".into());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Stock symbol is required");
    }
}
