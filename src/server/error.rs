use crate::ServiceError;
use axum::{
    extract::rejection::QueryRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// A failed request: the route's summary plus what went wrong underneath
#[derive(Debug)]
pub struct ApiError {
    summary: &'static str,
    source: ServiceError,
}

impl ApiError {
    pub fn new(summary: &'static str, source: ServiceError) -> Self {
        Self { summary, source }
    }

    /// Map a `ServiceError` into this route's error
    pub fn with(summary: &'static str) -> impl Fn(ServiceError) -> Self {
        move |source| Self::new(summary, source)
    }

    pub fn status(&self) -> StatusCode {
        match self.source {
            ServiceError::NoData(_) | ServiceError::InsufficientData { .. } => {
                StatusCode::NOT_FOUND
            }
            ServiceError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ServiceError::Config(_) | ServiceError::Upstream(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::new(
            "Invalid query parameters",
            ServiceError::InvalidInput(rejection.body_text()),
        )
    }
}

/// Converts an `ApiError` into the `{"success": false, ...}` body.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self.source {
            // Upstream had nothing: the message is the whole story
            ServiceError::NoData(_) => json!({
                "success": false,
                "error": self.source.to_string(),
            }),
            _ => {
                if status.is_server_error() {
                    tracing::error!(error = ?self.source, "{}", self.summary);
                } else {
                    tracing::warn!("{}: {}", self.summary, self.source);
                }
                json!({
                    "success": false,
                    "error": self.summary,
                    "details": self.source.to_string(),
                })
            }
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let not_found = ApiError::new("x", ServiceError::NoData("BMRS".into()));
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);

        let short = ApiError::new("x", ServiceError::InsufficientData { needed: 15, got: 3 });
        assert_eq!(short.status(), StatusCode::NOT_FOUND);

        let bad = ApiError::new("x", ServiceError::InvalidInput("volume".into()));
        assert_eq!(bad.status(), StatusCode::BAD_REQUEST);

        let upstream = ApiError::new("x", ServiceError::Upstream(anyhow::anyhow!("timeout")));
        assert_eq!(upstream.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
