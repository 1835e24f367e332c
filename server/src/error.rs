use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use navigation_lib::{api::ErrorBody, error::NavError};

/// A `NavError` on its way out of a handler.
#[derive(Debug)]
pub struct ApiError(pub NavError);

impl From<NavError> for ApiError {
    fn from(value: NavError) -> Self {
        ApiError(value)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            NavError::InvalidInput { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            NavError::NotFound(_) => StatusCode::NOT_FOUND,
            NavError::NoRoute(_) => StatusCode::BAD_GATEWAY,
            NavError::Unauthorized(_) => StatusCode::INTERNAL_SERVER_ERROR,
            NavError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            NavError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = Some(self.0.code().to_string());

        let body = match self.0 {
            NavError::InvalidInput { issues, .. } => {
                tracing::debug!("Rejected request: {issues:?}");
                ErrorBody {
                    message: "Validation error".into(),
                    code,
                    details: serde_json::to_value(issues).ok(),
                }
            },
            // Detail stays in the log.
            NavError::Unexpected(detail) => {
                tracing::error!("Unexpected error: {detail}");
                ErrorBody {
                    message: "Unexpected error".into(),
                    code,
                    details: None,
                }
            },
            other => {
                tracing::warn!("Request failed with {}: {other}", status);
                ErrorBody {
                    message: other.to_string(),
                    code,
                    details: None,
                }
            },
        };

        (status, Json(body)).into_response()
    }
}
