use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

use mm_core::Error;

/// Maps crate errors onto HTTP responses with a JSON body.
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            Error::DuplicateUrl { .. } | Error::ReportInProgress => StatusCode::CONFLICT,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::InvalidUrl(_) | Error::Validation(_) | Error::EmptyReport
            | Error::NoUsableContent => StatusCode::BAD_REQUEST,
            Error::Delivery(_) => StatusCode::BAD_GATEWAY,
            Error::RunTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!("request failed: {}", self.0);
        }

        let body = Json(json!({
            "success": false,
            "message": self.0.to_string(),
        }));
        (status, body).into_response()
    }
}
