use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use lampsync_common::{ErrorCode, LampSyncError};
use serde::Serialize;
use time::OffsetDateTime;

/// JSON error body returned by every HTTP endpoint of the service.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: u32,
    pub timestamp: String,
}

/// Wraps [`LampSyncError`] so handlers can return it straight from Axum routes.
#[derive(Debug)]
pub struct LampSyncAxumError {
    pub err: LampSyncError,
}

impl From<LampSyncError> for LampSyncAxumError {
    fn from(value: LampSyncError) -> Self {
        Self { err: value }
    }
}

impl LampSyncAxumError {
    pub fn status_code(&self) -> StatusCode {
        match self.err.code() {
            ErrorCode::ConfigInvalid => StatusCode::BAD_REQUEST,
            ErrorCode::NetworkError
            | ErrorCode::ResponseUndecodable
            | ErrorCode::RegistryFetchFailed
            | ErrorCode::RegistryUpdateFailed => StatusCode::BAD_GATEWAY,
            ErrorCode::QueueError => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for LampSyncAxumError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.err.code() as u32;
        let timestamp = OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_default();

        let body = ErrorBody {
            error: self.err.to_string(),
            code,
            timestamp,
        };
        (status, Json(body)).into_response()
    }
}
