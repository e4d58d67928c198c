//! REST types for the session host API.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::ServerError;
use crate::models::SessionSnapshot;
use crate::queue::{EnqueueReport, SkipReason, SubmitReport};

/// Response to `POST /api/session/files`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnqueueResponse {
    /// Ids of the newly queued files
    pub added: Vec<Uuid>,

    /// Files already queued with the same name and size
    pub duplicates: Vec<String>,

    /// Files over the size limit
    pub rejected: Vec<String>,

    pub session: SessionSnapshot,
}

impl EnqueueResponse {
    pub fn new(report: EnqueueReport, session: SessionSnapshot) -> Self {
        Self {
            added: report.added,
            duplicates: report.duplicates,
            rejected: report.rejected,
            session,
        }
    }
}

/// Overall result of a submit, as seen by the browser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SubmitStatus {
    Completed,
    PartialFailure,
    /// Nothing queued
    Empty,
    /// A previous submit is still running
    InProgress,
    /// Session was reset mid-flight
    Discarded,
}

/// Response to `POST /api/session/submit`.
///
/// Failed files are listed by name only; transport details stay in the
/// server log.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub status: SubmitStatus,
    pub succeeded: usize,
    pub failed: usize,
    pub failed_files: Vec<String>,
    pub session: SessionSnapshot,
}

impl SubmitResponse {
    pub fn new(report: &SubmitReport, session: SessionSnapshot) -> Self {
        let status = match report {
            SubmitReport::Completed(_) => SubmitStatus::Completed,
            SubmitReport::PartialFailure(_) => SubmitStatus::PartialFailure,
            SubmitReport::Skipped(SkipReason::EmptyQueue) => SubmitStatus::Empty,
            SubmitReport::Skipped(SkipReason::InFlight) => SubmitStatus::InProgress,
            SubmitReport::Discarded(_) => SubmitStatus::Discarded,
        };

        Self {
            status,
            succeeded: report.succeeded(),
            failed: report.failed(),
            failed_files: report
                .outcomes()
                .iter()
                .filter(|o| !o.success())
                .map(|o| o.file.name.clone())
                .collect(),
            session,
        }
    }
}

/// Create an error body
pub fn error_response(error: &str) -> Value {
    json!({
        "status": "error",
        "error": error,
    })
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = match &self {
            // Enqueue refuses oversize files one by one; only `Busy` gets here.
            ServerError::Queue(_) => StatusCode::CONFLICT,
            ServerError::InvalidTarget(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::NotFound(_) => StatusCode::NOT_FOUND,
        };

        let mut body = error_response(&self.to_string());
        if let ServerError::InvalidTarget(errors) = &self {
            body["fieldErrors"] = json!(errors);
        }

        (status, Json(body)).into_response()
    }
}
