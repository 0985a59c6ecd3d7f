//! Request/response ingestion
//!
//! Writes here take the same store-then-broadcast path as stream telemetry,
//! tagged `external-update`. Validation failures answer the caller with 400
//! and never reach the hub.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::AppState;
use crate::error::{ErrorCategory, HubError};
use crate::event::{Event, Source};
use crate::store::StateSnapshot;
use crate::sync::HubStatus;

#[derive(Debug, Deserialize)]
pub struct DataUpdateRequest {
    pub device_id: String,
    pub value: Value,
}

#[derive(Debug, Deserialize)]
pub struct ControlRequest {
    pub target: String,
    pub command: String,
    pub args: Option<Map<String, Value>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub ok: bool,
    #[serde(flatten)]
    pub status: HubStatus,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DataResponse {
    pub timestamp: DateTime<Utc>,
    pub data: StateSnapshot,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StoredResponse {
    pub ok: bool,
    pub stored: bool,
    pub event: Event,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DispatchedResponse {
    pub ok: bool,
    pub dispatched: bool,
    pub event: Event,
}

pub struct ApiError(HubError);

impl From<HubError> for ApiError {
    fn from(err: HubError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0.category() {
            ErrorCategory::Validation => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = serde_json::json!({ "ok": false, "error": self.0.to_string() });
        (status, Json(body)).into_response()
    }
}

pub async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        ok: true,
        status: state.hub.status(),
    })
}

pub async fn read_data(State(state): State<AppState>) -> Json<DataResponse> {
    Json(DataResponse {
        timestamp: Utc::now(),
        data: state.hub.store().snapshot(),
    })
}

pub async fn submit_data(
    State(state): State<AppState>,
    Json(update): Json<DataUpdateRequest>,
) -> Result<Json<StoredResponse>, ApiError> {
    let event = state
        .hub
        .submit_data(&update.device_id, update.value, Source::ExternalUpdate)?;

    Ok(Json(StoredResponse {
        ok: true,
        stored: true,
        event,
    }))
}

pub async fn submit_control(
    State(state): State<AppState>,
    Json(cmd): Json<ControlRequest>,
) -> Result<Json<DispatchedResponse>, ApiError> {
    if cmd.target.is_empty() {
        return Err(HubError::invalid("target must not be empty").into());
    }
    if cmd.command.is_empty() {
        return Err(HubError::invalid("command must not be empty").into());
    }

    let event = state
        .hub
        .submit_control(
            Some(cmd.target),
            Some(cmd.command),
            cmd.args.unwrap_or_default(),
            Source::ExternalUpdate,
        );

    Ok(Json(DispatchedResponse {
        ok: true,
        dispatched: true,
        event,
    }))
}
