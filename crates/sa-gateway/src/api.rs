//! The four HTTP endpoints Section 6 names.

use axum::extract::{DefaultBodyLimit, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures_util::StreamExt;
use sa_runner::InvokeRequest;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::runtime::{accumulate_reply, policy_allows, resolve, InboundMessage, PolicyDecision};
use crate::state::AppState;

/// Wires the four endpoints Section 6 names onto a router, with the
/// configured max request body size enforced on the one route that
/// accepts a body large enough to matter.
pub fn router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/v1/gateway/messages", post(post_messages).layer(DefaultBodyLimit::max(state.config.server.max_body_bytes)))
        .route("/v1/gateway/status", get(get_status))
        .route("/v1/gateway/cancel", post(post_cancel))
        .route("/healthz", get(get_healthz))
}

#[derive(Debug, Deserialize)]
pub struct MessagesRequest {
    pub channel: String,
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
    pub thread: Option<String>,
    #[serde(default)]
    pub message_id: Option<String>,
    pub text: String,
    pub user_id: Option<String>,
    pub session_id: Option<String>,
    pub request_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MessagesResponse {
    pub session_id: String,
    pub request_id: String,
    pub reply: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignored: Option<bool>,
}

pub async fn post_messages(State(state): State<AppState>, Json(body): Json<MessagesRequest>) -> Result<Json<MessagesResponse>, ApiError> {
    if body.text.trim().is_empty() {
        return Err(ApiError::InvalidRequest("text must not be empty".into()));
    }

    let inbound = InboundMessage {
        channel: body.channel.clone(),
        from: body.from.clone(),
        thread: body.thread.clone(),
        text: body.text.clone(),
        user_id: body.user_id.clone(),
        session_id: body.session_id.clone(),
        request_id: body.request_id.clone(),
    };

    let resolved = resolve(&inbound).ok_or_else(|| ApiError::InvalidRequest("one of user_id or from is required".into()))?;
    let request_id = body.request_id.clone().unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    match policy_allows(&state.config.policy, &inbound, &resolved.user_id) {
        PolicyDecision::Unauthorized => return Err(ApiError::Unauthorized("user is not on the allowlist".into())),
        PolicyDecision::Ignored => {
            return Ok(Json(MessagesResponse {
                session_id: resolved.session_id,
                request_id,
                reply: String::new(),
                ignored: Some(true),
            }))
        }
        PolicyDecision::Allowed => {}
    }

    let permit = state.lane_lock.acquire(&resolved.session_id).await;

    let result = state
        .runner
        .invoke(InvokeRequest {
            user_id: resolved.user_id.clone(),
            session_id: resolved.session_id.clone(),
            text: body.text.clone(),
            request_id: Some(request_id.clone()),
        })
        .await;

    let reply = match result {
        Ok(mut stream) => {
            let mut events = Vec::new();
            while let Some(event) = stream.next().await {
                events.push(event.map_err(|e| ApiError::Internal(e.to_string()))?);
            }
            accumulate_reply(&events)
        }
        Err(e) => return Err(e.into()),
    };

    state.lane_lock.release_trace(&resolved.session_id);
    drop(permit);

    Ok(Json(MessagesResponse { session_id: resolved.session_id, request_id, reply, ignored: None }))
}

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub request_id: String,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub state: String,
    pub started_at: chrono::DateTime<chrono::Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<chrono::DateTime<chrono::Utc>>,
}

pub async fn get_status(State(state): State<AppState>, Query(query): Query<StatusQuery>) -> Result<Json<StatusResponse>, ApiError> {
    let run = state.runner.status(&query.request_id).ok_or(ApiError::NotFound)?;
    Ok(Json(StatusResponse { state: run.status.as_wire().to_string(), started_at: run.started_at, ended_at: run.ended_at }))
}

#[derive(Debug, Deserialize)]
pub struct CancelRequest {
    pub request_id: String,
}

#[derive(Debug, Serialize)]
pub struct CancelResponse {
    pub canceled: bool,
}

pub async fn post_cancel(State(state): State<AppState>, Json(body): Json<CancelRequest>) -> Json<CancelResponse> {
    Json(CancelResponse { canceled: state.runner.cancel(&body.request_id) })
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

pub async fn get_healthz() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}
