//! Balancer routes and handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{delete, get, post, put},
    Json, Router,
};
use sm_01_shard_store::adapters::http::{ClearReceipt, EditRequest};
use sm_01_shard_store::{MessageId, NewMessage, StoredMessage};
use sm_02_dispatch::{DashboardSnapshot, DispatchApi, HealthMap, HistoryKind, RouteOutcome};
use sm_telemetry::encode_metrics;

use crate::domain::error::ApiError;
use crate::domain::types::{BalancerBanner, LoginRequest, LoginResponse, MutationResponse};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub dispatch: Arc<dyn DispatchApi>,
    /// Port reported by `GET /`.
    pub port: u16,
}

/// All balancer routes, without middleware.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(banner))
        .route("/health", get(health))
        .route("/servers", get(servers))
        .route("/dashboard-data", get(dashboard_data))
        .route("/route", post(route_message))
        .route("/fail/:shard_id", post(fail_shard))
        .route("/restore/:shard_id", post(restore_shard))
        .route("/inbox/:username", get(inbox))
        .route("/sent/:username", get(sent))
        .route("/sent-history/:username", delete(clear_sent))
        .route("/inbox-history/:username", delete(clear_inbox))
        .route("/edit/:id", put(edit_message))
        .route("/delete/:id", delete(delete_message))
        .route("/login", post(login))
        .route("/metrics", get(metrics))
}

async fn banner(State(state): State<AppState>) -> Json<BalancerBanner> {
    Json(BalancerBanner {
        message: "Load Balancer is running".to_string(),
        port: state.port,
    })
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn servers(State(state): State<AppState>) -> Json<HealthMap> {
    Json(state.dispatch.health_map())
}

async fn dashboard_data(State(state): State<AppState>) -> Json<DashboardSnapshot> {
    Json(state.dispatch.dashboard().await)
}

async fn route_message(
    State(state): State<AppState>,
    Json(message): Json<NewMessage>,
) -> Result<Json<RouteOutcome>, ApiError> {
    Ok(Json(state.dispatch.route_write(message).await?))
}

async fn fail_shard(
    State(state): State<AppState>,
    Path(shard_id): Path<String>,
) -> Result<Json<HealthMap>, ApiError> {
    Ok(Json(state.dispatch.mark_down(&shard_id)?))
}

async fn restore_shard(
    State(state): State<AppState>,
    Path(shard_id): Path<String>,
) -> Result<Json<HealthMap>, ApiError> {
    Ok(Json(state.dispatch.mark_up(&shard_id)?))
}

async fn inbox(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Json<Vec<StoredMessage>> {
    Json(state.dispatch.inbox(&username).await)
}

async fn sent(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Json<Vec<StoredMessage>> {
    Json(state.dispatch.sent(&username).await)
}

async fn clear_sent(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Json<ClearReceipt> {
    let deleted = state
        .dispatch
        .clear_history(HistoryKind::Sent, &username)
        .await;
    Json(ClearReceipt {
        message: "Sent history cleared".to_string(),
        deleted,
    })
}

async fn clear_inbox(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Json<ClearReceipt> {
    let deleted = state
        .dispatch
        .clear_history(HistoryKind::Inbox, &username)
        .await;
    Json(ClearReceipt {
        message: "Inbox history cleared".to_string(),
        deleted,
    })
}

async fn edit_message(
    State(state): State<AppState>,
    Path(id): Path<MessageId>,
    Json(request): Json<EditRequest>,
) -> Result<Json<MutationResponse>, ApiError> {
    let outcome = state.dispatch.edit_message(id, request.content).await?;
    Ok(Json(MutationResponse {
        message: "Message updated".to_string(),
        server: outcome.server,
        id: outcome.id,
    }))
}

async fn delete_message(
    State(state): State<AppState>,
    Path(id): Path<MessageId>,
) -> Result<Json<MutationResponse>, ApiError> {
    let outcome = state.dispatch.delete_message(id).await?;
    Ok(Json(MutationResponse {
        message: "Message deleted".to_string(),
        server: outcome.server,
        id: outcome.id,
    }))
}

async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    if !state
        .dispatch
        .authenticate(&request.username, &request.secret)
    {
        tracing::info!("[sm-03] Rejected login for {}", request.username);
        return Err(ApiError::unauthorized());
    }
    Ok(Json(LoginResponse {
        username: request.username,
        authenticated: true,
    }))
}

async fn metrics() -> Result<impl IntoResponse, ApiError> {
    let body = encode_metrics().map_err(|e| ApiError::internal(e.to_string()))?;
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    ))
}
