//! Shard node router and handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};

use super::types::{
    ClearReceipt, EditRequest, MutationReceipt, ReceiveReceipt, ShardBanner, ShardErrorBody,
};
use crate::domain::errors::ShardStoreError;
use crate::domain::message::{MessageId, NewMessage, ShardId, ShardStats, StoredMessage};
use crate::ports::inbound::ShardStoreApi;
use crate::service::{ShardStore, SharedShardStore};

#[derive(Clone)]
struct ShardNodeState {
    store: SharedShardStore,
    shard_id: ShardId,
    backend: &'static str,
}

/// Build the shard node router.
///
/// `POST /corrupt/{id}` is only mounted when `fault_injection` is set.
pub fn shard_router(store: SharedShardStore, fault_injection: bool) -> Router {
    let mut router = Router::new()
        .route("/", get(banner))
        .route("/health", get(health))
        .route("/receive", post(receive))
        .route("/messages/:username", get(list_inbox))
        .route("/sent/:username", get(list_sent))
        .route("/edit/:id", put(edit))
        .route("/delete/:id", delete(delete_message))
        .route("/sent-history/:username", delete(clear_sent))
        .route("/inbox-history/:username", delete(clear_inbox))
        .route("/stats", get(stats));

    if fault_injection {
        router = router.route("/corrupt/:id", post(corrupt));
    }

    let (shard_id, backend) = {
        let guard = store.read();
        (guard.shard_id().clone(), guard.backend_name())
    };
    router.with_state(ShardNodeState {
        store,
        shard_id,
        backend,
    })
}

/// HTTP status a shard answers with for each store error.
pub fn status_for(err: &ShardStoreError) -> StatusCode {
    match err {
        ShardStoreError::DuplicateId { .. }
        | ShardStoreError::CorruptedMessage { .. }
        | ShardStoreError::MessageLocked { .. } => StatusCode::BAD_REQUEST,
        ShardStoreError::MessageNotFound { .. } => StatusCode::NOT_FOUND,
        ShardStoreError::StorageUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
    }
}

impl IntoResponse for ShardStoreError {
    fn into_response(self) -> Response {
        (status_for(&self), Json(ShardErrorBody::from(&self))).into_response()
    }
}

/// Run a store operation off the async executor.
async fn with_store<T, F>(state: &ShardNodeState, op: F) -> Result<T, ShardStoreError>
where
    F: FnOnce(&mut ShardStore) -> Result<T, ShardStoreError> + Send + 'static,
    T: Send + 'static,
{
    let store = state.store.clone();
    tokio::task::spawn_blocking(move || op(&mut store.write()))
        .await
        .map_err(|e| ShardStoreError::StorageUnavailable {
            message: format!("store task failed: {e}"),
        })?
}

/// Identity is fixed at build time; these never wait on the store lock.
fn shard_banner(state: &ShardNodeState, status: &str) -> Json<ShardBanner> {
    Json(ShardBanner {
        status: status.to_string(),
        shard_id: state.shard_id.clone(),
        backend: state.backend.to_string(),
    })
}

async fn banner(State(state): State<ShardNodeState>) -> Json<ShardBanner> {
    shard_banner(&state, "running")
}

async fn health(State(state): State<ShardNodeState>) -> Json<ShardBanner> {
    shard_banner(&state, "ok")
}

async fn receive(
    State(state): State<ShardNodeState>,
    Json(message): Json<NewMessage>,
) -> Result<Json<ReceiveReceipt>, ShardStoreError> {
    let stored = with_store(&state, move |store| store.receive(message)).await?;
    Ok(Json(ReceiveReceipt::from(&stored)))
}

async fn list_inbox(
    State(state): State<ShardNodeState>,
    Path(username): Path<String>,
) -> Result<Json<Vec<StoredMessage>>, ShardStoreError> {
    let messages = with_store(&state, move |store| store.list_for_receiver(&username)).await?;
    Ok(Json(messages))
}

async fn list_sent(
    State(state): State<ShardNodeState>,
    Path(username): Path<String>,
) -> Result<Json<Vec<StoredMessage>>, ShardStoreError> {
    let messages = with_store(&state, move |store| store.list_sent(&username)).await?;
    Ok(Json(messages))
}

async fn edit(
    State(state): State<ShardNodeState>,
    Path(id): Path<MessageId>,
    Json(request): Json<EditRequest>,
) -> Result<Json<MutationReceipt>, ShardStoreError> {
    with_store(&state, move |store| store.edit(id, request.content)).await?;
    Ok(Json(MutationReceipt {
        message: "Message updated".to_string(),
        id,
    }))
}

async fn delete_message(
    State(state): State<ShardNodeState>,
    Path(id): Path<MessageId>,
) -> Result<Json<MutationReceipt>, ShardStoreError> {
    with_store(&state, move |store| store.delete(id)).await?;
    Ok(Json(MutationReceipt {
        message: "Message deleted".to_string(),
        id,
    }))
}

async fn clear_sent(
    State(state): State<ShardNodeState>,
    Path(username): Path<String>,
) -> Result<Json<ClearReceipt>, ShardStoreError> {
    let deleted = with_store(&state, move |store| store.clear_sent_history(&username)).await?;
    Ok(Json(ClearReceipt {
        message: "Sent history cleared".to_string(),
        deleted,
    }))
}

async fn clear_inbox(
    State(state): State<ShardNodeState>,
    Path(username): Path<String>,
) -> Result<Json<ClearReceipt>, ShardStoreError> {
    let deleted = with_store(&state, move |store| store.clear_inbox_history(&username)).await?;
    Ok(Json(ClearReceipt {
        message: "Inbox history cleared".to_string(),
        deleted,
    }))
}

async fn stats(State(state): State<ShardNodeState>) -> Result<Json<ShardStats>, ShardStoreError> {
    let stats = with_store(&state, |store| store.stats()).await?;
    Ok(Json(stats))
}

async fn corrupt(
    State(state): State<ShardNodeState>,
    Path(id): Path<MessageId>,
) -> Result<Json<MutationReceipt>, ShardStoreError> {
    with_store(&state, move |store| store.inject_corruption(id)).await?;
    Ok(Json(MutationReceipt {
        message: "Message corrupted".to_string(),
        id,
    }))
}
