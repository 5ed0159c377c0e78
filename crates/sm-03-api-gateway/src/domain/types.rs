//! Balancer wire types.

use serde::{Deserialize, Serialize};
use sm_01_shard_store::{MessageId, ShardId};

/// Response to `GET /`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalancerBanner {
    pub message: String,
    pub port: u16,
}

/// Body of `POST /login`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub secret: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub username: String,
    pub authenticated: bool,
}

/// Response to edit and delete, naming the shard that applied it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationResponse {
    pub message: String,
    pub server: ShardId,
    pub id: MessageId,
}
