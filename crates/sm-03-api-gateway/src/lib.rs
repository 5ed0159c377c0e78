//! # API Gateway (sm-03)
//!
//! The balancer's HTTP surface. Every route is a thin adapter over
//! `DispatchApi`; errors are rendered as `{"error", "code", "message_id"}`.
//!
//! ## Routes
//!
//! | Method | Path | Operation |
//! |--------|------|-----------|
//! | GET | `/` | banner |
//! | GET | `/servers` | health map |
//! | GET | `/dashboard-data` | router snapshot and per-shard load |
//! | POST | `/route` | place a message |
//! | POST | `/fail/{shard}`, `/restore/{shard}` | mark DOWN / UP |
//! | GET | `/inbox/{user}`, `/sent/{user}` | merged mailbox views |
//! | DELETE | `/inbox-history/{user}`, `/sent-history/{user}` | bulk clear |
//! | PUT | `/edit/{id}` | edit on the owning shard |
//! | DELETE | `/delete/{id}` | delete on the owning shard |
//! | POST | `/login` | credential check |
//! | GET | `/metrics` | Prometheus text |
//!
//! ## Middleware
//!
//! CORS (tower-http) → request spans (tower-http `TraceLayer`) → whole-request
//! timeout → request counter.

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod domain;
pub mod middleware;
pub mod router;
pub mod service;

pub use domain::{
    status_for, ApiError, BalancerBanner, ConfigError, CorsConfig, GatewayConfig, GatewayError,
    HttpConfig, LoginRequest, LoginResponse, MutationResponse, TimeoutConfig,
};
pub use router::AppState;
pub use service::ApiGatewayService;
