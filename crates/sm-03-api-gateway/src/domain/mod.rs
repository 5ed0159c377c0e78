//! Gateway configuration, errors and wire types.

pub mod config;
pub mod error;
pub mod types;

pub use config::{ConfigError, CorsConfig, GatewayConfig, HttpConfig, TimeoutConfig};
pub use error::{status_for, ApiError, GatewayError};
pub use types::{BalancerBanner, LoginRequest, LoginResponse, MutationResponse};
