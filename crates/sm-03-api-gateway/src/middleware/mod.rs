//! Middleware stack for the balancer.
//!
//! Layer order: Request → CORS → Trace → Timeout → Metrics → Handler

pub mod cors;
pub mod metrics;
pub mod timeout;

pub use cors::create_cors_layer;
pub use metrics::track_requests;
pub use timeout::TimeoutLayer;
