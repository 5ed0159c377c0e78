//! Request counter by matched route and status.

use axum::{extract::MatchedPath, extract::Request, middleware::Next, response::Response};
use sm_telemetry::HTTP_REQUESTS;

/// `axum::middleware::from_fn` hook recording `sm_gateway_requests_total`.
pub async fn track_requests(req: Request, next: Next) -> Response {
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_owned())
        .unwrap_or_else(|| "unmatched".to_owned());

    let response = next.run(req).await;
    HTTP_REQUESTS
        .with_label_values(&[&route, response.status().as_str()])
        .inc();
    response
}
