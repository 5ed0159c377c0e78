//! API Gateway service - balancer entry point.

use std::future::Future;
use std::sync::Arc;

use axum::Router;
use sm_02_dispatch::DispatchApi;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::domain::config::GatewayConfig;
use crate::domain::error::GatewayError;
use crate::middleware::{create_cors_layer, track_requests, TimeoutLayer};
use crate::router::{routes, AppState};

/// API Gateway service state
pub struct ApiGatewayService {
    config: GatewayConfig,
    dispatch: Arc<dyn DispatchApi>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl ApiGatewayService {
    /// Create a new API Gateway service
    pub fn new(config: GatewayConfig, dispatch: Arc<dyn DispatchApi>) -> Result<Self, GatewayError> {
        config.validate()?;
        Ok(Self {
            config,
            dispatch,
            shutdown_tx: None,
        })
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Build the balancer router with its middleware stack.
    pub fn router(&self) -> Router {
        self.router_for_port(self.config.http.port)
    }

    fn router_for_port(&self, port: u16) -> Router {
        let state = AppState {
            dispatch: Arc::clone(&self.dispatch),
            port,
        };

        let middleware = ServiceBuilder::new()
            .layer(create_cors_layer(&self.config.cors))
            .map_response(axum::response::IntoResponse::into_response)
            .layer(TraceLayer::new_for_http())
            .layer(TimeoutLayer::new(self.config.timeouts.request));

        routes()
            .layer(axum::middleware::from_fn(track_requests))
            .layer(middleware)
            .with_state(state)
    }

    /// Bind the configured address and serve until [`shutdown`](Self::shutdown).
    pub async fn start(&mut self) -> Result<(), GatewayError> {
        let addr = self.config.http_addr();
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| GatewayError::Bind { addr, source })?;
        self.serve_on(listener).await
    }

    /// Serve on an already bound listener until [`shutdown`](Self::shutdown).
    pub async fn serve_on(&mut self, listener: TcpListener) -> Result<(), GatewayError> {
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        self.shutdown_tx = Some(shutdown_tx);
        self.serve_with_shutdown(listener, async {
            let _ = shutdown_rx.await;
        })
        .await
    }

    /// Serve on `listener` until `signal` resolves.
    pub async fn serve_with_shutdown<F>(
        &self,
        listener: TcpListener,
        signal: F,
    ) -> Result<(), GatewayError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let local = listener.local_addr().map_err(GatewayError::Server)?;
        let router = self.router_for_port(local.port());

        info!(addr = %local, "[sm-03] Load balancer listening");
        axum::serve(listener, router)
            .with_graceful_shutdown(signal)
            .await
            .map_err(GatewayError::Server)?;
        info!("[sm-03] Load balancer stopped");
        Ok(())
    }

    /// Trigger graceful shutdown of a server started with `start` or `serve_on`.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
