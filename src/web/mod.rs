//! Web layer
//!
//! Thin axum handlers over the [`GatewayService`]; request validation at the
//! boundary, one shared [`AppState`], and centralized error mapping in
//! [`responses`]. The server binds loopback by default and is meant to be
//! pointed at by a local media player.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::{Router, routing::get};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::service::GatewayService;

pub mod handlers;
pub mod responses;

pub use responses::handle_error;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub service: GatewayService,
    pub config: Arc<Config>,
}

pub struct WebServer {
    app: Router,
    addr: SocketAddr,
}

impl WebServer {
    pub fn new(config: Config, service: GatewayService) -> Result<Self> {
        let addr: SocketAddr = format!("{}:{}", config.web.host, config.web.port).parse()?;
        let app = create_router(AppState {
            service,
            config: Arc::new(config),
        });
        Ok(Self { app, addr })
    }

    /// Get the host address
    pub fn host(&self) -> String {
        self.addr.ip().to_string()
    }

    /// Get the port number
    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Bind and serve until Ctrl+C
    pub async fn serve(self) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(&self.addr).await?;
        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    }
}

/// Create the router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index::help))
        .route("/p", get(handlers::parse::parse_url))
        .route("/l", get(handlers::recents::list_recent))
        .route("/c/{category_id}", get(handlers::playlists::serve_category))
        .route("/v/{post_id}", get(handlers::streams::serve_episode))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install Ctrl+C handler");
    tracing::info!("Received Ctrl+C, shutting down gracefully");
}
