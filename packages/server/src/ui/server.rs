//! Server execution logic.

use std::{sync::Arc, time::Duration};

use axum::{Router, routing::get};
use tokio::{net::TcpListener, task::JoinHandle};
use tower_http::trace::TraceLayer;

use crate::{config::ServerConfig, usecase::ExpireSessionsUseCase};

use super::{
    handler::{get_stats, health_check, websocket_handler},
    signal::shutdown_signal,
    state::AppState,
};

pub type ServeResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Anonymous chat server
///
/// # Example
///
/// ```ignore
/// let config = ServerConfig::default();
/// let server = Server::from_config(&config);
/// server.run(&config.host, config.port).await?;
/// ```
pub struct Server {
    state: Arc<AppState>,
    /// Interval of the expired-session sweeper
    sweep_interval: Duration,
}

impl Server {
    pub fn new(state: AppState, sweep_interval: Duration) -> Self {
        Self {
            state: Arc::new(state),
            sweep_interval,
        }
    }

    /// Server backed by the in-memory stores.
    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(
            AppState::with_in_memory_stores(config),
            config.sweep_interval,
        )
    }

    pub fn router(&self) -> Router {
        Router::new()
            // WebSocket エンドポイント
            .route("/ws", get(websocket_handler))
            // HTTP エンドポイント
            .route("/api/health", get(health_check))
            .route("/api/stats", get(get_stats))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Bind to `host:port` and serve until a shutdown signal arrives.
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address or
    /// if there's an error during server execution.
    pub async fn run(self, host: &str, port: u16) -> ServeResult {
        let bind_addr = format!("{}:{}", host, port);
        let listener = TcpListener::bind(&bind_addr).await?;
        tracing::info!("Connect to: ws://{}/ws", bind_addr);
        self.serve(listener).await
    }

    /// Serve on an already bound listener until a shutdown signal arrives.
    pub async fn serve(self, listener: TcpListener) -> ServeResult {
        let app = self.router();
        let sweeper = spawn_sweeper(
            self.state.expire_sessions_usecase.clone(),
            self.sweep_interval,
        );

        tracing::info!("Chat server listening on {}", listener.local_addr()?);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        let result = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await;
        sweeper.abort();
        result?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}

/// Periodically purge expired sessions.
fn spawn_sweeper(usecase: Arc<ExpireSessionsUseCase>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // 初回の tick は即座に完了する
        interval.tick().await;
        loop {
            interval.tick().await;
            if let Err(e) = usecase.execute().await {
                tracing::error!("Session sweep failed: {}", e);
            }
        }
    })
}
