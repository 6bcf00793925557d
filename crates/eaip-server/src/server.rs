use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use tokio::net::TcpListener;

use eaip_history::{TracingAuditSink, VersionHistory};
use eaip_store::InMemorySnapshotPersistence;

use crate::auth::GatewayIdentity;
use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::router::build_router;
use crate::state::AppState;

/// eAIP version history server.
pub struct EaipServer {
    config: ServerConfig,
    state: AppState,
}

impl EaipServer {
    /// A server over in-memory persistence, auditing to `tracing`.
    pub fn new(config: ServerConfig) -> Self {
        let history = VersionHistory::new(
            Arc::new(InMemorySnapshotPersistence::new()),
            Arc::new(TracingAuditSink),
            config.history.clone(),
        );
        let identity = Arc::new(GatewayIdentity::new(config.allow_anonymous));
        Self::with_state(config, AppState::new(history, identity))
    }

    pub fn with_state(config: ServerConfig, state: AppState) -> Self {
        Self { config, state }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        build_router(self.state.clone()).layer(DefaultBodyLimit::max(self.config.max_body_bytes))
    }

    /// Start serving requests.
    pub async fn serve(self) -> ServerResult<()> {
        let app = self.router();
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        tracing::info!("eAIP history server listening on {}", self.config.bind_addr);
        axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))
    }
}
