use std::sync::Arc;

use agora_sdk::Agent;
use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::router::{build_router, AppState};

/// Serves one agent over HTTP.
pub struct AgoraServer {
    config: ServerConfig,
    agent: Arc<Agent>,
}

impl AgoraServer {
    pub fn new(config: ServerConfig, agent: Arc<Agent>) -> Self {
        Self { config, agent }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        build_router(AppState::new(Arc::clone(&self.agent)))
    }

    /// Start serving requests.
    pub async fn serve(self) -> ServerResult<()> {
        let app = self.router();
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        tracing::info!(
            addr = %self.config.bind_addr,
            agent = %self.agent.id(),
            "agora server listening"
        );
        axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))
    }
}
