use std::sync::Arc;

use axum::http::HeaderMap;

use eaip_history::VersionHistory;
use eaip_types::Actor;

use crate::auth::{Credentials, IdentityProvider};
use crate::error::ServerResult;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub history: VersionHistory,
    pub identity: Arc<dyn IdentityProvider>,
}

impl AppState {
    pub fn new(history: VersionHistory, identity: Arc<dyn IdentityProvider>) -> Self {
        Self { history, identity }
    }

    /// The actor a write request is attributed to.
    pub async fn actor(&self, headers: &HeaderMap) -> ServerResult<Actor> {
        self.identity
            .authenticate(&Credentials::from_headers(headers))
            .await
    }
}
