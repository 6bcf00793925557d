//! HTTP server for eAIP document version history.
//!
//! Exposes live document writes, snapshot creation, history listings,
//! comparisons and restore under `/v1`. Writes are attributed to the actor
//! an [`IdentityProvider`] resolves from gateway headers; engine errors map
//! to 404/409/400/500 with a JSON body carrying `error`, `kind` and
//! `retryable`.

pub mod auth;
pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;
pub mod state;

pub use auth::{Credentials, GatewayIdentity, IdentityProvider};
pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use server::EaipServer;
pub use state::AppState;
