use async_trait::async_trait;
use axum::http::HeaderMap;

use eaip_types::{Actor, ActorId};

use crate::error::{ServerError, ServerResult};

pub const ACTOR_ID_HEADER: &str = "x-actor-id";
pub const ACTOR_NAME_HEADER: &str = "x-actor-name";
pub const ACTOR_EMAIL_HEADER: &str = "x-actor-email";

/// Caller identity as asserted by the fronting gateway.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Credentials {
    Gateway {
        id: String,
        name: Option<String>,
        email: Option<String>,
    },
    Anonymous,
}

impl Credentials {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        match header(ACTOR_ID_HEADER) {
            Some(id) => Self::Gateway {
                id,
                name: header(ACTOR_NAME_HEADER),
                email: header(ACTOR_EMAIL_HEADER),
            },
            None => Self::Anonymous,
        }
    }
}

/// Resolves request credentials to the actor a write is attributed to.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn authenticate(&self, credentials: &Credentials) -> ServerResult<Actor>;
}

/// Trusts the gateway headers as given.
pub struct GatewayIdentity {
    allow_anonymous: bool,
}

impl GatewayIdentity {
    pub fn new(allow_anonymous: bool) -> Self {
        Self { allow_anonymous }
    }
}

#[async_trait]
impl IdentityProvider for GatewayIdentity {
    async fn authenticate(&self, credentials: &Credentials) -> ServerResult<Actor> {
        match credentials {
            Credentials::Gateway { id, name, email } => {
                let actor_id: ActorId = id
                    .parse()
                    .map_err(|e| ServerError::Unauthenticated(format!("{ACTOR_ID_HEADER}: {e}")))?;
                let name = name.clone().unwrap_or_else(|| actor_id.short_id());
                Ok(Actor::new(actor_id, name, email.clone().unwrap_or_default()))
            }
            Credentials::Anonymous if self.allow_anonymous => Ok(Actor::system()),
            Credentials::Anonymous => Err(ServerError::Unauthenticated(format!(
                "missing {ACTOR_ID_HEADER} header"
            ))),
        }
    }
}
