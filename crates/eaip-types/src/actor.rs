use serde::{Deserialize, Serialize};

use crate::ids::ActorId;

/// Attribution recorded on snapshots and audit events.
///
/// The history engine never authenticates anyone; it records whatever
/// identity the caller resolved.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Actor {
    pub id: ActorId,
    pub name: String,
    pub email: String,
}

impl Actor {
    pub fn new(id: ActorId, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            email: email.into(),
        }
    }

    /// The built-in principal used for automated snapshots.
    pub fn system() -> Self {
        Self {
            id: ActorId::from_uuid(uuid::Uuid::nil()),
            name: "eAIP System".into(),
            email: "system@eaip.local".into(),
        }
    }

    /// `Name <email>` form, as shown in history listings.
    pub fn signature(&self) -> String {
        format!("{} <{}>", self.name, self.email)
    }
}
