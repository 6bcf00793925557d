/// Domain-separated BLAKE3 hasher.
///
/// Each hasher runs BLAKE3 in key-derivation mode under its own context
/// string, so a content digest and a version digest over identical bytes
/// never collide.
pub struct ContentHasher {
    context: &'static str,
}

impl ContentHasher {
    /// Hasher for canonical snapshot content.
    pub const CONTENT: Self = Self {
        context: "eaip 2024 snapshot content v1",
    };
    /// Hasher for snapshot headers (yields version ids).
    pub const VERSION: Self = Self {
        context: "eaip 2024 snapshot version id v1",
    };
    /// Hasher for synthetic change record ids.
    pub const CHANGE: Self = Self {
        context: "eaip 2024 change record id v1",
    };

    pub fn hash(&self, data: &[u8]) -> [u8; 32] {
        blake3::derive_key(self.context, data)
    }

    /// Hash the JSON encoding of `value`, streamed straight into the hasher.
    pub fn hash_json<T: serde::Serialize>(&self, value: &T) -> Result<[u8; 32], HasherError> {
        let mut hasher = blake3::Hasher::new_derive_key(self.context);
        serde_json::to_writer(&mut hasher, value)
            .map_err(|e| HasherError::Serialization(e.to_string()))?;
        Ok(*hasher.finalize().as_bytes())
    }
}

/// Errors from hashing operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum HasherError {
    #[error("serialization error: {0}")]
    Serialization(String),
}
