//! Canonical encoding of snapshot content.
//!
//! Content is stored as compact JSON. Struct fields serialize in declaration
//! order and every map (metadata properties, rich-text objects) serializes in
//! sorted key order, so equal content always encodes to identical bytes.

use eaip_types::{ContentHash, ContentHasher, DocumentContent};

use crate::error::{StoreError, StoreResult};

/// Encode content to its canonical byte form.
pub fn encode(content: &DocumentContent) -> StoreResult<Vec<u8>> {
    serde_json::to_vec(content).map_err(|e| StoreError::Serialization(e.to_string()))
}

/// Decode content previously produced by [`encode`].
pub fn decode(payload: &[u8]) -> StoreResult<DocumentContent> {
    serde_json::from_slice(payload).map_err(|e| StoreError::Serialization(e.to_string()))
}

/// Encode and verify that decoding yields exactly the same content.
///
/// Snapshots are only ever persisted through this path, so a value that
/// cannot survive the trip never enters a chain.
pub fn encode_verified(content: &DocumentContent) -> StoreResult<Vec<u8>> {
    let payload = encode(content)?;
    let decoded = decode(&payload)?;
    if &decoded != content {
        return Err(StoreError::Serialization(
            "content does not round-trip through the snapshot codec".into(),
        ));
    }
    Ok(payload)
}

/// Digest of an encoded payload.
pub fn content_hash(payload: &[u8]) -> ContentHash {
    ContentHash::from_hash(ContentHasher::CONTENT.hash(payload))
}
