use tracing::warn;

use eaip_store::StoreResult;
use eaip_types::DocumentId;

use crate::error::{HistoryError, HistoryResult};

/// Run `op` until it stops losing head races, at most `max_attempts` times.
///
/// `op` must rebuild its snapshot from a fresh read on every call. Errors
/// other than a head mismatch are returned immediately.
pub(crate) fn retry_on_conflict<T>(
    document: &DocumentId,
    max_attempts: u32,
    mut op: impl FnMut() -> StoreResult<T>,
) -> HistoryResult<T> {
    let max_attempts = max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match op() {
            Ok(value) => return Ok(value),
            Err(err) if err.is_conflict() => {
                if attempt >= max_attempts {
                    warn!(document = %document, attempts = attempt, "giving up after repeated head conflicts");
                    return Err(HistoryError::ConcurrentHeadMismatch {
                        document: *document,
                        attempts: attempt,
                    });
                }
                warn!(document = %document, attempt, max_attempts, "head moved, retrying");
                attempt += 1;
            }
            Err(err) => return Err(err.into()),
        }
    }
}
