//! Fixed keys in the key-value store.

use chrono::{DateTime, Utc};

use crate::error::StorageError;
use crate::storage::KvStore;

/// The whole accounts snapshot (accounts + tags), serialized as JSON.
pub const ACCOUNTS: &str = "accounts.json";

/// Timestamp of the last time the app was backgrounded, for the
/// inactivity lock.
pub const LAST_BACKGROUNDED: &str = "last_backgrounded";

/// Record now as the moment the app went to the background.
pub fn mark_backgrounded(store: &dyn KvStore) -> Result<(), StorageError> {
    store.set(LAST_BACKGROUNDED, Utc::now().to_rfc3339().as_bytes())
}

/// When the app was last backgrounded, if ever recorded.
pub fn last_backgrounded_at(
    store: &dyn KvStore,
) -> Result<Option<DateTime<Utc>>, StorageError> {
    let Some(bytes) = store.get(LAST_BACKGROUNDED)? else {
        return Ok(None);
    };
    let text = String::from_utf8_lossy(&bytes);
    match DateTime::parse_from_rfc3339(text.trim()) {
        Ok(when) => Ok(Some(when.with_timezone(&Utc))),
        Err(e) => {
            log::warn!("Discarding unreadable background timestamp: {}", e);
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn test_backgrounded_round_trip() {
        let store = MemoryStore::new();
        assert_eq!(last_backgrounded_at(&store).unwrap(), None);

        mark_backgrounded(&store).unwrap();
        let when = last_backgrounded_at(&store).unwrap().unwrap();
        assert!((Utc::now() - when).num_seconds() < 5);
    }

    #[test]
    fn test_backgrounded_garbage_is_none() {
        let store = MemoryStore::new();
        store.set(LAST_BACKGROUNDED, b"not a timestamp").unwrap();
        assert_eq!(last_backgrounded_at(&store).unwrap(), None);
    }
}
