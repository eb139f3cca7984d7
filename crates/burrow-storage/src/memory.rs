use async_trait::async_trait;
use burrow_core::error::Result;
use burrow_core::{LinkId, LinkRecord, LinkStore, ReadLinkStore, ShortCode, StorageError};
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::{debug, trace};

#[derive(Debug, Default)]
struct State {
    /// id -> original URL
    urls: HashMap<LinkId, String>,
    /// code -> id
    codes: HashMap<ShortCode, LinkId>,
}

/// In-memory implementation of the link store contract.
///
/// Both maps live behind a single lock and every operation holds it for its
/// whole duration, so each call is linearizable. `next_id` and
/// `check_duplicate` are linear scans; this backend is meant for development
/// and tests, not for large data sets.
#[derive(Debug, Default)]
pub struct InMemoryLinkStore {
    state: Mutex<State>,
}

impl InMemoryLinkStore {
    /// Creates a new, empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored links.
    pub async fn len(&self) -> usize {
        self.state.lock().await.codes.len()
    }
}

#[async_trait]
impl ReadLinkStore for InMemoryLinkStore {
    async fn lookup(&self, code: &ShortCode) -> Result<Option<String>> {
        let state = self.state.lock().await;

        let url = state
            .codes
            .get(code)
            .and_then(|id| state.urls.get(id))
            .cloned();

        trace!(code = %code, found = url.is_some(), "looked up short code");
        Ok(url)
    }
}

#[async_trait]
impl LinkStore for InMemoryLinkStore {
    async fn next_id(&self) -> Result<LinkId> {
        let state = self.state.lock().await;

        match state.urls.keys().max() {
            None => Ok(LinkId::FIRST),
            Some(max) => max.next().ok_or_else(|| {
                StorageError::Query(format!("identifier space exhausted after {max}"))
            }),
        }
    }

    async fn check_duplicate(&self, original_url: &str) -> Result<Option<LinkRecord>> {
        let state = self.state.lock().await;

        // Lowest id wins if the same URL was stored more than once.
        let found = state
            .codes
            .iter()
            .filter(|(_, id)| state.urls.get(*id).is_some_and(|url| url == original_url))
            .min_by_key(|(_, id)| **id)
            .map(|(code, id)| LinkRecord {
                id: *id,
                code: code.clone(),
                original_url: original_url.to_owned(),
            });

        trace!(url = %original_url, found = found.is_some(), "checked for duplicate");
        Ok(found)
    }

    async fn insert(&self, record: &LinkRecord) -> Result<()> {
        let mut state = self.state.lock().await;

        if state.codes.contains_key(&record.code) {
            debug!(code = %record.code, "short code already exists");
            return Err(StorageError::Conflict(record.code.to_string()));
        }
        if state.urls.contains_key(&record.id) {
            debug!(id = %record.id, "id already exists");
            return Err(StorageError::Conflict(record.id.to_string()));
        }

        state.urls.insert(record.id, record.original_url.clone());
        state.codes.insert(record.code.clone(), record.id);

        debug!(id = %record.id, code = %record.code, url = %record.original_url, "link stored");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u64) -> LinkId {
        LinkId::new(n).unwrap()
    }

    fn record(n: u64, url: &str) -> LinkRecord {
        LinkRecord::allocate(id(n), url)
    }

    #[tokio::test]
    async fn insert_and_lookup() {
        let store = InMemoryLinkStore::new();

        store.insert(&record(1, "https://example.com")).await.unwrap();

        let code = ShortCode::new("A").unwrap();
        let url = store.lookup(&code).await.unwrap();
        assert_eq!(url.as_deref(), Some("https://example.com"));
    }

    #[tokio::test]
    async fn lookup_nonexistent() {
        let store = InMemoryLinkStore::new();

        let url = store.lookup(&ShortCode::new("NOPE").unwrap()).await.unwrap();
        assert!(url.is_none());
    }

    #[tokio::test]
    async fn insert_conflict_on_code() {
        let store = InMemoryLinkStore::new();

        store.insert(&record(1, "https://one.example")).await.unwrap();

        let err = store
            .insert(&record(1, "https://two.example"))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Conflict(_)));

        // the first mapping is untouched
        let url = store.lookup(&ShortCode::new("A").unwrap()).await.unwrap();
        assert_eq!(url.as_deref(), Some("https://one.example"));
    }

    #[tokio::test]
    async fn insert_conflict_on_id() {
        let store = InMemoryLinkStore::new();
        store.insert(&record(3, "https://one.example")).await.unwrap();

        let clash = LinkRecord {
            id: id(3),
            code: ShortCode::new("ZZ").unwrap(),
            original_url: "https://two.example".to_string(),
        };
        let err = store.insert(&clash).await.unwrap_err();
        assert!(matches!(err, StorageError::Conflict(_)));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn next_id_on_empty_store() {
        let store = InMemoryLinkStore::new();
        assert_eq!(store.next_id().await.unwrap(), id(1));
    }

    #[tokio::test]
    async fn next_id_follows_max() {
        let store = InMemoryLinkStore::new();

        store.insert(&record(5, "https://example.com")).await.unwrap();
        assert_eq!(store.next_id().await.unwrap(), id(6));

        store.insert(&record(2, "https://other.example")).await.unwrap();
        assert_eq!(store.next_id().await.unwrap(), id(6));
    }

    #[tokio::test]
    async fn next_id_exhausted() {
        let store = InMemoryLinkStore::new();
        store
            .insert(&record(u64::MAX, "https://example.com"))
            .await
            .unwrap();

        let err = store.next_id().await.unwrap_err();
        assert!(matches!(err, StorageError::Query(_)));
    }

    #[tokio::test]
    async fn check_duplicate_hit_and_miss() {
        let store = InMemoryLinkStore::new();
        store.insert(&record(1, "https://example.com")).await.unwrap();
        store.insert(&record(2, "https://other.example")).await.unwrap();

        let hit = store
            .check_duplicate("https://other.example")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(hit, record(2, "https://other.example"));

        let miss = store.check_duplicate("https://missing.example").await.unwrap();
        assert!(miss.is_none());
    }

    #[tokio::test]
    async fn check_duplicate_prefers_lowest_id() {
        let store = InMemoryLinkStore::new();
        store.insert(&record(7, "https://example.com")).await.unwrap();
        store.insert(&record(4, "https://example.com")).await.unwrap();

        let hit = store.check_duplicate("https://example.com").await.unwrap();
        assert_eq!(hit.map(|r| r.id), Some(id(4)));
    }

    #[tokio::test]
    async fn concurrent_access() {
        use std::sync::Arc;

        let store = Arc::new(InMemoryLinkStore::new());
        let mut handles = vec![];

        for i in 1..=10u64 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store
                    .insert(&record(i, &format!("https://example{i}.com")))
                    .await
                    .unwrap();
            }));
        }

        for i in 1..=10u64 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                let _ = store.lookup(&ShortCode::encode(id(i))).await;
            }));
        }

        for handle in handles {
            handle.await.unwrap();
        }

        for i in 1..=10u64 {
            let url = store.lookup(&ShortCode::encode(id(i))).await.unwrap();
            assert_eq!(url, Some(format!("https://example{i}.com")));
        }
        assert_eq!(store.next_id().await.unwrap(), id(11));
    }
}
