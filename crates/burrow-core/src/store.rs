use crate::error::Result;
use crate::id::LinkId;
use crate::shortcode::ShortCode;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A stored link. Created once and never modified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRecord {
    pub id: LinkId,
    /// Always `ShortCode::encode(id)` for records written by the shortener.
    pub code: ShortCode,
    /// The original URL that was shortened.
    pub original_url: String,
}

impl LinkRecord {
    /// Builds the record for a freshly allocated id.
    pub fn allocate(id: LinkId, original_url: impl Into<String>) -> Self {
        Self {
            id,
            code: ShortCode::encode(id),
            original_url: original_url.into(),
        }
    }
}

/// A read-only view of a link store.
///
/// This is the only capability needed to resolve codes.
#[async_trait]
pub trait ReadLinkStore: Send + Sync + 'static {
    /// Resolves a short code to its original URL.
    /// Returns `None` if the code was never issued.
    async fn lookup(&self, code: &ShortCode) -> Result<Option<String>>;
}

/// Persistence for id/code/URL triples.
///
/// None of these calls is atomic with respect to the others. Callers that run
/// `check_duplicate`, `next_id` and `insert` in sequence must handle
/// [`StorageError::Conflict`](crate::error::StorageError::Conflict) from
/// `insert`, because another writer may have claimed the same id in between.
#[async_trait]
pub trait LinkStore: ReadLinkStore {
    /// Returns `max(existing id) + 1`, or [`LinkId::FIRST`] for an empty store.
    async fn next_id(&self) -> Result<LinkId>;

    /// Returns the record already stored for exactly this URL, if any.
    async fn check_duplicate(&self, original_url: &str) -> Result<Option<LinkRecord>>;

    /// Inserts a new record. Returns `Err(Conflict)` if its code or id is taken.
    async fn insert(&self, record: &LinkRecord) -> Result<()>;
}

#[async_trait]
impl<T: ReadLinkStore + ?Sized> ReadLinkStore for std::sync::Arc<T> {
    async fn lookup(&self, code: &ShortCode) -> Result<Option<String>> {
        (**self).lookup(code).await
    }
}

#[async_trait]
impl<T: LinkStore + ?Sized> LinkStore for std::sync::Arc<T> {
    async fn next_id(&self) -> Result<LinkId> {
        (**self).next_id().await
    }

    async fn check_duplicate(&self, original_url: &str) -> Result<Option<LinkRecord>> {
        (**self).check_duplicate(original_url).await
    }

    async fn insert(&self, record: &LinkRecord) -> Result<()> {
        (**self).insert(record).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_derives_code_from_id() {
        let record = LinkRecord::allocate(LinkId::new(53).unwrap(), "https://example.com");
        assert_eq!(record.code.as_str(), "BA");
        assert_eq!(record.original_url, "https://example.com");
    }
}
