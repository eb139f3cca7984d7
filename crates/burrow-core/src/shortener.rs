use crate::id::LinkId;
use crate::shortcode::ShortCode;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

type Result<T> = std::result::Result<T, crate::error::ShortenerError>;

/// Outcome of a shorten request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shortened {
    pub id: LinkId,
    pub code: ShortCode,
    /// `false` when an existing code for the same URL was returned.
    pub created: bool,
}

#[async_trait]
pub trait Shortener: Send + Sync + 'static {
    /// Returns the short code for `original_url`, creating one if the URL has
    /// not been shortened before.
    async fn shorten(&self, original_url: &str) -> Result<Shortened>;

    /// Resolves a short code to its original URL.
    /// Returns `None` if the code was never issued.
    async fn resolve(&self, code: &ShortCode) -> Result<Option<String>>;
}
