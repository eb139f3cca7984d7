use async_trait::async_trait;
use burrow_core::{
    LinkId, LinkRecord, LinkStore, ShortCode, Shortened, Shortener, ShortenerError, StorageError,
};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, trace, warn};
use typed_builder::TypedBuilder;

/// Tunables for [`ShortenerService`].
#[derive(Debug, Clone, TypedBuilder)]
pub struct ShortenerSettings {
    /// How many conflicting rounds in a row may pass without the next
    /// allocated id moving past the one that was just taken.
    #[builder(default = 5)]
    pub max_attempts: u32,
    /// Hard cap on allocate-and-insert rounds for one request, progress or not.
    #[builder(default = 1024)]
    pub max_rounds: u32,
    /// Upper bound for every single store call.
    #[builder(default = Duration::from_secs(5))]
    pub operation_timeout: Duration,
}

impl Default for ShortenerSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// A concrete implementation of the `Shortener` trait.
///
/// Creating a link runs `check_duplicate -> next_id -> insert` against the
/// store. The sequence is not atomic: if another writer claims the same id
/// first, the insert reports a conflict and the whole round is retried.
///
/// A conflict followed by a higher `next_id` means some other writer got its
/// link in, so those rounds are not counted against
/// [`ShortenerSettings::max_attempts`]; only stalled rounds are. The total is
/// still capped by [`ShortenerSettings::max_rounds`]. Two concurrent requests
/// for the same URL can still end up with two different codes.
#[derive(Debug)]
pub struct ShortenerService<S> {
    store: Arc<S>,
    settings: ShortenerSettings,
}

impl<S> Clone for ShortenerService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            settings: self.settings.clone(),
        }
    }
}

impl<S: LinkStore> ShortenerService<S> {
    /// Creates a new `ShortenerService` with default settings.
    pub fn new(store: S) -> Self {
        Self::with_settings(store, ShortenerSettings::default())
    }

    pub fn with_settings(store: S, settings: ShortenerSettings) -> Self {
        Self {
            store: Arc::new(store),
            settings,
        }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    fn validate_url(url: &str) -> Result<(), ShortenerError> {
        if url.is_empty() {
            return Err(ShortenerError::InvalidUrl(
                "URL cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Runs one store call under the configured deadline.
    ///
    /// On expiry the call's future is dropped, which releases whatever lock or
    /// connection it was holding.
    async fn bounded<T, F>(&self, operation: &'static str, call: F) -> Result<T, ShortenerError>
    where
        F: Future<Output = Result<T, StorageError>>,
    {
        match tokio::time::timeout(self.settings.operation_timeout, call).await {
            Ok(result) => result.map_err(ShortenerError::from),
            Err(_) => Err(ShortenerError::Timeout {
                operation,
                timeout_ms: self.settings.operation_timeout.as_millis(),
            }),
        }
    }
}

#[async_trait]
impl<S: LinkStore> Shortener for ShortenerService<S> {
    async fn shorten(&self, original_url: &str) -> Result<Shortened, ShortenerError> {
        Self::validate_url(original_url)?;

        let max_stalled = self.settings.max_attempts.max(1);
        let max_rounds = self.settings.max_rounds.max(max_stalled);
        let mut stalled = 0;
        let mut last_taken: Option<LinkId> = None;

        for round in 1..=max_rounds {
            if let Some(existing) = self
                .bounded("check_duplicate", self.store.check_duplicate(original_url))
                .await?
            {
                debug!(code = %existing.code, url = %original_url, "reusing existing short code");
                return Ok(Shortened {
                    id: existing.id,
                    code: existing.code,
                    created: false,
                });
            }

            let id = self.bounded("next_id", self.store.next_id()).await?;
            let record = LinkRecord::allocate(id, original_url);

            match self.bounded("insert", self.store.insert(&record)).await {
                Ok(()) => {
                    info!(id = %id, code = %record.code, url = %original_url, "short code created");
                    return Ok(Shortened {
                        id,
                        code: record.code,
                        created: true,
                    });
                }
                Err(ShortenerError::Storage(StorageError::Conflict(taken))) => {
                    stalled = match last_taken {
                        Some(previous) if id > previous => 1,
                        _ => stalled + 1,
                    };
                    last_taken = Some(id);

                    if stalled >= max_stalled {
                        error!(
                            round,
                            stalled,
                            url = %original_url,
                            "short code allocation is not making progress"
                        );
                        return Err(ShortenerError::AllocationExhausted { attempts: round });
                    }
                    warn!(round, stalled, taken = %taken, "short code already taken, retrying");
                }
                Err(err) => {
                    error!(id = %id, error = %err, "failed to store short code");
                    return Err(err);
                }
            }
        }

        error!(rounds = max_rounds, url = %original_url, "giving up on short code allocation");
        Err(ShortenerError::AllocationExhausted {
            attempts: max_rounds,
        })
    }

    async fn resolve(&self, code: &ShortCode) -> Result<Option<String>, ShortenerError> {
        trace!(code = %code, "resolving short code");
        self.bounded("lookup", self.store.lookup(code)).await
    }
}
