use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::num::NonZeroU64;

/// Numeric identifier of a stored link.
///
/// Identifiers are dense positive integers allocated from 1 upwards. A zero id
/// cannot be constructed, so every `LinkId` is a valid input for
/// [`ShortCode::encode`](crate::shortcode::ShortCode::encode).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinkId(NonZeroU64);

impl LinkId {
    /// The first identifier handed out by an empty store.
    pub const FIRST: LinkId = LinkId(NonZeroU64::MIN);

    /// Returns `None` for zero.
    pub fn new(value: u64) -> Option<Self> {
        NonZeroU64::new(value).map(Self)
    }

    /// Converts a signed database value, rejecting zero and negatives.
    pub fn from_i64(value: i64) -> Option<Self> {
        u64::try_from(value).ok().and_then(Self::new)
    }

    pub fn get(self) -> u64 {
        self.0.get()
    }

    /// Returns the value as `i64` for SQL binding, or `None` if it does not fit.
    pub fn to_i64(self) -> Option<i64> {
        i64::try_from(self.0.get()).ok()
    }

    /// The identifier directly after this one.
    pub fn next(self) -> Option<Self> {
        self.0.checked_add(1).map(Self)
    }
}

impl Display for LinkId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
