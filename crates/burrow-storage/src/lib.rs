//! Link store backends for the Burrow URL shortener.
//!
//! - [`InMemoryLinkStore`] keeps everything in process behind one lock.
//! - [`PostgresLinkStore`] persists links in a PostgreSQL `links` table.

pub mod memory;
pub mod postgres;

pub use burrow_core::{LinkStore, ReadLinkStore, StorageError};
pub use memory::InMemoryLinkStore;
pub use postgres::PostgresLinkStore;
