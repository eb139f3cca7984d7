//! Core types and traits for the Burrow URL shortener.
//!
//! This crate provides the id and short code types, the link store
//! contract implemented by `burrow-storage`, and the shortener contract
//! implemented by `burrow-shortener`.

pub mod error;
pub mod id;
pub mod shortcode;
pub mod shortener;
pub mod store;

pub use error::{CoreError, ShortenerError, StorageError};
pub use id::LinkId;
pub use shortcode::ShortCode;
pub use shortener::{Shortened, Shortener};
pub use store::{LinkRecord, LinkStore, ReadLinkStore};
