//! URL shortener service implementation.
//!
//! This crate provides [`ShortenerService`], the engine that turns URLs into
//! short codes on top of any [`LinkStore`](burrow_core::LinkStore). Core types
//! are re-exported from `burrow_core`.

pub mod service;

pub use burrow_core::{Shortened, Shortener, ShortenerError};
pub use service::{ShortenerService, ShortenerSettings};
