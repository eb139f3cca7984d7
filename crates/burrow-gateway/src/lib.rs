//! HTTP gateway for the Burrow URL shortener.
//!
//! `POST /` shortens the URL in the JSON body, `GET /{short_code}` resolves a
//! code back to its original URL.

pub mod app;
pub mod error;
pub mod handlers;
pub mod model;
pub mod state;

pub use app::App;
pub use state::AppState;
