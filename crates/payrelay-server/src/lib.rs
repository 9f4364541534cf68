//! HTTP surface for the [`payrelay`] tokenization relay.

pub mod app;
pub mod config;
pub mod cors;
pub mod error;
pub mod metrics;
pub mod routes;
pub mod state;

pub use config::RelayConfig;
pub use error::ApiError;
pub use state::AppState;
