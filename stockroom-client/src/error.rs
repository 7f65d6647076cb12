//! Error types for client setup.
//!
//! Operations return [`StockroomResult`](stockroom_core::StockroomResult);
//! `ClientError` only covers building a client from configuration.

use crate::config::ConfigError;
use stockroom_core::StockroomError;
use stockroom_storage::PersistenceError;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Invalid header value: {0}")]
    Header(String),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error(transparent)]
    Stockroom(#[from] StockroomError),
    #[error("Telemetry error: {0}")]
    Telemetry(String),
}
