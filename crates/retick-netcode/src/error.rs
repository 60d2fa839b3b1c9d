//! Error types for retick-netcode

use thiserror::Error;

/// Netcode error type
#[derive(Debug, Error)]
pub enum Error {
    /// Input pack could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Ticker settings could not be parsed
    #[error("Settings parse error: {0}")]
    Config(#[from] ron::error::SpannedError),

    /// Invalid value passed to the engine
    #[error("Core error: {0}")]
    Core(#[from] retick_core::Error),
}

/// Result type for netcode operations
pub type Result<T> = std::result::Result<T, Error>;
