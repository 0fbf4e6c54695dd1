// Error types for the impact simulator core
// Every variant is recoverable: callers report it and keep the session alive

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, ImpactError>;

#[derive(Debug, Error)]
pub enum ImpactError {
    /// Latitude/longitude missing, non-numeric or out of range.
    #[error("invalid location: {0}")]
    InvalidLocation(String),

    /// Mass, velocity, energy or body dimension outside its physical domain.
    #[error("invalid physical input: {0}")]
    InvalidPhysicalInput(String),

    /// Manual entry requested without usable mass and velocity values.
    #[error("no asteroid selected and no manual mass/velocity supplied")]
    MissingSelection,

    #[error("unknown asteroid: {0}")]
    UnknownBody(String),

    #[error("failed to parse asteroid feed: {0}")]
    FeedParse(#[from] serde_json::Error),

    #[error("invalid configuration value for {key}: {value:?}")]
    Config { key: &'static str, value: String },
}
