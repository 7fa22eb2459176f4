use thiserror::Error;

use crate::token_region::RegionError;

/// All the ways regenerating the document can go wrong on our side of the
/// network. Fetch failures have their own type in starboard-api.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Region(#[from] RegionError),

    #[error("table rendering failed: {0}")]
    Render(String),

    #[error("failed to recover pins from the published table: {0}")]
    Extract(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
