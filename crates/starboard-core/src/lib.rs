// Core business logic lives here - the brain of the operation
pub mod config;
pub mod degradation;
pub mod error;
pub mod models;
pub mod pin;
pub mod popularity;
pub mod provider;
pub mod snapshot;
pub mod table;
pub mod token_region;

pub use config::Config;
pub use error::Error;
pub use models::Repository;
pub use provider::self_starred_repos_of_user;
pub use token_region::{DocumentParts, RegionError, TokenRegion};

/// Result type alias because typing Result<T, Error> everywhere is tedious
pub type Result<T> = std::result::Result<T, Error>;
