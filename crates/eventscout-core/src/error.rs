use thiserror::Error;

/// All the ways a gateway call can fail
///
/// "Not found" is deliberately missing: an unknown user or item is an empty
/// result, never an error.
#[derive(Error, Debug)]
pub enum Error {
    #[error("API request failed: {0}")]
    ApiError(String),

    #[error("Cache operation failed: {0}")]
    CacheError(#[from] eventscout_cache::CacheError),

    #[error("Backing store is unavailable")]
    StoreUnavailable,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Authentication failed: {0}")]
    AuthError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
