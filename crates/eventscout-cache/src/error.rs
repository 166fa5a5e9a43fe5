use thiserror::Error;

pub type Result<T> = std::result::Result<T, CacheError>;

/// Everything that can go wrong between us and the SQLite file
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Failed to open store at {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Query failed: {0}")]
    Query(#[from] rusqlite::Error),

    #[error("Store connection lock poisoned")]
    Poisoned,
}
