// Core of EventScout: the item model, the remote search seam and the
// gateway that keeps the local cache and favorites in step
pub mod auth;
pub mod config;
pub mod error;
pub mod gateway;
pub mod models;
pub mod providers;
pub mod search;

pub use config::Config;
pub use error::Error;
pub use gateway::{DbConnection, Favorites, Gateway, OrEmpty};
pub use models::{Item, ItemBuilder};
pub use search::SearchProvider;
pub use eventscout_cache::StoreOptions;

/// Result type alias because typing Result<T, Error> everywhere is tedious
pub type Result<T> = std::result::Result<T, Error>;
