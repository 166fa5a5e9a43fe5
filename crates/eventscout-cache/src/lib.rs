// SQLite-backed store for cached items, their categories, users and favorites
// Nothing in here knows about the remote API - core converts to and from these rows

pub mod cache;
pub mod error;
pub mod schema;

pub use cache::{EventStore, ItemRow, StoreOptions, UserRow};
pub use error::{CacheError, Result};
