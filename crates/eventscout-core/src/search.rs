use crate::{models::Item, Result};

/// The remote side of the cache - anything that can find events near a point
///
/// The gateway never ranks or filters what comes back; order and contents are
/// entirely up to the provider. Swapping Ticketmaster for something else (or a
/// mock in tests) only means implementing this.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, lat: f64, lon: f64, term: &str) -> Result<Vec<Item>>;
}
