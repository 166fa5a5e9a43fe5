// The persistence gateway - every read and write of the cache goes through here
use std::collections::HashSet;
use std::path::Path;

use async_trait::async_trait;
use eventscout_cache::{EventStore, StoreOptions, UserRow};
use tracing::{debug, error, info, warn};

use crate::{auth, models::Item, search::SearchProvider, Error, Result};

/// What callers get to do with the store
///
/// Every storage call returns a `Result` so "confirmed empty" and "couldn't
/// tell" stay distinguishable. Call sites that just want the empty value on
/// failure use [`OrEmpty::or_empty`].
#[async_trait]
pub trait DbConnection: Send + Sync {
    /// Ask the remote provider, cache everything it returns, hand it back
    /// untouched. Never fails: a dead provider is an empty list.
    async fn search_items(&self, lat: f64, lon: f64, term: &str) -> Vec<Item>;

    /// Insert-or-skip the item row plus its categories, atomically
    fn save_item(&self, item: &Item) -> Result<()>;

    fn favorite_item_ids(&self, user_id: &str) -> Result<HashSet<String>>;

    /// Favorites rebuilt from the cache. Ids we never cached are dropped.
    fn favorite_items(&self, user_id: &str) -> Result<HashSet<Item>>;

    /// Add favorites one by one. Stops at the first failure; whatever was
    /// inserted before it stays.
    fn set_favorite_items(&self, user_id: &str, item_ids: &[String]) -> Result<()>;

    /// Remove favorites one by one. Missing pairs are fine.
    fn unset_favorite_items(&self, user_id: &str, item_ids: &[String]) -> Result<()>;

    fn categories(&self, item_id: &str) -> Result<HashSet<String>>;

    /// "first last", or an empty string for an unknown user
    fn full_name(&self, user_id: &str) -> Result<String>;

    fn verify_login(&self, user_id: &str, password: &str) -> Result<bool>;
}

/// Collapse a failed call into its empty value, logging why
pub trait OrEmpty<T> {
    fn or_empty(self, op: &str) -> T;
}

impl<T: Default> OrEmpty<T> for Result<T> {
    fn or_empty(self, op: &str) -> T {
        self.unwrap_or_else(|e| {
            error!("{} failed: {}", op, e);
            T::default()
        })
    }
}

/// Result of resolving a user's favorites against the item cache
#[derive(Debug, Clone, Default)]
pub struct Favorites {
    pub items: HashSet<Item>,
    /// Favorited ids with no cached item row
    pub orphaned: Vec<String>,
}

/// SQLite-backed [`DbConnection`]
///
/// Owns exactly one store handle. If the store couldn't be opened the
/// gateway still exists, it just answers `StoreUnavailable` to everything.
pub struct Gateway {
    store: Option<EventStore>,
    provider: Option<Box<dyn SearchProvider>>,
}

impl Gateway {
    /// Open the store at `db_path`. Failure is logged, not returned.
    pub fn open(db_path: impl AsRef<Path>, options: StoreOptions) -> Self {
        let path = db_path.as_ref();
        match EventStore::open(path, options) {
            Ok(store) => {
                debug!("Opened store at {}", path.display());
                Self::from_store(store)
            }
            Err(e) => {
                error!("Store unavailable: {}", e);
                Self::unavailable()
            }
        }
    }

    /// Like `open`, but hands the error back
    pub fn try_open(db_path: impl AsRef<Path>, options: StoreOptions) -> Result<Self> {
        let store = EventStore::open(db_path, options)?;
        Ok(Self::from_store(store))
    }

    pub fn in_memory(options: StoreOptions) -> Result<Self> {
        Ok(Self::from_store(EventStore::open_in_memory(options)?))
    }

    pub fn from_store(store: EventStore) -> Self {
        Self {
            store: Some(store),
            provider: None,
        }
    }

    /// A gateway with no store behind it
    pub fn unavailable() -> Self {
        Self {
            store: None,
            provider: None,
        }
    }

    pub fn with_provider(mut self, provider: Box<dyn SearchProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn is_available(&self) -> bool {
        self.store.is_some()
    }

    fn store(&self) -> Result<&EventStore> {
        self.store.as_ref().ok_or(Error::StoreUnavailable)
    }

    /// Favorites plus the ids that couldn't be resolved
    pub fn resolve_favorites(&self, user_id: &str) -> Result<Favorites> {
        let store = self.store()?;
        let mut favorites = Favorites::default();

        for item_id in self.favorite_item_ids(user_id)? {
            match store.item(&item_id)? {
                Some(row) => {
                    let categories = store.categories(&item_id)?;
                    favorites.items.insert(Item::from_row(row, categories));
                }
                None => favorites.orphaned.push(item_id),
            }
        }

        Ok(favorites)
    }

    /// Create a user with a hashed password. False if the id is taken.
    pub fn register_user(
        &self,
        user_id: &str,
        password: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<bool> {
        let store = self.store()?;
        let user = UserRow {
            user_id: user_id.to_string(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            password: auth::hash_password(password)?,
        };

        let created = store.insert_user(&user)?;
        if created {
            info!("Registered user {}", user_id);
        } else {
            debug!("User {} already exists", user_id);
        }
        Ok(created)
    }

    /// Release the store handle now. Dropping the gateway does the same.
    pub fn close(self) {
        if let Some(store) = self.store {
            if let Err(e) = store.close() {
                error!("Failed to close store cleanly: {}", e);
            }
        }
    }
}

#[async_trait]
impl DbConnection for Gateway {
    async fn search_items(&self, lat: f64, lon: f64, term: &str) -> Vec<Item> {
        let Some(provider) = &self.provider else {
            warn!("No search provider configured, returning no results");
            return Vec::new();
        };

        let items = match provider.search(lat, lon, term).await {
            Ok(items) => items,
            Err(e) => {
                error!("Remote search failed: {}", e);
                return Vec::new();
            }
        };

        let mut cached = 0;
        for item in &items {
            match self.save_item(item) {
                Ok(()) => cached += 1,
                Err(e) => warn!("Failed to cache {}: {}", item.item_id, e),
            }
        }
        info!("Search '{}' returned {} items, cached {}", term, items.len(), cached);

        items
    }

    fn save_item(&self, item: &Item) -> Result<()> {
        let store = self.store()?;
        store.insert_item(&item.to_row(), item.categories.iter().map(String::as_str))?;
        debug!(
            "Saved item {} with {} categories",
            item.item_id,
            item.categories.len()
        );
        Ok(())
    }

    fn favorite_item_ids(&self, user_id: &str) -> Result<HashSet<String>> {
        Ok(self.store()?.favorite_item_ids(user_id)?)
    }

    fn favorite_items(&self, user_id: &str) -> Result<HashSet<Item>> {
        let favorites = self.resolve_favorites(user_id)?;
        if !favorites.orphaned.is_empty() {
            warn!(
                "Dropped {} favorites of {} with no cached item: {:?}",
                favorites.orphaned.len(),
                user_id,
                favorites.orphaned
            );
        }
        Ok(favorites.items)
    }

    fn set_favorite_items(&self, user_id: &str, item_ids: &[String]) -> Result<()> {
        let store = self.store()?;
        for item_id in item_ids {
            store.insert_favorite(user_id, item_id)?;
        }
        debug!("{} favorited {} items", user_id, item_ids.len());
        Ok(())
    }

    fn unset_favorite_items(&self, user_id: &str, item_ids: &[String]) -> Result<()> {
        let store = self.store()?;
        for item_id in item_ids {
            store.delete_favorite(user_id, item_id)?;
        }
        debug!("{} unfavorited {} items", user_id, item_ids.len());
        Ok(())
    }

    fn categories(&self, item_id: &str) -> Result<HashSet<String>> {
        Ok(self.store()?.categories(item_id)?)
    }

    fn full_name(&self, user_id: &str) -> Result<String> {
        let name = self
            .store()?
            .user(user_id)?
            .map(|u| format!("{} {}", u.first_name, u.last_name))
            .unwrap_or_default();
        Ok(name)
    }

    fn verify_login(&self, user_id: &str, password: &str) -> Result<bool> {
        let verified = match self.store()?.user(user_id)? {
            Some(user) => auth::verify_password(password, &user.password),
            None => false,
        };
        if !verified {
            debug!("Login rejected for {}", user_id);
        }
        Ok(verified)
    }
}
