use std::collections::HashSet;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use crate::error::{CacheError, Result};
use crate::schema;

/// Options applied when the store is opened
#[derive(Debug, Clone, Copy, Default)]
pub struct StoreOptions {
    /// Reject favorites/categories that point at rows we don't have.
    /// Off by default: a user may favorite an item before we ever cached it.
    pub enforce_foreign_keys: bool,
}

/// One row of the `items` table
#[derive(Debug, Clone, PartialEq)]
pub struct ItemRow {
    pub item_id: String,
    pub name: String,
    pub rating: f64,
    pub address: String,
    pub image_url: String,
    pub url: String,
    pub distance: f64,
}

/// One row of the `users` table. `password` is whatever credential string
/// the caller hands us - core stores an Argon2 hash here.
#[derive(Debug, Clone, PartialEq)]
pub struct UserRow {
    pub user_id: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

/// SQLite store holding the item cache, users and favorites
///
/// A single connection lives for as long as the store does. It's dropped
/// (and therefore closed) exactly once, either by `close` or by `Drop`.
pub struct EventStore {
    conn: Mutex<Connection>,
}

impl EventStore {
    pub fn open(db_path: impl AsRef<Path>, options: StoreOptions) -> Result<Self> {
        let path = db_path.as_ref();
        let conn = Connection::open(path).map_err(|source| CacheError::Open {
            path: path.display().to_string(),
            source,
        })?;
        Self::with_connection(conn, options)
    }

    /// In-memory store, mostly for tests
    pub fn open_in_memory(options: StoreOptions) -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| CacheError::Open {
            path: ":memory:".to_string(),
            source,
        })?;
        Self::with_connection(conn, options)
    }

    fn with_connection(conn: Connection, options: StoreOptions) -> Result<Self> {
        // If this fails `conn` is dropped right here, which closes it
        schema::init_schema(&conn, options.enforce_foreign_keys)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| CacheError::Poisoned)
    }

    /// Insert-or-skip an item and its categories in one transaction.
    ///
    /// Only a duplicate `item_id` is skipped; an existing row is left untouched.
    /// Any other failure on the item row or a category write rolls the whole
    /// thing back, so we never keep a category without its item.
    pub fn insert_item<'a, I>(&self, item: &ItemRow, categories: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let inserted = tx.execute(
            "INSERT INTO items (item_id, name, rating, address, image_url, url, distance)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(item_id) DO NOTHING",
            params![
                item.item_id,
                item.name,
                item.rating,
                item.address,
                item.image_url,
                item.url,
                item.distance,
            ],
        )?;
        if inserted == 0 {
            debug!("Item {} already cached, keeping existing row", item.item_id);
        }

        {
            let mut stmt =
                tx.prepare("INSERT OR IGNORE INTO categories (item_id, category) VALUES (?1, ?2)")?;
            for category in categories {
                stmt.execute(params![item.item_id, category])?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    pub fn item(&self, item_id: &str) -> Result<Option<ItemRow>> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                "SELECT item_id, name, rating, address, image_url, url, distance
                 FROM items WHERE item_id = ?1",
                params![item_id],
                |row| {
                    Ok(ItemRow {
                        item_id: row.get(0)?,
                        name: row.get(1)?,
                        rating: row.get(2)?,
                        address: row.get(3)?,
                        image_url: row.get(4)?,
                        url: row.get(5)?,
                        distance: row.get(6)?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    pub fn categories(&self, item_id: &str) -> Result<HashSet<String>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT category FROM categories WHERE item_id = ?1")?;
        let rows = stmt.query_map(params![item_id], |row| row.get::<_, String>(0))?;
        let categories = rows.collect::<rusqlite::Result<HashSet<_>>>()?;
        Ok(categories)
    }

    /// Add a (user, item) favorite. Already present is fine.
    pub fn insert_favorite(&self, user_id: &str, item_id: &str) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR IGNORE INTO history (user_id, item_id) VALUES (?1, ?2)",
            params![user_id, item_id],
        )?;
        Ok(())
    }

    /// Remove a (user, item) favorite. Not present is fine too.
    pub fn delete_favorite(&self, user_id: &str, item_id: &str) -> Result<()> {
        let conn = self.lock()?;
        let removed = conn.execute(
            "DELETE FROM history WHERE user_id = ?1 AND item_id = ?2",
            params![user_id, item_id],
        )?;
        if removed == 0 {
            debug!("{} had no favorite {} to remove", user_id, item_id);
        }
        Ok(())
    }

    pub fn favorite_item_ids(&self, user_id: &str) -> Result<HashSet<String>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT item_id FROM history WHERE user_id = ?1")?;
        let rows = stmt.query_map(params![user_id], |row| row.get::<_, String>(0))?;
        let ids = rows.collect::<rusqlite::Result<HashSet<_>>>()?;
        Ok(ids)
    }

    /// Insert a user. Returns false if the id is already taken.
    pub fn insert_user(&self, user: &UserRow) -> Result<bool> {
        let conn = self.lock()?;
        let inserted = conn.execute(
            "INSERT INTO users (user_id, first_name, last_name, password)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(user_id) DO NOTHING",
            params![user.user_id, user.first_name, user.last_name, user.password],
        )?;
        Ok(inserted == 1)
    }

    pub fn user(&self, user_id: &str) -> Result<Option<UserRow>> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                "SELECT user_id, first_name, last_name, password FROM users WHERE user_id = ?1",
                params![user_id],
                |row| {
                    Ok(UserRow {
                        user_id: row.get(0)?,
                        first_name: row.get(1)?,
                        last_name: row.get(2)?,
                        password: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    /// Close the connection now instead of waiting for drop
    pub fn close(self) -> Result<()> {
        let conn = self
            .conn
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        conn.close().map_err(|(_, e)| CacheError::Query(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: &str) -> ItemRow {
        ItemRow {
            item_id: id.to_string(),
            name: format!("Event {}", id),
            rating: 4.5,
            address: "1 Main St, New York".to_string(),
            image_url: "https://img.example.com/a.jpg".to_string(),
            url: "https://tickets.example.com/a".to_string(),
            distance: 1.2,
        }
    }

    fn store() -> EventStore {
        EventStore::open_in_memory(StoreOptions::default()).unwrap()
    }

    #[test]
    fn test_insert_item_is_idempotent() {
        let store = store();
        store.insert_item(&row("a"), ["music", "outdoor"]).unwrap();
        store.insert_item(&row("a"), ["music", "outdoor"]).unwrap();

        assert_eq!(store.item("a").unwrap(), Some(row("a")));
        let categories = store.categories("a").unwrap();
        assert_eq!(categories.len(), 2);
        assert!(categories.contains("music"));
        assert!(categories.contains("outdoor"));
    }

    #[test]
    fn test_insert_item_keeps_first_descriptive_fields() {
        let store = store();
        store.insert_item(&row("a"), ["music"]).unwrap();

        let mut moved = row("a");
        moved.distance = 42.0;
        moved.name = "Renamed".to_string();
        store.insert_item(&moved, ["sports"]).unwrap();

        let cached = store.item("a").unwrap().unwrap();
        assert_eq!(cached.distance, 1.2);
        assert_eq!(cached.name, "Event a");
        // New categories still get added
        assert_eq!(store.categories("a").unwrap().len(), 2);
    }

    #[test]
    fn test_failed_category_rolls_back_item() {
        let store = store();
        store
            .lock()
            .unwrap()
            .execute_batch(
                "CREATE TRIGGER reject_boom BEFORE INSERT ON categories
                 WHEN NEW.category = 'boom'
                 BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
            )
            .unwrap();

        let result = store.insert_item(&row("a"), ["music", "boom"]);
        assert!(result.is_err());
        assert_eq!(store.item("a").unwrap(), None);
        assert!(store.categories("a").unwrap().is_empty());
    }

    #[test]
    fn test_non_finite_distance_rejects_whole_item() {
        let store = store();
        let mut bad = row("x");
        bad.distance = f64::NAN;

        let result = store.insert_item(&bad, ["music"]);
        assert!(matches!(result, Err(CacheError::Query(_))));
        assert_eq!(store.item("x").unwrap(), None);
        assert!(store.categories("x").unwrap().is_empty());
    }

    #[test]
    fn test_favorites_have_set_semantics() {
        let store = store();
        store.insert_favorite("bob", "a").unwrap();
        store.insert_favorite("bob", "a").unwrap();
        store.insert_favorite("bob", "b").unwrap();

        let ids = store.favorite_item_ids("bob").unwrap();
        assert_eq!(ids, HashSet::from(["a".to_string(), "b".to_string()]));
    }

    #[test]
    fn test_delete_missing_favorite_is_noop() {
        let store = store();
        store.insert_favorite("bob", "a").unwrap();
        store.delete_favorite("bob", "zzz").unwrap();
        store.delete_favorite("alice", "a").unwrap();

        assert_eq!(store.favorite_item_ids("bob").unwrap().len(), 1);
    }

    #[test]
    fn test_foreign_keys_reject_unknown_item() {
        let store = EventStore::open_in_memory(StoreOptions {
            enforce_foreign_keys: true,
        })
        .unwrap();
        store
            .insert_user(&UserRow {
                user_id: "bob".into(),
                first_name: "Bob".into(),
                last_name: "Smith".into(),
                password: "hash".into(),
            })
            .unwrap();

        assert!(store.insert_favorite("bob", "missing").is_err());
        store.insert_item(&row("a"), ["music"]).unwrap();
        assert!(store.insert_favorite("bob", "a").is_ok());
    }

    #[test]
    fn test_insert_user_rejects_duplicates() {
        let store = store();
        let user = UserRow {
            user_id: "bob".into(),
            first_name: "Bob".into(),
            last_name: "Smith".into(),
            password: "hash".into(),
        };
        assert!(store.insert_user(&user).unwrap());
        assert!(!store.insert_user(&user).unwrap());
        assert_eq!(store.user("bob").unwrap(), Some(user));
        assert_eq!(store.user("nobody").unwrap(), None);
    }

    #[test]
    fn test_reopen_on_disk_keeps_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.db");

        let store = EventStore::open(&path, StoreOptions::default()).unwrap();
        store.insert_item(&row("a"), ["music"]).unwrap();
        store.close().unwrap();

        let store = EventStore::open(&path, StoreOptions::default()).unwrap();
        assert!(store.item("a").unwrap().is_some());
    }

    #[test]
    fn test_open_bad_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no/such/dir/cache.db");
        let err = EventStore::open(&path, StoreOptions::default())
            .err()
            .unwrap();
        assert!(matches!(err, CacheError::Open { .. }));
    }
}
