use rusqlite::Connection;

/// Tables backing the cache. Safe to run on every open.
///
/// `categories` and `history` use composite primary keys so that
/// `INSERT OR IGNORE` gives us set semantics for free.
pub const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS users (
        user_id TEXT PRIMARY KEY,
        first_name TEXT NOT NULL DEFAULT '',
        last_name TEXT NOT NULL DEFAULT '',
        password TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS items (
        item_id TEXT PRIMARY KEY,
        name TEXT NOT NULL DEFAULT '',
        rating REAL NOT NULL DEFAULT 0,
        address TEXT NOT NULL DEFAULT '',
        image_url TEXT NOT NULL DEFAULT '',
        url TEXT NOT NULL DEFAULT '',
        distance REAL NOT NULL DEFAULT 0
    );

    CREATE TABLE IF NOT EXISTS categories (
        item_id TEXT NOT NULL REFERENCES items(item_id),
        category TEXT NOT NULL,
        PRIMARY KEY (item_id, category)
    );

    CREATE TABLE IF NOT EXISTS history (
        user_id TEXT NOT NULL REFERENCES users(user_id),
        item_id TEXT NOT NULL REFERENCES items(item_id),
        PRIMARY KEY (user_id, item_id)
    );
";

pub fn init_schema(conn: &Connection, enforce_foreign_keys: bool) -> rusqlite::Result<()> {
    let pragma = if enforce_foreign_keys {
        "PRAGMA foreign_keys = ON;"
    } else {
        "PRAGMA foreign_keys = OFF;"
    };
    conn.execute_batch(pragma)?;
    conn.execute_batch(SCHEMA)
}
