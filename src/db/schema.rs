//! SQL DDL for initializing the catalog storage.
//! SQLite-first design; can be adapted for other RDBMS.

/// SQLite schema with:
/// - `id` INTEGER PRIMARY KEY AUTOINCREMENT on both tables
/// - `items.title` UNIQUE: backstop for the explicit pre-insert check,
///   which remains the path that produces the user-facing rejection
/// - `last_modified` stored as RFC3339 text, set on create and update
pub const SQLITE_INIT: &str = r#"
CREATE TABLE IF NOT EXISTS categories (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    last_modified TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS items (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL UNIQUE,
    description TEXT NOT NULL,
    category_id INTEGER NOT NULL REFERENCES categories(id),
    last_modified TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_items_category_id ON items(category_id);
"#;
