//! Database module: models and schema for the catalog store.
//!
//! Layout:
//! - `models.rs`: Rust structs mirroring DB rows plus the JSON projections
//! - `schema.rs`: SQL DDL for initializing the database (SQLite-first)
//! - `sqlite.rs`: the `CatalogStorage` persistence handle

pub mod models;
pub mod schema;
pub mod sqlite;

pub use models::{CatalogJson, Category, CategoryJson, Item, ItemJson};
pub use schema::SQLITE_INIT;
pub use sqlite::{CatalogStorage, SqlitePool};
