use std::str::FromStr;

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Pool, Row, Sqlite};
use tracing::info;

use crate::db::models::{Category, Item};
use crate::db::schema::SQLITE_INIT;
use crate::error::CatalogError;

pub type SqlitePool = Pool<Sqlite>;

#[derive(Clone)]
pub struct CatalogStorage {
    pool: SqlitePool,
}

impl CatalogStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if missing) the SQLite database behind `database_url`.
    pub async fn connect(database_url: &str) -> Result<Self, CatalogError> {
        let connect_opts = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new().connect_with(connect_opts).await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Initialize the schema by executing the bundled DDL.
    pub async fn init_schema(&self) -> Result<(), CatalogError> {
        // execute multiple statements safely (SQLite supports multi-commands but sqlx::query doesn't)
        for stmt in SQLITE_INIT.split(';') {
            let s = stmt.trim();
            if s.is_empty() {
                continue;
            }
            sqlx::query(s).execute(&self.pool).await?;
        }
        Ok(())
    }

    pub async fn list_categories(&self) -> Result<Vec<Category>, CatalogError> {
        let rows = sqlx::query("SELECT id, name, last_modified FROM categories ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(Self::row_to_category).collect()
    }

    /// Lookup by name must resolve to exactly one category; zero or several
    /// matches surface as a not-found.
    pub async fn category_by_name(&self, name: &str) -> Result<Category, CatalogError> {
        let rows = sqlx::query("SELECT id, name, last_modified FROM categories WHERE name = ?")
            .bind(name)
            .fetch_all(&self.pool)
            .await?;
        if rows.len() != 1 {
            return Err(CatalogError::RecordNotFound(format!("category {}", name)));
        }
        Self::row_to_category(rows.into_iter().next().expect("len checked above"))
    }

    pub async fn category_by_id(&self, id: i64) -> Result<Category, CatalogError> {
        let row = sqlx::query("SELECT id, name, last_modified FROM categories WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| CatalogError::RecordNotFound(format!("category id {}", id)))?;
        Self::row_to_category(row)
    }

    pub async fn create_category(&self, name: &str) -> Result<i64, CatalogError> {
        let res = sqlx::query("INSERT INTO categories (name, last_modified) VALUES (?, ?)")
            .bind(name)
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await?;
        Ok(res.last_insert_rowid())
    }

    /// Items across all categories, most recently touched first.
    pub async fn list_items_latest(&self) -> Result<Vec<Item>, CatalogError> {
        let rows = sqlx::query(
            r#"SELECT id, title, description, category_id, last_modified
               FROM items ORDER BY last_modified DESC, id DESC"#,
        )
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Self::row_to_item).collect()
    }

    pub async fn items_in_category(&self, category_id: i64) -> Result<Vec<Item>, CatalogError> {
        let rows = sqlx::query(
            r#"SELECT id, title, description, category_id, last_modified
               FROM items WHERE category_id = ? ORDER BY id"#,
        )
        .bind(category_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Self::row_to_item).collect()
    }

    pub async fn item_by_title(&self, title: &str) -> Result<Item, CatalogError> {
        let row = sqlx::query(
            r#"SELECT id, title, description, category_id, last_modified
               FROM items WHERE title = ?"#,
        )
        .bind(title)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| CatalogError::RecordNotFound(format!("item {}", title)))?;
        Self::row_to_item(row)
    }

    /// The explicit pre-insert existence check callers run on every
    /// create/rename before committing.
    pub async fn title_exists(&self, title: &str) -> Result<bool, CatalogError> {
        let exists: i64 = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM items WHERE title = ?)")
            .bind(title)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists != 0)
    }

    pub async fn create_item(
        &self,
        title: &str,
        description: &str,
        category_id: i64,
    ) -> Result<i64, CatalogError> {
        let res = sqlx::query(
            r#"INSERT INTO items (title, description, category_id, last_modified)
               VALUES (?, ?, ?, ?)"#,
        )
        .bind(title)
        .bind(description)
        .bind(category_id)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(res.last_insert_rowid())
    }

    pub async fn update_item(
        &self,
        id: i64,
        title: &str,
        description: &str,
        category_id: i64,
    ) -> Result<(), CatalogError> {
        sqlx::query(
            r#"UPDATE items SET
                title = ?,
                description = ?,
                category_id = ?,
                last_modified = ?
              WHERE id = ?"#,
        )
        .bind(title)
        .bind(description)
        .bind(category_id)
        .bind(Utc::now().to_rfc3339())
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn delete_item_by_title(&self, title: &str) -> Result<(), CatalogError> {
        let res = sqlx::query("DELETE FROM items WHERE title = ?")
            .bind(title)
            .execute(&self.pool)
            .await?;
        if res.rows_affected() == 0 {
            return Err(CatalogError::RecordNotFound(format!("item {}", title)));
        }
        Ok(())
    }

    /// Reset both tables and install the sample catalog used for dev and
    /// testing: one item per sample category.
    pub async fn seed(&self) -> Result<(), CatalogError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM items").execute(&mut *tx).await?;
        sqlx::query("DELETE FROM categories").execute(&mut *tx).await?;

        let sample_categories = ["sports", "entertainment", "tech"];
        let mut category_ids = Vec::with_capacity(sample_categories.len());
        for name in sample_categories {
            let res = sqlx::query("INSERT INTO categories (name, last_modified) VALUES (?, ?)")
                .bind(name)
                .bind(Utc::now().to_rfc3339())
                .execute(&mut *tx)
                .await?;
            category_ids.push(res.last_insert_rowid());
        }

        let sample_items = [("bat", 0usize), ("TV", 1), ("computer", 2)];
        for (title, idx) in sample_items {
            sqlx::query(
                r#"INSERT INTO items (title, description, category_id, last_modified)
                   VALUES (?, ?, ?, ?)"#,
            )
            .bind(title)
            .bind("Sample description")
            .bind(category_ids[idx])
            .bind(Utc::now().to_rfc3339())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        info!("seeded sample catalog");
        Ok(())
    }

    fn row_to_category(row: SqliteRow) -> Result<Category, CatalogError> {
        let id: i64 = row.try_get("id")?;
        let name: String = row.try_get("name")?;
        let last_modified = Self::parse_timestamp(row.try_get("last_modified")?)?;
        Ok(Category {
            id,
            name,
            last_modified,
        })
    }

    fn row_to_item(row: SqliteRow) -> Result<Item, CatalogError> {
        let id: i64 = row.try_get("id")?;
        let title: String = row.try_get("title")?;
        let description: String = row.try_get("description")?;
        let category_id: i64 = row.try_get("category_id")?;
        let last_modified = Self::parse_timestamp(row.try_get("last_modified")?)?;
        Ok(Item {
            id,
            title,
            description,
            category_id,
            last_modified,
        })
    }

    fn parse_timestamp(raw: String) -> Result<DateTime<Utc>, CatalogError> {
        Ok(DateTime::parse_from_rfc3339(&raw)
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?
            .with_timezone(&Utc))
    }
}
