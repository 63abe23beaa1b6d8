use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub last_modified: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Item {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub category_id: i64,
    pub last_modified: DateTime<Utc>,
}

/// Public JSON projection of an item: internal fields (category FK,
/// timestamps) do not leak.
#[derive(Debug, Clone, Serialize)]
pub struct ItemJson {
    pub id: i64,
    pub title: String,
    pub description: String,
}

impl From<Item> for ItemJson {
    fn from(item: Item) -> Self {
        Self {
            id: item.id,
            title: item.title,
            description: item.description,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryJson {
    pub id: i64,
    pub name: String,
    pub items: Vec<ItemJson>,
}

/// Top-level shape of `GET /catalog/JSON`.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogJson {
    #[serde(rename = "Categories")]
    pub categories: Vec<CategoryJson>,
}
