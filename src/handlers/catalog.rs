use std::collections::HashMap;

use axum::{
    Json,
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use minijinja::context;
use serde::Serialize;

use crate::db::models::{CatalogJson, CategoryJson, Item};
use crate::error::CatalogError;
use crate::oauth::handshake::new_state_nonce;
use crate::router::CatalogState;
use crate::session::SessionCtx;

/// Row shape handed to the listing templates: the item plus its resolved
/// category name.
#[derive(Debug, Serialize)]
struct ItemRow {
    id: i64,
    title: String,
    description: String,
    category_id: i64,
    category_name: String,
}

impl ItemRow {
    fn new(item: Item, category_names: &HashMap<i64, String>) -> Self {
        let category_name = category_names
            .get(&item.category_id)
            .cloned()
            .unwrap_or_default();
        Self {
            id: item.id,
            title: item.title,
            description: item.description,
            category_id: item.category_id,
            category_name,
        }
    }
}

/// GET / -> the main page.
pub async fn root_redirect() -> Redirect {
    Redirect::to("/catalog")
}

/// GET /catalog -> listing plus a fresh anti-forgery nonce for the login
/// widget. Issuing the nonce overwrites any prior unconsumed one.
pub async fn main_page(
    State(state): State<CatalogState>,
    ctx: SessionCtx,
    jar: CookieJar,
) -> Result<Response, CatalogError> {
    let mut sess = ctx.data.clone();
    let nonce = new_state_nonce();
    sess.state = Some(nonce.clone());

    let categories = state.storage.list_categories().await?;
    let items = state.storage.list_items_latest().await?;
    let category_names: HashMap<i64, String> = categories
        .iter()
        .map(|c| (c.id, c.name.clone()))
        .collect();

    let mut flash = sess.take_flash();
    if items.is_empty() {
        flash.push("No items found".to_string());
    }
    let rows: Vec<ItemRow> = items
        .into_iter()
        .map(|item| ItemRow::new(item, &category_names))
        .collect();

    ctx.save(&sess);
    let html = state.render(
        "main.html",
        context! {
            user => sess.username,
            flash => flash,
            categories => categories,
            items => rows,
            state_nonce => nonce,
        },
    )?;
    Ok((ctx.apply(jar), Html(html)).into_response())
}

/// GET /catalog/JSON -> the public catalog projection.
pub async fn catalog_json(
    State(state): State<CatalogState>,
) -> Result<Json<CatalogJson>, CatalogError> {
    let categories = state.storage.list_categories().await?;
    let mut out = Vec::with_capacity(categories.len());
    for category in categories {
        let items = state.storage.items_in_category(category.id).await?;
        out.push(CategoryJson {
            id: category.id,
            name: category.name,
            items: items.into_iter().map(Into::into).collect(),
        });
    }
    Ok(Json(CatalogJson { categories: out }))
}

/// GET /catalog/categories/{name}/ -> items of exactly one category.
pub async fn category_items(
    State(state): State<CatalogState>,
    Path(name): Path<String>,
    ctx: SessionCtx,
    jar: CookieJar,
) -> Result<Response, CatalogError> {
    let mut sess = ctx.data.clone();
    let selected = state.storage.category_by_name(&name).await?;
    let categories = state.storage.list_categories().await?;
    let items = state.storage.items_in_category(selected.id).await?;

    let mut flash = sess.take_flash();
    if items.is_empty() {
        flash.push("No items found in this category".to_string());
    }

    ctx.save(&sess);
    let html = state.render(
        "category_detail.html",
        context! {
            user => sess.username,
            flash => flash,
            selected_category => selected,
            categories => categories,
            items => items,
        },
    )?;
    Ok((ctx.apply(jar), Html(html)).into_response())
}

/// GET /catalog/items/{title}/ -> item detail.
pub async fn item_detail(
    State(state): State<CatalogState>,
    Path(title): Path<String>,
    ctx: SessionCtx,
    jar: CookieJar,
) -> Result<Response, CatalogError> {
    let mut sess = ctx.data.clone();
    let item = state.storage.item_by_title(&title).await?;
    let category = state.storage.category_by_id(item.category_id).await?;

    let flash = sess.take_flash();
    ctx.save(&sess);
    let html = state.render(
        "item_detail.html",
        context! {
            user => sess.username,
            flash => flash,
            item => item,
            category => category,
        },
    )?;
    Ok((ctx.apply(jar), Html(html)).into_response())
}
