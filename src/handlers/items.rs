use axum::{
    Form,
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use minijinja::context;
use serde::Deserialize;
use tracing::info;

use crate::error::CatalogError;
use crate::middleware::auth::ensure_logged_in;
use crate::router::CatalogState;
use crate::session::SessionCtx;

/// Shared form shape for create and edit. On edit, empty fields leave the
/// stored value unchanged.
#[derive(Debug, Deserialize)]
pub struct ItemForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category_id: Option<String>,
}

impl ItemForm {
    fn category_id(&self) -> Option<i64> {
        self.category_id
            .as_deref()
            .filter(|s| !s.is_empty())
            .and_then(|s| s.parse().ok())
    }
}

/// GET /catalog/items/new -> login-gated create form.
pub async fn new_item_form(
    State(state): State<CatalogState>,
    ctx: SessionCtx,
    jar: CookieJar,
) -> Result<Response, CatalogError> {
    let mut sess = ctx.data.clone();
    if let Err(redirect) = ensure_logged_in(&mut sess) {
        ctx.save(&sess);
        return Ok((ctx.apply(jar), redirect).into_response());
    }

    let categories = state.storage.list_categories().await?;
    let flash = sess.take_flash();
    ctx.save(&sess);
    let html = state.render(
        "create_item.html",
        context! {
            user => sess.username,
            flash => flash,
            categories => categories,
        },
    )?;
    Ok((ctx.apply(jar), Html(html)).into_response())
}

/// POST /catalog/items/new -> create after the title-uniqueness check.
pub async fn create_item(
    State(state): State<CatalogState>,
    ctx: SessionCtx,
    jar: CookieJar,
    Form(form): Form<ItemForm>,
) -> Result<Response, CatalogError> {
    let mut sess = ctx.data.clone();
    if let Err(redirect) = ensure_logged_in(&mut sess) {
        ctx.save(&sess);
        return Ok((ctx.apply(jar), redirect).into_response());
    }

    let Some(category_id) = form.category_id() else {
        sess.push_flash("Please pick a category for the new item.");
        ctx.save(&sess);
        return Ok((ctx.apply(jar), Redirect::to("/catalog/items/new")).into_response());
    };
    if form.title.is_empty() || form.description.is_empty() {
        sess.push_flash("Both a title and a description are required.");
        ctx.save(&sess);
        return Ok((ctx.apply(jar), Redirect::to("/catalog/items/new")).into_response());
    }
    if state.storage.title_exists(&form.title).await? {
        sess.push_flash(format!(
            "Please enter a different title. Item {} already exists.",
            form.title
        ));
        ctx.save(&sess);
        return Ok((ctx.apply(jar), Redirect::to("/catalog/items/new")).into_response());
    }

    state
        .storage
        .create_item(&form.title, &form.description, category_id)
        .await?;
    info!(title = %form.title, "item created");
    ctx.save(&sess);
    Ok((ctx.apply(jar), Redirect::to("/catalog")).into_response())
}

/// GET /catalog/items/{title}/edit -> login-gated edit form.
pub async fn edit_item_form(
    State(state): State<CatalogState>,
    Path(title): Path<String>,
    ctx: SessionCtx,
    jar: CookieJar,
) -> Result<Response, CatalogError> {
    let mut sess = ctx.data.clone();
    if let Err(redirect) = ensure_logged_in(&mut sess) {
        ctx.save(&sess);
        return Ok((ctx.apply(jar), redirect).into_response());
    }

    let item = state.storage.item_by_title(&title).await?;
    let categories = state.storage.list_categories().await?;
    let flash = sess.take_flash();
    ctx.save(&sess);
    let html = state.render(
        "edit_item.html",
        context! {
            user => sess.username,
            flash => flash,
            item => item,
            categories => categories,
        },
    )?;
    Ok((ctx.apply(jar), Html(html)).into_response())
}

/// POST /catalog/items/{title}/edit -> apply changes; renaming re-runs the
/// uniqueness check, but keeping the item's own title never does.
pub async fn update_item(
    State(state): State<CatalogState>,
    Path(title): Path<String>,
    ctx: SessionCtx,
    jar: CookieJar,
    Form(form): Form<ItemForm>,
) -> Result<Response, CatalogError> {
    let mut sess = ctx.data.clone();
    if let Err(redirect) = ensure_logged_in(&mut sess) {
        ctx.save(&sess);
        return Ok((ctx.apply(jar), redirect).into_response());
    }

    let item = state.storage.item_by_title(&title).await?;

    let mut new_title = item.title.clone();
    if !form.title.is_empty() {
        if form.title != title && state.storage.title_exists(&form.title).await? {
            sess.push_flash(format!(
                "Please enter a different title. Item {} already exists.",
                form.title
            ));
            ctx.save(&sess);
            let back = format!("/catalog/items/{}/edit", title);
            return Ok((ctx.apply(jar), Redirect::to(&back)).into_response());
        }
        new_title = form.title.clone();
    }
    let new_description = if form.description.is_empty() {
        item.description.clone()
    } else {
        form.description.clone()
    };
    let new_category_id = form.category_id().unwrap_or(item.category_id);

    state
        .storage
        .update_item(item.id, &new_title, &new_description, new_category_id)
        .await?;
    info!(title = %new_title, "item updated");
    ctx.save(&sess);
    Ok((ctx.apply(jar), Redirect::to("/catalog")).into_response())
}

/// GET /catalog/items/{title}/delete -> confirmation form only; a GET never
/// deletes.
pub async fn delete_item_form(
    State(state): State<CatalogState>,
    Path(title): Path<String>,
    ctx: SessionCtx,
    jar: CookieJar,
) -> Result<Response, CatalogError> {
    let mut sess = ctx.data.clone();
    if let Err(redirect) = ensure_logged_in(&mut sess) {
        ctx.save(&sess);
        return Ok((ctx.apply(jar), redirect).into_response());
    }

    let flash = sess.take_flash();
    ctx.save(&sess);
    let html = state.render(
        "delete_item.html",
        context! {
            user => sess.username,
            flash => flash,
            item_title => title,
        },
    )?;
    Ok((ctx.apply(jar), Html(html)).into_response())
}

/// POST /catalog/items/{title}/delete -> the actual deletion.
pub async fn delete_item(
    State(state): State<CatalogState>,
    Path(title): Path<String>,
    ctx: SessionCtx,
    jar: CookieJar,
) -> Result<Response, CatalogError> {
    let mut sess = ctx.data.clone();
    if let Err(redirect) = ensure_logged_in(&mut sess) {
        ctx.save(&sess);
        return Ok((ctx.apply(jar), redirect).into_response());
    }

    state.storage.delete_item_by_title(&title).await?;
    info!(title = %title, "item deleted");
    ctx.save(&sess);
    Ok((ctx.apply(jar), Redirect::to("/catalog")).into_response())
}
