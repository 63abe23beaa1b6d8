use std::sync::Arc;
use std::time::Duration;

use axum::{Router, routing::get};
use minijinja::Environment;
use serde::Serialize;

use crate::db::CatalogStorage;
use crate::error::CatalogError;
use crate::handlers::{auth, catalog, items};
use crate::oauth::OauthApp;
use crate::session::SessionStore;
use crate::templates;

#[derive(Clone)]
pub struct CatalogState {
    pub storage: CatalogStorage,
    pub sessions: SessionStore,
    pub oauth: Arc<OauthApp>,
    pub client: reqwest::Client,
    templates: Arc<Environment<'static>>,
}

impl CatalogState {
    pub fn new(storage: CatalogStorage, oauth: OauthApp) -> Self {
        let client = reqwest::Client::builder()
            .user_agent("item-catalog/0.1")
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(15))
            .build()
            .expect("FATAL: initialize provider HTTP client failed");

        Self {
            storage,
            sessions: SessionStore::new(),
            oauth: Arc::new(oauth),
            client,
            templates: Arc::new(templates::build_env()),
        }
    }

    pub fn render(&self, name: &str, ctx: impl Serialize) -> Result<String, CatalogError> {
        Ok(self.templates.get_template(name)?.render(ctx)?)
    }
}

pub fn catalog_router(state: CatalogState) -> Router {
    Router::new()
        .route("/", get(catalog::root_redirect))
        .route("/catalog", get(catalog::main_page).post(auth::catalog_connect))
        .route("/catalog/JSON", get(catalog::catalog_json))
        .route("/catalog/categories/{name}/", get(catalog::category_items))
        .route(
            "/catalog/items/new",
            get(items::new_item_form).post(items::create_item),
        )
        .route("/catalog/items/{title}/", get(catalog::item_detail))
        .route(
            "/catalog/items/{title}/edit",
            get(items::edit_item_form).post(items::update_item),
        )
        .route(
            "/catalog/items/{title}/delete",
            get(items::delete_item_form).post(items::delete_item),
        )
        .route("/gdisconnect", get(auth::gdisconnect))
        .with_state(state)
}
