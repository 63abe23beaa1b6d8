//! Shared scaffolding for the integration tests: a per-test temp SQLite
//! database and a router state wired to a configurable provider.

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use item_catalog::config::{ClientSecrets, ProviderEndpoints, WebSecrets};
use item_catalog::db::CatalogStorage;
use item_catalog::oauth::OauthApp;
use item_catalog::router::CatalogState;

pub const TEST_CLIENT_ID: &str = "catalog-client-id";

pub fn temp_db_path(tag: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time before UNIX_EPOCH")
        .as_nanos();

    let mut temp_path = std::env::temp_dir();
    temp_path.push(format!(
        "item-catalog-{}-{}-{}.sqlite",
        tag,
        std::process::id(),
        nanos
    ));
    temp_path
}

pub fn test_oauth_app(endpoints: ProviderEndpoints) -> OauthApp {
    let secrets = ClientSecrets {
        web: WebSecrets {
            client_id: TEST_CLIENT_ID.to_string(),
            client_secret: "test-secret".to_string(),
        },
    };
    OauthApp::new(secrets, endpoints)
}

pub async fn test_state(tag: &str, endpoints: ProviderEndpoints) -> (CatalogState, PathBuf) {
    let temp_path = temp_db_path(tag);
    let database_url = format!("sqlite:{}", temp_path.display());
    let storage = CatalogStorage::connect(&database_url)
        .await
        .expect("open test db");
    storage.init_schema().await.expect("schema init");

    (
        CatalogState::new(storage, test_oauth_app(endpoints)),
        temp_path,
    )
}
