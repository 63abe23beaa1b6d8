use mimalloc::MiMalloc;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use item_catalog::config::{ClientSecrets, Config};
use item_catalog::db::CatalogStorage;
use item_catalog::oauth::OauthApp;
use item_catalog::router::{CatalogState, catalog_router};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cfg = Config::load()?;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cfg.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_level(true)
                .with_target(false),
        )
        .init();

    info!(
        database_url = %cfg.database_url,
        listen_addr = %cfg.listen_addr,
        loglevel = %cfg.loglevel,
        "booting catalog server"
    );

    // The registered OAuth client is required; refusing to boot without it
    // beats serving a login that can never complete.
    let secrets = match ClientSecrets::load(&cfg.client_secrets) {
        Ok(secrets) => secrets,
        Err(e) => {
            error!(
                path = %cfg.client_secrets.display(),
                error = %e,
                "client secrets document is required at startup"
            );
            return Err(e.into());
        }
    };

    let storage = CatalogStorage::connect(&cfg.database_url).await?;
    storage.init_schema().await?;
    if cfg.seed_on_start {
        storage.seed().await?;
    }

    let oauth = OauthApp::new(secrets, cfg.provider.clone());
    let state = CatalogState::new(storage, oauth);
    let app = catalog_router(state);

    let listener = TcpListener::bind(&cfg.listen_addr).await?;
    info!("HTTP server listening on {}", cfg.listen_addr);
    axum::serve(listener, app).await?;
    Ok(())
}
