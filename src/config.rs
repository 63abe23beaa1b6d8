use std::fs;
use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Serialized},
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::CatalogError;

/// Runtime configuration. Defaults are production values; every key can be
/// overridden from the environment with the `CATALOG_` prefix
/// (nested keys use `__`, e.g. `CATALOG_PROVIDER__TOKEN_URL`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub listen_addr: String,
    pub database_url: String,
    pub loglevel: String,
    /// Path to the registered OAuth client document. Missing file is fatal at boot.
    pub client_secrets: PathBuf,
    pub seed_on_start: bool,
    pub provider: ProviderEndpoints,
}

/// Identity-provider endpoints used by the handshake. Defaults target
/// Google; tests point these at a local mock provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderEndpoints {
    pub token_url: Url,
    pub tokeninfo_url: Url,
    pub userinfo_url: Url,
    pub revoke_url: Url,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:5000".to_string(),
            database_url: "sqlite:catalog.db".to_string(),
            loglevel: "info".to_string(),
            client_secrets: PathBuf::from("client_secrets.json"),
            seed_on_start: false,
            provider: ProviderEndpoints::default(),
        }
    }
}

impl Default for ProviderEndpoints {
    fn default() -> Self {
        Self {
            token_url: Url::parse("https://oauth2.googleapis.com/token")
                .expect("default token URL"),
            tokeninfo_url: Url::parse("https://www.googleapis.com/oauth2/v1/tokeninfo")
                .expect("default tokeninfo URL"),
            userinfo_url: Url::parse("https://www.googleapis.com/oauth2/v1/userinfo")
                .expect("default userinfo URL"),
            revoke_url: Url::parse("https://accounts.google.com/o/oauth2/revoke")
                .expect("default revoke URL"),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, figment::Error> {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Env::prefixed("CATALOG_").split("__"))
            .extract()
    }
}

/// The client-secrets document registered with the identity provider,
/// mirroring the provider's downloadable JSON shape.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientSecrets {
    pub web: WebSecrets,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebSecrets {
    pub client_id: String,
    pub client_secret: String,
}

impl ClientSecrets {
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }
}
