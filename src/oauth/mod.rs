//! OAuth handshake component: provider endpoint calls and the ordered
//! connect/disconnect algorithms.

pub mod endpoints;
pub mod handshake;

use crate::config::{ClientSecrets, ProviderEndpoints};

/// This app's registered OAuth client plus the provider endpoints it talks
/// to. Built once at boot and carried in the router state.
#[derive(Debug, Clone)]
pub struct OauthApp {
    pub client_id: String,
    pub client_secret: String,
    pub endpoints: ProviderEndpoints,
}

impl OauthApp {
    pub fn new(secrets: ClientSecrets, endpoints: ProviderEndpoints) -> Self {
        Self {
            client_id: secrets.web.client_id,
            client_secret: secrets.web.client_secret,
            endpoints,
        }
    }
}
