use oauth2::{
    AuthorizationCode, Client as OAuth2Client, ClientId, ClientSecret, EndpointNotSet, EndpointSet,
    ExtraTokenFields, StandardRevocableToken, StandardTokenResponse, TokenUrl,
    basic::{
        BasicErrorResponse, BasicRevocationErrorResponse, BasicTokenIntrospectionResponse,
        BasicTokenType,
    },
};
use serde::{Deserialize, Serialize};

use crate::error::CatalogError;
use crate::oauth::OauthApp;

/// Stateless provider endpoints used by the handshake.
pub(super) struct ProviderApi;

impl ProviderApi {
    /// Exchange the authorization code for a credentials bundle at the
    /// provider's token endpoint.
    pub(super) async fn exchange_authorization_code(
        code: &str,
        app: &OauthApp,
        http_client: reqwest::Client,
    ) -> Result<ProviderTokenResponse, CatalogError> {
        let client = build_oauth2_client(app);
        let token_result: ProviderTokenResponse = client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .request_async(&http_client)
            .await?;
        Ok(token_result)
    }

    /// Introspect the access token at the provider's tokeninfo endpoint.
    /// Provider errors arrive in the body, so the status code is not checked
    /// here.
    pub(super) async fn token_info(
        access_token: &str,
        app: &OauthApp,
        http_client: reqwest::Client,
    ) -> Result<TokenInfo, CatalogError> {
        let info = http_client
            .get(app.endpoints.tokeninfo_url.as_str())
            .query(&[("access_token", access_token)])
            .send()
            .await?
            .json::<TokenInfo>()
            .await?;
        Ok(info)
    }

    pub(super) async fn fetch_userinfo(
        access_token: &str,
        app: &OauthApp,
        http_client: reqwest::Client,
    ) -> Result<UserInfo, CatalogError> {
        let profile = http_client
            .get(app.endpoints.userinfo_url.as_str())
            .bearer_auth(access_token)
            .header("Accept", "application/json")
            .send()
            .await?
            .error_for_status()?
            .json::<UserInfo>()
            .await?;
        Ok(profile)
    }

    /// Ask the provider to revoke the token; the caller decides what a
    /// non-200 answer means.
    pub(super) async fn revoke_token(
        access_token: &str,
        app: &OauthApp,
        http_client: reqwest::Client,
    ) -> Result<reqwest::StatusCode, CatalogError> {
        let resp = http_client
            .get(app.endpoints.revoke_url.as_str())
            .query(&[("token", access_token)])
            .send()
            .await?;
        Ok(resp.status())
    }
}

/// Build the OAuth2 client for the registered app.
fn build_oauth2_client(app: &OauthApp) -> CatalogOauth2Client {
    OAuth2Client::new(ClientId::new(app.client_id.clone()))
        .set_client_secret(ClientSecret::new(app.client_secret.clone()))
        .set_token_uri(TokenUrl::from_url(app.endpoints.token_url.clone()))
}

/// The provider attaches an `id_token` to its token response; its payload
/// carries the subject the handshake binds the session to.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub(super) struct IdTokenField {
    #[serde(rename = "id_token")]
    pub id_token: Option<String>,
}
impl ExtraTokenFields for IdTokenField {}

pub(super) type ProviderTokenResponse = StandardTokenResponse<IdTokenField, BasicTokenType>;

pub(super) type CatalogOauth2Client = OAuth2Client<
    BasicErrorResponse,
    ProviderTokenResponse,
    BasicTokenIntrospectionResponse,
    StandardRevocableToken,
    BasicRevocationErrorResponse,
    EndpointNotSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointSet,
>;

/// Subset of the tokeninfo introspection body the handshake checks.
#[derive(Debug, Deserialize)]
pub(super) struct TokenInfo {
    pub user_id: Option<String>,
    pub issued_to: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct UserInfo {
    pub name: String,
}
