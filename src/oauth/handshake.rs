//! The ordered login handshake and its disconnect counterpart. Every step
//! short-circuits with a [`CatalogError`] and aborts the remaining steps.

use base64::Engine;
use oauth2::{CsrfToken, TokenResponse};
use serde_json::Value;
use subtle::ConstantTimeEq;
use tracing::info;

use crate::error::CatalogError;
use crate::oauth::OauthApp;
use crate::oauth::endpoints::ProviderApi;
use crate::session::SessionState;

/// Successful conclusions of [`connect`].
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectOutcome {
    Established { username: String },
    /// The session already belongs to this provider user; nothing was
    /// mutated and no profile fetch happened.
    AlreadyConnected,
}

/// Fresh anti-forgery nonce for the main page's login widget.
pub fn new_state_nonce() -> String {
    CsrfToken::new_random().secret().to_string()
}

/// Run the full handshake against the provider and establish (or confirm)
/// the logged-in session.
pub async fn connect(
    session: &mut SessionState,
    submitted_state: &str,
    code: &str,
    app: &OauthApp,
    http_client: &reqwest::Client,
) -> Result<ConnectOutcome, CatalogError> {
    // Anti-forgery check before anything touches the network.
    let expected = session.state.as_deref().unwrap_or("");
    if expected.is_empty()
        || !bool::from(submitted_state.as_bytes().ct_eq(expected.as_bytes()))
    {
        return Err(CatalogError::InvalidState);
    }

    info!("starting authentication");
    let token_response =
        ProviderApi::exchange_authorization_code(code, app, http_client.clone()).await?;
    let access_token = token_response.access_token().secret().to_string();
    let subject = token_response
        .extra_fields()
        .id_token
        .as_deref()
        .and_then(subject_from_id_token)
        .ok_or_else(|| {
            CatalogError::CodeExchangeFailed("token response carries no subject".to_string())
        })?;

    let info = ProviderApi::token_info(&access_token, app, http_client.clone()).await?;
    if let Some(error) = info.error {
        return Err(CatalogError::TokenInvalid(error));
    }

    // The token must be bound to the user the id_token names, and issued to
    // this app; anything else is a substituted token.
    if info.user_id.as_deref() != Some(subject.as_str()) {
        return Err(CatalogError::UserIdMismatch);
    }
    if info.issued_to.as_deref() != Some(app.client_id.as_str()) {
        return Err(CatalogError::AudienceMismatch);
    }

    if session.access_token.is_some()
        && session.provider_user_id.as_deref() == Some(subject.as_str())
    {
        info!(provider_user_id = %subject, "current user is already connected");
        return Ok(ConnectOutcome::AlreadyConnected);
    }

    session.access_token = Some(access_token.clone());
    session.provider_user_id = Some(subject.clone());

    let profile = ProviderApi::fetch_userinfo(&access_token, app, http_client.clone()).await?;
    session.username = Some(profile.name.clone());
    info!(provider_user_id = %subject, username = %profile.name, "login session established");

    Ok(ConnectOutcome::Established {
        username: profile.name,
    })
}

/// Revoke the session's token at the provider and, only on a 200 answer,
/// clear every authenticated field.
pub async fn disconnect(
    session: &mut SessionState,
    app: &OauthApp,
    http_client: &reqwest::Client,
) -> Result<(), CatalogError> {
    let access_token = session
        .access_token
        .clone()
        .ok_or(CatalogError::NotConnected)?;

    let status = ProviderApi::revoke_token(&access_token, app, http_client.clone()).await?;
    if status != reqwest::StatusCode::OK {
        return Err(CatalogError::RevokeFailed);
    }

    session.clear_auth();
    info!("login session disconnected");
    Ok(())
}

/// Pull the `sub` claim out of an id_token payload. The token was just
/// issued over TLS by the provider itself, so no signature verification
/// happens here.
fn subject_from_id_token(id_token: &str) -> Option<String> {
    let payload_b64 = id_token.split('.').nth(1)?;
    let decoded = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(payload_b64)
        .ok()?;
    let payload: Value = serde_json::from_slice(&decoded).ok()?;
    payload
        .get("sub")
        .and_then(|s| s.as_str())
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_id_token(payload: &str) -> String {
        let b64 = |s: &str| base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(s);
        format!("{}.{}.{}", b64(r#"{"alg":"none"}"#), b64(payload), b64("sig"))
    }

    #[test]
    fn subject_extracted_from_id_token_payload() {
        let token = encode_id_token(r#"{"sub":"user-123","email":"a@b.c"}"#);
        assert_eq!(subject_from_id_token(&token).as_deref(), Some("user-123"));
    }

    #[test]
    fn malformed_id_token_yields_no_subject() {
        assert_eq!(subject_from_id_token("not-a-jwt"), None);
        assert_eq!(subject_from_id_token("a.!!!.c"), None);
        let no_sub = encode_id_token(r#"{"email":"a@b.c"}"#);
        assert_eq!(subject_from_id_token(&no_sub), None);
    }

    #[test]
    fn nonces_are_unique_per_call() {
        let a = new_state_nonce();
        let b = new_state_nonce();
        assert_ne!(a, b);
        assert!(!a.is_empty());
    }
}
