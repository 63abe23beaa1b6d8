use axum::{
    Json,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use crate::oauth::handshake::{self, ConnectOutcome};
use crate::router::CatalogState;
use crate::session::SessionCtx;

#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    pub state: Option<String>,
}

/// POST /catalog -> run the OAuth handshake. The login widget submits the
/// anti-forgery state in the query string and the authorization code as the
/// raw request body.
pub async fn catalog_connect(
    State(state): State<CatalogState>,
    Query(query): Query<ConnectQuery>,
    ctx: SessionCtx,
    jar: CookieJar,
    body: String,
) -> Response {
    let mut sess = ctx.data.clone();
    let submitted_state = query.state.unwrap_or_default();
    let code = body.trim();

    match handshake::connect(&mut sess, &submitted_state, code, &state.oauth, &state.client).await
    {
        Ok(ConnectOutcome::Established { username }) => {
            sess.push_flash(format!("you are now logged in as {}", username));
            ctx.save(&sess);
            (ctx.apply(jar), Redirect::to("/catalog")).into_response()
        }
        Ok(ConnectOutcome::AlreadyConnected) => {
            ctx.save(&sess);
            (ctx.apply(jar), Json(json!("Current user is already connected."))).into_response()
        }
        Err(err) => {
            warn!(error = %err, "handshake failed");
            // Step 7 persists the token before the profile fetch, so a late
            // failure must still write the session back.
            ctx.save(&sess);
            (ctx.apply(jar), err.into_response()).into_response()
        }
    }
}

/// GET /gdisconnect -> revoke the token at the provider and clear the
/// session's authenticated fields.
pub async fn gdisconnect(
    State(state): State<CatalogState>,
    ctx: SessionCtx,
    jar: CookieJar,
) -> Response {
    let mut sess = ctx.data.clone();
    match handshake::disconnect(&mut sess, &state.oauth, &state.client).await {
        Ok(()) => {
            ctx.save(&sess);
            (ctx.apply(jar), Redirect::to("/catalog")).into_response()
        }
        Err(err) => {
            warn!(error = %err, "disconnect failed");
            (ctx.apply(jar), err.into_response()).into_response()
        }
    }
}
