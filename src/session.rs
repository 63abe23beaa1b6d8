//! Server-side browser sessions.
//!
//! Each browser carries one opaque `catalog_session` cookie whose value keys
//! into the in-process [`SessionStore`]. Handlers load a copy of the
//! [`SessionState`], mutate it, and write it back; a session is only ever
//! touched by the request currently serving it.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use time::Duration;
use uuid::Uuid;

use crate::router::CatalogState;

pub const SESSION_COOKIE: &str = "catalog_session";

/// Per-browser session payload. The authenticated fields exist only after a
/// successful handshake and are cleared together on logout.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SessionState {
    /// Anti-forgery nonce, regenerated on each GET of the main page.
    pub state: Option<String>,
    pub access_token: Option<String>,
    pub provider_user_id: Option<String>,
    pub username: Option<String>,
    /// One-shot messages drained by the next rendered page.
    #[serde(default)]
    pub flash: Vec<String>,
}

impl SessionState {
    pub fn is_logged_in(&self) -> bool {
        self.username.as_deref().is_some_and(|u| !u.is_empty())
    }

    /// Drop every authenticated field at once.
    pub fn clear_auth(&mut self) {
        self.access_token = None;
        self.provider_user_id = None;
        self.username = None;
    }

    pub fn push_flash(&mut self, message: impl Into<String>) {
        self.flash.push(message.into());
    }

    pub fn take_flash(&mut self) -> Vec<String> {
        std::mem::take(&mut self.flash)
    }
}

#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<String, SessionState>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(&self, id: &str) -> Option<SessionState> {
        self.inner
            .read()
            .expect("session store lock poisoned")
            .get(id)
            .cloned()
    }

    pub fn save(&self, id: &str, state: SessionState) {
        self.inner
            .write()
            .expect("session store lock poisoned")
            .insert(id.to_string(), state);
    }
}

/// Extractor binding the request to its server-side session. A request
/// without a (known) session cookie gets a fresh entry; [`SessionCtx::apply`]
/// attaches the Set-Cookie for it.
pub struct SessionCtx {
    pub id: String,
    pub data: SessionState,
    store: SessionStore,
    fresh: bool,
}

impl SessionCtx {
    /// Write the (possibly mutated) state back to the store.
    pub fn save(&self, data: &SessionState) {
        self.store.save(&self.id, data.clone());
    }

    /// Attach the session cookie to the response when the session is new.
    pub fn apply(&self, jar: CookieJar) -> CookieJar {
        if self.fresh {
            jar.add(session_cookie(&self.id))
        } else {
            jar
        }
    }
}

impl FromRequestParts<CatalogState> for SessionCtx {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &CatalogState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let store = state.sessions.clone();

        let known = jar
            .get(SESSION_COOKIE)
            .map(|c| c.value().to_owned())
            .and_then(|id| store.load(&id).map(|data| (id, data)));

        Ok(match known {
            Some((id, data)) => Self {
                id,
                data,
                store,
                fresh: false,
            },
            None => {
                let id = Uuid::new_v4().to_string();
                let data = SessionState::default();
                store.save(&id, data.clone());
                Self {
                    id,
                    data,
                    store,
                    fresh: true,
                }
            }
        })
    }
}

fn session_cookie(id: &str) -> Cookie<'static> {
    Cookie::build(Cookie::new(SESSION_COOKIE.to_string(), id.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(Duration::hours(12))
        .build()
}
