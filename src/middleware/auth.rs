use axum::response::Redirect;

use crate::error::CatalogError;
use crate::session::SessionState;

/// Pure precondition: the session must carry a non-empty username.
pub fn require_session(session: &SessionState) -> Result<(), CatalogError> {
    if session.is_logged_in() {
        Ok(())
    } else {
        Err(CatalogError::Unauthenticated)
    }
}

/// Login gate for state-mutating routes. On a missing login it attaches the
/// flash message and sends the browser back to the main page instead of
/// letting the protected handler run.
pub fn ensure_logged_in(session: &mut SessionState) -> Result<(), Redirect> {
    match require_session(session) {
        Ok(()) => Ok(()),
        Err(_) => {
            session.push_flash("You need to be logged in to add a new item.");
            Err(Redirect::to("/catalog"))
        }
    }
}
