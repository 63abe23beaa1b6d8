pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod oauth;
pub mod router;
pub mod session;
pub mod templates;

pub use error::CatalogError;
pub use oauth::OauthApp;
pub use router::{CatalogState, catalog_router};
pub use session::{SessionState, SessionStore};
