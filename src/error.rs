use axum::{Json, http::StatusCode, response::IntoResponse};
use oauth2::basic::BasicErrorResponseType;
use oauth2::reqwest::Error as ReqwestClientError;
use oauth2::{HttpClientError, RequestTokenError, StandardErrorResponse};
use serde::Serialize;
use sqlx::Error as SqlxError;
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum CatalogError {
    #[error("invalid state parameter")]
    InvalidState,

    #[error("failed to upgrade the authorization code: {0}")]
    CodeExchangeFailed(String),

    #[error("token info error: {0}")]
    TokenInvalid(String),

    #[error("token's user ID doesn't match given user ID")]
    UserIdMismatch,

    #[error("token's client ID does not match app's")]
    AudienceMismatch,

    #[error("current user not connected")]
    NotConnected,

    #[error("failed to revoke token for given user")]
    RevokeFailed,

    #[error("item title already exists: {0}")]
    DuplicateTitle(String),

    #[error("record not found: {0}")]
    RecordNotFound(String),

    #[error("login required")]
    Unauthenticated,

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("HTTP request error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("database error: {0}")]
    Database(#[from] SqlxError),

    #[error("template error: {0}")]
    Template(#[from] minijinja::Error),
}

impl
    From<
        RequestTokenError<
            HttpClientError<ReqwestClientError>,
            StandardErrorResponse<BasicErrorResponseType>,
        >,
    > for CatalogError
{
    fn from(
        e: RequestTokenError<
            HttpClientError<ReqwestClientError>,
            StandardErrorResponse<BasicErrorResponseType>,
        >,
    ) -> Self {
        match e {
            RequestTokenError::ServerResponse(err) => {
                CatalogError::CodeExchangeFailed(err.error().to_string())
            }
            RequestTokenError::Request(req_e) => {
                CatalogError::CodeExchangeFailed(format!("request failed: {}", req_e))
            }
            RequestTokenError::Parse(parse_err, _body) => {
                CatalogError::CodeExchangeFailed(parse_err.to_string())
            }
            RequestTokenError::Other(s) => CatalogError::CodeExchangeFailed(s),
        }
    }
}

impl IntoResponse for CatalogError {
    fn into_response(self) -> axum::response::Response {
        let (status, body) = match &self {
            CatalogError::InvalidState => (
                StatusCode::UNAUTHORIZED,
                ApiErrorBody::new("INVALID_STATE", "Invalid state parameter."),
            ),
            CatalogError::CodeExchangeFailed(_) => (
                StatusCode::UNAUTHORIZED,
                ApiErrorBody::new("CODE_EXCHANGE_FAILED", "Failed to upgrade the authorization code."),
            ),
            CatalogError::TokenInvalid(detail) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiErrorBody::new("TOKEN_INVALID", detail.as_str()),
            ),
            CatalogError::UserIdMismatch => (
                StatusCode::UNAUTHORIZED,
                ApiErrorBody::new("USER_ID_MISMATCH", "Token's user ID doesn't match given user ID."),
            ),
            CatalogError::AudienceMismatch => (
                StatusCode::UNAUTHORIZED,
                ApiErrorBody::new("AUDIENCE_MISMATCH", "Token's client ID does not match app's."),
            ),
            CatalogError::NotConnected => (
                StatusCode::UNAUTHORIZED,
                ApiErrorBody::new("NOT_CONNECTED", "Current user not connected."),
            ),
            CatalogError::RevokeFailed => (
                StatusCode::BAD_REQUEST,
                ApiErrorBody::new("REVOKE_FAILED", "Failed to revoke token for given user."),
            ),
            CatalogError::DuplicateTitle(title) => (
                StatusCode::CONFLICT,
                ApiErrorBody::new("DUPLICATE_TITLE", format!("Item {} already exists.", title)),
            ),
            CatalogError::RecordNotFound(what) => (
                StatusCode::NOT_FOUND,
                ApiErrorBody::new("NOT_FOUND", format!("No such record: {}.", what)),
            ),
            CatalogError::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                ApiErrorBody::new("UNAUTHENTICATED", "You need to be logged in."),
            ),
            CatalogError::Database(_) | CatalogError::Io(_) | CatalogError::Template(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiErrorBody::new("INTERNAL_ERROR", "An internal server error occurred."),
            ),
            CatalogError::Json(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiErrorBody::new("INTERNAL_ERROR", "An internal server error occurred."),
            ),
            CatalogError::Reqwest(_) | CatalogError::UrlParse(_) => (
                StatusCode::BAD_GATEWAY,
                ApiErrorBody::new("BAD_GATEWAY", "Upstream service is unavailable."),
            ),
        };
        (status, Json(ApiErrorResponse { error: body })).into_response()
    }
}

/// Standardized API error response body
#[derive(Serialize)]
pub struct ApiErrorBody {
    pub code: String,
    pub message: String,
}

impl ApiErrorBody {
    fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

#[derive(Serialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}
