//! Error types returned by the library.

use thiserror::Error;

use crate::{model::error::AuthenticationErrorKind, uri::ItemType};

/// Result type with the library's [Error](Error) as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Every error the library may return.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    // response statuses
    #[error("The resource has not been modified: {0}")]
    NotModified(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("The access token is invalid: {0}")]
    InvalidToken(String),
    #[error("The endpoint is forbidden: {0}")]
    Forbidden(String),
    #[error("The requested resource was not found: {0}")]
    NotFound(String),
    #[error("Spotify encountered an internal server error: {0}")]
    InternalServerError(String),
    #[error("Request rate limit hit; retry after {0} seconds")]
    RateLimit(u64),
    #[error("The Spotify service is unavailable")]
    ServiceUnavailable,
    #[error("Unhandled Spotify response status code {0}")]
    UnhandledSpotifyResponseStatusCode(u16),
    #[error("Spotify returned an empty response where a body was expected")]
    EmptyResponse,
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    // authorization
    #[error("The given state does not match the original state")]
    AuthorizationCodeStateMismatch,
    #[error("The user did not authorize the application: {0}")]
    AuthorizationDenied(String),
    #[error("The authorization code is invalid")]
    InvalidAuthorizationCode,
    #[error("The refresh token is invalid: {0}. The user should be reauthorized")]
    InvalidRefreshToken(String),
    #[error("Invalid client")]
    InvalidClient,
    #[error("Received a token of unsupported type {0}")]
    InvalidTokenType(String),
    #[error("Not enough credentials to request an access token")]
    MissingCredentials,
    #[error("Malformed authorization callback request: {0}")]
    MalformedCallback(String),
    #[error("Unhandled authentication error: {0:?}: {1}")]
    UnhandledAuthenticationError(AuthenticationErrorKind, String),

    // model
    #[error(transparent)]
    Uri(#[from] UriError),
    #[error("Expected a {expected} but got a {actual}")]
    WrongItemType { expected: ItemType, actual: ItemType },
    // stale data while loading an element; cached data that raises it is requested again
    #[doc(hidden)]
    #[error("The cached data for {0} is outdated")]
    ElementOutdated(String),
    #[error("The element's client has been dropped")]
    CacheDropped,

    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<std::convert::Infallible> for Error {
    fn from(infallible: std::convert::Infallible) -> Self {
        match infallible {}
    }
}

/// Errors from parsing a [Uri](crate::uri::Uri).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UriError {
    /// The string isn't a valid Spotify URI or URL.
    #[error("Malformed Spotify URI or URL: {0}")]
    MalformedString(String),
    /// The ID in the string isn't a valid Spotify ID.
    #[error("Invalid Spotify ID: {0}")]
    InvalidId(String),
    /// The item type in the string isn't a known Spotify item type.
    #[error("Unknown Spotify item type: {0}")]
    UnknownItemType(String),
}

/// Error from parsing a [Scope](crate::scope::Scope).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown scope: {0}")]
pub struct ParseScopeError(pub String);
