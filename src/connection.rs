//! HTTP plumbing between the elements and the Web API.
//!
//! The connection holds the authentication and attaches its access token to each request. It evaluates the response
//! statuses, waits out rate limits and temporary outages, refreshes expired tokens and follows paginated responses.

use std::{
    sync::{Arc, RwLock},
    time::Duration,
};

use log::{debug, error, info, trace, warn};
use reqwest::{header, Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{
    authentication::{unix_now, Authentication},
    authorization::{self, Grant, DEFAULT_REDIRECT_URI},
    error::{Error, Result},
    model::{error::api_error_message, page::Page},
};

pub(crate) const API_BASE_URL: &str = "https://api.spotify.com/v1/";
pub(crate) const ACCOUNTS_BASE_URL: &str = "https://accounts.spotify.com/";

const DEFAULT_MAX_RETRIES: u32 = 5;
const DEFAULT_RETRY_AFTER: u64 = 5;
const SERVICE_UNAVAILABLE_WAIT: u64 = 1;

// Spotify's access tokens live for an hour
const SET_TOKEN_LIFETIME: Duration = Duration::from_secs(3600);

/// Settings for how the client connects to Spotify.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Base URL of the Web API.
    pub api_base_url: String,
    /// Base URL of the accounts service, where the user authorizes the application and tokens are requested.
    pub accounts_base_url: String,
    /// Where Spotify redirects the user after authorization. It must be registered in the application's settings and
    /// point to a local port, where the library listens for the redirect.
    pub redirect_uri: String,
    /// How many times a rate-limited or temporarily unavailable request is retried before giving up.
    pub max_retries: u32,
    /// Whether to try opening the authorization page in a browser.
    pub open_browser: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct Connection {
    inner: Arc<ConnectionRef>,
    http_client: reqwest::Client,
}

#[derive(Debug)]
struct ConnectionRef {
    api_base_url: Url,
    accounts_base_url: Url,
    redirect_uri: Url,
    max_retries: u32,
    open_browser: bool,

    authentication: RwLock<Authentication>,
    // held while requesting a new token so concurrent requests that all notice an expired token refresh it once
    token_lock: tokio::sync::Mutex<()>,
}

/// What to do with a response.
#[derive(Debug)]
enum Evaluation {
    Empty,
    Body(String),
    Retry(RetryReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RetryReason {
    RateLimit(u64),
    ServiceUnavailable,
    TokenRefreshed,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            api_base_url: String::from(API_BASE_URL),
            accounts_base_url: String::from(ACCOUNTS_BASE_URL),
            redirect_uri: String::from(DEFAULT_REDIRECT_URI),
            max_retries: DEFAULT_MAX_RETRIES,
            open_browser: true,
        }
    }
}

impl RetryReason {
    fn into_error(self, message: &str) -> Error {
        match self {
            RetryReason::RateLimit(wait_time) => Error::RateLimit(wait_time),
            RetryReason::ServiceUnavailable => Error::ServiceUnavailable,
            RetryReason::TokenRefreshed => Error::InvalidToken(message.to_owned()),
        }
    }
}

impl Connection {
    pub fn new(authentication: Authentication, config: ConnectionConfig) -> Result<Self> {
        Ok(Self {
            inner: Arc::new(ConnectionRef {
                api_base_url: parse_base_url(&config.api_base_url)?,
                accounts_base_url: parse_base_url(&config.accounts_base_url)?,
                redirect_uri: Url::parse(&config.redirect_uri).map_err(|e| Error::InvalidUrl(e.to_string()))?,
                max_retries: config.max_retries,
                open_browser: config.open_browser,
                authentication: RwLock::new(authentication),
                token_lock: tokio::sync::Mutex::new(()),
            }),
            http_client: reqwest::Client::new(),
        })
    }

    /// The current authentication, including any tokens received since the connection was created.
    pub fn authentication(&self) -> Authentication {
        self.inner
            .authentication
            .read()
            .expect("authentication rwlock poisoned")
            .clone()
    }

    /// Replaces the access token with one generated elsewhere.
    pub fn set_token(&self, token: String) {
        self.inner
            .authentication
            .write()
            .expect("authentication rwlock poisoned")
            .set_token(token, SET_TOKEN_LIFETIME);
    }

    /// Whether the current access token has expired.
    pub fn is_expired(&self) -> bool {
        self.inner
            .authentication
            .read()
            .expect("authentication rwlock poisoned")
            .is_expired(unix_now())
    }

    /// Builds the URL for an API endpoint with query parameters. Parameters without a value are left out.
    ///
    /// Full URLs, such as the next page links Spotify returns, are used as they are.
    pub fn build_endpoint(&self, endpoint: &str, params: &[(&str, Option<String>)]) -> Result<Url> {
        let mut url = if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            Url::parse(endpoint)
        } else {
            self.inner.api_base_url.join(endpoint)
        }
        .map_err(|e| Error::InvalidUrl(e.to_string()))?;

        append_params(&mut url, params);
        Ok(url)
    }

    /// Builds the URL for an endpoint addressed by path segments, such as `["users", id, "playlists"]`. Every segment is
    /// percent-encoded, so IDs can't reach outside their own segment.
    pub fn build_element_endpoint(&self, segments: &[&str], params: &[(&str, Option<String>)]) -> Result<Url> {
        let mut url = self.inner.api_base_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::InvalidUrl(self.inner.api_base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);

        append_params(&mut url, params);
        Ok(url)
    }

    /// Requests an endpoint that must respond with a body.
    pub async fn get<T>(&self, url: Url) -> Result<T>
    where
        T: DeserializeOwned,
    {
        self.request(Method::GET, url, None).await?.ok_or(Error::EmptyResponse)
    }

    /// Requests a paginated endpoint and collects the items in every page.
    pub async fn get_paged<T>(&self, url: Url) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
    {
        let page = self.get(url).await?;
        self.get_all_pages(page).await
    }

    /// Collects the items in the given page and every page after it.
    pub async fn get_all_pages<T>(&self, page: Page<T>) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
    {
        let mut items = page.items;
        let mut next = page.next;

        while let Some(next_url) = next {
            let url = Url::parse(&next_url).map_err(|e| Error::InvalidUrl(e.to_string()))?;
            let page: Page<T> = self.get(url).await?;
            debug!(
                "Got page at offset {} with {} items out of {}",
                page.offset,
                page.items.len(),
                page.total
            );

            items.extend(page.items);
            next = page.next;
        }

        Ok(items)
    }

    /// Sends a request and evaluates its response.
    ///
    /// Returns `None` if Spotify responds without content or with a body that isn't JSON.
    pub async fn request<T>(&self, method: Method, url: Url, body: Option<&Value>) -> Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        let mut retries = 0;

        loop {
            let token = self.access_token().await?;
            let mut request = self
                .http_client
                .request(method.clone(), url.clone())
                .bearer_auth(&token);

            request = match body {
                Some(body) => request.json(body),
                // Spotify rejects body-less POST and PUT requests without a length
                None if method == Method::POST || method == Method::PUT => request.header(header::CONTENT_LENGTH, 0),
                None => request,
            };

            debug!("{method} {url}");
            let response = request.send().await?;

            match self.evaluate_response(response, &token).await? {
                Evaluation::Empty => return Ok(None),
                Evaluation::Body(text) => return parse_body(&text),
                Evaluation::Retry(reason) => {
                    if retries >= self.inner.max_retries {
                        error!("Giving up on {method} {url} after {retries} retries");
                        return Err(reason.into_error("the refreshed access token was rejected"));
                    }
                    retries += 1;

                    match reason {
                        RetryReason::RateLimit(wait_time) => {
                            warn!("Rate limited, retrying in {wait_time} seconds");
                            tokio::time::sleep(Duration::from_secs(wait_time)).await;
                        }
                        RetryReason::ServiceUnavailable => {
                            warn!("Spotify is unavailable, retrying in {SERVICE_UNAVAILABLE_WAIT} second");
                            tokio::time::sleep(Duration::from_secs(SERVICE_UNAVAILABLE_WAIT)).await;
                        }
                        RetryReason::TokenRefreshed => info!("Retrying with refreshed access token"),
                    }
                }
            }
        }
    }

    async fn evaluate_response(&self, response: reqwest::Response, used_token: &str) -> Result<Evaluation> {
        let status = response.status();
        trace!("Response: {:?}", response);

        if status == StatusCode::NO_CONTENT {
            return Ok(Evaluation::Empty);
        }

        if status.is_success() {
            let body = response.text().await?;
            trace!("Response body: {body}");
            return Ok(Evaluation::Body(body));
        }

        match status {
            StatusCode::TOO_MANY_REQUESTS => {
                let wait_time = response
                    .headers()
                    .get(header::RETRY_AFTER)
                    .and_then(|header| header.to_str().ok())
                    .and_then(|header_str| header_str.trim().parse::<u64>().ok())
                    .unwrap_or(DEFAULT_RETRY_AFTER);

                warn!("Got 429 rate-limit response from Spotify with Retry-After: {wait_time}");
                Ok(Evaluation::Retry(RetryReason::RateLimit(wait_time)))
            }

            StatusCode::SERVICE_UNAVAILABLE => {
                warn!("Got 503 Service Unavailable response");
                Ok(Evaluation::Retry(RetryReason::ServiceUnavailable))
            }

            StatusCode::UNAUTHORIZED => {
                let message = api_error_message(&response.text().await?);
                warn!("Got 401 Unauthorized response: {message}");

                let (expired, can_authorize) = {
                    let authentication = self.inner.authentication.read().expect("authentication rwlock poisoned");
                    (
                        authentication.is_expired(unix_now()) || message.to_lowercase().contains("expired"),
                        authentication.can_authorize(),
                    )
                };

                if expired && can_authorize {
                    warn!("Access token expired, attempting to refresh");
                    self.obtain_token(Some(used_token)).await?;
                    Ok(Evaluation::Retry(RetryReason::TokenRefreshed))
                } else {
                    error!("The access token was rejected and can't be refreshed");
                    Err(Error::InvalidToken(message))
                }
            }

            other => {
                let body = response.text().await?;
                error!("Got {other} response: {body}");

                Err(match other {
                    StatusCode::NOT_MODIFIED => Error::NotModified(body),
                    StatusCode::BAD_REQUEST => Error::BadRequest(api_error_message(&body)),
                    StatusCode::FORBIDDEN => Error::Forbidden(api_error_message(&body)),
                    StatusCode::NOT_FOUND => Error::NotFound(api_error_message(&body)),
                    StatusCode::INTERNAL_SERVER_ERROR => Error::InternalServerError(body),
                    other => Error::UnhandledSpotifyResponseStatusCode(other.as_u16()),
                })
            }
        }
    }

    /// The access token to use for a request. A token is requested first if there isn't one, or if it has expired and
    /// can be refreshed.
    async fn access_token(&self) -> Result<String> {
        let current = {
            let authentication = self.inner.authentication.read().expect("authentication rwlock poisoned");
            authentication
                .token
                .clone()
                .filter(|_| !(authentication.is_expired(unix_now()) && authentication.can_refresh()))
        };

        match current {
            Some(token) => Ok(token),
            None => self.obtain_token(None).await,
        }
    }

    /// Requests a new access token with the refresh token if there is one, otherwise by having the user authorize the
    /// application.
    ///
    /// `rejected` is the token Spotify refused. If another request already replaced it while this one waited for its
    /// turn, the replacement is used as is.
    async fn obtain_token(&self, rejected: Option<&str>) -> Result<String> {
        let _guard = self.inner.token_lock.lock().await;
        let authentication = self.authentication();

        if let Some(token) = authentication.token.as_deref() {
            let replaced = rejected.map_or(false, |rejected| rejected != token);
            let usable = rejected.is_none() && !(authentication.is_expired(unix_now()) && authentication.can_refresh());

            if replaced || usable {
                debug!("Access token was already replaced");
                return Ok(token.to_owned());
            }
        }

        let token_response = if let Some(refresh_token) = authentication.refresh_token.as_deref() {
            debug!("Refreshing access token");
            authorization::request_token(
                &self.http_client,
                &self.inner.accounts_base_url,
                &authentication,
                Grant::RefreshToken(refresh_token),
            )
            .await?
        } else if authentication.can_authorize() {
            info!("No access token, starting authorization");
            authorization::authorize_interactively(
                &self.http_client,
                &self.inner.accounts_base_url,
                &self.inner.redirect_uri,
                self.inner.open_browser,
                &authentication,
            )
            .await?
        } else {
            return Err(Error::MissingCredentials);
        };

        let lifetime = token_response.lifetime();
        let token = token_response.access_token;

        let mut authentication = self.inner.authentication.write().expect("authentication rwlock poisoned");
        authentication.set_token(token.clone(), lifetime);
        if let Some(refresh_token) = token_response.refresh_token {
            authentication.refresh_token = Some(refresh_token);
        }

        debug!("Got new access token, expires in {} seconds", lifetime.as_secs());
        Ok(token)
    }
}

/// Base URLs are joined with relative endpoints, which only appends to the path if it ends in a slash.
fn parse_base_url(url: &str) -> Result<Url> {
    let url = if url.ends_with('/') {
        Url::parse(url)
    } else {
        Url::parse(&format!("{url}/"))
    };

    url.map_err(|e| Error::InvalidUrl(e.to_string()))
}

fn append_params(url: &mut Url, params: &[(&str, Option<String>)]) {
    let mut present = params
        .iter()
        .filter_map(|(key, value)| value.as_deref().map(|value| (*key, value)))
        .peekable();

    // appending nothing would still leave a stray '?' in the URL
    if present.peek().is_some() {
        url.query_pairs_mut().extend_pairs(present);
    }
}

fn parse_body<T>(body: &str) -> Result<Option<T>>
where
    T: DeserializeOwned,
{
    if body.trim().is_empty() {
        return Ok(None);
    }

    match serde_json::from_str::<Value>(body) {
        Ok(value) => Ok(Some(serde_json::from_value(value)?)),
        Err(e) => {
            debug!("Response body isn't JSON: {e}");
            Ok(None)
        }
    }
}
