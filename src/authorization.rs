//! The authorization code flow, with or without PKCE, and refreshing access tokens.
//!
//! The interactive flow sends the user to Spotify's authorization page in their browser. Spotify then redirects them
//! back to the redirect URI, which must point to a local port the library listens on for the single callback request.

use std::time::Duration;

use base64::{engine::general_purpose, Engine};
use const_format::concatcp;
use log::{debug, info, warn};
use rand::{distributions::Alphanumeric, Rng};
use reqwest::{header, StatusCode, Url};
use serde::Deserialize;
use sha2::Digest;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpListener,
};

use crate::{
    authentication::Authentication,
    error::{Error, Result},
    model::error::{AuthenticationErrorKind, AuthenticationErrorResponse},
};

pub(crate) const DEFAULT_CALLBACK_PORT: u16 = 2342;
pub(crate) const DEFAULT_REDIRECT_URI: &str = concatcp!("http://localhost:", DEFAULT_CALLBACK_PORT, "/");

const AUTHORIZE_PATH: &str = "authorize";
const TOKEN_PATH: &str = "api/token";

const RANDOM_STATE_LENGTH: usize = 16;
const PKCE_VERIFIER_LENGTH: usize = 128;

const CALLBACK_BUFFER_SIZE: usize = 8192;
const CALLBACK_PAGE: &str = "<html><body><p>You can close this page now.</p></body></html>";

/// A successful response from the token endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
    #[serde(default)]
    pub refresh_token: Option<String>,

    // in the response but the library doesn't need it. keep it here for logging purposes
    #[allow(dead_code)]
    #[serde(default)]
    pub scope: Option<String>,
}

/// The ways an access token may be granted.
#[derive(Debug)]
pub(crate) enum Grant<'a> {
    AuthorizationCode {
        code: &'a str,
        redirect_uri: &'a str,
        code_verifier: Option<&'a str>,
    },
    RefreshToken(&'a str),
}

/// The query of a request to the redirect URI.
#[derive(Debug, Default, PartialEq, Eq)]
struct CallbackPayload {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

/// Listens for the single request Spotify redirects the user's browser to after authorization.
#[derive(Debug)]
pub(crate) struct CallbackListener {
    listener: TcpListener,
}

impl TokenResponse {
    pub fn lifetime(&self) -> Duration {
        Duration::from_secs(self.expires_in)
    }
}

impl CallbackListener {
    /// Binds to the host and port of the redirect URI.
    pub async fn bind(redirect_uri: &Url) -> Result<Self> {
        let host = redirect_uri
            .host_str()
            .ok_or_else(|| Error::InvalidUrl(redirect_uri.to_string()))?;
        let port = redirect_uri.port_or_known_default().unwrap_or(DEFAULT_CALLBACK_PORT);

        debug!("Binding authorization callback listener to {host}:{port}");
        let listener = TcpListener::bind((host, port)).await?;
        Ok(Self { listener })
    }

    #[cfg(test)]
    pub fn port(&self) -> Result<u16> {
        Ok(self.listener.local_addr()?.port())
    }

    /// Waits for the callback and returns the authorization code in it.
    ///
    /// Connections that don't carry an authorization response, such as a browser asking for a favicon, are answered
    /// and ignored.
    pub async fn wait_for_code(self, expected_state: &str) -> Result<String> {
        loop {
            let (mut socket, peer) = self.listener.accept().await?;
            debug!("Authorization callback connection from {peer}");

            let mut buffer = vec![0u8; CALLBACK_BUFFER_SIZE];
            let size = socket.read(&mut buffer).await?;
            if size == 0 {
                continue;
            }

            let request = String::from_utf8_lossy(&buffer[..size]);
            let payload = match extract_request_target(&request).and_then(parse_callback_target) {
                Ok(payload) if payload.code.is_some() || payload.error.is_some() => payload,
                Ok(_) | Err(_) => {
                    debug!("Ignoring unrelated request to the callback listener");
                    let _ = socket.write_all(http_response("404 Not Found", "").as_bytes()).await;
                    let _ = socket.shutdown().await;
                    continue;
                }
            };

            let _ = socket.write_all(http_response("200 OK", CALLBACK_PAGE).as_bytes()).await;
            let _ = socket.shutdown().await;

            return validate_callback(payload, expected_state);
        }
    }
}

pub(crate) fn random_string(length: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

/// The S256 PKCE challenge for a verifier.
pub(crate) fn pkce_challenge(verifier: &str) -> String {
    let mut hasher = sha2::Sha256::new();
    hasher.update(verifier);
    general_purpose::URL_SAFE_NO_PAD.encode(hasher.finalize())
}

pub(crate) fn build_authorization_header(client_id: &str, client_secret: &str) -> String {
    let auth = format!("{}:{}", client_id, client_secret);
    format!("Basic {}", general_purpose::STANDARD.encode(auth))
}

/// The URL the user authorizes the application in.
pub(crate) fn build_authorize_url(
    accounts_base_url: &Url,
    client_id: &str,
    redirect_uri: &str,
    authentication: &Authentication,
    state: &str,
    pkce_challenge: Option<&str>,
) -> Result<Url> {
    let scope = authentication.scope().to_string();
    let mut query_params = vec![
        ("response_type", "code"),
        ("redirect_uri", redirect_uri),
        ("client_id", client_id),
        ("state", state),
    ];

    if !scope.is_empty() {
        query_params.push(("scope", scope.as_str()));
    }

    if authentication.show_dialog {
        // spotify's default for show_dialog is false if it's not specified
        query_params.push(("show_dialog", "true"));
    }

    if let Some(challenge) = pkce_challenge {
        query_params.extend([("code_challenge_method", "S256"), ("code_challenge", challenge)]);
    }

    let mut url = accounts_base_url
        .join(AUTHORIZE_PATH)
        .map_err(|e| Error::InvalidUrl(e.to_string()))?;
    url.query_pairs_mut().extend_pairs(query_params);

    Ok(url)
}

/// Runs the whole authorization code flow: shows the user the authorization page and exchanges the code they are
/// redirected back with for tokens.
pub(crate) async fn authorize_interactively(
    http_client: &reqwest::Client,
    accounts_base_url: &Url,
    redirect_uri: &Url,
    open_browser: bool,
    authentication: &Authentication,
) -> Result<TokenResponse> {
    let client_id = authentication.client_id().ok_or(Error::MissingCredentials)?;

    let state = random_string(RANDOM_STATE_LENGTH);
    let code_verifier = if authentication.client_secret().is_none() {
        Some(random_string(PKCE_VERIFIER_LENGTH))
    } else {
        None
    };
    let challenge = code_verifier.as_deref().map(pkce_challenge);

    // bind before showing the URL so the redirect can't arrive before anything listens for it
    let listener = CallbackListener::bind(redirect_uri).await?;
    let authorize_url = build_authorize_url(
        accounts_base_url,
        client_id,
        redirect_uri.as_str(),
        authentication,
        &state,
        challenge.as_deref(),
    )?;

    println!("Please authorize the application at: {authorize_url}");
    if open_browser {
        println!("Please check your web browser for identification.");
        if let Err(e) = open::that(authorize_url.as_str()) {
            warn!("Failed to open the authorization page in a browser: {e}");
        }
    }

    let code = listener.wait_for_code(&state).await?;
    info!("Received authorization code, requesting tokens");

    request_token(
        http_client,
        accounts_base_url,
        authentication,
        Grant::AuthorizationCode {
            code: &code,
            redirect_uri: redirect_uri.as_str(),
            code_verifier: code_verifier.as_deref(),
        },
    )
    .await
}

/// Requests an access token from the token endpoint.
///
/// With a client secret the request is authorized with it, otherwise the client ID is sent along for PKCE.
pub(crate) async fn request_token(
    http_client: &reqwest::Client,
    accounts_base_url: &Url,
    authentication: &Authentication,
    grant: Grant<'_>,
) -> Result<TokenResponse> {
    let client_id = authentication.client_id().ok_or(Error::MissingCredentials)?;
    let token_url = accounts_base_url
        .join(TOKEN_PATH)
        .map_err(|e| Error::InvalidUrl(e.to_string()))?;

    let mut form = match &grant {
        Grant::AuthorizationCode {
            code, redirect_uri, ..
        } => vec![
            ("grant_type", "authorization_code"),
            ("code", *code),
            ("redirect_uri", *redirect_uri),
        ],
        Grant::RefreshToken(refresh_token) => vec![("grant_type", "refresh_token"), ("refresh_token", *refresh_token)],
    };

    let mut request = http_client.post(token_url);
    match authentication.client_secret() {
        Some(client_secret) => {
            request = request.header(
                header::AUTHORIZATION,
                build_authorization_header(client_id, client_secret),
            );
        }
        None => {
            form.push(("client_id", client_id));
            if let Grant::AuthorizationCode {
                code_verifier: Some(code_verifier),
                ..
            } = &grant
            {
                form.push(("code_verifier", *code_verifier));
            }
        }
    }

    debug!("Requesting access token with {:?}", form.first());
    let response = request.form(&form).send().await?;

    let response = extract_authentication_error(response)
        .await
        .map_err(|e| match grant {
            Grant::AuthorizationCode { .. } => map_authentication_error(e),
            Grant::RefreshToken(_) => map_refresh_token_error(e),
        })?;

    let token_response: TokenResponse = response.json().await?;
    debug!(
        "Got token response: type {}, expires in {}, new refresh token: {}",
        token_response.token_type,
        token_response.expires_in,
        token_response.refresh_token.is_some()
    );

    if !token_response.token_type.eq_ignore_ascii_case("bearer") {
        return Err(Error::InvalidTokenType(token_response.token_type));
    }

    Ok(token_response)
}

async fn extract_authentication_error(response: reqwest::Response) -> Result<reqwest::Response> {
    match response.status() {
        StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED => {
            let body = response.text().await?;
            warn!("Token request failed: {body}");

            match serde_json::from_str::<AuthenticationErrorResponse>(&body) {
                Ok(error_response) => Err(error_response.into_unhandled_error()),
                Err(_) => Err(Error::UnhandledAuthenticationError(AuthenticationErrorKind::Unknown, body)),
            }
        }

        _ => Ok(response.error_for_status()?),
    }
}

fn map_authentication_error(err: Error) -> Error {
    match err {
        Error::UnhandledAuthenticationError(AuthenticationErrorKind::InvalidGrant, _) => Error::InvalidAuthorizationCode,
        Error::UnhandledAuthenticationError(AuthenticationErrorKind::InvalidClient, _) => Error::InvalidClient,
        err => err,
    }
}

fn map_refresh_token_error(err: Error) -> Error {
    match err {
        Error::UnhandledAuthenticationError(AuthenticationErrorKind::InvalidGrant, description) => {
            Error::InvalidRefreshToken(description)
        }
        Error::UnhandledAuthenticationError(AuthenticationErrorKind::InvalidClient, _) => Error::InvalidClient,
        err => err,
    }
}

fn extract_request_target(request: &str) -> Result<&str> {
    let first = request
        .lines()
        .next()
        .ok_or_else(|| Error::MalformedCallback(String::from("empty request")))?;

    let mut parts = first.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some("GET"), Some(target)) if !target.is_empty() => Ok(target),
        _ => Err(Error::MalformedCallback(first.to_owned())),
    }
}

fn parse_callback_target(target: &str) -> Result<CallbackPayload> {
    let url = Url::parse(&format!("http://localhost{target}")).map_err(|e| Error::MalformedCallback(e.to_string()))?;

    let mut payload = CallbackPayload::default();
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => payload.code = Some(value.into_owned()),
            "state" => payload.state = Some(value.into_owned()),
            "error" => payload.error = Some(value.into_owned()),
            _ => {}
        }
    }

    Ok(payload)
}

fn validate_callback(payload: CallbackPayload, expected_state: &str) -> Result<String> {
    if payload.state.as_deref() != Some(expected_state) {
        return Err(Error::AuthorizationCodeStateMismatch);
    }

    if let Some(error) = payload.error {
        return Err(Error::AuthorizationDenied(error));
    }

    payload
        .code
        .ok_or_else(|| Error::MalformedCallback(String::from("missing authorization code")))
}

fn http_response(status: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {status}\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    )
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tokio::net::TcpStream;
    use wiremock::{
        matchers::{body_string_contains, method, path},
        Mock, MockServer, Request, ResponseTemplate,
    };

    use super::*;
    use crate::scope::{Scope, Scopes};

    fn accounts_url(server: &MockServer) -> Url {
        Url::parse(&format!("{}/", server.uri())).unwrap()
    }

    #[test]
    fn default_redirect_uri() {
        assert_eq!(DEFAULT_REDIRECT_URI, "http://localhost:2342/");
    }

    #[test]
    fn random_state_is_alphanumeric() {
        let state = random_string(RANDOM_STATE_LENGTH);

        assert_eq!(state.len(), 16);
        assert!(state.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn pkce_challenge_matches_rfc_example() {
        // RFC 7636 appendix B
        assert_eq!(
            pkce_challenge("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk"),
            "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"
        );
    }

    #[test]
    fn basic_authorization_header() {
        assert_eq!(build_authorization_header("id", "secret"), "Basic aWQ6c2VjcmV0");
    }

    #[test]
    fn authorize_url_has_the_flow_parameters() {
        let base = Url::parse("https://accounts.spotify.com/").unwrap();
        let authentication = Authentication::without_secret(
            "client",
            [Scope::UserReadPlaybackState, Scope::UserModifyPlaybackState],
        )
        .show_dialog(true);

        let url = build_authorize_url(
            &base,
            "client",
            DEFAULT_REDIRECT_URI,
            &authentication,
            "state",
            Some("challenge"),
        )
        .unwrap();
        let query: Vec<(String, String)> = url.query_pairs().into_owned().collect();

        assert_eq!(url.path(), "/authorize");
        assert!(query.contains(&(String::from("response_type"), String::from("code"))));
        assert!(query.contains(&(String::from("redirect_uri"), String::from("http://localhost:2342/"))));
        assert!(query.contains(&(
            String::from("scope"),
            String::from("user-read-playback-state user-modify-playback-state")
        )));
        assert!(query.contains(&(String::from("show_dialog"), String::from("true"))));
        assert!(query.contains(&(String::from("code_challenge_method"), String::from("S256"))));
    }

    #[test]
    fn callback_target_is_parsed() {
        let payload = extract_request_target("GET /?code=abc&state=xyz HTTP/1.1\r\nHost: localhost\r\n\r\n")
            .and_then(parse_callback_target)
            .unwrap();

        assert_eq!(payload.code.as_deref(), Some("abc"));
        assert_eq!(payload.state.as_deref(), Some("xyz"));
    }

    #[test]
    fn callback_validation() {
        let ok = CallbackPayload {
            code: Some(String::from("abc")),
            state: Some(String::from("xyz")),
            error: None,
        };
        assert_eq!(validate_callback(ok, "xyz").unwrap(), "abc");

        let mismatch = CallbackPayload {
            code: Some(String::from("abc")),
            state: Some(String::from("other")),
            error: None,
        };
        assert!(matches!(
            validate_callback(mismatch, "xyz"),
            Err(Error::AuthorizationCodeStateMismatch)
        ));

        let denied = CallbackPayload {
            code: None,
            state: Some(String::from("xyz")),
            error: Some(String::from("access_denied")),
        };
        assert!(matches!(
            validate_callback(denied, "xyz"),
            Err(Error::AuthorizationDenied(reason)) if reason == "access_denied"
        ));
    }

    #[test]
    fn non_get_requests_are_malformed() {
        assert!(matches!(
            extract_request_target("POST / HTTP/1.1\r\n\r\n"),
            Err(Error::MalformedCallback(_))
        ));
    }

    #[tokio::test]
    async fn listener_receives_code_and_replies() {
        let redirect_uri = Url::parse("http://127.0.0.1:0/").unwrap();
        let listener = CallbackListener::bind(&redirect_uri).await.unwrap();
        let port = listener.port().unwrap();

        let waiter = tokio::spawn(async move { listener.wait_for_code("xyz").await });

        // a favicon request first is ignored
        let mut favicon = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
        favicon
            .write_all(b"GET /favicon.ico HTTP/1.1\r\nHost: localhost\r\n\r\n")
            .await
            .unwrap();
        let mut reply = String::new();
        favicon.read_to_string(&mut reply).await.unwrap();
        assert!(reply.starts_with("HTTP/1.1 404"));

        let mut stream = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
        stream
            .write_all(b"GET /?code=the-code&state=xyz HTTP/1.1\r\nHost: localhost\r\n\r\n")
            .await
            .unwrap();
        let mut reply = String::new();
        stream.read_to_string(&mut reply).await.unwrap();

        assert!(reply.starts_with("HTTP/1.1 200 OK"));
        assert!(reply.contains("You can close this page now."));
        assert_eq!(waiter.await.unwrap().unwrap(), "the-code");
    }

    #[tokio::test]
    async fn rejected_authorization_code() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/token"))
            .and(body_string_contains("grant_type=authorization_code"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": "invalid_grant",
                "error_description": "Invalid authorization code"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let result = request_token(
            &reqwest::Client::new(),
            &accounts_url(&server),
            &Authentication::new("id", "secret", Scopes::new()),
            Grant::AuthorizationCode {
                code: "expired",
                redirect_uri: DEFAULT_REDIRECT_URI,
                code_verifier: None,
            },
        )
        .await;

        assert!(matches!(result, Err(Error::InvalidAuthorizationCode)));
    }

    #[tokio::test]
    async fn code_exchange_without_secret_sends_verifier() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/token"))
            .and(body_string_contains("grant_type=authorization_code"))
            .and(body_string_contains("code=the-code"))
            .and(body_string_contains("client_id=id"))
            .and(body_string_contains("code_verifier=verifier"))
            .and(|request: &Request| !request.headers.contains_key("authorization"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "token",
                "token_type": "Bearer",
                "expires_in": 3600,
                "refresh_token": "refresh",
                "scope": ""
            })))
            .expect(1)
            .mount(&server)
            .await;

        let response = request_token(
            &reqwest::Client::new(),
            &accounts_url(&server),
            &Authentication::without_secret("id", Scopes::new()),
            Grant::AuthorizationCode {
                code: "the-code",
                redirect_uri: DEFAULT_REDIRECT_URI,
                code_verifier: Some("verifier"),
            },
        )
        .await
        .unwrap();

        assert_eq!(response.access_token, "token");
        assert_eq!(response.refresh_token.as_deref(), Some("refresh"));
        assert_eq!(response.lifetime(), Duration::from_secs(3600));
    }
}
