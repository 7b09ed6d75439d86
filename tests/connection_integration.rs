use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use spotifyre::{model::error::AuthenticationErrorKind, Authentication, Cacheable, Client, Error, Scopes};

// 2100-01-01
const FAR_FUTURE: f64 = 4102444800.0;

const TRACK_URI: &str = "spotify:track:2pDPOMX0kWA7kcPBcDCQBu";

fn build_client(server: &MockServer, authentication: Authentication) -> Client {
    let _ = env_logger::builder().is_test(true).try_init();

    Client::builder(authentication)
        .api_base_url(server.uri())
        .accounts_base_url(server.uri())
        .open_browser(false)
        .build()
        .unwrap()
}

fn track_response() -> serde_json::Value {
    json!({
        "uri": TRACK_URI,
        "name": "Song",
        "duration_ms": 215000,
        "album": {"uri": "spotify:album:0tDsHtvN9YNuZjlqHvDY2P", "name": "Record"},
        "artists": [{"uri": "spotify:artist:6pNgnvzBa6Bthsv8SrZJYl", "name": "Band"}]
    })
}

#[tokio::test]
async fn test_no_content_is_none() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/me/player"))
        .and(header("authorization", "Bearer token"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = build_client(&server, Authentication::with_token("token", FAR_FUTURE));

    assert!(client.playing().await.unwrap().is_none());
}

#[tokio::test]
async fn test_rate_limit_is_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/tracks/2pDPOMX0kWA7kcPBcDCQBu"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/tracks/2pDPOMX0kWA7kcPBcDCQBu"))
        .respond_with(ResponseTemplate::new(200).set_body_json(track_response()))
        .expect(1)
        .mount(&server)
        .await;

    let client = build_client(&server, Authentication::with_token("token", FAR_FUTURE));
    let track = client.get_track(TRACK_URI).unwrap();

    assert_eq!(track.name().await.unwrap(), "Song");
}

#[tokio::test]
async fn test_rate_limit_gives_up_after_retries() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/tracks/2pDPOMX0kWA7kcPBcDCQBu"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
        .expect(3)
        .mount(&server)
        .await;

    let client = Client::builder(Authentication::with_token("token", FAR_FUTURE))
        .api_base_url(server.uri())
        .max_retries(2)
        .build()
        .unwrap();
    let track = client.get_track(TRACK_URI).unwrap();

    assert!(matches!(track.name().await, Err(Error::RateLimit(0))));
}

#[tokio::test]
async fn test_expired_token_is_refreshed() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/tracks/2pDPOMX0kWA7kcPBcDCQBu"))
        .and(header("authorization", "Bearer old"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"status": 401, "message": "The access token expired"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "new",
            "token_type": "Bearer",
            "expires_in": 3600,
            "scope": "user-read-private"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/tracks/2pDPOMX0kWA7kcPBcDCQBu"))
        .and(header("authorization", "Bearer new"))
        .respond_with(ResponseTemplate::new(200).set_body_json(track_response()))
        .expect(1)
        .mount(&server)
        .await;

    let authentication: Authentication = serde_json::from_value(json!({
        "client_id": "id",
        "client_secret": "secret",
        "refresh_token": "refresh",
        "token": "old",
        "token_expires": FAR_FUTURE
    }))
    .unwrap();

    let client = build_client(&server, authentication);
    let track = client.get_track(TRACK_URI).unwrap();

    assert_eq!(track.name().await.unwrap(), "Song");

    let authentication = client.authentication_data();
    assert_eq!(authentication.token(), Some("new"));
    assert_eq!(authentication.refresh_token(), Some("refresh"));
}

#[tokio::test]
async fn test_rejected_token_without_credentials() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/tracks/2pDPOMX0kWA7kcPBcDCQBu"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"status": 401, "message": "Invalid access token"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = build_client(&server, Authentication::with_token("token", FAR_FUTURE));
    let track = client.get_track(TRACK_URI).unwrap();

    match track.name().await {
        Err(Error::InvalidToken(message)) => assert_eq!(message, "Invalid access token"),
        other => panic!("expected InvalidToken, got {other:?}"),
    }
}

#[tokio::test]
async fn test_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/tracks/2pDPOMX0kWA7kcPBcDCQBu"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {"status": 404, "message": "Non existing id"}
        })))
        .mount(&server)
        .await;

    let client = build_client(&server, Authentication::with_token("token", FAR_FUTURE));
    let track = client.get_track(TRACK_URI).unwrap();

    match track.name().await {
        Err(Error::NotFound(message)) => assert_eq!(message, "Non existing id"),
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unhandled_status() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/me/player/pause"))
        .respond_with(ResponseTemplate::new(418))
        .mount(&server)
        .await;

    let client = build_client(&server, Authentication::with_token("token", FAR_FUTURE));

    assert!(matches!(
        client.pause(None).await,
        Err(Error::UnhandledSpotifyResponseStatusCode(418))
    ));
}

#[tokio::test]
async fn test_missing_credentials() {
    let server = MockServer::start().await;
    let client = build_client(&server, Authentication::default());
    let track = client.get_track(TRACK_URI).unwrap();

    assert!(matches!(track.name().await, Err(Error::MissingCredentials)));
}

async fn mount_track(server: &MockServer, token: &str) {
    Mock::given(method("GET"))
        .and(path("/tracks/2pDPOMX0kWA7kcPBcDCQBu"))
        .and(header("authorization", format!("Bearer {token}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(track_response()))
        .mount(server)
        .await;
}

async fn mount_token_response(server: &MockServer, response: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .respond_with(response)
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_service_unavailable_is_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/tracks/2pDPOMX0kWA7kcPBcDCQBu"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    mount_track(&server, "token").await;

    let client = build_client(&server, Authentication::with_token("token", FAR_FUTURE));
    let track = client.get_track(TRACK_URI).unwrap();

    assert_eq!(track.name().await.unwrap(), "Song");
}

#[tokio::test]
async fn test_service_unavailable_gives_up_after_retries() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/tracks/2pDPOMX0kWA7kcPBcDCQBu"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&server)
        .await;

    let client = Client::builder(Authentication::with_token("token", FAR_FUTURE))
        .api_base_url(server.uri())
        .max_retries(1)
        .build()
        .unwrap();
    let track = client.get_track(TRACK_URI).unwrap();

    assert!(matches!(track.name().await, Err(Error::ServiceUnavailable)));
}

#[tokio::test]
async fn test_revoked_refresh_token() {
    let server = MockServer::start().await;
    mount_token_response(
        &server,
        ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Refresh token revoked"
        })),
    )
    .await;

    let authentication = Authentication::new("id", "secret", Scopes::new()).with_refresh_token("revoked");
    let client = build_client(&server, authentication);
    let track = client.get_track(TRACK_URI).unwrap();

    match track.name().await {
        Err(Error::InvalidRefreshToken(description)) => assert_eq!(description, "Refresh token revoked"),
        other => panic!("expected InvalidRefreshToken, got {other:?}"),
    }
}

#[tokio::test]
async fn test_invalid_client() {
    let server = MockServer::start().await;
    mount_token_response(
        &server,
        ResponseTemplate::new(401).set_body_json(json!({
            "error": "invalid_client",
            "error_description": "Invalid client secret"
        })),
    )
    .await;

    let authentication = Authentication::new("id", "wrong", Scopes::new()).with_refresh_token("refresh");
    let client = build_client(&server, authentication);
    let track = client.get_track(TRACK_URI).unwrap();

    assert!(matches!(track.name().await, Err(Error::InvalidClient)));
}

#[tokio::test]
async fn test_unknown_token_error_keeps_the_body() {
    let server = MockServer::start().await;
    mount_token_response(&server, ResponseTemplate::new(400).set_body_string("upstream failure")).await;

    let authentication = Authentication::new("id", "secret", Scopes::new()).with_refresh_token("refresh");
    let client = build_client(&server, authentication);
    let track = client.get_track(TRACK_URI).unwrap();

    match track.name().await {
        Err(Error::UnhandledAuthenticationError(AuthenticationErrorKind::Unknown, body)) => {
            assert_eq!(body, "upstream failure")
        }
        other => panic!("expected UnhandledAuthenticationError, got {other:?}"),
    }
}

#[tokio::test]
async fn test_non_bearer_token_is_rejected() {
    let server = MockServer::start().await;
    mount_token_response(
        &server,
        ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "new",
            "token_type": "MAC",
            "expires_in": 3600
        })),
    )
    .await;

    let authentication = Authentication::new("id", "secret", Scopes::new()).with_refresh_token("refresh");
    let client = build_client(&server, authentication);
    let track = client.get_track(TRACK_URI).unwrap();

    match track.name().await {
        Err(Error::InvalidTokenType(token_type)) => assert_eq!(token_type, "MAC"),
        other => panic!("expected InvalidTokenType, got {other:?}"),
    }
    assert_eq!(client.authentication_data().token(), None);
}

#[tokio::test]
async fn test_refresh_with_secret_uses_basic_authorization() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/token"))
        // base64 of "id:secret"
        .and(header("authorization", "Basic aWQ6c2VjcmV0"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(|request: &Request| !String::from_utf8_lossy(&request.body).contains("client_id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "new",
            "token_type": "Bearer",
            "expires_in": 3600,
            "refresh_token": "rotated"
        })))
        .expect(1)
        .mount(&server)
        .await;
    mount_track(&server, "new").await;

    let authentication = Authentication::new("id", "secret", Scopes::new()).with_refresh_token("refresh");
    let client = build_client(&server, authentication);
    let track = client.get_track(TRACK_URI).unwrap();

    assert_eq!(track.name().await.unwrap(), "Song");

    let authentication = client.authentication_data();
    assert_eq!(authentication.token(), Some("new"));
    assert_eq!(authentication.refresh_token(), Some("rotated"));
    assert!(!client.is_expired());
}

#[tokio::test]
async fn test_refresh_without_secret_sends_client_id() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=refresh"))
        .and(body_string_contains("client_id=id"))
        .and(|request: &Request| !request.headers.contains_key("authorization"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "new",
            "token_type": "bearer",
            "expires_in": 3600
        })))
        .expect(1)
        .mount(&server)
        .await;
    mount_track(&server, "new").await;

    let authentication = Authentication::without_secret("id", Scopes::new()).with_refresh_token("refresh");
    let client = build_client(&server, authentication);
    let track = client.get_track(TRACK_URI).unwrap();

    assert_eq!(track.name().await.unwrap(), "Song");

    // the refresh token is kept when the response doesn't carry a new one
    assert_eq!(client.authentication_data().refresh_token(), Some("refresh"));
}
