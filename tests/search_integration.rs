use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use spotifyre::{Authentication, Cacheable, Client, Element, Error, ItemType};

// 2100-01-01
const FAR_FUTURE: f64 = 4102444800.0;

fn build_client(server: &MockServer) -> Client {
    let _ = env_logger::builder().is_test(true).try_init();

    Client::builder(Authentication::with_token("token", FAR_FUTURE))
        .api_base_url(server.uri())
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_search_loads_complete_results() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "hatsune miku"))
        .and(query_param("type", "track,album"))
        .and(query_param("limit", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tracks": {
                "items": [
                    {
                        "uri": "spotify:track:2pDPOMX0kWA7kcPBcDCQBu",
                        "name": "Song",
                        "duration_ms": 215000,
                        "album": {"uri": "spotify:album:0tDsHtvN9YNuZjlqHvDY2P", "name": "Record"},
                        "artists": [{"uri": "spotify:artist:6pNgnvzBa6Bthsv8SrZJYl", "name": "Band"}]
                    },
                    null
                ],
                "next": null,
                "limit": 2,
                "offset": 0,
                "total": 1
            },
            "albums": {
                "items": [
                    {"uri": "spotify:album:0tDsHtvN9YNuZjlqHvDY2P", "name": "Record", "album_type": "album"}
                ],
                "next": null
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    // the album is partial in search results and is requested when its tracks are asked for
    Mock::given(method("GET"))
        .and(path("/albums/0tDsHtvN9YNuZjlqHvDY2P"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "uri": "spotify:album:0tDsHtvN9YNuZjlqHvDY2P",
            "name": "Record",
            "artists": [],
            "images": [],
            "tracks": {"items": [{"uri": "spotify:track:2pDPOMX0kWA7kcPBcDCQBu", "name": "Song"}], "next": null}
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/tracks/2pDPOMX0kWA7kcPBcDCQBu"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let client = build_client(&server);
    let results = client
        .search("hatsune miku", &[ItemType::Track, ItemType::Album], Some(2), None)
        .await
        .unwrap();

    assert_eq!(results.tracks.len(), 1);
    assert_eq!(results.albums.len(), 1);
    assert!(results.playlists.is_empty());

    let track = &results.tracks[0];
    assert_eq!(track.duration().await.unwrap(), Duration::from_millis(215000));
    assert_eq!(results.albums[0].name().await.unwrap(), "Record");

    let album_tracks = results.albums[0].tracks().await.unwrap();
    assert!(std::sync::Arc::ptr_eq(&album_tracks[0], track));
}

#[tokio::test]
async fn test_search_playable_puts_tracks_first() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("type", "track,episode"))
        .and(query_param("limit", "5"))
        .and(query_param("offset", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tracks": {
                "items": [{"uri": "spotify:track:2pDPOMX0kWA7kcPBcDCQBu", "name": "Song"}],
                "next": null
            },
            "episodes": {
                "items": [{"uri": "spotify:episode:512ojhOuo1ktJprKbVcKyQ", "name": "Episode"}],
                "next": null
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = build_client(&server);
    let playable = client.search_playable("something", Some(5), Some(10)).await.unwrap();

    assert_eq!(playable.len(), 2);
    assert!(matches!(playable[0], Element::Track(_)));
    assert!(matches!(playable[1], Element::Episode(_)));
    assert_eq!(playable[1].name().await.unwrap(), "Episode");
}

#[tokio::test]
async fn test_users_cannot_be_searched() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let client = build_client(&server);

    assert!(matches!(
        client.search("someone", &[ItemType::User], None, None).await,
        Err(Error::BadRequest(_))
    ));
}
