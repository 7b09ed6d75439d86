use std::{sync::Arc, time::Duration};

use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use spotifyre::{Authentication, Cacheable, Client, Error, PlayContext, UriError};

// 2100-01-01
const FAR_FUTURE: f64 = 4102444800.0;

fn build_client(server: &MockServer) -> Client {
    let _ = env_logger::builder().is_test(true).try_init();

    Client::builder(Authentication::with_token("token", FAR_FUTURE))
        .api_base_url(server.uri())
        .build()
        .unwrap()
}

fn track_ref(id: &str, name: &str) -> serde_json::Value {
    json!({"uri": format!("spotify:track:{id}"), "name": name})
}

#[tokio::test]
async fn test_lazy_field_is_requested_once() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/tracks/2pDPOMX0kWA7kcPBcDCQBu"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "uri": "spotify:track:2pDPOMX0kWA7kcPBcDCQBu",
            "name": "Song",
            "duration_ms": 215000,
            "album": {"uri": "spotify:album:0tDsHtvN9YNuZjlqHvDY2P", "name": "Record"},
            "artists": [{"uri": "spotify:artist:6pNgnvzBa6Bthsv8SrZJYl", "name": "Band"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = build_client(&server);
    let track = client.get_track("spotify:track:2pDPOMX0kWA7kcPBcDCQBu").unwrap();

    assert_eq!(track.duration().await.unwrap(), Duration::from_millis(215000));
    assert_eq!(track.name().await.unwrap(), "Song");

    // related elements are handles with their names already known
    let album = track.album().await.unwrap();
    assert_eq!(album.name().await.unwrap(), "Record");
    assert!(Arc::ptr_eq(
        &album,
        &client.get_album("spotify:album:0tDsHtvN9YNuZjlqHvDY2P").unwrap()
    ));

    let artists = track.artists().await.unwrap();
    assert_eq!(artists.len(), 1);
    assert_eq!(artists[0].name().await.unwrap(), "Band");
}

#[tokio::test]
async fn test_album_tracks_follow_pages() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/albums/0tDsHtvN9YNuZjlqHvDY2P"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "uri": "spotify:album:0tDsHtvN9YNuZjlqHvDY2P",
            "name": "Record",
            "artists": [{"uri": "spotify:artist:6pNgnvzBa6Bthsv8SrZJYl", "name": "Band"}],
            "images": [{"url": "https://i.scdn.co/image/cover", "width": 640, "height": 640}],
            "tracks": {
                "items": [track_ref("0000000000000000000001", "One"), track_ref("0000000000000000000002", "Two")],
                "next": format!("{}/albums/0tDsHtvN9YNuZjlqHvDY2P/tracks?offset=2&limit=2", server.uri()),
                "limit": 2,
                "offset": 0,
                "total": 3
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/albums/0tDsHtvN9YNuZjlqHvDY2P/tracks"))
        .and(query_param("offset", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [track_ref("0000000000000000000003", "Three")],
            "next": null,
            "limit": 2,
            "offset": 2,
            "total": 3
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = build_client(&server);
    let album = client.get_album("spotify:album:0tDsHtvN9YNuZjlqHvDY2P").unwrap();

    let tracks = album.tracks().await.unwrap();
    let mut names = Vec::new();
    for track in &tracks {
        names.push(track.name().await.unwrap());
    }

    assert_eq!(names, ["One", "Two", "Three"]);
    assert_eq!(album.images().await.unwrap()[0].url, "https://i.scdn.co/image/cover");
    assert!(Arc::ptr_eq(
        &tracks[2],
        &client.get_track("spotify:track:0000000000000000000003").unwrap()
    ));
}

#[tokio::test]
async fn test_playlist_search_requires_every_needle() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/playlists/37i9dQZF1DXcBWIGoYBM5M"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "uri": "spotify:playlist:37i9dQZF1DXcBWIGoYBM5M",
            "name": "Mix",
            "description": null,
            "owner": {"uri": "spotify:user:spotify", "display_name": "Spotify"},
            "snapshot_id": "snapshot",
            "public": true,
            "images": null,
            "tracks": {
                "items": [
                    {"added_at": "2020-01-01T00:00:00Z", "track": track_ref("0000000000000000000001", "Hello World")},
                    {"added_at": "2020-01-02T00:00:00Z", "track": track_ref("0000000000000000000002", "Hello There")},
                    {"added_at": "2020-01-03T00:00:00Z", "track": null},
                    {"added_at": "2020-01-04T00:00:00Z", "track": track_ref("0000000000000000000003", "Goodbye world")}
                ],
                "next": null,
                "limit": 100,
                "offset": 0,
                "total": 4
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = build_client(&server);
    let playlist = client.get_playlist("spotify:playlist:37i9dQZF1DXcBWIGoYBM5M").unwrap();

    assert_eq!(playlist.items().await.unwrap().len(), 3);

    let found = playlist.search(&["hello", "WORLD"]).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name().await.unwrap(), "Hello World");

    let world = playlist.search(&["world"]).await.unwrap();
    assert_eq!(world.len(), 2);

    let owner = playlist.owner().await.unwrap();
    assert_eq!(owner.display_name().await.unwrap().as_deref(), Some("Spotify"));
}

#[tokio::test]
async fn test_me_collects_playlists_and_saved_tracks() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "uri": "spotify:user:someone",
            "display_name": "Someone",
            "country": "FI"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/me/playlists"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{"uri": "spotify:playlist:37i9dQZF1DXcBWIGoYBM5M", "name": "Mix", "snapshot_id": "snapshot"}],
            "next": null
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/me/tracks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{"added_at": "2021-05-01T12:00:00Z", "track": track_ref("0000000000000000000001", "Saved")}],
            "next": null
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = build_client(&server);

    let playlists = client.user_playlists().await.unwrap();
    assert_eq!(playlists.len(), 1);
    assert_eq!(playlists[0].name().await.unwrap(), "Mix");

    let me = client.me();
    assert_eq!(me.uri().await.unwrap().to_string(), "spotify:user:someone");

    let saved = me.tracks().await.unwrap();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].added_at(), Some("2021-05-01T12:00:00Z"));
    assert_eq!(saved[0].track().name().await.unwrap(), "Saved");

    let user = me.user().await.unwrap();
    assert_eq!(user.name().await.unwrap(), "Someone");
}

#[tokio::test]
async fn test_user_requests_stay_in_the_user_path() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/some.user-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "uri": "spotify:user:some.user-1",
            "display_name": null
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/users/some.user-1/playlists"))
        .and(query_param("limit", "50"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{"uri": "spotify:playlist:37i9dQZF1DXcBWIGoYBM5M", "name": "Mix", "snapshot_id": "snapshot"}],
            "next": null
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = build_client(&server);

    // a fragment or an escape in the ID would send the requests somewhere else
    assert!(matches!(
        client.get_user("spotify:user:alice#bob"),
        Err(Error::Uri(UriError::InvalidId(_)))
    ));
    assert!(matches!(
        client.get_user("spotify:user:alice%2Fplaylists"),
        Err(Error::Uri(UriError::InvalidId(_)))
    ));

    let user = client.get_user("spotify:user:some.user-1").unwrap();
    let playlists = user.playlists().await.unwrap();

    assert_eq!(playlists.len(), 1);
    assert_eq!(playlists[0].name().await.unwrap(), "Mix");
    assert_eq!(user.name().await.unwrap(), "some.user-1");
}
