use dotenvy::dotenv;
use spotifyre::{Authentication, Cacheable, Client, ItemType, Scopes};

#[tokio::main]
async fn main() {
    dotenv().ok();
    env_logger::init();

    let authentication = Authentication::new(
        std::env::var("CLIENT_ID").expect("Spotify client ID not in environment"),
        std::env::var("CLIENT_SECRET").expect("Spotify client secret not in environment"),
        Scopes::new(),
    );
    let client = Client::new(authentication, std::env::var("SPOTIFY_CACHE_DIR").ok().map(Into::into))
        .expect("failed to build Spotify client");

    let results = client
        .search("hatsune miku", &[ItemType::Track, ItemType::Artist], Some(10), None)
        .await
        .unwrap();

    println!("Tracks:");
    for track in &results.tracks {
        let artists = track.artists().await.unwrap();
        println!(
            "{} - {} ({}) [{}]",
            track.name().await.unwrap(),
            artists.first().unwrap().name().await.unwrap(),
            track.album().await.unwrap().name().await.unwrap(),
            track.uri(),
        );
    }

    println!("\nArtists:");
    for artist in &results.artists {
        println!(
            "{} [{}]",
            artist.name().await.unwrap(),
            artist.genres().await.unwrap().join(", ")
        );
    }
}
