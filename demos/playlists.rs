use dotenvy::dotenv;
use spotifyre::{Authentication, Cacheable, Client, Scope};

#[tokio::main]
async fn main() {
    dotenv().ok();
    env_logger::init();

    let authentication = Authentication::new(
        std::env::var("CLIENT_ID").expect("Spotify client ID not in environment"),
        std::env::var("CLIENT_SECRET").expect("Spotify client secret not in environment"),
        [Scope::PlaylistReadPrivate, Scope::PlaylistReadCollaborative],
    );
    let client = Client::new(authentication, std::env::var("SPOTIFY_CACHE_DIR").ok().map(Into::into))
        .expect("failed to build Spotify client");

    // every playlist is cached after the first run, until its snapshot changes
    for playlist in client.user_playlists().await.expect("failed to get playlists") {
        let items = playlist.items().await.expect("failed to get playlist items");
        let owner = playlist.owner().await.expect("failed to get playlist owner");

        println!(
            "{} by {} ({} items)",
            playlist.name().await.expect("failed to get playlist name"),
            owner.name().await.expect("failed to get owner name"),
            items.len()
        );

        for item in playlist.search(&["love"]).await.expect("failed to search playlist") {
            println!("    {}", item.name().await.expect("failed to get item name"));
        }
    }
}
