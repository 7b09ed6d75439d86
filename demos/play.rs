use dotenvy::dotenv;
use spotifyre::{Authentication, Cacheable, Client, Play, Playable, Scope};

#[tokio::main]
async fn main() {
    dotenv().ok();
    env_logger::init();

    let authentication = Authentication::new(
        std::env::var("CLIENT_ID").expect("Spotify client ID not in environment"),
        std::env::var("CLIENT_SECRET").expect("Spotify client secret not in environment"),
        [Scope::UserModifyPlaybackState, Scope::UserReadPlaybackState],
    );
    let client = Client::new(authentication, std::env::var("SPOTIFY_CACHE_DIR").ok().map(Into::into))
        .expect("failed to build Spotify client");

    let devices = client.devices().await.expect("failed to get devices");
    for device in &devices {
        println!("{} ({:?}){}", device.name(), device.device_type(), if device.is_active() { " *" } else { "" });
    }

    let track = client
        .get_track("spotify:track:3mXLyNsVeLelMakgpGUp1f")
        .expect("failed to parse track URI");

    client
        .play(Play::items([track.uri()]))
        .send()
        .await
        .expect("failed to play track");

    println!(
        "Playing {} from {}",
        track.name().await.expect("failed to get track name"),
        track
            .album()
            .await
            .expect("failed to get album")
            .name()
            .await
            .expect("failed to get album name")
    );

    if let Some(image) = track.images().await.expect("failed to get images").first() {
        println!("Cover: {}", image.url);
    }

    if let Some(state) = client.playing().await.expect("failed to get playback state") {
        println!("On {}, shuffle {}", state.device().name(), state.shuffle_state());
    }
}
