use dotenvy::dotenv;
use spotifyre::{Authentication, Cacheable, Client, Scope};

const AUTHENTICATION_FILE: &str = "authentication.json";

#[tokio::main]
async fn main() {
    dotenv().ok();
    env_logger::init();

    // reuse the tokens from an earlier run if there are any
    let authentication = Authentication::load(AUTHENTICATION_FILE).unwrap_or_else(|_| {
        Authentication::new(
            std::env::var("CLIENT_ID").expect("Spotify client ID not in environment"),
            std::env::var("CLIENT_SECRET").expect("Spotify client secret not in environment"),
            [Scope::UserReadPrivate, Scope::UserLibraryRead],
        )
        .show_dialog(true)
    });

    let client = Client::new(authentication, None).expect("failed to build Spotify client");

    let me = client.me();
    println!(
        "Logged in as {}",
        me.user()
            .await
            .expect("failed to get current user")
            .name()
            .await
            .expect("failed to get user name")
    );

    for saved in me.tracks().await.expect("failed to get saved tracks").iter().take(10) {
        println!(
            "{} (saved {})",
            saved.track().name().await.expect("failed to get track name"),
            saved.added_at().unwrap_or("a long time ago")
        );
    }

    // the access token may have been refreshed, so save whatever the client has now
    client
        .authentication_data()
        .save(AUTHENTICATION_FILE)
        .expect("failed to save authentication");
}
