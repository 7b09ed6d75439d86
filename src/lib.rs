//! A lazily-loading, caching wrapper for the [Spotify Web API](https://developer.spotify.com/documentation/web-api).
//!
//! Elements in Spotify's catalog, such as tracks, albums and playlists, are handed out as shared handles that know
//! their URI and load the rest of their data the first time it's needed. Loaded elements may be stored in an on-disk
//! cache directory, so a later run reads them from disk instead of asking Spotify again.
//!
//! # Setup
//!
//! 1. Log in to the [Spotify developer dashboard](https://developer.spotify.com/dashboard) and create an
//!    application.
//! 2. Copy the application's *Client ID* and *Client Secret*.
//! 3. In the application's settings, add `http://localhost:2342/` as a redirect URI.
//!
//! The first request the client makes opens the authorization page in a browser. Once you accept, Spotify redirects
//! the browser back to the library, which exchanges the code for an access token. Save the
//! [authentication data](Client::authentication_data) afterwards to skip authorizing the next time.
//!
//! ```no_run
//! use spotifyre::{Authentication, Cacheable, Client, Scope};
//!
//! # async fn foo() -> spotifyre::Result<()> {
//! let authentication = Authentication::new(
//!     "client id",
//!     "client secret",
//!     [Scope::UserReadPrivate, Scope::PlaylistReadPrivate],
//! );
//! let client = Client::new(authentication, Some("cache".into()))?;
//!
//! for playlist in client.user_playlists().await? {
//!     println!("{}", playlist.name().await?);
//! }
//!
//! client.authentication_data().save("authentication.json")?;
//! # Ok(())
//! # }
//! ```

pub mod authentication;
mod authorization;
mod cache;
pub mod client;
mod connection;
pub mod element;
pub mod error;
pub mod model;
pub mod scope;
pub mod uri;
mod util;

pub use crate::{
    authentication::Authentication,
    client::{Client, ClientBuilder, Play, PlayRequestBuilder, SearchResults},
    connection::ConnectionConfig,
    element::{
        Album, Artist, Cacheable, Element, Episode, Me, PlayContext, Playable, Playlist, PlaylistItem, SavedTrack, Show,
        Track, User,
    },
    error::{Error, Result, UriError},
    model::{
        playback::{Context, Device, DeviceType, PlaybackState, PlayingItem, RepeatState},
        Image,
    },
    scope::{Scope, Scopes},
    uri::{ItemType, Uri},
};
