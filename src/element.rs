//! Handles to elements in Spotify's catalog.
//!
//! An element is created knowing only its URI and possibly its name. Its other fields are loaded the first time one of
//! them is asked for, either from the on-disk cache or from the Web API. Elements are shared: asking the client for
//! the same URI twice returns the same handle, and related elements, such as a track's album, are handles as well.
//!
//! ```no_run
//! # use spotifyre::{Authentication, Cacheable, Client, PlayContext};
//! # async fn foo() -> spotifyre::Result<()> {
//! let client = Client::new(Authentication::with_token("token", 0.0), None)?;
//! let album = client.get_album("spotify:album:0tDsHtvN9YNuZjlqHvDY2P")?;
//!
//! // the album is requested here
//! for track in album.tracks().await? {
//!     // and the tracks' names were already known from the album
//!     println!("{}", track.name().await?);
//! }
//! # Ok(())
//! # }
//! ```

mod album;
mod artist;
mod episode;
mod me;
mod playlist;
mod show;
mod track;
mod user;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

pub use self::{
    album::Album,
    artist::Artist,
    episode::Episode,
    me::{Me, SavedTrack},
    playlist::{Playlist, PlaylistItem},
    show::Show,
    track::Track,
    user::User,
};
use crate::{
    cache::{Cache, WeakCache},
    connection::Connection,
    error::{Error, Result},
    model::{object::ElementRef, Image},
    uri::{ItemType, Uri},
};

pub(crate) mod private {
    pub trait Sealed {}
}

/// Every element with an URI.
#[async_trait]
pub trait Cacheable: private::Sealed + Send + Sync {
    fn uri(&self) -> &Uri;

    /// The element's name. Loads the element if the name isn't known yet.
    async fn name(&self) -> Result<String>;
}

/// Elements that can be played on their own: tracks and episodes.
#[async_trait]
pub trait Playable: Cacheable {
    /// The images of the element, or of the album or show it's in.
    async fn images(&self) -> Result<Vec<Image>>;
}

/// Elements that are collections of playable elements: albums, artists, playlists and shows.
#[async_trait]
pub trait PlayContext: Cacheable {
    async fn images(&self) -> Result<Vec<Image>>;
}

/// Loading an element's data from Spotify or the on-disk cache, and storing it back.
#[async_trait]
pub(crate) trait Load: Send + Sync {
    /// The element's data as it's requested and cached.
    type Object: Serialize + DeserializeOwned + Send + 'static;

    /// The name of the element's cache file.
    fn cache_key(&self) -> String;

    fn weak_cache(&self) -> &WeakCache;

    fn is_loaded(&self) -> bool;

    async fn make_request(&self, connection: &Connection) -> Result<Self::Object>;

    /// Checks data read from the on-disk cache is still current before it's loaded.
    fn validate_cached(&self, _object: &Self::Object) -> Result<()> {
        Ok(())
    }

    fn load_object(&self, object: Self::Object, cache: &Cache) -> Result<()>;

    /// The loaded data, or `None` if the element hasn't been loaded.
    fn to_object(&self) -> Option<Self::Object>;
}

/// A handle to any element.
#[derive(Debug, Clone)]
pub enum Element {
    Track(Arc<Track>),
    Episode(Arc<Episode>),
    Album(Arc<Album>),
    Artist(Arc<Artist>),
    Playlist(Arc<Playlist>),
    Show(Arc<Show>),
    User(Arc<User>),
}

impl Element {
    pub(crate) fn new(uri: Uri, cache: WeakCache) -> Self {
        match uri.item_type() {
            ItemType::Track => Element::Track(Arc::new(Track::new(uri, cache))),
            ItemType::Episode => Element::Episode(Arc::new(Episode::new(uri, cache))),
            ItemType::Album => Element::Album(Arc::new(Album::new(uri, cache))),
            ItemType::Artist => Element::Artist(Arc::new(Artist::new(uri, cache))),
            ItemType::Playlist => Element::Playlist(Arc::new(Playlist::new(uri, cache))),
            ItemType::Show => Element::Show(Arc::new(Show::new(uri, cache))),
            ItemType::User => Element::User(Arc::new(User::new(uri, cache))),
        }
    }

    pub fn uri(&self) -> &Uri {
        match self {
            Element::Track(track) => track.uri(),
            Element::Episode(episode) => episode.uri(),
            Element::Album(album) => album.uri(),
            Element::Artist(artist) => artist.uri(),
            Element::Playlist(playlist) => playlist.uri(),
            Element::Show(show) => show.uri(),
            Element::User(user) => user.uri(),
        }
    }

    pub fn item_type(&self) -> ItemType {
        self.uri().item_type()
    }

    pub async fn name(&self) -> Result<String> {
        match self {
            Element::Track(track) => track.name().await,
            Element::Episode(episode) => episode.name().await,
            Element::Album(album) => album.name().await,
            Element::Artist(artist) => artist.name().await,
            Element::Playlist(playlist) => playlist.name().await,
            Element::Show(show) => show.name().await,
            Element::User(user) => user.name().await,
        }
    }

    pub fn as_track(&self) -> Option<&Arc<Track>> {
        match self {
            Element::Track(track) => Some(track),
            _ => None,
        }
    }

    pub fn as_episode(&self) -> Option<&Arc<Episode>> {
        match self {
            Element::Episode(episode) => Some(episode),
            _ => None,
        }
    }

    /// Whether the handles point to the very same element.
    pub fn ptr_eq(&self, other: &Element) -> bool {
        match (self, other) {
            (Element::Track(a), Element::Track(b)) => Arc::ptr_eq(a, b),
            (Element::Episode(a), Element::Episode(b)) => Arc::ptr_eq(a, b),
            (Element::Album(a), Element::Album(b)) => Arc::ptr_eq(a, b),
            (Element::Artist(a), Element::Artist(b)) => Arc::ptr_eq(a, b),
            (Element::Playlist(a), Element::Playlist(b)) => Arc::ptr_eq(a, b),
            (Element::Show(a), Element::Show(b)) => Arc::ptr_eq(a, b),
            (Element::User(a), Element::User(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Sets the element's name if it isn't known yet.
    pub(crate) fn seed_name(&self, name: &str) {
        match self {
            Element::Track(track) => track.seed_name(name),
            Element::Episode(episode) => episode.seed_name(name),
            Element::Album(album) => album.seed_name(name),
            Element::Artist(artist) => artist.seed_name(name),
            Element::Playlist(playlist) => playlist.seed_name(name),
            Element::Show(show) => show.seed_name(name),
            Element::User(user) => user.seed_name(name),
        }
    }

    pub(crate) fn reference(&self) -> ElementRef {
        match self {
            Element::Track(track) => track.reference(),
            Element::Episode(episode) => episode.reference(),
            Element::Album(album) => album.reference(),
            Element::Artist(artist) => artist.reference(),
            Element::Playlist(playlist) => playlist.reference(),
            Element::Show(show) => show.reference(),
            Element::User(user) => user.reference(),
        }
    }
}

/// Returns a field of an element, loading the element first if the field isn't known.
pub(crate) async fn lazy_field<E, T, F>(element: &E, field: F) -> Result<T>
where
    E: Load,
    F: Fn(&E) -> Option<T> + Send + Sync,
    T: Send,
{
    if let Some(value) = field(element) {
        return Ok(value);
    }

    let cache = element.weak_cache().upgrade()?;
    cache.load(element).await?;

    field(element).ok_or_else(|| Error::ElementOutdated(element.cache_key()))
}

/// Data for an element must be about the element itself.
pub(crate) fn check_uri(expected: &Uri, actual: &Uri) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(Error::ElementOutdated(expected.to_string()))
    }
}

fn set_if_unknown(name: &mut Option<String>, new: &str) {
    if name.is_none() {
        *name = Some(new.to_owned());
    }
}
