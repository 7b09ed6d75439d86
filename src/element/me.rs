use std::sync::{Arc, RwLock, RwLockReadGuard};

use async_trait::async_trait;

use super::{lazy_field, user::PLAYLISTS_PAGE_LIMIT, Cacheable, Load, Playlist, Track, User};
use crate::{
    cache::{Cache, WeakCache},
    connection::Connection,
    error::Result,
    model::{
        object::{MeObject, PlaylistRef, SavedTrackObject, UserProfileObject},
        page::Page,
    },
    uri::Uri,
};

const SAVED_TRACKS_PAGE_LIMIT: &str = "50";

/// The current user: the one who authorized the client.
///
/// Unlike other elements, the current user's URI isn't known before it's loaded.
#[derive(Debug)]
pub struct Me {
    cache: WeakCache,
    state: RwLock<Option<MeData>>,
}

/// A track in the current user's library.
#[derive(Debug, Clone)]
pub struct SavedTrack {
    track: Arc<Track>,
    added_at: Option<String>,
}

#[derive(Debug)]
struct MeData {
    uri: Uri,
    display_name: Option<String>,
    playlists: Vec<Arc<Playlist>>,
    tracks: Vec<SavedTrack>,
}

impl Me {
    pub(crate) fn new(cache: WeakCache) -> Self {
        Self {
            cache,
            state: RwLock::default(),
        }
    }

    pub async fn uri(&self) -> Result<Uri> {
        lazy_field(self, |me| me.read().as_ref().map(|data| data.uri.clone())).await
    }

    pub async fn display_name(&self) -> Result<Option<String>> {
        lazy_field(self, |me| me.read().as_ref().map(|data| data.display_name.clone())).await
    }

    /// The current user as a regular user element.
    pub async fn user(&self) -> Result<Arc<User>> {
        let uri = self.uri().await?;
        let display_name = self.display_name().await?;

        self.cache.upgrade()?.get_user(&uri, display_name.as_deref())
    }

    /// The playlists the current user owns or follows.
    pub async fn playlists(&self) -> Result<Vec<Arc<Playlist>>> {
        lazy_field(self, |me| me.read().as_ref().map(|data| data.playlists.clone())).await
    }

    /// The tracks in the current user's library, most recently saved first.
    pub async fn tracks(&self) -> Result<Vec<SavedTrack>> {
        lazy_field(self, |me| me.read().as_ref().map(|data| data.tracks.clone())).await
    }

    fn read(&self) -> RwLockReadGuard<'_, Option<MeData>> {
        self.state.read().expect("me state rwlock poisoned")
    }
}

impl SavedTrack {
    pub fn track(&self) -> &Arc<Track> {
        &self.track
    }

    /// When the track was saved, as an ISO 8601 timestamp.
    pub fn added_at(&self) -> Option<&str> {
        self.added_at.as_deref()
    }
}

#[async_trait]
impl Load for Me {
    type Object = MeObject;

    fn cache_key(&self) -> String {
        Cache::me_cache_key()
    }

    fn weak_cache(&self) -> &WeakCache {
        &self.cache
    }

    fn is_loaded(&self) -> bool {
        self.read().is_some()
    }

    async fn make_request(&self, connection: &Connection) -> Result<MeObject> {
        let profile: UserProfileObject = connection.get(connection.build_endpoint("me", &[])?).await?;

        let playlists_url =
            connection.build_endpoint("me/playlists", &[("limit", Some(String::from(PLAYLISTS_PAGE_LIMIT)))])?;
        let playlists: Vec<PlaylistRef> = connection.get_paged(playlists_url).await?;

        let tracks_url =
            connection.build_endpoint("me/tracks", &[("limit", Some(String::from(SAVED_TRACKS_PAGE_LIMIT)))])?;
        let tracks: Vec<SavedTrackObject> = connection.get_paged(tracks_url).await?;

        Ok(MeObject {
            uri: profile.uri,
            display_name: profile.display_name,
            playlists: Page::complete(playlists),
            tracks: Page::complete(tracks),
        })
    }

    fn load_object(&self, object: MeObject, cache: &Cache) -> Result<()> {
        let playlists = object
            .playlists
            .items
            .iter()
            .map(|playlist| cache.get_playlist(&playlist.uri, playlist.name.as_deref(), playlist.snapshot_id.as_deref()))
            .collect::<Result<Vec<_>>>()?;
        let tracks = object
            .tracks
            .items
            .into_iter()
            .map(|saved| {
                Ok(SavedTrack {
                    track: cache.get_track(&saved.track.uri, saved.track.name.as_deref())?,
                    added_at: saved.added_at,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        *self.state.write().expect("me state rwlock poisoned") = Some(MeData {
            uri: object.uri,
            display_name: object.display_name,
            playlists,
            tracks,
        });

        Ok(())
    }

    fn to_object(&self) -> Option<MeObject> {
        let state = self.read();
        let data = state.as_ref()?;

        Some(MeObject {
            uri: data.uri.clone(),
            display_name: data.display_name.clone(),
            playlists: Page::complete(
                data.playlists
                    .iter()
                    .map(|playlist| PlaylistRef {
                        uri: playlist.uri().clone(),
                        name: playlist.known_name(),
                        snapshot_id: playlist.known_snapshot_id(),
                    })
                    .collect(),
            ),
            tracks: Page::complete(
                data.tracks
                    .iter()
                    .map(|saved| SavedTrackObject {
                        added_at: saved.added_at.clone(),
                        track: saved.track.reference(),
                    })
                    .collect(),
            ),
        })
    }
}
