use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use log::debug;

use super::{check_uri, lazy_field, private, set_if_unknown, Cacheable, Element, Load, PlayContext, Track, User};
use crate::{
    cache::{Cache, WeakCache},
    connection::Connection,
    error::{Error, Result},
    model::{
        object::{ElementRef, PlaylistItemObject, PlaylistObject, UserRef},
        page::Page,
        Image,
    },
    uri::Uri,
};

/// The fields of a playlist the library keeps, in Spotify's field filter syntax.
const PLAYLIST_FIELDS: &str = "uri,name,description,owner(uri,display_name),snapshot_id,public,images,\
                               tracks(items(added_at,track(uri,name)),next,limit,offset,total)";

/// A playlist.
///
/// Spotify gives every version of a playlist a snapshot ID. When a newer snapshot ID is seen, for example in the
/// current user's playlists, the playlist's loaded items are discarded and loaded again when next asked for.
#[derive(Debug)]
pub struct Playlist {
    uri: Uri,
    cache: WeakCache,
    state: RwLock<PlaylistState>,
}

/// An item in a playlist: a track or an episode.
#[derive(Debug, Clone)]
pub struct PlaylistItem {
    item: Element,
    added_at: Option<String>,
}

#[derive(Debug, Default)]
struct PlaylistState {
    name: Option<String>,
    // the newest snapshot ID seen for the playlist
    snapshot_id: Option<String>,
    data: Option<PlaylistData>,
}

#[derive(Debug)]
struct PlaylistData {
    description: Option<String>,
    owner: Arc<User>,
    snapshot_id: String,
    public: Option<bool>,
    images: Vec<Image>,
    items: Vec<PlaylistItem>,
}

impl Playlist {
    pub(crate) fn new(uri: Uri, cache: WeakCache) -> Self {
        Self {
            uri,
            cache,
            state: RwLock::default(),
        }
    }

    pub async fn description(&self) -> Result<Option<String>> {
        lazy_field(self, |playlist| {
            playlist.read().data.as_ref().map(|data| data.description.clone())
        })
        .await
    }

    pub async fn owner(&self) -> Result<Arc<User>> {
        lazy_field(self, |playlist| {
            playlist.read().data.as_ref().map(|data| Arc::clone(&data.owner))
        })
        .await
    }

    pub async fn snapshot_id(&self) -> Result<String> {
        lazy_field(self, |playlist| {
            playlist.read().data.as_ref().map(|data| data.snapshot_id.clone())
        })
        .await
    }

    /// Whether the playlist is public. `None` if Spotify doesn't say, which is the case with collaborative playlists.
    pub async fn public(&self) -> Result<Option<bool>> {
        lazy_field(self, |playlist| playlist.read().data.as_ref().map(|data| data.public)).await
    }

    /// Every item in the playlist, in order. Local files aren't included.
    pub async fn items(&self) -> Result<Vec<PlaylistItem>> {
        lazy_field(self, |playlist| playlist.read().data.as_ref().map(|data| data.items.clone())).await
    }

    /// The playlist's tracks and episodes whose names contain every one of the given strings, ignoring case.
    pub async fn search<S>(&self, needles: &[S]) -> Result<Vec<Element>>
    where
        S: AsRef<str> + Sync,
    {
        let needles: Vec<String> = needles.iter().map(|needle| needle.as_ref().to_lowercase()).collect();
        let mut found = Vec::new();

        for item in self.items().await? {
            let name = item.item.name().await?.to_lowercase();
            if needles.iter().all(|needle| name.contains(needle.as_str())) {
                found.push(item.item);
            }
        }

        Ok(found)
    }

    /// Notes a snapshot ID seen for this playlist. Loaded data of another snapshot is discarded.
    pub(crate) fn observe_snapshot(&self, snapshot_id: &str) {
        let mut state = self.write();

        let outdated = state
            .data
            .as_ref()
            .map_or(false, |data| data.snapshot_id != snapshot_id);
        if outdated {
            debug!("{} has a new snapshot {snapshot_id}, discarding loaded items", self.uri);
            state.data = None;
        }

        state.snapshot_id = Some(snapshot_id.to_owned());
    }

    pub(crate) fn seed_name(&self, name: &str) {
        set_if_unknown(&mut self.write().name, name);
    }

    pub(crate) fn known_name(&self) -> Option<String> {
        self.read().name.clone()
    }

    pub(crate) fn known_snapshot_id(&self) -> Option<String> {
        self.read().snapshot_id.clone()
    }

    pub(crate) fn reference(&self) -> ElementRef {
        ElementRef {
            uri: self.uri.clone(),
            name: self.known_name(),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, PlaylistState> {
        self.state.read().expect("playlist state rwlock poisoned")
    }

    fn write(&self) -> RwLockWriteGuard<'_, PlaylistState> {
        self.state.write().expect("playlist state rwlock poisoned")
    }
}

impl PlaylistItem {
    /// The track or episode.
    pub fn item(&self) -> &Element {
        &self.item
    }

    /// The item if it's a track.
    pub fn track(&self) -> Option<&Arc<Track>> {
        self.item.as_track()
    }

    /// When the item was added, as an ISO 8601 timestamp. Very old playlists may not have it.
    pub fn added_at(&self) -> Option<&str> {
        self.added_at.as_deref()
    }
}

impl private::Sealed for Playlist {}

#[async_trait]
impl Cacheable for Playlist {
    fn uri(&self) -> &Uri {
        &self.uri
    }

    async fn name(&self) -> Result<String> {
        lazy_field(self, Playlist::known_name).await
    }
}

#[async_trait]
impl PlayContext for Playlist {
    async fn images(&self) -> Result<Vec<Image>> {
        lazy_field(self, |playlist| playlist.read().data.as_ref().map(|data| data.images.clone())).await
    }
}

#[async_trait]
impl Load for Playlist {
    type Object = PlaylistObject;

    fn cache_key(&self) -> String {
        self.uri.to_string()
    }

    fn weak_cache(&self) -> &WeakCache {
        &self.cache
    }

    fn is_loaded(&self) -> bool {
        self.read().data.is_some()
    }

    async fn make_request(&self, connection: &Connection) -> Result<PlaylistObject> {
        let url = connection.build_element_endpoint(
            &["playlists", self.uri.id()],
            &[("fields", Some(String::from(PLAYLIST_FIELDS)))],
        )?;
        let mut playlist: PlaylistObject = connection.get(url).await?;

        let first_page = std::mem::replace(&mut playlist.tracks, Page::complete(Vec::new()));
        playlist.tracks = Page::complete(connection.get_all_pages(first_page).await?);

        Ok(playlist)
    }

    fn validate_cached(&self, object: &PlaylistObject) -> Result<()> {
        match self.known_snapshot_id() {
            Some(snapshot_id) if snapshot_id != object.snapshot_id => Err(Error::ElementOutdated(self.uri.to_string())),
            _ => Ok(()),
        }
    }

    fn load_object(&self, object: PlaylistObject, cache: &Cache) -> Result<()> {
        check_uri(&self.uri, &object.uri)?;

        let owner = cache.get_user(&object.owner.uri, object.owner.display_name.as_deref())?;
        let items = object
            .tracks
            .items
            .into_iter()
            .filter_map(|entry| {
                let track = entry.track?;
                Some(PlaylistItem {
                    item: cache.get_element(&track.uri, track.name.as_deref()),
                    added_at: entry.added_at,
                })
            })
            .collect();

        let mut state = self.write();
        state.name = Some(object.name);
        state.snapshot_id = Some(object.snapshot_id.clone());
        state.data = Some(PlaylistData {
            description: object.description,
            owner,
            snapshot_id: object.snapshot_id,
            public: object.public,
            images: object.images,
            items,
        });

        Ok(())
    }

    fn to_object(&self) -> Option<PlaylistObject> {
        let state = self.read();
        let data = state.data.as_ref()?;
        let owner = data.owner.reference();

        Some(PlaylistObject {
            uri: self.uri.clone(),
            name: state.name.clone()?,
            description: data.description.clone(),
            owner: UserRef {
                uri: owner.uri,
                display_name: owner.name,
            },
            snapshot_id: data.snapshot_id.clone(),
            public: data.public,
            images: data.images.clone(),
            tracks: Page::complete(
                data.items
                    .iter()
                    .map(|item| PlaylistItemObject {
                        added_at: item.added_at.clone(),
                        track: Some(item.item.reference()),
                    })
                    .collect(),
            ),
        })
    }
}
