use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use super::{check_uri, lazy_field, private, set_if_unknown, Cacheable, Load, Playlist};
use crate::{
    cache::{Cache, WeakCache},
    connection::Connection,
    error::Result,
    model::{
        object::{ElementRef, PlaylistRef, UserObject, UserProfileObject},
        page::Page,
    },
    uri::Uri,
};

pub(super) const PLAYLISTS_PAGE_LIMIT: &str = "50";

/// A Spotify user.
#[derive(Debug)]
pub struct User {
    uri: Uri,
    cache: WeakCache,
    state: RwLock<UserState>,
}

#[derive(Debug, Default)]
struct UserState {
    display_name: Option<String>,
    data: Option<UserData>,
}

#[derive(Debug)]
struct UserData {
    playlists: Vec<Arc<Playlist>>,
}

impl User {
    pub(crate) fn new(uri: Uri, cache: WeakCache) -> Self {
        Self {
            uri,
            cache,
            state: RwLock::default(),
        }
    }

    /// The user's display name, if they have set one.
    pub async fn display_name(&self) -> Result<Option<String>> {
        if let Some(display_name) = self.known_name() {
            return Ok(Some(display_name));
        }

        lazy_field(self, |user| {
            let state = user.read();
            state.data.as_ref().map(|_| state.display_name.clone())
        })
        .await
    }

    /// The user's public playlists.
    pub async fn playlists(&self) -> Result<Vec<Arc<Playlist>>> {
        lazy_field(self, |user| user.read().data.as_ref().map(|data| data.playlists.clone())).await
    }

    pub(crate) fn seed_name(&self, display_name: &str) {
        set_if_unknown(&mut self.write().display_name, display_name);
    }

    pub(crate) fn known_name(&self) -> Option<String> {
        self.read().display_name.clone()
    }

    pub(crate) fn reference(&self) -> ElementRef {
        ElementRef {
            uri: self.uri.clone(),
            name: self.known_name(),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, UserState> {
        self.state.read().expect("user state rwlock poisoned")
    }

    fn write(&self) -> RwLockWriteGuard<'_, UserState> {
        self.state.write().expect("user state rwlock poisoned")
    }
}

impl private::Sealed for User {}

#[async_trait]
impl Cacheable for User {
    fn uri(&self) -> &Uri {
        &self.uri
    }

    /// The user's display name, or their ID if they haven't set one.
    async fn name(&self) -> Result<String> {
        Ok(self
            .display_name()
            .await?
            .unwrap_or_else(|| self.uri.id().to_owned()))
    }
}

#[async_trait]
impl Load for User {
    type Object = UserObject;

    fn cache_key(&self) -> String {
        self.uri.to_string()
    }

    fn weak_cache(&self) -> &WeakCache {
        &self.cache
    }

    fn is_loaded(&self) -> bool {
        self.read().data.is_some()
    }

    async fn make_request(&self, connection: &Connection) -> Result<UserObject> {
        let profile_url = connection.build_element_endpoint(&["users", self.uri.id()], &[])?;
        let profile: UserProfileObject = connection.get(profile_url).await?;

        let playlists_url = connection.build_element_endpoint(
            &["users", self.uri.id(), "playlists"],
            &[("limit", Some(String::from(PLAYLISTS_PAGE_LIMIT)))],
        )?;
        let playlists: Vec<PlaylistRef> = connection.get_paged(playlists_url).await?;

        Ok(UserObject {
            uri: profile.uri,
            display_name: profile.display_name,
            playlists: Page::complete(playlists),
        })
    }

    fn load_object(&self, object: UserObject, cache: &Cache) -> Result<()> {
        check_uri(&self.uri, &object.uri)?;

        let playlists = object
            .playlists
            .items
            .iter()
            .map(|playlist| cache.get_playlist(&playlist.uri, playlist.name.as_deref(), playlist.snapshot_id.as_deref()))
            .collect::<Result<Vec<_>>>()?;

        let mut state = self.write();
        if object.display_name.is_some() {
            state.display_name = object.display_name;
        }
        state.data = Some(UserData { playlists });

        Ok(())
    }

    fn to_object(&self) -> Option<UserObject> {
        let state = self.read();
        let data = state.data.as_ref()?;

        Some(UserObject {
            uri: self.uri.clone(),
            display_name: state.display_name.clone(),
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
        })
    }
}
