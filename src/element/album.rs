use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use super::{check_uri, lazy_field, private, set_if_unknown, Artist, Cacheable, Load, PlayContext, Track};
use crate::{
    cache::{Cache, WeakCache},
    connection::Connection,
    error::Result,
    model::{
        object::{AlbumObject, ElementRef},
        page::Page,
        Image,
    },
    uri::Uri,
};

/// An album.
#[derive(Debug)]
pub struct Album {
    uri: Uri,
    cache: WeakCache,
    state: RwLock<AlbumState>,
}

#[derive(Debug, Default)]
struct AlbumState {
    name: Option<String>,
    data: Option<AlbumData>,
}

#[derive(Debug)]
struct AlbumData {
    artists: Vec<Arc<Artist>>,
    images: Vec<Image>,
    tracks: Vec<Arc<Track>>,
}

impl Album {
    pub(crate) fn new(uri: Uri, cache: WeakCache) -> Self {
        Self {
            uri,
            cache,
            state: RwLock::default(),
        }
    }

    pub async fn artists(&self) -> Result<Vec<Arc<Artist>>> {
        lazy_field(self, |album| album.read().data.as_ref().map(|data| data.artists.clone())).await
    }

    /// Every track on the album, in order.
    pub async fn tracks(&self) -> Result<Vec<Arc<Track>>> {
        lazy_field(self, |album| album.read().data.as_ref().map(|data| data.tracks.clone())).await
    }

    pub(crate) fn seed_name(&self, name: &str) {
        set_if_unknown(&mut self.write().name, name);
    }

    pub(crate) fn known_name(&self) -> Option<String> {
        self.read().name.clone()
    }

    pub(crate) fn reference(&self) -> ElementRef {
        ElementRef {
            uri: self.uri.clone(),
            name: self.known_name(),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, AlbumState> {
        self.state.read().expect("album state rwlock poisoned")
    }

    fn write(&self) -> RwLockWriteGuard<'_, AlbumState> {
        self.state.write().expect("album state rwlock poisoned")
    }
}

impl private::Sealed for Album {}

#[async_trait]
impl Cacheable for Album {
    fn uri(&self) -> &Uri {
        &self.uri
    }

    async fn name(&self) -> Result<String> {
        lazy_field(self, Album::known_name).await
    }
}

#[async_trait]
impl PlayContext for Album {
    async fn images(&self) -> Result<Vec<Image>> {
        lazy_field(self, |album| album.read().data.as_ref().map(|data| data.images.clone())).await
    }
}

#[async_trait]
impl Load for Album {
    type Object = AlbumObject;

    fn cache_key(&self) -> String {
        self.uri.to_string()
    }

    fn weak_cache(&self) -> &WeakCache {
        &self.cache
    }

    fn is_loaded(&self) -> bool {
        self.read().data.is_some()
    }

    async fn make_request(&self, connection: &Connection) -> Result<AlbumObject> {
        let url = connection.build_element_endpoint(&["albums", self.uri.id()], &[])?;
        let mut album: AlbumObject = connection.get(url).await?;

        let first_page = std::mem::replace(&mut album.tracks, Page::complete(Vec::new()));
        album.tracks = Page::complete(connection.get_all_pages(first_page).await?);

        Ok(album)
    }

    fn load_object(&self, object: AlbumObject, cache: &Cache) -> Result<()> {
        check_uri(&self.uri, &object.uri)?;

        let artists = object
            .artists
            .iter()
            .map(|artist| cache.get_artist(&artist.uri, artist.name.as_deref()))
            .collect::<Result<Vec<_>>>()?;
        let tracks = object
            .tracks
            .items
            .iter()
            .map(|track| cache.get_track(&track.uri, track.name.as_deref()))
            .collect::<Result<Vec<_>>>()?;

        let mut state = self.write();
        state.name = Some(object.name);
        state.data = Some(AlbumData {
            artists,
            images: object.images,
            tracks,
        });

        Ok(())
    }

    fn to_object(&self) -> Option<AlbumObject> {
        let state = self.read();
        let data = state.data.as_ref()?;

        Some(AlbumObject {
            uri: self.uri.clone(),
            name: state.name.clone()?,
            artists: data.artists.iter().map(|artist| artist.reference()).collect(),
            images: data.images.clone(),
            tracks: Page::complete(data.tracks.iter().map(|track| track.reference()).collect()),
        })
    }
}
