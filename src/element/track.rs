use std::{
    sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard},
    time::Duration,
};

use async_trait::async_trait;

use super::{check_uri, lazy_field, private, set_if_unknown, Album, Artist, Cacheable, Load, PlayContext, Playable};
use crate::{
    cache::{Cache, WeakCache},
    connection::Connection,
    error::Result,
    model::{
        object::{ElementRef, TrackObject},
        Image,
    },
    uri::Uri,
};

/// A track.
#[derive(Debug)]
pub struct Track {
    uri: Uri,
    cache: WeakCache,
    state: RwLock<TrackState>,
}

#[derive(Debug, Default)]
struct TrackState {
    name: Option<String>,
    data: Option<TrackData>,
}

#[derive(Debug)]
struct TrackData {
    album: Arc<Album>,
    artists: Vec<Arc<Artist>>,
    duration: Duration,
}

impl Track {
    pub(crate) fn new(uri: Uri, cache: WeakCache) -> Self {
        Self {
            uri,
            cache,
            state: RwLock::default(),
        }
    }

    /// The album the track is on.
    pub async fn album(&self) -> Result<Arc<Album>> {
        lazy_field(self, |track| track.read().data.as_ref().map(|data| Arc::clone(&data.album))).await
    }

    pub async fn artists(&self) -> Result<Vec<Arc<Artist>>> {
        lazy_field(self, |track| track.read().data.as_ref().map(|data| data.artists.clone())).await
    }

    pub async fn duration(&self) -> Result<Duration> {
        lazy_field(self, |track| track.read().data.as_ref().map(|data| data.duration)).await
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

    fn read(&self) -> RwLockReadGuard<'_, TrackState> {
        self.state.read().expect("track state rwlock poisoned")
    }

    fn write(&self) -> RwLockWriteGuard<'_, TrackState> {
        self.state.write().expect("track state rwlock poisoned")
    }
}

impl private::Sealed for Track {}

#[async_trait]
impl Cacheable for Track {
    fn uri(&self) -> &Uri {
        &self.uri
    }

    async fn name(&self) -> Result<String> {
        lazy_field(self, Track::known_name).await
    }
}

#[async_trait]
impl Playable for Track {
    /// The track's album's images.
    async fn images(&self) -> Result<Vec<Image>> {
        let album = self.album().await?;
        PlayContext::images(album.as_ref()).await
    }
}

#[async_trait]
impl Load for Track {
    type Object = TrackObject;

    fn cache_key(&self) -> String {
        self.uri.to_string()
    }

    fn weak_cache(&self) -> &WeakCache {
        &self.cache
    }

    fn is_loaded(&self) -> bool {
        self.read().data.is_some()
    }

    async fn make_request(&self, connection: &Connection) -> Result<TrackObject> {
        let url = connection.build_element_endpoint(&["tracks", self.uri.id()], &[])?;
        connection.get(url).await
    }

    fn load_object(&self, object: TrackObject, cache: &Cache) -> Result<()> {
        check_uri(&self.uri, &object.uri)?;

        let album = cache.get_album(&object.album.uri, object.album.name.as_deref())?;
        let artists = object
            .artists
            .iter()
            .map(|artist| cache.get_artist(&artist.uri, artist.name.as_deref()))
            .collect::<Result<Vec<_>>>()?;

        let mut state = self.write();
        state.name = Some(object.name);
        state.data = Some(TrackData {
            album,
            artists,
            duration: object.duration,
        });

        Ok(())
    }

    fn to_object(&self) -> Option<TrackObject> {
        let state = self.read();
        let data = state.data.as_ref()?;

        Some(TrackObject {
            uri: self.uri.clone(),
            name: state.name.clone()?,
            duration: data.duration,
            album: data.album.reference(),
            artists: data.artists.iter().map(|artist| artist.reference()).collect(),
        })
    }
}
