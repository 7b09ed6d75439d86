use std::{
    sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard},
    time::Duration,
};

use async_trait::async_trait;

use super::{check_uri, lazy_field, private, set_if_unknown, Cacheable, Load, Playable, Show};
use crate::{
    cache::{Cache, WeakCache},
    connection::Connection,
    error::Result,
    model::{
        object::{ElementRef, EpisodeObject},
        Image,
    },
    uri::Uri,
};

/// A podcast episode.
#[derive(Debug)]
pub struct Episode {
    uri: Uri,
    cache: WeakCache,
    state: RwLock<EpisodeState>,
}

#[derive(Debug, Default)]
struct EpisodeState {
    name: Option<String>,
    data: Option<EpisodeData>,
}

#[derive(Debug)]
struct EpisodeData {
    show: Arc<Show>,
    duration: Duration,
    images: Vec<Image>,
}

impl Episode {
    pub(crate) fn new(uri: Uri, cache: WeakCache) -> Self {
        Self {
            uri,
            cache,
            state: RwLock::default(),
        }
    }

    /// The show the episode is in.
    pub async fn show(&self) -> Result<Arc<Show>> {
        lazy_field(self, |episode| {
            episode.read().data.as_ref().map(|data| Arc::clone(&data.show))
        })
        .await
    }

    pub async fn duration(&self) -> Result<Duration> {
        lazy_field(self, |episode| episode.read().data.as_ref().map(|data| data.duration)).await
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

    fn read(&self) -> RwLockReadGuard<'_, EpisodeState> {
        self.state.read().expect("episode state rwlock poisoned")
    }

    fn write(&self) -> RwLockWriteGuard<'_, EpisodeState> {
        self.state.write().expect("episode state rwlock poisoned")
    }
}

impl private::Sealed for Episode {}

#[async_trait]
impl Cacheable for Episode {
    fn uri(&self) -> &Uri {
        &self.uri
    }

    async fn name(&self) -> Result<String> {
        lazy_field(self, Episode::known_name).await
    }
}

#[async_trait]
impl Playable for Episode {
    async fn images(&self) -> Result<Vec<Image>> {
        lazy_field(self, |episode| episode.read().data.as_ref().map(|data| data.images.clone())).await
    }
}

#[async_trait]
impl Load for Episode {
    type Object = EpisodeObject;

    fn cache_key(&self) -> String {
        self.uri.to_string()
    }

    fn weak_cache(&self) -> &WeakCache {
        &self.cache
    }

    fn is_loaded(&self) -> bool {
        self.read().data.is_some()
    }

    async fn make_request(&self, connection: &Connection) -> Result<EpisodeObject> {
        let url = connection.build_element_endpoint(&["episodes", self.uri.id()], &[])?;
        connection.get(url).await
    }

    fn load_object(&self, object: EpisodeObject, cache: &Cache) -> Result<()> {
        check_uri(&self.uri, &object.uri)?;
        let show = cache.get_show(&object.show.uri, object.show.name.as_deref())?;

        let mut state = self.write();
        state.name = Some(object.name);
        state.data = Some(EpisodeData {
            show,
            duration: object.duration,
            images: object.images,
        });

        Ok(())
    }

    fn to_object(&self) -> Option<EpisodeObject> {
        let state = self.read();
        let data = state.data.as_ref()?;

        Some(EpisodeObject {
            uri: self.uri.clone(),
            name: state.name.clone()?,
            duration: data.duration,
            images: data.images.clone(),
            show: data.show.reference(),
        })
    }
}
