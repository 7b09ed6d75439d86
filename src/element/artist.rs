use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use super::{check_uri, lazy_field, private, set_if_unknown, Cacheable, Load, PlayContext};
use crate::{
    cache::{Cache, WeakCache},
    connection::Connection,
    error::Result,
    model::{
        object::{ArtistObject, ElementRef},
        Image,
    },
    uri::Uri,
};

/// An artist.
#[derive(Debug)]
pub struct Artist {
    uri: Uri,
    cache: WeakCache,
    state: RwLock<ArtistState>,
}

#[derive(Debug, Default)]
struct ArtistState {
    name: Option<String>,
    data: Option<ArtistData>,
}

#[derive(Debug)]
struct ArtistData {
    genres: Vec<String>,
    images: Vec<Image>,
}

impl Artist {
    pub(crate) fn new(uri: Uri, cache: WeakCache) -> Self {
        Self {
            uri,
            cache,
            state: RwLock::default(),
        }
    }

    pub async fn genres(&self) -> Result<Vec<String>> {
        lazy_field(self, |artist| artist.read().data.as_ref().map(|data| data.genres.clone())).await
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

    fn read(&self) -> RwLockReadGuard<'_, ArtistState> {
        self.state.read().expect("artist state rwlock poisoned")
    }

    fn write(&self) -> RwLockWriteGuard<'_, ArtistState> {
        self.state.write().expect("artist state rwlock poisoned")
    }
}

impl private::Sealed for Artist {}

#[async_trait]
impl Cacheable for Artist {
    fn uri(&self) -> &Uri {
        &self.uri
    }

    async fn name(&self) -> Result<String> {
        lazy_field(self, Artist::known_name).await
    }
}

#[async_trait]
impl PlayContext for Artist {
    async fn images(&self) -> Result<Vec<Image>> {
        lazy_field(self, |artist| artist.read().data.as_ref().map(|data| data.images.clone())).await
    }
}

#[async_trait]
impl Load for Artist {
    type Object = ArtistObject;

    fn cache_key(&self) -> String {
        self.uri.to_string()
    }

    fn weak_cache(&self) -> &WeakCache {
        &self.cache
    }

    fn is_loaded(&self) -> bool {
        self.read().data.is_some()
    }

    async fn make_request(&self, connection: &Connection) -> Result<ArtistObject> {
        let url = connection.build_element_endpoint(&["artists", self.uri.id()], &[])?;
        connection.get(url).await
    }

    fn load_object(&self, object: ArtistObject, _cache: &Cache) -> Result<()> {
        check_uri(&self.uri, &object.uri)?;

        let mut state = self.write();
        state.name = Some(object.name);
        state.data = Some(ArtistData {
            genres: object.genres,
            images: object.images,
        });

        Ok(())
    }

    fn to_object(&self) -> Option<ArtistObject> {
        let state = self.read();
        let data = state.data.as_ref()?;

        Some(ArtistObject {
            uri: self.uri.clone(),
            name: state.name.clone()?,
            genres: data.genres.clone(),
            images: data.images.clone(),
        })
    }
}
