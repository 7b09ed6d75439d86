use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use super::{check_uri, lazy_field, private, set_if_unknown, Cacheable, Episode, Load, PlayContext};
use crate::{
    cache::{Cache, WeakCache},
    connection::Connection,
    error::Result,
    model::{
        object::{ElementRef, ShowObject},
        page::Page,
        Image,
    },
    uri::Uri,
};

/// A podcast show.
#[derive(Debug)]
pub struct Show {
    uri: Uri,
    cache: WeakCache,
    state: RwLock<ShowState>,
}

#[derive(Debug, Default)]
struct ShowState {
    name: Option<String>,
    data: Option<ShowData>,
}

#[derive(Debug)]
struct ShowData {
    publisher: String,
    images: Vec<Image>,
    episodes: Vec<Arc<Episode>>,
}

impl Show {
    pub(crate) fn new(uri: Uri, cache: WeakCache) -> Self {
        Self {
            uri,
            cache,
            state: RwLock::default(),
        }
    }

    pub async fn publisher(&self) -> Result<String> {
        lazy_field(self, |show| show.read().data.as_ref().map(|data| data.publisher.clone())).await
    }

    /// Every episode of the show, newest first.
    pub async fn episodes(&self) -> Result<Vec<Arc<Episode>>> {
        lazy_field(self, |show| show.read().data.as_ref().map(|data| data.episodes.clone())).await
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

    fn read(&self) -> RwLockReadGuard<'_, ShowState> {
        self.state.read().expect("show state rwlock poisoned")
    }

    fn write(&self) -> RwLockWriteGuard<'_, ShowState> {
        self.state.write().expect("show state rwlock poisoned")
    }
}

impl private::Sealed for Show {}

#[async_trait]
impl Cacheable for Show {
    fn uri(&self) -> &Uri {
        &self.uri
    }

    async fn name(&self) -> Result<String> {
        lazy_field(self, Show::known_name).await
    }
}

#[async_trait]
impl PlayContext for Show {
    async fn images(&self) -> Result<Vec<Image>> {
        lazy_field(self, |show| show.read().data.as_ref().map(|data| data.images.clone())).await
    }
}

#[async_trait]
impl Load for Show {
    type Object = ShowObject;

    fn cache_key(&self) -> String {
        self.uri.to_string()
    }

    fn weak_cache(&self) -> &WeakCache {
        &self.cache
    }

    fn is_loaded(&self) -> bool {
        self.read().data.is_some()
    }

    async fn make_request(&self, connection: &Connection) -> Result<ShowObject> {
        let url = connection.build_element_endpoint(&["shows", self.uri.id()], &[])?;
        let mut show: ShowObject = connection.get(url).await?;

        let first_page = std::mem::replace(&mut show.episodes, Page::complete(Vec::new()));
        show.episodes = Page::complete(connection.get_all_pages(first_page).await?);

        Ok(show)
    }

    fn load_object(&self, object: ShowObject, cache: &Cache) -> Result<()> {
        check_uri(&self.uri, &object.uri)?;

        let episodes = object
            .episodes
            .items
            .iter()
            .map(|episode| cache.get_episode(&episode.uri, episode.name.as_deref()))
            .collect::<Result<Vec<_>>>()?;

        let mut state = self.write();
        state.name = Some(object.name);
        state.data = Some(ShowData {
            publisher: object.publisher,
            images: object.images,
            episodes,
        });

        Ok(())
    }

    fn to_object(&self) -> Option<ShowObject> {
        let state = self.read();
        let data = state.data.as_ref()?;

        Some(ShowObject {
            uri: self.uri.clone(),
            name: state.name.clone()?,
            publisher: data.publisher.clone(),
            images: data.images.clone(),
            episodes: Page::complete(data.episodes.iter().map(|episode| episode.reference()).collect()),
        })
    }
}
