//! The registry of element handles and the on-disk cache behind it.
//!
//! Every element handle is registered by its URI, so asking for the same URI always returns the same handle. With a
//! cache directory, each loaded element is also written there as a JSON file named by its URI, and later loads of the
//! element read the file instead of requesting the element again.

use std::{
    collections::HashMap,
    io::ErrorKind,
    path::PathBuf,
    sync::{Arc, RwLock, Weak},
};

use log::{debug, warn};
use serde::de::DeserializeOwned;

use crate::{
    connection::Connection,
    element::{Album, Artist, Element, Episode, Load, Me, Playlist, Show, Track, User},
    error::{Error, Result},
    uri::{ItemType, Uri},
};

/// The file name the current user is cached as.
const ME_CACHE_KEY: &str = "me";

#[derive(Debug, Clone)]
pub(crate) struct Cache {
    inner: Arc<CacheRef>,
}

#[derive(Debug)]
pub(crate) struct CacheRef {
    connection: Connection,
    cache_dir: Option<PathBuf>,
    elements: RwLock<HashMap<Uri, Element>>,
    me: RwLock<Option<Arc<Me>>>,
}

/// The reference elements hold to the cache they were created in.
#[derive(Debug, Clone)]
pub(crate) struct WeakCache(Weak<CacheRef>);

impl WeakCache {
    pub fn upgrade(&self) -> Result<Cache> {
        self.0.upgrade().map(|inner| Cache { inner }).ok_or(Error::CacheDropped)
    }
}

impl Cache {
    pub fn new(connection: Connection, cache_dir: Option<PathBuf>) -> Self {
        Self {
            inner: Arc::new(CacheRef {
                connection,
                cache_dir,
                elements: RwLock::new(HashMap::new()),
                me: RwLock::new(None),
            }),
        }
    }

    pub fn connection(&self) -> &Connection {
        &self.inner.connection
    }

    fn downgrade(&self) -> WeakCache {
        WeakCache(Arc::downgrade(&self.inner))
    }

    /// The handle for an URI. The name is remembered if the element's name isn't known yet.
    pub fn get_element(&self, uri: &Uri, name: Option<&str>) -> Element {
        let existing = self
            .inner
            .elements
            .read()
            .expect("element registry rwlock poisoned")
            .get(uri)
            .cloned();

        let element = match existing {
            Some(element) => element,
            None => {
                let mut elements = self.inner.elements.write().expect("element registry rwlock poisoned");

                // another thread may have registered the element between the locks
                elements
                    .entry(uri.clone())
                    .or_insert_with(|| Element::new(uri.clone(), self.downgrade()))
                    .clone()
            }
        };

        if let Some(name) = name {
            element.seed_name(name);
        }

        element
    }

    pub fn get_track(&self, uri: &Uri, name: Option<&str>) -> Result<Arc<Track>> {
        expect_item_type(uri, ItemType::Track)?;
        match self.get_element(uri, name) {
            Element::Track(track) => Ok(track),
            other => Err(wrong_item_type(ItemType::Track, &other)),
        }
    }

    pub fn get_episode(&self, uri: &Uri, name: Option<&str>) -> Result<Arc<Episode>> {
        expect_item_type(uri, ItemType::Episode)?;
        match self.get_element(uri, name) {
            Element::Episode(episode) => Ok(episode),
            other => Err(wrong_item_type(ItemType::Episode, &other)),
        }
    }

    pub fn get_album(&self, uri: &Uri, name: Option<&str>) -> Result<Arc<Album>> {
        expect_item_type(uri, ItemType::Album)?;
        match self.get_element(uri, name) {
            Element::Album(album) => Ok(album),
            other => Err(wrong_item_type(ItemType::Album, &other)),
        }
    }

    pub fn get_artist(&self, uri: &Uri, name: Option<&str>) -> Result<Arc<Artist>> {
        expect_item_type(uri, ItemType::Artist)?;
        match self.get_element(uri, name) {
            Element::Artist(artist) => Ok(artist),
            other => Err(wrong_item_type(ItemType::Artist, &other)),
        }
    }

    pub fn get_show(&self, uri: &Uri, name: Option<&str>) -> Result<Arc<Show>> {
        expect_item_type(uri, ItemType::Show)?;
        match self.get_element(uri, name) {
            Element::Show(show) => Ok(show),
            other => Err(wrong_item_type(ItemType::Show, &other)),
        }
    }

    /// The handle for a playlist. A known snapshot ID marks older data of the playlist as outdated.
    pub fn get_playlist(&self, uri: &Uri, name: Option<&str>, snapshot_id: Option<&str>) -> Result<Arc<Playlist>> {
        expect_item_type(uri, ItemType::Playlist)?;
        match self.get_element(uri, name) {
            Element::Playlist(playlist) => {
                if let Some(snapshot_id) = snapshot_id {
                    playlist.observe_snapshot(snapshot_id);
                }

                Ok(playlist)
            }
            other => Err(wrong_item_type(ItemType::Playlist, &other)),
        }
    }

    pub fn get_user(&self, uri: &Uri, display_name: Option<&str>) -> Result<Arc<User>> {
        expect_item_type(uri, ItemType::User)?;
        match self.get_element(uri, display_name) {
            Element::User(user) => Ok(user),
            other => Err(wrong_item_type(ItemType::User, &other)),
        }
    }

    /// The handle for the current user.
    pub fn get_me(&self) -> Arc<Me> {
        if let Some(me) = self.inner.me.read().expect("me rwlock poisoned").as_ref() {
            return Arc::clone(me);
        }

        let mut me = self.inner.me.write().expect("me rwlock poisoned");
        Arc::clone(me.get_or_insert_with(|| Arc::new(Me::new(self.downgrade()))))
    }

    /// Loads an element's data, from the on-disk cache if it's there and still current, otherwise from Spotify.
    /// Requested data is written to the on-disk cache.
    pub(crate) async fn load<E>(&self, element: &E) -> Result<()>
    where
        E: Load,
    {
        let key = element.cache_key();

        if let Some(object) = self.read_cache_file::<E::Object>(&key).await {
            match element
                .validate_cached(&object)
                .and_then(|_| element.load_object(object, self))
            {
                Ok(()) => {
                    debug!("Loaded {key} from cache");
                    return Ok(());
                }

                Err(Error::ElementOutdated(_)) => debug!("Cached {key} is outdated, requesting it again"),
                Err(e) => return Err(e),
            }
        }

        let object = element.make_request(self.connection()).await?;
        element.load_object(object, self)?;

        if self.inner.cache_dir.is_some() {
            self.write_cache_file(&key, element).await;
            debug!("Requested and cached {key}");
        } else {
            debug!("Requested {key}");
        }

        Ok(())
    }

    pub(crate) fn me_cache_key() -> String {
        String::from(ME_CACHE_KEY)
    }

    /// Reads a cache file. A missing or unreadable file is a miss.
    async fn read_cache_file<T>(&self, key: &str) -> Option<T>
    where
        T: DeserializeOwned,
    {
        let path = self.inner.cache_dir.as_ref()?.join(key);

        let contents = match tokio::fs::read(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                warn!("Failed to read cache file {}: {e}", path.display());
                return None;
            }
        };

        match serde_json::from_slice(&contents) {
            Ok(object) => Some(object),
            Err(e) => {
                debug!("Ignoring invalid cache file {}: {e}", path.display());
                None
            }
        }
    }

    /// Writes an element's data to its cache file. The data was already loaded so failing to cache it isn't fatal.
    async fn write_cache_file<E>(&self, key: &str, element: &E)
    where
        E: Load,
    {
        let (Some(cache_dir), Some(object)) = (self.inner.cache_dir.as_ref(), element.to_object()) else {
            return;
        };

        let path = cache_dir.join(key);
        let result = async {
            let contents = serde_json::to_vec(&object)?;
            tokio::fs::create_dir_all(cache_dir).await?;
            tokio::fs::write(&path, contents).await?;
            Ok::<(), Error>(())
        }
        .await;

        if let Err(e) = result {
            warn!("Failed to write cache file {}: {e}", path.display());
        }
    }
}

fn expect_item_type(uri: &Uri, expected: ItemType) -> Result<()> {
    if uri.item_type() == expected {
        Ok(())
    } else {
        Err(Error::WrongItemType {
            expected,
            actual: uri.item_type(),
        })
    }
}

fn wrong_item_type(expected: ItemType, element: &Element) -> Error {
    Error::WrongItemType {
        expected,
        actual: element.item_type(),
    }
}
