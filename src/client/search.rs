use std::sync::Arc;

use log::{debug, trace};
use serde_json::Value;

use crate::{
    cache::Cache,
    element::{Album, Artist, Element, Episode, Load, Playlist, Show, Track},
    error::{Error, Result},
    model::{page::Page, search::SearchResponse},
    uri::{ItemType, Uri},
};

/// Elements found by a search.
///
/// Every element is registered in the client like any other element. When the search result carries all of an
/// element's fields, such as with tracks and artists, they are loaded right away.
#[derive(Debug, Clone, Default)]
pub struct SearchResults {
    pub tracks: Vec<Arc<Track>>,
    pub episodes: Vec<Arc<Episode>>,
    pub albums: Vec<Arc<Album>>,
    pub artists: Vec<Arc<Artist>>,
    pub playlists: Vec<Arc<Playlist>>,
    pub shows: Vec<Arc<Show>>,
}

impl SearchResults {
    /// The found tracks followed by the found episodes.
    pub fn playable(&self) -> Vec<Element> {
        self.tracks
            .iter()
            .cloned()
            .map(Element::Track)
            .chain(self.episodes.iter().cloned().map(Element::Episode))
            .collect()
    }
}

/// The comma-separated list of types Spotify expects. Users can't be searched for.
pub(crate) fn search_type_string(types: &[ItemType]) -> Result<String> {
    if types.is_empty() {
        return Err(Error::BadRequest(String::from("no item types to search for")));
    }

    if types.contains(&ItemType::User) {
        return Err(Error::BadRequest(String::from("users can't be searched for")));
    }

    let mut names: Vec<&str> = Vec::new();
    for item_type in types {
        if !names.contains(&item_type.as_str()) {
            names.push(item_type.as_str());
        }
    }

    Ok(names.join(","))
}

pub(crate) fn apply_search_response(cache: &Cache, response: SearchResponse) -> SearchResults {
    SearchResults {
        tracks: register(cache, response.tracks, |uri, name, _| cache.get_track(uri, name)),
        episodes: register(cache, response.episodes, |uri, name, _| cache.get_episode(uri, name)),
        albums: register(cache, response.albums, |uri, name, _| cache.get_album(uri, name)),
        artists: register(cache, response.artists, |uri, name, _| cache.get_artist(uri, name)),
        playlists: register(cache, response.playlists, |uri, name, item| {
            cache.get_playlist(uri, name, item.get("snapshot_id").and_then(Value::as_str))
        }),
        shows: register(cache, response.shows, |uri, name, _| cache.get_show(uri, name)),
    }
}

/// Registers the elements in a page of search results, loading each one from its result if it's complete.
fn register<E, F>(cache: &Cache, page: Option<Page<Value>>, get: F) -> Vec<Arc<E>>
where
    E: Load,
    F: Fn(&Uri, Option<&str>, &Value) -> Result<Arc<E>>,
{
    let mut elements = Vec::new();

    // Spotify leaves holes in search results as nulls every now and then
    for item in page.map(|page| page.items).unwrap_or_default() {
        let Some(uri) = item
            .get("uri")
            .and_then(Value::as_str)
            .and_then(|uri| uri.parse::<Uri>().ok())
        else {
            continue;
        };
        let name = item.get("name").and_then(Value::as_str).map(str::to_owned);

        let element = match get(&uri, name.as_deref(), &item) {
            Ok(element) => element,
            Err(e) => {
                debug!("Skipping search result {uri}: {e}");
                continue;
            }
        };

        if !element.is_loaded() {
            match serde_json::from_value::<E::Object>(item) {
                Ok(object) => {
                    if let Err(e) = element.load_object(object, cache) {
                        debug!("Failed to load {uri} from its search result: {e}");
                    }
                }
                Err(e) => trace!("Search result for {uri} is partial: {e}"),
            }
        }

        elements.push(element);
    }

    elements
}
