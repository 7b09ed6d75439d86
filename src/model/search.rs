use serde::Deserialize;
use serde_json::Value;

use super::page::Page;

/// The raw search response. Items are kept as JSON because search results are trimmed down compared to the full
/// objects, so each one is applied to its element only if it happens to carry enough fields.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct SearchResponse {
    #[serde(default)]
    pub tracks: Option<Page<Value>>,
    #[serde(default)]
    pub episodes: Option<Page<Value>>,
    #[serde(default)]
    pub albums: Option<Page<Value>>,
    #[serde(default)]
    pub artists: Option<Page<Value>>,
    #[serde(default)]
    pub playlists: Option<Page<Value>>,
    #[serde(default)]
    pub shows: Option<Page<Value>>,
}
