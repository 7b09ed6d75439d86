//! The element objects, trimmed down to the fields the elements keep.
//!
//! These are deserialized straight from API responses and serialized into the on-disk cache. A cache file is
//! therefore read with the same code that reads a response.

use std::time::Duration;

use log::debug;
use serde::{Deserialize, Deserializer, Serialize};

use super::{null_as_default, page::Page, Image};
use crate::{uri::Uri, util::duration_millis};

/// A reference to another element by its URI and, if known, its name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct ElementRef {
    pub uri: Uri,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct UserRef {
    pub uri: Uri,
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct PlaylistRef {
    pub uri: Uri,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub snapshot_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct TrackObject {
    pub uri: Uri,
    pub name: String,
    #[serde(rename = "duration_ms", with = "duration_millis")]
    pub duration: Duration,
    pub album: ElementRef,
    pub artists: Vec<ElementRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct EpisodeObject {
    pub uri: Uri,
    pub name: String,
    #[serde(rename = "duration_ms", with = "duration_millis")]
    pub duration: Duration,
    #[serde(default, deserialize_with = "null_as_default")]
    pub images: Vec<Image>,
    pub show: ElementRef,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct AlbumObject {
    pub uri: Uri,
    pub name: String,
    pub artists: Vec<ElementRef>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub images: Vec<Image>,
    pub tracks: Page<ElementRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct ArtistObject {
    pub uri: Uri,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub genres: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub images: Vec<Image>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct ShowObject {
    pub uri: Uri,
    pub name: String,
    pub publisher: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub images: Vec<Image>,
    pub episodes: Page<ElementRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct PlaylistObject {
    pub uri: Uri,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub owner: UserRef,
    pub snapshot_id: String,
    #[serde(default)]
    pub public: Option<bool>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub images: Vec<Image>,
    pub tracks: Page<PlaylistItemObject>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct PlaylistItemObject {
    #[serde(default)]
    pub added_at: Option<String>,
    #[serde(default, deserialize_with = "catalog_ref")]
    pub track: Option<ElementRef>,
}

/// The user profile as Spotify returns it. A user's playlists are requested separately.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub(crate) struct UserProfileObject {
    pub uri: Uri,
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct UserObject {
    pub uri: Uri,
    #[serde(default)]
    pub display_name: Option<String>,
    pub playlists: Page<PlaylistRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct MeObject {
    pub uri: Uri,
    #[serde(default)]
    pub display_name: Option<String>,
    pub playlists: Page<PlaylistRef>,
    pub tracks: Page<SavedTrackObject>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct SavedTrackObject {
    #[serde(default)]
    pub added_at: Option<String>,
    pub track: ElementRef,
}

/// Deserializes an optional element reference, discarding references that don't point into Spotify's catalog such as
/// local files in playlists.
fn catalog_ref<'de, D>(deserializer: D) -> Result<Option<ElementRef>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct RawRef {
        #[serde(default)]
        uri: Option<String>,
        #[serde(default)]
        name: Option<String>,
    }

    let raw: Option<RawRef> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|raw| {
        let uri = raw.uri?;
        match uri.parse::<Uri>() {
            Ok(parsed) => Some(ElementRef {
                uri: parsed,
                name: raw.name,
            }),
            Err(e) => {
                debug!("Skipping reference to {uri}: {e}");
                None
            }
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn track_object_from_api_response() {
        let track: TrackObject = serde_json::from_str(
            r#"{
                "uri": "spotify:track:2pDPOMX0kWA7kcPBcDCQBu",
                "name": "Song",
                "duration_ms": 215000,
                "popularity": 12,
                "album": {"uri": "spotify:album:0tDsHtvN9YNuZjlqHvDY2P", "name": "Record", "album_type": "album"},
                "artists": [{"uri": "spotify:artist:6pNgnvzBa6Bthsv8SrZJYl", "name": "Band"}]
            }"#,
        )
        .unwrap();

        assert_eq!(track.duration, Duration::from_millis(215000));
        assert_eq!(track.album.name.as_deref(), Some("Record"));
        assert_eq!(track.artists.len(), 1);
    }

    #[test]
    fn playlist_items_skip_local_and_missing_tracks() {
        let page: Page<PlaylistItemObject> = serde_json::from_str(
            r#"{
                "items": [
                    {"added_at": "2022-01-01T00:00:00Z", "track": {"uri": "spotify:track:2pDPOMX0kWA7kcPBcDCQBu", "name": "Song"}},
                    {"added_at": "2022-01-02T00:00:00Z", "track": {"uri": "spotify:local:Band:Record:Song:200", "name": "Song"}},
                    {"added_at": "2022-01-03T00:00:00Z", "track": null}
                ],
                "next": null
            }"#,
        )
        .unwrap();

        assert_eq!(page.items.len(), 3);
        assert!(page.items[0].track.is_some());
        assert!(page.items[1].track.is_none());
        assert!(page.items[2].track.is_none());
    }

    #[test]
    fn null_images_are_empty() {
        let artist: ArtistObject = serde_json::from_str(
            r#"{"uri": "spotify:artist:6pNgnvzBa6Bthsv8SrZJYl", "name": "Band", "genres": null, "images": null}"#,
        )
        .unwrap();

        assert!(artist.genres.is_empty());
        assert!(artist.images.is_empty());
    }
}
