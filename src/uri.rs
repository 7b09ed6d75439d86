//! Spotify URIs.
//!
//! Every element in Spotify's catalog is identified by an URI such as `spotify:track:2pDPOMX0kWA7kcPBcDCQBu`. The same
//! element may also be shared as an URL such as `https://open.spotify.com/track/2pDPOMX0kWA7kcPBcDCQBu?si=...`. Both
//! forms parse into a [Uri]:
//!
//! ```
//! # use spotifyre::{ItemType, Uri};
//! let from_uri: Uri = "spotify:track:2pDPOMX0kWA7kcPBcDCQBu".parse().unwrap();
//! let from_url = Uri::from_url("https://open.spotify.com/track/2pDPOMX0kWA7kcPBcDCQBu?si=abc").unwrap();
//!
//! assert_eq!(from_uri, from_url);
//! assert_eq!(from_uri.item_type(), ItemType::Track);
//! assert_eq!(from_uri.id(), "2pDPOMX0kWA7kcPBcDCQBu");
//! assert_eq!(from_uri.to_string(), "spotify:track:2pDPOMX0kWA7kcPBcDCQBu");
//! ```

use std::{fmt, str::FromStr};

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::{error::UriError, util::maybe_split_once::MaybeSplitOnce};

const URI_PREFIX: &str = "spotify:";
const URL_PREFIX: &str = "https://open.spotify.com/";

/// The kind of element an [Uri] points to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ItemType {
    Track,
    Episode,
    Album,
    Artist,
    Playlist,
    Show,
    User,
}

/// An URI of a single Spotify element.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Uri {
    item_type: ItemType,
    id: String,
}

impl ItemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemType::Track => "track",
            ItemType::Episode => "episode",
            ItemType::Album => "album",
            ItemType::Artist => "artist",
            ItemType::Playlist => "playlist",
            ItemType::Show => "show",
            ItemType::User => "user",
        }
    }

    /// Whether elements of this type can be played individually; tracks and episodes.
    pub fn is_playable(&self) -> bool {
        matches!(self, ItemType::Track | ItemType::Episode)
    }

    /// Whether elements of this type are collections of playable elements; albums, artists, playlists and shows.
    pub fn is_context(&self) -> bool {
        matches!(
            self,
            ItemType::Album | ItemType::Artist | ItemType::Playlist | ItemType::Show
        )
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemType {
    type Err = UriError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "track" => Ok(ItemType::Track),
            "episode" => Ok(ItemType::Episode),
            "album" => Ok(ItemType::Album),
            "artist" => Ok(ItemType::Artist),
            "playlist" => Ok(ItemType::Playlist),
            "show" => Ok(ItemType::Show),
            "user" => Ok(ItemType::User),

            other => Err(UriError::UnknownItemType(other.to_owned())),
        }
    }
}

impl Uri {
    /// Builds an URI from an item type and a bare ID.
    pub fn new<S>(item_type: ItemType, id: S) -> Result<Self, UriError>
    where
        S: Into<String>,
    {
        let id = id.into();

        if verify_valid_id(item_type, &id) {
            Ok(Self { item_type, id })
        } else {
            Err(UriError::InvalidId(id))
        }
    }

    /// Parses a `spotify:<type>:<id>` URI.
    pub fn from_uri(uri: &str) -> Result<Self, UriError> {
        let mut parts = uri.split(':');

        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some("spotify"), Some(item_type), Some(id), None) => Uri::new(item_type.parse()?, id),
            _ => Err(UriError::MalformedString(uri.to_owned())),
        }
    }

    /// Parses a `https://open.spotify.com/<type>/<id>` URL. A query in the URL is ignored.
    pub fn from_url(url: &str) -> Result<Self, UriError> {
        // a whole URL could look like: https://open.spotify.com/track/3mXLyNsVeLelMakgpGUp1f?si=AAAAAAAAAAAAAAAA
        let (item_type, id) = url
            .strip_prefix(URL_PREFIX)
            .and_then(|prefix_removed| prefix_removed.split_once('/'))
            .map(|(item_type, id_with_possible_query)| {
                let (id, _) = id_with_possible_query.maybe_split_once('?');
                (item_type, id)
            })
            .ok_or_else(|| UriError::MalformedString(url.to_owned()))?;

        Uri::new(item_type.parse()?, id)
    }

    /// Parses either a Spotify URL or a Spotify URI.
    pub fn from_url_or_uri(url_or_uri: &str) -> Result<Self, UriError> {
        if url_or_uri.starts_with(URI_PREFIX) {
            Self::from_uri(url_or_uri)
        } else if url_or_uri.starts_with(URL_PREFIX) {
            Self::from_url(url_or_uri)
        } else {
            Err(UriError::MalformedString(url_or_uri.to_owned()))
        }
    }

    pub fn item_type(&self) -> ItemType {
        self.item_type
    }

    /// The bare ID.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// This URI as an open.spotify.com URL.
    pub fn as_url(&self) -> String {
        format!("{URL_PREFIX}{}/{}", self.item_type, self.id)
    }

    pub fn is_playable(&self) -> bool {
        self.item_type.is_playable()
    }

    pub fn is_context(&self) -> bool {
        self.item_type.is_context()
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{URI_PREFIX}{}:{}", self.item_type, self.id)
    }
}

impl FromStr for Uri {
    type Err = UriError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_url_or_uri(s)
    }
}

impl TryFrom<&str> for Uri {
    type Error = UriError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::from_url_or_uri(value)
    }
}

impl TryFrom<String> for Uri {
    type Error = UriError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_url_or_uri(&value)
    }
}

impl TryFrom<&String> for Uri {
    type Error = UriError;

    fn try_from(value: &String) -> Result<Self, Self::Error> {
        Self::from_url_or_uri(value)
    }
}

impl From<&Uri> for Uri {
    fn from(uri: &Uri) -> Self {
        uri.clone()
    }
}

impl Serialize for Uri {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Uri {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let uri = String::deserialize(deserializer)?;
        Uri::from_url_or_uri(&uri).map_err(|_| de::Error::invalid_value(de::Unexpected::Str(&uri), &"a Spotify URI"))
    }
}

fn verify_valid_id(item_type: ItemType, id: &str) -> bool {
    if id.is_empty() {
        return false;
    }

    // user IDs are chosen by the users themselves, but they end up in URI strings and request paths
    if item_type == ItemType::User {
        return !id.contains([':', '/', '?', '#', '%']) && !id.contains(|c: char| c.is_whitespace() || c.is_control());
    }

    // everything else is a base-62 string that looks like 3mXLyNsVeLelMakgpGUp1f
    id.chars().all(|c| c.is_ascii_alphanumeric())
}
