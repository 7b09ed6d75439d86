//! Objects Spotify returns, and their on-disk cache form.

pub mod error;
pub(crate) mod object;
pub(crate) mod page;
pub mod playback;
pub(crate) mod search;

use serde::{Deserialize, Deserializer, Serialize};

/// An image of an element, such as an album cover.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub url: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

/// Spotify sends `null` where it means an empty value for some fields, such as a playlist's images.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
