use std::time::Duration;

use serde::Deserialize;

use crate::uri::Uri;

/// A device in an user's account that may be used for playback.
#[derive(Debug, Clone, Eq, Deserialize)]
pub struct Device {
    name: String,
    // private sessions and restricted devices may hide their ID
    id: Option<String>,
    volume_percent: Option<u8>,
    is_active: bool,
    #[serde(default)]
    is_private_session: bool,
    #[serde(default)]
    is_restricted: bool,
    #[serde(rename = "type")]
    device_type: DeviceType,
}

/// A device's type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum DeviceType {
    Computer,
    Tablet,
    Smartphone,
    Speaker,
    TV,
    AVR,
    STB,
    AudioDongle,
    GameConsole,
    CastVideo,
    CastAudio,
    Automobile,
    #[serde(other)]
    Unknown,
}

/// Current playback state. Contains information about which device is playing, what the repeat and shuffle states are
/// and which item is currently playing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PlaybackState {
    device: Device,
    repeat_state: RepeatState,
    shuffle_state: bool,
    is_playing: bool,
    #[serde(default)]
    progress_ms: Option<u64>,
    #[serde(default)]
    timestamp: u64,
    #[serde(default)]
    context: Option<Context>,
    #[serde(default)]
    item: Option<PlayingItem>,
}

/// The context of the current playback (i.e. album, artist, playlist or show).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Context {
    #[serde(rename = "type")]
    context_type: String,
    uri: String,
}

/// The currently playing item.
///
/// Local files have URIs that don't point into Spotify's catalog, so the URI is kept as it was received.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PlayingItem {
    uri: String,
    name: String,
    #[serde(default)]
    duration_ms: Option<u64>,
}

/// Possible item repeat states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepeatState {
    Off,
    Track,
    Context,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DevicesResponse {
    pub devices: Vec<Device>,
}

impl Device {
    /// The name of the device.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The device ID.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// The current volume as a percentage between 0 and 100 inclusive.
    pub fn volume_percent(&self) -> Option<u8> {
        self.volume_percent
    }

    /// If this device is the currently active device.
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// If this device is currently in a private session.
    pub fn is_private_session(&self) -> bool {
        self.is_private_session
    }

    /// Whether controlling this device is restricted. If this is `true`, no Web API commands will be accepted by this
    /// device.
    pub fn is_restricted(&self) -> bool {
        self.is_restricted
    }

    /// The type of the device.
    pub fn device_type(&self) -> DeviceType {
        self.device_type
    }
}

impl PartialEq for Device {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.name == other.name
    }
}

impl PlaybackState {
    /// The device currently playing.
    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn repeat_state(&self) -> RepeatState {
        self.repeat_state
    }

    pub fn shuffle_state(&self) -> bool {
        self.shuffle_state
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    /// How far into the current item the playback is.
    pub fn progress(&self) -> Option<Duration> {
        self.progress_ms.map(Duration::from_millis)
    }

    /// Unix timestamp in milliseconds of when the state was last changed.
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    /// The playback's context. Missing when e.g. playing a private session or a list of single tracks.
    pub fn context(&self) -> Option<&Context> {
        self.context.as_ref()
    }

    /// The playing item.
    pub fn item(&self) -> Option<&PlayingItem> {
        self.item.as_ref()
    }
}

impl Context {
    /// The kind of context, e.g. `playlist` or `album`.
    pub fn context_type(&self) -> &str {
        &self.context_type
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// The context's URI, if it points into Spotify's catalog.
    pub fn parsed_uri(&self) -> Option<Uri> {
        self.uri.parse().ok()
    }
}

impl PlayingItem {
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// The item's URI, if it points into Spotify's catalog.
    pub fn parsed_uri(&self) -> Option<Uri> {
        self.uri.parse().ok()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn duration(&self) -> Option<Duration> {
        self.duration_ms.map(Duration::from_millis)
    }
}

impl RepeatState {
    pub fn as_str(self) -> &'static str {
        match self {
            RepeatState::Off => "off",
            RepeatState::Track => "track",
            RepeatState::Context => "context",
        }
    }
}
