use serde::Serialize;

pub(crate) const DEVICE_ID_QUERY: &str = "device_id";
pub(crate) const SHUFFLE_STATE_QUERY: &str = "state";
pub(crate) const QUEUE_URI_QUERY: &str = "uri";

pub(crate) const SEARCH_QUERY: &str = "q";
pub(crate) const SEARCH_TYPE_QUERY: &str = "type";
pub(crate) const LIMIT_QUERY: &str = "limit";
pub(crate) const OFFSET_QUERY: &str = "offset";

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct PlayBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uris: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<PlayOffset>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position_ms: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct PlayOffset {
    pub position: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct TransferPlaybackBody<'a> {
    pub device_ids: [&'a str; 1],
    pub play: bool,
}
