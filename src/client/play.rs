use log::debug;
use reqwest::Method;
use serde_json::Value;

use super::{
    object::{PlayBody, PlayOffset, DEVICE_ID_QUERY},
    Client,
};
use crate::{
    error::{Error, Result},
    uri::Uri,
};

/// What to start playing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Play {
    /// Resume the current playback.
    Resume,
    /// Play a list of tracks or episodes.
    Items(Vec<Uri>),
    /// Play an album, artist, playlist or show.
    Context(Uri),
}

/// A request to start or resume playback. Send it with [send](PlayRequestBuilder::send).
#[derive(Debug)]
#[must_use = "the request is only sent with send()"]
pub struct PlayRequestBuilder<'a> {
    client: &'a Client,
    play: Play,
    offset: Option<u32>,
    position_ms: Option<u32>,
    device_id: Option<String>,
}

impl Play {
    /// Play a list of tracks or episodes.
    pub fn items<I, U>(items: I) -> Self
    where
        I: IntoIterator<Item = U>,
        U: Into<Uri>,
    {
        Play::Items(items.into_iter().map(Into::into).collect())
    }

    /// Play an album, artist, playlist or show.
    pub fn context<U>(context: U) -> Self
    where
        U: Into<Uri>,
    {
        Play::Context(context.into())
    }
}

impl<'a> PlayRequestBuilder<'a> {
    pub(crate) fn new(client: &'a Client, play: Play) -> Self {
        Self {
            client,
            play,
            offset: None,
            position_ms: None,
            device_id: None,
        }
    }

    /// Start from the item at this zero-based index in the items or the context.
    pub fn offset(self, offset: u32) -> Self {
        Self {
            offset: Some(offset),
            ..self
        }
    }

    /// Start this many milliseconds into the first item.
    pub fn position_ms(self, position_ms: u32) -> Self {
        Self {
            position_ms: Some(position_ms),
            ..self
        }
    }

    /// Play on a certain device in the user's account instead of the active one.
    pub fn device_id<S>(self, device_id: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            device_id: Some(device_id.into()),
            ..self
        }
    }

    pub async fn send(self) -> Result<()> {
        let body = build_play_body(&self.play, self.offset, self.position_ms)?
            .map(serde_json::to_value)
            .transpose()?;
        debug!("Play request body: {:?}", body);

        let connection = self.client.connection();
        let url = connection.build_endpoint("me/player/play", &[(DEVICE_ID_QUERY, self.device_id)])?;
        connection.request::<Value>(Method::PUT, url, body.as_ref()).await?;

        Ok(())
    }
}

/// The body of a play request. Resuming without any options has no body.
pub(crate) fn build_play_body(play: &Play, offset: Option<u32>, position_ms: Option<u32>) -> Result<Option<PlayBody>> {
    let mut body = PlayBody {
        offset: offset.map(|position| PlayOffset { position }),
        position_ms,
        ..Default::default()
    };

    match play {
        Play::Resume => {
            if offset.is_some() {
                return Err(Error::BadRequest(String::from(
                    "an offset can only be given when playing items or a context",
                )));
            }

            if position_ms.is_none() {
                return Ok(None);
            }
        }

        Play::Items(items) => {
            if items.is_empty() {
                return Err(Error::BadRequest(String::from("no items to play")));
            }

            if let Some(unplayable) = items.iter().find(|uri| !uri.is_playable()) {
                return Err(Error::BadRequest(format!("{unplayable} can't be played on its own")));
            }

            body.uris = Some(items.iter().map(Uri::to_string).collect());
        }

        Play::Context(context) => {
            if !context.is_context() {
                return Err(Error::BadRequest(format!("{context} can't be played as a context")));
            }

            body.context_uri = Some(context.to_string());
        }
    }

    Ok(Some(body))
}
