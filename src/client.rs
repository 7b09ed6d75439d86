//! The client: playback control, element lookup, search and the current user.

mod object;
mod play;
mod search;

pub use self::{
    play::{Play, PlayRequestBuilder},
    search::SearchResults,
};

use std::{path::PathBuf, sync::Arc};

use log::debug;
use reqwest::Method;
use serde_json::Value;

use self::object::{
    TransferPlaybackBody, DEVICE_ID_QUERY, LIMIT_QUERY, OFFSET_QUERY, QUEUE_URI_QUERY, SEARCH_QUERY, SEARCH_TYPE_QUERY,
    SHUFFLE_STATE_QUERY,
};
use crate::{
    authentication::Authentication,
    cache::Cache,
    connection::{Connection, ConnectionConfig},
    element::{Album, Artist, Element, Episode, Me, Playlist, Show, Track, User},
    error::{Error, Result},
    model::{
        playback::{Device, DevicesResponse, PlaybackState},
        search::SearchResponse,
    },
    uri::{ItemType, Uri},
};

/// A Spotify client.
///
/// The client is cheap to clone; every clone shares the same connection, authentication and element registry.
/// Elements returned by the client load their data lazily the first time an unknown field is accessed.
#[derive(Debug, Clone)]
pub struct Client {
    cache: Cache,
}

/// Builder for a [Client](crate::client::Client) with non-default connection settings.
#[derive(Debug, Clone)]
pub struct ClientBuilder {
    authentication: Authentication,
    cache_dir: Option<PathBuf>,
    config: ConnectionConfig,
}

impl ClientBuilder {
    /// Store loaded elements as JSON files in this directory and read them from there on later loads.
    pub fn cache_dir<P>(self, cache_dir: P) -> Self
    where
        P: Into<PathBuf>,
    {
        Self {
            cache_dir: Some(cache_dir.into()),
            ..self
        }
    }

    pub fn api_base_url<S>(mut self, api_base_url: S) -> Self
    where
        S: Into<String>,
    {
        self.config.api_base_url = api_base_url.into();
        self
    }

    pub fn accounts_base_url<S>(mut self, accounts_base_url: S) -> Self
    where
        S: Into<String>,
    {
        self.config.accounts_base_url = accounts_base_url.into();
        self
    }

    /// The redirect URI registered for the application. The library listens for the authorization callback on its
    /// port.
    pub fn redirect_uri<S>(mut self, redirect_uri: S) -> Self
    where
        S: Into<String>,
    {
        self.config.redirect_uri = redirect_uri.into();
        self
    }

    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.config.max_retries = max_retries;
        self
    }

    pub fn open_browser(mut self, open_browser: bool) -> Self {
        self.config.open_browser = open_browser;
        self
    }

    pub fn build(self) -> Result<Client> {
        let connection = Connection::new(self.authentication, self.config)?;

        Ok(Client {
            cache: Cache::new(connection, self.cache_dir),
        })
    }
}

impl Client {
    /// Returns a new client with the default connection settings.
    pub fn new(authentication: Authentication, cache_dir: Option<PathBuf>) -> Result<Self> {
        let builder = Self::builder(authentication);
        let builder = match cache_dir {
            Some(cache_dir) => builder.cache_dir(cache_dir),
            None => builder,
        };

        builder.build()
    }

    pub fn builder(authentication: Authentication) -> ClientBuilder {
        ClientBuilder {
            authentication,
            cache_dir: None,
            config: ConnectionConfig::default(),
        }
    }

    /// The client's current authentication, including any tokens received since the client was created. Save it to
    /// skip authorizing the next time.
    pub fn authentication_data(&self) -> Authentication {
        self.connection().authentication()
    }

    /// Whether the current access token has expired. Requests refresh it on their own if they can.
    pub fn is_expired(&self) -> bool {
        self.connection().is_expired()
    }

    /// Use an access token received from elsewhere.
    pub fn set_token<S>(&self, token: S)
    where
        S: Into<String>,
    {
        self.connection().set_token(token.into());
    }

    pub(crate) fn connection(&self) -> &Connection {
        self.cache.connection()
    }

    /// Start or resume playback. The request is sent with [send](PlayRequestBuilder::send).
    ///
    /// ```no_run
    /// # use spotifyre::{Authentication, Client, Play, Uri};
    /// # async fn f(client: Client) -> spotifyre::Result<()> {
    /// let album: Uri = "spotify:album:0tDsHtvN9YNuZjlqHvDY2P".parse()?;
    /// client.play(Play::context(album)).offset(2).send().await?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn play(&self, play: Play) -> PlayRequestBuilder<'_> {
        PlayRequestBuilder::new(self, play)
    }

    pub async fn pause(&self, device_id: Option<&str>) -> Result<()> {
        self.player_command(Method::PUT, "me/player/pause", device_id, &[]).await
    }

    /// Skip to the next item.
    pub async fn next(&self, device_id: Option<&str>) -> Result<()> {
        self.player_command(Method::POST, "me/player/next", device_id, &[]).await
    }

    /// Skip to the previous item.
    pub async fn prev(&self, device_id: Option<&str>) -> Result<()> {
        self.player_command(Method::POST, "me/player/previous", device_id, &[])
            .await
    }

    pub async fn set_playback_shuffle(&self, state: bool, device_id: Option<&str>) -> Result<()> {
        self.player_command(
            Method::PUT,
            "me/player/shuffle",
            device_id,
            &[(SHUFFLE_STATE_QUERY, Some(state.to_string()))],
        )
        .await
    }

    /// Add a track or an episode to the end of the queue.
    pub async fn add_to_queue<U>(&self, uri: U, device_id: Option<&str>) -> Result<()>
    where
        U: TryInto<Uri>,
        Error: From<U::Error>,
    {
        let uri = to_uri(uri)?;
        if !uri.is_playable() {
            return Err(Error::BadRequest(format!("{uri} can't be added to the queue")));
        }

        self.player_command(
            Method::POST,
            "me/player/queue",
            device_id,
            &[(QUEUE_URI_QUERY, Some(uri.to_string()))],
        )
        .await
    }

    /// The user's available devices.
    pub async fn devices(&self) -> Result<Vec<Device>> {
        let connection = self.connection();
        let response: DevicesResponse = connection
            .get(connection.build_endpoint("me/player/devices", &[])?)
            .await?;

        Ok(response.devices)
    }

    /// Move playback to another device. If `play` is false, the playback state is kept as it is.
    pub async fn transfer_playback(&self, device_id: &str, play: bool) -> Result<()> {
        let body = serde_json::to_value(TransferPlaybackBody {
            device_ids: [device_id],
            play,
        })?;

        let connection = self.connection();
        connection
            .request::<Value>(Method::PUT, connection.build_endpoint("me/player", &[])?, Some(&body))
            .await?;

        Ok(())
    }

    /// The current playback state, or `None` if nothing is playing on any device.
    pub async fn playing(&self) -> Result<Option<PlaybackState>> {
        let connection = self.connection();
        connection
            .request(Method::GET, connection.build_endpoint("me/player", &[])?, None)
            .await
    }

    /// The current user.
    pub fn me(&self) -> Arc<Me> {
        self.cache.get_me()
    }

    /// The current user's playlists.
    pub async fn user_playlists(&self) -> Result<Vec<Arc<Playlist>>> {
        self.me().playlists().await
    }

    /// The element behind any URI.
    pub fn get_element<U>(&self, uri: U) -> Result<Element>
    where
        U: TryInto<Uri>,
        Error: From<U::Error>,
    {
        Ok(self.cache.get_element(&to_uri(uri)?, None))
    }

    pub fn get_track<U>(&self, uri: U) -> Result<Arc<Track>>
    where
        U: TryInto<Uri>,
        Error: From<U::Error>,
    {
        self.cache.get_track(&to_uri(uri)?, None)
    }

    pub fn get_episode<U>(&self, uri: U) -> Result<Arc<Episode>>
    where
        U: TryInto<Uri>,
        Error: From<U::Error>,
    {
        self.cache.get_episode(&to_uri(uri)?, None)
    }

    pub fn get_album<U>(&self, uri: U) -> Result<Arc<Album>>
    where
        U: TryInto<Uri>,
        Error: From<U::Error>,
    {
        self.cache.get_album(&to_uri(uri)?, None)
    }

    pub fn get_artist<U>(&self, uri: U) -> Result<Arc<Artist>>
    where
        U: TryInto<Uri>,
        Error: From<U::Error>,
    {
        self.cache.get_artist(&to_uri(uri)?, None)
    }

    /// A playlist. Its contents are loaded at the latest snapshot when first accessed.
    pub fn get_playlist<U>(&self, uri: U) -> Result<Arc<Playlist>>
    where
        U: TryInto<Uri>,
        Error: From<U::Error>,
    {
        self.cache.get_playlist(&to_uri(uri)?, None, None)
    }

    pub fn get_show<U>(&self, uri: U) -> Result<Arc<Show>>
    where
        U: TryInto<Uri>,
        Error: From<U::Error>,
    {
        self.cache.get_show(&to_uri(uri)?, None)
    }

    pub fn get_user<U>(&self, uri: U) -> Result<Arc<User>>
    where
        U: TryInto<Uri>,
        Error: From<U::Error>,
    {
        self.cache.get_user(&to_uri(uri)?, None)
    }

    /// Search the catalog for the given item types. Users can't be searched for.
    pub async fn search(
        &self,
        query: &str,
        types: &[ItemType],
        limit: Option<u32>,
        offset: Option<u32>,
    ) -> Result<SearchResults> {
        let connection = self.connection();
        let url = connection.build_endpoint(
            "search",
            &[
                (SEARCH_QUERY, Some(query.to_owned())),
                (SEARCH_TYPE_QUERY, Some(search::search_type_string(types)?)),
                (LIMIT_QUERY, limit.map(|limit| limit.to_string())),
                (OFFSET_QUERY, offset.map(|offset| offset.to_string())),
            ],
        )?;

        let response: SearchResponse = connection.get(url).await?;
        let results = search::apply_search_response(&self.cache, response);
        debug!(
            "Search for {:?} found {} tracks, {} episodes, {} albums, {} artists, {} playlists and {} shows",
            query,
            results.tracks.len(),
            results.episodes.len(),
            results.albums.len(),
            results.artists.len(),
            results.playlists.len(),
            results.shows.len()
        );

        Ok(results)
    }

    pub async fn search_track(&self, query: &str, limit: Option<u32>, offset: Option<u32>) -> Result<Vec<Arc<Track>>> {
        Ok(self.search(query, &[ItemType::Track], limit, offset).await?.tracks)
    }

    pub async fn search_episode(
        &self,
        query: &str,
        limit: Option<u32>,
        offset: Option<u32>,
    ) -> Result<Vec<Arc<Episode>>> {
        Ok(self.search(query, &[ItemType::Episode], limit, offset).await?.episodes)
    }

    pub async fn search_album(&self, query: &str, limit: Option<u32>, offset: Option<u32>) -> Result<Vec<Arc<Album>>> {
        Ok(self.search(query, &[ItemType::Album], limit, offset).await?.albums)
    }

    pub async fn search_artist(
        &self,
        query: &str,
        limit: Option<u32>,
        offset: Option<u32>,
    ) -> Result<Vec<Arc<Artist>>> {
        Ok(self.search(query, &[ItemType::Artist], limit, offset).await?.artists)
    }

    pub async fn search_playlist(
        &self,
        query: &str,
        limit: Option<u32>,
        offset: Option<u32>,
    ) -> Result<Vec<Arc<Playlist>>> {
        Ok(self.search(query, &[ItemType::Playlist], limit, offset).await?.playlists)
    }

    pub async fn search_show(&self, query: &str, limit: Option<u32>, offset: Option<u32>) -> Result<Vec<Arc<Show>>> {
        Ok(self.search(query, &[ItemType::Show], limit, offset).await?.shows)
    }

    /// Search for tracks and episodes. The tracks come first.
    pub async fn search_playable(&self, query: &str, limit: Option<u32>, offset: Option<u32>) -> Result<Vec<Element>> {
        Ok(self
            .search(query, &[ItemType::Track, ItemType::Episode], limit, offset)
            .await?
            .playable())
    }

    async fn player_command(
        &self,
        method: Method,
        endpoint: &str,
        device_id: Option<&str>,
        params: &[(&str, Option<String>)],
    ) -> Result<()> {
        let mut params = params.to_vec();
        params.push((DEVICE_ID_QUERY, device_id.map(str::to_owned)));

        let connection = self.connection();
        let url = connection.build_endpoint(endpoint, &params)?;
        connection.request::<Value>(method, url, None).await?;

        Ok(())
    }
}

fn to_uri<U>(uri: U) -> Result<Uri>
where
    U: TryInto<Uri>,
    Error: From<U::Error>,
{
    Ok(uri.try_into()?)
}
