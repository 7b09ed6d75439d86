//! Credentials and tokens used to access the Web API.
//!
//! An [Authentication] can be built in a few ways, depending on what's known beforehand:
//!
//! - [Authentication::new] with a client ID, client secret and scopes. The first request runs the authorization code
//!   flow: the user is sent to Spotify in their browser and redirected back to a local listener.
//! - [Authentication::with_refresh_token] with a refresh token saved from an earlier authorization. The flow is skipped
//!   and the refresh token is exchanged for an access token directly.
//! - [Authentication::with_token] with an access token generated elsewhere. It can't be refreshed.
//! - [Authentication::without_secret] with only a client ID and scopes. The authorization code flow uses PKCE instead
//!   of the client secret.
//!
//! The current authentication, including any refreshed tokens, can be retrieved from the client and saved as JSON to
//! be reused later.

use std::{
    path::Path,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use serde::{Deserialize, Serialize};

use crate::{error::Result, scope::Scopes};

/// Credentials and tokens for accessing the Web API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Authentication {
    #[serde(default)]
    pub(crate) client_id: Option<String>,
    #[serde(default)]
    pub(crate) client_secret: Option<String>,
    #[serde(default)]
    pub(crate) scope: Scopes,
    #[serde(default)]
    pub(crate) show_dialog: bool,
    #[serde(default)]
    pub(crate) refresh_token: Option<String>,
    #[serde(default)]
    pub(crate) token: Option<String>,
    /// Unix timestamp in seconds.
    #[serde(default)]
    pub(crate) token_expires: f64,
}

impl Authentication {
    /// Authenticate with an application's client ID and secret. The user authorizes the given scopes in their browser.
    pub fn new<I, S, C>(client_id: I, client_secret: S, scope: C) -> Self
    where
        I: Into<String>,
        S: Into<String>,
        C: Into<Scopes>,
    {
        Self {
            client_id: Some(client_id.into()),
            client_secret: Some(client_secret.into()),
            scope: scope.into(),
            ..Default::default()
        }
    }

    /// Authenticate with only an application's client ID. The user authorizes the given scopes in their browser, and
    /// the authorization is secured with PKCE.
    pub fn without_secret<I, C>(client_id: I, scope: C) -> Self
    where
        I: Into<String>,
        C: Into<Scopes>,
    {
        Self {
            client_id: Some(client_id.into()),
            scope: scope.into(),
            ..Default::default()
        }
    }

    /// Use an access token generated elsewhere. It expires at the given Unix timestamp in seconds and can't be
    /// refreshed.
    pub fn with_token<T>(token: T, token_expires: f64) -> Self
    where
        T: Into<String>,
    {
        Self {
            token: Some(token.into()),
            token_expires,
            ..Default::default()
        }
    }

    /// Reuse an earlier authorization through its refresh token.
    pub fn with_refresh_token<T>(self, refresh_token: T) -> Self
    where
        T: Into<String>,
    {
        Self {
            refresh_token: Some(refresh_token.into()),
            ..self
        }
    }

    /// Whether Spotify should ask the user to authorize the application even if they already have.
    pub fn show_dialog(self, show_dialog: bool) -> Self {
        Self { show_dialog, ..self }
    }

    /// Reads a saved authentication from a JSON file.
    pub fn load<P>(path: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let contents = std::fs::read(path)?;
        Ok(serde_json::from_slice(&contents)?)
    }

    /// Saves this authentication as a JSON file.
    pub fn save<P>(&self, path: P) -> Result<()>
    where
        P: AsRef<Path>,
    {
        let contents = serde_json::to_vec_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn client_id(&self) -> Option<&str> {
        self.client_id.as_deref()
    }

    pub fn client_secret(&self) -> Option<&str> {
        self.client_secret.as_deref()
    }

    pub fn scope(&self) -> &Scopes {
        &self.scope
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Unix timestamp in seconds after which the access token is expired.
    pub fn token_expires(&self) -> f64 {
        self.token_expires
    }

    /// Whether the access token has expired at the given Unix timestamp in seconds.
    pub fn is_expired(&self, now: f64) -> bool {
        self.token_expires < now
    }

    /// Whether a new access token can be requested without user interaction.
    pub(crate) fn can_refresh(&self) -> bool {
        self.refresh_token.is_some() && self.client_id.is_some()
    }

    /// Whether a new access token can be requested at all.
    pub(crate) fn can_authorize(&self) -> bool {
        self.client_id.is_some()
    }

    pub(crate) fn set_token(&mut self, token: String, lifetime: Duration) {
        self.token = Some(token);
        self.token_expires = unix_now() + lifetime.as_secs_f64();
    }
}

/// The current time as a Unix timestamp in seconds.
pub(crate) fn unix_now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|since_epoch| since_epoch.as_secs_f64())
        .unwrap_or_default()
}
