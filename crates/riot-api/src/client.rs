//! Stats API client.
//!
//! Async HTTP client using `reqwest`; the API key is appended to every
//! request as the `api_key` query parameter.

use std::collections::HashMap;

use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use tracing::debug;

use crate::credentials::Credentials;
use crate::types::{Champion, CurrentGame, CurrentGameBody, RecentGame, RecentGames, Summoner};

/// Errors from the stats API client.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error {status}: {body}")]
    Status { status: u16, body: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown summoner: {0}")]
    UnknownSummoner(String),

    #[error("{stage} timed out")]
    Timeout { stage: &'static str },

    #[error("invalid API key")]
    InvalidKey,

    #[error("reading API key file: {0}")]
    KeyFile(#[from] std::io::Error),
}

/// Base URLs and routing values for the stats API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// Host serving summoner, game and spectator endpoints.
    pub regional_base_url: String,
    /// Host serving static data.
    pub global_base_url: String,
    /// Region segment (e.g. `na`).
    pub region: String,
    /// Spectator platform id (e.g. `NA1`).
    pub platform: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            regional_base_url: "https://na.api.pvp.net".into(),
            global_base_url: "https://global.api.pvp.net".into(),
            region: "na".into(),
            platform: "NA1".into(),
        }
    }
}

impl Endpoints {
    /// Routes every endpoint to one base URL (mock servers, proxies).
    pub fn single_host(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            regional_base_url: base_url.clone(),
            global_base_url: base_url,
            ..Self::default()
        }
    }

    fn summoner_by_name(&self, name: &str) -> String {
        let compact: String = name.chars().filter(|c| *c != ' ').collect();
        let encoded = utf8_percent_encode(&compact, NON_ALPHANUMERIC);
        format!(
            "{}/api/lol/{}/v1.4/summoner/by-name/{encoded}",
            self.regional_base_url, self.region
        )
    }

    fn recent_games(&self, summoner_id: i64) -> String {
        format!(
            "{}/api/lol/{}/v1.3/game/by-summoner/{summoner_id}/recent",
            self.regional_base_url, self.region
        )
    }

    fn champion_by_id(&self, champion_id: i64) -> String {
        format!(
            "{}/api/lol/static-data/{}/v1.2/champion/{champion_id}",
            self.global_base_url, self.region
        )
    }

    fn current_game(&self, summoner_id: i64) -> String {
        format!(
            "{}/observer-mode/rest/consumer/getSpectatorGameInfo/{}/{summoner_id}",
            self.regional_base_url, self.platform
        )
    }
}

/// Stats API client.
pub struct Client {
    http: reqwest::Client,
    credentials: Credentials,
    endpoints: Endpoints,
}

impl Client {
    /// Creates a client against the default endpoints.
    pub fn new(credentials: Credentials) -> Result<Self, ApiError> {
        Self::with_endpoints(credentials, Endpoints::default())
    }

    /// Creates a client against custom endpoints.
    pub fn with_endpoints(credentials: Credentials, endpoints: Endpoints) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("leaguewatch/", env!("CARGO_PKG_VERSION"))),
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http,
            credentials,
            endpoints,
        })
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Performs an authenticated GET, returning status and body.
    async fn get_raw(&self, url: &str) -> Result<(StatusCode, Vec<u8>), ApiError> {
        let resp = self
            .http
            .get(url)
            .query(&[("api_key", self.credentials.api_key())])
            .send()
            .await?;
        let status = resp.status();
        let body = resp.bytes().await?.to_vec();
        debug!(url, status = status.as_u16(), len = body.len(), "stats API response");
        Ok((status, body))
    }

    /// Performs an authenticated GET, failing on non-success status.
    async fn get(&self, url: &str) -> Result<Vec<u8>, ApiError> {
        let (status, body) = self.get_raw(url).await?;
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }
        Ok(body)
    }

    /// Looks up a summoner by display name.
    ///
    /// The response is keyed by the standardized name (lowercase, no
    /// spaces). A 404 or an empty map yields [`ApiError::UnknownSummoner`].
    pub async fn summoner_by_name(&self, name: &str) -> Result<Summoner, ApiError> {
        let url = self.endpoints.summoner_by_name(name);
        let (status, body) = self.get_raw(&url).await?;
        if status == StatusCode::NOT_FOUND {
            return Err(ApiError::UnknownSummoner(name.to_string()));
        }
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        let mut by_key: HashMap<String, Summoner> = serde_json::from_slice(&body)?;
        let key = standardized_name(name);
        if let Some(summoner) = by_key.remove(&key) {
            return Ok(summoner);
        }
        by_key
            .into_values()
            .next()
            .ok_or_else(|| ApiError::UnknownSummoner(name.to_string()))
    }

    /// Returns the summoner's in-progress game, or `None` when the API
    /// reports that no game is in progress (404 or a status body).
    pub async fn current_game(&self, summoner_id: i64) -> Result<Option<CurrentGame>, ApiError> {
        let url = self.endpoints.current_game(summoner_id);
        let (status, body) = self.get_raw(&url).await?;
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        match serde_json::from_slice::<CurrentGameBody>(&body)? {
            CurrentGameBody::Game(game) => Ok(Some(game)),
            CurrentGameBody::Status { status } => {
                debug!(
                    summoner_id,
                    code = status.status_code,
                    message = %status.message,
                    "no current game"
                );
                Ok(None)
            }
        }
    }

    /// Returns the summoner's recent games, most recent first.
    pub async fn recent_games(&self, summoner_id: i64) -> Result<Vec<RecentGame>, ApiError> {
        let body = self.get(&self.endpoints.recent_games(summoner_id)).await?;
        let resp: RecentGames = serde_json::from_slice(&body)?;
        Ok(resp.games)
    }

    /// Returns static data for a champion.
    pub async fn champion_by_id(&self, champion_id: i64) -> Result<Champion, ApiError> {
        let body = self.get(&self.endpoints.champion_by_id(champion_id)).await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

/// Lowercase name without spaces, as used for summoner map keys.
fn standardized_name(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}
