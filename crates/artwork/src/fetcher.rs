//! Splash art download from the static asset CDN.

use image::DynamicImage;
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::header::CONTENT_TYPE;
use tracing::debug;

use crate::codec::{self, DecodeError};

const DEFAULT_CDN_BASE_URL: &str = "http://ddragon.leagueoflegends.com";

/// Errors from splash downloads.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("CDN returned status {status} for {url}")]
    Status { status: u16, url: String },

    #[error("CDN returned non-image content type {0}")]
    NotAnImage(String),

    #[error("decode failed: {0}")]
    Decode(#[from] DecodeError),

    #[error("decode worker failed: {0}")]
    Worker(String),
}

/// Downloads and decodes champion splash art.
pub struct SplashFetcher {
    http: reqwest::Client,
    cdn_base_url: String,
}

impl SplashFetcher {
    /// Creates a fetcher against the public CDN.
    pub fn new() -> Result<Self, FetchError> {
        Self::with_base_url(DEFAULT_CDN_BASE_URL)
    }

    /// Creates a fetcher against a custom CDN host.
    pub fn with_base_url(cdn_base_url: impl Into<String>) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            http,
            cdn_base_url: cdn_base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// URL of a champion's splash for the given skin index.
    pub fn splash_url(&self, champion_name: &str, skin: u32) -> String {
        let encoded = utf8_percent_encode(champion_name, NON_ALPHANUMERIC);
        format!(
            "{}/cdn/img/champion/splash/{encoded}_{skin}.jpg",
            self.cdn_base_url
        )
    }

    /// Downloads and decodes a splash.
    ///
    /// Decoding runs on the blocking pool.
    pub async fn fetch(&self, champion_name: &str, skin: u32) -> Result<DynamicImage, FetchError> {
        let url = self.splash_url(champion_name, skin);
        let resp = self.http.get(&url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url,
            });
        }

        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        if !content_type.is_empty() && !content_type.starts_with("image/") {
            return Err(FetchError::NotAnImage(content_type));
        }

        let bytes = resp.bytes().await?;
        debug!(url = %url, len = bytes.len(), content_type = %content_type, "downloaded splash");

        let image = tokio::task::spawn_blocking(move || codec::decode(&bytes))
            .await
            .map_err(|e| FetchError::Worker(e.to_string()))??;
        Ok(image)
    }
}
