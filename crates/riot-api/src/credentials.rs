//! API key handling.

use std::fmt;
use std::path::Path;

use crate::client::ApiError;

/// Stats API key, passed explicitly to every component that issues
/// requests.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    api_key: String,
}

impl Credentials {
    /// Wraps a key. Surrounding whitespace is trimmed; an empty key is
    /// rejected.
    pub fn new(api_key: impl AsRef<str>) -> Result<Self, ApiError> {
        let api_key = api_key.as_ref().trim();
        if api_key.is_empty() {
            return Err(ApiError::InvalidKey);
        }
        Ok(Self {
            api_key: api_key.to_string(),
        })
    }

    /// Reads the key from a text file containing only the key.
    pub fn from_key_file(path: &Path) -> Result<Self, ApiError> {
        let content = std::fs::read_to_string(path)?;
        Self::new(content)
    }

    pub(crate) fn api_key(&self) -> &str {
        &self.api_key
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"<redacted>")
            .finish()
    }
}
