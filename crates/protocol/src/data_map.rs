//! Key/value data items exchanged over the pairing transport.
//!
//! A [`DataItem`] is addressed by a path (e.g. `/league_back`) and carries a
//! [`DataMap`]. Binary payloads travel as [`Asset`]s: a SHA-256 content
//! digest, optionally with the bytes inlined. Producers inline the bytes on
//! put; the transport strips them into its blob store and observers receive
//! only the digest, fetching the blob lazily.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Content-addressed binary attachment.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    digest: String,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "base64_opt")]
    data: Option<Vec<u8>>,
}

impl Asset {
    /// Creates an asset with inline bytes, computing its digest.
    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self {
            digest: digest_of(&data),
            data: Some(data),
        }
    }

    /// Creates a bare reference to an already stored blob.
    pub fn from_digest(digest: impl Into<String>) -> Self {
        Self {
            digest: digest.into(),
            data: None,
        }
    }

    /// Hex-encoded SHA-256 of the blob.
    pub fn digest(&self) -> &str {
        &self.digest
    }

    /// Inline bytes, if still attached.
    pub fn data(&self) -> Option<&[u8]> {
        self.data.as_deref()
    }

    /// Detaches the inline bytes, leaving a bare reference behind.
    pub fn take_data(&mut self) -> Option<Vec<u8>> {
        self.data.take()
    }
}

impl fmt::Debug for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Asset")
            .field("digest", &self.digest)
            .field("inline_len", &self.data.as_ref().map(Vec::len))
            .finish()
    }
}

/// Returns the hex SHA-256 digest used to address a blob.
pub fn digest_of(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// A single typed value in a [`DataMap`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum DataValue {
    Long(i64),
    String(String),
    Asset(Asset),
}

/// Ordered string-keyed map of [`DataValue`]s.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataMap(BTreeMap<String, DataValue>);

impl DataMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_long(&mut self, key: &str, value: i64) {
        self.0.insert(key.to_string(), DataValue::Long(value));
    }

    pub fn put_string(&mut self, key: &str, value: impl Into<String>) {
        self.0.insert(key.to_string(), DataValue::String(value.into()));
    }

    pub fn put_asset(&mut self, key: &str, asset: Asset) {
        self.0.insert(key.to_string(), DataValue::Asset(asset));
    }

    pub fn get_long(&self, key: &str) -> Option<i64> {
        match self.0.get(key) {
            Some(DataValue::Long(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_string(&self, key: &str) -> Option<&str> {
        match self.0.get(key) {
            Some(DataValue::String(v)) => Some(v),
            _ => None,
        }
    }

    pub fn get_asset(&self, key: &str) -> Option<&Asset> {
        match self.0.get(key) {
            Some(DataValue::Asset(a)) => Some(a),
            _ => None,
        }
    }

    /// Every asset in the map.
    pub fn assets(&self) -> impl Iterator<Item = &Asset> {
        self.0.values().filter_map(|v| match v {
            DataValue::Asset(a) => Some(a),
            _ => None,
        })
    }

    /// Mutable access to every asset in the map.
    pub fn assets_mut(&mut self) -> impl Iterator<Item = &mut Asset> {
        self.0.values_mut().filter_map(|v| match v {
            DataValue::Asset(a) => Some(a),
            _ => None,
        })
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A path-addressed record on the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataItem {
    pub path: String,
    pub data: DataMap,
}

impl DataItem {
    pub fn new(path: impl Into<String>, data: DataMap) -> Self {
        Self {
            path: path.into(),
            data,
        }
    }
}

mod base64_opt {
    use base64::{Engine, engine::general_purpose::STANDARD};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(data: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error> {
        match data {
            Some(bytes) => serializer.serialize_str(&STANDARD.encode(bytes)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Vec<u8>>, D::Error> {
        let s = Option::<String>::deserialize(deserializer)?;
        s.map(|s| STANDARD.decode(&s).map_err(serde::de::Error::custom))
            .transpose()
    }
}
