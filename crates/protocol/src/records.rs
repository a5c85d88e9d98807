//! The two records carried over the pairing transport.

use crate::constants::{KEY_IMAGE, KEY_TEXT, KEY_TIME, LEAGUE_BACK_PATH, LEAGUE_PATH};
use crate::data_map::{Asset, DataItem, DataMap};

/// Errors converting a [`DataItem`] into a typed record.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("unexpected path {actual} (expected {expected})")]
    WrongPath {
        expected: &'static str,
        actual: String,
    },

    #[error("missing or mistyped key: {0}")]
    MissingKey(&'static str),
}

/// Sync request written by the wearable on `/league`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerRecord {
    pub produced_at_millis: i64,
}

impl TriggerRecord {
    pub fn to_data_item(&self) -> DataItem {
        let mut data = DataMap::new();
        data.put_long(KEY_TIME, self.produced_at_millis);
        DataItem::new(LEAGUE_PATH, data)
    }

    pub fn from_data_item(item: &DataItem) -> Result<Self, RecordError> {
        expect_path(item, LEAGUE_PATH)?;
        let produced_at_millis = item
            .data
            .get_long(KEY_TIME)
            .ok_or(RecordError::MissingKey(KEY_TIME))?;
        Ok(Self { produced_at_millis })
    }
}

/// Splash image, display text and timestamp published on `/league_back`.
///
/// `image_bytes` is always PNG-encoded.
#[derive(Clone, PartialEq, Eq)]
pub struct SyncRecord {
    pub image_bytes: Vec<u8>,
    pub display_text: String,
    pub produced_at_millis: i64,
}

impl SyncRecord {
    /// Builds the data item with the image inlined as an asset.
    pub fn to_data_item(&self) -> DataItem {
        let mut data = DataMap::new();
        data.put_asset(KEY_IMAGE, Asset::from_bytes(self.image_bytes.clone()));
        data.put_string(KEY_TEXT, self.display_text.clone());
        data.put_long(KEY_TIME, self.produced_at_millis);
        DataItem::new(LEAGUE_BACK_PATH, data)
    }
}

impl std::fmt::Debug for SyncRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncRecord")
            .field("image_len", &self.image_bytes.len())
            .field("display_text", &self.display_text)
            .field("produced_at_millis", &self.produced_at_millis)
            .finish()
    }
}

/// A received [`SyncRecord`] whose image has not been materialized yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncRecordRef {
    pub image: Asset,
    pub display_text: String,
    pub produced_at_millis: i64,
}

impl SyncRecordRef {
    pub fn from_data_item(item: &DataItem) -> Result<Self, RecordError> {
        expect_path(item, LEAGUE_BACK_PATH)?;
        let image = item
            .data
            .get_asset(KEY_IMAGE)
            .cloned()
            .ok_or(RecordError::MissingKey(KEY_IMAGE))?;
        let display_text = item
            .data
            .get_string(KEY_TEXT)
            .ok_or(RecordError::MissingKey(KEY_TEXT))?
            .to_string();
        let produced_at_millis = item
            .data
            .get_long(KEY_TIME)
            .ok_or(RecordError::MissingKey(KEY_TIME))?;
        Ok(Self {
            image,
            display_text,
            produced_at_millis,
        })
    }
}

fn expect_path(item: &DataItem, expected: &'static str) -> Result<(), RecordError> {
    if item.path == expected {
        Ok(())
    } else {
        Err(RecordError::WrongPath {
            expected,
            actual: item.path.clone(),
        })
    }
}
