//! Publishes the splash and display text to the wearable.

use std::sync::Arc;

use image::DynamicImage;
use leaguewatch_artwork::encode_png;
use leaguewatch_data_layer::{DataLayer, TransportError};
use leaguewatch_protocol::{MonotonicClock, SyncRecord};
use tracing::{debug, info};

use crate::error::SyncError;

/// Writes [`SyncRecord`]s to `/league_back`.
pub struct PayloadPublisher {
    layer: Arc<dyn DataLayer>,
    clock: MonotonicClock,
}

impl PayloadPublisher {
    pub fn new(layer: Arc<dyn DataLayer>) -> Self {
        Self {
            layer,
            clock: MonotonicClock::new(),
        }
    }

    /// PNG-encodes `image` and publishes it with `display_text`.
    pub async fn publish(
        &self,
        image: DynamicImage,
        display_text: impl Into<String>,
    ) -> Result<SyncRecord, SyncError> {
        let png = tokio::task::spawn_blocking(move || encode_png(&image))
            .await
            .map_err(|e| SyncError::Worker(e.to_string()))??;
        self.publish_png(png, display_text).await
    }

    /// Publishes already PNG-encoded bytes.
    pub async fn publish_png(
        &self,
        png: Vec<u8>,
        display_text: impl Into<String>,
    ) -> Result<SyncRecord, SyncError> {
        let record = SyncRecord {
            image_bytes: png,
            display_text: display_text.into(),
            produced_at_millis: self.clock.next_millis(),
        };

        let item = record.to_data_item();
        match self.layer.put_data_item(item.clone()).await {
            Ok(_) => {}
            Err(TransportError::NotConnected) => {
                debug!("transport not connected, reconnecting before publish");
                self.layer.connect().await?;
                self.layer.put_data_item(item).await?;
            }
            Err(e) => return Err(e.into()),
        }

        info!(
            text = %record.display_text,
            time = record.produced_at_millis,
            image_len = record.image_bytes.len(),
            "sync record published"
        );
        Ok(record)
    }
}
