//! Applies payloads received on `/league_back` to the render state.
//!
//! Receiving is cheap and synchronous: the record is parsed and admitted
//! or rejected on the spot. Materializing the image (blob fetch, PNG
//! decode) runs on a spawned task, off the render path. Each admitted
//! record gets a request id; a finished decode is applied only if no newer
//! record was admitted in the meantime.
//!
//! A record is stale once a record at least as new has been applied, or is
//! still decoding. A failed decode releases its timestamp, so a redelivery
//! of the same record is admitted again.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::Utc;
use image::RgbaImage;
use leaguewatch_artwork::{DecodeError, decode_png};
use leaguewatch_data_layer::{DataEvent, DataEventKind, TransportError};
use leaguewatch_protocol::SyncRecordRef;
use leaguewatch_protocol::constants::{DECODE_TIMEOUT, LEAGUE_BACK_PATH};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::link::{Link, SyncGuard};
use crate::render_state::RenderState;

/// Errors materializing a payload image.
#[derive(Debug, thiserror::Error)]
pub enum ConsumeError {
    #[error("asset fetch: {0}")]
    Transport(#[from] TransportError),

    #[error("image decode: {0}")]
    Decode(#[from] DecodeError),

    #[error("decode timed out")]
    Timeout,

    #[error("decode worker failed: {0}")]
    Worker(String),
}

/// What happened to a received event.
#[derive(Debug)]
pub enum ConsumeOutcome {
    /// Deletion, or a path other than `/league_back`.
    Ignored,
    /// Not newer than the record on screen or the one decoding.
    Stale {
        produced_at_millis: i64,
        newest_millis: i64,
    },
    Malformed,
    /// Admitted; the handle resolves once the decode finishes.
    Scheduled {
        request_id: u64,
        handle: JoinHandle<ApplyOutcome>,
    },
}

/// Result of a scheduled decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    /// A newer record was admitted while this one decoded.
    Superseded,
    /// Fetch or decode failed; the render state is unchanged.
    Failed,
}

#[derive(Debug, Default)]
struct Admission {
    /// Timestamp of the record currently on screen.
    applied_millis: Option<i64>,
    /// Timestamp of the latest admitted record while it decodes.
    pending_millis: Option<i64>,
    latest_request: u64,
}

impl Admission {
    fn newest_millis(&self) -> Option<i64> {
        self.applied_millis.max(self.pending_millis)
    }
}

fn lock(admission: &Mutex<Admission>) -> MutexGuard<'_, Admission> {
    admission.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Consumes `/league_back` change events.
pub struct PayloadConsumer {
    link: Arc<Link>,
    state: Arc<RenderState>,
    admission: Arc<Mutex<Admission>>,
    decode_timeout: Duration,
}

impl PayloadConsumer {
    pub fn new(link: Arc<Link>, state: Arc<RenderState>) -> Self {
        Self {
            link,
            state,
            admission: Arc::default(),
            decode_timeout: DECODE_TIMEOUT,
        }
    }

    pub fn with_decode_timeout(mut self, decode_timeout: Duration) -> Self {
        self.decode_timeout = decode_timeout;
        self
    }

    pub fn render_state(&self) -> &Arc<RenderState> {
        &self.state
    }

    /// Handles one change event.
    pub fn on_event(&self, event: &DataEvent) -> ConsumeOutcome {
        if event.kind == DataEventKind::Deleted || event.item.path != LEAGUE_BACK_PATH {
            return ConsumeOutcome::Ignored;
        }

        let record = match SyncRecordRef::from_data_item(&event.item) {
            Ok(record) => record,
            Err(e) => {
                warn!(error = %e, source = %event.source_node, "dropping malformed sync record");
                return ConsumeOutcome::Malformed;
            }
        };

        let request_id = {
            let mut admission = lock(&self.admission);
            if let Some(newest) = admission.newest_millis() {
                if record.produced_at_millis <= newest {
                    debug!(
                        time = record.produced_at_millis,
                        newest, "ignoring stale or repeated sync record"
                    );
                    return ConsumeOutcome::Stale {
                        produced_at_millis: record.produced_at_millis,
                        newest_millis: newest,
                    };
                }
            }
            admission.pending_millis = Some(record.produced_at_millis);
            admission.latest_request += 1;
            admission.latest_request
        };

        debug!(
            request_id,
            time = record.produced_at_millis,
            text = %record.display_text,
            "sync record admitted"
        );
        let sync = self.link.begin_sync();
        let handle = tokio::spawn(materialize(
            sync,
            Arc::clone(&self.link),
            Arc::clone(&self.state),
            Arc::clone(&self.admission),
            self.decode_timeout,
            request_id,
            record,
        ));
        ConsumeOutcome::Scheduled { request_id, handle }
    }

    /// Consumes events until `cancel` fires or the bus closes.
    pub async fn run(&self, mut events: broadcast::Receiver<DataEvent>, cancel: CancellationToken) {
        loop {
            let event = tokio::select! {
                _ = cancel.cancelled() => break,
                event = events.recv() => event,
            };
            match event {
                Ok(event) => {
                    self.on_event(&event);
                }
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    warn!(missed, "event bus lagged, some payloads were skipped");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
        debug!("payload consumer stopped");
    }
}

async fn materialize(
    _sync: SyncGuard,
    link: Arc<Link>,
    state: Arc<RenderState>,
    admission: Arc<Mutex<Admission>>,
    decode_timeout: Duration,
    request_id: u64,
    record: SyncRecordRef,
) -> ApplyOutcome {
    let decoded = match tokio::time::timeout(decode_timeout, load_bitmap(&link, &record)).await {
        Ok(result) => result,
        Err(_) => Err(ConsumeError::Timeout),
    };

    let mut admission = lock(&admission);
    let bitmap = match decoded {
        Ok(bitmap) => bitmap,
        Err(e) => {
            if admission.latest_request == request_id {
                admission.pending_millis = None;
            }
            warn!(request_id, error = %e, "payload image unavailable, keeping previous state");
            return ApplyOutcome::Failed;
        }
    };

    if admission.latest_request != request_id {
        debug!(
            request_id,
            latest = admission.latest_request,
            "decode superseded, discarding"
        );
        return ApplyOutcome::Superseded;
    }

    admission.applied_millis = Some(record.produced_at_millis);
    admission.pending_millis = None;
    let (width, height) = bitmap.dimensions();
    state.apply(
        bitmap,
        record.display_text.clone(),
        record.produced_at_millis,
        Utc::now(),
    );
    drop(admission);

    info!(
        request_id,
        text = %record.display_text,
        time = record.produced_at_millis,
        width,
        height,
        "render state updated"
    );
    ApplyOutcome::Applied
}

async fn load_bitmap(link: &Link, record: &SyncRecordRef) -> Result<RgbaImage, ConsumeError> {
    let bytes = match record.image.data() {
        Some(inline) => inline.to_vec(),
        None => {
            link.ensure_connected().await?;
            link.layer().fetch_asset(&record.image).await?
        }
    };
    let bitmap = tokio::task::spawn_blocking(move || decode_png(&bytes).map(|img| img.to_rgba8()))
        .await
        .map_err(|e| ConsumeError::Worker(e.to_string()))??;
    Ok(bitmap)
}
