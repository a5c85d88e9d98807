//! Handheld sync service.
//!
//! Listens for trigger records on `/league` and runs one sync cycle per
//! trigger: resolve the champion, fetch its splash, publish the payload.
//! Cycles run one at a time on a single worker. A trigger arriving while a
//! cycle is running queues at most one follow-up cycle; further triggers
//! are folded into it.

use std::sync::Arc;

use leaguewatch_artwork::SplashFetcher;
use leaguewatch_data_layer::{DataLayer, TransportError};
use leaguewatch_protocol::constants::{DEFAULT_SKIN, LEAGUE_PATH};
use leaguewatch_protocol::{SyncRecord, TriggerRecord};
use tokio::sync::{broadcast, mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::SyncError;
use crate::publisher::PayloadPublisher;
use crate::resolver::MatchResolver;
use crate::settings::Settings;

/// Reacts to sync requests from the wearable.
pub struct SyncService {
    layer: Arc<dyn DataLayer>,
    resolver: MatchResolver,
    fetcher: SplashFetcher,
    publisher: PayloadPublisher,
    settings: watch::Receiver<Settings>,
}

impl SyncService {
    pub fn new(
        layer: Arc<dyn DataLayer>,
        resolver: MatchResolver,
        fetcher: SplashFetcher,
        settings: watch::Receiver<Settings>,
    ) -> Self {
        let publisher = PayloadPublisher::new(Arc::clone(&layer));
        Self {
            layer,
            resolver,
            fetcher,
            publisher,
            settings,
        }
    }

    /// Runs one full cycle with the current settings.
    pub async fn run_cycle(&self) -> Result<SyncRecord, SyncError> {
        let settings = self.settings.borrow().clone();
        let resolved = self.resolver.resolve(&settings).await?;

        let limit = self.resolver.timeouts().image_fetch;
        let image = tokio::time::timeout(
            limit,
            self.fetcher.fetch(&resolved.champion_name, DEFAULT_SKIN),
        )
        .await
        .map_err(|_| SyncError::Timeout {
            stage: "image_fetch",
        })??;

        debug!(
            champion = %resolved.champion_name,
            width = image.width(),
            height = image.height(),
            "splash fetched"
        );
        self.publisher.publish(image, settings.display_text()).await
    }

    /// Serves triggers until `cancel` fires.
    ///
    /// Fails only if the initial connect fails.
    pub async fn run(self: Arc<Self>, cancel: CancellationToken) -> Result<(), TransportError> {
        self.layer.connect().await?;
        let mut events = self.layer.subscribe();
        let (tx, mut rx) = mpsc::channel::<i64>(1);

        let worker = {
            let service = Arc::clone(&self);
            let cancel = cancel.clone();
            tokio::spawn(async move {
                loop {
                    let trigger = tokio::select! {
                        _ = cancel.cancelled() => break,
                        next = rx.recv() => match next {
                            Some(t) => t,
                            None => break,
                        },
                    };
                    match service.run_cycle().await {
                        Ok(record) => debug!(
                            trigger,
                            time = record.produced_at_millis,
                            "sync cycle complete"
                        ),
                        Err(e) => warn!(trigger, error = %e, "sync cycle aborted"),
                    }
                }
            })
        };

        info!(node = %self.layer.node_id(), "sync service listening");
        loop {
            let event = tokio::select! {
                _ = cancel.cancelled() => break,
                event = events.recv() => event,
            };
            match event {
                Ok(event) if event.is_change_on(LEAGUE_PATH) => {
                    match TriggerRecord::from_data_item(&event.item) {
                        Ok(trigger) => enqueue(&tx, trigger.produced_at_millis),
                        Err(e) => warn!(error = %e, "malformed trigger record"),
                    }
                }
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    warn!(missed, "event bus lagged, scheduling a sync");
                    enqueue(&tx, 0);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }

        drop(tx);
        let _ = worker.await;
        info!("sync service stopped");
        Ok(())
    }
}

fn enqueue(tx: &mpsc::Sender<i64>, trigger: i64) {
    match tx.try_send(trigger) {
        Ok(()) => debug!(trigger, "sync scheduled"),
        Err(mpsc::error::TrySendError::Full(_)) => {
            debug!(trigger, "sync already pending, trigger coalesced")
        }
        Err(mpsc::error::TrySendError::Closed(_)) => warn!(trigger, "sync worker gone"),
    }
}
