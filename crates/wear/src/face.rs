//! Watch face session: the sync entry points the face engine calls.

use std::sync::Arc;

use leaguewatch_data_layer::{DataLayer, TransportError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::consumer::PayloadConsumer;
use crate::link::Link;
use crate::render_state::{RenderSnapshot, RenderState};
use crate::trigger::{TriggerChannel, TriggerOutcome, TriggerReason};

/// Wires the trigger channel, payload consumer and render state of one
/// face instance.
pub struct FaceSession {
    trigger: TriggerChannel,
    consumer: PayloadConsumer,
}

impl FaceSession {
    pub fn new(layer: Arc<dyn DataLayer>) -> Self {
        let link = Arc::new(Link::new(layer));
        Self::from_parts(
            TriggerChannel::new(Arc::clone(&link)),
            PayloadConsumer::new(link, Arc::new(RenderState::new())),
        )
    }

    pub fn from_parts(trigger: TriggerChannel, consumer: PayloadConsumer) -> Self {
        Self { trigger, consumer }
    }

    pub fn link(&self) -> &Arc<Link> {
        self.trigger.link()
    }

    pub fn render_state(&self) -> &Arc<RenderState> {
        self.consumer.render_state()
    }

    /// Current snapshot for the renderer.
    pub fn snapshot(&self) -> Arc<RenderSnapshot> {
        self.render_state().snapshot()
    }

    pub async fn on_visible(&self) -> Result<TriggerOutcome, TransportError> {
        self.trigger.request_sync(TriggerReason::Visible).await
    }

    pub async fn on_tap(&self) -> Result<TriggerOutcome, TransportError> {
        self.trigger.request_sync(TriggerReason::Tap).await
    }

    /// Subscribes to payloads, requests an initial sync, then refreshes
    /// periodically until `cancel` fires.
    pub async fn run(&self, cancel: CancellationToken) {
        let events = self.link().layer().subscribe();

        match self.trigger.request_sync(TriggerReason::Connected).await {
            Ok(outcome) => debug!(?outcome, "initial sync request"),
            Err(e) => warn!(error = %e, "initial sync request failed"),
        }

        info!("face session running");
        tokio::join!(
            self.consumer.run(events, cancel.clone()),
            self.trigger.run_periodic(cancel),
        );
        info!("face session stopped");
    }
}
