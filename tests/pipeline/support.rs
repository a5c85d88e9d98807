//! Shared fixtures: a handheld and a face paired against the mock server.

use std::sync::Arc;
use std::time::Duration;

use leaguewatch_artwork::SplashFetcher;
use leaguewatch_data_layer::MemoryDataLayer;
use leaguewatch_handheld::{MatchResolver, Settings, StageTimeouts, SyncService};
use leaguewatch_riot_api::{Client, Credentials, Endpoints};
use leaguewatch_wear::{FaceSession, RenderSnapshot};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub use leaguewatch_test_support::*;

/// A handheld sync service and a wearable face sharing one pairing.
pub struct Rig {
    pub face: Arc<FaceSession>,
    pub handheld: Arc<MemoryDataLayer>,
    pub service: Arc<SyncService>,
    pub settings: watch::Sender<Settings>,
    pub hits: Hits,
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
    server: JoinHandle<()>,
}

impl Rig {
    pub async fn start(routes: Vec<Route>, settings: Settings) -> Self {
        let (url, hits, server) = routing_server(routes).await;
        let (handheld, wearable) = MemoryDataLayer::pair();
        let handheld = Arc::new(handheld);

        let creds = Credentials::new("pipeline-key").unwrap();
        let client = Client::with_endpoints(creds, Endpoints::single_host(url.clone())).unwrap();
        let resolver = MatchResolver::new(client, StageTimeouts::uniform(Duration::from_secs(5)));
        let fetcher = SplashFetcher::with_base_url(url).unwrap();
        let (settings_tx, settings_rx) = watch::channel(settings);
        let service = Arc::new(SyncService::new(
            handheld.clone(),
            resolver,
            fetcher,
            settings_rx,
        ));
        let face = Arc::new(FaceSession::new(Arc::new(wearable)));

        let cancel = CancellationToken::new();
        let mut tasks = Vec::new();
        {
            let service = Arc::clone(&service);
            let cancel = cancel.clone();
            tasks.push(tokio::spawn(async move {
                service.run(cancel).await.unwrap();
            }));
        }
        // Let the service subscribe before the face's first trigger.
        tokio::time::sleep(Duration::from_millis(50)).await;
        {
            let face = Arc::clone(&face);
            let cancel = cancel.clone();
            tasks.push(tokio::spawn(async move { face.run(cancel).await }));
        }

        Self {
            face,
            handheld,
            service,
            settings: settings_tx,
            hits,
            cancel,
            tasks,
            server,
        }
    }

    /// Waits until the face shows a record newer than `after`.
    pub async fn wait_for_update(&self, after: Option<i64>) -> Arc<RenderSnapshot> {
        tokio::time::timeout(Duration::from_secs(10), async {
            loop {
                let snap = self.face.snapshot();
                if snap.produced_at_millis.is_some() && snap.produced_at_millis > after {
                    return snap;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("face was not updated in time")
    }

    pub async fn shutdown(self) {
        self.cancel.cancel();
        for task in self.tasks {
            task.await.unwrap();
        }
        self.server.abort();
    }
}
