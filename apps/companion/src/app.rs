//! Wires a handheld and a wearable node over an in-process pairing.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use leaguewatch_artwork::SplashFetcher;
use leaguewatch_data_layer::MemoryDataLayer;
use leaguewatch_handheld::{MatchResolver, SyncService};
use leaguewatch_protocol::constants::STALE_THRESHOLD;
use leaguewatch_riot_api::{Client, Credentials};
use leaguewatch_wear::{FaceSession, Freshness};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::config::CompanionConfig;

/// How often the simulated face reports what it would draw.
const RENDER_REPORT_INTERVAL: Duration = Duration::from_secs(60);

/// Runs both devices until shutdown is requested.
pub async fn run(config: CompanionConfig) -> anyhow::Result<()> {
    let cancel = CancellationToken::new();

    let key_path = config.api_key_path();
    let credentials = Credentials::from_key_file(&key_path)
        .with_context(|| format!("reading API key from {}", key_path.display()))?;

    // -- Handheld --
    let (phone, wearable) = MemoryDataLayer::pair();
    let client = Client::with_endpoints(credentials, config.endpoints())?;
    let resolver = MatchResolver::new(client, config.stage_timeouts());
    let fetcher = SplashFetcher::with_base_url(config.cdn_base_url.clone())?;
    let (_settings_tx, settings_rx) = watch::channel(config.settings());
    let service = Arc::new(SyncService::new(
        Arc::new(phone),
        resolver,
        fetcher,
        settings_rx,
    ));

    let service_task = {
        let service = Arc::clone(&service);
        let cancel = cancel.clone();
        tokio::spawn(async move { service.run(cancel).await })
    };

    // -- Wearable --
    let face = Arc::new(FaceSession::new(Arc::new(wearable)));
    let face_task = {
        let face = Arc::clone(&face);
        let cancel = cancel.clone();
        tokio::spawn(async move { face.run(cancel).await })
    };

    tracing::info!(
        summoner = config.settings().effective_summoner_name(),
        "companion ready"
    );

    // -- Main loop: report render state until shutdown --
    let mut report = tokio::time::interval(RENDER_REPORT_INTERVAL);
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("shutdown signal received");
                break;
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("SIGINT received, shutting down");
                break;
            }
            _ = report.tick() => report_render_state(&face),
        }
    }

    // -- Graceful shutdown --
    cancel.cancel();
    face_task.await?;
    service_task.await??;
    Ok(())
}

fn report_render_state(face: &FaceSession) {
    let snapshot = face.snapshot();
    let link = face.link().state();
    match snapshot.freshness(chrono::Utc::now(), STALE_THRESHOLD) {
        Freshness::Empty => tracing::info!(?link, "face has no data yet"),
        Freshness::Fresh => tracing::info!(
            ?link,
            text = %snapshot.text,
            time = snapshot.produced_at_millis.unwrap_or_default(),
            "face up to date"
        ),
        Freshness::Stale { since } => tracing::warn!(
            ?link,
            text = %snapshot.text,
            since = %since,
            "face data is stale"
        ),
    }
}
