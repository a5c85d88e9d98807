use std::sync::Arc;

use image::{DynamicImage, Rgba, RgbaImage};
use leaguewatch_data_layer::{DataEvent, DataLayer, MemoryDataLayer};
use leaguewatch_handheld::PayloadPublisher;
use leaguewatch_protocol::SyncRecord;
use leaguewatch_protocol::constants::LEAGUE_BACK_PATH;
use leaguewatch_wear::{ApplyOutcome, ConsumeOutcome, Link, PayloadConsumer, RenderState};
use tokio::sync::broadcast;

struct Pair {
    publisher: PayloadPublisher,
    handheld: Arc<MemoryDataLayer>,
    wearable: Arc<MemoryDataLayer>,
    consumer: PayloadConsumer,
    events: broadcast::Receiver<DataEvent>,
}

async fn pair() -> Pair {
    let (handheld, wearable) = MemoryDataLayer::pair();
    let handheld = Arc::new(handheld);
    handheld.connect().await.unwrap();

    let wearable = Arc::new(wearable);
    let events = wearable.subscribe();
    let link = Arc::new(Link::new(wearable.clone()));
    link.ensure_connected().await.unwrap();

    Pair {
        publisher: PayloadPublisher::new(handheld.clone()),
        handheld,
        wearable,
        consumer: PayloadConsumer::new(link, Arc::new(RenderState::new())),
        events,
    }
}

impl Pair {
    async fn next_back_event(&mut self) -> DataEvent {
        loop {
            let event = self.events.recv().await.unwrap();
            if event.is_change_on(LEAGUE_BACK_PATH) {
                return event;
            }
        }
    }

    async fn consume_next(&mut self) -> ConsumeOutcome {
        let event = self.next_back_event().await;
        self.consumer.on_event(&event)
    }
}

async fn applied(outcome: ConsumeOutcome) -> ApplyOutcome {
    match outcome {
        ConsumeOutcome::Scheduled { handle, .. } => handle.await.unwrap(),
        other => panic!("expected scheduled decode, got {other:?}"),
    }
}

fn noise(w: u32, h: u32, seed: u32) -> DynamicImage {
    DynamicImage::ImageRgba8(RgbaImage::from_fn(w, h, |x, y| {
        let v = x.wrapping_mul(31) ^ y.wrapping_mul(17) ^ seed;
        Rgba([v as u8, (v >> 3) as u8, (v >> 5) as u8, 255])
    }))
}

#[tokio::test]
async fn publish_then_consume_round_trips_pixels_and_text() {
    let mut p = pair().await;

    for (seed, text) in [(1, "Faker"), (2, "Hide on bush"), (3, "")] {
        let image = noise(37, 23, seed);
        p.publisher.publish(image.clone(), text).await.unwrap();

        assert_eq!(applied(p.consume_next().await).await, ApplyOutcome::Applied);
        let snap = p.consumer.render_state().snapshot();
        assert_eq!(snap.text, text);
        assert_eq!(snap.bitmap.as_deref(), Some(&image.to_rgba8()));
    }
}

#[tokio::test]
async fn older_record_never_overwrites_newer() {
    let mut p = pair().await;

    let newer = p.publisher.publish(noise(4, 4, 1), "Newer").await.unwrap();
    assert_eq!(applied(p.consume_next().await).await, ApplyOutcome::Applied);

    // A delayed record from an earlier cycle arrives late.
    let late = SyncRecord {
        image_bytes: newer.image_bytes.clone(),
        display_text: "Late".into(),
        produced_at_millis: newer.produced_at_millis - 1_000,
    };
    p.handheld.put_data_item(late.to_data_item()).await.unwrap();
    assert!(matches!(p.consume_next().await, ConsumeOutcome::Stale { .. }));

    let snap = p.consumer.render_state().snapshot();
    assert_eq!(snap.text, "Newer");
    assert_eq!(snap.produced_at_millis, Some(newer.produced_at_millis));
}

#[tokio::test]
async fn redelivered_record_is_applied_once() {
    let mut p = pair().await;

    p.publisher.publish(noise(8, 8, 4), "Faker").await.unwrap();
    assert_eq!(applied(p.consume_next().await).await, ApplyOutcome::Applied);
    let before = p.consumer.render_state().snapshot();

    assert!(p.handheld.redeliver(LEAGUE_BACK_PATH));
    assert!(matches!(p.consume_next().await, ConsumeOutcome::Stale { .. }));
    assert!(Arc::ptr_eq(&before, &p.consumer.render_state().snapshot()));
}

#[tokio::test]
async fn consumer_reconnects_to_fetch_blob() {
    let mut p = pair().await;

    p.publisher.publish(noise(5, 5, 9), "Faker").await.unwrap();
    let event = p.next_back_event().await;

    // Connection dropped between notification and fetch.
    p.wearable.disconnect().await.unwrap();

    let outcome = p.consumer.on_event(&event);
    assert_eq!(applied(outcome).await, ApplyOutcome::Applied);
    assert_eq!(p.wearable.connect_count(), 2);
    assert_eq!(p.consumer.render_state().snapshot().text, "Faker");
}
