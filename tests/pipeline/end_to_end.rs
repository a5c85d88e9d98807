use std::time::Duration;

use leaguewatch_artwork::decode_png;
use leaguewatch_data_layer::DataLayer;
use leaguewatch_handheld::Settings;
use leaguewatch_protocol::SyncRecordRef;
use leaguewatch_protocol::constants::LEAGUE_BACK_PATH;
use leaguewatch_wear::{Freshness, TriggerOutcome};

use crate::support::*;

const IN_GAME_AS_LUX: &str = r#"{"gameId":7,"participants":[
    {"summonerName":"Bjergsen","championId":7},
    {"summonerName":"Faker","championId":99}
]}"#;

#[tokio::test]
async fn live_game_reaches_the_face() {
    let rig = Rig::start(
        vec![
            Route::json(SUMMONER, 200, FAKER),
            Route::json(CURRENT_GAME, 200, IN_GAME_AS_LUX),
            Route::json(CHAMPION, 200, LUX),
            Route::jpeg(SPLASH, 400, 600),
        ],
        Settings::new("Faker"),
    )
    .await;

    let snap = rig.wait_for_update(None).await;
    assert_eq!(snap.text, "Faker");
    let bitmap = snap.bitmap.as_ref().unwrap();
    assert_eq!(bitmap.dimensions(), (400, 600));

    // The face shows exactly the PNG the handheld published.
    let item = rig.handheld.data_item(LEAGUE_BACK_PATH).unwrap();
    let record = SyncRecordRef::from_data_item(&item).unwrap();
    assert_eq!(Some(record.produced_at_millis), snap.produced_at_millis);
    let png = rig.handheld.fetch_asset(&record.image).await.unwrap();
    assert_eq!(decode_png(&png).unwrap().to_rgba8(), **bitmap);

    let hits = rig.hits.lock().unwrap().clone();
    assert_eq!(hits.len(), 4, "unexpected requests: {hits:?}");
    assert!(hits[0].starts_with(&format!("{SUMMONER}Faker?api_key=pipeline-key")));
    assert!(hits[1].starts_with(&format!("{CURRENT_GAME}42")));
    assert!(hits[2].starts_with(&format!("{CHAMPION}99")));
    assert_eq!(hits[3], format!("{SPLASH}Lux_0.jpg"));

    assert_eq!(
        snap.freshness(chrono::Utc::now(), Duration::from_secs(1800)),
        Freshness::Fresh
    );

    rig.shutdown().await;
}

#[tokio::test]
async fn idle_summoner_shows_last_champion() {
    let rig = Rig::start(
        vec![
            Route::json(SUMMONER, 200, FAKER),
            Route::json(CURRENT_GAME, 404, ""),
            Route::json(RECENT_GAMES, 200, r#"{"games":[{"championId":99},{"championId":7}]}"#),
            Route::json(CHAMPION, 200, LUX),
            Route::jpeg(SPLASH, 40, 60),
        ],
        Settings::new("Faker"),
    )
    .await;

    let snap = rig.wait_for_update(None).await;
    assert_eq!(snap.text, "Faker");
    let hits = rig.hits.lock().unwrap().clone();
    assert!(hits.iter().any(|h| h.starts_with(&format!("{CHAMPION}99"))));

    rig.shutdown().await;
}

#[tokio::test]
async fn override_shows_chosen_champion_without_api() {
    let rig = Rig::start(
        vec![Route::jpeg(SPLASH, 40, 60)],
        Settings::new("Faker").with_override("Ahri"),
    )
    .await;

    let snap = rig.wait_for_update(None).await;
    assert_eq!(snap.text, "Ahri");
    assert_eq!(
        rig.hits.lock().unwrap().clone(),
        vec![format!("{SPLASH}Ahri_0.jpg")]
    );

    rig.shutdown().await;
}

#[tokio::test]
async fn tap_refreshes_with_new_settings() {
    let rig = Rig::start(
        vec![Route::jpeg(SPLASH, 20, 30)],
        Settings::new("Faker").with_override("Ahri"),
    )
    .await;
    let first = rig.wait_for_update(None).await;
    assert_eq!(first.text, "Ahri");

    rig.settings.send_replace(Settings::new("Faker").with_override("Lux"));
    let outcome = rig.face.on_tap().await.unwrap();
    assert!(matches!(outcome, TriggerOutcome::Published { .. }));

    let second = rig.wait_for_update(first.produced_at_millis).await;
    assert_eq!(second.text, "Lux");
    assert!(second.produced_at_millis > first.produced_at_millis);

    rig.shutdown().await;
}

#[tokio::test]
async fn failed_cycle_leaves_face_untouched() {
    let rig = Rig::start(
        vec![
            Route::json(SUMMONER, 200, FAKER),
            Route::json(
                CURRENT_GAME,
                200,
                r#"{"participants":[{"summonerName":"faker","championId":99}]}"#,
            ),
        ],
        Settings::new("Faker"),
    )
    .await;

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert!(rig.handheld.data_item(LEAGUE_BACK_PATH).is_none());
    let snap = rig.face.snapshot();
    assert!(snap.bitmap.is_none());
    assert!(snap.text.is_empty());

    // A direct cycle reports why.
    let err = rig.service.run_cycle().await.unwrap_err();
    assert!(err.to_string().contains("not among its participants"));

    rig.shutdown().await;
}
