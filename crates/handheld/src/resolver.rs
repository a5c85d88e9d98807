//! Resolves which champion the face should show.
//!
//! Order of precedence: the champion override, the champion the summoner is
//! playing right now, then the champion of their most recent game.

use std::future::Future;
use std::time::Duration;

use leaguewatch_protocol::constants::STAGE_TIMEOUT;
use leaguewatch_riot_api::{ApiError, Client};
use tracing::{debug, info};

use crate::error::SyncError;
use crate::settings::Settings;

/// Per-stage deadlines for one sync cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageTimeouts {
    pub summoner_lookup: Duration,
    pub game_lookup: Duration,
    pub champion_lookup: Duration,
    pub image_fetch: Duration,
}

impl StageTimeouts {
    /// Same deadline for every stage.
    pub fn uniform(limit: Duration) -> Self {
        Self {
            summoner_lookup: limit,
            game_lookup: limit,
            champion_lookup: limit,
            image_fetch: limit,
        }
    }
}

impl Default for StageTimeouts {
    fn default() -> Self {
        Self::uniform(STAGE_TIMEOUT)
    }
}

/// Where a resolved champion came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Override,
    CurrentGame { champion_id: i64 },
    RecentGame { champion_id: i64 },
}

/// Champion chosen for one cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedChampion {
    /// Name addressing the champion's splash art.
    pub champion_name: String,
    pub resolution: Resolution,
}

/// Runs the stats API lookups for a sync cycle.
pub struct MatchResolver {
    client: Client,
    timeouts: StageTimeouts,
}

impl MatchResolver {
    pub fn new(client: Client, timeouts: StageTimeouts) -> Self {
        Self { client, timeouts }
    }

    pub fn timeouts(&self) -> &StageTimeouts {
        &self.timeouts
    }

    /// Resolves the champion for `settings`.
    ///
    /// An active override short-circuits: no request is made.
    pub async fn resolve(&self, settings: &Settings) -> Result<ResolvedChampion, SyncError> {
        if let Some(champion) = settings.active_override() {
            debug!(champion, "champion override active");
            return Ok(ResolvedChampion {
                champion_name: champion.to_string(),
                resolution: Resolution::Override,
            });
        }

        let name = settings.effective_summoner_name();
        let summoner = stage(
            "summoner_lookup",
            self.timeouts.summoner_lookup,
            self.client.summoner_by_name(name),
        )
        .await?;

        let current = stage(
            "game_lookup",
            self.timeouts.game_lookup,
            self.client.current_game(summoner.id),
        )
        .await?;

        let (champion_id, resolution) = match current {
            Some(game) => {
                let participant =
                    game.participant_named(name)
                        .ok_or_else(|| SyncError::ParticipantNotFound {
                            summoner: name.to_string(),
                        })?;
                let id = participant.champion_id;
                (id, Resolution::CurrentGame { champion_id: id })
            }
            None => {
                let games = stage(
                    "game_lookup",
                    self.timeouts.game_lookup,
                    self.client.recent_games(summoner.id),
                )
                .await?;
                let latest = games.first().ok_or(SyncError::EmptyMatchHistory {
                    summoner_id: summoner.id,
                })?;
                let id = latest.champion_id;
                (id, Resolution::RecentGame { champion_id: id })
            }
        };

        let champion = stage(
            "champion_lookup",
            self.timeouts.champion_lookup,
            self.client.champion_by_id(champion_id),
        )
        .await?;

        info!(
            summoner = name,
            champion = %champion.name,
            champion_id,
            ?resolution,
            "champion resolved"
        );
        Ok(ResolvedChampion {
            champion_name: champion.asset_name(),
            resolution,
        })
    }
}

/// Runs one API stage under its deadline.
async fn stage<T, F>(name: &'static str, limit: Duration, fut: F) -> Result<T, ApiError>
where
    F: Future<Output = Result<T, ApiError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(ApiError::Timeout { stage: name }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leaguewatch_test_support::*;
    use leaguewatch_riot_api::{Credentials, Endpoints};

    fn resolver(url: &str, timeouts: StageTimeouts) -> MatchResolver {
        let creds = Credentials::new("test-key").unwrap();
        let client = Client::with_endpoints(creds, Endpoints::single_host(url)).unwrap();
        MatchResolver::new(client, timeouts)
    }

    #[tokio::test]
    async fn override_skips_api() {
        let (url, hits, handle) = routing_server(vec![]).await;

        let settings = Settings::new("Faker").with_override("Ahri");
        let resolved = resolver(&url, StageTimeouts::default())
            .resolve(&settings)
            .await
            .unwrap();
        assert_eq!(resolved.champion_name, "Ahri");
        assert_eq!(resolved.resolution, Resolution::Override);
        assert!(hits.lock().unwrap().is_empty());

        handle.abort();
    }

    #[tokio::test]
    async fn current_game_uses_exact_participant() {
        let game = r#"{"gameId":1,"participants":[
            {"summonerName":"faker","championId":1},
            {"summonerName":"Faker","championId":99}
        ]}"#;
        let (url, hits, handle) = routing_server(vec![
            Route::json(SUMMONER, 200, FAKER),
            Route::json(CURRENT_GAME, 200, game),
            Route::json(CHAMPION, 200, LUX),
        ])
        .await;

        let resolved = resolver(&url, StageTimeouts::default())
            .resolve(&Settings::new("Faker"))
            .await
            .unwrap();
        assert_eq!(resolved.champion_name, "Lux");
        assert_eq!(resolved.resolution, Resolution::CurrentGame { champion_id: 99 });

        let hits = hits.lock().unwrap();
        assert_eq!(hits.len(), 3);
        assert!(hits[1].starts_with(&format!("{CURRENT_GAME}42")));
        assert!(hits[2].starts_with(&format!("{CHAMPION}99")));

        handle.abort();
    }

    #[tokio::test]
    async fn empty_name_resolves_default_summoner() {
        let game = r#"{"participants":[{"summonerName":"Faker","championId":99}]}"#;
        let (url, hits, handle) = routing_server(vec![
            Route::json(SUMMONER, 200, FAKER),
            Route::json(CURRENT_GAME, 200, game),
            Route::json(CHAMPION, 200, LUX),
        ])
        .await;

        let resolved = resolver(&url, StageTimeouts::default())
            .resolve(&Settings::default())
            .await
            .unwrap();
        assert_eq!(resolved.champion_name, "Lux");
        assert!(hits.lock().unwrap()[0].starts_with(&format!("{SUMMONER}Faker")));

        handle.abort();
    }

    #[tokio::test]
    async fn missing_participant_aborts() {
        let game = r#"{"participants":[{"summonerName":"FAKER","championId":99}]}"#;
        let (url, hits, handle) = routing_server(vec![
            Route::json(SUMMONER, 200, FAKER),
            Route::json(CURRENT_GAME, 200, game),
            Route::json(CHAMPION, 200, LUX),
        ])
        .await;

        let err = resolver(&url, StageTimeouts::default())
            .resolve(&Settings::new("Faker"))
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::ParticipantNotFound { ref summoner } if summoner == "Faker"));
        assert_eq!(hits.lock().unwrap().len(), 2);

        handle.abort();
    }

    #[tokio::test]
    async fn not_in_game_uses_most_recent_game() {
        let recent = r#"{"summonerId":42,"games":[
            {"gameId":9,"championId":103},
            {"gameId":8,"championId":99}
        ]}"#;
        let ahri = r#"{"id":103,"key":"Ahri","name":"Ahri"}"#;
        let (url, hits, handle) = routing_server(vec![
            Route::json(SUMMONER, 200, FAKER),
            Route::json(CURRENT_GAME, 404, ""),
            Route::json(RECENT_GAMES, 200, recent),
            Route::json(CHAMPION, 200, ahri),
        ])
        .await;

        let resolved = resolver(&url, StageTimeouts::default())
            .resolve(&Settings::new("Faker"))
            .await
            .unwrap();
        assert_eq!(resolved.champion_name, "Ahri");
        assert_eq!(resolved.resolution, Resolution::RecentGame { champion_id: 103 });
        assert!(hits.lock().unwrap()[3].starts_with(&format!("{CHAMPION}103")));

        handle.abort();
    }

    #[tokio::test]
    async fn status_body_counts_as_not_in_game() {
        let status = r#"{"status":{"status_code":404,"message":"Data not found"}}"#;
        let recent = r#"{"games":[{"championId":99}]}"#;
        let (url, _hits, handle) = routing_server(vec![
            Route::json(SUMMONER, 200, FAKER),
            Route::json(CURRENT_GAME, 200, status),
            Route::json(RECENT_GAMES, 200, recent),
            Route::json(CHAMPION, 200, LUX),
        ])
        .await;

        let resolved = resolver(&url, StageTimeouts::default())
            .resolve(&Settings::new("Faker"))
            .await
            .unwrap();
        assert_eq!(resolved.resolution, Resolution::RecentGame { champion_id: 99 });

        handle.abort();
    }

    #[tokio::test]
    async fn empty_history_aborts() {
        let (url, _hits, handle) = routing_server(vec![
            Route::json(SUMMONER, 200, FAKER),
            Route::json(CURRENT_GAME, 404, ""),
            Route::json(RECENT_GAMES, 200, r#"{"games":[]}"#),
        ])
        .await;

        let err = resolver(&url, StageTimeouts::default())
            .resolve(&Settings::new("Faker"))
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::EmptyMatchHistory { summoner_id: 42 }));

        handle.abort();
    }

    #[tokio::test]
    async fn unknown_summoner_aborts() {
        let (url, hits, handle) = routing_server(vec![Route::json(SUMMONER, 200, "{}")]).await;

        let err = resolver(&url, StageTimeouts::default())
            .resolve(&Settings::new("Nobody"))
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::Api(ApiError::UnknownSummoner(_))));
        assert_eq!(hits.lock().unwrap().len(), 1);

        handle.abort();
    }

    #[tokio::test]
    async fn slow_stage_times_out() {
        let (url, _hits, handle) = routing_server(vec![
            Route::json(SUMMONER, 200, FAKER),
            Route::json(CURRENT_GAME, 404, "").delayed(Duration::from_secs(5)),
        ])
        .await;

        let timeouts = StageTimeouts {
            game_lookup: Duration::from_millis(100),
            ..StageTimeouts::default()
        };
        let err = resolver(&url, timeouts)
            .resolve(&Settings::new("Faker"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SyncError::Api(ApiError::Timeout { stage: "game_lookup" })
        ));

        handle.abort();
    }

    #[test]
    fn default_timeouts_are_ten_seconds() {
        let t = StageTimeouts::default();
        assert_eq!(t.summoner_lookup, Duration::from_secs(10));
        assert_eq!(t, StageTimeouts::uniform(Duration::from_secs(10)));
    }
}
