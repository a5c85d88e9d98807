//! API response types.

use serde::{Deserialize, Serialize};

/// A summoner returned by the by-name lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summoner {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub profile_icon_id: i64,
    #[serde(default)]
    pub summoner_level: i64,
    #[serde(default)]
    pub revision_date: i64,
}

/// A player in an in-progress game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub summoner_name: String,
    pub champion_id: i64,
    #[serde(default)]
    pub summoner_id: i64,
    #[serde(default)]
    pub team_id: i64,
}

/// Spectator view of an in-progress game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentGame {
    #[serde(default)]
    pub game_id: i64,
    #[serde(default)]
    pub game_mode: String,
    pub participants: Vec<Participant>,
}

impl CurrentGame {
    /// First participant whose summoner name equals `name` exactly
    /// (case-sensitive).
    pub fn participant_named(&self, name: &str) -> Option<&Participant> {
        self.participants.iter().find(|p| p.summoner_name == name)
    }
}

/// One entry of a summoner's recent games, most recent first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentGame {
    #[serde(default)]
    pub game_id: i64,
    pub champion_id: i64,
    #[serde(default)]
    pub create_date: i64,
    #[serde(default)]
    pub game_mode: String,
}

/// Static champion data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Champion {
    pub id: i64,
    /// Asset identifier (e.g. `"MonkeyKing"`); absent in some payloads.
    #[serde(default)]
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub title: String,
}

impl Champion {
    /// Name used to address the champion's CDN artwork.
    ///
    /// Prefers `key`; otherwise the display name without spaces, dots and
    /// apostrophes.
    pub fn asset_name(&self) -> String {
        if !self.key.is_empty() {
            return self.key.clone();
        }
        self.name
            .chars()
            .filter(|c| !matches!(c, ' ' | '\'' | '.'))
            .collect()
    }
}

/// Recent games wrapper (internal).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RecentGames {
    #[serde(default)]
    #[allow(dead_code)]
    pub summoner_id: i64,
    #[serde(default)]
    pub games: Vec<RecentGame>,
}

/// Status object the API returns instead of a payload (internal).
#[derive(Debug, Deserialize)]
pub(crate) struct ApiStatus {
    #[serde(default)]
    pub status_code: u16,
    #[serde(default)]
    pub message: String,
}

/// Current-game body: either a game or a status object (internal).
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum CurrentGameBody {
    Status { status: ApiStatus },
    Game(CurrentGame),
}
