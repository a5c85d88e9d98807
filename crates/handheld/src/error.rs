use leaguewatch_artwork::FetchError;
use leaguewatch_data_layer::TransportError;
use leaguewatch_riot_api::ApiError;

/// Reasons a sync cycle aborts. Nothing is published after any of them.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("stats API: {0}")]
    Api(#[from] ApiError),

    #[error("artwork: {0}")]
    Fetch(#[from] FetchError),

    #[error("PNG encode: {0}")]
    Encode(#[from] image::ImageError),

    #[error("transport: {0}")]
    Transport(#[from] TransportError),

    #[error("{summoner} is in a game but not among its participants")]
    ParticipantNotFound { summoner: String },

    #[error("summoner {summoner_id} has no recent games")]
    EmptyMatchHistory { summoner_id: i64 },

    #[error("{stage} timed out")]
    Timeout { stage: &'static str },

    #[error("worker task failed: {0}")]
    Worker(String),
}
