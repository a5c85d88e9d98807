use std::time::Duration;

/// Channel the wearable writes to when it wants fresh data.
pub const LEAGUE_PATH: &str = "/league";

/// Channel the handheld publishes synchronized records on.
pub const LEAGUE_BACK_PATH: &str = "/league_back";

/// Data-map key holding the producer's wall-clock timestamp (ms).
pub const KEY_TIME: &str = "time";

/// Data-map key holding the PNG splash asset.
pub const KEY_IMAGE: &str = "image";

/// Data-map key holding the display text.
pub const KEY_TEXT: &str = "text";

/// Summoner used when the configured name is empty.
pub const DEFAULT_SUMMONER_NAME: &str = "Faker";

/// Splash skin index (default skin).
pub const DEFAULT_SKIN: u32 = 0;

/// Period of the wearable's reconnect-and-request loop.
pub const RECONNECT_INTERVAL: Duration = Duration::from_secs(10 * 60);

/// Default per-stage deadline for stats API and CDN requests.
pub const STAGE_TIMEOUT: Duration = Duration::from_secs(10);

/// Time allowed to materialize and decode a received image.
pub const DECODE_TIMEOUT: Duration = Duration::from_secs(30);

/// Time allowed for the transport handshake.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

/// Cached artwork older than this is reported as stale (three missed
/// reconnect periods).
pub const STALE_THRESHOLD: Duration = Duration::from_secs(30 * 60);
