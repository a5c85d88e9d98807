//! League of Legends stats API client.
//!
//! Async client for the four endpoints the watch face needs: summoner by
//! name, current (spectator) game, recent games and static champion data.
//! Every request carries the API key from an explicit [`Credentials`] value.

pub mod client;
pub mod credentials;
pub mod types;

pub use client::{ApiError, Client, Endpoints};
pub use credentials::Credentials;
pub use types::{Champion, CurrentGame, Participant, RecentGame, Summoner};
