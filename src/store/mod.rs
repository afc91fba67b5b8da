//! Leaderboard storage and the client sessions submit through

pub mod client;
pub mod leaderboard;

pub use client::LeaderboardClient;
pub use leaderboard::{LeaderboardStore, NewEntry, StoreError};
