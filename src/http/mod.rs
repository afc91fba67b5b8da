//! HTTP surface: health, WebSocket upgrade and the leaderboard API

pub mod routes;

pub use routes::build_router;
