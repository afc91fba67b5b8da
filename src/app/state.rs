//! Application state shared across routes

use std::sync::Arc;

use crate::config::Config;
use crate::game::SessionRegistry;
use crate::store::{LeaderboardClient, LeaderboardStore};
use crate::util::rate_limit::{create_limiter, Limiter, LEADERBOARD_RATE_LIMIT};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub leaderboard: LeaderboardStore,
    pub leaderboard_client: LeaderboardClient,
    pub sessions: Arc<SessionRegistry>,
    /// Global limit on leaderboard submissions
    pub submission_limiter: Arc<Limiter>,
}

impl AppState {
    pub fn new(config: Config, leaderboard: LeaderboardStore) -> Self {
        let config = Arc::new(config);

        // Sessions submit finished runs through this client
        let leaderboard_client = LeaderboardClient::new(&config);

        Self {
            config,
            leaderboard,
            leaderboard_client,
            sessions: Arc::new(SessionRegistry::new()),
            submission_limiter: create_limiter(LEADERBOARD_RATE_LIMIT),
        }
    }
}
