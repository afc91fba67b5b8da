//! HTTP client for submitting finished runs to the leaderboard service

use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::game::session::FinalStats;

use super::leaderboard::LeaderboardEntry;

/// POST body accepted by the leaderboard service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreSubmission {
    pub username: String,
    pub difficulty: String,
    pub wave: u32,
    pub enemies_defeated: u32,
    #[serde(rename = "turretType")]
    pub turret_type: String,
    pub date_time: String,
}

impl ScoreSubmission {
    pub fn from_stats(username: &str, stats: &FinalStats, submitted_at: DateTime<Utc>) -> Self {
        Self {
            username: username.to_string(),
            difficulty: stats.difficulty.as_str().to_string(),
            wave: stats.wave,
            enemies_defeated: stats.enemies_killed,
            turret_type: stats.turret_type.as_str().to_string(),
            date_time: submitted_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

/// Row echoed back after a successful submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmittedScore {
    pub id: u64,
    pub username: String,
    pub wave: u32,
    pub enemies_defeated: u32,
    pub date_time: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardResponse {
    pub leaderboard: Vec<LeaderboardEntry>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Leaderboard REST client
#[derive(Clone)]
pub struct LeaderboardClient {
    client: Client,
    base_url: String,
}

impl LeaderboardClient {
    pub fn new(config: &Config) -> Self {
        Self::with_base_url(&config.leaderboard_url)
    }

    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/api/leaderboard", self.base_url)
    }

    /// Submit a run. Not retried; the caller decides whether to resend.
    pub async fn submit(&self, submission: &ScoreSubmission) -> Result<SubmittedScore, ClientError> {
        let response = self
            .client
            .post(self.endpoint())
            .json(submission)
            .send()
            .await
            .map_err(ClientError::Request)?;

        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        response.json().await.map_err(ClientError::Parse)
    }

    /// Fetch the ordered table
    pub async fn fetch(&self) -> Result<Vec<LeaderboardEntry>, ClientError> {
        let response = self
            .client
            .get(self.endpoint())
            .send()
            .await
            .map_err(ClientError::Request)?;

        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        let body: LeaderboardResponse = response.json().await.map_err(ClientError::Parse)?;
        Ok(body.leaderboard)
    }

    async fn api_error(response: reqwest::Response) -> ClientError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .map(|b| b.error)
            .unwrap_or(body);
        ClientError::Api { status, message }
    }
}

/// Leaderboard client errors
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Request(reqwest::Error),

    #[error("Leaderboard error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    Parse(reqwest::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::settings::{Difficulty, TurretType};
    use chrono::TimeZone;

    fn stats() -> FinalStats {
        FinalStats {
            wave: 6,
            enemies_killed: 38,
            difficulty: Difficulty::Hard,
            turret_type: TurretType::MachineGun,
        }
    }

    #[test]
    fn submission_uses_service_field_names() {
        let at = Utc.with_ymd_and_hms(2024, 6, 1, 12, 30, 0).unwrap();
        let submission = ScoreSubmission::from_stats("ana", &stats(), at);
        let value = serde_json::to_value(&submission).unwrap();

        assert_eq!(value["turretType"], "machineGun");
        assert_eq!(value["difficulty"], "hard");
        assert_eq!(value["enemies_defeated"], 38);
        assert_eq!(value["date_time"], "2024-06-01T12:30:00.000Z");
        assert!(value.get("turret_type").is_none());
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let client = LeaderboardClient::with_base_url("http://localhost:3000/");
        assert_eq!(client.endpoint(), "http://localhost:3000/api/leaderboard");
    }

    #[tokio::test]
    async fn unreachable_service_reports_request_error() {
        // Port 9 (discard) is not expected to be listening on loopback
        let client = LeaderboardClient::with_base_url("http://127.0.0.1:9");
        let at = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let result = client.submit(&ScoreSubmission::from_stats("ana", &stats(), at)).await;
        assert!(matches!(result, Err(ClientError::Request(_))));
    }

    #[tokio::test]
    async fn submits_and_fetches_against_live_router() {
        use crate::app::AppState;
        use crate::http::build_router;
        use crate::store::LeaderboardStore;

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let config = Config {
            server_addr: addr,
            log_level: "info".to_string(),
            client_origin: "http://localhost:5173".to_string(),
            leaderboard_url: format!("http://{}", addr),
            leaderboard_path: None,
        };
        let client = LeaderboardClient::new(&config);
        let router = build_router(AppState::new(config, LeaderboardStore::in_memory()));
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });

        let at = Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap();
        let stored = client
            .submit(&ScoreSubmission::from_stats("ana", &stats(), at))
            .await
            .unwrap();
        assert_eq!(stored.id, 1);
        assert_eq!(stored.wave, 6);

        let table = client.fetch().await.unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table[0].turret, "machineGun");
        assert_eq!(table[0].date_time, "2024-06-01T08:00:00.000Z");
    }
}
