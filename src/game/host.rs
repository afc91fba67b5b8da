//! Session host: owns one player's game and runs its authoritative tick loop

use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::{broadcast, mpsc};
use tokio::time::interval;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::store::client::{ClientError, LeaderboardClient, ScoreSubmission, SubmittedScore};
use crate::store::leaderboard::LeaderboardEntry;
use crate::util::time::{tick_delta, tick_duration, unix_millis, SIMULATION_TPS, SNAPSHOT_TPS};
use crate::ws::protocol::{ClientMsg, PurchaseKind, ServerMsg};

use super::session::SessionEvent;
use super::settings::{Difficulty, TurretType};
use super::snapshot::SnapshotBuilder;
use super::{SessionPhase, SessionState};

/// Message from the connection to its session
#[derive(Debug, Clone)]
pub enum SessionCommand {
    Client { msg: ClientMsg, received_at: u64 },
    /// Socket closed; the session ends on its next tick
    Disconnect,
}

/// Handle to a running session
#[derive(Clone)]
pub struct SessionHandle {
    pub id: Uuid,
    pub difficulty: Difficulty,
    pub turret_type: TurretType,
    pub input_tx: mpsc::Sender<SessionCommand>,
    pub snapshot_tx: broadcast::Sender<ServerMsg>,
    pub started_at: u64,
}

/// Registry of all live sessions
pub struct SessionRegistry {
    sessions: DashMap<Uuid, SessionHandle>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    pub fn insert(&self, handle: SessionHandle) {
        self.sessions.insert(handle.id, handle);
    }

    pub fn remove(&self, id: &Uuid) -> Option<SessionHandle> {
        self.sessions.remove(id).map(|(_, h)| h)
    }

    pub fn active_sessions(&self) -> usize {
        self.sessions.len()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of a leaderboard request made off the tick loop
#[derive(Debug)]
enum LeaderboardReply {
    Submitted(Result<SubmittedScore, ClientError>),
    Table(Result<Vec<LeaderboardEntry>, ClientError>),
}

/// The authoritative game session
pub struct SessionHost {
    id: Uuid,
    tick: u64,
    state: SessionState,
    input_rx: mpsc::Receiver<SessionCommand>,
    snapshot_tx: broadcast::Sender<ServerMsg>,
    snapshot_builder: SnapshotBuilder,
    leaderboard: LeaderboardClient,
    reply_tx: mpsc::Sender<LeaderboardReply>,
    reply_rx: mpsc::Receiver<LeaderboardReply>,
    submission_pending: bool,
}

impl SessionHost {
    /// Create a new session
    pub fn new(
        id: Uuid,
        difficulty: Difficulty,
        turret_type: TurretType,
        seed: u64,
        leaderboard: LeaderboardClient,
    ) -> (Self, SessionHandle) {
        let (input_tx, input_rx) = mpsc::channel(256);
        let (snapshot_tx, _) = broadcast::channel(64);
        let (reply_tx, reply_rx) = mpsc::channel(4);

        let handle = SessionHandle {
            id,
            difficulty,
            turret_type,
            input_tx,
            snapshot_tx: snapshot_tx.clone(),
            started_at: unix_millis(),
        };

        let host = Self {
            id,
            tick: 0,
            state: SessionState::new(difficulty, turret_type, seed),
            input_rx,
            snapshot_tx,
            snapshot_builder: SnapshotBuilder::new(SIMULATION_TPS / SNAPSHOT_TPS),
            leaderboard,
            reply_tx,
            reply_rx,
            submission_pending: false,
        };

        (host, handle)
    }

    /// Run the authoritative tick loop until the connection goes away
    pub async fn run(mut self) {
        info!(
            session_id = %self.id,
            difficulty = self.state.difficulty.as_str(),
            turret = self.state.turret_type().as_str(),
            seed = self.state.seed,
            "Session started"
        );

        let mut tick_interval = interval(tick_duration());
        tick_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tick_interval.tick().await;
            if !self.step() {
                break;
            }
        }

        info!(
            session_id = %self.id,
            wave = self.state.wave.number,
            enemies_killed = self.state.wave.enemies_killed,
            ticks = self.tick,
            "Session ended"
        );
    }

    /// One pass of the loop. Returns false once the session should stop.
    fn step(&mut self) -> bool {
        // Drain input queue
        if !self.process_inputs() {
            return false;
        }

        self.process_leaderboard_replies();

        self.tick += 1;
        let events = self.state.tick(tick_delta());
        self.publish_events(events);

        if self.snapshot_builder.should_send() {
            let snapshot = self.snapshot_builder.build(self.tick, &self.state);
            let _ = self.snapshot_tx.send(snapshot);
        }

        true
    }

    fn process_inputs(&mut self) -> bool {
        loop {
            match self.input_rx.try_recv() {
                Ok(SessionCommand::Client { msg, received_at }) => {
                    self.handle_client_msg(msg, received_at);
                }
                Ok(SessionCommand::Disconnect) => {
                    debug!(session_id = %self.id, "Connection closed");
                    return false;
                }
                Err(mpsc::error::TryRecvError::Empty) => return true,
                Err(mpsc::error::TryRecvError::Disconnected) => return false,
            }
        }
    }

    fn handle_client_msg(&mut self, msg: ClientMsg, received_at: u64) {
        match msg {
            ClientMsg::KeyDown { key } => {
                if self.accepts_keys() {
                    self.state.input.key_down(key);
                }
            }
            // Releases are applied in every phase so nothing stays held
            ClientMsg::KeyUp { key } => self.state.input.key_up(key),
            ClientMsg::PurchaseUpgrade { track } => {
                let success = self.state.purchase_upgrade(track);
                self.send_purchase_result(PurchaseKind::Upgrade { track }, success);
            }
            ClientMsg::PurchaseItem { item } => {
                let success = self.state.purchase_item(item);
                self.send_purchase_result(PurchaseKind::Item { item }, success);
            }
            ClientMsg::ActivateItem { item } => {
                let success = self.state.activate_item(item);
                self.send_purchase_result(PurchaseKind::Activation { item }, success);
            }
            ClientMsg::ContinueWave => {
                if self.state.show_upgrade_screen {
                    self.state.close_upgrade_screen();
                    self.snapshot_builder.force_next();
                }
            }
            ClientMsg::SetPaused { paused } => {
                self.state.set_paused(paused);
                self.snapshot_builder.force_next();
            }
            ClientMsg::Reset => {
                self.state.full_reset();
                self.submission_pending = false;
                self.snapshot_builder.force_next();
            }
            ClientMsg::SubmitScore { username } => self.submit_score(username),
            ClientMsg::FetchLeaderboard => self.fetch_leaderboard(),
            ClientMsg::Ping { t } => {
                let _ = self.snapshot_tx.send(ServerMsg::Pong { t });
            }
        }

        let latency = unix_millis().saturating_sub(received_at);
        if latency > 100 {
            debug!(session_id = %self.id, latency_ms = latency, "Slow input delivery");
        }
    }

    fn accepts_keys(&self) -> bool {
        matches!(
            self.state.phase(),
            SessionPhase::Initializing | SessionPhase::Active
        )
    }

    fn send_purchase_result(&mut self, kind: PurchaseKind, success: bool) {
        if !success {
            debug!(session_id = %self.id, ?kind, coins = self.state.economy.coins, "Purchase rejected");
        }
        let _ = self.snapshot_tx.send(ServerMsg::PurchaseResult {
            kind,
            success,
            coins: self.state.economy.coins,
        });
        self.snapshot_builder.force_next();
    }

    /// Start a leaderboard submission without blocking the tick loop
    fn submit_score(&mut self, username: String) {
        let Some(stats) = self.state.final_stats() else {
            let _ = self.snapshot_tx.send(ServerMsg::error(
                "not_game_over",
                "Scores can only be submitted after the game ends",
            ));
            return;
        };

        let username = username.trim();
        if username.is_empty() {
            let _ = self
                .snapshot_tx
                .send(ServerMsg::error("invalid_username", "Username is required"));
            return;
        }

        if self.submission_pending {
            let _ = self.snapshot_tx.send(ServerMsg::error(
                "submission_pending",
                "A submission is already in flight",
            ));
            return;
        }

        let submission = ScoreSubmission::from_stats(username, &stats, Utc::now());
        info!(
            session_id = %self.id,
            username = %submission.username,
            wave = submission.wave,
            enemies_defeated = submission.enemies_defeated,
            "Submitting score"
        );

        self.submission_pending = true;
        let client = self.leaderboard.clone();
        let reply_tx = self.reply_tx.clone();
        tokio::spawn(async move {
            let result = client.submit(&submission).await;
            let _ = reply_tx.send(LeaderboardReply::Submitted(result)).await;
        });
    }

    fn fetch_leaderboard(&mut self) {
        let client = self.leaderboard.clone();
        let reply_tx = self.reply_tx.clone();
        tokio::spawn(async move {
            let result = client.fetch().await;
            let _ = reply_tx.send(LeaderboardReply::Table(result)).await;
        });
    }

    fn process_leaderboard_replies(&mut self) {
        while let Ok(reply) = self.reply_rx.try_recv() {
            let msg = match reply {
                LeaderboardReply::Submitted(result) => self.submission_outcome(result),
                LeaderboardReply::Table(Ok(entries)) => ServerMsg::Leaderboard { entries },
                LeaderboardReply::Table(Err(e)) => {
                    warn!(session_id = %self.id, error = %e, "Leaderboard fetch failed");
                    ServerMsg::error("leaderboard_unavailable", e.to_string())
                }
            };
            let _ = self.snapshot_tx.send(msg);
        }
    }

    fn submission_outcome(&mut self, result: Result<SubmittedScore, ClientError>) -> ServerMsg {
        self.submission_pending = false;
        match result {
            Ok(score) => {
                info!(session_id = %self.id, id = score.id, "Score submitted");
                ServerMsg::ScoreSubmitted { id: score.id }
            }
            Err(e) => {
                warn!(session_id = %self.id, error = %e, "Score submission failed");
                ServerMsg::ScoreRejected {
                    message: e.to_string(),
                }
            }
        }
    }

    fn publish_events(&mut self, events: Vec<SessionEvent>) {
        for event in events {
            match event {
                SessionEvent::WaveStarted { wave, is_boss_wave } => {
                    let _ = self
                        .snapshot_tx
                        .send(ServerMsg::WaveStarted { wave, is_boss_wave });
                    self.snapshot_builder.force_next();
                }
                SessionEvent::GameOver {
                    wave,
                    enemies_killed,
                } => {
                    info!(session_id = %self.id, wave, enemies_killed, "Session reached game over");
                    let _ = self.snapshot_tx.send(ServerMsg::GameOver {
                        wave,
                        enemies_killed,
                    });
                    self.snapshot_builder.force_next();
                }
                other => {
                    debug!(session_id = %self.id, event = ?other, "Session event");
                }
            }
        }
    }
}
