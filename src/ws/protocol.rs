//! WebSocket protocol message definitions
//! These are the wire types for client-server communication

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::game::combat::EnemyKind;
use crate::game::economy::{PerItem, ShopItem, UpgradeLevels, UpgradeTrack};
use crate::game::physics::Vec3;
use crate::game::session::{BossStatus, Indicators};
use crate::game::settings::{Difficulty, TurretType};
use crate::game::{InputKey, SessionPhase};
use crate::store::leaderboard::LeaderboardEntry;

/// Messages sent from client to server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMsg {
    KeyDown {
        key: InputKey,
    },

    KeyUp {
        key: InputKey,
    },

    /// Buy the next level of an upgrade track
    PurchaseUpgrade {
        track: UpgradeTrack,
    },

    /// Buy one shop item into the inventory
    PurchaseItem {
        item: ShopItem,
    },

    /// Use an owned item (same as its hotkey)
    ActivateItem {
        item: ShopItem,
    },

    /// Close the upgrade screen and start the next wave
    ContinueWave,

    /// External pause, e.g. the window lost focus
    SetPaused {
        paused: bool,
    },

    /// Play again with the same selections
    Reset,

    /// Send the finished run to the leaderboard
    SubmitScore {
        username: String,
    },

    /// Ask for the current leaderboard table
    FetchLeaderboard,

    /// Ping for latency measurement
    Ping {
        /// Client timestamp
        t: u64,
    },
}

impl ClientMsg {
    /// Key releases always pass so a held key can't get stuck down
    pub fn bypasses_rate_limit(&self) -> bool {
        matches!(self, ClientMsg::KeyUp { .. })
    }
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMsg {
    /// Welcome message after connection
    Welcome {
        session_id: Uuid,
        difficulty: Difficulty,
        turret: TurretType,
        server_time: u64,
    },

    /// Render state (sent at regular intervals and after notable events)
    Snapshot {
        /// Session tick number
        tick: u64,
        state: Box<SessionSnapshot>,
    },

    WaveStarted {
        wave: u32,
        is_boss_wave: bool,
    },

    GameOver {
        wave: u32,
        enemies_killed: u32,
    },

    /// Outcome of a shop or upgrade request
    PurchaseResult {
        kind: PurchaseKind,
        success: bool,
        /// Balance after the attempt
        coins: u32,
    },

    /// Current leaderboard, best runs first
    Leaderboard {
        entries: Vec<LeaderboardEntry>,
    },

    /// Leaderboard accepted the run
    ScoreSubmitted {
        id: u64,
    },

    /// Leaderboard submission failed; the client may retry
    ScoreRejected {
        message: String,
    },

    /// Error message
    Error {
        code: String,
        message: String,
    },

    /// Pong response
    Pong {
        /// Echo back client timestamp
        t: u64,
    },
}

impl ServerMsg {
    pub fn error(code: &str, message: impl Into<String>) -> Self {
        ServerMsg::Error {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

/// What a purchase result refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "category", rename_all = "snake_case")]
pub enum PurchaseKind {
    Upgrade { track: UpgradeTrack },
    Item { item: ShopItem },
    Activation { item: ShopItem },
}

/// Everything the renderer draws for one frame
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub wave: u32,
    pub is_boss_wave: bool,
    pub enemies_remaining: u32,
    pub enemies_killed: u32,
    pub coins: u32,
    /// 0 = morning through 0.8 = night
    pub time_of_day: f32,
    pub turret: TurretSnapshot,
    pub projectiles: Vec<ProjectileSnapshot>,
    pub enemies: Vec<EnemySnapshot>,
    pub boss: BossStatus,
    /// Boss shield raised or broken within the last two seconds
    pub shield_flash: bool,
    pub indicators: Indicators,
    pub super_charge: SuperChargeSnapshot,
    pub upgrades: UpgradeLevels,
    pub inventory: PerItem<u32>,
    pub active_items: PerItem<bool>,
    /// Seconds until each item can be used again
    pub item_cooldowns: PerItem<f32>,
    pub show_upgrade_screen: bool,
    pub paused: bool,
}

/// Turret state in a snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurretSnapshot {
    pub turret_type: TurretType,
    /// Rotation in radians
    pub rotation: f32,
    pub reload_progress: f32,
    pub heat: f32,
    pub overheated: bool,
    pub charge: f32,
    pub charging: bool,
    /// Camera zoom, 1 = unzoomed
    pub zoom: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectileSnapshot {
    pub id: Uuid,
    pub position: Vec3,
    pub turret_type: TurretType,
    pub charged: bool,
    pub charge_level: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnemySnapshot {
    pub id: Uuid,
    pub kind: EnemyKind,
    pub position: Vec3,
    pub health: f32,
    pub max_health: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuperChargeSnapshot {
    /// 0-100
    pub meter: f32,
    pub active: bool,
    /// Seconds left while active
    pub remaining: f32,
}
