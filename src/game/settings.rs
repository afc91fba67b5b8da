//! Difficulty and turret tables

use serde::{Deserialize, Serialize};

/// Difficulty tiers selectable from the menu
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    Impossible,
}

impl Default for Difficulty {
    fn default() -> Self {
        Self::Medium
    }
}

impl Difficulty {
    /// Resolve a menu key, falling back to Medium for anything unknown
    pub fn from_key(key: &str) -> Self {
        match key.trim().to_ascii_lowercase().as_str() {
            "easy" => Self::Easy,
            "medium" => Self::Medium,
            "hard" => Self::Hard,
            "impossible" => Self::Impossible,
            _ => Self::default(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
            Self::Impossible => "impossible",
        }
    }
}

/// Turret types available to the player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TurretType {
    #[serde(rename = "normal", alias = "standard")]
    Standard,
    #[serde(rename = "sniper")]
    Sniper,
    #[serde(rename = "machineGun", alias = "machine_gun")]
    MachineGun,
}

impl Default for TurretType {
    fn default() -> Self {
        Self::Standard
    }
}

impl TurretType {
    /// Resolve a menu key, falling back to Standard for anything unknown
    pub fn from_key(key: &str) -> Self {
        match key.trim() {
            "sniper" => Self::Sniper,
            "machineGun" | "machine_gun" | "machinegun" => Self::MachineGun,
            _ => Self::default(),
        }
    }

    /// Key used by the menu and stored on leaderboard rows
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "normal",
            Self::Sniper => "sniper",
            Self::MachineGun => "machineGun",
        }
    }
}

/// Enemy tuning per difficulty
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DifficultySettings {
    /// Nominal spawn interval (ms), exposed for the menu
    pub spawn_rate_ms: u32,
    /// Multiplier on the wave's base enemy speed
    pub enemy_speed_multiplier: f32,
    /// Base health of a normal enemy
    pub enemy_health: f32,
}

impl DifficultySettings {
    pub fn for_level(level: Difficulty) -> Self {
        match level {
            Difficulty::Easy => Self {
                spawn_rate_ms: 3000,
                enemy_speed_multiplier: 0.5,
                enemy_health: 1.0,
            },
            Difficulty::Medium => Self {
                spawn_rate_ms: 2000,
                enemy_speed_multiplier: 1.0,
                enemy_health: 2.0,
            },
            Difficulty::Hard => Self {
                spawn_rate_ms: 1000,
                enemy_speed_multiplier: 1.5,
                enemy_health: 3.0,
            },
            Difficulty::Impossible => Self {
                spawn_rate_ms: 500,
                enemy_speed_multiplier: 2.0,
                enemy_health: 5.0,
            },
        }
    }
}

/// Weapon tuning per turret type
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TurretSettings {
    /// Menu-scale projectile speed; divided by 10 to get units per tick
    pub projectile_speed: f32,
    /// Distance a projectile travels before it is discarded
    pub max_range: f32,
    pub reload_time_ms: u32,
    pub damage: f32,
    /// Continuous fire time before overheating (machine gun only)
    pub overheat_time_ms: Option<u32>,
    /// Forced cooldown after overheating (machine gun only)
    pub cooldown_time_ms: Option<u32>,
}

impl TurretSettings {
    pub fn for_type(turret_type: TurretType) -> Self {
        match turret_type {
            TurretType::Standard => Self {
                projectile_speed: 7.5,
                max_range: 100.0,
                reload_time_ms: 500,
                damage: 1.5,
                overheat_time_ms: None,
                cooldown_time_ms: None,
            },
            TurretType::Sniper => Self {
                projectile_speed: 10.0,
                max_range: 200.0,
                reload_time_ms: 1000,
                damage: 3.0,
                overheat_time_ms: None,
                cooldown_time_ms: None,
            },
            TurretType::MachineGun => Self {
                projectile_speed: 5.0,
                max_range: 80.0,
                reload_time_ms: 250,
                damage: 0.5,
                overheat_time_ms: Some(3000),
                cooldown_time_ms: Some(2000),
            },
        }
    }

    /// Reload time in seconds before upgrade scaling
    pub fn reload_secs(&self) -> f32 {
        self.reload_time_ms as f32 / 1000.0
    }

    /// Projectile speed in units per tick before upgrade scaling
    pub fn tick_speed(&self) -> f32 {
        self.projectile_speed / 10.0
    }

    pub fn overheat_secs(&self) -> Option<f32> {
        self.overheat_time_ms.map(|ms| ms as f32 / 1000.0)
    }

    pub fn cooldown_secs(&self) -> Option<f32> {
        self.cooldown_time_ms.map(|ms| ms as f32 / 1000.0)
    }
}
