//! Wave composition, spawn placement and wave progression

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::combat::{Enemy, EnemyKind};
use super::physics::Vec3;
use super::settings::DifficultySettings;

/// Enemy budget of a fresh session's first wave
pub const INITIAL_ENEMIES_REMAINING: u32 = 5;

/// Base per-tick enemy speed before the wave bonus
pub const BASE_ENEMY_SPEED: f32 = 0.02;

/// Added to the base enemy speed per wave number
pub const ENEMY_SPEED_PER_WAVE: f32 = 0.001;

/// Enemies spawn on a ring of this radius plus up to `SPAWN_RING_JITTER`
pub const SPAWN_RING_RADIUS: f32 = 50.0;
pub const SPAWN_RING_JITTER: f32 = 10.0;

/// Every Nth wave is a boss wave
pub const BOSS_WAVE_INTERVAL: u32 = 5;

pub fn is_boss_wave(wave: u32) -> bool {
    wave > 0 && wave % BOSS_WAVE_INTERVAL == 0
}

/// Enemies per batch for a wave
pub fn wave_size(wave: u32) -> u32 {
    3 + wave
}

pub fn enemy_speed_base(wave: u32) -> f32 {
    BASE_ENEMY_SPEED + wave as f32 * ENEMY_SPEED_PER_WAVE
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WavePhase {
    /// Field is empty and the wave still has enemies to send
    Spawning,
    InProgress,
    /// Nothing left to spawn and nothing in flight
    Cleared,
}

/// Progress through the current wave
#[derive(Debug, Clone, PartialEq)]
pub struct WaveState {
    pub number: u32,
    pub is_boss_wave: bool,
    pub enemies_remaining: u32,
    /// Cumulative across the session
    pub enemies_killed: u32,
    pub enemy_speed_base: f32,
    boss_spawned: bool,
}

impl Default for WaveState {
    fn default() -> Self {
        Self {
            number: 1,
            is_boss_wave: false,
            enemies_remaining: INITIAL_ENEMIES_REMAINING,
            enemies_killed: 0,
            enemy_speed_base: BASE_ENEMY_SPEED,
            boss_spawned: false,
        }
    }
}

impl WaveState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set up wave `number`. Boss waves budget one extra enemy for the boss.
    pub fn enter(&mut self, number: u32) {
        let boss_wave = is_boss_wave(number);
        let count = wave_size(number);

        self.number = number;
        self.is_boss_wave = boss_wave;
        self.enemies_remaining = if boss_wave { count + 1 } else { count };
        self.enemy_speed_base = enemy_speed_base(number);
        self.boss_spawned = false;

        info!(
            wave = number,
            boss_wave,
            enemies = self.enemies_remaining,
            "Wave started"
        );
    }

    /// An enemy left the field, by death or by reaching the center
    pub fn record_removal(&mut self) {
        self.enemies_remaining = self.enemies_remaining.saturating_sub(1);
    }

    pub fn record_kill(&mut self, kind: EnemyKind) {
        self.enemies_killed += 1;
        self.record_removal();
        if kind == EnemyKind::Boss {
            self.is_boss_wave = false;
        }
    }

    pub fn phase(&self, live_enemies: usize, live_projectiles: usize) -> WavePhase {
        if self.enemies_remaining == 0 && live_projectiles == 0 {
            WavePhase::Cleared
        } else if live_enemies == 0 && self.enemies_remaining > 0 {
            WavePhase::Spawning
        } else {
            WavePhase::InProgress
        }
    }

    /// Day/night position for the renderer: 0 = morning, 0.8 = night
    pub fn time_of_day(&self) -> f32 {
        ((self.number.saturating_sub(1)) % BOSS_WAVE_INTERVAL) as f32 / BOSS_WAVE_INTERVAL as f32
    }

    /// Composition of the next batch
    pub fn plan_batch(&self) -> SpawnPlan {
        let mut count = wave_size(self.number).min(self.enemies_remaining);
        let boss = self.is_boss_wave && !self.boss_spawned;
        if boss {
            count = count.saturating_sub(1);
        }
        let tanks = count / 2;
        SpawnPlan {
            normals: count - tanks,
            tanks,
            boss,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpawnPlan {
    pub normals: u32,
    pub tanks: u32,
    pub boss: bool,
}

impl SpawnPlan {
    pub fn total(&self) -> u32 {
        self.normals + self.tanks + u32::from(self.boss)
    }
}

/// Turns wave state into spawned enemies
pub struct WaveSystem;

impl WaveSystem {
    fn ring_position<R: Rng>(rng: &mut R, height: f32) -> Vec3 {
        let angle = rng.gen_range(0.0..std::f32::consts::TAU);
        let distance = SPAWN_RING_RADIUS + rng.gen_range(0.0..SPAWN_RING_JITTER);
        Vec3::on_ring(angle, distance, height)
    }

    /// Spawn the next batch for the current wave
    pub fn spawn_batch<R: Rng>(
        wave: &mut WaveState,
        difficulty: &DifficultySettings,
        rng: &mut R,
    ) -> Vec<Enemy> {
        let plan = wave.plan_batch();
        let base_speed = wave.enemy_speed_base * difficulty.enemy_speed_multiplier;
        let base_health = difficulty.enemy_health;
        let mut enemies = Vec::with_capacity(plan.total() as usize);

        for _ in 0..plan.normals {
            let position = Self::ring_position(rng, EnemyKind::Normal.spawn_height());
            let speed = base_speed * rng.gen_range(0.8..1.2);
            enemies.push(Enemy::new(EnemyKind::Normal, position, speed, base_health));
        }

        for _ in 0..plan.tanks {
            let position = Self::ring_position(rng, EnemyKind::Tank.spawn_height());
            enemies.push(Enemy::new(
                EnemyKind::Tank,
                position,
                base_speed * 0.4,
                base_health * 3.0,
            ));
        }

        if plan.boss {
            let position = Self::ring_position(rng, EnemyKind::Boss.spawn_height());
            let tier = wave.number.div_ceil(BOSS_WAVE_INTERVAL) as f32;
            let health = base_health * 20.0 * tier;
            enemies.push(Enemy::new(EnemyKind::Boss, position, base_speed * 0.3, health));
            wave.boss_spawned = true;
            info!(wave = wave.number, health, "Boss spawned");
        }

        enemies
    }
}
