//! Per-session game state and the combat tick

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use super::combat::{
    BossShieldState, CombatSystem, Enemy, EnemyKind, HitOutcome, Projectile, BOSS_KILL_BONUS,
};
use super::economy::{Economy, ShopItem, UpgradeTrack};
use super::physics::{PhysicsSystem, Vec3, FIELD_OF_VIEW_HALF_ANGLE, VISIBLE_RANGE};
use super::settings::{Difficulty, DifficultySettings, TurretType};
use super::super_charge::SuperCharge;
use super::turret::{FireModifiers, TurretState};
use super::wave::{WavePhase, WaveState, WaveSystem, SPAWN_RING_RADIUS};
use super::InputState;

/// How long the boss shield cue stays lit (seconds)
pub const SHIELD_FLASH_SECS: f32 = 2.0;

/// Enemy speed factor while AbsoluteZero is active. The slow is applied
/// twice, so the effective factor is the square of this.
pub const ABSOLUTE_ZERO_SLOW: f32 = 0.5;

/// Session lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// Fresh or just reset, no tick has run yet
    Initializing,
    Active,
    /// Upgrade screen open or paused externally
    Paused,
    GameOver,
}

/// Something worth telling the client about outside the regular snapshot
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    WaveStarted { wave: u32, is_boss_wave: bool },
    EnemyKilled { kind: EnemyKind },
    BossShieldRaised,
    BossShieldBroken,
    SuperChargeActivated,
    SuperChargeExpired,
    ItemActivated { item: ShopItem },
    GameOver { wave: u32, enemies_killed: u32 },
}

/// Boss health and shield mirrored for the renderer
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BossStatus {
    pub health: f32,
    pub max_health: f32,
    pub shield: BossShieldState,
}

/// Edge-of-screen marker for an enemy outside the turret's view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeIndicator {
    pub enemy_id: Uuid,
    pub kind: EnemyKind,
    pub distance: f32,
    pub blink_on: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Indicators {
    pub left: Vec<EdgeIndicator>,
    pub right: Vec<EdgeIndicator>,
}

/// What a finished run leaves behind for the leaderboard
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FinalStats {
    pub wave: u32,
    pub enemies_killed: u32,
    pub difficulty: Difficulty,
    pub turret_type: TurretType,
}

/// Everything one player's game owns. Mutated only by the session's tick.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub difficulty: Difficulty,
    pub difficulty_settings: DifficultySettings,
    pub turret: TurretState,
    pub projectiles: Vec<Projectile>,
    pub enemies: Vec<Enemy>,
    pub wave: WaveState,
    pub economy: Economy,
    pub super_charge: SuperCharge,
    pub input: InputState,
    pub boss: BossStatus,
    /// Seconds left on the boss shield cue
    pub shield_flash: f32,
    pub indicators: Indicators,
    pub show_upgrade_screen: bool,
    pub paused: bool,
    pub game_over: bool,
    /// Sum of tick deltas since the last reset (seconds)
    pub clock: f32,
    pub seed: u64,
    rng: ChaCha8Rng,
    started: bool,
    time_warp_applied: bool,
}

impl SessionState {
    pub fn new(difficulty: Difficulty, turret_type: TurretType, seed: u64) -> Self {
        Self {
            difficulty,
            difficulty_settings: DifficultySettings::for_level(difficulty),
            turret: TurretState::new(turret_type),
            projectiles: Vec::new(),
            enemies: Vec::new(),
            wave: WaveState::new(),
            economy: Economy::new(),
            super_charge: SuperCharge::new(),
            input: InputState::default(),
            boss: BossStatus::default(),
            shield_flash: 0.0,
            indicators: Indicators::default(),
            show_upgrade_screen: false,
            paused: false,
            game_over: false,
            clock: 0.0,
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
            started: false,
            time_warp_applied: false,
        }
    }

    pub fn turret_type(&self) -> TurretType {
        self.turret.turret_type
    }

    pub fn phase(&self) -> SessionPhase {
        if self.game_over {
            SessionPhase::GameOver
        } else if self.paused || self.show_upgrade_screen {
            SessionPhase::Paused
        } else if !self.started {
            SessionPhase::Initializing
        } else {
            SessionPhase::Active
        }
    }

    /// Return every owned structure to its initial value, keeping the
    /// difficulty and turret selections
    pub fn full_reset(&mut self) {
        let seed = self.rng.gen();
        *self = Self::new(self.difficulty, self.turret_type(), seed);
        info!(seed, "Session reset");
    }

    /// Book a kill: counters, coins and super-charge meter
    pub fn kill_enemy(&mut self, kind: EnemyKind) {
        self.wave.record_kill(kind);
        self.economy.add_coins(kind.coin_reward());
        self.super_charge.record_kill(kind);
        if kind == EnemyKind::Boss {
            self.boss = BossStatus::default();
        }
    }

    /// Move to wave `number`. Every wave after the first opens the
    /// upgrade screen and pauses.
    pub fn set_wave(&mut self, number: u32) -> SessionEvent {
        self.wave.enter(number);
        self.boss = BossStatus::default();
        self.time_warp_applied = false;

        let gate = number > 1;
        self.show_upgrade_screen = gate;
        self.paused = gate;
        if gate {
            self.release_input();
        }

        SessionEvent::WaveStarted {
            wave: number,
            is_boss_wave: self.wave.is_boss_wave,
        }
    }

    pub fn close_upgrade_screen(&mut self) {
        self.show_upgrade_screen = false;
        self.paused = false;
    }

    pub fn set_paused(&mut self, paused: bool) {
        if self.game_over {
            return;
        }
        self.paused = paused;
        if paused {
            self.release_input();
        }
    }

    pub fn purchase_upgrade(&mut self, track: UpgradeTrack) -> bool {
        !self.game_over && self.economy.purchase_upgrade(track)
    }

    pub fn purchase_item(&mut self, item: ShopItem) -> bool {
        !self.game_over && self.economy.purchase_shop_item(item)
    }

    pub fn activate_item(&mut self, item: ShopItem) -> bool {
        !self.game_over && self.economy.activate_item(item)
    }

    pub fn activate_super_charge(&mut self) -> bool {
        !self.game_over && self.super_charge.activate(&self.economy, self.clock)
    }

    /// Final wave and kill count, available once the run has ended
    pub fn final_stats(&self) -> Option<FinalStats> {
        self.game_over.then(|| FinalStats {
            wave: self.wave.number,
            enemies_killed: self.wave.enemies_killed,
            difficulty: self.difficulty,
            turret_type: self.turret_type(),
        })
    }

    fn release_input(&mut self) {
        self.input.clear();
        self.turret.release_trigger();
    }

    fn fire_modifiers(&self) -> FireModifiers {
        let boosted = self.super_charge.active;
        FireModifiers {
            damage: self.economy.upgrade_multiplier(UpgradeTrack::Damage, boosted),
            reload_time: self.economy.upgrade_multiplier(UpgradeTrack::ReloadTime, boosted),
            bullet_speed: self.economy.upgrade_multiplier(UpgradeTrack::BulletSpeed, boosted),
        }
    }

    /// Run one simulation step. Does nothing while paused or over.
    pub fn tick(&mut self, dt: f32) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        if self.game_over || self.paused || self.show_upgrade_screen {
            return events;
        }

        self.started = true;
        self.clock += dt;
        self.shield_flash = (self.shield_flash - dt).max(0.0);

        self.economy.update_item_cooldowns(dt);
        if self.super_charge.update(&mut self.economy, self.clock) {
            events.push(SessionEvent::SuperChargeExpired);
        }
        self.handle_requests(&mut events);
        self.apply_time_warp();

        if self.wave_phase() == WavePhase::Spawning {
            let batch =
                WaveSystem::spawn_batch(&mut self.wave, &self.difficulty_settings, &mut self.rng);
            debug!(wave = self.wave.number, count = batch.len(), "Spawned enemy batch");
            self.enemies.extend(batch);
        }

        let modifiers = self.fire_modifiers();
        if let Some(shot) = self.turret.update(&mut self.input, &modifiers, dt) {
            self.projectiles.push(Projectile::new(
                self.turret.turret_type,
                shot.angle,
                shot.speed,
                shot.damage,
                self.turret.settings.max_range,
                self.clock,
                shot.charge,
            ));
        }

        self.projectiles.retain_mut(|projectile| projectile.update(dt));

        if self.move_enemies() {
            events.push(self.end_game());
            return events;
        }

        self.resolve_collisions(&mut events);
        self.refresh_boss_status();
        self.indicators = self.compute_indicators();

        if self.wave_phase() == WavePhase::Cleared {
            let next = self.wave.number + 1;
            events.push(self.set_wave(next));
        }

        events
    }

    fn wave_phase(&self) -> WavePhase {
        self.wave.phase(self.enemies.len(), self.projectiles.len())
    }

    fn handle_requests(&mut self, events: &mut Vec<SessionEvent>) {
        if self.input.take_super_request() && self.activate_super_charge() {
            events.push(SessionEvent::SuperChargeActivated);
        }

        for item in self.input.take_item_requests() {
            if self.economy.activate_item(item) {
                info!(?item, "Item activated");
                events.push(SessionEvent::ItemActivated { item });
            } else {
                debug!(?item, "Item activation rejected");
            }
        }
    }

    /// Push every non-boss enemy back to the spawn ring, once per activation
    fn apply_time_warp(&mut self) {
        let active = self.economy.is_active(ShopItem::TimeWarp);
        if active && !self.time_warp_applied {
            let count = self.enemies.len().max(1) as f32;
            for (index, enemy) in self.enemies.iter_mut().enumerate() {
                if enemy.is_boss() {
                    continue;
                }
                let angle = index as f32 / count * std::f32::consts::TAU;
                enemy.position = Vec3::on_ring(angle, SPAWN_RING_RADIUS, enemy.position.y);
            }
        }
        self.time_warp_applied = active;
    }

    fn effective_speed(&self, enemy: &Enemy) -> f32 {
        if enemy.is_boss() {
            return enemy.speed;
        }
        if self.economy.is_active(ShopItem::EmpBlast) {
            return 0.0;
        }
        let mut speed = enemy.speed;
        if self.economy.is_active(ShopItem::AbsoluteZero) {
            speed *= ABSOLUTE_ZERO_SLOW;
            speed *= ABSOLUTE_ZERO_SLOW;
        }
        speed
    }

    /// Advance enemies toward the center. Returns true when one breaches
    /// without a Shield up; the breaching enemy is removed.
    fn move_enemies(&mut self) -> bool {
        let speeds: Vec<f32> = self.enemies.iter().map(|e| self.effective_speed(e)).collect();
        for (enemy, speed) in self.enemies.iter_mut().zip(speeds) {
            if !PhysicsSystem::is_in_center(&enemy.position) {
                PhysicsSystem::step_toward_center(&mut enemy.position, speed);
            }
        }

        if self.economy.is_active(ShopItem::Shield) {
            return false;
        }

        match self
            .enemies
            .iter()
            .position(|e| PhysicsSystem::is_in_center(&e.position))
        {
            Some(index) => {
                let enemy = self.enemies.remove(index);
                self.wave.record_removal();
                debug!(enemy_id = %enemy.id, kind = ?enemy.kind, "Enemy reached the center");
                true
            }
            None => false,
        }
    }

    fn end_game(&mut self) -> SessionEvent {
        self.game_over = true;
        self.release_input();
        info!(
            wave = self.wave.number,
            enemies_killed = self.wave.enemies_killed,
            "Game over"
        );
        SessionEvent::GameOver {
            wave: self.wave.number,
            enemies_killed: self.wave.enemies_killed,
        }
    }

    /// Each projectile hits at most one enemy and is consumed by the hit
    fn resolve_collisions(&mut self, events: &mut Vec<SessionEvent>) {
        let mut kills = Vec::new();
        let mut cues = Vec::new();
        let enemies = &mut self.enemies;

        self.projectiles.retain(|projectile| {
            let Some(index) = enemies.iter().position(|e| projectile.check_hit(e)) else {
                return true;
            };

            match CombatSystem::resolve_hit(&mut enemies[index], projectile.damage) {
                HitOutcome::Killed { kind } => {
                    enemies.remove(index);
                    kills.push(kind);
                }
                HitOutcome::ShieldBroken => cues.push(SessionEvent::BossShieldBroken),
                HitOutcome::Damaged {
                    shield_raised: true,
                    ..
                } => cues.push(SessionEvent::BossShieldRaised),
                HitOutcome::Damaged { .. } | HitOutcome::ShieldDamaged => {}
            }
            false
        });

        if !cues.is_empty() {
            self.shield_flash = SHIELD_FLASH_SECS;
        }
        events.extend(cues);

        for kind in kills {
            self.kill_enemy(kind);
            if kind == EnemyKind::Boss {
                self.economy.add_coins(BOSS_KILL_BONUS);
                info!(wave = self.wave.number, "Boss defeated");
            }
            events.push(SessionEvent::EnemyKilled { kind });
        }
    }

    fn refresh_boss_status(&mut self) {
        self.boss = self
            .enemies
            .iter()
            .find(|e| e.is_boss())
            .map(|boss| BossStatus {
                health: boss.health,
                max_health: boss.max_health,
                shield: boss.shield(),
            })
            .unwrap_or_default();
    }

    fn compute_indicators(&self) -> Indicators {
        let facing = self.turret.rotation;
        let mut indicators = Indicators::default();

        for enemy in &self.enemies {
            let bearing = enemy.position.bearing();
            let distance = enemy.position.planar_length();
            let in_view = PhysicsSystem::angle_off_facing(bearing, facing) < FIELD_OF_VIEW_HALF_ANGLE;
            let on_screen = match enemy.kind {
                EnemyKind::Normal => in_view,
                EnemyKind::Tank | EnemyKind::Boss => in_view && distance < VISIBLE_RANGE,
            };
            if on_screen {
                continue;
            }

            let indicator = EdgeIndicator {
                enemy_id: enemy.id,
                kind: enemy.kind,
                distance,
                blink_on: PhysicsSystem::blink_on(self.clock, PhysicsSystem::blink_period(distance)),
            };
            if PhysicsSystem::is_to_left(bearing, facing) {
                indicators.left.push(indicator);
            } else {
                indicators.right.push(indicator);
            }
        }

        indicators
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::economy::PerItem;
    use crate::game::InputKey;

    const DT: f32 = 1.0 / 60.0;

    fn session(difficulty: Difficulty, turret_type: TurretType) -> SessionState {
        SessionState::new(difficulty, turret_type, 42)
    }

    fn parked(kind: EnemyKind, position: Vec3, speed: f32, health: f32) -> Enemy {
        Enemy::new(kind, position, speed, health)
    }

    #[test]
    fn kill_normal_on_fresh_session() {
        let mut state = session(Difficulty::Medium, TurretType::Standard);
        state.kill_enemy(EnemyKind::Normal);
        assert_eq!(state.wave.enemies_killed, 1);
        assert_eq!(state.wave.enemies_remaining, 4);
        assert_eq!(state.economy.coins, 5);
        assert_eq!(state.super_charge.meter, 4.0);
    }

    #[test]
    fn kill_tank_then_boss() {
        let mut state = session(Difficulty::Medium, TurretType::Standard);
        state.kill_enemy(EnemyKind::Tank);
        state.kill_enemy(EnemyKind::Boss);
        // Bookkeeping alone carries no combat bonus
        assert_eq!(state.economy.coins, 35);
        assert_eq!(state.super_charge.meter, 23.0);
    }

    #[test]
    fn thirty_kills_saturate_meter() {
        let mut state = session(Difficulty::Medium, TurretType::Standard);
        for _ in 0..30 {
            state.kill_enemy(EnemyKind::Normal);
            assert!(state.super_charge.meter <= 100.0);
        }
        assert_eq!(state.super_charge.meter, 100.0);
        assert_eq!(state.wave.enemies_remaining, 0);
    }

    #[test]
    fn wave_five_is_boss_wave_six_is_not() {
        let mut state = session(Difficulty::Medium, TurretType::Standard);
        state.set_wave(5);
        assert!(state.wave.is_boss_wave);
        state.set_wave(6);
        assert!(!state.wave.is_boss_wave);
    }

    #[test]
    fn fresh_session_is_initializing_until_first_tick() {
        let mut state = session(Difficulty::Medium, TurretType::Standard);
        assert_eq!(state.phase(), SessionPhase::Initializing);
        state.tick(DT);
        assert_eq!(state.phase(), SessionPhase::Active);
        // First batch of wave one
        assert_eq!(state.enemies.len(), 4);
    }

    #[test]
    fn standard_shot_kills_enemy_in_line() {
        let mut state = session(Difficulty::Easy, TurretType::Standard);
        state
            .enemies
            .push(parked(EnemyKind::Normal, Vec3::new(0.0, 0.5, 12.0), 0.0, 1.0));

        state.input.key_down(InputKey::Fire);
        let mut killed = false;
        for _ in 0..30 {
            let events = state.tick(DT);
            if events.contains(&SessionEvent::EnemyKilled { kind: EnemyKind::Normal }) {
                killed = true;
                break;
            }
        }

        assert!(killed);
        assert_eq!(state.wave.enemies_killed, 1);
        assert_eq!(state.economy.coins, 5);
        assert!(state.projectiles.is_empty());
    }

    #[test]
    fn boss_killed_in_combat_pays_bonus() {
        let mut state = session(Difficulty::Easy, TurretType::Standard);
        state.set_wave(5);
        state.close_upgrade_screen();
        state
            .enemies
            .push(parked(EnemyKind::Boss, Vec3::new(0.0, 1.5, 12.0), 0.0, 1.0));

        state.input.key_down(InputKey::Fire);
        for _ in 0..30 {
            state.tick(DT);
            if state.wave.enemies_killed > 0 {
                break;
            }
        }

        assert_eq!(state.economy.coins, 25 + BOSS_KILL_BONUS);
        assert_eq!(state.super_charge.meter, 15.0);
        assert!(!state.wave.is_boss_wave);
        assert_eq!(state.boss, BossStatus::default());
    }

    #[test]
    fn boss_shield_hit_sets_flash() {
        let mut state = session(Difficulty::Easy, TurretType::Standard);
        state
            .enemies
            .push(parked(EnemyKind::Boss, Vec3::new(0.0, 1.5, 12.0), 0.0, 6.0));

        state.input.key_down(InputKey::Fire);
        let mut raised = false;
        for _ in 0..30 {
            if state.tick(DT).contains(&SessionEvent::BossShieldRaised) {
                raised = true;
                break;
            }
        }

        // 6.0 - 1.5 = 4.5, exactly 75%
        assert!(raised);
        assert_eq!(state.shield_flash, SHIELD_FLASH_SECS);
        assert!(state.boss.shield.active);
        assert!((state.boss.shield.max_health - 1.2).abs() < 1e-5);
        assert_eq!(state.boss.health, 4.5);
    }

    #[test]
    fn wave_clear_opens_upgrade_screen_and_freezes() {
        let mut state = session(Difficulty::Medium, TurretType::Standard);
        state.wave.enemies_remaining = 0;

        let events = state.tick(DT);
        assert!(events.contains(&SessionEvent::WaveStarted {
            wave: 2,
            is_boss_wave: false
        }));
        assert!(state.show_upgrade_screen);
        assert_eq!(state.phase(), SessionPhase::Paused);

        let clock = state.clock;
        assert!(state.tick(DT).is_empty());
        assert_eq!(state.clock, clock);
        assert!(state.enemies.is_empty());

        state.close_upgrade_screen();
        state.tick(DT);
        assert_eq!(state.phase(), SessionPhase::Active);
        assert_eq!(state.enemies.len(), 5);
    }

    #[test]
    fn breach_without_shield_ends_game() {
        let mut state = session(Difficulty::Medium, TurretType::Standard);
        state
            .enemies
            .push(parked(EnemyKind::Normal, Vec3::new(0.0, 0.5, 10.2), 0.5, 2.0));

        let events = state.tick(DT);
        assert_eq!(
            events,
            vec![SessionEvent::GameOver {
                wave: 1,
                enemies_killed: 0
            }]
        );
        assert_eq!(state.phase(), SessionPhase::GameOver);
        assert_eq!(state.wave.enemies_remaining, 4);
        assert!(state.enemies.is_empty());

        let stats = state.final_stats().unwrap();
        assert_eq!(stats.wave, 1);
        assert_eq!(stats.turret_type, TurretType::Standard);

        // Frozen from here on
        let clock = state.clock;
        assert!(state.tick(DT).is_empty());
        assert_eq!(state.clock, clock);
        assert!(!state.purchase_upgrade(UpgradeTrack::Damage));
    }

    #[test]
    fn shield_holds_breach_until_it_expires() {
        let mut state = session(Difficulty::Medium, TurretType::Standard);
        state.economy.inventory.shield = 1;
        state
            .enemies
            .push(parked(EnemyKind::Normal, Vec3::new(0.0, 0.5, 10.5), 1.0, 2.0));
        state.input.key_down(InputKey::ItemShield);

        state.tick(DT);
        assert!(!state.game_over);
        let held = state.enemies[0].position;
        assert!(PhysicsSystem::is_in_center(&held));

        state.tick(DT);
        assert_eq!(state.enemies[0].position, held);

        let mut ticks = 0;
        while !state.game_over && ticks < 1200 {
            state.tick(DT);
            ticks += 1;
        }
        assert!(state.game_over);
        assert!(state.clock >= ShopItem::Shield.cooldown_secs());
        assert_eq!(state.wave.enemies_remaining, 4);
    }

    // AbsoluteZero slows twice over, a quarter of normal speed
    #[test]
    fn absolute_zero_quarters_non_boss_speed() {
        let mut state = session(Difficulty::Medium, TurretType::Standard);
        state.economy.inventory.absolute_zero = 1;
        state
            .enemies
            .push(parked(EnemyKind::Normal, Vec3::new(0.0, 0.5, 40.0), 1.0, 2.0));
        state
            .enemies
            .push(parked(EnemyKind::Boss, Vec3::new(40.0, 1.5, 0.0), 1.0, 40.0));
        state.input.key_down(InputKey::ItemAbsoluteZero);

        let events = state.tick(DT);
        assert!(events.contains(&SessionEvent::ItemActivated {
            item: ShopItem::AbsoluteZero
        }));
        assert!((state.enemies[0].position.z - 39.75).abs() < 1e-4);
        assert!((state.enemies[1].position.x - 39.0).abs() < 1e-4);
    }

    #[test]
    fn emp_stops_non_bosses() {
        let mut state = session(Difficulty::Medium, TurretType::Standard);
        state.economy.inventory.emp_blast = 1;
        state
            .enemies
            .push(parked(EnemyKind::Tank, Vec3::new(0.0, 0.75, 30.0), 1.0, 6.0));
        state
            .enemies
            .push(parked(EnemyKind::Boss, Vec3::new(40.0, 1.5, 0.0), 1.0, 40.0));
        state.input.key_down(InputKey::ItemEmpBlast);
        state.tick(DT);
        assert_eq!(state.enemies[0].position.z, 30.0);
        // Bosses shrug it off
        assert!((state.enemies[1].position.x - 39.0).abs() < 1e-4);
    }

    #[test]
    fn time_warp_resets_positions_once() {
        let mut state = session(Difficulty::Medium, TurretType::Standard);
        state.economy.inventory.time_warp = 1;
        state
            .enemies
            .push(parked(EnemyKind::Normal, Vec3::new(0.0, 0.5, 20.0), 0.0, 2.0));
        state
            .enemies
            .push(parked(EnemyKind::Tank, Vec3::new(15.0, 0.75, 0.0), 0.5, 6.0));
        state.input.key_down(InputKey::ItemTimeWarp);
        state.tick(DT);

        assert!((state.enemies[0].position.z - 50.0).abs() < 1e-4);
        assert!(state.enemies[0].position.x.abs() < 1e-4);
        // Index 1 of 2 lands opposite, then steps inward
        assert!((state.enemies[1].position.z + 49.5).abs() < 1e-3);

        // Still active, but no second reset
        state.tick(DT);
        assert!((state.enemies[1].position.z + 49.0).abs() < 1e-3);
    }

    #[test]
    fn time_warp_leaves_bosses_in_place() {
        let mut state = session(Difficulty::Medium, TurretType::Standard);
        state.economy.inventory.time_warp = 1;
        let boss_at = Vec3::new(10.0, 1.5, 10.0);
        state
            .enemies
            .push(parked(EnemyKind::Boss, boss_at, 0.0, 40.0));
        state
            .enemies
            .push(parked(EnemyKind::Normal, Vec3::new(0.0, 0.5, 20.0), 0.0, 2.0));
        state.input.key_down(InputKey::ItemTimeWarp);
        state.tick(DT);

        assert_eq!(state.enemies[0].position, boss_at);
        // The boss still counts toward the spacing
        assert!((state.enemies[1].position.z + 50.0).abs() < 1e-3);
    }

    #[test]
    fn pausing_mid_charge_drops_the_charge() {
        let mut state = session(Difficulty::Easy, TurretType::Sniper);
        state.input.key_down(InputKey::Fire);
        for _ in 0..108 {
            state.tick(DT);
        }
        assert!(state.turret.charging);
        assert!(state.turret.charge > 0.85);

        state.set_paused(true);
        state.set_paused(false);
        assert!(!state.turret.charging);
        assert_eq!(state.turret.charge, 0.0);
        assert_eq!(state.turret.zoom, 1.0);

        for _ in 0..30 {
            state.tick(DT);
        }
        assert!(!state.turret.charging);

        // A short tap fires a barely charged shot
        state.input.key_down(InputKey::Fire);
        for _ in 0..6 {
            state.tick(DT);
        }
        state.input.key_up(InputKey::Fire);
        state.projectiles.clear();
        state.tick(DT);
        assert_eq!(state.projectiles.len(), 1);
        assert!(state.projectiles[0].charge_level < 0.1);
    }

    #[test]
    fn upgrade_screen_drops_the_charge() {
        let mut state = session(Difficulty::Easy, TurretType::Sniper);
        state.input.key_down(InputKey::Fire);
        for _ in 0..60 {
            state.tick(DT);
        }
        assert!(state.turret.charge > 0.4);

        state.set_wave(2);
        assert!(state.show_upgrade_screen);
        assert!(!state.turret.charging);
        assert_eq!(state.turret.charge, 0.0);
    }

    // Projectile velocity is per tick, so the distance covered per tick
    // does not depend on the delta passed in
    #[test]
    fn projectile_travel_is_frame_rate_dependent() {
        let mut fast = session(Difficulty::Medium, TurretType::Standard);
        let mut slow = session(Difficulty::Medium, TurretType::Standard);
        for state in [&mut fast, &mut slow] {
            state.projectiles.push(Projectile::new(
                TurretType::Standard,
                0.0,
                0.75,
                1.5,
                100.0,
                0.0,
                None,
            ));
        }

        fast.tick(1.0 / 120.0);
        slow.tick(1.0 / 30.0);
        assert_eq!(fast.projectiles[0].position.z, slow.projectiles[0].position.z);
        assert!((fast.projectiles[0].position.z - 0.75).abs() < 1e-6);
    }

    #[test]
    fn super_charge_key_activates_when_ready() {
        let mut state = session(Difficulty::Medium, TurretType::Standard);
        state.super_charge.meter = 100.0;
        state.input.key_down(InputKey::SuperCharge);

        let events = state.tick(DT);
        assert!(events.contains(&SessionEvent::SuperChargeActivated));
        assert!(state.super_charge.active);
        assert_eq!(state.super_charge.meter, 0.0);
        assert_eq!(state.fire_modifiers().damage, 2.2);

        // Key press is consumed
        assert!(!state.input.super_requested);
    }

    #[test]
    fn upgrades_feed_fire_modifiers() {
        let mut state = session(Difficulty::Medium, TurretType::Standard);
        state.economy.coins = 30;
        assert!(state.purchase_upgrade(UpgradeTrack::ReloadTime));
        assert!(state.purchase_upgrade(UpgradeTrack::ReloadTime));
        assert!((state.fire_modifiers().reload_time - 0.8).abs() < 1e-6);
        assert_eq!(state.economy.coins, 0);
    }

    #[test]
    fn indicators_flag_enemies_outside_view() {
        let mut state = session(Difficulty::Medium, TurretType::Standard);
        state
            .enemies
            .push(parked(EnemyKind::Normal, Vec3::new(0.0, 0.5, 30.0), 0.0, 2.0));
        state
            .enemies
            .push(parked(EnemyKind::Normal, Vec3::new(30.0, 0.5, 0.0), 0.0, 2.0));
        state
            .enemies
            .push(parked(EnemyKind::Normal, Vec3::new(-30.0, 0.5, 0.0), 0.0, 2.0));
        // In view but too far to be drawn
        state
            .enemies
            .push(parked(EnemyKind::Tank, Vec3::new(0.0, 0.75, 55.0), 0.0, 6.0));
        state.tick(DT);

        let left: Vec<_> = state.indicators.left.iter().map(|i| i.enemy_id).collect();
        let right: Vec<_> = state.indicators.right.iter().map(|i| i.enemy_id).collect();
        assert_eq!(left, vec![state.enemies[1].id, state.enemies[3].id]);
        assert_eq!(right, vec![state.enemies[2].id]);
    }

    #[test]
    fn clamps_hold_under_sustained_fire() {
        let mut state = session(Difficulty::Medium, TurretType::MachineGun);
        state.economy.inventory = PerItem {
            absolute_zero: 2,
            time_warp: 2,
            shield: 2,
            emp_blast: 2,
        };
        state.input.key_down(InputKey::Fire);
        state.input.key_down(InputKey::RotateLeft);

        for tick in 0..900 {
            if tick % 200 == 0 {
                state.input.key_down(InputKey::ItemEmpBlast);
                state.input.key_down(InputKey::ItemShield);
            }
            state.tick(DT);
            assert!((0.0..=1.0).contains(&state.turret.reload_progress));
            assert!((0.0..=1.0).contains(&state.turret.heat));
            assert!((0.0..=100.0).contains(&state.super_charge.meter));
            for item in ShopItem::ALL {
                assert!(*state.economy.cooldowns.get(item) >= 0.0);
            }
        }
    }

    #[test]
    fn full_reset_keeps_selections() {
        let mut state = session(Difficulty::Hard, TurretType::Sniper);
        state.economy.coins = 80;
        state.kill_enemy(EnemyKind::Tank);
        state.tick(DT);
        state.full_reset();

        assert_eq!(state.difficulty, Difficulty::Hard);
        assert_eq!(state.turret_type(), TurretType::Sniper);
        assert_eq!(state.economy, Economy::new());
        assert_eq!(state.wave, WaveState::new());
        assert!(state.enemies.is_empty());
        assert_eq!(state.phase(), SessionPhase::Initializing);
    }
}
