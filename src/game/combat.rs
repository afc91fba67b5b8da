//! Combat system - enemies, projectiles, hit detection and boss shields

use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::physics::{PhysicsSystem, Vec3, PROJECTILE_MAX_AGE};
use super::settings::TurretType;

/// Extra coins for a boss killed in combat, on top of its kill reward
pub const BOSS_KILL_BONUS: u32 = 24;

/// Each boss shield pool is this fraction of the boss's max health
pub const BOSS_SHIELD_FRACTION: f32 = 0.2;

/// Health fractions at which the boss raises a shield, in order
pub const BOSS_SHIELD_THRESHOLDS: [f32; 3] = [0.75, 0.5, 0.25];

/// Enemy archetypes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnemyKind {
    Normal,
    Tank,
    Boss,
}

impl EnemyKind {
    pub fn coin_reward(&self) -> u32 {
        match self {
            EnemyKind::Normal => 5,
            EnemyKind::Tank => 10,
            EnemyKind::Boss => 25,
        }
    }

    pub fn super_charge_gain(&self) -> f32 {
        match self {
            EnemyKind::Normal => 4.0,
            EnemyKind::Tank => 8.0,
            EnemyKind::Boss => 15.0,
        }
    }

    pub fn hit_radius(&self) -> f32 {
        match self {
            EnemyKind::Tank => 2.5,
            EnemyKind::Normal | EnemyKind::Boss => 2.0,
        }
    }

    /// Render height of the model's center
    pub fn spawn_height(&self) -> f32 {
        match self {
            EnemyKind::Normal => 0.5,
            EnemyKind::Tank => 0.75,
            EnemyKind::Boss => 1.5,
        }
    }
}

/// Damage-absorbing pool raised by a boss
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BossShieldState {
    pub active: bool,
    pub health: f32,
    pub max_health: f32,
}

/// Boss-only state carried on the enemy
#[derive(Debug, Clone, PartialEq)]
pub struct BossState {
    pub shield: BossShieldState,
    /// Next health fraction that raises a shield, None once all are spent
    pub next_shield_threshold: Option<f32>,
}

impl Default for BossState {
    fn default() -> Self {
        Self {
            shield: BossShieldState::default(),
            next_shield_threshold: Some(BOSS_SHIELD_THRESHOLDS[0]),
        }
    }
}

impl BossState {
    pub fn has_shield(&self) -> bool {
        self.shield.active
    }

    fn advance_threshold(&mut self) {
        self.next_shield_threshold = match self.next_shield_threshold {
            Some(current) => BOSS_SHIELD_THRESHOLDS
                .iter()
                .copied()
                .find(|t| *t < current),
            None => None,
        };
    }

    /// Raise a shield if health has fallen to the next threshold.
    /// At most one activation per call.
    fn check_threshold(&mut self, health: f32, max_health: f32) -> bool {
        if self.shield.active || max_health <= 0.0 {
            return false;
        }
        let Some(threshold) = self.next_shield_threshold else {
            return false;
        };
        if health / max_health > threshold {
            return false;
        }

        let pool = max_health * BOSS_SHIELD_FRACTION;
        self.shield = BossShieldState {
            active: true,
            health: pool,
            max_health: pool,
        };
        self.advance_threshold();
        true
    }
}

/// A live enemy
#[derive(Debug, Clone, PartialEq)]
pub struct Enemy {
    pub id: Uuid,
    pub kind: EnemyKind,
    pub position: Vec3,
    /// Units per tick toward the center
    pub speed: f32,
    pub health: f32,
    pub max_health: f32,
    /// Present only for bosses
    pub boss: Option<BossState>,
}

impl Enemy {
    pub fn new(kind: EnemyKind, position: Vec3, speed: f32, health: f32) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            position,
            speed,
            health,
            max_health: health,
            boss: (kind == EnemyKind::Boss).then(BossState::default),
        }
    }

    pub fn is_boss(&self) -> bool {
        self.kind == EnemyKind::Boss
    }

    pub fn shield(&self) -> BossShieldState {
        self.boss.as_ref().map(|b| b.shield).unwrap_or_default()
    }
}

/// Active projectile in the game
#[derive(Debug, Clone, PartialEq)]
pub struct Projectile {
    pub id: Uuid,
    pub position: Vec3,
    /// Units per tick
    pub velocity: Vec3,
    pub damage: f32,
    pub distance_traveled: f32,
    pub max_distance: f32,
    pub turret_type: TurretType,
    /// Session clock at creation (seconds)
    pub created_at: f32,
    /// Seconds alive
    pub age: f32,
    pub charged: bool,
    pub charge_level: f32,
}

impl Projectile {
    /// Create a projectile leaving the turret along `angle`
    pub fn new(
        turret_type: TurretType,
        angle: f32,
        speed: f32,
        damage: f32,
        max_distance: f32,
        created_at: f32,
        charge_level: Option<f32>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            position: Vec3::new(0.0, 0.1, 0.0),
            velocity: Vec3::new(angle.sin() * speed, 0.0, angle.cos() * speed),
            damage,
            distance_traveled: 0.0,
            max_distance,
            turret_type,
            created_at,
            age: 0.0,
            charged: charge_level.is_some(),
            charge_level: charge_level.unwrap_or(0.0).clamp(0.0, 1.0),
        }
    }

    /// Move one tick and age by `dt`. Returns false once the projectile
    /// is spent.
    pub fn update(&mut self, dt: f32) -> bool {
        self.distance_traveled += PhysicsSystem::step_projectile(&mut self.position, &self.velocity);
        self.age += dt;
        self.distance_traveled < self.max_distance && self.age <= PROJECTILE_MAX_AGE
    }

    /// Charged shots get a wider hitbox so fast rounds don't tunnel
    pub fn hit_radius(&self) -> f32 {
        if self.charged {
            0.5 + 0.5 * self.charge_level
        } else {
            0.2
        }
    }

    pub fn check_hit(&self, enemy: &Enemy) -> bool {
        self.position.planar_distance(&enemy.position) < enemy.kind.hit_radius() + self.hit_radius()
    }
}

/// What a single projectile impact did
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HitOutcome {
    /// Shield soaked the hit and is still up
    ShieldDamaged,
    /// Shield soaked the hit and collapsed
    ShieldBroken,
    /// Enemy took damage and survived
    Damaged { shield_raised: bool },
    Killed { kind: EnemyKind },
}

/// Combat system for applying damage
pub struct CombatSystem;

impl CombatSystem {
    /// Apply damage to health, returns (new_health, is_dead)
    pub fn apply_damage(current_health: f32, damage: f32) -> (f32, bool) {
        let new_health = current_health - damage;
        (new_health.max(0.0), new_health <= 0.0)
    }

    /// Resolve one projectile hit against an enemy
    pub fn resolve_hit(enemy: &mut Enemy, damage: f32) -> HitOutcome {
        if let Some(boss) = enemy.boss.as_mut() {
            if boss.has_shield() {
                let remaining = (boss.shield.health - damage).max(0.0);
                if remaining <= 0.0 {
                    boss.shield = BossShieldState::default();
                    info!(enemy_id = %enemy.id, "Boss shield broken");
                    return HitOutcome::ShieldBroken;
                }
                boss.shield.health = remaining;
                return HitOutcome::ShieldDamaged;
            }
        }

        let (health, killed) = Self::apply_damage(enemy.health, damage);
        enemy.health = health;
        if killed {
            return HitOutcome::Killed { kind: enemy.kind };
        }

        let max_health = enemy.max_health;
        let shield_raised = enemy
            .boss
            .as_mut()
            .map(|boss| boss.check_threshold(health, max_health))
            .unwrap_or(false);
        if shield_raised {
            info!(enemy_id = %enemy.id, health, "Boss shield raised");
        }

        HitOutcome::Damaged { shield_raised }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boss(max_health: f32) -> Enemy {
        Enemy::new(EnemyKind::Boss, Vec3::new(0.0, 1.5, 30.0), 0.01, max_health)
    }

    #[test]
    fn only_bosses_carry_boss_state() {
        assert!(boss(100.0).boss.is_some());
        let tank = Enemy::new(EnemyKind::Tank, Vec3::default(), 0.01, 6.0);
        assert!(tank.boss.is_none());
        assert_eq!(tank.shield(), BossShieldState::default());
    }

    #[test]
    fn normal_enemy_dies_at_zero() {
        let mut enemy = Enemy::new(EnemyKind::Normal, Vec3::default(), 0.02, 2.0);
        assert_eq!(
            CombatSystem::resolve_hit(&mut enemy, 1.5),
            HitOutcome::Damaged {
                shield_raised: false
            }
        );
        assert_eq!(enemy.health, 0.5);
        assert_eq!(
            CombatSystem::resolve_hit(&mut enemy, 0.5),
            HitOutcome::Killed {
                kind: EnemyKind::Normal
            }
        );
        assert_eq!(enemy.health, 0.0);
    }

    #[test]
    fn boss_raises_shield_at_three_quarters() {
        let mut enemy = boss(100.0);
        let outcome = CombatSystem::resolve_hit(&mut enemy, 25.0);
        assert_eq!(
            outcome,
            HitOutcome::Damaged {
                shield_raised: true
            }
        );
        assert_eq!(enemy.health, 75.0);
        let state = enemy.boss.as_ref().unwrap();
        assert!(state.has_shield());
        assert_eq!(state.shield.max_health, 20.0);
        assert_eq!(state.shield.health, 20.0);
        assert_eq!(state.next_shield_threshold, Some(0.5));
    }

    #[test]
    fn shield_absorbs_damage_until_broken() {
        let mut enemy = boss(100.0);
        CombatSystem::resolve_hit(&mut enemy, 25.0);

        assert_eq!(
            CombatSystem::resolve_hit(&mut enemy, 15.0),
            HitOutcome::ShieldDamaged
        );
        assert_eq!(enemy.shield().health, 5.0);
        assert_eq!(enemy.health, 75.0);

        assert_eq!(CombatSystem::resolve_hit(&mut enemy, 10.0), HitOutcome::ShieldBroken);
        assert_eq!(enemy.health, 75.0);
        assert!(!enemy.shield().active);

        // Next hit lands on health again
        CombatSystem::resolve_hit(&mut enemy, 5.0);
        assert_eq!(enemy.health, 70.0);
    }

    #[test]
    fn one_shield_per_crossing_even_for_large_hits() {
        let mut enemy = boss(100.0);
        // Drops straight past 0.75 and 0.5
        CombatSystem::resolve_hit(&mut enemy, 60.0);
        let state = enemy.boss.as_ref().unwrap();
        assert!(state.has_shield());
        assert_eq!(state.next_shield_threshold, Some(0.5));
    }

    #[test]
    fn thresholds_run_out_after_quarter() {
        let mut enemy = boss(100.0);
        for (damage, expected_next) in [(25.0, Some(0.5)), (25.0, Some(0.25)), (25.0, None)] {
            CombatSystem::resolve_hit(&mut enemy, damage);
            assert_eq!(enemy.boss.as_ref().unwrap().next_shield_threshold, expected_next);
            // Break the shield
            CombatSystem::resolve_hit(&mut enemy, 20.0);
            assert!(!enemy.shield().active);
        }

        assert_eq!(
            CombatSystem::resolve_hit(&mut enemy, 10.0),
            HitOutcome::Damaged {
                shield_raised: false
            }
        );
        assert_eq!(enemy.health, 15.0);
    }

    #[test]
    fn projectile_expires_at_max_distance() {
        let mut projectile =
            Projectile::new(TurretType::Standard, 0.0, 0.75, 1.5, 3.0, 0.0, None);
        assert!(projectile.update(0.016));
        assert!(projectile.update(0.016));
        assert!(projectile.update(0.016));
        assert!(!projectile.update(0.016));
        assert!((projectile.position.z - 3.0).abs() < 1e-5);
    }

    #[test]
    fn projectile_expires_after_five_seconds() {
        let mut projectile =
            Projectile::new(TurretType::Sniper, 0.0, 0.0, 3.0, 200.0, 0.0, None);
        assert!(projectile.update(5.0));
        assert!(!projectile.update(0.1));
    }

    #[test]
    fn charged_shots_have_wider_hitbox() {
        let plain = Projectile::new(TurretType::Sniper, 0.0, 1.0, 3.0, 200.0, 0.0, None);
        let charged = Projectile::new(TurretType::Sniper, 0.0, 1.0, 3.0, 200.0, 0.0, Some(1.0));
        assert_eq!(plain.hit_radius(), 0.2);
        assert_eq!(charged.hit_radius(), 1.0);

        let enemy = Enemy::new(EnemyKind::Normal, Vec3::new(2.8, 0.5, 0.0), 0.02, 2.0);
        assert!(!plain.check_hit(&enemy));
        assert!(charged.check_hit(&enemy));
    }

    #[test]
    fn tank_hitbox_is_larger() {
        let projectile = Projectile::new(TurretType::Standard, 0.0, 0.0, 1.5, 100.0, 0.0, None);
        let normal = Enemy::new(EnemyKind::Normal, Vec3::new(2.5, 0.5, 0.0), 0.02, 2.0);
        let tank = Enemy::new(EnemyKind::Tank, Vec3::new(2.5, 0.75, 0.0), 0.01, 6.0);
        assert!(!projectile.check_hit(&normal));
        assert!(projectile.check_hit(&tank));
    }
}
