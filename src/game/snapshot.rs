//! Snapshot building and cadence

use crate::ws::protocol::{
    EnemySnapshot, ProjectileSnapshot, ServerMsg, SessionSnapshot, SuperChargeSnapshot,
    TurretSnapshot,
};

use super::SessionState;

/// Builds snapshots for network transmission
pub struct SnapshotBuilder {
    /// Tick counter since last snapshot
    ticks_since_snapshot: u32,
    /// Snapshot interval in ticks
    snapshot_interval: u32,
}

impl SnapshotBuilder {
    pub fn new(snapshot_interval: u32) -> Self {
        Self {
            ticks_since_snapshot: 0,
            snapshot_interval: snapshot_interval.max(1),
        }
    }

    /// Check if it's time to send a snapshot
    pub fn should_send(&mut self) -> bool {
        self.ticks_since_snapshot += 1;
        if self.ticks_since_snapshot >= self.snapshot_interval {
            self.ticks_since_snapshot = 0;
            true
        } else {
            false
        }
    }

    /// Force snapshot on next check (used for important events)
    pub fn force_next(&mut self) {
        self.ticks_since_snapshot = self.snapshot_interval;
    }

    /// Capture the session as it stands after the tick
    pub fn capture(state: &SessionState) -> SessionSnapshot {
        let turret = &state.turret;
        SessionSnapshot {
            phase: state.phase(),
            wave: state.wave.number,
            is_boss_wave: state.wave.is_boss_wave,
            enemies_remaining: state.wave.enemies_remaining,
            enemies_killed: state.wave.enemies_killed,
            coins: state.economy.coins,
            time_of_day: state.wave.time_of_day(),
            turret: TurretSnapshot {
                turret_type: turret.turret_type,
                rotation: turret.rotation,
                reload_progress: turret.reload_progress,
                heat: turret.heat,
                overheated: turret.overheated,
                charge: turret.charge,
                charging: turret.charging,
                zoom: turret.zoom,
            },
            projectiles: state
                .projectiles
                .iter()
                .map(|p| ProjectileSnapshot {
                    id: p.id,
                    position: p.position,
                    turret_type: p.turret_type,
                    charged: p.charged,
                    charge_level: p.charge_level,
                })
                .collect(),
            enemies: state
                .enemies
                .iter()
                .map(|e| EnemySnapshot {
                    id: e.id,
                    kind: e.kind,
                    position: e.position,
                    health: e.health,
                    max_health: e.max_health,
                })
                .collect(),
            boss: state.boss,
            shield_flash: state.shield_flash > 0.0,
            indicators: state.indicators.clone(),
            super_charge: SuperChargeSnapshot {
                meter: state.super_charge.meter,
                active: state.super_charge.active,
                remaining: state.super_charge.remaining(state.clock),
            },
            upgrades: state.economy.upgrades,
            inventory: state.economy.inventory,
            active_items: state.economy.active,
            item_cooldowns: state.economy.cooldowns,
            show_upgrade_screen: state.show_upgrade_screen,
            paused: state.paused,
        }
    }

    /// Build a snapshot message
    pub fn build(&self, tick: u64, state: &SessionState) -> ServerMsg {
        ServerMsg::Snapshot {
            tick,
            state: Box::new(Self::capture(state)),
        }
    }
}
