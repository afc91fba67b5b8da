//! Super-charge meter and timed boost window

use serde::{Deserialize, Serialize};
use tracing::info;

use super::combat::EnemyKind;
use super::economy::{Economy, UpgradeLevels, UpgradeTrack};

/// Meter value at which super-charge can be activated
pub const SUPER_CHARGE_FULL: f32 = 100.0;

/// Boost window length before the duration upgrade is applied (seconds)
pub const BASE_SUPER_DURATION: f32 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuperChargePhase {
    Idle,
    Ready,
    Active,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SuperCharge {
    /// Meter in [0, 100]
    pub meter: f32,
    pub active: bool,
    /// Session clock (seconds) at activation
    pub activated_at: f32,
    /// Length of the current window (seconds)
    pub duration: f32,
    /// Upgrade levels at activation, restored on expiry
    pub saved_upgrades: Option<UpgradeLevels>,
}

impl Default for SuperCharge {
    fn default() -> Self {
        Self {
            meter: 0.0,
            active: false,
            activated_at: 0.0,
            duration: BASE_SUPER_DURATION,
            saved_upgrades: None,
        }
    }
}

impl SuperCharge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> SuperChargePhase {
        if self.active {
            SuperChargePhase::Active
        } else if self.meter >= SUPER_CHARGE_FULL {
            SuperChargePhase::Ready
        } else {
            SuperChargePhase::Idle
        }
    }

    /// Credit the meter for a kill, saturating at full
    pub fn record_kill(&mut self, kind: EnemyKind) {
        self.meter = (self.meter + kind.super_charge_gain()).min(SUPER_CHARGE_FULL);
    }

    /// Start the boost window. Only valid from Ready.
    pub fn activate(&mut self, economy: &Economy, now: f32) -> bool {
        if self.phase() != SuperChargePhase::Ready {
            return false;
        }

        // Resolved before the flag flips, so the leveled value applies
        let duration_multiplier =
            economy.upgrade_multiplier(UpgradeTrack::SuperChargeDuration, self.active);

        self.saved_upgrades = Some(economy.upgrades);
        self.active = true;
        self.activated_at = now;
        self.duration = BASE_SUPER_DURATION * duration_multiplier;
        self.meter = 0.0;

        info!(duration = self.duration, "Super charge activated");
        true
    }

    /// End the window once its duration has elapsed. Returns true on the
    /// tick the window closes.
    pub fn update(&mut self, economy: &mut Economy, now: f32) -> bool {
        if !self.active || now - self.activated_at < self.duration {
            return false;
        }

        self.active = false;
        if let Some(saved) = self.saved_upgrades.take() {
            economy.upgrades = saved;
        }

        info!("Super charge expired");
        true
    }

    /// Seconds left in the active window
    pub fn remaining(&self, now: f32) -> f32 {
        if self.active {
            (self.duration - (now - self.activated_at)).max(0.0)
        } else {
            0.0
        }
    }
}
