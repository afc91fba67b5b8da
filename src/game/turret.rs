//! Turret aim, reload, heat and charge

use super::physics::PhysicsSystem;
use super::settings::{TurretSettings, TurretType};
use super::InputState;

/// Sniper charge gained per second of holding fire
pub const CHARGE_RATE: f32 = 0.5;

/// Upgrade multipliers resolved for the current tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FireModifiers {
    pub damage: f32,
    pub reload_time: f32,
    pub bullet_speed: f32,
}

impl Default for FireModifiers {
    fn default() -> Self {
        Self {
            damage: 1.0,
            reload_time: 1.0,
            bullet_speed: 1.0,
        }
    }
}

/// A shot the turret wants to fire this tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShotRequest {
    pub angle: f32,
    /// Units per tick
    pub speed: f32,
    pub damage: f32,
    /// Charge level for sniper shots
    pub charge: Option<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TurretState {
    pub turret_type: TurretType,
    pub settings: TurretSettings,
    /// Radians; owned by the combat loop
    pub rotation: f32,
    /// [0, 1], 1 = ready
    pub reload_progress: f32,
    /// [0, 1], machine gun only
    pub heat: f32,
    pub overheated: bool,
    /// [0, 1], sniper only
    pub charge: f32,
    pub charging: bool,
    /// Camera zoom proxy, 1 = unzoomed
    pub zoom: f32,
    since_last_shot: f32,
    overheat_elapsed: f32,
    fire_timer: f32,
}

impl TurretState {
    pub fn new(turret_type: TurretType) -> Self {
        Self {
            turret_type,
            settings: TurretSettings::for_type(turret_type),
            rotation: 0.0,
            reload_progress: 1.0,
            heat: 0.0,
            overheated: false,
            charge: 0.0,
            charging: false,
            zoom: 1.0,
            since_last_shot: f32::INFINITY,
            overheat_elapsed: 0.0,
            fire_timer: f32::INFINITY,
        }
    }

    /// Drop any held trigger state. Used when input is cut off mid-press
    /// so a sniper charge can't carry over into the next press.
    pub fn release_trigger(&mut self) {
        self.charging = false;
        self.charge = 0.0;
        self.zoom = 1.0;
        self.fire_timer = f32::INFINITY;
    }

    fn reload_secs(&self, modifiers: &FireModifiers) -> f32 {
        (self.settings.reload_secs() * modifiers.reload_time).max(f32::EPSILON)
    }

    pub fn can_fire(&self) -> bool {
        self.reload_progress >= 1.0 && !self.overheated
    }

    /// Advance reload, heat, rotation and trigger handling by one tick
    pub fn update(
        &mut self,
        input: &mut InputState,
        modifiers: &FireModifiers,
        dt: f32,
    ) -> Option<ShotRequest> {
        let reload_secs = self.reload_secs(modifiers);
        self.since_last_shot += dt;
        self.reload_progress = (self.since_last_shot / reload_secs).clamp(0.0, 1.0);

        if self.turret_type == TurretType::MachineGun {
            self.update_heat(input.fire_held, dt);
        }

        self.rotation = PhysicsSystem::rotate(self.rotation, input.rotate_left, input.rotate_right, dt);

        let shot = match self.turret_type {
            TurretType::Standard => self.trigger_single(input, modifiers),
            TurretType::Sniper => self.trigger_charged(input, modifiers, dt),
            TurretType::MachineGun => self.trigger_automatic(input, modifiers, reload_secs, dt),
        };

        if shot.is_some() {
            self.since_last_shot = 0.0;
            self.reload_progress = 0.0;
        }
        shot
    }

    fn update_heat(&mut self, firing: bool, dt: f32) {
        let overheat_secs = self.settings.overheat_secs().unwrap_or(f32::INFINITY);
        let cooldown_secs = self.settings.cooldown_secs().unwrap_or(f32::EPSILON);

        if self.overheated {
            self.overheat_elapsed += dt;
            if self.overheat_elapsed >= cooldown_secs {
                self.overheated = false;
                self.heat = 0.0;
            } else {
                self.heat = (1.0 - self.overheat_elapsed / cooldown_secs).clamp(0.0, 1.0);
            }
        } else if firing {
            self.heat += dt / overheat_secs;
            if self.heat >= 1.0 {
                self.heat = 1.0;
                self.overheated = true;
                self.overheat_elapsed = 0.0;
            }
        } else {
            // Idle cooling runs at twice the forced-cooldown rate
            self.heat = (self.heat - dt / (cooldown_secs / 2.0)).max(0.0);
        }
    }

    fn base_shot(&self, modifiers: &FireModifiers) -> ShotRequest {
        ShotRequest {
            angle: self.rotation,
            speed: self.settings.tick_speed() * modifiers.bullet_speed,
            damage: self.settings.damage * modifiers.damage,
            charge: None,
        }
    }

    /// One shot per press. A press made while reloading stays queued
    /// until the turret is ready.
    fn trigger_single(
        &mut self,
        input: &mut InputState,
        modifiers: &FireModifiers,
    ) -> Option<ShotRequest> {
        if input.fire_pressed && self.can_fire() {
            input.fire_pressed = false;
            return Some(self.base_shot(modifiers));
        }
        None
    }

    /// Hold to charge, release to fire
    fn trigger_charged(
        &mut self,
        input: &mut InputState,
        modifiers: &FireModifiers,
        dt: f32,
    ) -> Option<ShotRequest> {
        if input.fire_held {
            self.charging = true;
            self.charge = (self.charge + dt * CHARGE_RATE).min(1.0);
            let target = 1.0 + self.charge * 0.5;
            self.zoom += (target - self.zoom) * (dt * 5.0).min(1.0);
            return None;
        }

        let mut shot = None;
        if input.take_fire_release() {
            if self.charging && self.can_fire() {
                let charge = self.charge;
                let base = self.base_shot(modifiers);
                shot = Some(ShotRequest {
                    speed: base.speed * (1.0 + 2.0 * charge),
                    damage: base.damage * (1.0 + 1.5 * charge),
                    charge: Some(charge),
                    ..base
                });
            }
            self.charging = false;
            self.charge = 0.0;
            self.zoom += (1.0 - self.zoom) * (dt * 10.0).min(1.0);
        } else if self.zoom > 1.0 {
            self.zoom += (1.0 - self.zoom) * (dt * 5.0).min(1.0);
        }
        self.zoom = self.zoom.max(1.0);
        shot
    }

    /// Continuous fire at the reload cadence while held
    fn trigger_automatic(
        &mut self,
        input: &InputState,
        modifiers: &FireModifiers,
        reload_secs: f32,
        dt: f32,
    ) -> Option<ShotRequest> {
        if input.fire_held && self.can_fire() {
            self.fire_timer += dt;
            if self.fire_timer >= reload_secs {
                self.fire_timer = 0.0;
                return Some(self.base_shot(modifiers));
            }
        } else {
            self.fire_timer = reload_secs;
        }
        None
    }
}
