//! Kinematics for projectiles and advancing enemies

use serde::{Deserialize, Serialize};

/// Radius around the turret that counts as a breach
pub const CENTER_RADIUS: f32 = 10.0;

/// Projectiles older than this are discarded regardless of distance (seconds)
pub const PROJECTILE_MAX_AGE: f32 = 5.0;

/// Turret rotation rate (radians per second)
pub const ROTATION_RATE: f32 = 1.5;

/// Half-width of the turret's field of view
pub const FIELD_OF_VIEW_HALF_ANGLE: f32 = std::f32::consts::FRAC_PI_4;

/// Beyond this range tanks and bosses are not treated as on-screen
pub const VISIBLE_RANGE: f32 = 50.0;

/// World-space position or velocity. The ground plane is x/z; y is height.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Point on the ground plane at `angle` and `distance` from the origin
    pub fn on_ring(angle: f32, distance: f32, height: f32) -> Self {
        Self::new(angle.sin() * distance, height, angle.cos() * distance)
    }

    /// Length in the x/z plane
    pub fn planar_length(&self) -> f32 {
        (self.x * self.x + self.z * self.z).sqrt()
    }

    pub fn planar_distance(&self, other: &Vec3) -> f32 {
        let dx = self.x - other.x;
        let dz = self.z - other.z;
        (dx * dx + dz * dz).sqrt()
    }

    /// Bearing from the origin, measured the same way turret rotation is
    pub fn bearing(&self) -> f32 {
        self.x.atan2(self.z)
    }
}

/// Stateless movement helpers
pub struct PhysicsSystem;

impl PhysicsSystem {
    /// Advance a projectile by one tick. Velocity is in units per tick and
    /// is applied without delta scaling. Returns the distance covered.
    pub fn step_projectile(position: &mut Vec3, velocity: &Vec3) -> f32 {
        position.x += velocity.x;
        position.z += velocity.z;
        velocity.planar_length()
    }

    /// Step an enemy toward the origin. The step is `speed` units per tick
    /// regardless of how far away it is.
    pub fn step_toward_center(position: &mut Vec3, speed: f32) {
        let length = position.planar_length();
        if length <= f32::EPSILON {
            return;
        }
        let factor = speed / length;
        position.x -= position.x * factor;
        position.z -= position.z * factor;
    }

    pub fn is_in_center(position: &Vec3) -> bool {
        position.planar_length() < CENTER_RADIUS
    }

    /// Apply rotate input for one tick. Rotation is unbounded.
    pub fn rotate(rotation: f32, left: bool, right: bool, dt: f32) -> f32 {
        let mut rotation = rotation;
        if left {
            rotation += dt * ROTATION_RATE;
        }
        if right {
            rotation -= dt * ROTATION_RATE;
        }
        rotation
    }

    /// Absolute angle between the turret facing and a bearing, in [0, PI]
    pub fn angle_off_facing(bearing: f32, facing: f32) -> f32 {
        let diff = (bearing - facing).rem_euclid(std::f32::consts::TAU);
        if diff > std::f32::consts::PI {
            std::f32::consts::TAU - diff
        } else {
            diff
        }
    }

    /// True when the bearing lies on the turret's left-hand side
    pub fn is_to_left(bearing: f32, facing: f32) -> bool {
        (bearing - facing).rem_euclid(std::f32::consts::TAU) < std::f32::consts::PI
    }

    /// Indicator blink period: closer enemies blink faster
    pub fn blink_period(distance: f32) -> f32 {
        (distance / 20.0).clamp(0.1, 1.0)
    }

    /// Whether an indicator with the given period is lit at `clock`
    pub fn blink_on(clock: f32, period: f32) -> bool {
        clock.rem_euclid(period) < period / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, PI};

    #[test]
    fn projectile_moves_by_raw_velocity() {
        let mut position = Vec3::new(0.0, 0.1, 0.0);
        let velocity = Vec3::new(0.3, 0.0, 0.4);
        let covered = PhysicsSystem::step_projectile(&mut position, &velocity);
        assert!((covered - 0.5).abs() < 1e-6);
        assert!((position.x - 0.3).abs() < 1e-6);
        assert!((position.z - 0.4).abs() < 1e-6);
        assert_eq!(position.y, 0.1);
    }

    #[test]
    fn enemy_step_is_independent_of_distance() {
        let mut near = Vec3::new(0.0, 0.5, 20.0);
        let mut far = Vec3::new(0.0, 0.5, 55.0);
        PhysicsSystem::step_toward_center(&mut near, 0.5);
        PhysicsSystem::step_toward_center(&mut far, 0.5);
        assert!((near.z - 19.5).abs() < 1e-5);
        assert!((far.z - 54.5).abs() < 1e-5);
    }

    #[test]
    fn enemy_at_origin_does_not_move() {
        let mut origin = Vec3::default();
        PhysicsSystem::step_toward_center(&mut origin, 1.0);
        assert_eq!(origin, Vec3::default());
    }

    #[test]
    fn rotation_is_unbounded() {
        let mut rotation = 0.0;
        for _ in 0..100 {
            rotation = PhysicsSystem::rotate(rotation, true, false, 0.1);
        }
        assert!((rotation - 15.0).abs() < 1e-4);
        assert_eq!(PhysicsSystem::rotate(1.0, true, true, 0.5), 1.0);
    }

    #[test]
    fn angle_off_facing_wraps() {
        assert!((PhysicsSystem::angle_off_facing(0.1, -0.1) - 0.2).abs() < 1e-6);
        assert!((PhysicsSystem::angle_off_facing(PI - 0.1, -PI + 0.1) - 0.2).abs() < 1e-5);
        assert!((PhysicsSystem::angle_off_facing(0.0, 4.0 * PI) - 0.0).abs() < 1e-4);
    }

    #[test]
    fn left_and_right_sides() {
        assert!(PhysicsSystem::is_to_left(FRAC_PI_2, 0.0));
        assert!(!PhysicsSystem::is_to_left(-FRAC_PI_2, 0.0));
    }

    #[test]
    fn blink_period_is_clamped() {
        assert_eq!(PhysicsSystem::blink_period(0.5), 0.1);
        assert_eq!(PhysicsSystem::blink_period(10.0), 0.5);
        assert_eq!(PhysicsSystem::blink_period(80.0), 1.0);
        assert!(PhysicsSystem::blink_on(0.2, 1.0));
        assert!(!PhysicsSystem::blink_on(0.7, 1.0));
    }

    #[test]
    fn ring_points_are_at_requested_distance() {
        let p = Vec3::on_ring(1.3, 50.0, 0.75);
        assert!((p.planar_length() - 50.0).abs() < 1e-4);
        assert!((p.bearing() - 1.3).abs() < 1e-5);
    }
}
