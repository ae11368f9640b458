//! Projectile physics for lobbed ammo.
//!
//! Gravity plus a light velocity-squared drag.

use bevy::prelude::*;

/// Gravity acceleration for projectiles (m/s²)
pub const PROJECTILE_GRAVITY: f32 = -9.81;

/// Air drag coefficient (simplified model)
/// Higher = more drag, projectiles slow down faster
pub const PROJECTILE_DRAG_COEFFICIENT: f32 = 0.0004;

/// Simulate one physics step for a projectile
///
/// Returns (new_position, new_velocity)
pub fn step_projectile_physics(position: Vec3, velocity: Vec3, dt: f32) -> (Vec3, Vec3) {
    let mut vel = velocity;

    vel.y += PROJECTILE_GRAVITY * dt;

    // F_drag = -k * v² * v_hat
    let speed = vel.length();
    if speed > 0.1 {
        let drag_magnitude = PROJECTILE_DRAG_COEFFICIENT * speed * speed;
        vel -= vel / speed * drag_magnitude * dt;
    }

    let new_pos = position + vel * dt;
    (new_pos, vel)
}

/// Launch velocity from `muzzle` toward `aim_point`.
pub fn launch_velocity(muzzle: Vec3, aim_point: Vec3, speed: f32) -> Vec3 {
    (aim_point - muzzle).normalize_or_zero() * speed
}
