//! Character movement for simulated targets.
//!
//! Lightweight on purpose: a flat ground plane, gravity, braking and the
//! launch rules used by knockback, jump pads and the man cannon.
//! Runs at a fixed timestep (see `FIXED_TIMESTEP_HZ`).

use bevy::prelude::*;

use crate::targets::Target;

/// Fixed tick rate of the simulation.
pub const FIXED_TIMESTEP_HZ: f64 = 60.0;

/// Gravity in m/s^2 (negative Y).
/// Slightly stronger than real-world for snappier game feel.
pub const GRAVITY: f32 = -18.0;

/// Horizontal deceleration on the ground in m/s^2.
pub const MOVE_BRAKE: f32 = 55.0;

/// How close to the ground we "snap" when falling (prevents tiny hovering).
pub const GROUND_SNAP_DISTANCE: f32 = 0.35;

/// Terminal fall speed while gliding.
pub const GLIDE_FALL_SPEED: f32 = -2.0;

/// Launch impulses on a character that is already airborne are divided by this.
pub const AIRBORNE_FORCE_DIVISOR: f32 = 1000.0;

/// Launch strength after airborne attenuation.
#[inline]
pub fn launch_force(force: f32, airborne: bool) -> f32 {
    if airborne {
        force / AIRBORNE_FORCE_DIVISOR
    } else {
        force
    }
}

/// Add (or, per axis group, replace) a target's velocity.
///
/// `override_xy` replaces the horizontal components, `override_z` the
/// vertical one; otherwise the launch adds to the current velocity.
pub fn launch(target: &mut Target, velocity: Vec3, override_xy: bool, override_z: bool) {
    if override_xy {
        target.velocity.x = velocity.x;
        target.velocity.z = velocity.z;
    } else {
        target.velocity.x += velocity.x;
        target.velocity.z += velocity.z;
    }

    if override_z {
        target.velocity.y = velocity.y;
    } else {
        target.velocity.y += velocity.y;
    }

    if target.velocity.y > 0.0 {
        target.grounded = false;
    }
}

/// What happened during one movement step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StepOutcome {
    pub landed: bool,
}

/// Step a target one fixed tick against an optional ground plane.
///
/// - Brakes horizontal velocity while grounded
/// - Applies gravity while airborne; gliding clamps the fall speed
/// - Snaps to the ground and clears glide/launch state on landing
pub fn step_target(target: &mut Target, ground_height: Option<f32>, dt: f32) -> StepOutcome {
    let mut outcome = StepOutcome::default();

    if target.grounded {
        let mut horiz = Vec3::new(target.velocity.x, 0.0, target.velocity.z);
        let speed = horiz.length();
        let max_change = MOVE_BRAKE * dt;
        if speed <= max_change {
            horiz = Vec3::ZERO;
        } else {
            horiz -= horiz * (max_change / speed);
        }
        target.velocity.x = horiz.x;
        target.velocity.z = horiz.z;
    } else {
        target.velocity.y += GRAVITY * dt;
        if target.gliding {
            target.velocity.y = target.velocity.y.max(GLIDE_FALL_SPEED);
        }
    }

    target.position += target.velocity * dt;

    let Some(ground_y) = ground_height else {
        return outcome;
    };

    let was_airborne = !target.grounded;
    let mut on_ground = false;

    if target.position.y < ground_y {
        target.position.y = ground_y;
        if target.velocity.y < 0.0 {
            target.velocity.y = 0.0;
        }
        on_ground = true;
    } else if target.velocity.y <= 0.0 && (target.position.y - ground_y) < GROUND_SNAP_DISTANCE {
        target.position.y = ground_y;
        target.velocity.y = 0.0;
        on_ground = true;
    }

    target.grounded = on_ground;
    if on_ground && was_airborne {
        target.gliding = false;
        target.launched = false;
        outcome.landed = true;
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_launch_force_airborne_attenuation() {
        assert_eq!(launch_force(1500.0, false), 1500.0);
        assert!((launch_force(1500.0, true) - 1.5).abs() < 1e-6);
    }

    #[test]
    fn test_launch_override_replaces_vertical() {
        let mut target = Target::player("p", Vec3::ZERO);
        target.velocity = Vec3::new(1.0, -3.0, 0.0);
        launch(&mut target, Vec3::new(0.0, 10.0, 0.0), false, true);
        assert_eq!(target.velocity, Vec3::new(1.0, 10.0, 0.0));
        assert!(!target.grounded);
    }

    #[test]
    fn test_launched_target_lands_and_clears_flags() {
        let mut target = Target::player("p", Vec3::ZERO);
        target.launched = true;
        launch(&mut target, Vec3::new(0.0, 8.0, 0.0), false, true);

        let dt = 1.0 / FIXED_TIMESTEP_HZ as f32;
        let mut landed = false;
        for _ in 0..240 {
            if step_target(&mut target, Some(0.0), dt).landed {
                landed = true;
                break;
            }
        }
        assert!(landed);
        assert!(target.grounded);
        assert!(!target.launched);
        assert_eq!(target.position.y, 0.0);
    }

    #[test]
    fn test_glide_clamps_fall_speed() {
        let mut target = Target::player("p", Vec3::new(0.0, 50.0, 0.0));
        target.grounded = false;
        target.gliding = true;
        for _ in 0..60 {
            step_target(&mut target, Some(0.0), 1.0 / 60.0);
        }
        assert!(target.velocity.y >= GLIDE_FALL_SPEED);
        assert!(target.gliding);
    }

    #[test]
    fn test_ground_brake_stops_sliding() {
        let mut target = Target::enemy("e", Vec3::ZERO);
        target.velocity = Vec3::new(3.0, 0.0, 0.0);
        for _ in 0..10 {
            step_target(&mut target, Some(0.0), 1.0 / 60.0);
        }
        assert_eq!(target.velocity, Vec3::ZERO);
    }
}
