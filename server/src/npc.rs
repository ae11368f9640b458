//! Server-side enemy AI.
//!
//! Enemies walk straight at the nearest live player and swing once in
//! melee range. A swing is a timed melee window on the right hand; the sim
//! makes sure each victim is hit only once per swing.

use bevy::prelude::*;
use rand::Rng;
use shared::{CombatSim, Target, TargetKind, FIXED_TIMESTEP_HZ};

use crate::weapons::nearest_live;
use crate::world::{enemy_spawn_point, ArenaRng, EnemyBrain, Roster};

pub const ENEMY_MOVE_SPEED: f32 = 3.5;
/// Start a swing when the player is this close (m).
pub const ENEMY_MELEE_RANGE: f32 = 1.2;
pub const ENEMY_AGGRO_RANGE: f32 = 80.0;
/// Length of the damaging part of the swing animation.
pub const SWING_WINDOW: f32 = 0.35;
pub const SWING_COOLDOWN: f32 = 1.5;
pub const DEAD_ENEMY_RESPAWN_TIME: f32 = 3.0;

const ATTACK_BODY: &str = "hand_r";

/// Chase, swing and cool down.
pub fn drive_enemies(mut sim: ResMut<CombatSim>, mut roster: ResMut<Roster>) {
    let dt = 1.0 / FIXED_TIMESTEP_HZ as f32;

    for brain in roster.enemies.iter_mut() {
        let Some(body) = sim.world().get(brain.target) else {
            continue;
        };
        if !body.is_alive() {
            if brain.swing_remaining > 0.0 {
                brain.swing_remaining = 0.0;
                sim.end_melee(brain.target);
            }
            continue;
        }
        let position = body.position;
        let grounded = body.grounded;

        brain.swing_cooldown = (brain.swing_cooldown - dt).max(0.0);
        if brain.swing_remaining > 0.0 {
            brain.swing_remaining -= dt;
            if brain.swing_remaining <= 0.0 {
                sim.end_melee(brain.target);
            }
            continue;
        }

        let Some((_, player_center)) = nearest_live(sim.world(), position, TargetKind::Ally, ENEMY_AGGRO_RANGE) else {
            continue;
        };
        let mut to_player = player_center - position;
        to_player.y = 0.0;
        let distance = to_player.length();

        if distance <= ENEMY_MELEE_RANGE {
            if brain.swing_cooldown <= 0.0 {
                sim.begin_melee(brain.target, ATTACK_BODY);
                brain.swing_remaining = SWING_WINDOW;
                brain.swing_cooldown = SWING_COOLDOWN;
            }
            continue;
        }

        if grounded {
            let step = to_player / distance * ENEMY_MOVE_SPEED;
            if let Some(body) = sim.world_mut().get_mut(brain.target) {
                body.velocity.x = step.x;
                body.velocity.z = step.z;
            }
        }
    }
}

/// Replace enemies that have been dead long enough.
pub fn respawn_dead_enemies(mut sim: ResMut<CombatSim>, mut roster: ResMut<Roster>, mut rng: ResMut<ArenaRng>) {
    let dt = 1.0 / FIXED_TIMESTEP_HZ as f32;

    for index in 0..roster.enemies.len() {
        let brain = &mut roster.enemies[index];
        let dead = sim.world().get(brain.target).map_or(true, |t| !t.is_alive());
        if !dead {
            brain.dead_for = 0.0;
            continue;
        }
        brain.dead_for += dt;
        if brain.dead_for < DEAD_ENEMY_RESPAWN_TIME {
            continue;
        }

        sim.despawn_target(brain.target);
        let jitter = Vec3::new(rng.0.gen_range(-1.5..1.5), 0.0, rng.0.gen_range(-1.5..1.5));
        let spawn = enemy_spawn_point(index) + jitter;
        let target = sim.spawn_target(Target::enemy(format!("bot_{}", index), spawn));
        *brain = EnemyBrain::new(target);
        info!("Respawned enemy {} at {:?}", index, spawn);
    }
}
