//! Player bot gunnery and combat event handling
//!
//! Bots aim at the nearest live enemy from eye height and keep pulling the
//! trigger; reloads are driven by the sim's own `ReloadRequested` events.

use bevy::prelude::*;
use shared::targets::head_offset;
use shared::{CombatEvent, CombatSim, FireOutcome, FireRejection, TargetId, TargetKind, TargetWorld};

use crate::world::Roster;

/// Bots do not bother shooting past this distance.
pub const BOT_ENGAGE_RANGE: f32 = 60.0;

/// Nearest live target of `kind` to `from`, within `max_range`.
pub fn nearest_live(world: &TargetWorld, from: Vec3, kind: TargetKind, max_range: f32) -> Option<(TargetId, Vec3)> {
    world
        .targets
        .iter()
        .filter(|(_, t)| t.kind == kind && t.is_alive())
        .map(|(id, t)| (id, t.center()))
        .filter(|(_, center)| center.distance(from) <= max_range)
        .min_by(|a, b| a.1.distance(from).total_cmp(&b.1.distance(from)))
}

/// Every player bot fires at its closest enemy.
pub fn drive_player_bots(mut sim: ResMut<CombatSim>, roster: Res<Roster>) {
    for bot in &roster.players {
        let Some(body) = sim.world().get(bot.target) else {
            continue;
        };
        if body.weapons_disabled() {
            continue;
        }
        let eye = body.position + head_offset();
        let Some((enemy, aim_at)) = nearest_live(sim.world(), eye, TargetKind::Enemy, BOT_ENGAGE_RANGE) else {
            // Nothing to shoot: top up if the magazine is running low.
            if sim.weapon(bot.weapon).is_some_and(|w| w.prompt_reload) {
                sim.reload(bot.weapon);
            }
            continue;
        };

        match sim.fire(bot.weapon, eye, aim_at - eye) {
            FireOutcome::Fired { .. } => trace!("{} shooting at {:?}", bot.name, enemy),
            FireOutcome::ReloadRequested => {}
            FireOutcome::Rejected(FireRejection::Cooldown | FireRejection::Reloading) => {}
            FireOutcome::Rejected(FireRejection::Disabled) => debug!("{} cannot fire right now", bot.name),
        }
    }
}

/// Drain the sim's outbox: react to reload requests, log the rest.
pub fn handle_combat_events(mut sim: ResMut<CombatSim>, roster: Res<Roster>) {
    let name_of = |id: TargetId| {
        roster
            .players
            .iter()
            .find(|p| p.target == id)
            .map_or_else(|| format!("{:?}", id), |p| p.name.clone())
    };

    for event in sim.drain_events() {
        match event {
            CombatEvent::ReloadRequested { weapon } => {
                if sim.reload(weapon) {
                    debug!("Weapon {:?} reloading", weapon);
                }
            }
            CombatEvent::Damage {
                instigator,
                target,
                amount,
                critical,
                killed,
            } => {
                let by = instigator.map_or_else(|| "the world".to_string(), name_of);
                if killed {
                    info!("{} killed {:?} ({:.1} damage{})", by, target, amount, if critical { ", critical" } else { "" });
                } else {
                    debug!("{} hit {:?} for {:.1}", by, target, amount);
                }
            }
            CombatEvent::MeleeHit { attacker, victim } => {
                info!("{:?} clubbed {}", attacker, name_of(victim));
            }
            CombatEvent::Voice { target, cue } => debug!("{} says {:?}", name_of(target), cue),
            CombatEvent::Notification { owner, notice } => debug!("{} notice: {:?}", name_of(owner), notice),
            CombatEvent::Launched { target, velocity } => debug!("{:?} launched at {:?}", target, velocity),
            CombatEvent::Explosion { location, radius } => debug!("Explosion at {:?} (r={})", location, radius),
            other => trace!("{:?}", other),
        }
    }
}
