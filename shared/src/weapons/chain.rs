//! Chain-bounce sessions for chain ammo.
//!
//! A session hops from its current source to the nearest live enemy it has
//! not visited yet, one hop per deferred step, with damage halving per hop.

use bevy::prelude::*;
use std::collections::HashSet;

use super::damage::DamageContext;
use super::{AmmoType, WeaponId};
use crate::events::{CombatEvent, ImpactCue};
use crate::spatial::SpatialQuery;
use crate::targets::{TargetId, TargetKind};
use crate::world::TargetWorld;

/// Delay between chain hops in seconds.
pub const CHAIN_STEP_DELAY: f32 = 0.2;

/// Hop damage is `base / 2^(CHAIN_FALLOFF_EXPONENT - remaining)`.
pub const CHAIN_FALLOFF_EXPONENT: i32 = 5;

#[derive(Clone, Debug, PartialEq)]
pub struct ChainBounceSession {
    pub weapon: WeaponId,
    pub instigator: TargetId,
    pub source: TargetId,
    pub visited: HashSet<TargetId>,
    pub remaining_bounces: u32,
    /// Direction of the original shot, reused for every hop.
    pub direction: Vec3,
    pub base_damage: f32,
    pub range: f32,
}

impl ChainBounceSession {
    pub fn new(
        weapon: WeaponId,
        instigator: TargetId,
        first_target: TargetId,
        num_bounces: u32,
        direction: Vec3,
        base_damage: f32,
        range: f32,
    ) -> Self {
        Self {
            weapon,
            instigator,
            source: first_target,
            visited: HashSet::from([first_target]),
            remaining_bounces: num_bounces,
            direction,
            base_damage,
            range,
        }
    }
}

/// Remaining bounces above the exponent are clamped, so no hop outdamages the base.
pub fn chain_damage(base_damage: f32, remaining_bounces: u32) -> f32 {
    let remaining = remaining_bounces.min(CHAIN_FALLOFF_EXPONENT as u32) as i32;
    base_damage / 2f32.powi(CHAIN_FALLOFF_EXPONENT - remaining)
}

/// Nearest live enemy within `range` of `center` that is not in `visited`.
pub fn find_nearest_enemy(world: &TargetWorld, center: Vec3, range: f32, visited: &HashSet<TargetId>) -> Option<TargetId> {
    let ignore: Vec<TargetId> = visited.iter().copied().collect();
    world
        .sphere_overlap(center, range, &ignore)
        .into_iter()
        .map(|overlap| overlap.target)
        .find(|id| {
            world
                .get(*id)
                .is_some_and(|t| t.kind == TargetKind::Enemy && t.is_alive())
        })
}

/// Run one hop. Returns the session for the next hop, or `None` when the
/// chain is over.
pub fn step(ctx: &mut DamageContext, session: &ChainBounceSession) -> Option<ChainBounceSession> {
    if session.remaining_bounces == 0 {
        return None;
    }
    let source_position = match ctx.world.get(session.source) {
        Some(source) if source.kind == TargetKind::Enemy && source.is_alive() => source.position,
        _ => return None,
    };

    let next = find_nearest_enemy(ctx.world, source_position, session.range, &session.visited)?;
    let next_position = ctx.world.get(next)?.position;

    let mut updated = session.clone();
    updated.remaining_bounces -= 1;
    updated.visited.insert(next);
    updated.source = next;

    ctx.events.push(CombatEvent::Tracer {
        weapon: session.weapon,
        ammo: AmmoType::Chain,
        from: source_position,
        to: next_position,
    });
    ctx.events.push(CombatEvent::Impact {
        cue: ImpactCue::Chain,
        target: Some(next),
        location: next_position,
    });

    let damage = chain_damage(session.base_damage, updated.remaining_bounces);
    ctx.apply_enemy_damage(Some(session.instigator), next, damage, session.direction, false);

    Some(updated)
}
