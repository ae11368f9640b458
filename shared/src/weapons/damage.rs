//! Damage application
//!
//! Health reduction, critical checks and knockback for every damage source:
//! hitscan shots, chain bounces, grenade blasts and enemy melee.

use bevy::prelude::*;

use crate::events::{CombatEvent, EventOutbox, Hazards, StatusEffect, VoiceCue};
use crate::physics::{launch, launch_force};
use crate::targets::TargetId;
use crate::world::TargetWorld;

/// Knockback never launches a target upward.
pub fn knockback_direction(direction: Vec3) -> Vec3 {
    let mut dir = direction;
    if dir.y > 0.0 {
        dir.y = 0.0;
    }
    dir.normalize_or_zero()
}

/// Inclusive distance check against the target's "Critical" reference point.
pub fn is_critical(impact: Vec3, critical_point: Option<Vec3>, crit_distance: f32) -> bool {
    critical_point.is_some_and(|point| impact.distance(point) <= crit_distance)
}

/// Result of applying damage
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DamageResult {
    /// False when the target was missing or already dead.
    pub applied: bool,
    pub damage: f32,
    pub is_kill: bool,
    /// Normalized knockback direction.
    pub direction: Vec3,
}

/// Shared view of the state damage touches.
pub struct DamageContext<'a> {
    pub world: &'a mut TargetWorld,
    pub events: &'a mut EventOutbox,
    pub hazards: Hazards,
}

impl DamageContext<'_> {
    fn hurt(
        &mut self,
        instigator: Option<TargetId>,
        target: TargetId,
        amount: f32,
        critical: bool,
    ) -> Option<bool> {
        let body = self.world.get_mut(target)?;
        let health = body.health.as_mut()?;
        let killed = health.take_damage(amount);
        self.events.push(CombatEvent::Damage {
            instigator,
            target,
            amount,
            critical,
            killed,
        });
        Some(killed)
    }

    /// Launch along `direction` with airborne attenuation, replacing horizontal velocity.
    fn knock(&mut self, target: TargetId, direction: Vec3, force: f32) {
        let Some(body) = self.world.get_mut(target) else {
            return;
        };
        let velocity = direction * launch_force(force, body.is_airborne());
        launch(body, velocity, true, false);
        self.events.push(CombatEvent::Launched { target, velocity });
    }

    /// Hitscan or chain damage on a live enemy. Enemies are not knocked back
    /// by bullets.
    pub fn apply_enemy_damage(
        &mut self,
        instigator: Option<TargetId>,
        target: TargetId,
        amount: f32,
        direction: Vec3,
        critical: bool,
    ) -> DamageResult {
        let direction = knockback_direction(direction);
        if !self.world.is_alive(target) {
            return DamageResult::default();
        }

        if self.hazards.power_station_active {
            self.events.push(CombatEvent::Status {
                target,
                effect: StatusEffect::PowerStation,
            });
        }

        let Some(killed) = self.hurt(instigator, target, amount, critical) else {
            return DamageResult::default();
        };
        DamageResult {
            applied: true,
            damage: amount,
            is_kill: killed,
            direction,
        }
    }

    /// Friendly fire: voice cue, scaled damage (possibly zero) and knockback.
    pub fn apply_ally_damage(
        &mut self,
        instigator: Option<TargetId>,
        target: TargetId,
        amount: f32,
        direction: Vec3,
        knockback_force: f32,
        friendly_fire_multiplier: f32,
    ) -> DamageResult {
        let direction = knockback_direction(direction);
        if !self.world.is_alive(target) {
            return DamageResult::default();
        }

        self.events.push(CombatEvent::Voice {
            target,
            cue: VoiceCue::FriendlyFire,
        });

        let damage = amount * friendly_fire_multiplier.max(0.0);
        let killed = self.hurt(instigator, target, damage, false).unwrap_or(false);
        self.knock(target, direction, knockback_force);

        DamageResult {
            applied: true,
            damage,
            is_kill: killed,
            direction,
        }
    }

    /// Grenade blast on one pawn. Dead enemies are skipped entirely; dead
    /// allies are still pushed around.
    pub fn apply_blast(
        &mut self,
        instigator: Option<TargetId>,
        target: TargetId,
        blast_center: Vec3,
        amount: f32,
        knockback_force: f32,
    ) -> DamageResult {
        let Some(body) = self.world.get(target) else {
            return DamageResult::default();
        };
        let alive = body.is_alive();
        let is_enemy = body.kind == crate::targets::TargetKind::Enemy;
        let direction = knockback_direction(body.position - blast_center);

        if is_enemy && !alive {
            return DamageResult::default();
        }

        let killed = if alive {
            self.hurt(instigator, target, amount, false).unwrap_or(false)
        } else {
            false
        };
        self.knock(target, direction, knockback_force);

        DamageResult {
            applied: alive,
            damage: if alive { amount } else { 0.0 },
            is_kill: killed,
            direction,
        }
    }

    /// One attributed melee hit from `attacker` on a live pawn.
    pub fn apply_melee_hit(&mut self, attacker: TargetId, victim: TargetId, knockback_force: f32) -> DamageResult {
        let (Some(from), Some(to)) = (self.world.get(attacker), self.world.get(victim)) else {
            return DamageResult::default();
        };
        if !to.is_alive() || !to.is_pawn() {
            return DamageResult::default();
        }
        let amount = from.melee_damage;
        let direction = knockback_direction(to.position - from.position);

        self.events.push(CombatEvent::MeleeHit { attacker, victim });
        let killed = self.hurt(Some(attacker), victim, amount, false).unwrap_or(false);
        self.knock(victim, direction, knockback_force);

        DamageResult {
            applied: true,
            damage: amount,
            is_kill: killed,
            direction,
        }
    }
}
