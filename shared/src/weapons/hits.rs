//! Hit resolution for hitscan shots.
//!
//! `resolve_single` handles the one blocking hit of bullet and chain ammo;
//! `resolve_piercing` walks the ordered sweep of piercing ammo. Both classify
//! each hit, emit cues, apply damage and keep the shooter's stats.

use bevy::prelude::*;

use super::damage::{is_critical, DamageContext};
use super::{AmmoType, WeaponId, WeaponProfile};
use crate::events::{CombatEvent, EventOutbox, Hazards, ImpactCue};
use crate::spatial::TraceHit;
use crate::stats::{Stat, StatLedger};
use crate::targets::{TargetId, TargetKind};
use crate::world::TargetWorld;

/// Mutable state the hit pipeline works against.
pub struct HitContext<'a> {
    pub world: &'a mut TargetWorld,
    pub ledger: &'a mut StatLedger,
    pub events: &'a mut EventOutbox,
    pub hazards: Hazards,
    pub friendly_fire_multiplier: f32,
}

impl HitContext<'_> {
    fn damage(&mut self) -> DamageContext<'_> {
        DamageContext {
            world: &mut *self.world,
            events: &mut *self.events,
            hazards: self.hazards,
        }
    }
}

/// One trace worth of shot parameters.
#[derive(Clone, Copy, Debug)]
pub struct Shot<'p> {
    pub weapon: WeaponId,
    pub instigator: TargetId,
    pub profile: &'p WeaponProfile,
    pub muzzle: Vec3,
    /// Normalized muzzle-to-aim direction.
    pub direction: Vec3,
}

impl Shot<'_> {
    fn full_range_point(&self) -> Vec3 {
        self.muzzle + self.direction * self.profile.range
    }

    fn hit_cue(&self) -> ImpactCue {
        match self.profile.ammo_type {
            AmmoType::Piercing => ImpactCue::Laser,
            AmmoType::Chain => ImpactCue::Chain,
            AmmoType::Bullet | AmmoType::Grenade => ImpactCue::Bullet,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum HitOutcome {
    /// Actorless geometry such as the ground.
    Untargeted,
    /// Neutral prop: ends the shot.
    Neutral { target: TargetId },
    Enemy { target: TargetId, critical: bool, killed: bool },
    Ally { target: TargetId },
    SpecialStructure { target: TargetId },
    /// Dead pawn: ignored.
    Dead { target: TargetId },
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct HitReport {
    pub outcomes: Vec<HitOutcome>,
    /// Live pawns a chain session should start from.
    pub chain_sources: Vec<TargetId>,
    pub tracer_end: Vec3,
}

/// Classify and apply one hit. `count_hit` gates the coarse BotHits /
/// FriendHits stat so a piercing sweep counts at most one.
fn process_hit(ctx: &mut HitContext, shot: &Shot, hit: &TraceHit, count_hit: &mut bool, report: &mut HitReport) -> HitOutcome {
    let Some(target) = hit.target else {
        return HitOutcome::Untargeted;
    };
    let Some((kind, alive, critical_point, center)) = ctx
        .world
        .get(target)
        .map(|t| (t.kind, t.is_alive(), t.critical_point(), t.center()))
    else {
        return HitOutcome::Untargeted;
    };

    match kind {
        TargetKind::Neutral => {
            ctx.events.push(CombatEvent::Impact {
                cue: ImpactCue::Other,
                target: Some(target),
                location: hit.location,
            });
            HitOutcome::Neutral { target }
        }
        TargetKind::SpecialStructure => {
            ctx.events.push(CombatEvent::Impact {
                cue: ImpactCue::EnemySpawner,
                target: Some(target),
                location: hit.location,
            });
            HitOutcome::SpecialStructure { target }
        }
        TargetKind::Enemy | TargetKind::Ally if !alive => HitOutcome::Dead { target },
        TargetKind::Enemy => {
            ctx.events.push(CombatEvent::Impact {
                cue: shot.hit_cue(),
                target: Some(target),
                location: hit.location,
            });
            if shot.profile.ammo_type == AmmoType::Chain {
                report.chain_sources.push(target);
            }

            let mut damage = shot.profile.bullet_damage;
            let critical = is_critical(hit.location, critical_point, shot.profile.crit_distance);
            if critical {
                ctx.events.push(CombatEvent::Impact {
                    cue: ImpactCue::Crit,
                    target: Some(target),
                    location: hit.location,
                });
                damage *= shot.profile.crit_multiplier;
                ctx.ledger.increment(Stat::CriticalHits);
            }

            let result = ctx
                .damage()
                .apply_enemy_damage(Some(shot.instigator), target, damage, shot.direction, critical);
            if result.is_kill {
                ctx.ledger.increment(Stat::BotKills);
            }

            if *count_hit {
                ctx.ledger.increment(Stat::BotHits);
                ctx.ledger.update_accuracy();
                *count_hit = false;
            }
            HitOutcome::Enemy {
                target,
                critical,
                killed: result.is_kill,
            }
        }
        TargetKind::Ally => {
            ctx.events.push(CombatEvent::Impact {
                cue: shot.hit_cue(),
                target: Some(target),
                location: center,
            });
            if shot.profile.ammo_type == AmmoType::Chain {
                report.chain_sources.push(target);
            }

            let multiplier = ctx.friendly_fire_multiplier;
            ctx.damage().apply_ally_damage(
                Some(shot.instigator),
                target,
                shot.profile.bullet_damage,
                shot.direction,
                shot.profile.knockback_force,
                multiplier,
            );

            if *count_hit {
                ctx.ledger.increment(Stat::FriendHits);
                *count_hit = false;
            }
            HitOutcome::Ally { target }
        }
    }
}

fn emit_tracer(ctx: &mut HitContext, shot: &Shot, to: Vec3) {
    ctx.events.push(CombatEvent::Tracer {
        weapon: shot.weapon,
        ammo: shot.profile.ammo_type,
        from: shot.muzzle,
        to,
    });
}

/// Bullet and chain ammo: one blocking hit (or none).
pub fn resolve_single(ctx: &mut HitContext, shot: &Shot, hit: Option<&TraceHit>) -> HitReport {
    let mut report = HitReport {
        tracer_end: hit.map_or_else(|| shot.full_range_point(), |h| h.location),
        ..Default::default()
    };
    emit_tracer(ctx, shot, report.tracer_end);

    let Some(hit) = hit else {
        return report;
    };

    let mut count_hit = true;
    let outcome = process_hit(ctx, shot, hit, &mut count_hit, &mut report);
    report.outcomes.push(outcome);
    report
}

/// Piercing ammo: walk the sweep in distance order until a neutral prop ends
/// it or `num_pierces + 1` targets have been handled.
pub fn resolve_piercing(ctx: &mut HitContext, shot: &Shot, hits: &[TraceHit]) -> HitReport {
    let mut report = HitReport {
        tracer_end: hits
            .iter()
            .find(|h| h.blocking)
            .map_or_else(|| shot.full_range_point(), |h| h.location),
        ..Default::default()
    };
    emit_tracer(ctx, shot, report.tracer_end);

    let budget = shot.profile.num_pierces + 1;
    let mut processed = 0;
    let mut count_hit = true;

    for hit in hits {
        let outcome = process_hit(ctx, shot, hit, &mut count_hit, &mut report);
        match outcome {
            HitOutcome::Untargeted => continue,
            HitOutcome::Neutral { .. } => {
                report.outcomes.push(outcome);
                break;
            }
            _ => report.outcomes.push(outcome),
        }

        processed += 1;
        if processed >= budget {
            break;
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CombatTuning;
    use crate::targets::{Body, Target};
    use crate::weapons::GunType;

    struct Fixture {
        world: TargetWorld,
        ledger: StatLedger,
        events: EventOutbox,
        shooter: TargetId,
        weapon: WeaponId,
    }

    impl Fixture {
        fn new() -> Self {
            let mut world = TargetWorld::with_ground(0.0);
            let shooter = world.spawn(Target::player("shooter", Vec3::ZERO));
            let mut weapons: crate::arena::Arena<crate::weapons::Weapon> = crate::arena::Arena::new();
            let tuning = CombatTuning::default();
            let weapon = weapons.insert(crate::weapons::Weapon::new(shooter, profile(AmmoType::Bullet, 0), &tuning));
            Self {
                world,
                ledger: StatLedger::new(),
                events: EventOutbox::default(),
                shooter,
                weapon,
            }
        }

        fn ctx(&mut self) -> HitContext<'_> {
            HitContext {
                world: &mut self.world,
                ledger: &mut self.ledger,
                events: &mut self.events,
                hazards: Hazards::default(),
                friendly_fire_multiplier: 1.0,
            }
        }

        fn hit(&self, target: TargetId, location: Vec3, distance: f32) -> TraceHit {
            TraceHit {
                target: Some(target),
                body: Some(0),
                location,
                normal: Vec3::NEG_Z,
                distance,
                blocking: !self.world.get(target).unwrap().is_pawn(),
            }
        }
    }

    fn profile(ammo: AmmoType, pierces: u32) -> WeaponProfile {
        let tuning = CombatTuning::default();
        let mut p = WeaponProfile::compose(
            GunType::Pistol,
            ammo,
            &GunType::Pistol.base_stats(),
            &ammo.modifier(),
            &[],
            &tuning,
        );
        p.bullet_damage = 10.0;
        p.num_pierces = pierces;
        p.crit_distance = 0.2;
        p.crit_multiplier = 1.5;
        p
    }

    fn enemy_at(world: &mut TargetWorld, z: f32) -> TargetId {
        world.spawn(Target::enemy("e", Vec3::new(0.0, 0.0, z)).with_bodies(vec![Body::sphere("core", Vec3::Y, 0.5)]))
    }

    fn health(world: &TargetWorld, id: TargetId) -> f32 {
        world.get(id).unwrap().health.as_ref().unwrap().current
    }

    #[test]
    fn test_single_hit_on_enemy_counts_hit_and_crit() {
        let mut fx = Fixture::new();
        let enemy = enemy_at(&mut fx.world, -10.0);
        let crit_point = fx.world.get(enemy).unwrap().critical_point().unwrap();
        let hit = fx.hit(enemy, crit_point + Vec3::new(0.0, 0.0, 0.2), 10.0);

        let p = profile(AmmoType::Bullet, 0);
        let shot = Shot { weapon: fx.weapon, instigator: fx.shooter, profile: &p, muzzle: Vec3::Y, direction: Vec3::NEG_Z };
        fx.ledger.set(Stat::ShotsFired, 1);
        let report = resolve_single(&mut fx.ctx(), &shot, Some(&hit));

        assert_eq!(report.outcomes, vec![HitOutcome::Enemy { target: enemy, critical: true, killed: false }]);
        assert_eq!(health(&fx.world, enemy), 85.0);
        assert_eq!(fx.ledger.get(Stat::BotHits), 1);
        assert_eq!(fx.ledger.get(Stat::CriticalHits), 1);
        assert_eq!(fx.ledger.accuracy(), 1.0);
    }

    #[test]
    fn test_single_miss_emits_full_range_tracer_only() {
        let mut fx = Fixture::new();
        let p = profile(AmmoType::Bullet, 0);
        let shot = Shot { weapon: fx.weapon, instigator: fx.shooter, profile: &p, muzzle: Vec3::Y, direction: Vec3::NEG_Z };
        let report = resolve_single(&mut fx.ctx(), &shot, None);

        assert!(report.outcomes.is_empty());
        assert_eq!(report.tracer_end, Vec3::Y + Vec3::NEG_Z * p.range);
        assert_eq!(fx.events.len(), 1);
    }

    #[test]
    fn test_ally_hit_never_crits_and_counts_friend_hit() {
        let mut fx = Fixture::new();
        let ally = fx.world.spawn(Target::player("ally", Vec3::new(0.0, 0.0, -5.0)));
        let crit_point = fx.world.get(ally).unwrap().critical_point().unwrap();
        let hit = fx.hit(ally, crit_point, 5.0);

        let p = profile(AmmoType::Chain, 0);
        let shot = Shot { weapon: fx.weapon, instigator: fx.shooter, profile: &p, muzzle: Vec3::Y, direction: Vec3::NEG_Z };
        let report = resolve_single(&mut fx.ctx(), &shot, Some(&hit));

        assert_eq!(report.outcomes, vec![HitOutcome::Ally { target: ally }]);
        assert_eq!(report.chain_sources, vec![ally]);
        assert_eq!(health(&fx.world, ally), 90.0);
        assert_eq!(fx.ledger.get(Stat::FriendHits), 1);
        assert_eq!(fx.ledger.get(Stat::CriticalHits), 0);
        assert_eq!(fx.ledger.get(Stat::BotHits), 0);
    }

    #[test]
    fn test_piercing_counts_first_hit_only_and_respects_budget() {
        let mut fx = Fixture::new();
        let a = enemy_at(&mut fx.world, -5.0);
        let b = enemy_at(&mut fx.world, -10.0);
        let c = enemy_at(&mut fx.world, -15.0);
        let hits = vec![
            fx.hit(a, Vec3::new(0.0, 1.0, -4.5), 4.5),
            fx.hit(b, Vec3::new(0.0, 1.0, -9.5), 9.5),
            fx.hit(c, Vec3::new(0.0, 1.0, -14.5), 14.5),
        ];

        let p = profile(AmmoType::Piercing, 1);
        let shot = Shot { weapon: fx.weapon, instigator: fx.shooter, profile: &p, muzzle: Vec3::Y, direction: Vec3::NEG_Z };
        let report = resolve_piercing(&mut fx.ctx(), &shot, &hits);

        assert_eq!(report.outcomes.len(), 2);
        assert_eq!(health(&fx.world, a), 90.0);
        assert_eq!(health(&fx.world, b), 90.0);
        assert_eq!(health(&fx.world, c), 100.0);
        assert_eq!(fx.ledger.get(Stat::BotHits), 1);
    }

    #[test]
    fn test_piercing_budget_reached_before_neutral() {
        let mut fx = Fixture::new();
        let a = enemy_at(&mut fx.world, -5.0);
        let wall = fx.world.spawn(Target::wall("wall", Vec3::new(0.0, 1.0, -8.0), Vec3::splat(1.0)));
        let hits = vec![fx.hit(a, Vec3::new(0.0, 1.0, -4.5), 4.5), fx.hit(wall, Vec3::new(0.0, 1.0, -7.0), 7.0)];

        let p = profile(AmmoType::Piercing, 0);
        let shot = Shot { weapon: fx.weapon, instigator: fx.shooter, profile: &p, muzzle: Vec3::Y, direction: Vec3::NEG_Z };
        let report = resolve_piercing(&mut fx.ctx(), &shot, &hits);

        assert_eq!(report.outcomes.len(), 1);
        assert!(!fx
            .events
            .as_slice()
            .iter()
            .any(|e| matches!(e, CombatEvent::Impact { cue: ImpactCue::Other, .. })));
        // Tracer still ends at the blocker.
        assert_eq!(report.tracer_end, Vec3::new(0.0, 1.0, -7.0));
    }

    /// enemy@5, ally@10, neutral@15, enemy@20
    fn mixed_line(fx: &mut Fixture) -> (Vec<TraceHit>, [TargetId; 4]) {
        let first = enemy_at(&mut fx.world, -5.0);
        let ally = fx.world.spawn(Target::player("ally", Vec3::new(0.0, 0.0, -10.0)));
        let crate_prop = fx.world.spawn(Target::wall("crate", Vec3::new(0.0, 1.0, -15.5), Vec3::splat(0.5)));
        let last = enemy_at(&mut fx.world, -20.0);
        let hits = vec![
            fx.hit(first, Vec3::new(0.0, 1.0, -4.5), 5.0),
            fx.hit(ally, Vec3::new(0.0, 1.0, -9.6), 10.0),
            fx.hit(crate_prop, Vec3::new(0.0, 1.0, -15.0), 15.0),
            fx.hit(last, Vec3::new(0.0, 1.0, -19.5), 20.0),
        ];
        (hits, [first, ally, crate_prop, last])
    }

    #[test]
    fn test_piercing_mixed_line_stops_when_budget_runs_out() {
        let mut fx = Fixture::new();
        let (hits, [first, ally, _, last]) = mixed_line(&mut fx);

        let p = profile(AmmoType::Piercing, 1);
        let shot = Shot { weapon: fx.weapon, instigator: fx.shooter, profile: &p, muzzle: Vec3::Y, direction: Vec3::NEG_Z };
        let report = resolve_piercing(&mut fx.ctx(), &shot, &hits);

        assert_eq!(
            report.outcomes,
            vec![
                HitOutcome::Enemy { target: first, critical: false, killed: false },
                HitOutcome::Ally { target: ally },
            ]
        );
        assert_eq!(health(&fx.world, first), 90.0);
        assert_eq!(health(&fx.world, ally), 90.0);
        assert_eq!(health(&fx.world, last), 100.0);
        // Only the first pawn on the line is counted.
        assert_eq!(fx.ledger.get(Stat::BotHits), 1);
        assert_eq!(fx.ledger.get(Stat::FriendHits), 0);
        // The neutral prop was never reached.
        assert!(!fx
            .events
            .as_slice()
            .iter()
            .any(|e| matches!(e, CombatEvent::Impact { cue: ImpactCue::Other, .. })));
    }

    #[test]
    fn test_piercing_mixed_line_neutral_ends_sweep_within_budget() {
        let mut fx = Fixture::new();
        let (hits, [first, ally, crate_prop, last]) = mixed_line(&mut fx);

        let p = profile(AmmoType::Piercing, 2);
        let shot = Shot { weapon: fx.weapon, instigator: fx.shooter, profile: &p, muzzle: Vec3::Y, direction: Vec3::NEG_Z };
        let report = resolve_piercing(&mut fx.ctx(), &shot, &hits);

        assert_eq!(report.outcomes.len(), 3);
        assert_eq!(report.outcomes[2], HitOutcome::Neutral { target: crate_prop });
        assert_eq!(health(&fx.world, first), 90.0);
        assert_eq!(health(&fx.world, ally), 90.0);
        // Budget had a slot left, the prop ended the sweep anyway.
        assert_eq!(health(&fx.world, last), 100.0);
        assert_eq!(fx.ledger.get(Stat::BotHits), 1);
        assert_eq!(fx.ledger.get(Stat::FriendHits), 0);
    }

    #[test]
    fn test_piercing_untargeted_hit_does_not_take_a_slot() {
        let mut fx = Fixture::new();
        let enemy = enemy_at(&mut fx.world, -5.0);
        let ground = TraceHit {
            target: None,
            body: None,
            location: Vec3::new(0.0, 0.0, -2.0),
            normal: Vec3::Y,
            distance: 2.0,
            blocking: false,
        };
        let hits = vec![ground, fx.hit(enemy, Vec3::new(0.0, 1.0, -4.5), 4.5)];

        let p = profile(AmmoType::Piercing, 0);
        let shot = Shot { weapon: fx.weapon, instigator: fx.shooter, profile: &p, muzzle: Vec3::Y, direction: Vec3::NEG_Z };
        let report = resolve_piercing(&mut fx.ctx(), &shot, &hits);

        assert_eq!(report.outcomes, vec![HitOutcome::Enemy { target: enemy, critical: false, killed: false }]);
        assert_eq!(health(&fx.world, enemy), 90.0);
        assert_eq!(fx.ledger.get(Stat::BotHits), 1);
    }

    #[test]
    fn test_piercing_neutral_terminates_sweep() {
        let mut fx = Fixture::new();
        let wall = fx.world.spawn(Target::wall("wall", Vec3::new(0.0, 1.0, -4.0), Vec3::splat(0.5)));
        let behind = enemy_at(&mut fx.world, -10.0);
        let hits = vec![
            fx.hit(wall, Vec3::new(0.0, 1.0, -3.5), 3.5),
            fx.hit(behind, Vec3::new(0.0, 1.0, -9.5), 9.5),
        ];

        let p = profile(AmmoType::Piercing, 5);
        let shot = Shot { weapon: fx.weapon, instigator: fx.shooter, profile: &p, muzzle: Vec3::Y, direction: Vec3::NEG_Z };
        let report = resolve_piercing(&mut fx.ctx(), &shot, &hits);

        assert_eq!(report.outcomes, vec![HitOutcome::Neutral { target: wall }]);
        assert_eq!(health(&fx.world, behind), 100.0);
    }

    #[test]
    fn test_piercing_structure_and_dead_consume_slots() {
        let mut fx = Fixture::new();
        let spawner = fx.world.spawn(Target::spawner("ship", Vec3::new(0.0, 1.0, -3.0), Vec3::splat(0.5)));
        let corpse = enemy_at(&mut fx.world, -6.0);
        fx.world.get_mut(corpse).unwrap().health.as_mut().unwrap().take_damage(1000.0);
        let live = enemy_at(&mut fx.world, -9.0);
        let untargeted = TraceHit {
            target: None,
            body: None,
            location: Vec3::new(0.0, 0.0, -1.0),
            normal: Vec3::Y,
            distance: 1.0,
            blocking: false,
        };
        let hits = vec![
            untargeted,
            fx.hit(spawner, Vec3::new(0.0, 1.0, -2.5), 2.5),
            fx.hit(corpse, Vec3::new(0.0, 1.0, -5.5), 5.5),
            fx.hit(live, Vec3::new(0.0, 1.0, -8.5), 8.5),
        ];

        let p = profile(AmmoType::Piercing, 1);
        let shot = Shot { weapon: fx.weapon, instigator: fx.shooter, profile: &p, muzzle: Vec3::Y, direction: Vec3::NEG_Z };
        let report = resolve_piercing(&mut fx.ctx(), &shot, &hits);

        assert_eq!(
            report.outcomes,
            vec![HitOutcome::SpecialStructure { target: spawner }, HitOutcome::Dead { target: corpse }]
        );
        assert_eq!(health(&fx.world, live), 100.0);
        assert_eq!(fx.ledger.get(Stat::BotHits), 0);
    }

    #[test]
    fn test_kill_counts_bot_kill() {
        let mut fx = Fixture::new();
        let enemy = enemy_at(&mut fx.world, -5.0);
        fx.world.get_mut(enemy).unwrap().health = Some(crate::targets::Health::new(5.0));
        let hit = fx.hit(enemy, Vec3::new(0.0, 1.0, -4.5), 4.5);

        let p = profile(AmmoType::Bullet, 0);
        let shot = Shot { weapon: fx.weapon, instigator: fx.shooter, profile: &p, muzzle: Vec3::Y, direction: Vec3::NEG_Z };
        let report = resolve_single(&mut fx.ctx(), &shot, Some(&hit));

        assert!(matches!(report.outcomes[0], HitOutcome::Enemy { killed: true, .. }));
        assert_eq!(fx.ledger.get(Stat::BotKills), 1);
    }
}
