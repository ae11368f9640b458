//! Grenade projectiles: flight, contact and explosion.

use bevy::prelude::*;

use super::ballistics::step_projectile_physics;
use super::damage::DamageContext;
use super::hits::HitContext;
use super::WeaponId;
use crate::arena::Handle;
use crate::events::{CombatEvent, ImpactCue};
use crate::spatial::SpatialQuery;
use crate::stats::Stat;
use crate::targets::{TargetId, TargetKind};

pub type GrenadeId = Handle<Grenade>;

/// A grenade explodes on its own after this many seconds.
pub const GRENADE_LIFESPAN: f32 = 5.0;

#[derive(Clone, Debug, PartialEq)]
pub struct Grenade {
    pub weapon: WeaponId,
    pub instigator: TargetId,
    pub position: Vec3,
    pub velocity: Vec3,
    pub age: f32,
    pub damage: f32,
    pub knockback: f32,
    pub explosion_radius: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GrenadeFlight {
    InFlight,
    /// Touched something (`None` is bare ground).
    Contact { target: Option<TargetId> },
    Expired,
}

impl Grenade {
    /// Integrate one tick and sweep the travelled segment for contacts,
    /// ignoring the thrower.
    pub fn step<Q: SpatialQuery + ?Sized>(&mut self, query: &Q, dt: f32) -> GrenadeFlight {
        self.age += dt;
        let (next_position, next_velocity) = step_projectile_physics(self.position, self.velocity, dt);

        if let Some(hit) = query.line_trace(self.position, next_position, &[self.instigator]) {
            self.position = hit.location;
            self.velocity = Vec3::ZERO;
            return GrenadeFlight::Contact { target: hit.target };
        }

        self.position = next_position;
        self.velocity = next_velocity;

        if self.age >= GRENADE_LIFESPAN {
            return GrenadeFlight::Expired;
        }
        GrenadeFlight::InFlight
    }
}

/// Direct-hit bookkeeping before the blast.
pub fn register_contact(ctx: &mut HitContext, target: Option<TargetId>) {
    let Some(kind) = target.and_then(|id| ctx.world.kind_of(id)) else {
        return;
    };
    match kind {
        TargetKind::Enemy => {
            ctx.ledger.increment(Stat::BotHits);
            ctx.ledger.update_accuracy();
        }
        TargetKind::Ally => {
            ctx.ledger.increment(Stat::FriendHits);
        }
        TargetKind::Neutral | TargetKind::SpecialStructure => {}
    }
}

/// Damage and knock back every pawn in the blast radius. Returns the
/// pawns that were affected.
pub fn explode(ctx: &mut HitContext, grenade: &Grenade) -> Vec<TargetId> {
    ctx.events.push(CombatEvent::Impact {
        cue: ImpactCue::Grenade,
        target: None,
        location: grenade.position,
    });
    ctx.events.push(CombatEvent::Explosion {
        location: grenade.position,
        radius: grenade.explosion_radius,
    });

    let mut victims: Vec<TargetId> = Vec::new();
    for overlap in ctx.world.sphere_overlap(grenade.position, grenade.explosion_radius, &[]) {
        if !victims.contains(&overlap.target) {
            victims.push(overlap.target);
        }
    }
    victims.retain(|id| ctx.world.get(*id).is_some_and(|t| t.is_pawn()));

    let mut affected = Vec::new();
    for victim in victims {
        let is_enemy = ctx.world.kind_of(victim) == Some(TargetKind::Enemy);
        let mut damage = DamageContext {
            world: &mut *ctx.world,
            events: &mut *ctx.events,
            hazards: ctx.hazards,
        };
        let result = damage.apply_blast(
            Some(grenade.instigator),
            victim,
            grenade.position,
            grenade.damage,
            grenade.knockback,
        );
        if is_enemy && result.is_kill {
            ctx.ledger.increment(Stat::BotKills);
        }
        if result.applied || !is_enemy {
            affected.push(victim);
        }
    }
    affected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::Arena;
    use crate::config::CombatTuning;
    use crate::events::{EventOutbox, Hazards};
    use crate::stats::StatLedger;
    use crate::targets::Target;
    use crate::weapons::{AmmoType, GunType, Weapon, WeaponProfile};
    use crate::world::TargetWorld;

    fn grenade(world: &mut TargetWorld, position: Vec3, velocity: Vec3) -> Grenade {
        let instigator = world.spawn(Target::player("thrower", Vec3::new(0.0, 0.0, 30.0)));
        let tuning = CombatTuning::default();
        let profile = WeaponProfile::compose(
            GunType::Pistol,
            AmmoType::Grenade,
            &GunType::Pistol.base_stats(),
            &AmmoType::Grenade.modifier(),
            &[],
            &tuning,
        );
        let mut weapons: Arena<Weapon> = Arena::new();
        let weapon = weapons.insert(Weapon::new(instigator, profile, &tuning));
        Grenade {
            weapon,
            instigator,
            position,
            velocity,
            age: 0.0,
            damage: 40.0,
            knockback: 10.0,
            explosion_radius: 5.0,
        }
    }

    #[test]
    fn test_grenade_lands_on_ground() {
        let mut world = TargetWorld::with_ground(0.0);
        let mut g = grenade(&mut world, Vec3::new(0.0, 2.0, 0.0), Vec3::new(0.0, 0.0, -8.0));
        let mut outcome = GrenadeFlight::InFlight;
        for _ in 0..300 {
            outcome = g.step(&world, 1.0 / 60.0);
            if outcome != GrenadeFlight::InFlight {
                break;
            }
        }
        assert_eq!(outcome, GrenadeFlight::Contact { target: None });
        assert!(g.position.y.abs() < 1e-3);
    }

    #[test]
    fn test_grenade_expires_after_lifespan() {
        let world = TargetWorld::new();
        let mut scratch = TargetWorld::new();
        let mut g = grenade(&mut scratch, Vec3::new(0.0, 1000.0, 0.0), Vec3::ZERO);
        let mut steps = 0;
        while g.step(&world, 0.1) == GrenadeFlight::InFlight {
            steps += 1;
            assert!(steps < 100);
        }
        assert!(g.age >= GRENADE_LIFESPAN);
    }

    #[test]
    fn test_explosion_damages_pawns_and_attenuates_airborne() {
        let mut world = TargetWorld::with_ground(0.0);
        let g = grenade(&mut world, Vec3::ZERO, Vec3::ZERO);
        let grounded = world.spawn(Target::enemy("a", Vec3::new(2.0, 0.0, 0.0)));
        let mut flying = Target::enemy("b", Vec3::new(-2.0, 1.0, 0.0));
        flying.grounded = false;
        let flying = world.spawn(flying);
        let ally = world.spawn(Target::player("ally", Vec3::new(0.0, 0.0, 2.0)));
        let wall = world.spawn(Target::wall("wall", Vec3::new(0.0, 1.0, -2.0), Vec3::ONE));
        let _far = world.spawn(Target::enemy("far", Vec3::new(30.0, 0.0, 0.0)));

        let mut ledger = StatLedger::new();
        let mut events = EventOutbox::default();
        let mut ctx = HitContext {
            world: &mut world,
            ledger: &mut ledger,
            events: &mut events,
            hazards: Hazards::default(),
            friendly_fire_multiplier: 1.0,
        };
        let affected = explode(&mut ctx, &g);

        assert_eq!(affected.len(), 3);
        assert!(!affected.contains(&wall));
        assert_eq!(world.get(grounded).unwrap().velocity.x, 10.0);
        assert!((world.get(flying).unwrap().velocity.x + 0.01).abs() < 1e-6);
        assert_eq!(world.get(ally).unwrap().health.as_ref().unwrap().current, 60.0);
    }

    #[test]
    fn test_contact_stats() {
        let mut world = TargetWorld::new();
        let enemy = world.spawn(Target::enemy("e", Vec3::ZERO));
        let ally = world.spawn(Target::player("p", Vec3::X));
        let mut ledger = StatLedger::new();
        ledger.set(Stat::ShotsFired, 2);
        let mut events = EventOutbox::default();
        let mut ctx = HitContext {
            world: &mut world,
            ledger: &mut ledger,
            events: &mut events,
            hazards: Hazards::default(),
            friendly_fire_multiplier: 1.0,
        };
        register_contact(&mut ctx, Some(enemy));
        register_contact(&mut ctx, Some(ally));
        register_contact(&mut ctx, None);

        assert_eq!(ledger.get(Stat::BotHits), 1);
        assert_eq!(ledger.get(Stat::FriendHits), 1);
        assert_eq!(ledger.accuracy(), 0.5);
    }
}
