//! Weapon system - gun/ammo types, stat tables and the composed weapon profile.
//!
//! A weapon is flat data (profile + ammo + fire gate + recoil) with behavior
//! exposed through the `Fireable` / `Reloadable` capability traits.

pub mod aim;
pub mod ammo;
pub mod ballistics;
pub mod chain;
pub mod damage;
pub mod fire_gate;
pub mod grenade;
pub mod hits;
pub mod recoil;

use serde::{Deserialize, Serialize};

use crate::arena::Handle;
use crate::config::CombatTuning;
use crate::targets::TargetId;
use ammo::AmmoState;
use fire_gate::{DisableConditions, FireGate, FireOutcome};
use recoil::RecoilModel;

pub type WeaponId = Handle<Weapon>;

/// Most mods a single weapon can carry.
pub const MAX_MODS: usize = 4;

/// Available gun types
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
pub enum GunType {
    #[default]
    Pistol,
    Gatling,
    Shotgun,
    SniperRifle,
}

/// Available ammo types
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
pub enum AmmoType {
    #[default]
    Bullet,
    /// Passes through pawns.
    Piercing,
    /// Lobbed explosive projectile.
    Grenade,
    /// Bounces to nearby enemies after the first hit.
    Chain,
}

impl GunType {
    pub const ALL: [GunType; 4] = [GunType::Pistol, GunType::Gatling, GunType::Shotgun, GunType::SniperRifle];
}

impl AmmoType {
    pub const ALL: [AmmoType; 4] = [AmmoType::Bullet, AmmoType::Piercing, AmmoType::Grenade, AmmoType::Chain];

    /// Hitscan ammo resolves with line traces; grenades spawn a projectile.
    pub fn is_hitscan(&self) -> bool {
        !matches!(self, AmmoType::Grenade)
    }
}

/// Base stats of a gun type
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GunStats {
    /// Max trace distance in meters
    pub range: f32,
    /// Spread cone half-angle in degrees
    pub spread_angle: f32,
    /// Traces (or grenades) per trigger pull
    pub bullets_per_shot: u32,
    /// Seconds between shots
    pub fire_delay: f32,
    pub bullet_damage: f32,
    /// Projectile launch speed in m/s (grenades)
    pub bullet_speed: f32,
    /// Knockback launch speed in m/s
    pub knockback_force: f32,
    pub mag_size: u32,
    pub reserves_size: f32,
    pub reload_time: f32,
}

impl GunType {
    /// Get the base stats for this gun type
    pub fn base_stats(&self) -> GunStats {
        match self {
            GunType::Pistol => GunStats {
                range: 100.0,
                spread_angle: 1.0,
                bullets_per_shot: 1,
                fire_delay: 0.25,
                bullet_damage: 20.0,
                bullet_speed: 25.0,
                knockback_force: 5.0,
                mag_size: 10,
                reserves_size: 50.0,
                reload_time: 1.2,
            },
            GunType::Gatling => GunStats {
                range: 80.0,
                spread_angle: 3.5,
                bullets_per_shot: 1,
                fire_delay: 0.08,
                bullet_damage: 8.0,
                bullet_speed: 25.0,
                knockback_force: 2.0,
                mag_size: 60,
                reserves_size: 240.0,
                reload_time: 2.5,
            },
            GunType::Shotgun => GunStats {
                range: 30.0,
                spread_angle: 8.0,
                bullets_per_shot: 8,
                fire_delay: 0.9,
                bullet_damage: 9.0, // Per pellet
                bullet_speed: 20.0,
                knockback_force: 12.0,
                mag_size: 6,
                reserves_size: 36.0,
                reload_time: 2.0,
            },
            GunType::SniperRifle => GunStats {
                range: 250.0,
                spread_angle: 0.1,
                bullets_per_shot: 1,
                fire_delay: 1.3,
                bullet_damage: 75.0,
                bullet_speed: 35.0,
                knockback_force: 15.0,
                mag_size: 5,
                reserves_size: 25.0,
                reload_time: 3.0,
            },
        }
    }
}

/// How an ammo type modifies the gun's base stats
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AmmoModifier {
    pub damage_scale: f32,
    pub num_bounces: u32,
    pub num_pierces: u32,
    /// Grenade blast radius in meters (0 for hitscan ammo)
    pub explosion_radius: f32,
    pub knockback_scale: f32,
    pub mag_scale: f32,
}

impl AmmoType {
    pub fn modifier(&self) -> AmmoModifier {
        match self {
            AmmoType::Bullet => AmmoModifier {
                damage_scale: 1.0,
                num_bounces: 0,
                num_pierces: 0,
                explosion_radius: 0.0,
                knockback_scale: 1.0,
                mag_scale: 1.0,
            },
            AmmoType::Piercing => AmmoModifier {
                damage_scale: 0.85,
                num_bounces: 0,
                num_pierces: 2,
                explosion_radius: 0.0,
                knockback_scale: 0.5,
                mag_scale: 1.0,
            },
            AmmoType::Grenade => AmmoModifier {
                damage_scale: 2.0,
                num_bounces: 0,
                num_pierces: 0,
                explosion_radius: 5.0,
                knockback_scale: 2.0,
                mag_scale: 0.5,
            },
            AmmoType::Chain => AmmoModifier {
                damage_scale: 0.9,
                num_bounces: 3,
                num_pierces: 0,
                explosion_radius: 0.0,
                knockback_scale: 1.0,
                mag_scale: 1.0,
            },
        }
    }
}

/// Profile stat a mod can adjust.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum ProfileStat {
    Range,
    SpreadAngle,
    BulletsPerShot,
    FireDelay,
    NumBounces,
    NumPierces,
    CritMultiplier,
    CritDistance,
    KnockbackForce,
    BulletDamage,
    BulletSpeed,
    MagSize,
    ReservesSize,
    ReloadTime,
    ChainBounceRange,
}

/// Additive delta on one profile stat.
#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
pub struct WeaponMod {
    pub stat: ProfileStat,
    pub delta: f32,
}

/// Fully composed weapon stats: gun base + ammo modifier + mods.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeaponProfile {
    pub gun_type: GunType,
    pub ammo_type: AmmoType,
    pub range: f32,
    pub spread_angle: f32,
    pub bullets_per_shot: u32,
    pub fire_delay: f32,
    pub num_bounces: u32,
    pub num_pierces: u32,
    pub crit_multiplier: f32,
    pub crit_distance: f32,
    pub knockback_force: f32,
    pub bullet_damage: f32,
    pub bullet_speed: f32,
    pub mag_size: u32,
    pub reserves_size: f32,
    pub reload_time: f32,
    pub chain_bounce_range: f32,
    pub explosion_radius: f32,
}

fn offset_count(value: u32, delta: f32) -> u32 {
    (value as f32 + delta).round().max(0.0) as u32
}

impl WeaponProfile {
    pub fn compose(
        gun_type: GunType,
        ammo_type: AmmoType,
        gun: &GunStats,
        ammo: &AmmoModifier,
        mods: &[WeaponMod],
        tuning: &CombatTuning,
    ) -> Self {
        let mut profile = Self {
            gun_type,
            ammo_type,
            range: gun.range,
            spread_angle: gun.spread_angle,
            bullets_per_shot: gun.bullets_per_shot,
            fire_delay: gun.fire_delay,
            num_bounces: ammo.num_bounces,
            num_pierces: ammo.num_pierces,
            crit_multiplier: tuning.crit_multiplier,
            crit_distance: tuning.crit_distance,
            knockback_force: gun.knockback_force * ammo.knockback_scale,
            bullet_damage: gun.bullet_damage * ammo.damage_scale,
            bullet_speed: gun.bullet_speed,
            mag_size: ((gun.mag_size as f32) * ammo.mag_scale).round().max(1.0) as u32,
            reserves_size: gun.reserves_size * ammo.mag_scale,
            reload_time: gun.reload_time,
            chain_bounce_range: tuning.chain_bounce_range,
            explosion_radius: ammo.explosion_radius,
        };

        for m in mods {
            profile.apply_mod(m);
        }
        profile
    }

    fn apply_mod(&mut self, m: &WeaponMod) {
        let d = m.delta;
        match m.stat {
            ProfileStat::Range => self.range = (self.range + d).max(0.0),
            ProfileStat::SpreadAngle => self.spread_angle = (self.spread_angle + d).clamp(0.0, 180.0),
            ProfileStat::BulletsPerShot => self.bullets_per_shot = offset_count(self.bullets_per_shot, d).max(1),
            ProfileStat::FireDelay => self.fire_delay = (self.fire_delay + d).max(0.0),
            ProfileStat::NumBounces => self.num_bounces = offset_count(self.num_bounces, d),
            ProfileStat::NumPierces => self.num_pierces = offset_count(self.num_pierces, d),
            ProfileStat::CritMultiplier => self.crit_multiplier = (self.crit_multiplier + d).max(0.0),
            ProfileStat::CritDistance => self.crit_distance = (self.crit_distance + d).max(0.0),
            ProfileStat::KnockbackForce => self.knockback_force = (self.knockback_force + d).max(0.0),
            ProfileStat::BulletDamage => self.bullet_damage = (self.bullet_damage + d).max(0.0),
            ProfileStat::BulletSpeed => self.bullet_speed = (self.bullet_speed + d).max(0.0),
            ProfileStat::MagSize => self.mag_size = offset_count(self.mag_size, d).max(1),
            ProfileStat::ReservesSize => self.reserves_size = (self.reserves_size + d).max(0.0),
            ProfileStat::ReloadTime => self.reload_time = (self.reload_time + d).max(0.0),
            ProfileStat::ChainBounceRange => self.chain_bounce_range = (self.chain_bounce_range + d).max(0.0),
        }
    }

    pub fn spread_radians(&self) -> f32 {
        self.spread_angle.to_radians()
    }
}

/// What a weapon can do with its current profile.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Capabilities {
    pub fireable: bool,
    pub reloadable: bool,
    pub chainable: bool,
}

pub trait Fireable {
    /// Attempt one trigger pull against the gate and magazine.
    fn try_fire(&mut self) -> FireOutcome;
    /// Cooldown before the next shot may start.
    fn fire_delay(&self) -> f32;
}

pub trait Reloadable {
    fn can_reload(&self) -> bool;
    /// Enter the reloading state. Returns false when the reload is not allowed.
    fn begin_reload(&mut self) -> bool;
    /// Transfer rounds from reserve; returns how many were grabbed.
    fn finish_reload(&mut self, conditions: DisableConditions) -> u32;
}

/// A gun held by a pawn.
pub struct Weapon {
    pub owner: TargetId,
    pub profile: WeaponProfile,
    pub ammo: AmmoState,
    pub gate: FireGate,
    pub recoil: RecoilModel,
    pub mods: Vec<WeaponMod>,
    /// Set when the magazine runs low; cleared by the next reload.
    pub prompt_reload: bool,
}

impl Weapon {
    pub fn new(owner: TargetId, profile: WeaponProfile, tuning: &CombatTuning) -> Self {
        let ammo = AmmoState::new(profile.mag_size, profile.reserves_size);
        Self {
            owner,
            profile,
            ammo,
            gate: FireGate::default(),
            recoil: RecoilModel::new(tuning.recoil.clone()),
            mods: Vec::new(),
            prompt_reload: false,
        }
    }

    pub fn capabilities(&self) -> Capabilities {
        Capabilities {
            fireable: self.profile.bullets_per_shot > 0,
            reloadable: self.ammo.clip_size() > 0,
            chainable: self.profile.ammo_type == AmmoType::Chain,
        }
    }

    /// Swap in a freshly composed profile and refill the magazine to its sizes.
    pub fn apply_profile(&mut self, profile: WeaponProfile) {
        self.ammo.refill(profile.mag_size, profile.reserves_size);
        self.profile = profile;
        self.prompt_reload = false;
    }
}

impl Fireable for Weapon {
    fn try_fire(&mut self) -> FireOutcome {
        self.gate.try_fire(&mut self.ammo)
    }

    fn fire_delay(&self) -> f32 {
        self.profile.fire_delay
    }
}

impl Reloadable for Weapon {
    fn can_reload(&self) -> bool {
        self.gate.can_begin_reload() && self.ammo.can_reload()
    }

    fn begin_reload(&mut self) -> bool {
        if !self.ammo.can_reload() {
            return false;
        }
        self.gate.begin_reload()
    }

    fn finish_reload(&mut self, conditions: DisableConditions) -> u32 {
        let grabbed = self.ammo.reload();
        self.gate.finish_reload(conditions);
        self.prompt_reload = false;
        grabbed
    }
}
