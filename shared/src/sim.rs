//! Combat simulation - owns every weapon, target, projectile and timer.
//!
//! `CombatSim` is a Bevy resource. Hosts call the action methods (`fire`,
//! `reload`, ...) from their systems, advance it with `tick` once per fixed
//! step, then drain the `CombatEvent`s it produced.

use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashMap;

use crate::arena::Arena;
use crate::config::WeaponCatalog;
use crate::events::{CombatEvent, EventOutbox, Hazards, Notice, VoiceCue};
use crate::launchers::{Launcher, LauncherId, LauncherKind, TriggerVolume, GLIDE_CHECK_INTERVAL};
use crate::melee::MeleeWindow;
use crate::physics::{launch, launch_force, step_target};
use crate::scheduler::{DueTask, Scheduler};
use crate::spatial::SpatialQuery;
use crate::stats::{Stat, StatLedger};
use crate::targets::{Target, TargetId};
use crate::weapons::aim::resolve_aim_point;
use crate::weapons::ballistics::launch_velocity;
use crate::weapons::chain::{self, ChainBounceSession, CHAIN_STEP_DELAY};
use crate::weapons::damage::DamageContext;
use crate::weapons::fire_gate::{DisableConditions, FireGateState, FireOutcome};
use crate::weapons::grenade::{self, Grenade, GrenadeFlight, GrenadeId};
use crate::weapons::hits::{self, HitContext, Shot};
use crate::weapons::{AmmoType, Fireable, GunType, Reloadable, Weapon, WeaponId, WeaponMod, WeaponProfile, MAX_MODS};
use crate::world::TargetWorld;

/// Who a scheduled continuation belongs to. Removing the owner cancels it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TaskOwner {
    Weapon(WeaponId),
    Launcher(LauncherId),
    Target(TargetId),
}

#[derive(Clone, Debug, PartialEq)]
pub enum Continuation {
    FireDelay,
    ReloadComplete,
    ChainBounce(ChainBounceSession),
    PadReset { target: TargetId },
    CannonFire,
    CannonReset,
    GlideCheck,
}

fn disable_conditions(world: &TargetWorld, owner: TargetId) -> DisableConditions {
    match world.get(owner) {
        Some(target) => DisableConditions {
            dead: !target.is_alive(),
            gliding: target.gliding,
            launched: target.launched,
        },
        None => DisableConditions {
            dead: true,
            ..Default::default()
        },
    }
}

#[derive(Resource)]
pub struct CombatSim {
    world: TargetWorld,
    weapons: Arena<Weapon>,
    grenades: Arena<Grenade>,
    launchers: Arena<Launcher>,
    melee: HashMap<TargetId, MeleeWindow>,
    scheduler: Scheduler<TaskOwner, Continuation>,
    ledgers: HashMap<TargetId, StatLedger>,
    events: EventOutbox,
    hazards: Hazards,
    catalog: WeaponCatalog,
    rng: StdRng,
}

impl CombatSim {
    pub fn new(catalog: WeaponCatalog, world: TargetWorld, seed: u64) -> Self {
        Self {
            world,
            weapons: Arena::new(),
            grenades: Arena::new(),
            launchers: Arena::new(),
            melee: HashMap::new(),
            scheduler: Scheduler::new(),
            ledgers: HashMap::new(),
            events: EventOutbox::default(),
            hazards: Hazards::default(),
            catalog,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    pub fn world(&self) -> &TargetWorld {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut TargetWorld {
        &mut self.world
    }

    pub fn catalog(&self) -> &WeaponCatalog {
        &self.catalog
    }

    pub fn weapon(&self, id: WeaponId) -> Option<&Weapon> {
        self.weapons.get(id)
    }

    pub fn weapons(&self) -> impl Iterator<Item = (WeaponId, &Weapon)> {
        self.weapons.iter()
    }

    pub fn launcher(&self, id: LauncherId) -> Option<&Launcher> {
        self.launchers.get(id)
    }

    pub fn grenades_in_flight(&self) -> usize {
        self.grenades.len()
    }

    pub fn ledger(&self, player: TargetId) -> Option<&StatLedger> {
        self.ledgers.get(&player)
    }

    pub fn ledgers(&self) -> impl Iterator<Item = (&TargetId, &StatLedger)> {
        self.ledgers.iter()
    }

    pub fn hazards(&self) -> Hazards {
        self.hazards
    }

    pub fn pending_tasks(&self) -> usize {
        self.scheduler.pending()
    }

    pub fn pending_tasks_for(&self, owner: TaskOwner) -> usize {
        self.scheduler.pending_for(owner)
    }

    /// Seconds simulated so far.
    pub fn now(&self) -> f32 {
        self.scheduler.now()
    }

    pub fn drain_events(&mut self) -> Vec<CombatEvent> {
        self.events.drain()
    }

    // =========================================================================
    // TARGETS
    // =========================================================================

    pub fn spawn_target(&mut self, target: Target) -> TargetId {
        self.world.spawn(target)
    }

    /// Remove a target together with its weapons, melee window and timers.
    pub fn despawn_target(&mut self, id: TargetId) -> Option<Target> {
        let owned: Vec<WeaponId> = self
            .weapons
            .iter()
            .filter(|(_, w)| w.owner == id)
            .map(|(wid, _)| wid)
            .collect();
        for weapon in owned {
            self.destroy_weapon(weapon);
        }
        self.melee.remove(&id);
        self.scheduler.cancel_owner(TaskOwner::Target(id));
        self.world.despawn(id)
    }

    pub fn set_power_station_active(&mut self, active: bool) {
        if self.hazards.power_station_active != active {
            info!("Power station hazard {}", if active { "online" } else { "offline" });
        }
        self.hazards.power_station_active = active;
    }

    // =========================================================================
    // WEAPONS
    // =========================================================================

    pub fn equip_weapon(&mut self, owner: TargetId, gun: GunType, ammo: AmmoType) -> Result<WeaponId, String> {
        let Some(target) = self.world.get(owner) else {
            return Err(format!("Cannot equip {:?}: owner {:?} does not exist", gun, owner));
        };
        if !target.is_pawn() {
            return Err(format!("Cannot equip {:?}: {} is not a pawn", gun, target.name));
        }

        let profile = self.catalog.profile(gun, ammo, &[]);
        let weapon = Weapon::new(owner, profile, &self.catalog.tuning);
        let (loaded, reserve) = (weapon.ammo.loaded(), weapon.ammo.reserve());
        let id = self.weapons.insert(weapon);
        self.ledgers.entry(owner).or_default();

        info!("Player {:?} equipped {:?} with {:?} ammo", owner, gun, ammo);
        self.events.push(CombatEvent::AmmoChanged { weapon: id, loaded, reserve });
        Ok(id)
    }

    /// Drop a weapon and every continuation it scheduled.
    pub fn destroy_weapon(&mut self, id: WeaponId) -> bool {
        if self.weapons.remove(id).is_none() {
            return false;
        }
        let cancelled = self.scheduler.cancel_owner(TaskOwner::Weapon(id));
        debug!("Destroyed weapon {:?} ({} pending tasks cancelled)", id, cancelled);
        true
    }

    fn rebuild_profile(&mut self, id: WeaponId, gun: GunType, ammo: AmmoType) -> Result<(), String> {
        let Some(weapon) = self.weapons.get(id) else {
            return Err(format!("Weapon {:?} does not exist", id));
        };
        let profile = self.catalog.profile(gun, ammo, &weapon.mods);
        self.install_profile(id, profile);
        Ok(())
    }

    /// Swap in a new profile. A reload in progress is abandoned; the refill
    /// supersedes it.
    fn install_profile(&mut self, id: WeaponId, profile: WeaponProfile) {
        let cancelled = self
            .scheduler
            .cancel_where(TaskOwner::Weapon(id), |p| matches!(p, Continuation::ReloadComplete));
        let Some(weapon) = self.weapons.get_mut(id) else {
            return;
        };
        weapon.apply_profile(profile);
        if cancelled > 0 {
            let conditions = disable_conditions(&self.world, weapon.owner);
            weapon.gate.finish_reload(conditions);
            self.events.push(CombatEvent::FireStateChanged {
                weapon: id,
                state: weapon.gate.state(),
            });
        }
        self.events.push(CombatEvent::AmmoChanged {
            weapon: id,
            loaded: weapon.ammo.loaded(),
            reserve: weapon.ammo.reserve(),
        });
    }

    pub fn set_gun_type(&mut self, id: WeaponId, gun: GunType) -> Result<(), String> {
        let ammo = self
            .weapons
            .get(id)
            .map(|w| w.profile.ammo_type)
            .ok_or_else(|| format!("Weapon {:?} does not exist", id))?;
        self.rebuild_profile(id, gun, ammo)?;
        self.events.push(CombatEvent::WeaponSwapped { weapon: id, gun });
        Ok(())
    }

    pub fn set_ammo_type(&mut self, id: WeaponId, ammo: AmmoType) -> Result<(), String> {
        let gun = self
            .weapons
            .get(id)
            .map(|w| w.profile.gun_type)
            .ok_or_else(|| format!("Weapon {:?} does not exist", id))?;
        self.rebuild_profile(id, gun, ammo)?;
        self.events.push(CombatEvent::AmmoTypeChanged { weapon: id, ammo });
        Ok(())
    }

    pub fn add_mod(&mut self, id: WeaponId, weapon_mod: WeaponMod) -> Result<(), String> {
        let Some(weapon) = self.weapons.get_mut(id) else {
            return Err(format!("Weapon {:?} does not exist", id));
        };
        if weapon.mods.len() >= MAX_MODS {
            return Err(format!("Weapon {:?} already carries {} mods", id, MAX_MODS));
        }
        weapon.mods.push(weapon_mod);
        let (gun, ammo) = (weapon.profile.gun_type, weapon.profile.ammo_type);
        self.rebuild_profile(id, gun, ammo)
    }

    /// Ammo pickup. Returns the amount actually added to the reserve.
    pub fn add_ammo_to_reserve(&mut self, id: WeaponId, amount: f32) -> f32 {
        let Some(weapon) = self.weapons.get_mut(id) else {
            debug!("Ammo pickup for missing weapon {:?}", id);
            return 0.0;
        };
        let added = weapon.ammo.add_to_reserve(amount);
        self.events.push(CombatEvent::AmmoChanged {
            weapon: id,
            loaded: weapon.ammo.loaded(),
            reserve: weapon.ammo.reserve(),
        });
        added
    }

    // =========================================================================
    // FIRE
    // =========================================================================

    /// One trigger pull from `view_origin` along `view_direction`.
    pub fn fire(&mut self, id: WeaponId, view_origin: Vec3, view_direction: Vec3) -> FireOutcome {
        let Some(weapon) = self.weapons.get_mut(id) else {
            debug!("Fire request for missing weapon {:?}", id);
            return FireOutcome::Rejected(crate::weapons::fire_gate::FireRejection::Disabled);
        };
        if !weapon.capabilities().fireable {
            return FireOutcome::Rejected(crate::weapons::fire_gate::FireRejection::Disabled);
        }
        // Busy gates reject without touching ammo.
        if !weapon.gate.is_ready() {
            return weapon.try_fire();
        }

        let owner = weapon.owner;
        if weapon.ammo.is_depleted() {
            self.events.push(CombatEvent::Notification {
                owner,
                notice: Notice::OutOfAmmo,
            });
            self.events.push(CombatEvent::Voice {
                target: owner,
                cue: VoiceCue::AmmoDepleted,
            });
        }

        let wants_prompt = weapon.ammo.needs_reload_prompt();
        let remaining = match weapon.try_fire() {
            FireOutcome::Fired { remaining } => remaining,
            FireOutcome::ReloadRequested => {
                self.events.push(CombatEvent::ReloadRequested { weapon: id });
                return FireOutcome::ReloadRequested;
            }
            rejected => return rejected,
        };

        weapon.recoil.on_fire();
        if wants_prompt && !weapon.prompt_reload {
            weapon.prompt_reload = true;
            self.events.push(CombatEvent::Notification {
                owner,
                notice: Notice::PressReload,
            });
        }
        let profile = weapon.profile.clone();
        let reserve = weapon.ammo.reserve();
        let delay = weapon.fire_delay();

        self.events.push(CombatEvent::FireStateChanged {
            weapon: id,
            state: FireGateState::Recoiling,
        });
        self.events.push(CombatEvent::AmmoChanged {
            weapon: id,
            loaded: remaining,
            reserve,
        });
        self.scheduler.schedule(TaskOwner::Weapon(id), delay, Continuation::FireDelay);

        let ledger = self.ledgers.entry(owner).or_default();
        ledger.increment(Stat::ShotsFired);
        ledger.update_accuracy();

        info!(
            "Player {:?} fired {:?} (ammo: {}/{})",
            owner, profile.gun_type, remaining, profile.mag_size
        );

        let Some(center) = self.world.get(owner).map(|t| t.center()) else {
            warn!("Weapon {:?} fired with no owner in the world", id);
            return FireOutcome::Fired { remaining };
        };
        let view_direction = view_direction.normalize_or_zero();
        let muzzle = center + view_direction * self.catalog.tuning.muzzle_offset;

        for _ in 0..profile.bullets_per_shot {
            self.fire_one(id, owner, &profile, muzzle, view_origin, view_direction);
        }

        FireOutcome::Fired { remaining }
    }

    fn fire_one(
        &mut self,
        id: WeaponId,
        owner: TargetId,
        profile: &WeaponProfile,
        muzzle: Vec3,
        view_origin: Vec3,
        view_direction: Vec3,
    ) {
        let ignore = [owner];
        let aim_point = resolve_aim_point(
            &self.world,
            view_origin,
            view_direction,
            profile.range,
            profile.spread_radians(),
            &ignore,
            &mut self.rng,
        );

        if profile.ammo_type == AmmoType::Grenade {
            self.grenades.insert(Grenade {
                weapon: id,
                instigator: owner,
                position: muzzle,
                velocity: launch_velocity(muzzle, aim_point, profile.bullet_speed),
                age: 0.0,
                damage: profile.bullet_damage,
                knockback: profile.knockback_force,
                explosion_radius: profile.explosion_radius,
            });
            return;
        }

        let direction = (aim_point - muzzle).normalize_or_zero();
        let shot = Shot {
            weapon: id,
            instigator: owner,
            profile,
            muzzle,
            direction,
        };

        let report = {
            let hits = match profile.ammo_type {
                AmmoType::Piercing => self.world.line_trace_multi(muzzle, muzzle + direction * profile.range, &ignore),
                _ => self.world.line_trace(muzzle, aim_point, &ignore).into_iter().collect(),
            };
            let mut ctx = HitContext {
                world: &mut self.world,
                ledger: self.ledgers.entry(owner).or_default(),
                events: &mut self.events,
                hazards: self.hazards,
                friendly_fire_multiplier: self.catalog.tuning.friendly_fire_multiplier,
            };
            match profile.ammo_type {
                AmmoType::Piercing => hits::resolve_piercing(&mut ctx, &shot, &hits),
                _ => hits::resolve_single(&mut ctx, &shot, hits.first()),
            }
        };

        let chainable = self.weapons.get(id).is_some_and(|w| w.capabilities().chainable);
        if !chainable || profile.num_bounces == 0 {
            return;
        }
        for source in report.chain_sources {
            let session = ChainBounceSession::new(
                id,
                owner,
                source,
                profile.num_bounces,
                direction,
                profile.bullet_damage,
                profile.chain_bounce_range,
            );
            self.scheduler
                .schedule(TaskOwner::Weapon(id), CHAIN_STEP_DELAY, Continuation::ChainBounce(session));
        }
    }

    // =========================================================================
    // RELOAD
    // =========================================================================

    /// Start a reload. Returns false when the weapon cannot reload right now.
    pub fn reload(&mut self, id: WeaponId) -> bool {
        let Some(weapon) = self.weapons.get_mut(id) else {
            debug!("Reload request for missing weapon {:?}", id);
            return false;
        };
        if !weapon.capabilities().reloadable || !weapon.can_reload() || !weapon.begin_reload() {
            return false;
        }
        let reload_time = weapon.profile.reload_time;
        self.events.push(CombatEvent::FireStateChanged {
            weapon: id,
            state: FireGateState::Reloading,
        });
        self.scheduler
            .schedule(TaskOwner::Weapon(id), reload_time, Continuation::ReloadComplete);
        true
    }

    fn complete_reload(&mut self, id: WeaponId) {
        let Some(weapon) = self.weapons.get_mut(id) else {
            return;
        };
        let owner = weapon.owner;
        let conditions = disable_conditions(&self.world, owner);
        let grabbed = weapon.finish_reload(conditions);
        let (loaded, reserve, low) = (weapon.ammo.loaded(), weapon.ammo.reserve(), weapon.ammo.is_low());

        info!("Player {:?} reloaded (+{} rounds, reserve {})", owner, grabbed, reserve);
        self.events.push(CombatEvent::Reloaded { weapon: id, grabbed });
        self.events.push(CombatEvent::AmmoChanged { weapon: id, loaded, reserve });
        self.events.push(CombatEvent::FireStateChanged {
            weapon: id,
            state: weapon.gate.state(),
        });

        if low {
            self.events.push(CombatEvent::Notification {
                owner,
                notice: Notice::LowAmmo,
            });
            self.events.push(CombatEvent::Voice {
                target: owner,
                cue: VoiceCue::AmmoLow,
            });
        }
        if reserve <= 0.0 {
            self.events.push(CombatEvent::Voice {
                target: owner,
                cue: VoiceCue::LastReload,
            });
        }
    }

    // =========================================================================
    // MELEE
    // =========================================================================

    pub fn begin_melee(&mut self, attacker: TargetId, body_name: &str) {
        let window = MeleeWindow::begin(&self.world, attacker, body_name);
        self.melee.insert(attacker, window);
    }

    pub fn end_melee(&mut self, attacker: TargetId) {
        if let Some(mut window) = self.melee.remove(&attacker) {
            window.end();
        }
    }

    pub fn is_melee_active(&self, attacker: TargetId) -> bool {
        self.melee.get(&attacker).is_some_and(|w| w.is_active())
    }

    fn tick_melee(&mut self) {
        let knockback = self.catalog.tuning.melee_knockback;
        let mut hits: Vec<(TargetId, TargetId)> = Vec::new();

        for (attacker, window) in self.melee.iter_mut() {
            if !self.world.is_alive(*attacker) {
                window.end();
                continue;
            }
            let Some((center, radius)) = window.probe(&self.world) else {
                continue;
            };
            let overlaps = self.world.sphere_overlap(center, radius, &[*attacker]);
            for victim in window.tick(&overlaps) {
                hits.push((*attacker, victim));
            }
        }

        for (attacker, victim) in hits {
            let mut ctx = DamageContext {
                world: &mut self.world,
                events: &mut self.events,
                hazards: self.hazards,
            };
            let result = ctx.apply_melee_hit(attacker, victim, knockback);
            if result.applied {
                debug!("{:?} hit {:?} for {} (melee)", attacker, victim, result.damage);
            }
        }
    }

    // =========================================================================
    // LAUNCHERS
    // =========================================================================

    pub fn add_jump_pad(&mut self, trigger: TriggerVolume, force: f32, reset_time: f32) -> LauncherId {
        self.launchers.insert(Launcher::jump_pad(trigger, force, reset_time))
    }

    pub fn add_man_cannon(
        &mut self,
        trigger: TriggerVolume,
        direction: Vec3,
        force: f32,
        fire_delay: f32,
        reset_time: f32,
    ) -> LauncherId {
        self.launchers
            .insert(Launcher::man_cannon(trigger, direction, force, fire_delay, reset_time))
    }

    pub fn remove_launcher(&mut self, id: LauncherId) -> bool {
        self.scheduler.cancel_owner(TaskOwner::Launcher(id));
        self.launchers.remove(id).is_some()
    }

    fn tick_launchers(&mut self) {
        for id in self.launchers.handles() {
            let Some(launcher) = self.launchers.get_mut(id) else {
                continue;
            };
            let entered = launcher.update_occupancy(&self.world);
            for target in entered {
                self.on_launcher_entered(id, target);
            }
        }
    }

    fn on_launcher_entered(&mut self, id: LauncherId, target: TargetId) {
        let Some(launcher) = self.launchers.get_mut(id) else {
            return;
        };
        if !launcher.can_launch {
            return;
        }
        launcher.can_launch = false;

        match launcher.kind {
            LauncherKind::JumpPad => {
                let (force, reset_time) = (launcher.force, launcher.reset_time);
                let Some(body) = self.world.get_mut(target) else {
                    return;
                };
                let velocity = Vec3::Y * launch_force(force, body.is_airborne());
                launch(body, velocity, false, true);
                body.jump_allowed = false;
                self.events.push(CombatEvent::Launched { target, velocity });
                self.scheduler.schedule(
                    TaskOwner::Launcher(id),
                    reset_time,
                    Continuation::PadReset { target },
                );
            }
            LauncherKind::ManCannon { fire_delay, .. } => {
                launcher.first_entrant = Some(target);
                self.scheduler
                    .schedule(TaskOwner::Launcher(id), fire_delay, Continuation::CannonFire);
            }
        }
    }

    fn fire_cannon(&mut self, id: LauncherId) {
        let Some(launcher) = self.launchers.get(id) else {
            return;
        };
        let LauncherKind::ManCannon { direction, .. } = launcher.kind else {
            return;
        };
        let (force, reset_time) = (launcher.force, launcher.reset_time);

        for target in launcher.launch_order() {
            let Some(body) = self.world.get_mut(target) else {
                continue;
            };
            let velocity = direction * launch_force(force, body.is_airborne());
            launch(body, velocity, true, true);
            body.launched = true;

            for (_, weapon) in self.weapons.iter_mut().filter(|(_, w)| w.owner == target) {
                weapon.gate.disable();
            }
            self.events.push(CombatEvent::Launched { target, velocity });
            self.scheduler
                .schedule_repeating(TaskOwner::Target(target), GLIDE_CHECK_INTERVAL, Continuation::GlideCheck);
        }
        self.scheduler
            .schedule(TaskOwner::Launcher(id), reset_time, Continuation::CannonReset);
    }

    fn reset_cannon(&mut self, id: LauncherId) {
        let Some(launcher) = self.launchers.get_mut(id) else {
            return;
        };
        launcher.can_launch = true;
        launcher.first_entrant = None;

        // Anyone still standing inside re-arms it straight away.
        if let Some(next) = launcher.occupants().first().copied() {
            self.on_launcher_entered(id, next);
        }
    }

    // =========================================================================
    // TICK
    // =========================================================================

    pub fn tick(&mut self, dt: f32) {
        for task in self.scheduler.advance(dt) {
            self.run_continuation(task);
        }

        let ground = self.world.ground_height;
        for (_, target) in self.world.targets.iter_mut().filter(|(_, t)| t.is_pawn()) {
            step_target(target, ground, dt);
        }

        for (id, weapon) in self.weapons.iter_mut() {
            let conditions = disable_conditions(&self.world, weapon.owner);
            if weapon.gate.refresh(conditions) {
                self.events.push(CombatEvent::FireStateChanged {
                    weapon: id,
                    state: weapon.gate.state(),
                });
            }
            if let Some(kick) = weapon.recoil.tick(dt) {
                self.events.push(CombatEvent::CameraKick {
                    weapon: id,
                    pitch: kick.pitch,
                    yaw: kick.yaw,
                });
            }
        }

        self.tick_grenades(dt);
        self.tick_melee();
        self.tick_launchers();
    }

    fn tick_grenades(&mut self, dt: f32) {
        for id in self.grenades.handles() {
            let Some(projectile) = self.grenades.get_mut(id) else {
                continue;
            };
            let flight = projectile.step(&self.world, dt);
            if flight == GrenadeFlight::InFlight {
                continue;
            }
            self.detonate(id, flight);
        }
    }

    fn detonate(&mut self, id: GrenadeId, flight: GrenadeFlight) {
        let Some(projectile) = self.grenades.remove(id) else {
            return;
        };
        let mut ctx = HitContext {
            world: &mut self.world,
            ledger: self.ledgers.entry(projectile.instigator).or_default(),
            events: &mut self.events,
            hazards: self.hazards,
            friendly_fire_multiplier: self.catalog.tuning.friendly_fire_multiplier,
        };
        if let GrenadeFlight::Contact { target } = flight {
            grenade::register_contact(&mut ctx, target);
        }
        let affected = grenade::explode(&mut ctx, &projectile);
        debug!("Grenade exploded at {:?}, {} pawns affected", projectile.position, affected.len());
    }

    fn run_continuation(&mut self, task: DueTask<TaskOwner, Continuation>) {
        match (task.owner, task.payload) {
            (TaskOwner::Weapon(id), Continuation::FireDelay) => {
                let Some(weapon) = self.weapons.get_mut(id) else {
                    return;
                };
                let conditions = disable_conditions(&self.world, weapon.owner);
                if weapon.gate.on_fire_delay_elapsed(conditions) {
                    self.events.push(CombatEvent::FireStateChanged {
                        weapon: id,
                        state: weapon.gate.state(),
                    });
                }
            }
            (TaskOwner::Weapon(id), Continuation::ReloadComplete) => self.complete_reload(id),
            (TaskOwner::Weapon(id), Continuation::ChainBounce(session)) => {
                if !self.weapons.contains(id) {
                    return;
                }
                let mut ctx = DamageContext {
                    world: &mut self.world,
                    events: &mut self.events,
                    hazards: self.hazards,
                };
                if let Some(next) = chain::step(&mut ctx, &session) {
                    self.scheduler
                        .schedule(TaskOwner::Weapon(id), CHAIN_STEP_DELAY, Continuation::ChainBounce(next));
                }
            }
            (TaskOwner::Launcher(id), Continuation::PadReset { target }) => {
                if let Some(pad) = self.launchers.get_mut(id) {
                    pad.can_launch = true;
                }
                if let Some(body) = self.world.get_mut(target) {
                    body.jump_allowed = true;
                }
            }
            (TaskOwner::Launcher(id), Continuation::CannonFire) => self.fire_cannon(id),
            (TaskOwner::Launcher(id), Continuation::CannonReset) => self.reset_cannon(id),
            (TaskOwner::Target(id), Continuation::GlideCheck) => match self.world.get_mut(id) {
                Some(body) if body.velocity.y <= 0.0 => {
                    if body.launched {
                        body.launched = false;
                        body.gliding = true;
                    }
                    self.scheduler.cancel(task.handle);
                }
                Some(_) => {}
                None => {
                    self.scheduler.cancel(task.handle);
                }
            },
            (owner, payload) => warn!("Dropping continuation {:?} for mismatched owner {:?}", payload, owner),
        }
    }
}
