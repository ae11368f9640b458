//! Outbox of fire-and-forget combat events.
//!
//! The engine never calls into presentation or effect systems directly; it
//! pushes `CombatEvent`s and the host drains them once per tick.

use bevy::prelude::*;

use crate::targets::TargetId;
use crate::weapons::fire_gate::FireGateState;
use crate::weapons::{AmmoType, GunType, WeaponId};

/// Categorized impact effects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ImpactCue {
    /// Bare geometry or a neutral prop.
    Other,
    Bullet,
    Chain,
    /// Piercing ammo.
    Laser,
    Crit,
    EnemySpawner,
    Grenade,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VoiceCue {
    FriendlyFire,
    AmmoDepleted,
    AmmoLow,
    LastReload,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Notice {
    OutOfAmmo,
    LowAmmo,
    PressReload,
}

/// Persistent effects applied to a target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StatusEffect {
    PowerStation,
}

#[derive(Clone, Debug, PartialEq)]
pub enum CombatEvent {
    FireStateChanged {
        weapon: WeaponId,
        state: FireGateState,
    },
    AmmoChanged {
        weapon: WeaponId,
        loaded: u32,
        reserve: f32,
    },
    WeaponSwapped {
        weapon: WeaponId,
        gun: GunType,
    },
    AmmoTypeChanged {
        weapon: WeaponId,
        ammo: AmmoType,
    },
    ReloadRequested {
        weapon: WeaponId,
    },
    Reloaded {
        weapon: WeaponId,
        grabbed: u32,
    },
    Tracer {
        weapon: WeaponId,
        ammo: AmmoType,
        from: Vec3,
        to: Vec3,
    },
    Impact {
        cue: ImpactCue,
        target: Option<TargetId>,
        location: Vec3,
    },
    Damage {
        instigator: Option<TargetId>,
        target: TargetId,
        amount: f32,
        critical: bool,
        killed: bool,
    },
    Launched {
        target: TargetId,
        velocity: Vec3,
    },
    Status {
        target: TargetId,
        effect: StatusEffect,
    },
    Voice {
        target: TargetId,
        cue: VoiceCue,
    },
    Notification {
        owner: TargetId,
        notice: Notice,
    },
    CameraKick {
        weapon: WeaponId,
        pitch: f32,
        yaw: f32,
    },
    MeleeHit {
        attacker: TargetId,
        victim: TargetId,
    },
    Explosion {
        location: Vec3,
        radius: f32,
    },
}

/// Global hazard flags read by the damage path.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Hazards {
    /// While the power-station ship is alive every enemy damaged gets `StatusEffect::PowerStation`.
    pub power_station_active: bool,
}

/// Ordered event buffer.
#[derive(Debug, Default)]
pub struct EventOutbox {
    events: Vec<CombatEvent>,
}

impl EventOutbox {
    pub fn push(&mut self, event: CombatEvent) {
        self.events.push(event);
    }

    pub fn drain(&mut self) -> Vec<CombatEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn as_slice(&self) -> &[CombatEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
