//! Hittable actors: enemies, allies (players), neutral props and special
//! structures such as the enemy drop-ship spawner.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::arena::Handle;

pub type TargetId = Handle<Target>;

// =============================================================================
// GEOMETRY
// =============================================================================

/// Pawn capsule height (players and the shared enemy rig).
pub const PAWN_HEIGHT: f32 = 1.8;

/// Pawn body radius.
pub const PAWN_RADIUS: f32 = 0.3;

/// Head hitbox radius.
pub const HEAD_RADIUS: f32 = 0.18;

/// Default enemy melee damage per attributed hit.
pub const ENEMY_MELEE_DAMAGE: f32 = 15.0;

/// Default enemy health.
pub const ENEMY_MAX_HEALTH: f32 = 100.0;

/// Default player health.
pub const PLAYER_MAX_HEALTH: f32 = 100.0;

/// Which side of the fight an actor is on, as seen from a player's gun.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetKind {
    Enemy,
    /// Another player character (friendly fire).
    Ally,
    /// Walls, crates and other props with no game-side reaction.
    Neutral,
    /// The enemy drop-ship spawner: absorbs shots without taking damage.
    SpecialStructure,
}

impl TargetKind {
    /// Pawns are hit-tested as overlaps by piercing traces.
    pub fn is_pawn(&self) -> bool {
        matches!(self, TargetKind::Enemy | TargetKind::Ally)
    }
}

// =============================================================================
// HEALTH
// =============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Health {
    pub current: f32,
    pub max: f32,
}

impl Default for Health {
    fn default() -> Self {
        Self {
            current: 100.0,
            max: 100.0,
        }
    }
}

impl Health {
    pub fn new(max: f32) -> Self {
        Self { current: max, max }
    }

    /// Returns true when this damage left the actor at zero health.
    pub fn take_damage(&mut self, amount: f32) -> bool {
        self.current = (self.current - amount.max(0.0)).max(0.0);
        self.current <= 0.0
    }

    pub fn heal(&mut self, amount: f32) {
        self.current = (self.current + amount).min(self.max);
    }

    pub fn is_dead(&self) -> bool {
        self.current <= 0.0
    }

    pub fn percentage(&self) -> f32 {
        if self.max <= 0.0 {
            return 0.0;
        }
        self.current / self.max
    }
}

// =============================================================================
// BODIES
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BodyShape {
    Sphere { radius: f32 },
    /// Axis-aligned box.
    Box { half_extents: Vec3 },
}

/// One physical sub-body of a target, positioned relative to the target origin.
#[derive(Clone, Debug, PartialEq)]
pub struct Body {
    pub name: &'static str,
    pub offset: Vec3,
    pub shape: BodyShape,
}

impl Body {
    pub fn sphere(name: &'static str, offset: Vec3, radius: f32) -> Self {
        Self {
            name,
            offset,
            shape: BodyShape::Sphere { radius },
        }
    }

    pub fn cuboid(name: &'static str, offset: Vec3, half_extents: Vec3) -> Self {
        Self {
            name,
            offset,
            shape: BodyShape::Box { half_extents },
        }
    }

    /// Radius of a sphere enclosing this body.
    pub fn bounding_radius(&self) -> f32 {
        match self.shape {
            BodyShape::Sphere { radius } => radius,
            BodyShape::Box { half_extents } => half_extents.length(),
        }
    }
}

/// Identifies one sub-body of one target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BodyRef {
    pub target: TargetId,
    pub body: usize,
}

// =============================================================================
// TARGET
// =============================================================================

#[derive(Clone, Debug)]
pub struct Target {
    pub kind: TargetKind,
    pub name: String,
    /// Feet position for pawns, origin for props.
    pub position: Vec3,
    pub velocity: Vec3,
    /// `None` means indestructible.
    pub health: Option<Health>,
    pub bodies: Vec<Body>,
    /// Offset of the "Critical" reference point. Crits are impossible without one.
    pub critical_offset: Option<Vec3>,
    pub grounded: bool,
    pub gliding: bool,
    pub launched: bool,
    pub jump_allowed: bool,
    /// Damage this actor deals once per melee window per victim.
    pub melee_damage: f32,
}

impl Target {
    fn pawn(kind: TargetKind, name: impl Into<String>, position: Vec3, max_health: f32) -> Self {
        Self {
            kind,
            name: name.into(),
            position,
            velocity: Vec3::ZERO,
            health: Some(Health::new(max_health)),
            bodies: pawn_bodies(),
            critical_offset: Some(head_offset()),
            grounded: true,
            gliding: false,
            launched: false,
            jump_allowed: true,
            melee_damage: 0.0,
        }
    }

    pub fn enemy(name: impl Into<String>, position: Vec3) -> Self {
        let mut target = Self::pawn(TargetKind::Enemy, name, position, ENEMY_MAX_HEALTH);
        target.melee_damage = ENEMY_MELEE_DAMAGE;
        target
            .bodies
            .push(Body::sphere("hand_r", Vec3::new(PAWN_RADIUS + 0.25, PAWN_HEIGHT * 0.55, 0.0), 0.35));
        target
    }

    /// A player character. Seen from another player's gun this is an ally.
    pub fn player(name: impl Into<String>, position: Vec3) -> Self {
        Self::pawn(TargetKind::Ally, name, position, PLAYER_MAX_HEALTH)
    }

    /// A static axis-aligned block such as a wall or crate.
    pub fn wall(name: impl Into<String>, center: Vec3, half_extents: Vec3) -> Self {
        Self::fixture(TargetKind::Neutral, name, center, half_extents)
    }

    /// The enemy drop-ship spawner.
    pub fn spawner(name: impl Into<String>, center: Vec3, half_extents: Vec3) -> Self {
        Self::fixture(TargetKind::SpecialStructure, name, center, half_extents)
    }

    fn fixture(kind: TargetKind, name: impl Into<String>, center: Vec3, half_extents: Vec3) -> Self {
        Self {
            kind,
            name: name.into(),
            position: center,
            velocity: Vec3::ZERO,
            health: None,
            bodies: vec![Body::cuboid("block", Vec3::ZERO, half_extents)],
            critical_offset: None,
            grounded: true,
            gliding: false,
            launched: false,
            jump_allowed: false,
            melee_damage: 0.0,
        }
    }

    pub fn with_health(mut self, max: f32) -> Self {
        self.health = Some(Health::new(max));
        self
    }

    pub fn with_bodies(mut self, bodies: Vec<Body>) -> Self {
        self.bodies = bodies;
        self
    }

    pub fn with_critical_offset(mut self, offset: Option<Vec3>) -> Self {
        self.critical_offset = offset;
        self
    }

    pub fn is_alive(&self) -> bool {
        self.health.as_ref().map_or(true, |h| !h.is_dead())
    }

    pub fn is_pawn(&self) -> bool {
        self.kind.is_pawn()
    }

    pub fn is_airborne(&self) -> bool {
        !self.grounded
    }

    pub fn critical_point(&self) -> Option<Vec3> {
        self.critical_offset.map(|offset| self.position + offset)
    }

    /// Approximate center of mass, used for tracer endpoints and blast direction.
    pub fn center(&self) -> Vec3 {
        if self.is_pawn() {
            self.position + Vec3::Y * (PAWN_HEIGHT * 0.5)
        } else {
            self.position
        }
    }

    pub fn body_position(&self, body: usize) -> Option<Vec3> {
        self.bodies.get(body).map(|b| self.position + b.offset)
    }

    pub fn body_index(&self, name: &str) -> Option<usize> {
        self.bodies.iter().position(|b| b.name == name)
    }

    /// Actors whose weapons should stay suppressed.
    pub fn weapons_disabled(&self) -> bool {
        !self.is_alive() || self.gliding || self.launched
    }
}

/// Head sphere center relative to the feet.
#[inline]
pub fn head_offset() -> Vec3 {
    Vec3::new(0.0, PAWN_HEIGHT - HEAD_RADIUS, 0.0)
}

/// Torso sphere plus head sphere for an upright pawn.
pub fn pawn_bodies() -> Vec<Body> {
    vec![
        Body::sphere("torso", Vec3::new(0.0, PAWN_HEIGHT * 0.45, 0.0), PAWN_RADIUS + 0.15),
        Body::sphere("head", head_offset(), HEAD_RADIUS),
    ]
}
