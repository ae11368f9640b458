//! Enemy melee attack windows.
//!
//! While an attack animation is live the attacking body (usually a hand) is
//! probed for overlaps every tick. Each victim is hit at most once per
//! window, however many of its bodies touch or for how many ticks.

use bevy::prelude::*;
use std::collections::HashSet;

use crate::spatial::Overlap;
use crate::targets::TargetId;
use crate::world::TargetWorld;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeleeWindow {
    attacker: Option<TargetId>,
    body: Option<usize>,
    already_hit: HashSet<TargetId>,
}

impl MeleeWindow {
    /// Open a window on `attacker`'s named body. An unknown attacker or body
    /// leaves the window inert.
    pub fn begin(world: &TargetWorld, attacker: TargetId, body_name: &str) -> Self {
        let body = world.get(attacker).and_then(|t| t.body_index(body_name));
        if body.is_none() {
            warn!("Melee window on {:?}: no body named '{}'", attacker, body_name);
        }
        Self {
            attacker: Some(attacker),
            body,
            already_hit: HashSet::new(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.attacker.is_some() && self.body.is_some()
    }

    pub fn attacker(&self) -> Option<TargetId> {
        self.attacker
    }

    /// World-space sphere to overlap this tick.
    pub fn probe(&self, world: &TargetWorld) -> Option<(Vec3, f32)> {
        let attacker = world.get(self.attacker?)?;
        let index = self.body?;
        let center = attacker.body_position(index)?;
        let radius = attacker.bodies.get(index)?.bounding_radius();
        Some((center, radius))
    }

    /// New victims among this tick's overlaps.
    pub fn tick(&mut self, overlaps: &[Overlap]) -> Vec<TargetId> {
        if !self.is_active() {
            return Vec::new();
        }
        let mut fresh = Vec::new();
        for overlap in overlaps {
            if Some(overlap.target) == self.attacker {
                continue;
            }
            if self.already_hit.insert(overlap.target) {
                fresh.push(overlap.target);
            }
        }
        fresh
    }

    pub fn end(&mut self) {
        self.attacker = None;
        self.body = None;
        self.already_hit.clear();
    }
}
