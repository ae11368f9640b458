//! Jump pads and man cannons.
//!
//! Launchers only track their trigger occupancy and arming state here; the
//! timed parts (cannon fire delay, re-arm, glide check) run as scheduler
//! continuations inside [`crate::sim::CombatSim`].

use bevy::prelude::*;

use crate::arena::Handle;
use crate::targets::{TargetId, TargetKind};
use crate::world::TargetWorld;

pub type LauncherId = Handle<Launcher>;

/// Interval of the man cannon's "start gliding yet?" check.
pub const GLIDE_CHECK_INTERVAL: f32 = 0.1;

/// Axis-aligned trigger box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TriggerVolume {
    pub center: Vec3,
    pub half_extents: Vec3,
}

impl TriggerVolume {
    pub fn contains(&self, point: Vec3) -> bool {
        let d = (point - self.center).abs();
        d.x <= self.half_extents.x && d.y <= self.half_extents.y && d.z <= self.half_extents.z
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LauncherKind {
    /// Straight up, vertical velocity replaced.
    JumpPad,
    /// Full velocity override along `direction` after `fire_delay`.
    ManCannon { direction: Vec3, fire_delay: f32 },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Launcher {
    pub kind: LauncherKind,
    pub trigger: TriggerVolume,
    pub force: f32,
    pub reset_time: f32,
    pub can_launch: bool,
    /// Ally that armed the cannon; launched before anyone else.
    pub first_entrant: Option<TargetId>,
    /// Allies inside the trigger, in entry order.
    occupants: Vec<TargetId>,
}

impl Launcher {
    pub fn jump_pad(trigger: TriggerVolume, force: f32, reset_time: f32) -> Self {
        Self::new(LauncherKind::JumpPad, trigger, force, reset_time)
    }

    pub fn man_cannon(trigger: TriggerVolume, direction: Vec3, force: f32, fire_delay: f32, reset_time: f32) -> Self {
        let kind = LauncherKind::ManCannon {
            direction: direction.normalize_or_zero(),
            fire_delay,
        };
        Self::new(kind, trigger, force, reset_time)
    }

    fn new(kind: LauncherKind, trigger: TriggerVolume, force: f32, reset_time: f32) -> Self {
        Self {
            kind,
            trigger,
            force,
            reset_time,
            can_launch: true,
            first_entrant: None,
            occupants: Vec::new(),
        }
    }

    pub fn occupants(&self) -> &[TargetId] {
        &self.occupants
    }

    /// Re-scan the trigger. Returns the allies that entered since the last
    /// scan, in spawn order.
    pub fn update_occupancy(&mut self, world: &TargetWorld) -> Vec<TargetId> {
        let inside: Vec<TargetId> = world
            .targets
            .iter()
            .filter(|(_, t)| t.kind == TargetKind::Ally && self.trigger.contains(t.position))
            .map(|(id, _)| id)
            .collect();

        self.occupants.retain(|id| inside.contains(id));
        let mut entered = Vec::new();
        for id in inside {
            if !self.occupants.contains(&id) {
                self.occupants.push(id);
                entered.push(id);
            }
        }
        entered
    }

    /// Everyone a cannon shot should launch: the first entrant, then the rest
    /// still inside.
    pub fn launch_order(&self) -> Vec<TargetId> {
        let mut order: Vec<TargetId> = self.first_entrant.into_iter().collect();
        order.extend(self.occupants.iter().copied().filter(|id| Some(*id) != self.first_entrant));
        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::targets::Target;

    fn trigger() -> TriggerVolume {
        TriggerVolume {
            center: Vec3::new(0.0, 0.5, 0.0),
            half_extents: Vec3::ONE,
        }
    }

    #[test]
    fn test_occupancy_reports_only_new_allies() {
        let mut world = TargetWorld::new();
        let inside = world.spawn(Target::player("a", Vec3::ZERO));
        let _enemy = world.spawn(Target::enemy("e", Vec3::new(0.5, 0.0, 0.0)));
        let outside = world.spawn(Target::player("b", Vec3::new(5.0, 0.0, 0.0)));

        let mut pad = Launcher::jump_pad(trigger(), 12.0, 2.0);
        assert_eq!(pad.update_occupancy(&world), vec![inside]);
        assert!(pad.update_occupancy(&world).is_empty());

        world.get_mut(outside).unwrap().position = Vec3::new(0.5, 0.0, 0.5);
        assert_eq!(pad.update_occupancy(&world), vec![outside]);

        world.get_mut(inside).unwrap().position = Vec3::new(0.0, 10.0, 0.0);
        pad.update_occupancy(&world);
        assert_eq!(pad.occupants(), &[outside]);
    }

    #[test]
    fn test_launch_order_puts_first_entrant_first() {
        let mut world = TargetWorld::new();
        let a = world.spawn(Target::player("a", Vec3::ZERO));
        let b = world.spawn(Target::player("b", Vec3::new(0.2, 0.0, 0.0)));

        let mut cannon = Launcher::man_cannon(trigger(), Vec3::new(0.0, 2.0, -2.0), 20.0, 0.5, 3.0);
        cannon.update_occupancy(&world);
        cannon.first_entrant = Some(b);
        assert_eq!(cannon.launch_order(), vec![b, a]);

        let LauncherKind::ManCannon { direction, .. } = cannon.kind else {
            panic!("expected a man cannon");
        };
        assert!((direction.length() - 1.0).abs() < 1e-6);
    }
}
