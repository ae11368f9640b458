//! The target world: every hittable actor in an arena plus a flat ground plane.

use bevy::prelude::*;

use crate::arena::Arena;
use crate::spatial::{segment_plane_intersection, segment_shape_intersection, sphere_shape_overlap, Overlap, SpatialQuery, TraceHit};
use crate::targets::{Target, TargetId, TargetKind};

#[derive(Default)]
pub struct TargetWorld {
    pub targets: Arena<Target>,
    /// Height of the actorless ground plane, if any.
    pub ground_height: Option<f32>,
}

impl TargetWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ground(height: f32) -> Self {
        Self {
            targets: Arena::new(),
            ground_height: Some(height),
        }
    }

    pub fn spawn(&mut self, target: Target) -> TargetId {
        self.targets.insert(target)
    }

    pub fn despawn(&mut self, id: TargetId) -> Option<Target> {
        self.targets.remove(id)
    }

    pub fn get(&self, id: TargetId) -> Option<&Target> {
        self.targets.get(id)
    }

    pub fn get_mut(&mut self, id: TargetId) -> Option<&mut Target> {
        self.targets.get_mut(id)
    }

    pub fn kind_of(&self, id: TargetId) -> Option<TargetKind> {
        self.get(id).map(|t| t.kind)
    }

    pub fn is_alive(&self, id: TargetId) -> bool {
        self.get(id).is_some_and(|t| t.is_alive())
    }

    /// Nearest body hit on one target along the segment, as `(t, body, normal)`.
    fn trace_target(target: &Target, start: Vec3, end: Vec3) -> Option<(f32, usize, Vec3)> {
        target
            .bodies
            .iter()
            .enumerate()
            .filter_map(|(index, body)| {
                segment_shape_intersection(start, end, target.position + body.offset, &body.shape)
                    .map(|(t, normal)| (t, index, normal))
            })
            .min_by(|a, b| a.0.total_cmp(&b.0))
    }

    /// Every hit along the segment, nearest first, one per target.
    fn collect_hits(&self, start: Vec3, end: Vec3, ignore: &[TargetId]) -> Vec<TraceHit> {
        let length = start.distance(end);
        let mut hits: Vec<TraceHit> = self
            .targets
            .iter()
            .filter(|(id, _)| !ignore.contains(id))
            .filter_map(|(id, target)| {
                let (t, body, normal) = Self::trace_target(target, start, end)?;
                let overlaps = target.is_pawn() || target.kind == TargetKind::SpecialStructure;
                Some(TraceHit {
                    target: Some(id),
                    body: Some(body),
                    location: start.lerp(end, t),
                    normal,
                    distance: t * length,
                    blocking: !overlaps,
                })
            })
            .collect();

        if let Some(height) = self.ground_height {
            if let Some((t, normal)) = segment_plane_intersection(start, end, height) {
                hits.push(TraceHit {
                    target: None,
                    body: None,
                    location: start.lerp(end, t),
                    normal,
                    distance: t * length,
                    blocking: true,
                });
            }
        }

        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits
    }
}

impl SpatialQuery for TargetWorld {
    fn line_trace(&self, start: Vec3, end: Vec3, ignore: &[TargetId]) -> Option<TraceHit> {
        self.collect_hits(start, end, ignore).into_iter().next().map(|mut hit| {
            hit.blocking = true;
            hit
        })
    }

    fn line_trace_multi(&self, start: Vec3, end: Vec3, ignore: &[TargetId]) -> Vec<TraceHit> {
        let mut hits = self.collect_hits(start, end, ignore);
        if let Some(first_blocker) = hits.iter().position(|h| h.blocking) {
            hits.truncate(first_blocker + 1);
        }
        hits
    }

    fn sphere_overlap(&self, center: Vec3, radius: f32, ignore: &[TargetId]) -> Vec<Overlap> {
        let mut overlaps: Vec<Overlap> = Vec::new();
        for (id, target) in self.targets.iter() {
            if ignore.contains(&id) {
                continue;
            }
            for (index, body) in target.bodies.iter().enumerate() {
                let body_center = target.position + body.offset;
                if sphere_shape_overlap(center, radius, body_center, &body.shape) {
                    overlaps.push(Overlap {
                        target: id,
                        body: index,
                        distance: center.distance(body_center),
                    });
                }
            }
        }
        overlaps.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        overlaps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::targets::Body;

    fn ball(kind_enemy: bool, z: f32) -> Target {
        let body = vec![Body::sphere("core", Vec3::ZERO, 0.5)];
        let base = if kind_enemy {
            Target::enemy("e", Vec3::new(0.0, 1.0, z))
        } else {
            Target::player("p", Vec3::new(0.0, 1.0, z))
        };
        base.with_bodies(body)
    }

    #[test]
    fn test_line_trace_hits_nearest_pawn() {
        let mut world = TargetWorld::new();
        let far = world.spawn(ball(true, 10.0));
        let near = world.spawn(ball(true, 5.0));

        let hit = world
            .line_trace(Vec3::new(0.0, 1.0, 0.0), Vec3::new(0.0, 1.0, 20.0), &[])
            .unwrap();
        assert_eq!(hit.target, Some(near));
        assert!((hit.distance - 4.5).abs() < 1e-4);

        let hit = world
            .line_trace(Vec3::new(0.0, 1.0, 0.0), Vec3::new(0.0, 1.0, 20.0), &[near])
            .unwrap();
        assert_eq!(hit.target, Some(far));
    }

    #[test]
    fn test_multi_trace_passes_pawns_and_stops_at_wall() {
        let mut world = TargetWorld::new();
        let a = world.spawn(ball(true, 3.0));
        let b = world.spawn(ball(false, 6.0));
        let wall = world.spawn(Target::wall("wall", Vec3::new(0.0, 1.0, 9.0), Vec3::new(2.0, 2.0, 0.5)));
        let _behind = world.spawn(ball(true, 12.0));

        let hits = world.line_trace_multi(Vec3::new(0.0, 1.0, 0.0), Vec3::new(0.0, 1.0, 20.0), &[]);
        let ids: Vec<_> = hits.iter().map(|h| h.target).collect();
        assert_eq!(ids, vec![Some(a), Some(b), Some(wall)]);
        assert!(!hits[0].blocking);
        assert!(hits[2].blocking);
    }

    #[test]
    fn test_ground_is_actorless_blocker() {
        let world = TargetWorld::with_ground(0.0);
        let hit = world
            .line_trace(Vec3::new(0.0, 2.0, 0.0), Vec3::new(0.0, -2.0, 4.0), &[])
            .unwrap();
        assert!(hit.target.is_none());
        assert!(hit.location.y.abs() < 1e-5);
    }

    #[test]
    fn test_sphere_overlap_reports_each_body() {
        let mut world = TargetWorld::new();
        let enemy = world.spawn(Target::enemy("e", Vec3::ZERO));
        let overlaps = world.sphere_overlap(Vec3::new(0.0, 1.0, 0.0), 2.0, &[]);
        assert_eq!(overlaps.len(), world.get(enemy).unwrap().bodies.len());
        assert!(overlaps.iter().all(|o| o.target == enemy));
        assert!(world.sphere_overlap(Vec3::new(0.0, 1.0, 0.0), 2.0, &[enemy]).is_empty());
    }
}
