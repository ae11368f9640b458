//! Scene queries used by the combat engine.
//!
//! The engine only ever talks to the world through [`SpatialQuery`], so the
//! hit pipeline can run against [`crate::world::TargetWorld`] in the sim or
//! against a hand-built fake in tests.

use bevy::prelude::*;

use crate::targets::{BodyShape, TargetId};

/// Result of a line trace.
#[derive(Clone, Debug, PartialEq)]
pub struct TraceHit {
    /// `None` for actorless geometry (the ground plane).
    pub target: Option<TargetId>,
    pub body: Option<usize>,
    pub location: Vec3,
    pub normal: Vec3,
    /// Distance from the trace start.
    pub distance: f32,
    /// Blocking hits stop a multi trace.
    pub blocking: bool,
}

/// A body touched by a sphere overlap.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Overlap {
    pub target: TargetId,
    pub body: usize,
    /// Distance from the sphere center to the body center.
    pub distance: f32,
}

pub trait SpatialQuery {
    /// First hit along `start..end`. Every target blocks.
    fn line_trace(&self, start: Vec3, end: Vec3, ignore: &[TargetId]) -> Option<TraceHit>;

    /// Ordered hits along `start..end`. Pawns and special structures overlap
    /// (one hit per target, nearest body), anything else blocks and ends the
    /// list; the blocker is included as the last entry.
    fn line_trace_multi(&self, start: Vec3, end: Vec3, ignore: &[TargetId]) -> Vec<TraceHit>;

    /// Every body intersecting the sphere, sorted by distance.
    fn sphere_overlap(&self, center: Vec3, radius: f32, ignore: &[TargetId]) -> Vec<Overlap>;
}

// =============================================================================
// GEOMETRY
// =============================================================================

/// Segment vs sphere. Returns the entry parameter `t` in `[0, 1]` and the
/// surface normal. A start point inside the sphere hits at `t = 0`.
pub fn segment_sphere_intersection(
    start: Vec3,
    end: Vec3,
    center: Vec3,
    radius: f32,
) -> Option<(f32, Vec3)> {
    let dir = end - start;
    let to_start = start - center;

    if to_start.length_squared() <= radius * radius {
        return Some((0.0, (-dir).normalize_or_zero()));
    }

    let a = dir.length_squared();
    if a < 1e-12 {
        return None;
    }
    let b = 2.0 * to_start.dot(dir);
    let c = to_start.length_squared() - radius * radius;
    let disc = b * b - 4.0 * a * c;
    if disc < 0.0 {
        return None;
    }

    let t = (-b - disc.sqrt()) / (2.0 * a);
    if !(0.0..=1.0).contains(&t) {
        return None;
    }
    let point = start + dir * t;
    Some((t, (point - center).normalize_or_zero()))
}

/// Segment vs AABB (slab method). Returns `t` in `[0, 1]` and the hit normal.
pub fn segment_aabb_intersection(
    start: Vec3,
    end: Vec3,
    aabb_min: Vec3,
    aabb_max: Vec3,
) -> Option<(f32, Vec3)> {
    let dir = end - start;
    let mut tmin = 0.0_f32;
    let mut tmax = 1.0_f32;
    let mut hit_normal = Vec3::ZERO;

    for axis in 0..3 {
        let s = start[axis];
        let d = dir[axis];
        let min = aabb_min[axis];
        let max = aabb_max[axis];

        if d.abs() < 1e-6 {
            if s < min || s > max {
                return None;
            }
            continue;
        }

        let inv_d = 1.0 / d;
        let mut near = (min - s) * inv_d;
        let mut far = (max - s) * inv_d;

        let mut n = Vec3::ZERO;
        n[axis] = -d.signum();

        if near > far {
            std::mem::swap(&mut near, &mut far);
        }

        if near > tmin {
            tmin = near;
            hit_normal = n;
        }
        tmax = tmax.min(far);

        if tmin > tmax {
            return None;
        }
    }

    Some((tmin, hit_normal))
}

/// Segment vs the horizontal plane `y = height`, from either side.
pub fn segment_plane_intersection(start: Vec3, end: Vec3, height: f32) -> Option<(f32, Vec3)> {
    let ds = start.y - height;
    let de = end.y - height;
    if ds == 0.0 {
        return Some((0.0, Vec3::Y));
    }
    if ds.signum() == de.signum() {
        return None;
    }
    let t = ds / (ds - de);
    let normal = if ds > 0.0 { Vec3::Y } else { Vec3::NEG_Y };
    Some((t, normal))
}

/// Segment vs one body shape in world space.
pub fn segment_shape_intersection(
    start: Vec3,
    end: Vec3,
    center: Vec3,
    shape: &BodyShape,
) -> Option<(f32, Vec3)> {
    match *shape {
        BodyShape::Sphere { radius } => segment_sphere_intersection(start, end, center, radius),
        BodyShape::Box { half_extents } => {
            segment_aabb_intersection(start, end, center - half_extents, center + half_extents)
        }
    }
}

/// Sphere vs one body shape in world space.
pub fn sphere_shape_overlap(sphere_center: Vec3, sphere_radius: f32, center: Vec3, shape: &BodyShape) -> bool {
    match *shape {
        BodyShape::Sphere { radius } => {
            sphere_center.distance_squared(center) <= (sphere_radius + radius).powi(2)
        }
        BodyShape::Box { half_extents } => {
            let closest = sphere_center.clamp(center - half_extents, center + half_extents);
            sphere_center.distance_squared(closest) <= sphere_radius * sphere_radius
        }
    }
}
