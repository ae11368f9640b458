//! Aim point resolution with a random spread cone.

use bevy::prelude::*;
use rand::Rng;

use crate::spatial::SpatialQuery;
use crate::targets::TargetId;

/// The aim probe starts this far along the view ray, clear of the camera rig.
pub const PROBE_START_OFFSET: f32 = 0.25;

/// Distance added past the probed impact so the shot trace reaches the surface.
pub const AIM_DISTANCE_PADDING: f32 = 0.05;

/// Random direction inside a cone, uniform over the cone's solid angle.
pub fn random_cone_direction<R: Rng + ?Sized>(axis: Vec3, half_angle: f32, rng: &mut R) -> Vec3 {
    let axis = axis.normalize_or_zero();
    if axis == Vec3::ZERO {
        return Vec3::ZERO;
    }
    if half_angle <= 0.0 {
        return axis;
    }

    let cos_max = half_angle.min(std::f32::consts::PI).cos();
    let cos_theta = 1.0 - rng.gen::<f32>() * (1.0 - cos_max);
    let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
    let phi = rng.gen::<f32>() * std::f32::consts::TAU;

    // Create perpendicular vectors for the spread plane
    let up = if axis.y.abs() < 0.9 { Vec3::Y } else { Vec3::X };
    let right = axis.cross(up).normalize();
    let actual_up = right.cross(axis).normalize();

    (axis * cos_theta + (right * phi.cos() + actual_up * phi.sin()) * sin_theta).normalize()
}

/// Where a shot from `view_origin` looking along `view_direction` should go.
///
/// Probes the view ray first; with a blocking hit the cone is centered on the
/// impact and the point lands just past it, otherwise the cone follows the
/// view direction out to `range`.
pub fn resolve_aim_point<Q, R>(
    query: &Q,
    view_origin: Vec3,
    view_direction: Vec3,
    range: f32,
    spread_radians: f32,
    ignore: &[TargetId],
    rng: &mut R,
) -> Vec3
where
    Q: SpatialQuery + ?Sized,
    R: Rng + ?Sized,
{
    let direction = view_direction.normalize_or_zero();
    let probe_start = view_origin + direction * PROBE_START_OFFSET;
    let probe_end = view_origin + direction * range;

    if let Some(hit) = query.line_trace(probe_start, probe_end, ignore) {
        let to_impact = hit.location - view_origin;
        let spread_dir = random_cone_direction(to_impact, spread_radians, rng);
        let distance = to_impact.length() + AIM_DISTANCE_PADDING;
        return view_origin + spread_dir * distance;
    }

    view_origin + random_cone_direction(direction, spread_radians, rng) * range
}
