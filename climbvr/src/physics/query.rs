//! The collision query everything in locomotion is built on: a sphere cast
//! that pushes its result a full radius clear of whatever it hits, double
//! checked against corners and thin geometry.

use cgmath::{Vector3, Zero};

use super::{CollisionWorld, SurfaceHit};
use crate::util::direction_and_length;

/// Outcome of one corrected cast. A miss carries the zero vector.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CollisionResult {
    pub surface: Option<SurfaceHit>,
    pub corrected_position: Vector3<f32>,
}

impl CollisionResult {
    pub fn miss() -> Self {
        CollisionResult {
            surface: None,
            corrected_position: Vector3::zero(),
        }
    }

    fn hit(corrected_position: Vector3<f32>, surface: SurfaceHit) -> Self {
        CollisionResult {
            surface: Some(surface),
            corrected_position,
        }
    }

    pub fn is_hit(&self) -> bool {
        self.surface.is_some()
    }
}

/// Sweep a sphere from `origin` along `movement` and return where it may rest.
///
/// The swept sphere is shrunk to `radius * precision` and allowed to travel
/// `radius * (1 - precision)` further to compensate. On contact the corrected
/// position sits a full `radius` off the surface, re-validated by a tighter
/// cast and a ray. If the sphere misses, a ray along `movement` still blocks
/// at the origin so thin geometry cannot be skipped.
pub fn cast_sphere<W: CollisionWorld + ?Sized>(
    world: &W,
    origin: Vector3<f32>,
    radius: f32,
    movement: Vector3<f32>,
    precision: f32,
) -> CollisionResult {
    if !(radius > 0.0) {
        return CollisionResult::miss();
    }
    let Some((direction, distance)) = direction_and_length(movement) else {
        return CollisionResult::miss();
    };

    let inner_precision = precision * precision;

    if let Some(hit) = world.sphere_cast(
        origin,
        radius * precision,
        direction,
        distance + radius * (1.0 - precision),
    ) {
        let mut corrected = hit.point + hit.normal * radius;
        let mut surface = hit;

        if let Some((to_corrected, corrected_distance)) = direction_and_length(corrected - origin) {
            if let Some(inner) = world.sphere_cast(
                origin,
                radius * inner_precision,
                to_corrected,
                corrected_distance + radius * (1.0 - inner_precision),
            ) {
                // A corner sits between the origin and the pushed-out position.
                let allowed = (hit.distance - radius * (1.0 - inner_precision)).max(0.0);
                corrected = origin + to_corrected * allowed;
                surface = inner;
            } else if let Some(ray_hit) = world.raycast(
                origin,
                to_corrected,
                corrected_distance + radius * inner_precision * 0.999,
            ) {
                return CollisionResult::hit(origin, ray_hit);
            }
        }

        return CollisionResult::hit(corrected, surface);
    }

    match world.raycast(origin, direction, distance + radius * precision * 0.999) {
        Some(ray_hit) => CollisionResult::hit(origin, ray_hit),
        None => CollisionResult::miss(),
    }
}

/// True when the straight sweep from `from` to `to` is obstructed.
pub fn is_path_blocked<W: CollisionWorld + ?Sized>(
    world: &W,
    from: Vector3<f32>,
    to: Vector3<f32>,
    radius: f32,
    extra_distance: f32,
) -> bool {
    let Some((direction, distance)) = direction_and_length(to - from) else {
        return false;
    };
    let max_distance = distance + extra_distance;
    if radius > 0.0 {
        world.sphere_cast(from, radius, direction, max_distance).is_some()
    } else {
        world.raycast(from, direction, max_distance).is_some()
    }
}
