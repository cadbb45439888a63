use cgmath::{Vector3, Zero};

use crate::{
    physics::{cast_sphere, CollisionWorld, SurfaceHit},
    util::{direction_and_length, project_on_plane},
};

/// Upper bound on corrective casts in one resolution: primary, slide, closure.
pub const MAX_COLLISION_PASSES: usize = 3;

/// Which step of the resolution produced the end position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResolvePass {
    /// Nothing in the way
    Free,
    /// The first contact stands
    Primary,
    /// Sliding along the contacted surface ran into something
    Slide,
    /// Moving back toward the desired target ran into something
    Closure,
    /// Only the shrunken retry saw the surface; the sphere stays put
    Overlap,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Resolution {
    pub end_position: Vector3<f32>,
    pub pass: ResolvePass,
    /// Surface that stopped the sphere
    pub surface: Option<SurfaceHit>,
}

impl Resolution {
    fn free() -> Self {
        Resolution {
            end_position: Vector3::zero(),
            pass: ResolvePass::Free,
            surface: None,
        }
    }

    fn blocked(end_position: Vector3<f32>, pass: ResolvePass, surface: Option<SurfaceHit>) -> Self {
        Resolution {
            end_position,
            pass,
            surface,
        }
    }

    pub fn collided(&self) -> bool {
        self.pass != ResolvePass::Free
    }
}

/// Slip percentages applied when the contacted surface has no override.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SlipDefaults {
    pub single_hand: f32,
    pub two_hand: f32,
}

#[derive(Clone, Copy, Debug)]
enum Step {
    Primary,
    Slide {
        first: Vector3<f32>,
        tangential: Vector3<f32>,
        surface: SurfaceHit,
    },
    Closure {
        first: Vector3<f32>,
        tangential: Vector3<f32>,
        surface: SurfaceHit,
    },
}

/// Resolve a sphere of `radius` moving from `start` by `movement` against the world.
///
/// A blocked move slides a slip-scaled fraction of the leftover movement
/// along the contacted plane, then tries to close back in on the desired
/// target. `single_hand` picks the nearly sticky default slip; braced
/// two-handed motion uses the looser one.
pub fn resolve_movement<W: CollisionWorld + ?Sized>(
    world: &W,
    start: Vector3<f32>,
    radius: f32,
    movement: Vector3<f32>,
    precision: f32,
    single_hand: bool,
    slip: SlipDefaults,
) -> Resolution {
    let target = start + movement;
    let mut step = Step::Primary;

    for _ in 0..MAX_COLLISION_PASSES {
        step = match step {
            Step::Primary => {
                let primary = cast_sphere(world, start, radius * precision, movement, precision);
                let Some(surface) = primary.surface else {
                    return retry_overlapping(world, start, radius, movement, precision);
                };

                let first = primary.corrected_position;
                let slip_percentage = surface.slip_percentage.unwrap_or(if single_hand {
                    slip.single_hand
                } else {
                    slip.two_hand
                });
                let tangential = project_on_plane(target - first, surface.normal) * slip_percentage;
                engine::locomotion_log!(
                    trace,
                    "primary contact at {:?}, sliding {:?}",
                    first,
                    tangential
                );
                Step::Slide {
                    first,
                    tangential,
                    surface,
                }
            }
            Step::Slide {
                first,
                tangential,
                surface,
            } => {
                let slide = cast_sphere(world, first, radius, tangential, precision * precision);
                if slide.is_hit() {
                    return Resolution::blocked(
                        slide.corrected_position,
                        ResolvePass::Slide,
                        slide.surface,
                    );
                }
                Step::Closure {
                    first,
                    tangential,
                    surface,
                }
            }
            Step::Closure {
                first,
                tangential,
                surface,
            } => {
                let from = first + tangential;
                let closure = cast_sphere(
                    world,
                    from,
                    radius,
                    target - from,
                    precision * precision * precision,
                );
                if closure.is_hit() {
                    return Resolution::blocked(
                        closure.corrected_position,
                        ResolvePass::Closure,
                        closure.surface,
                    );
                }
                return Resolution::blocked(first, ResolvePass::Primary, Some(surface));
            }
        };
    }

    Resolution::free()
}

/// A sphere already touching a surface can slip past the full-size cast;
/// a shrunken cast with a longer reach catches it.
fn retry_overlapping<W: CollisionWorld + ?Sized>(
    world: &W,
    start: Vector3<f32>,
    radius: f32,
    movement: Vector3<f32>,
    precision: f32,
) -> Resolution {
    let Some((direction, distance)) = direction_and_length(movement) else {
        return Resolution::free();
    };

    let retry = cast_sphere(
        world,
        start,
        radius * precision * 0.66,
        direction * (distance + radius * precision * 0.34),
        precision * 0.66,
    );
    if retry.is_hit() {
        Resolution::blocked(start, ResolvePass::Overlap, retry.surface)
    } else {
        Resolution::free()
    }
}
