use cgmath::Vector3;

use super::{config::LocomotionConfig, contact::slip_defaults, resolver::resolve_movement};
use crate::physics::{query::is_path_blocked, CollisionWorld};

/// A hand counts as engaged when it collided this tick or was touching last tick.
pub fn is_engaged(colliding: bool, was_touching: bool) -> bool {
    colliding || was_touching
}

/// Two braced hands push as one averaged hand; otherwise the single (or
/// absent) contribution passes through.
pub fn combine_contributions(
    left: Vector3<f32>,
    right: Vector3<f32>,
    both_engaged: bool,
) -> Vector3<f32> {
    if both_engaged {
        (left + right) / 2.0
    } else {
        left + right
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HeadMotion {
    /// The head is clear of geometry
    Free,
    /// The head would have hit something and was stopped against it
    Clamped,
    /// A straight line to the target is blocked; the head holds its last position
    Held,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HeadClamp {
    /// Body displacement to commit this tick
    pub displacement: Vector3<f32>,
    pub motion: HeadMotion,
}

/// Check the head sphere against the combined hand displacement.
///
/// `last_head` is the committed head position from the previous tick and
/// `head` is where tracking puts it now, before `combined` is applied.
pub fn clamp_head_motion<W: CollisionWorld + ?Sized>(
    world: &W,
    last_head: Vector3<f32>,
    head: Vector3<f32>,
    combined: Vector3<f32>,
    config: &LocomotionConfig,
) -> HeadClamp {
    let target = head + combined;
    let resolution = resolve_movement(
        world,
        last_head,
        config.head_radius,
        target - last_head,
        config.precision,
        false,
        slip_defaults(config),
    );

    if !resolution.collided() {
        return HeadClamp {
            displacement: combined,
            motion: HeadMotion::Free,
        };
    }

    let blocked = is_path_blocked(
        world,
        last_head,
        target,
        0.0,
        config.head_radius * config.precision * 0.999,
    );
    if blocked {
        engine::locomotion_log!(debug, "head path to {:?} blocked, holding", target);
        return HeadClamp {
            displacement: last_head - head,
            motion: HeadMotion::Held,
        };
    }

    HeadClamp {
        displacement: resolution.end_position - head,
        motion: HeadMotion::Clamped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::{CollisionGroup, PhysicsWorld};
    use cgmath::{InnerSpace, One, Quaternion, vec3, Zero};

    /// A wall whose front face is the plane z = -1.
    fn wall_world() -> PhysicsWorld {
        let mut world = PhysicsWorld::default();
        world.add_static_cuboid(
            vec3(0.0, 0.0, -1.5),
            vec3(5.0, 5.0, 0.5),
            Quaternion::one(),
            CollisionGroup::LOCOMOTION,
            None,
        );
        world
    }

    #[test]
    fn test_opposing_braced_hands_cancel() {
        let combined = combine_contributions(vec3(1.0, 0.0, 0.0), vec3(-1.0, 0.0, 0.0), true);
        assert_eq!(combined, Vector3::zero());
    }

    #[test]
    fn test_single_hand_passes_through() {
        let push = vec3(0.0, 0.3, 0.1);
        assert_eq!(combine_contributions(push, Vector3::zero(), false), push);
        assert_eq!(combine_contributions(Vector3::zero(), push, false), push);
        assert_eq!(
            combine_contributions(Vector3::zero(), Vector3::zero(), false),
            Vector3::zero()
        );
    }

    #[test]
    fn test_braced_hands_average() {
        let combined = combine_contributions(vec3(0.0, 0.2, 0.0), vec3(0.0, 0.4, 0.0), true);
        assert!((combined - vec3(0.0, 0.3, 0.0)).magnitude() < 1.0e-6);
    }

    #[test]
    fn test_engagement_counts_last_tick_contact() {
        assert!(is_engaged(true, false));
        assert!(is_engaged(false, true));
        assert!(!is_engaged(false, false));
    }

    #[test]
    fn test_free_head_takes_the_full_displacement() {
        let world = wall_world();
        let config = LocomotionConfig::default();
        let head = vec3(0.0, 1.6, 0.0);
        let combined = vec3(0.0, 0.3, -0.1);

        let clamp = clamp_head_motion(&world, head, head, combined, &config);

        assert_eq!(clamp.motion, HeadMotion::Free);
        assert_eq!(clamp.displacement, combined);
    }

    #[test]
    fn test_head_never_ends_up_behind_the_wall() {
        let world = wall_world();
        let config = LocomotionConfig::default();

        for (head_z, push) in [(-0.6, -1.0), (-0.8, -0.5), (-0.84, -3.0), (-0.5, -0.4)] {
            let head = vec3(0.1, 1.6, head_z);
            let clamp = clamp_head_motion(&world, head, head, vec3(0.2, 0.0, push), &config);
            assert!(clamp.motion != HeadMotion::Free);

            let committed = head + clamp.displacement;
            assert!(committed.z > -1.0, "head committed to {:?}", committed);
        }
    }

    #[test]
    fn test_blocked_head_holds_its_last_position() {
        let world = wall_world();
        let config = LocomotionConfig::default();
        let last_head = vec3(0.0, 1.6, -0.7);
        // The player leaned toward the wall this tick.
        let head = vec3(0.0, 1.6, -0.75);

        let clamp = clamp_head_motion(&world, last_head, head, vec3(0.0, 0.0, -0.5), &config);

        assert_eq!(clamp.motion, HeadMotion::Held);
        assert!(((head + clamp.displacement) - last_head).magnitude() < 1.0e-6);
    }
}
