use cgmath::{InnerSpace, Vector3};

use super::{
    config::LocomotionConfig,
    resolver::{resolve_movement, SlipDefaults},
};
use crate::{
    physics::{query::is_path_blocked, CollisionWorld, SurfaceHit},
    util::direction_and_length,
};

/// Where a controller wants its hand to be, pulled back onto the reach
/// sphere around the head when the arm would have to stretch further.
pub fn desired_hand_position(
    controller: Vector3<f32>,
    head: Vector3<f32>,
    max_arm_length: f32,
) -> Vector3<f32> {
    match direction_and_length(controller - head) {
        Some((direction, distance)) if distance >= max_arm_length => {
            head + direction * max_arm_length
        }
        _ => controller,
    }
}

/// Result of probing one hand before the body moves.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HandProbe {
    /// How far the body should move to keep this hand where it grabbed
    pub contribution: Vector3<f32>,
    pub colliding: bool,
    pub surface: Option<SurfaceHit>,
}

/// Per-hand anchoring state carried from tick to tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LimbContactState {
    /// World position the hand is held at
    pub last_anchored_position: Vector3<f32>,
    /// Whether the hand ended the previous tick against geometry
    pub is_touching: bool,
}

impl LimbContactState {
    pub fn new(anchor: Vector3<f32>) -> LimbContactState {
        LimbContactState {
            last_anchored_position: anchor,
            is_touching: false,
        }
    }

    /// Sweep from the anchor toward `desired`, biased slightly downward so a
    /// resting hand settles onto the surface below it.
    ///
    /// A hand that was already touching keeps its old anchor, so the body
    /// moves by exactly the opposite of the controller's motion.
    pub fn probe<W: CollisionWorld + ?Sized>(
        &self,
        world: &W,
        desired: Vector3<f32>,
        dt: f32,
        config: &LocomotionConfig,
    ) -> HandProbe {
        let gravity_bias = Vector3::new(0.0, -2.0 * config.gravity * dt * dt, 0.0);
        let movement = desired - self.last_anchored_position + gravity_bias;
        let resolution = resolve_movement(
            world,
            self.last_anchored_position,
            config.minimum_raycast_distance,
            movement,
            config.precision,
            true,
            slip_defaults(config),
        );

        if !resolution.collided() {
            return HandProbe {
                contribution: Vector3::new(0.0, 0.0, 0.0),
                colliding: false,
                surface: None,
            };
        }

        let contribution = if self.is_touching {
            self.last_anchored_position - desired
        } else {
            resolution.end_position - desired
        };
        HandProbe {
            contribution,
            colliding: true,
            surface: resolution.surface,
        }
    }

    /// Re-resolve the anchor once the body has moved. `colliding` is what the
    /// probe reported this tick; the hand ends up touching if either pass hit.
    /// Returns the surface the anchor settled against, if any.
    pub fn settle<W: CollisionWorld + ?Sized>(
        &mut self,
        world: &W,
        desired: Vector3<f32>,
        single_hand: bool,
        colliding: bool,
        config: &LocomotionConfig,
    ) -> Option<SurfaceHit> {
        let resolution = resolve_movement(
            world,
            self.last_anchored_position,
            config.minimum_raycast_distance,
            desired - self.last_anchored_position,
            config.precision,
            single_hand,
            slip_defaults(config),
        );

        if resolution.collided() {
            self.last_anchored_position = resolution.end_position;
            self.is_touching = true;
        } else {
            self.last_anchored_position = desired;
            self.is_touching = colliding;
        }
        resolution.surface
    }

    /// Let go of a hand stretched too far from its anchor, provided nothing
    /// stands between the head and where the hand wants to be.
    pub fn try_unstick<W: CollisionWorld + ?Sized>(
        &mut self,
        world: &W,
        desired: Vector3<f32>,
        head: Vector3<f32>,
        config: &LocomotionConfig,
    ) -> bool {
        if !self.is_touching
            || (desired - self.last_anchored_position).magnitude() <= config.unstick_distance
        {
            return false;
        }

        let obstructed = is_path_blocked(
            world,
            head,
            desired,
            config.minimum_raycast_distance * config.precision,
            -config.minimum_raycast_distance,
        );
        if obstructed {
            return false;
        }

        self.last_anchored_position = desired;
        self.is_touching = false;
        true
    }
}

pub(crate) fn slip_defaults(config: &LocomotionConfig) -> SlipDefaults {
    SlipDefaults {
        single_hand: config.single_hand_slip,
        two_hand: config.two_hand_slip,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::{CollisionGroup, PhysicsWorld};
    use cgmath::{One, Quaternion, vec3, Zero};

    const DT: f32 = 1.0 / 72.0;

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

    fn near(a: Vector3<f32>, b: Vector3<f32>, tolerance: f32) -> bool {
        (a - b).magnitude() < tolerance
    }

    #[test]
    fn test_desired_position_is_clamped_to_arm_length() {
        let head = vec3(0.0, 1.6, 0.0);
        let far = desired_hand_position(vec3(0.0, 1.6, -3.0), head, 1.5);
        assert!(near(far, vec3(0.0, 1.6, -1.5), 1.0e-5));

        let close = vec3(0.2, 1.2, -0.4);
        assert_eq!(desired_hand_position(close, head, 1.5), close);
        assert_eq!(desired_hand_position(head, head, 1.5), head);
    }

    #[test]
    fn test_free_hand_contributes_nothing() {
        let world = wall_world();
        let config = LocomotionConfig::default();
        let state = LimbContactState::new(vec3(0.0, 1.0, -0.5));

        let probe = state.probe(&world, vec3(0.1, 1.0, -0.5), DT, &config);
        assert!(!probe.colliding);
        assert_eq!(probe.contribution, Vector3::zero());
    }

    #[test]
    fn test_touching_hand_contribution_opposes_controller_motion() {
        let world = wall_world();
        let config = LocomotionConfig::default();
        let anchor = vec3(0.0, 1.0, -1.0 + config.minimum_raycast_distance);
        let state = LimbContactState {
            last_anchored_position: anchor,
            is_touching: true,
        };

        let delta = vec3(0.1, -0.05, -0.2);
        let probe = state.probe(&world, anchor + delta, DT, &config);

        assert!(probe.colliding);
        assert!(near(probe.contribution, -delta, 1.0e-6));
    }

    #[test]
    fn test_new_contact_pushes_back_from_the_surface() {
        let world = wall_world();
        let config = LocomotionConfig::default();
        let state = LimbContactState::new(vec3(0.0, 1.0, -0.8));
        let desired = vec3(0.0, 1.0, -1.2);

        let probe = state.probe(&world, desired, DT, &config);

        assert!(probe.colliding);
        // The body moves back by roughly how far the hand went into the wall.
        let expected = 1.2 - 1.0 + config.minimum_raycast_distance;
        assert!((probe.contribution.z - expected).abs() < 0.01);
    }

    #[test]
    fn test_settle_anchors_in_front_of_the_wall() {
        let world = wall_world();
        let config = LocomotionConfig::default();
        let mut state = LimbContactState::new(vec3(0.0, 1.0, -0.8));

        let surface = state.settle(&world, vec3(0.0, 1.0, -1.3), true, false, &config);

        assert!(state.is_touching);
        assert!(surface.is_some());
        assert!(state.last_anchored_position.z > -1.0);
    }

    #[test]
    fn test_settle_in_free_air_follows_the_controller() {
        let world = wall_world();
        let config = LocomotionConfig::default();
        let mut state = LimbContactState::new(vec3(0.0, 1.0, 0.0));
        let desired = vec3(0.3, 1.2, -0.2);

        assert!(state.settle(&world, desired, true, false, &config).is_none());
        assert!(!state.is_touching);
        assert_eq!(state.last_anchored_position, desired);

        state.settle(&world, desired, true, true, &config);
        assert!(state.is_touching);
    }

    #[test]
    fn test_overstretched_hand_lets_go() {
        let world = wall_world();
        let config = LocomotionConfig::default();
        let mut state = LimbContactState {
            last_anchored_position: vec3(0.0, 1.0, -0.95),
            is_touching: true,
        };
        let head = vec3(0.0, 1.6, 0.5);
        let desired = vec3(0.0, 1.0, 1.0);

        assert!(state.try_unstick(&world, desired, head, &config));
        assert!(!state.is_touching);
        assert_eq!(state.last_anchored_position, desired);
    }

    #[test]
    fn test_hand_stays_stuck_when_the_head_cannot_see_it() {
        let mut world = wall_world();
        // A divider between the head and where the hand wants to be.
        world.add_static_cuboid(
            vec3(1.0, 1.0, 0.0),
            vec3(0.05, 2.0, 2.0),
            Quaternion::one(),
            CollisionGroup::LOCOMOTION,
            None,
        );
        let config = LocomotionConfig::default();
        let anchor = vec3(0.0, 1.0, -0.95);
        let mut state = LimbContactState {
            last_anchored_position: anchor,
            is_touching: true,
        };

        let released = state.try_unstick(&world, vec3(1.5, 1.0, 0.0), vec3(0.0, 1.6, 0.0), &config);

        assert!(!released);
        assert!(state.is_touching);
        assert_eq!(state.last_anchored_position, anchor);
    }

    #[test]
    fn test_small_stretch_does_not_unstick() {
        let world = wall_world();
        let config = LocomotionConfig::default();
        let mut state = LimbContactState {
            last_anchored_position: vec3(0.0, 1.0, -0.95),
            is_touching: true,
        };
        assert!(!state.try_unstick(&world, vec3(0.0, 1.0, -0.5), vec3(0.0, 1.6, 0.0), &config));
        assert!(state.is_touching);
    }
}
