use cgmath::{InnerSpace, Quaternion, Vector3, Zero};

use super::{
    aggregator::{clamp_head_motion, combine_contributions, is_engaged, HeadMotion},
    config::LocomotionConfig,
    contact::{desired_hand_position, slip_defaults, HandProbe, LimbContactState},
    resolver::resolve_movement,
    velocity_history::{ReleaseSettings, VelocityHistory},
};
use crate::{
    error::Result,
    input_context::{InputContext, TrackedDevice},
    physics::{CollisionWorld, SurfaceHit},
    player::PlayerBody,
    util::{heading_of, is_near_zero, yaw_rotation},
    vr_config::Handedness,
};

/// Things that happened during a tick that the host may want to react to.
#[derive(Clone, Debug, PartialEq)]
pub enum LocomotionEffect {
    /// A hand started touching geometry. `contact_speed` is the controller's
    /// own speed and `material` the touched surface's, for impact feedback.
    HandTouched {
        hand: Handedness,
        contact_speed: f32,
        material: Option<u32>,
    },
    /// A hand stopped touching geometry.
    HandReleased { hand: Handedness, release_speed: f32 },
    /// The last hand let go while the body was moving fast enough to fly.
    Launched { velocity: Vector3<f32> },
    /// Some device was not tracked; the tick did nothing.
    TrackingLost,
}

/// Rendered pose of a hand: pinned to its anchor, turned like the controller.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HandFollower {
    pub position: Vector3<f32>,
    pub rotation: Quaternion<f32>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TickOutcome {
    /// Displacement committed to the body this tick
    pub displacement: Vector3<f32>,
    pub head_motion: HeadMotion,
    pub effects: Vec<LocomotionEffect>,
}

impl TickOutcome {
    fn idle(effects: Vec<LocomotionEffect>) -> TickOutcome {
        TickOutcome {
            displacement: Vector3::zero(),
            head_motion: HeadMotion::Free,
            effects,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct HandTick {
    probe: HandProbe,
    was_touching: bool,
}

/// Grab-and-push locomotion for a tracked head and two hands.
///
/// Each tick the hands are swept toward their controllers. A hand that hits
/// something holds still and the body moves instead. The head is kept out of
/// geometry, and the recent body velocity becomes a launch when the last
/// hand lets go.
pub struct ClimbLocomotion {
    config: LocomotionConfig,
    release: ReleaseSettings,
    body: PlayerBody,
    left: LimbContactState,
    right: LimbContactState,
    left_follower: HandFollower,
    right_follower: HandFollower,
    last_head_position: Vector3<f32>,
    history: VelocityHistory,
    movement_disabled: bool,
    tracking_lost: bool,
}

impl ClimbLocomotion {
    pub fn new(
        config: LocomotionConfig,
        body: PlayerBody,
        input: &InputContext,
    ) -> Result<ClimbLocomotion> {
        config.validate()?;

        let history = VelocityHistory::new(config.velocity_history_size, body.position)?;
        let release = ReleaseSettings {
            velocity_limit: config.velocity_limit,
            jump_multiplier: config.jump_multiplier,
            max_jump_speed: config.max_jump_speed,
        };
        let head = body.local_to_world(input.head.position);
        let follower = |hand: Handedness| {
            let device = input.hand(hand);
            HandFollower {
                position: body.local_to_world(device.position_with_offset(config.hand_offset(hand))),
                rotation: body.rotation_to_world(device.rotation),
            }
        };
        let left_follower = follower(Handedness::Left);
        let right_follower = follower(Handedness::Right);

        Ok(ClimbLocomotion {
            release,
            body,
            left: LimbContactState::new(left_follower.position),
            right: LimbContactState::new(right_follower.position),
            left_follower,
            right_follower,
            last_head_position: head,
            history,
            movement_disabled: false,
            tracking_lost: false,
            config,
        })
    }

    pub fn with_default_config(body: PlayerBody, input: &InputContext) -> Result<ClimbLocomotion> {
        Self::new(LocomotionConfig::default(), body, input)
    }

    /// Advance one frame of hand-driven movement.
    pub fn tick<W: CollisionWorld + ?Sized>(
        &mut self,
        world: &W,
        input: &InputContext,
        dt: f32,
    ) -> TickOutcome {
        if !(dt > 0.0 && dt.is_finite()) {
            return TickOutcome::idle(Vec::new());
        }
        if !input.all_tracked() {
            if !self.tracking_lost {
                engine::input_log!(warn, "tracking lost, holding the player in place");
            }
            self.tracking_lost = true;
            return TickOutcome::idle(vec![LocomotionEffect::TrackingLost]);
        }
        if self.tracking_lost {
            engine::input_log!(info, "tracking restored");
            self.tracking_lost = false;
        }

        if let Some(heading) = heading_of(self.body.rotation_to_world(input.head.rotation)) {
            self.body.body_heading = heading;
        }

        // Probe both hands against the world before anything moves.
        let head = self.body.local_to_world(input.head.position);
        let left = self.probe_hand(world, input, Handedness::Left, head, dt);
        let right = self.probe_hand(world, input, Handedness::Right, head, dt);
        if left.probe.colliding || right.probe.colliding {
            self.body.velocity = Vector3::zero();
        }

        let both_engaged = is_engaged(left.probe.colliding, left.was_touching)
            && is_engaged(right.probe.colliding, right.was_touching);
        let combined =
            combine_contributions(left.probe.contribution, right.probe.contribution, both_engaged);
        let clamp = clamp_head_motion(world, self.last_head_position, head, combined, &self.config);

        if !is_near_zero(clamp.displacement) {
            self.body.position += clamp.displacement;
        }
        let head = self.body.local_to_world(input.head.position);
        self.last_head_position = head;

        let mut contact_surfaces: [Option<SurfaceHit>; 2] = [None; 2];
        for (slot, (hand, hand_tick)) in contact_surfaces
            .iter_mut()
            .zip([(Handedness::Left, left), (Handedness::Right, right)])
        {
            let desired = self.desired_position(input, hand, head);
            let config = &self.config;
            let state = match hand {
                Handedness::Left => &mut self.left,
                Handedness::Right => &mut self.right,
            };
            *slot = state
                .settle(world, desired, !both_engaged, hand_tick.probe.colliding, config)
                .or(hand_tick.probe.surface);
        }

        self.history.record(self.body.position, dt);

        let any_touching = self.left.is_touching || self.right.is_touching;
        if any_touching && !self.movement_disabled {
            if let Some(velocity) = self.release.release_velocity(self.history.average()) {
                self.body.velocity = velocity;
            }
        }

        for hand in Handedness::BOTH {
            let desired = self.desired_position(input, hand, head);
            let config = &self.config;
            let state = match hand {
                Handedness::Left => &mut self.left,
                Handedness::Right => &mut self.right,
            };
            if state.try_unstick(world, desired, head, config) {
                engine::locomotion_log!(debug, "{:?} hand overstretched, unstuck", hand);
            }
        }

        self.update_followers(input);

        let effects = self.transitions(
            input,
            [left.was_touching, right.was_touching],
            contact_surfaces,
        );
        TickOutcome {
            displacement: clamp.displacement,
            head_motion: clamp.motion,
            effects,
        }
    }

    /// Carry the body along its velocity while no hand holds it, falling
    /// under gravity. Both the head and a sphere of the same size resting at
    /// the body's feet stop against geometry, which also kills the velocity.
    pub fn fixed_update<W: CollisionWorld + ?Sized>(&mut self, world: &W, dt: f32) -> Vector3<f32> {
        if !(dt > 0.0 && dt.is_finite()) || self.is_any_hand_touching() || self.tracking_lost {
            return Vector3::zero();
        }

        self.body.velocity.y -= self.config.gravity * dt;
        let mut displacement = self.body.velocity * dt;
        let mut landed = false;

        let feet = self.body.position + Vector3::new(0.0, self.config.head_radius, 0.0);
        for origin in [self.last_head_position, feet] {
            let resolution = resolve_movement(
                world,
                origin,
                self.config.head_radius,
                displacement,
                self.config.precision,
                false,
                slip_defaults(&self.config),
            );
            if resolution.collided() {
                displacement = resolution.end_position - origin;
                landed = true;
            }
        }

        if landed {
            engine::locomotion_log!(trace, "ballistic contact, stopping");
            self.body.velocity = Vector3::zero();
        }
        if !is_near_zero(displacement) {
            self.body.position += displacement;
            self.last_head_position += displacement;
        }
        displacement
    }

    /// Yaw the player around their head, carrying pending momentum along.
    pub fn turn(&mut self, degrees: f32) {
        let rotation = yaw_rotation(degrees);
        self.body.rotate_about(self.last_head_position, rotation);
        self.history.rotate(rotation);
        self.history.rebase(self.body.position);
    }

    pub fn is_hand_touching(&self, hand: Handedness) -> bool {
        self.contact(hand).is_touching
    }

    pub fn is_any_hand_touching(&self) -> bool {
        self.left.is_touching || self.right.is_touching
    }

    pub fn contact(&self, hand: Handedness) -> &LimbContactState {
        match hand {
            Handedness::Left => &self.left,
            Handedness::Right => &self.right,
        }
    }

    pub fn hand_follower(&self, hand: Handedness) -> &HandFollower {
        match hand {
            Handedness::Left => &self.left_follower,
            Handedness::Right => &self.right_follower,
        }
    }

    pub fn body(&self) -> &PlayerBody {
        &self.body
    }

    pub fn head_position(&self) -> Vector3<f32> {
        self.last_head_position
    }

    pub fn velocity_history(&self) -> &VelocityHistory {
        &self.history
    }

    pub fn config(&self) -> &LocomotionConfig {
        &self.config
    }

    /// While disabled, contact no longer turns recent motion into a launch.
    pub fn set_movement_disabled(&mut self, disabled: bool) {
        self.movement_disabled = disabled;
    }

    pub fn movement_disabled(&self) -> bool {
        self.movement_disabled
    }

    fn desired_position(
        &self,
        input: &InputContext,
        hand: Handedness,
        head: Vector3<f32>,
    ) -> Vector3<f32> {
        let controller = input
            .hand(hand)
            .position_with_offset(self.config.hand_offset(hand));
        desired_hand_position(
            self.body.local_to_world(controller),
            head,
            self.config.max_arm_length,
        )
    }

    fn probe_hand<W: CollisionWorld + ?Sized>(
        &self,
        world: &W,
        input: &InputContext,
        hand: Handedness,
        head: Vector3<f32>,
        dt: f32,
    ) -> HandTick {
        let desired = self.desired_position(input, hand, head);
        let state = self.contact(hand);
        HandTick {
            probe: state.probe(world, desired, dt, &self.config),
            was_touching: state.is_touching,
        }
    }

    fn update_followers(&mut self, input: &InputContext) {
        let follow = |state: &LimbContactState, device: &TrackedDevice| HandFollower {
            position: state.last_anchored_position,
            rotation: self.body.rotation_to_world(device.rotation),
        };
        self.left_follower = follow(&self.left, &input.left_hand);
        self.right_follower = follow(&self.right, &input.right_hand);
    }

    fn transitions(
        &self,
        input: &InputContext,
        touching_before: [bool; 2],
        contact_surfaces: [Option<SurfaceHit>; 2],
    ) -> Vec<LocomotionEffect> {
        let mut effects = Vec::new();
        let release_speed = self.body.velocity.magnitude();

        for ((hand, was_touching), surface) in Handedness::BOTH
            .into_iter()
            .zip(touching_before)
            .zip(contact_surfaces)
        {
            let is_touching = self.is_hand_touching(hand);
            if is_touching && !was_touching {
                let contact_speed = input.hand(hand).velocity.magnitude();
                engine::locomotion_log!(debug, "{:?} hand touched at {:.2} m/s", hand, contact_speed);
                effects.push(LocomotionEffect::HandTouched {
                    hand,
                    contact_speed,
                    material: surface.and_then(|hit| hit.material),
                });
            } else if was_touching && !is_touching {
                engine::locomotion_log!(debug, "{:?} hand released at {:.2} m/s", hand, release_speed);
                effects.push(LocomotionEffect::HandReleased {
                    hand,
                    release_speed,
                });
            }
        }

        let was_holding = touching_before.iter().any(|touching| *touching);
        if was_holding && !self.is_any_hand_touching() && !is_near_zero(self.body.velocity) {
            engine::locomotion_log!(info, "launched at {:?}", self.body.velocity);
            effects.push(LocomotionEffect::Launched {
                velocity: self.body.velocity,
            });
        }

        effects
    }
}
