// Scripted tracking sessions
//
// Each scenario pairs a small level with a player that moves the head and
// hands the way a person would, in tracking space, so the whole locomotion
// loop can run without a headset.

use cgmath::{vec3, One, Quaternion, Vector3};
use clap::ValueEnum;
use climbvr::{
    ClimbLocomotion, CollisionGroup, Handedness, InputContext, PhysicsWorld, PlayerBody,
    Surface, TrackedDevice,
};

pub const FLOOR_MATERIAL: u32 = 1;
pub const LEDGE_MATERIAL: u32 = 2;

pub const LEDGE_SPACING: f32 = 0.35;
pub const LEDGE_COUNT: usize = 8;
const FIRST_LEDGE_TOP: f32 = 1.2;
const LEDGE_FRONT_Z: f32 = -0.35;
const GRIP_Z: f32 = -0.47;
const CLEAR_Z: f32 = -0.15;

const CLIMB_HEAD_HEIGHT: f32 = 1.5;
const CLIMB_CYCLE: u32 = 60;

const CRAWL_HEAD_HEIGHT: f32 = 1.2;
const STROKE: u32 = 40;
const TURN_DEGREES: f32 = 30.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ScenarioKind {
    /// Pull up a ladder of ledges one hand over the other, then let go
    Climb,
    /// Crouch and paddle along the floor, one hand after the other
    Traverse,
    /// Paddle along the floor with a snap turn between strokes
    Turn,
}

pub struct Scenario {
    pub world: PhysicsWorld,
    pub body: PlayerBody,
    pub player: ScriptedPlayer,
}

impl Scenario {
    /// Build the level for `kind`. Queries only see the layers in `locomotion_mask`.
    pub fn new(kind: ScenarioKind, locomotion_mask: CollisionGroup) -> Scenario {
        let mut world = PhysicsWorld::new(locomotion_mask);
        world.add_static_cuboid(
            vec3(0.0, -0.5, 0.0),
            vec3(50.0, 0.5, 50.0),
            Quaternion::one(),
            CollisionGroup::LOCOMOTION,
            Some(Surface::default().with_material(FLOOR_MATERIAL)),
        );
        // A prop the hands pass through; only locomotion layers are climbable.
        world.add_static_ball(vec3(1.5, 0.5, -1.0), 0.5, CollisionGroup::DYNAMIC, None);

        if kind == ScenarioKind::Climb {
            for top in ledge_tops() {
                world.add_static_cuboid(
                    vec3(0.0, top - 0.025, LEDGE_FRONT_Z - 0.125),
                    vec3(1.0, 0.025, 0.125),
                    Quaternion::one(),
                    CollisionGroup::LOCOMOTION,
                    Some(Surface::with_slip(0.0).with_material(LEDGE_MATERIAL)),
                );
            }
        }

        Scenario {
            world,
            body: PlayerBody::default(),
            player: ScriptedPlayer::new(kind),
        }
    }
}

fn ledge_tops() -> impl Iterator<Item = f32> {
    (0..LEDGE_COUNT).map(|i| FIRST_LEDGE_TOP + i as f32 * LEDGE_SPACING)
}

fn lerp(from: Vector3<f32>, to: Vector3<f32>, t: f32) -> Vector3<f32> {
    from + (to - from) * t.clamp(0.0, 1.0)
}

/// Move from `from` to `to` over ticks `[start, end)` of a cycle.
fn segment(tick: u32, start: u32, end: u32, from: Vector3<f32>, to: Vector3<f32>) -> Vector3<f32> {
    let t = (tick.saturating_sub(start)) as f32 / (end - start) as f32;
    lerp(from, to, t)
}

#[derive(Clone, Copy, Debug)]
struct ClimbPlan {
    active: Handedness,
    active_start: Vector3<f32>,
    passive_start: Vector3<f32>,
    grip_height: f32,
}

/// A pretend player: produces the tracked poses for each tick.
pub struct ScriptedPlayer {
    kind: ScenarioKind,
    head: Vector3<f32>,
    left: Vector3<f32>,
    right: Vector3<f32>,
    previous: Option<InputContext>,
    plan: Option<ClimbPlan>,
    finished: bool,
}

impl ScriptedPlayer {
    pub fn new(kind: ScenarioKind) -> ScriptedPlayer {
        match kind {
            ScenarioKind::Climb => ScriptedPlayer {
                kind,
                head: vec3(0.0, CLIMB_HEAD_HEIGHT, 0.0),
                left: vec3(-0.2, 0.9, CLEAR_Z),
                // Already resting on the first ledge.
                right: vec3(0.2, FIRST_LEDGE_TOP + 0.051, GRIP_Z),
                previous: None,
                plan: None,
                finished: false,
            },
            ScenarioKind::Traverse | ScenarioKind::Turn => ScriptedPlayer {
                kind,
                head: vec3(0.0, CRAWL_HEAD_HEIGHT, 0.0),
                left: crawl_rest(Handedness::Left),
                right: crawl_rest(Handedness::Right),
                previous: None,
                plan: None,
                finished: false,
            },
        }
    }

    pub fn initial_input(&self) -> InputContext {
        self.input_from_poses(None, 1.0)
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Snap turn requested before this tick, if any.
    pub fn turn_at(&self, tick: u32) -> Option<f32> {
        match self.kind {
            ScenarioKind::Turn if tick > 0 && tick % (STROKE * 2) == STROKE - 4 => Some(TURN_DEGREES),
            _ => None,
        }
    }

    pub fn next_input(&mut self, tick: u32, locomotion: &ClimbLocomotion, dt: f32) -> InputContext {
        match self.kind {
            ScenarioKind::Climb => self.climb(tick, locomotion),
            ScenarioKind::Traverse | ScenarioKind::Turn => self.crawl(tick),
        }

        let input = self.input_from_poses(self.previous.as_ref(), dt);
        self.previous = Some(input);
        input
    }

    fn input_from_poses(&self, previous: Option<&InputContext>, dt: f32) -> InputContext {
        let device = |position: Vector3<f32>, before: Option<&TrackedDevice>| {
            let mut device = TrackedDevice::at(position);
            if let Some(before) = before {
                device.velocity = (position - before.position) / dt;
            }
            device
        };
        InputContext {
            head: device(self.head, previous.map(|p| &p.head)),
            left_hand: device(self.left, previous.map(|p| &p.left_hand)),
            right_hand: device(self.right, previous.map(|p| &p.right_hand)),
        }
    }

    fn hand_mut(&mut self, hand: Handedness) -> &mut Vector3<f32> {
        match hand {
            Handedness::Left => &mut self.left,
            Handedness::Right => &mut self.right,
        }
    }

    fn hand(&self, hand: Handedness) -> Vector3<f32> {
        match hand {
            Handedness::Left => self.left,
            Handedness::Right => self.right,
        }
    }

    fn climb(&mut self, tick: u32, locomotion: &ClimbLocomotion) {
        if self.finished {
            return;
        }

        let phase = tick % CLIMB_CYCLE;
        if phase == 0 {
            let active = match self.plan {
                Some(plan) => plan.active.other(),
                None => Handedness::Left,
            };
            let body_y = locomotion.body().position.y;
            let head_y = body_y + CLIMB_HEAD_HEIGHT;
            let next_ledge = ledge_tops().find(|top| *top >= head_y - 0.1 && *top <= head_y + 0.6);

            match next_ledge {
                Some(top) => {
                    self.plan = Some(ClimbPlan {
                        active,
                        active_start: self.hand(active),
                        passive_start: self.hand(active.other()),
                        grip_height: top - body_y,
                    });
                }
                None => {
                    // Up and back off the ledge, so neither hand drags on it.
                    engine::locomotion_log!(info, "top of the wall reached, letting go");
                    self.finished = true;
                    self.left = vec3(-0.2, self.left.y + 0.1, CLEAR_Z);
                    self.right = vec3(0.2, self.right.y + 0.1, CLEAR_Z);
                    return;
                }
            }
        }

        let Some(plan) = self.plan else {
            return;
        };
        let x = match plan.active {
            Handedness::Left => -0.2,
            Handedness::Right => 0.2,
        };

        // Reach behind the ledges, up, over the ledge, then pull down on it.
        let start = plan.active_start;
        let clear = vec3(x, start.y, CLEAR_Z);
        let raised = vec3(x, plan.grip_height + 0.1, CLEAR_Z);
        let over = vec3(x, plan.grip_height + 0.1, GRIP_Z);
        let pulled = vec3(x, plan.grip_height - LEDGE_SPACING - 0.05, GRIP_Z);
        let active = match phase {
            0..=7 => segment(phase, 0, 8, start, clear),
            8..=19 => segment(phase, 8, 20, clear, raised),
            20..=27 => segment(phase, 20, 28, raised, over),
            28..=55 => segment(phase, 28, 56, over, pulled),
            _ => pulled,
        };
        *self.hand_mut(plan.active) = active;

        // The other hand holds on until the pull has lifted it off its
        // ledge, then draws straight back. The body is still rising, so it
        // has to be out from under the next ledge before it gets there.
        let held = plan.passive_start;
        let stowed = vec3(held.x, held.y, CLEAR_Z);
        let passive = match phase {
            0..=35 => held,
            36..=39 => segment(phase, 36, 40, held, stowed),
            _ => stowed,
        };
        *self.hand_mut(plan.active.other()) = passive;
    }

    fn crawl(&mut self, tick: u32) {
        let phase = tick % STROKE;
        let active = if (tick / STROKE) % 2 == 0 {
            Handedness::Left
        } else {
            Handedness::Right
        };
        let rest = crawl_rest(active);
        let planted = vec3(rest.x, 0.045, -0.4);
        let pushed = vec3(rest.x, 0.045, 0.3);

        let pose = match phase {
            0..=7 => segment(phase, 0, 8, rest, planted),
            8..=27 => segment(phase, 8, 28, planted, pushed),
            _ => segment(phase, 28, STROKE, pushed, rest),
        };
        *self.hand_mut(active) = pose;
        *self.hand_mut(active.other()) = crawl_rest(active.other());
    }
}

fn crawl_rest(hand: Handedness) -> Vector3<f32> {
    match hand {
        Handedness::Left => vec3(-0.25, 0.5, -0.1),
        Handedness::Right => vec3(0.25, 0.5, -0.1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::InnerSpace;
    use climbvr::CollisionWorld;

    #[test]
    fn test_climb_world_has_the_ledges() {
        let scenario = Scenario::new(ScenarioKind::Climb, CollisionGroup::LOCOMOTION);
        // Floor, prop, ledges.
        assert_eq!(scenario.world.collider_count(), 2 + LEDGE_COUNT);

        let down = vec3(0.0, -1.0, 0.0);
        let hit = scenario
            .world
            .raycast(vec3(0.0, 5.0, GRIP_Z), down, 5.0)
            .unwrap();
        let highest = FIRST_LEDGE_TOP + (LEDGE_COUNT - 1) as f32 * LEDGE_SPACING;
        assert!((hit.point.y - highest).abs() < 1.0e-3);
        assert_eq!(hit.slip_percentage, Some(0.0));
        assert_eq!(hit.material, Some(LEDGE_MATERIAL));
    }

    #[test]
    fn test_climb_scales_the_wall_and_lets_go() {
        let Scenario {
            world,
            body,
            mut player,
        } = Scenario::new(ScenarioKind::Climb, CollisionGroup::LOCOMOTION);
        let mut locomotion =
            ClimbLocomotion::with_default_config(body, &player.initial_input()).unwrap();
        let dt = 1.0 / 72.0;
        let mut peak = 0.0f32;
        let mut launched = false;

        for tick in 0..600 {
            let input = player.next_input(tick, &locomotion, dt);
            let outcome = locomotion.tick(&world, &input, dt);
            locomotion.fixed_update(&world, dt);
            peak = peak.max(locomotion.body().position.y);
            launched |= outcome
                .effects
                .iter()
                .any(|effect| matches!(effect, climbvr::LocomotionEffect::Launched { .. }));
        }

        assert!(player.is_finished());
        assert!(peak > 3.0 * LEDGE_SPACING, "only reached {}", peak);
        assert!(launched);
        assert!(!locomotion.is_any_hand_touching());
    }

    #[test]
    fn test_scripted_hands_report_velocity() {
        let scenario = Scenario::new(ScenarioKind::Traverse, CollisionGroup::LOCOMOTION);
        let mut player = scenario.player;
        let locomotion =
            ClimbLocomotion::with_default_config(scenario.body, &player.initial_input()).unwrap();

        player.next_input(0, &locomotion, 1.0 / 72.0);
        let input = player.next_input(1, &locomotion, 1.0 / 72.0);

        assert!(input.all_tracked());
        assert!(input.left_hand.velocity.magnitude() > 0.0);
        assert_eq!(input.right_hand.velocity.magnitude(), 0.0);
    }

    #[test]
    fn test_turns_only_in_the_turn_scenario() {
        let turning = ScriptedPlayer::new(ScenarioKind::Turn);
        let crawling = ScriptedPlayer::new(ScenarioKind::Traverse);
        let turns: Vec<u32> = (0..400).filter(|t| turning.turn_at(*t).is_some()).collect();

        assert!(!turns.is_empty());
        assert!((0..400).all(|t| crawling.turn_at(t).is_none()));
    }
}
