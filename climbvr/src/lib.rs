pub mod error;
pub mod feedback;
pub mod input_context;
pub mod locomotion;
pub mod physics;
pub mod player;
pub mod util;
pub mod vr_config;

pub use error::{LocomotionError, Result};
pub use input_context::{InputContext, TrackedDevice};
pub use locomotion::{ClimbLocomotion, LocomotionConfig, LocomotionEffect, TickOutcome};
pub use physics::{CollisionGroup, CollisionWorld, PhysicsWorld, Surface, SurfaceHit};
pub use player::PlayerBody;
pub use vr_config::Handedness;
