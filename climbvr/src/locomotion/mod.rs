// Hand-driven climbing locomotion
//
// The player moves by grabbing world geometry and pushing or pulling against
// it. Hands are swept toward their controllers; a blocked hand stays put and
// the body moves instead.

pub mod aggregator;
pub mod climb_system;
pub mod config;
pub mod contact;
pub mod resolver;
pub mod velocity_history;

pub use aggregator::{HeadClamp, HeadMotion};
pub use climb_system::{ClimbLocomotion, HandFollower, LocomotionEffect, TickOutcome};
pub use config::LocomotionConfig;
pub use contact::LimbContactState;
pub use resolver::{resolve_movement, Resolution, ResolvePass, SlipDefaults};
pub use velocity_history::{ReleaseSettings, VelocityHistory};
