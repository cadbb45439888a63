use std::path::Path;

use cgmath::{Vector3, Zero};
use serde::{Deserialize, Serialize};

use crate::{
    error::{LocomotionError, Result},
    physics::CollisionGroup,
    vr_config::Handedness,
};

/// Tunables for hand-driven climbing locomotion. Distances are metres,
/// speeds metres per second.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocomotionConfig {
    /// Samples kept for the release velocity average
    pub velocity_history_size: usize,
    /// Hands further than this from the head are pulled back onto the reach sphere
    pub max_arm_length: f32,
    /// Stretch at which a stuck hand lets go
    pub unstick_distance: f32,
    /// Average speed below which letting go does not launch the player
    pub velocity_limit: f32,
    pub max_jump_speed: f32,
    pub jump_multiplier: f32,
    /// Radius of the sphere that stands in for each hand
    pub minimum_raycast_distance: f32,
    /// Slip used when both hands are engaged
    pub two_hand_slip: f32,
    /// Slip used when a single hand is engaged; close to fully sticky
    pub single_hand_slip: f32,
    /// Shrink factor applied to swept spheres, in (0, 1]
    pub precision: f32,
    pub head_radius: f32,
    /// Drives the small downward bias that settles hands onto surfaces
    pub gravity: f32,
    pub left_hand_offset: Vector3<f32>,
    pub right_hand_offset: Vector3<f32>,
    /// Bits of [`CollisionGroup`] that locomotion collides with
    pub locomotion_layers: u32,
}

impl Default for LocomotionConfig {
    fn default() -> Self {
        LocomotionConfig {
            velocity_history_size: 8,
            max_arm_length: 1.5,
            unstick_distance: 1.0,
            velocity_limit: 0.4,
            max_jump_speed: 6.5,
            jump_multiplier: 1.1,
            minimum_raycast_distance: 0.05,
            two_hand_slip: 0.03,
            single_hand_slip: 0.001,
            precision: 0.995,
            head_radius: 0.15,
            gravity: 9.8,
            left_hand_offset: Vector3::zero(),
            right_hand_offset: Vector3::zero(),
            locomotion_layers: CollisionGroup::LOCOMOTION.bits(),
        }
    }
}

impl LocomotionConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: LocomotionConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| LocomotionError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&contents)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn locomotion_mask(&self) -> CollisionGroup {
        CollisionGroup::from_bits_truncate(self.locomotion_layers)
    }

    pub fn hand_offset(&self, hand: Handedness) -> Vector3<f32> {
        match hand {
            Handedness::Left => self.left_hand_offset,
            Handedness::Right => self.right_hand_offset,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.velocity_history_size == 0 {
            return Err(LocomotionError::invalid(
                "velocity_history_size",
                "must hold at least one sample",
            ));
        }
        if !(self.precision > 0.0 && self.precision <= 1.0) {
            return Err(LocomotionError::invalid(
                "precision",
                format!("{} is outside (0, 1]", self.precision),
            ));
        }

        let positive = [
            ("max_arm_length", self.max_arm_length),
            ("minimum_raycast_distance", self.minimum_raycast_distance),
            ("head_radius", self.head_radius),
        ];
        for (field, value) in positive {
            if !(value > 0.0 && value.is_finite()) {
                return Err(LocomotionError::invalid(field, format!("{} must be positive", value)));
            }
        }

        let non_negative = [
            ("unstick_distance", self.unstick_distance),
            ("velocity_limit", self.velocity_limit),
            ("max_jump_speed", self.max_jump_speed),
            ("jump_multiplier", self.jump_multiplier),
            ("gravity", self.gravity),
        ];
        for (field, value) in non_negative {
            if !(value >= 0.0 && value.is_finite()) {
                return Err(LocomotionError::invalid(
                    field,
                    format!("{} must be zero or greater", value),
                ));
            }
        }

        for (field, value) in [
            ("two_hand_slip", self.two_hand_slip),
            ("single_hand_slip", self.single_hand_slip),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(LocomotionError::invalid(field, format!("{} is outside [0, 1]", value)));
            }
        }

        if self.locomotion_mask().is_empty() {
            return Err(LocomotionError::invalid(
                "locomotion_layers",
                "no known collision layer selected",
            ));
        }

        Ok(())
    }
}
