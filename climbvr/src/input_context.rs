use cgmath::{One, Quaternion, Rotation, Vector3, Zero};

use crate::vr_config::Handedness;

/// One tracked device for one tick, in tracking space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrackedDevice {
    pub position: Vector3<f32>,
    pub rotation: Quaternion<f32>,
    /// Linear velocity reported by the runtime, used for impact feedback
    pub velocity: Vector3<f32>,
    pub is_tracked: bool,
}

impl TrackedDevice {
    pub fn at(position: Vector3<f32>) -> TrackedDevice {
        TrackedDevice {
            position,
            ..TrackedDevice::default()
        }
    }

    pub fn with_rotation(self, rotation: Quaternion<f32>) -> TrackedDevice {
        TrackedDevice { rotation, ..self }
    }

    pub fn untracked() -> TrackedDevice {
        TrackedDevice {
            is_tracked: false,
            ..TrackedDevice::default()
        }
    }

    /// Position of a point fixed to the device, e.g. the palm of a controller.
    pub fn position_with_offset(&self, offset: Vector3<f32>) -> Vector3<f32> {
        self.position + self.rotation.rotate_vector(offset)
    }
}

impl Default for TrackedDevice {
    fn default() -> Self {
        TrackedDevice {
            position: Vector3::zero(),
            rotation: Quaternion::one(),
            velocity: Vector3::zero(),
            is_tracked: true,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InputContext {
    pub head: TrackedDevice,
    pub left_hand: TrackedDevice,
    pub right_hand: TrackedDevice,
}

impl InputContext {
    pub fn hand(&self, handedness: Handedness) -> &TrackedDevice {
        match handedness {
            Handedness::Left => &self.left_hand,
            Handedness::Right => &self.right_hand,
        }
    }

    pub fn all_tracked(&self) -> bool {
        self.head.is_tracked && self.left_hand.is_tracked && self.right_hand.is_tracked
    }
}

impl Default for InputContext {
    fn default() -> Self {
        InputContext {
            head: TrackedDevice::at(Vector3::new(0.0, 1.6, 0.0)),
            left_hand: TrackedDevice::at(Vector3::new(-0.25, 1.1, -0.2)),
            right_hand: TrackedDevice::at(Vector3::new(0.25, 1.1, -0.2)),
        }
    }
}
