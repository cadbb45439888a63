use cgmath::{Quaternion, Rotation, Vector3, Zero};

use crate::{
    error::{LocomotionError, Result},
    util::direction_and_length,
};

/// Recent body velocities in a fixed ring, with their mean kept up to date
/// in O(1) per sample.
///
/// The mean counts every slot, so until the ring has filled up the empty
/// slots pull it toward zero.
#[derive(Clone, Debug)]
pub struct VelocityHistory {
    samples: Vec<Vector3<f32>>,
    index: usize,
    average: Vector3<f32>,
    last_position: Vector3<f32>,
}

impl VelocityHistory {
    pub fn new(capacity: usize, initial_position: Vector3<f32>) -> Result<VelocityHistory> {
        if capacity == 0 {
            return Err(LocomotionError::invalid(
                "velocity_history_size",
                "must hold at least one sample",
            ));
        }

        Ok(VelocityHistory {
            samples: vec![Vector3::zero(); capacity],
            index: 0,
            average: Vector3::zero(),
            last_position: initial_position,
        })
    }

    pub fn capacity(&self) -> usize {
        self.samples.len()
    }

    pub fn average(&self) -> Vector3<f32> {
        self.average
    }

    pub fn last_position(&self) -> Vector3<f32> {
        self.last_position
    }

    /// Samples from oldest to newest.
    pub fn samples(&self) -> impl Iterator<Item = &Vector3<f32>> {
        let (newest, oldest) = self.samples.split_at(self.index + 1);
        oldest.iter().chain(newest.iter())
    }

    /// Push the velocity implied by moving to `position` over `dt` seconds.
    /// Returns the new sample, or `None` if `dt` cannot be divided by.
    pub fn record(&mut self, position: Vector3<f32>, dt: f32) -> Option<Vector3<f32>> {
        if !(dt > 0.0 && dt.is_finite()) {
            return None;
        }

        let capacity = self.samples.len();
        self.index = (self.index + 1) % capacity;
        let evicted = self.samples[self.index];
        let velocity = (position - self.last_position) / dt;

        self.average += (velocity - evicted) / capacity as f32;
        self.samples[self.index] = velocity;
        self.last_position = position;
        Some(velocity)
    }

    /// Re-express every sample and the mean in a rotated frame, e.g. after the
    /// player snaps their heading.
    pub fn rotate(&mut self, rotation: Quaternion<f32>) {
        for sample in self.samples.iter_mut() {
            *sample = rotation.rotate_vector(*sample);
        }
        self.average = rotation.rotate_vector(self.average);
    }

    /// Move the reference position without producing a sample, so that a
    /// teleport or turn is not mistaken for velocity.
    pub fn rebase(&mut self, position: Vector3<f32>) {
        self.last_position = position;
    }
}

/// Turns the recent average body velocity into a launch velocity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReleaseSettings {
    pub velocity_limit: f32,
    pub jump_multiplier: f32,
    pub max_jump_speed: f32,
}

impl ReleaseSettings {
    /// `None` while the average is too slow to launch from.
    pub fn release_velocity(&self, average: Vector3<f32>) -> Option<Vector3<f32>> {
        let (direction, speed) = direction_and_length(average)?;
        if speed <= self.velocity_limit {
            return None;
        }

        if speed * self.jump_multiplier > self.max_jump_speed {
            Some(direction * self.max_jump_speed)
        } else {
            Some(average * self.jump_multiplier)
        }
    }
}
