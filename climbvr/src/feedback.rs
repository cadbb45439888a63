//! Maps hand impacts to audio volume and controller rumble.
//!
//! Playback itself belongs to the host; this only decides how strong the
//! response should be.

use cgmath::InnerSpace;
use serde::{Deserialize, Serialize};

use crate::{input_context::TrackedDevice, vr_config::Handedness};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImpactFeedbackConfig {
    pub min_velocity: f32,
    pub max_velocity: f32,
    pub default_volume: f32,
    pub max_volume: f32,
    pub default_haptic_strength: f32,
    pub max_haptic_strength: f32,
    /// Seconds
    pub haptic_duration: f32,
    /// Surface materials that answer an impact. Empty means every surface does.
    pub materials: Vec<u32>,
}

impl Default for ImpactFeedbackConfig {
    fn default() -> Self {
        ImpactFeedbackConfig {
            min_velocity: 0.5,
            max_velocity: 2.0,
            default_volume: 0.3,
            max_volume: 1.0,
            default_haptic_strength: 0.05,
            max_haptic_strength: 0.2,
            haptic_duration: 0.1,
            materials: Vec::new(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HapticPulse {
    pub hand: Handedness,
    pub strength: f32,
    pub duration: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ImpactFeedback {
    pub volume: f32,
    pub haptic: HapticPulse,
}

impl ImpactFeedbackConfig {
    /// Feedback for a contact at `speed` m/s. Speeds outside the configured
    /// range clamp to its ends.
    pub fn for_speed(&self, hand: Handedness, speed: f32) -> ImpactFeedback {
        let span = self.max_velocity - self.min_velocity;
        let t = if span > 0.0 {
            ((speed - self.min_velocity) / span).clamp(0.0, 1.0)
        } else {
            1.0
        };

        ImpactFeedback {
            volume: lerp(self.default_volume, self.max_volume, t),
            haptic: HapticPulse {
                hand,
                strength: lerp(self.default_haptic_strength, self.max_haptic_strength, t),
                duration: self.haptic_duration,
            },
        }
    }

    pub fn responds_to(&self, material: Option<u32>) -> bool {
        self.materials.is_empty() || material.is_some_and(|m| self.materials.contains(&m))
    }

    /// Feedback driven by the device's own reported velocity against a
    /// surface of `material`. An untracked device, or a material outside
    /// the configured set, gets nothing.
    pub fn for_device(
        &self,
        hand: Handedness,
        device: &TrackedDevice,
        material: Option<u32>,
    ) -> Option<ImpactFeedback> {
        if !device.is_tracked {
            engine::haptics_log!(debug, "{:?} hand untracked, skipping impact feedback", hand);
            return None;
        }
        if !self.responds_to(material) {
            engine::haptics_log!(trace, "{:?} hit silent material {:?}", hand, material);
            return None;
        }

        let feedback = self.for_speed(hand, device.velocity.magnitude());
        engine::haptics_log!(
            trace,
            "{:?} impact: volume {:.2}, haptic {:.2}",
            hand,
            feedback.volume,
            feedback.haptic.strength
        );
        Some(feedback)
    }
}

fn lerp(from: f32, to: f32, t: f32) -> f32 {
    from + (to - from) * t
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::vec3;

    #[test]
    fn test_speeds_clamp_to_the_configured_range() {
        let config = ImpactFeedbackConfig::default();

        let soft = config.for_speed(Handedness::Left, 0.1);
        assert_eq!(soft.volume, 0.3);
        assert_eq!(soft.haptic.strength, 0.05);

        let hard = config.for_speed(Handedness::Left, 10.0);
        assert!((hard.volume - 1.0).abs() < 1.0e-6);
        assert!((hard.haptic.strength - 0.2).abs() < 1.0e-6);
        assert_eq!(hard.haptic.duration, 0.1);
    }

    #[test]
    fn test_midpoint_speed_interpolates() {
        let config = ImpactFeedbackConfig::default();
        let mid = config.for_speed(Handedness::Right, 1.25);
        assert!((mid.volume - 0.65).abs() < 1.0e-5);
        assert!((mid.haptic.strength - 0.125).abs() < 1.0e-5);
        assert_eq!(mid.haptic.hand, Handedness::Right);
    }

    #[test]
    fn test_device_velocity_drives_feedback() {
        let config = ImpactFeedbackConfig::default();
        let mut device = TrackedDevice::at(vec3(0.0, 1.0, 0.0));
        device.velocity = vec3(0.0, 0.0, -2.0);

        let feedback = config.for_device(Handedness::Left, &device, None).unwrap();
        assert!((feedback.volume - 1.0).abs() < 1.0e-6);

        assert!(config
            .for_device(Handedness::Left, &TrackedDevice::untracked(), None)
            .is_none());
    }

    #[test]
    fn test_only_listed_materials_answer() {
        let config = ImpactFeedbackConfig {
            materials: vec![1, 4],
            ..ImpactFeedbackConfig::default()
        };
        let device = TrackedDevice::at(vec3(0.0, 1.0, 0.0));

        assert!(config.for_device(Handedness::Right, &device, Some(4)).is_some());
        assert!(config.for_device(Handedness::Right, &device, Some(2)).is_none());
        assert!(config.for_device(Handedness::Right, &device, None).is_none());

        // With no list every surface answers, including unmarked ones.
        let open = ImpactFeedbackConfig::default();
        assert!(open.for_device(Handedness::Right, &device, None).is_some());
        assert!(open.for_device(Handedness::Right, &device, Some(2)).is_some());
    }
}
