use cgmath::{One, Quaternion, Rotation, Vector3, Zero};

/// The tracking-space origin moved around by locomotion.
///
/// Tracked poses are relative to this body; `position` and `rotation` place
/// them in the world.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlayerBody {
    pub position: Vector3<f32>,
    pub rotation: Quaternion<f32>,
    pub velocity: Vector3<f32>,
    /// Heading of the torso collider, kept level and facing where the head faces
    pub body_heading: Quaternion<f32>,
}

impl PlayerBody {
    pub fn at(position: Vector3<f32>) -> PlayerBody {
        PlayerBody {
            position,
            ..PlayerBody::default()
        }
    }

    pub fn local_to_world(&self, local: Vector3<f32>) -> Vector3<f32> {
        self.position + self.rotation.rotate_vector(local)
    }

    pub fn rotation_to_world(&self, local: Quaternion<f32>) -> Quaternion<f32> {
        self.rotation * local
    }

    /// Spin the body around a world-space pivot, e.g. the head.
    pub fn rotate_about(&mut self, pivot: Vector3<f32>, rotation: Quaternion<f32>) {
        self.position = pivot + rotation.rotate_vector(self.position - pivot);
        self.rotation = rotation * self.rotation;
        self.body_heading = rotation * self.body_heading;
    }
}

impl Default for PlayerBody {
    fn default() -> Self {
        PlayerBody {
            position: Vector3::zero(),
            rotation: Quaternion::one(),
            velocity: Vector3::zero(),
            body_heading: Quaternion::one(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::yaw_rotation;
    use cgmath::{InnerSpace, vec3};

    #[test]
    fn test_local_to_world_applies_rotation_then_translation() {
        let mut body = PlayerBody::at(vec3(10.0, 0.0, 0.0));
        body.rotation = yaw_rotation(90.0);
        let world = body.local_to_world(vec3(0.0, 1.6, -1.0));
        assert!((world - vec3(9.0, 1.6, 0.0)).magnitude() < 1.0e-5);
    }

    #[test]
    fn test_rotating_about_a_pivot_keeps_the_pivot_fixed() {
        let mut body = PlayerBody::at(vec3(1.0, 0.0, 0.0));
        let head_local = vec3(0.5, 1.7, 0.0);
        let head = body.local_to_world(head_local);

        body.rotate_about(head, yaw_rotation(45.0));

        assert!((body.local_to_world(head_local) - head).magnitude() < 1.0e-5);
    }
}
