use cgmath::{Deg, InnerSpace, Quaternion, Rad, Rotation, Rotation3, Vector3, vec3};

/// Vectors shorter than this are treated as zero before normalizing.
pub const EPSILON: f32 = 1.0e-6;

pub fn is_near_zero(v: Vector3<f32>) -> bool {
    v.magnitude2() <= EPSILON * EPSILON
}

/// Split a vector into its unit direction and length, or `None` if it is too short to have one.
pub fn direction_and_length(v: Vector3<f32>) -> Option<(Vector3<f32>, f32)> {
    let length = v.magnitude();
    if length <= EPSILON || !length.is_finite() {
        return None;
    }
    Some((v / length, length))
}

/// Remove the component of `v` along `normal`. `normal` need not be unit length;
/// a degenerate normal leaves `v` untouched.
pub fn project_on_plane(v: Vector3<f32>, normal: Vector3<f32>) -> Vector3<f32> {
    match direction_and_length(normal) {
        Some((n, _)) => v - n * v.dot(n),
        None => v,
    }
}

/// Rotation of `degrees` about the world up axis.
pub fn yaw_rotation(degrees: f32) -> Quaternion<f32> {
    Quaternion::from_angle_y(Deg(degrees))
}

/// The heading-only part of `rotation`: the rotation about +Y that points
/// -Z the same way `rotation` does when projected onto the ground plane.
/// A rotation looking straight up or down has no heading and yields `None`.
pub fn heading_of(rotation: Quaternion<f32>) -> Option<Quaternion<f32>> {
    let forward = rotation.rotate_vector(vec3(0.0, 0.0, -1.0));
    let flat = vec3(forward.x, 0.0, forward.z);
    let (dir, _) = direction_and_length(flat)?;
    let angle = Rad((-dir.x).atan2(-dir.z));
    Some(Quaternion::from_angle_y(angle))
}
