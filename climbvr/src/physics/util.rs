//! Conversions between the cgmath types used by the locomotion code and the
//! nalgebra types rapier speaks.

use cgmath::{Quaternion, Vector3};
use rapier3d::{na::UnitQuaternion, prelude::*};

pub fn nvec_to_cgvec(vec: &Vector<Real>) -> Vector3<f32> {
    Vector3::new(vec.x, vec.y, vec.z)
}

pub fn npoint_to_cgvec(point: &Point<Real>) -> Vector3<f32> {
    Vector3::new(point.x, point.y, point.z)
}

pub fn cgvec_to_nvec(vec: Vector3<f32>) -> Vector<Real> {
    vector![vec.x, vec.y, vec.z]
}

pub fn cgvec_to_npoint(vec: Vector3<f32>) -> Point<Real> {
    point![vec.x, vec.y, vec.z]
}

pub fn quat_to_nquat(rotation: Quaternion<f32>) -> UnitQuaternion<f32> {
    let nquat = rapier3d::na::Quaternion::new(rotation.s, rotation.v.x, rotation.v.y, rotation.v.z);
    UnitQuaternion::from_quaternion(nquat)
}

/// Rigid placement of a static collider from a cgmath position and orientation.
pub fn isometry_from_parts(position: Vector3<f32>, rotation: Quaternion<f32>) -> Isometry<Real> {
    Isometry::from_parts(
        rapier3d::na::Translation3::new(position.x, position.y, position.z),
        quat_to_nquat(rotation),
    )
}
