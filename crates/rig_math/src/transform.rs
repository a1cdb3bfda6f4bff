// Transform utilities for node poses.
//
// Rotations are stored as Euler angles in degrees and applied yaw, pitch,
// roll (Y, then X, then Z), i.e. R = Ry * Rx * Rz.

use glam::{EulerRot, Mat4, Quat, Vec3};

/// Below this `|a × b|` two unit vectors are treated as colinear.
pub const PARALLEL_EPSILON: f32 = 1e-6;

/// Rotation from Euler angles in degrees (x = pitch, y = yaw, z = roll).
pub fn euler_yxz_quat(rotation_degrees: Vec3) -> Quat {
    Quat::from_euler(
        EulerRot::YXZ,
        rotation_degrees.y.to_radians(),
        rotation_degrees.x.to_radians(),
        rotation_degrees.z.to_radians(),
    )
}

/// Matrix form of [`euler_yxz_quat`].
pub fn euler_yxz(rotation_degrees: Vec3) -> Mat4 {
    Mat4::from_quat(euler_yxz_quat(rotation_degrees))
}

/// Inverse of [`euler_yxz`]: degrees with x = pitch, y = yaw, z = roll.
pub fn rotation_to_euler_yxz(rotation: Quat) -> Vec3 {
    let (yaw, pitch, roll) = rotation.to_euler(EulerRot::YXZ);
    Vec3::new(pitch.to_degrees(), yaw.to_degrees(), roll.to_degrees())
}

/// Compose a local matrix rotating about `pivot`.
///
/// Order: T * P * R * P⁻¹ * S
pub fn local_matrix(translation: Vec3, rotation_degrees: Vec3, scale: Vec3, pivot: Vec3) -> Mat4 {
    Mat4::from_translation(translation)
        * Mat4::from_translation(pivot)
        * euler_yxz(rotation_degrees)
        * Mat4::from_translation(-pivot)
        * Mat4::from_scale(scale)
}

/// Minimal rotation taking unit vector `from` onto unit vector `to`.
///
/// Returns `None` when the vectors are parallel or anti-parallel, where the
/// rotation axis is undefined.
pub fn rotate_to_vector(from: Vec3, to: Vec3) -> Option<Mat4> {
    let axis = from.cross(to);
    if axis.length() < PARALLEL_EPSILON {
        return None;
    }
    let angle = from.angle_between(to);
    Some(Mat4::from_axis_angle(axis.normalize(), angle))
}

/// [`rotate_to_vector`] with an explicit policy for the colinear cases.
pub fn rotate_to_vector_or(from: Vec3, to: Vec3, parallel: Mat4, anti_parallel: Mat4) -> Mat4 {
    match rotate_to_vector(from, to) {
        Some(rotation) => rotation,
        None if from.dot(to) >= 0.0 => parallel,
        None => anti_parallel,
    }
}
