// Re-export glam for convenience
pub use glam::*;

// Rig math types
mod interval;
mod ray;
mod transform;

pub use interval::Interval;
pub use ray::Ray;
pub use transform::{
    euler_yxz, euler_yxz_quat, local_matrix, rotate_to_vector, rotate_to_vector_or,
    rotation_to_euler_yxz, PARALLEL_EPSILON,
};
