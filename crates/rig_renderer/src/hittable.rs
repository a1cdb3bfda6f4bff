//! Hittable trait and HitRecord for ray-object intersection.

use rig_math::{Interval, Ray, Vec3};

/// Record of a ray-object intersection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitRecord {
    /// Parameter t where the intersection occurs
    pub t: f32,
    /// Point of intersection
    pub p: Vec3,
    /// Unit surface normal at the intersection
    pub normal: Vec3,
}

impl HitRecord {
    pub fn new(t: f32, p: Vec3, normal: Vec3) -> Self {
        Self { t, p, normal }
    }
}

/// Trait for objects that can be hit by rays.
///
/// Implementations are read-only during a render and shared across worker
/// threads.
pub trait Hittable: Send + Sync {
    /// Nearest intersection with a parameter strictly inside `ray_t`.
    fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<HitRecord>;
}
