//! Ray-triangle intersection.
//!
//! Uses the Möller-Trumbore algorithm. Triangles are two-sided.

use rig_math::{Interval, Ray, Vec3};

/// Below this determinant the ray is treated as parallel to the triangle.
const DETERMINANT_EPSILON: f32 = 1e-8;

/// Ray parameter and barycentric coordinates of a triangle hit.
///
/// The hit point is `(1 - u - v) * v0 + u * v1 + v * v2`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriangleHit {
    pub t: f32,
    pub u: f32,
    pub v: f32,
}

impl TriangleHit {
    /// Blend three per-vertex values with the barycentric weights.
    pub fn interpolate(&self, a: Vec3, b: Vec3, c: Vec3) -> Vec3 {
        (1.0 - self.u - self.v) * a + self.u * b + self.v * c
    }
}

/// Intersect a ray with triangle `(v0, v1, v2)`, accepting only parameters
/// strictly inside `ray_t`.
pub fn intersect_triangle(ray: &Ray, v0: Vec3, v1: Vec3, v2: Vec3, ray_t: Interval) -> Option<TriangleHit> {
    let edge1 = v1 - v0;
    let edge2 = v2 - v0;

    let h = ray.direction().cross(edge2);
    let a = edge1.dot(h);

    // Ray is parallel to triangle
    if a.abs() < DETERMINANT_EPSILON {
        return None;
    }

    let f = 1.0 / a;
    let s = ray.origin() - v0;
    let u = f * s.dot(h);

    // Check if intersection is outside triangle (u parameter)
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(edge1);
    let v = f * ray.direction().dot(q);

    // Check if intersection is outside triangle (v parameter)
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = f * edge2.dot(q);
    if !ray_t.surrounds(t) {
        return None;
    }

    Some(TriangleHit { t, u, v })
}

/// Unit face normal from the triangle's normalized edges, following the
/// counter-clockwise winding.
pub fn face_normal(v0: Vec3, v1: Vec3, v2: Vec3) -> Vec3 {
    let e1 = (v1 - v0).normalize_or_zero();
    let e2 = (v2 - v0).normalize_or_zero();
    e1.cross(e2).normalize_or_zero()
}
