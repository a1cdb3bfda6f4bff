//! Bounded rectangular plane.

use rig_core::{Color, TiledTexture};
use rig_math::{Interval, Ray, Vec3};

use crate::hittable::{HitRecord, Hittable};

/// Below this `|direction · normal|` a ray is treated as parallel to a plane.
const PARALLEL_EPSILON: f32 = 1e-6;

/// In-plane axes for a unit normal.
///
/// Planes facing ±Y use world X and Z; any other normal uses `Y × n` and
/// `n × (Y × n)`.
pub fn plane_axes(normal: Vec3) -> (Vec3, Vec3) {
    let side = Vec3::Y.cross(normal);
    if side.length() < PARALLEL_EPSILON {
        return (Vec3::X, Vec3::Z);
    }
    let u = side.normalize();
    (u, normal.cross(u).normalize())
}

/// A finite plane centered on `center`, `width` along the first in-plane axis
/// and `height` along the second.
#[derive(Debug, Clone)]
pub struct Plane {
    center: Vec3,
    normal: Vec3,
    u_axis: Vec3,
    v_axis: Vec3,
    width: f32,
    height: f32,
    texture: Option<TiledTexture>,
}

impl Plane {
    /// Plane with in-plane axes derived from `normal` by [`plane_axes`].
    pub fn new(center: Vec3, normal: Vec3, width: f32, height: f32) -> Self {
        let normal = normal.normalize_or_zero();
        let (u_axis, v_axis) = plane_axes(normal);
        Self::with_axes(center, normal, u_axis, v_axis, width, height)
    }

    /// Plane whose `width` runs along `u_axis` and `height` along `v_axis`.
    ///
    /// Used for planes placed by a node transform, where a spin about the
    /// normal turns the rectangle.
    pub fn with_axes(center: Vec3, normal: Vec3, u_axis: Vec3, v_axis: Vec3, width: f32, height: f32) -> Self {
        Self {
            center,
            normal: normal.normalize_or_zero(),
            u_axis: u_axis.normalize_or_zero(),
            v_axis: v_axis.normalize_or_zero(),
            width,
            height,
            texture: None,
        }
    }

    pub fn with_texture(mut self, texture: Option<TiledTexture>) -> Self {
        self.texture = texture;
        self
    }

    pub fn normal(&self) -> Vec3 {
        self.normal
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    /// Corner the texture tiling starts from.
    fn min_corner(&self) -> Vec3 {
        self.center - self.u_axis * (self.width / 2.0) - self.v_axis * (self.height / 2.0)
    }

    /// Surface color at a point on the plane: the tiled texture texel if the
    /// plane is textured, otherwise `diffuse`.
    pub fn color_at(&self, p: Vec3, diffuse: Color) -> Color {
        let Some(texture) = &self.texture else {
            return diffuse;
        };
        if self.width <= 0.0 || self.height <= 0.0 {
            return diffuse;
        }

        let offset = p - self.min_corner();
        let s = offset.dot(self.u_axis) / self.width;
        let t = offset.dot(self.v_axis) / self.height;
        texture.sample(s, t)
    }
}

impl Hittable for Plane {
    fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<HitRecord> {
        let denom = ray.direction().dot(self.normal);
        if denom.abs() < PARALLEL_EPSILON {
            return None;
        }

        let t = (self.center - ray.origin()).dot(self.normal) / denom;
        if !ray_t.surrounds(t) {
            return None;
        }

        let p = ray.at(t);
        let local = p - self.center;
        let inside_u = Interval::centered(0.0, self.width / 2.0).surrounds(local.dot(self.u_axis));
        let inside_v = Interval::centered(0.0, self.height / 2.0).surrounds(local.dot(self.v_axis));
        if !(inside_u && inside_v) {
            return None;
        }

        Some(HitRecord::new(t, p, self.normal))
    }
}
