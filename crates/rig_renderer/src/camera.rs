//! View plane and render camera for primary ray generation.

use rig_math::{Ray, Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// World axis a view plane is perpendicular to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    #[default]
    Z,
}

/// Axis-aligned rectangle in world space that image coordinates map onto.
///
/// `min` and `max` are corners in the plane's own 2D coordinates: (y, z) for
/// an X plane, (x, z) for a Y plane, (x, y) for a Z plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewPlane {
    pub min: Vec2,
    pub max: Vec2,
    /// Fixed coordinate along `axis`
    pub depth: f32,
    pub axis: Axis,
}

impl Default for ViewPlane {
    fn default() -> Self {
        Self {
            min: Vec2::new(-3.0, -2.0),
            max: Vec2::new(3.0, 2.0),
            depth: 5.0,
            axis: Axis::Z,
        }
    }
}

impl ViewPlane {
    pub fn new(min: Vec2, max: Vec2, depth: f32) -> Self {
        Self {
            min,
            max,
            depth,
            axis: Axis::Z,
        }
    }

    pub fn with_axis(mut self, axis: Axis) -> Self {
        self.axis = axis;
        self
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    pub fn aspect(&self) -> f32 {
        self.width() / self.height()
    }

    /// World point for normalized plane coordinates, `u` and `v` in [0, 1].
    pub fn to_world(&self, u: f32, v: f32) -> Vec3 {
        let a = self.min.x + u * self.width();
        let b = self.min.y + v * self.height();
        match self.axis {
            Axis::X => Vec3::new(self.depth, a, b),
            Axis::Y => Vec3::new(a, self.depth, b),
            Axis::Z => Vec3::new(a, b, self.depth),
        }
    }
}

/// Pinhole camera looking through a view plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderCam {
    pub position: Vec3,
    pub view: ViewPlane,
}

impl Default for RenderCam {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 10.0),
            view: ViewPlane::default(),
        }
    }
}

impl RenderCam {
    pub fn new(position: Vec3, view: ViewPlane) -> Self {
        Self { position, view }
    }

    /// Unit-direction ray from the camera through `(u, v)` on the view plane.
    pub fn get_ray(&self, u: f32, v: f32) -> Ray {
        let target = self.view.to_world(u, v);
        Ray::new(self.position, target - self.position).normalized()
    }
}
