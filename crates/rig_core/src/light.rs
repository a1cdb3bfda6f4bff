//! Point lights.

use rig_math::Vec3;
use serde::{Deserialize, Serialize};

use crate::node::Color;

/// An omnidirectional light with inverse-square falloff.
///
/// Lights are not scene geometry: they never occlude or get hit by rays.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointLight {
    /// World-space position
    pub position: Vec3,

    /// Scalar intensity; irradiance at distance d is intensity / d²
    pub intensity: f32,

    /// Display radius (editor only)
    pub radius: f32,

    /// Display color (editor only)
    pub color: Color,
}

impl Default for PointLight {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 4.0, 0.0),
            intensity: 15.0,
            radius: 0.1,
            color: Color::ONE,
        }
    }
}

impl PointLight {
    pub fn new(position: Vec3, intensity: f32) -> Self {
        Self {
            position,
            intensity,
            ..Default::default()
        }
    }

    pub fn with_radius(mut self, radius: f32) -> Self {
        self.radius = radius;
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    /// Irradiance scale at `point`: intensity / max(distance, min_distance)².
    pub fn falloff(&self, point: Vec3, min_distance: f32) -> f32 {
        let distance = self.position.distance(point).max(min_distance);
        self.intensity / (distance * distance)
    }
}
