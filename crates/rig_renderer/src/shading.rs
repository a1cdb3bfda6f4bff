//! Local illumination: ambient, Lambert diffuse and Blinn-Phong specular
//! summed over point lights, with hard shadows.

use rig_core::Color;
use rig_math::Vec3;
use serde::{Deserialize, Serialize};

use crate::world::World;

/// Which terms are evaluated per light.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShadingModel {
    /// Ambient and diffuse
    Lambert,
    /// Ambient, diffuse and specular
    #[default]
    BlinnPhong,
}

/// Shading parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadingConfig {
    pub model: ShadingModel,

    /// Fraction of the diffuse color added once as a flat base term
    pub ambient: f32,

    /// Specular exponent
    pub power: f32,

    /// Specular color used for every surface; `None` uses each surface's own
    pub specular: Option<Color>,

    /// Offset along the normal for shadow ray origins. Too small brings back
    /// shadow acne; too large detaches shadows from their casters.
    pub shadow_bias: f32,

    /// Floor on the light distance used for inverse-square falloff
    pub min_light_distance: f32,

    pub shadows: bool,
}

impl Default for ShadingConfig {
    fn default() -> Self {
        Self {
            model: ShadingModel::BlinnPhong,
            ambient: 0.15,
            power: 20.0,
            specular: Some(Color::ONE),
            shadow_bias: 1e-4,
            min_light_distance: 1e-3,
            shadows: true,
        }
    }
}

impl ShadingConfig {
    /// Diffuse-only shading with a brighter ambient base.
    pub fn lambert() -> Self {
        Self {
            model: ShadingModel::Lambert,
            ambient: 0.25,
            ..Default::default()
        }
    }

    pub fn with_power(mut self, power: f32) -> Self {
        self.power = power;
        self
    }

    pub fn with_ambient(mut self, ambient: f32) -> Self {
        self.ambient = ambient;
        self
    }

    pub fn with_shadows(mut self, shadows: bool) -> Self {
        self.shadows = shadows;
        self
    }
}

/// Color of a surface point lit by every light in `world`.
///
/// `camera` is the eye position used for the specular half vector. Lights
/// blocked by any object in `world` contribute nothing; the ambient term is
/// always present.
pub fn shade(
    world: &World,
    camera: Vec3,
    point: Vec3,
    normal: Vec3,
    diffuse: Color,
    specular: Color,
    config: &ShadingConfig,
) -> Color {
    let normal = normal.normalize_or_zero();
    let mut color = diffuse * config.ambient;

    let shadow_origin = point + normal * config.shadow_bias;
    let to_camera = (camera - point).normalize_or_zero();

    for light in world.lights() {
        if config.shadows && world.occluded(shadow_origin, light.position) {
            continue;
        }

        let to_light = (light.position - point).normalize_or_zero();
        let illumination = light.falloff(point, config.min_light_distance);

        color += diffuse * illumination * normal.dot(to_light).max(0.0);

        if config.model == ShadingModel::BlinnPhong {
            let bisector = (to_camera + to_light).normalize_or_zero();
            color += specular * illumination * normal.dot(bisector).max(0.0).powf(config.power);
        }
    }

    color
}
