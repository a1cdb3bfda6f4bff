//! Image compositor.
//!
//! Maps every pixel to a camera ray, finds the closest hit and shades it, or
//! writes the background color on a miss. Pixels are independent; nothing is
//! carried between them.

use std::path::Path;
use std::time::Instant;

use rig_core::Color;
use rig_math::Ray;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::bucket::DEFAULT_BUCKET_SIZE;
use crate::camera::RenderCam;
use crate::shading::{shade, ShadingConfig};
use crate::world::World;

/// Errors raised by a render pass.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("invalid resolution {width}x{height}")]
    InvalidResolution { width: u32, height: u32 },

    #[error("render cancelled")]
    Cancelled,

    #[error("failed to save image {path}: {source}")]
    Save {
        path: String,
        #[source]
        source: image::ImageError,
    },
}

pub type RenderResult<T> = Result<T, RenderError>;

/// Render configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Color written where a ray hits nothing
    pub background: Color,
    pub shading: ShadingConfig,
    /// Bucket edge length for parallel rendering
    pub bucket_size: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 800,
            background: Color::ZERO,
            shading: ShadingConfig::default(),
            bucket_size: DEFAULT_BUCKET_SIZE,
        }
    }
}

impl RenderConfig {
    /// Set image resolution.
    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_background(mut self, background: Color) -> Self {
        self.background = background;
        self
    }

    pub fn with_shading(mut self, shading: ShadingConfig) -> Self {
        self.shading = shading;
        self
    }

    pub fn with_bucket_size(mut self, bucket_size: u32) -> Self {
        self.bucket_size = bucket_size;
        self
    }

    pub(crate) fn validate(&self) -> RenderResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(RenderError::InvalidResolution {
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }
}

/// Clamp a value to [0, 1] range.
#[inline]
pub fn clamp_01(x: f32) -> f32 {
    x.clamp(0.0, 1.0)
}

/// Convert a linear color to 8-bit RGB. No gamma is applied.
pub fn color_to_rgb(color: Color) -> [u8; 3] {
    let r = (255.0 * clamp_01(color.x)).round() as u8;
    let g = (255.0 * clamp_01(color.y)).round() as u8;
    let b = (255.0 * clamp_01(color.z)).round() as u8;
    [r, g, b]
}

/// Normalized view plane coordinates for the center of pixel (x, y).
///
/// Image rows run top to bottom while `v` grows upward, so row 0 maps to the
/// top of the view plane.
#[inline]
pub fn pixel_uv(x: u32, y: u32, width: u32, height: u32) -> (f32, f32) {
    let u = (x as f32 + 0.5) / width as f32;
    let v = ((height - 1 - y) as f32 + 0.5) / height as f32;
    (u, v)
}

/// Color seen along one camera ray.
pub fn ray_color(world: &World, camera: &RenderCam, ray: &Ray, config: &RenderConfig) -> Color {
    let Some(hit) = world.closest_hit(ray) else {
        return config.background;
    };

    let surface = &hit.object.surface;
    let diffuse = hit.object.diffuse_at(hit.record.p);
    let specular = config.shading.specular.unwrap_or(surface.specular);

    shade(
        world,
        camera.position,
        hit.record.p,
        hit.record.normal,
        diffuse,
        specular,
        &config.shading,
    )
}

/// Render a single pixel.
pub fn render_pixel(world: &World, camera: &RenderCam, x: u32, y: u32, config: &RenderConfig) -> Color {
    let (u, v) = pixel_uv(x, y, config.width, config.height);
    let ray = camera.get_ray(u, v);
    ray_color(world, camera, &ray, config)
}

/// Row-major color buffer, top row first.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageBuffer {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<Color>,
}

impl ImageBuffer {
    /// Create a new image buffer filled with black.
    pub fn new(width: u32, height: u32) -> Self {
        Self::filled(width, height, Color::ZERO)
    }

    pub fn filled(width: u32, height: u32, color: Color) -> Self {
        Self {
            width,
            height,
            pixels: vec![color; (width * height) as usize],
        }
    }

    /// Get the pixel at (x, y).
    pub fn get(&self, x: u32, y: u32) -> Color {
        self.pixels[(y * self.width + x) as usize]
    }

    /// Set the pixel at (x, y).
    pub fn set(&mut self, x: u32, y: u32, color: Color) {
        self.pixels[(y * self.width + x) as usize] = color;
    }

    /// Convert to an 8-bit RGB image.
    pub fn to_rgb_image(&self) -> image::RgbImage {
        image::RgbImage::from_fn(self.width, self.height, |x, y| image::Rgb(color_to_rgb(self.get(x, y))))
    }

    /// Write the image; the format follows the file extension.
    pub fn save(&self, path: impl AsRef<Path>) -> RenderResult<()> {
        let path = path.as_ref();
        self.to_rgb_image().save(path).map_err(|source| RenderError::Save {
            path: path.display().to_string(),
            source,
        })?;
        log::info!("Saved {}x{} image to {}", self.width, self.height, path.display());
        Ok(())
    }
}

/// Render the entire scene to an image buffer on the calling thread.
pub fn render(world: &World, camera: &RenderCam, config: &RenderConfig) -> RenderResult<ImageBuffer> {
    config.validate()?;

    log::info!(
        "Rendering {}x{} ({} primitives, {} lights)",
        config.width,
        config.height,
        world.len(),
        world.lights().len()
    );
    let start = Instant::now();

    let mut image = ImageBuffer::new(config.width, config.height);
    for y in 0..config.height {
        for x in 0..config.width {
            image.set(x, y, render_pixel(world, camera, x, y, config));
        }
    }

    log::info!("Render finished in {:.2?}", start.elapsed());
    Ok(image)
}
