//! Texture images for plane surfaces.
//!
//! Textures are sampled nearest-neighbor only, tiled across a plane with
//! wraparound on texel coordinates.

use std::path::Path;
use std::sync::Arc;

use thiserror::Error;

use crate::node::Color;

/// Errors that can occur during texture loading.
#[derive(Error, Debug)]
pub enum TextureError {
    #[error("Failed to load texture {path}: {source}")]
    Load {
        path: String,
        #[source]
        source: image::ImageError,
    },

    #[error("Texture {0} has no pixels")]
    Empty(String),
}

pub type TextureResult<T> = Result<T, TextureError>;

/// A loaded texture with pixel data.
///
/// Stores RGB colors in the 0-1 range, row-major, top row first.
#[derive(Clone, Debug)]
pub struct Texture {
    /// Texture width in pixels
    pub width: u32,

    /// Texture height in pixels
    pub height: u32,

    /// Pixel colors, row-major
    pub pixels: Vec<Color>,

    /// Original file path (for debugging)
    pub path: String,
}

impl Texture {
    /// Create a new texture from pixel data.
    pub fn new(width: u32, height: u32, pixels: Vec<Color>, path: impl Into<String>) -> TextureResult<Self> {
        let path = path.into();
        if width == 0 || height == 0 || pixels.len() != (width * height) as usize {
            return Err(TextureError::Empty(path));
        }
        Ok(Self {
            width,
            height,
            pixels,
            path,
        })
    }

    /// Convert an 8-bit RGB image.
    pub fn from_rgb8(image: &image::RgbImage, path: impl Into<String>) -> TextureResult<Self> {
        let (width, height) = image.dimensions();
        let pixels = image
            .pixels()
            .map(|p| Color::new(p[0] as f32, p[1] as f32, p[2] as f32) / 255.0)
            .collect();
        Self::new(width, height, pixels, path)
    }

    /// Load a texture from an image file.
    pub fn load(path: impl AsRef<Path>) -> TextureResult<Self> {
        let path = path.as_ref();
        let label = path.display().to_string();

        let img = image::open(path).map_err(|source| TextureError::Load {
            path: label.clone(),
            source,
        })?;
        let texture = Self::from_rgb8(&img.to_rgb8(), label)?;

        log::debug!(
            "Loaded texture: {} ({}x{}, {:.1} KB)",
            texture.path,
            texture.width,
            texture.height,
            texture.size_bytes() as f32 / 1024.0
        );

        Ok(texture)
    }

    /// Get pixel at integer coordinates.
    pub fn texel(&self, x: u32, y: u32) -> Color {
        let x = x.min(self.width - 1);
        let y = y.min(self.height - 1);
        self.pixels[(y * self.width + x) as usize]
    }

    /// Nearest texel at fractional pixel coordinates, wrapping outside
    /// `[0, width) x [0, height)`.
    pub fn sample_wrapped(&self, x: f32, y: f32) -> Color {
        let wx = x.rem_euclid(self.width as f32);
        let wy = y.rem_euclid(self.height as f32);
        self.texel(wx as u32, wy as u32)
    }

    /// Get total size in bytes (approximate).
    pub fn size_bytes(&self) -> usize {
        self.pixels.len() * std::mem::size_of::<Color>()
    }
}

/// A texture repeated across a plane.
#[derive(Clone, Debug)]
pub struct TiledTexture {
    pub texture: Arc<Texture>,
    pub tiles_x: u32,
    pub tiles_y: u32,
}

impl TiledTexture {
    /// Tile count used when none is given.
    pub const DEFAULT_TILES: u32 = 10;

    pub fn new(texture: Arc<Texture>) -> Self {
        Self {
            texture,
            tiles_x: Self::DEFAULT_TILES,
            tiles_y: Self::DEFAULT_TILES,
        }
    }

    pub fn with_tiles(mut self, tiles_x: u32, tiles_y: u32) -> Self {
        self.tiles_x = tiles_x;
        self.tiles_y = tiles_y;
        self
    }

    /// Color at normalized plane coordinates (`s`, `t` in [0, 1] span the
    /// whole plane).
    pub fn sample(&self, s: f32, t: f32) -> Color {
        let tex = &self.texture;
        let i = s * self.tiles_x as f32 * tex.width as f32 - 0.5;
        let j = t * self.tiles_y as f32 * tex.height as f32 - 0.5;
        tex.sample_wrapped(i, j)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker() -> Texture {
        // 2x2: black, white / white, black
        Texture::new(
            2,
            2,
            vec![Color::ZERO, Color::ONE, Color::ONE, Color::ZERO],
            "checker",
        )
        .unwrap()
    }

    #[test]
    fn test_pixel_count_mismatch() {
        let err = Texture::new(2, 2, vec![Color::ZERO], "short").unwrap_err();
        assert!(matches!(err, TextureError::Empty(_)));
    }

    #[test]
    fn test_sample_wrapped() {
        let tex = checker();
        assert_eq!(tex.sample_wrapped(0.2, 0.2), Color::ZERO);
        assert_eq!(tex.sample_wrapped(1.2, 0.2), Color::ONE);
        // Wraps past the right edge and below zero
        assert_eq!(tex.sample_wrapped(2.2, 0.2), Color::ZERO);
        assert_eq!(tex.sample_wrapped(-0.5, 0.2), Color::ONE);
        assert_eq!(tex.sample_wrapped(-0.5, -0.5), Color::ZERO);
    }

    #[test]
    fn test_tiled_sample_repeats() {
        let tiled = TiledTexture::new(Arc::new(checker())).with_tiles(2, 2);

        // Same spot within each of the two tiles gives the same texel
        let a = tiled.sample(0.1, 0.1);
        let b = tiled.sample(0.6, 0.1);
        let c = tiled.sample(0.1, 0.6);
        assert_eq!(a, b);
        assert_eq!(a, c);
    }

    #[test]
    fn test_from_rgb8() {
        let mut img = image::RgbImage::new(1, 2);
        img.put_pixel(0, 0, image::Rgb([255, 0, 0]));
        img.put_pixel(0, 1, image::Rgb([0, 0, 255]));

        let tex = Texture::from_rgb8(&img, "memory").unwrap();
        assert_eq!(tex.texel(0, 0), Color::new(1.0, 0.0, 0.0));
        assert_eq!(tex.texel(0, 1), Color::new(0.0, 0.0, 1.0));
    }
}
