//! Tiled parallel rendering.
//!
//! The image is cut into square buckets that rayon workers trace
//! independently. Buckets near the image center are handed out first.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use rayon::prelude::*;
use rig_core::Color;

use crate::camera::RenderCam;
use crate::renderer::{render_pixel, ImageBuffer, RenderConfig, RenderError, RenderResult};
use crate::world::World;

pub const DEFAULT_BUCKET_SIZE: u32 = 64;

/// Pixel rectangle `[x, x + width) × [y, y + height)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bucket {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Bucket {
    pub fn area(&self) -> usize {
        (self.width * self.height) as usize
    }

    /// Pixel coordinates inside the bucket, row by row.
    pub fn pixels(&self) -> impl Iterator<Item = (u32, u32)> {
        let Bucket { x, y, width, height } = *self;
        (y..y + height).flat_map(move |py| (x..x + width).map(move |px| (px, py)))
    }

    fn center_distance_sq(&self, cx: f32, cy: f32) -> f32 {
        let bx = self.x as f32 + self.width as f32 * 0.5;
        let by = self.y as f32 + self.height as f32 * 0.5;
        (bx - cx).powi(2) + (by - cy).powi(2)
    }
}

/// Cover a `width × height` image with buckets, nearest the center first.
///
/// Edge buckets are cropped to the image. A `size` of zero is treated as one.
pub fn generate_buckets(width: u32, height: u32, size: u32) -> Vec<Bucket> {
    let size = size.max(1);
    let mut buckets: Vec<Bucket> = (0..height)
        .step_by(size as usize)
        .flat_map(|y| {
            (0..width).step_by(size as usize).map(move |x| Bucket {
                x,
                y,
                width: size.min(width - x),
                height: size.min(height - y),
            })
        })
        .collect();

    let (cx, cy) = (width as f32 * 0.5, height as f32 * 0.5);
    buckets.sort_by(|a, b| a.center_distance_sq(cx, cy).total_cmp(&b.center_distance_sq(cx, cy)));
    buckets
}

/// Trace every pixel of `bucket`, row-major.
pub fn render_bucket(bucket: &Bucket, world: &World, camera: &RenderCam, config: &RenderConfig) -> Vec<Color> {
    bucket
        .pixels()
        .map(|(x, y)| render_pixel(world, camera, x, y, config))
        .collect()
}

fn blit(image: &mut ImageBuffer, bucket: &Bucket, pixels: &[Color]) {
    for ((x, y), &color) in bucket.pixels().zip(pixels) {
        image.set(x, y, color);
    }
}

/// Render on the rayon pool, one bucket per task.
///
/// `cancel` is polled before each bucket starts. Once it is set no further
/// buckets begin and the call returns [`RenderError::Cancelled`] instead of a
/// partial image. The output is identical to [`crate::render`].
pub fn render_parallel(
    world: &World,
    camera: &RenderCam,
    config: &RenderConfig,
    cancel: Option<&AtomicBool>,
) -> RenderResult<ImageBuffer> {
    config.validate()?;

    let buckets = generate_buckets(config.width, config.height, config.bucket_size);
    log::info!(
        "Rendering {}x{}: {} buckets on {} threads, {} primitives, {} lights",
        config.width,
        config.height,
        buckets.len(),
        rayon::current_num_threads(),
        world.len(),
        world.lights().len()
    );
    let start = Instant::now();
    let cancelled = || cancel.is_some_and(|flag| flag.load(Ordering::Relaxed));

    let tiles: Option<Vec<(Bucket, Vec<Color>)>> = buckets
        .par_iter()
        .map(|bucket| {
            if cancelled() {
                return None;
            }
            let pixels = render_bucket(bucket, world, camera, config);
            log::debug!("bucket at {},{} ({}x{}) done", bucket.x, bucket.y, bucket.width, bucket.height);
            Some((*bucket, pixels))
        })
        .collect();

    let Some(tiles) = tiles else {
        log::info!("Render cancelled after {:.2?}", start.elapsed());
        return Err(RenderError::Cancelled);
    };

    let mut image = ImageBuffer::new(config.width, config.height);
    for (bucket, pixels) in &tiles {
        blit(&mut image, bucket, pixels);
    }

    log::info!("Render finished in {:.2?}", start.elapsed());
    Ok(image)
}

#[cfg(test)]
mod tests {
    use rig_core::{PointLight, Surface};
    use rig_math::Vec3;

    use super::*;
    use crate::plane::Plane;
    use crate::renderer::render;
    use crate::sphere::Sphere;
    use crate::world::Primitive;

    #[test]
    fn test_buckets_cover_image_once() {
        let (w, h) = (100, 70);
        let buckets = generate_buckets(w, h, 32);
        assert_eq!(buckets.len(), 4 * 3);

        let mut seen = vec![0u8; (w * h) as usize];
        for (x, y) in buckets.iter().flat_map(|b| b.pixels()) {
            seen[(y * w + x) as usize] += 1;
        }
        assert!(seen.iter().all(|&count| count == 1));
        assert_eq!(buckets.iter().map(Bucket::area).sum::<usize>(), (w * h) as usize);
    }

    #[test]
    fn test_center_bucket_first() {
        let buckets = generate_buckets(96, 96, 32);
        assert_eq!(buckets[0], Bucket { x: 32, y: 32, width: 32, height: 32 });
        // Corners are farthest out
        assert!(buckets[5..].iter().all(|b| b.x != 32 && b.y != 32));
    }

    #[test]
    fn test_zero_bucket_size() {
        assert_eq!(generate_buckets(3, 2, 0).len(), 6);
    }

    fn lit_world() -> World {
        let mut world = World::new();
        world.add(
            Primitive::Plane(Plane::new(Vec3::new(0.0, -2.0, 0.0), Vec3::Y, 20.0, 20.0)),
            Surface::diffuse(Color::new(0.0, 0.39, 0.0)),
        );
        world.add(Primitive::Sphere(Sphere::new(Vec3::ZERO, 1.0)), Surface::default());
        world.add_light(PointLight::new(Vec3::new(0.0, 4.0, 0.0), 100.0));
        world.add_light(PointLight::new(Vec3::new(-5.0, 2.0, 2.0), 100.0));
        world
    }

    #[test]
    fn test_parallel_matches_serial() {
        let world = lit_world();
        let camera = RenderCam::default();
        let config = RenderConfig::default().with_resolution(45, 30).with_bucket_size(8);

        let serial = render(&world, &camera, &config).unwrap();
        let parallel = render_parallel(&world, &camera, &config, None).unwrap();
        assert_eq!(serial, parallel);

        let unset = AtomicBool::new(false);
        assert_eq!(render_parallel(&world, &camera, &config, Some(&unset)).unwrap(), serial);
    }

    #[test]
    fn test_cancel_flag_stops_render() {
        let cancel = AtomicBool::new(true);
        let config = RenderConfig::default().with_resolution(16, 16);

        let err = render_parallel(&lit_world(), &RenderCam::default(), &config, Some(&cancel)).unwrap_err();
        assert!(matches!(err, RenderError::Cancelled));
    }

    #[test]
    fn test_parallel_rejects_empty_image() {
        let config = RenderConfig::default().with_resolution(16, 0);
        let err = render_parallel(&World::new(), &RenderCam::default(), &config, None).unwrap_err();
        assert!(matches!(err, RenderError::InvalidResolution { .. }));
    }
}
