//! Rig Renderer - CPU ray tracer for skeleton scenes.
//!
//! Casts one ray per pixel through a fixed view plane, shades the closest
//! hit with ambient, diffuse and Blinn-Phong specular terms from point
//! lights, and tests hard shadows against every object in the world.
//!
//! Scenes are flattened into an immutable [`World`] before rendering, so
//! buckets can be traced on the rayon pool without locking.

mod bucket;
mod camera;
mod hittable;
mod mesh;
mod plane;
mod renderer;
mod shading;
mod sphere;
mod triangle;
mod world;

pub use bucket::{generate_buckets, render_bucket, render_parallel, Bucket, DEFAULT_BUCKET_SIZE};
pub use camera::{Axis, RenderCam, ViewPlane};
pub use hittable::{HitRecord, Hittable};
pub use mesh::Mesh;
pub use plane::{plane_axes, Plane};
pub use renderer::{
    color_to_rgb, pixel_uv, ray_color, render, render_pixel, ImageBuffer, RenderConfig, RenderError, RenderResult,
};
pub use shading::{shade, ShadingConfig, ShadingModel};
pub use sphere::Sphere;
pub use triangle::{face_normal, intersect_triangle, TriangleHit};
pub use world::{Primitive, World, WorldHit, WorldObject};

/// Re-export common math types from rig_math
pub use rig_math::{Interval, Ray, Vec3};
