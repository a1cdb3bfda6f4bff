//! Simple skeleton render.
//!
//! Builds a small leg rig with box meshes on each bone, stands it on a
//! checkered floor under three lights, and saves a PNG.

use std::sync::Arc;

use rig_core::{
    Color, MeshData, Node, PlaneShape, PointLight, Pose, Scene, Shading, Surface, Texture, TiledTexture,
};
use rig_renderer::{render_parallel, RenderCam, RenderConfig, Vec3, World};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let scene = build_scene()?;
    let world = World::from_scene(&scene);

    let config = RenderConfig::default().with_resolution(600, 400);
    let image = render_parallel(&world, &RenderCam::default(), &config, None)?;

    let filename = "simple_render.png";
    image.save(filename)?;
    Ok(())
}

fn build_scene() -> anyhow::Result<Scene> {
    let mut scene = Scene::new("leg");

    let checker = checker_texture(Color::new(0.8, 0.8, 0.8), Color::new(0.2, 0.3, 0.2))?;
    let floor = PlaneShape::new(Vec3::Y, 20.0, 20.0).with_texture(TiledTexture::new(Arc::new(checker)).with_tiles(8, 8));
    scene.add_entity_node(
        Node::plane("floor", floor)
            .with_pose(Pose::from_translation(Vec3::new(0.0, -2.5, 0.0)))
            .with_surface(Surface::diffuse(Color::new(0.0, 0.39, 0.0))),
        None,
    )?;

    let hip = scene.add_joint(Some("hip"), Pose::from_translation(Vec3::new(0.0, 1.5, 0.0)), None)?;
    let knee = scene.add_joint(
        Some("knee"),
        Pose::from_translation(Vec3::new(0.4, -2.0, 0.5)).with_rotation(Vec3::new(20.0, 0.0, 0.0)),
        Some(hip),
    )?;
    let ankle = scene.add_joint(Some("ankle"), Pose::from_translation(Vec3::new(0.0, -1.8, -0.4)), Some(knee))?;

    scene.attach_mesh(knee, Arc::new(box_mesh("thigh", 0.5, 2.0)?), 0.0, Shading::Flat)?;
    scene.attach_mesh(ankle, Arc::new(box_mesh("shin", 0.4, 1.8)?), 0.0, Shading::Flat)?;

    scene.add_light(PointLight::new(Vec3::new(0.0, 5.0, 4.0), 100.0));
    scene.add_light(PointLight::new(Vec3::new(-5.0, 3.0, 2.0), 100.0));
    scene.add_light(PointLight::new(Vec3::new(5.0, 1.0, 6.0), 100.0));

    Ok(scene)
}

/// Axis-aligned box of the given footprint, centered on the origin with
/// its long side along Y.
fn box_mesh(name: &str, size: f32, height: f32) -> anyhow::Result<MeshData> {
    let (s, h) = (size / 2.0, height / 2.0);
    let positions = vec![
        Vec3::new(-s, -h, -s),
        Vec3::new(s, -h, -s),
        Vec3::new(s, -h, s),
        Vec3::new(-s, -h, s),
        Vec3::new(-s, h, -s),
        Vec3::new(s, h, -s),
        Vec3::new(s, h, s),
        Vec3::new(-s, h, s),
    ];
    #[rustfmt::skip]
    let indices = [
        0, 2, 1, 0, 3, 2, // bottom
        4, 5, 6, 4, 6, 7, // top
        3, 6, 2, 3, 7, 6, // front
        0, 1, 5, 0, 5, 4, // back
        0, 4, 7, 0, 7, 3, // left
        1, 2, 6, 1, 6, 5, // right
    ];
    Ok(MeshData::from_indexed(name, positions, &indices)?)
}

fn checker_texture(a: Color, b: Color) -> anyhow::Result<Texture> {
    let size = 8;
    let pixels = (0..size * size)
        .map(|i| if ((i % size) / 4 + (i / size) / 4) % 2 == 0 { a } else { b })
        .collect();
    Ok(Texture::new(size, size, pixels, "checker")?)
}
