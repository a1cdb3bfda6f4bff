//! JSON scene descriptions.
//!
//! A description names everything needed for one render: camera, render
//! settings, an optional floor, lights, a skeleton script and the OBJ meshes
//! hung on its joints. Relative paths resolve against the description file's
//! directory.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use rig_core::{
    load_obj, Color, MeshData, Node, PlaneShape, PointLight, Pose, Scene, Shading, SkeletonFile, Surface, Texture,
    TiledTexture,
};
use rig_math::Vec3;
use rig_renderer::{RenderCam, RenderConfig};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneDescription {
    pub name: String,
    pub render: RenderConfig,
    pub camera: RenderCam,
    pub floor: Option<FloorDescription>,
    pub lights: Vec<PointLight>,
    /// Skeleton script with the joint hierarchy
    pub skeleton: Option<PathBuf>,
    pub meshes: Vec<MeshBinding>,
    pub output: Option<PathBuf>,
}

/// Ground plane placed before any other entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FloorDescription {
    pub position: Vec3,
    pub normal: Vec3,
    pub width: f32,
    pub height: f32,
    pub color: Color,
    pub texture: Option<PathBuf>,
    /// Texture repeats along the plane's two axes
    pub tiles: [u32; 2],
}

impl Default for FloorDescription {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, -2.0, 0.0),
            normal: Vec3::Y,
            width: 20.0,
            height: 20.0,
            color: Color::new(0.0, 0.39, 0.0),
            texture: None,
            tiles: [10, 10],
        }
    }
}

/// An OBJ mesh to hang on a named joint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeshBinding {
    pub joint: String,
    pub path: PathBuf,
    #[serde(default)]
    pub y_offset: f32,
    #[serde(default)]
    pub shading: Shading,
}

impl SceneDescription {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).with_context(|| format!("failed to read scene {}", path.display()))?;
        Self::from_json(&source).with_context(|| format!("failed to parse scene {}", path.display()))
    }

    pub fn from_json(source: &str) -> Result<Self> {
        Ok(serde_json::from_str(source)?)
    }

    /// Build the scene, resolving relative paths against `base_dir`.
    pub fn build(&self, base_dir: &Path) -> Result<Scene> {
        let mut scene = Scene::new(if self.name.is_empty() { "untitled" } else { &self.name });

        if let Some(floor) = &self.floor {
            add_floor(&mut scene, floor, base_dir)?;
        }

        if let Some(skeleton) = &self.skeleton {
            let path = base_dir.join(skeleton);
            let file = SkeletonFile::load(&path).with_context(|| format!("failed to load skeleton {}", path.display()))?;
            scene.load_skeleton(&file)?;
        }

        // Meshes loaded once and shared between joints that use the same file
        let mut loaded: HashMap<PathBuf, Arc<MeshData>> = HashMap::new();
        for binding in &self.meshes {
            let joint = scene
                .joint_by_name(&binding.joint)
                .ok_or_else(|| anyhow!("mesh {} names unknown joint '{}'", binding.path.display(), binding.joint))?;

            let path = base_dir.join(&binding.path);
            let mesh = match loaded.get(&path) {
                Some(mesh) => Arc::clone(mesh),
                None => {
                    let mesh = Arc::new(load_obj(&path).with_context(|| format!("failed to load mesh {}", path.display()))?);
                    loaded.insert(path.clone(), Arc::clone(&mesh));
                    mesh
                }
            };

            scene
                .attach_mesh(joint, mesh, binding.y_offset, binding.shading)
                .with_context(|| format!("cannot attach {} to joint '{}'", binding.path.display(), binding.joint))?;
        }

        for light in &self.lights {
            scene.add_light(*light);
        }

        Ok(scene)
    }

    /// Output path from the description, relative to `base_dir`.
    pub fn output_path(&self, base_dir: &Path) -> Option<PathBuf> {
        self.output.as_ref().map(|output| base_dir.join(output))
    }
}

fn add_floor(scene: &mut Scene, floor: &FloorDescription, base_dir: &Path) -> Result<()> {
    let mut shape = PlaneShape::new(floor.normal, floor.width, floor.height);
    if let Some(texture) = &floor.texture {
        let path = base_dir.join(texture);
        let texture = Texture::load(&path).with_context(|| format!("failed to load texture {}", path.display()))?;
        let [tiles_x, tiles_y] = floor.tiles;
        shape = shape.with_texture(TiledTexture::new(Arc::new(texture)).with_tiles(tiles_x, tiles_y));
    }

    let node = Node::plane("floor", shape)
        .with_pose(Pose::from_translation(floor.position))
        .with_surface(Surface::diffuse(floor.color));
    scene.add_entity_node(node, None)?;
    Ok(())
}
