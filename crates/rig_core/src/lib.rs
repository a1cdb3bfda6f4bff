//! Rig Core - scene model for the skeleton ray tracer.
//!
//! This crate provides:
//!
//! - **Node hierarchy**: `SceneGraph`, an arena of `Node`s addressed by `NodeId`
//! - **Geometry data**: shared `MeshData` buffers, tiled plane `Texture`s
//! - **Scene**: the ordered render entities and `PointLight`s, plus the
//!   joint editing operations (add, delete, attach mesh)
//! - **File formats**: OBJ mesh loading and skeleton script files
//!
//! # Example
//!
//! ```ignore
//! use rig_core::{Pose, Scene, load_obj};
//!
//! let mut scene = Scene::new("robot");
//! let hip = scene.add_joint(Some("hip"), Pose::default(), None)?;
//! let knee = scene.add_joint(Some("knee"), Pose::from_translation(Vec3::NEG_Y), Some(hip))?;
//! scene.attach_mesh(knee, Arc::new(load_obj("thigh.obj")?), 0.0, Shading::Smooth)?;
//! ```

pub mod graph;
pub mod light;
pub mod mesh;
pub mod node;
pub mod obj;
pub mod scene;
pub mod skeleton_file;
pub mod texture;

// Re-export commonly used types
pub use graph::{GraphError, GraphResult, SceneGraph};
pub use light::PointLight;
pub use mesh::{MeshData, MeshError, MeshInstance, Shading, Triangle};
pub use node::{Color, JointShape, MeshAttachment, Node, NodeId, PlaneShape, Pose, Shape, Surface};
pub use obj::{load_obj, load_obj_from_str};
pub use scene::{Entity, Scene, SceneError, SceneResult};
pub use skeleton_file::{JointRecord, SkeletonFile, SkeletonFileError};
pub use texture::{Texture, TextureError, TextureResult, TiledTexture};
