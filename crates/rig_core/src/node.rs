//! Node types for the scene hierarchy.
//!
//! Every placeable thing in a scene is a [`Node`]: a pose, a surface, and a
//! [`Shape`] drawn from a closed set of kinds. Parent/child links are owned by
//! the [`SceneGraph`](crate::SceneGraph) and can only be changed through it.

use std::fmt;
use std::sync::Arc;

use rig_math::{euler_yxz, euler_yxz_quat, local_matrix, Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::mesh::{MeshData, Shading};
use crate::texture::TiledTexture;

/// Color type alias (linear RGB, 0-1)
pub type Color = Vec3;

/// Stable handle to a node in a [`SceneGraph`](crate::SceneGraph).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Local placement of a node relative to its parent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pose {
    /// Translation
    pub translation: Vec3,

    /// Euler rotation in degrees (x = pitch, y = yaw, z = roll), applied Y, X, Z
    pub rotation: Vec3,

    /// Non-uniform scale
    pub scale: Vec3,

    /// Point the rotation pivots around, in local space
    pub pivot: Vec3,
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
            pivot: Vec3::ZERO,
        }
    }
}

impl Pose {
    /// Create a pose with only translation.
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Default::default()
        }
    }

    /// Set the rotation (degrees).
    pub fn with_rotation(mut self, rotation: Vec3) -> Self {
        self.rotation = rotation;
        self
    }

    /// Set the scale.
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Set the pivot.
    pub fn with_pivot(mut self, pivot: Vec3) -> Self {
        self.pivot = pivot;
        self
    }

    /// Convert to a 4x4 local matrix.
    ///
    /// Order: translate * pivot * rotate * pivot⁻¹ * scale
    pub fn local_matrix(&self) -> Mat4 {
        local_matrix(self.translation, self.rotation, self.scale, self.pivot)
    }

    /// Rotation part of the pose as a matrix.
    pub fn rotation_matrix(&self) -> Mat4 {
        euler_yxz(self.rotation)
    }

    /// Rotation part of the pose as a quaternion.
    pub fn rotation_quat(&self) -> Quat {
        euler_yxz_quat(self.rotation)
    }

    /// Offset the pivot adds to the local origin: `pivot - R * pivot`.
    pub fn pivot_displacement(&self) -> Vec3 {
        self.pivot - self.rotation_matrix().transform_vector3(self.pivot)
    }
}

/// Surface colors used by the shading engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Surface {
    pub diffuse: Color,
    pub specular: Color,
}

impl Surface {
    pub const GREY: Color = Color::new(0.502, 0.502, 0.502);
    pub const LIGHT_GREY: Color = Color::new(0.827, 0.827, 0.827);

    /// Surface with the given diffuse color and the default specular.
    pub fn diffuse(diffuse: Color) -> Self {
        Self {
            diffuse,
            ..Default::default()
        }
    }
}

impl Default for Surface {
    fn default() -> Self {
        Self {
            diffuse: Self::GREY,
            specular: Self::LIGHT_GREY,
        }
    }
}

/// A bounded rectangular plane.
#[derive(Debug, Clone)]
pub struct PlaneShape {
    /// Unit normal
    pub normal: Vec3,

    /// Extent along the plane's first in-plane axis
    pub width: f32,

    /// Extent along the plane's second in-plane axis
    pub height: f32,

    /// Optional tiled texture replacing the diffuse color
    pub texture: Option<TiledTexture>,
}

impl PlaneShape {
    /// Create an untextured plane.
    pub fn new(normal: Vec3, width: f32, height: f32) -> Self {
        Self {
            normal: normal.normalize_or_zero(),
            width,
            height,
            texture: None,
        }
    }

    /// Apply a tiled texture.
    pub fn with_texture(mut self, texture: TiledTexture) -> Self {
        self.texture = Some(texture);
        self
    }
}

impl Default for PlaneShape {
    fn default() -> Self {
        Self::new(Vec3::Y, 20.0, 20.0)
    }
}

/// A mesh hung on a joint's bone.
#[derive(Debug, Clone)]
pub struct MeshAttachment {
    /// Shared, immutable geometry
    pub mesh: Arc<MeshData>,

    /// Mesh pose applied before the bone transform
    pub pose: Pose,

    /// Normal interpolation mode
    pub shading: Shading,
}

impl MeshAttachment {
    pub fn new(mesh: Arc<MeshData>, y_offset: f32, shading: Shading) -> Self {
        Self {
            mesh,
            pose: Pose::from_translation(Vec3::new(0.0, y_offset, 0.0)),
            shading,
        }
    }

    /// Vertical offset of the mesh along the bone.
    pub fn y_offset(&self) -> f32 {
        self.pose.translation.y
    }

    pub fn set_y_offset(&mut self, y_offset: f32) {
        self.pose.translation.y = y_offset;
    }
}

/// A skeleton joint: a small sphere that may carry one mesh.
#[derive(Debug, Clone)]
pub struct JointShape {
    pub radius: f32,
    pub attachment: Option<MeshAttachment>,
}

impl Default for JointShape {
    fn default() -> Self {
        Self {
            radius: 0.1,
            attachment: None,
        }
    }
}

/// Closed set of node kinds.
#[derive(Debug, Clone)]
pub enum Shape {
    /// Transform-only node
    Group,
    Sphere { radius: f32 },
    Plane(PlaneShape),
    Joint(JointShape),
}

impl Shape {
    /// Radius for sphere-like shapes.
    pub fn radius(&self) -> Option<f32> {
        match self {
            Shape::Sphere { radius } => Some(*radius),
            Shape::Joint(joint) => Some(joint.radius),
            _ => None,
        }
    }

    pub fn as_joint(&self) -> Option<&JointShape> {
        match self {
            Shape::Joint(joint) => Some(joint),
            _ => None,
        }
    }

    pub fn as_joint_mut(&mut self) -> Option<&mut JointShape> {
        match self {
            Shape::Joint(joint) => Some(joint),
            _ => None,
        }
    }
}

/// A placeable node.
#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,
    pub pose: Pose,
    pub surface: Surface,
    pub shape: Shape,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
}

impl Node {
    /// Create an unlinked node.
    pub fn new(name: impl Into<String>, shape: Shape) -> Self {
        Self {
            name: name.into(),
            pose: Pose::default(),
            surface: Surface::default(),
            shape,
            parent: None,
            children: Vec::new(),
        }
    }

    /// A sphere of the given radius.
    pub fn sphere(name: impl Into<String>, radius: f32) -> Self {
        Self::new(name, Shape::Sphere { radius })
    }

    /// A bounded plane.
    pub fn plane(name: impl Into<String>, plane: PlaneShape) -> Self {
        Self::new(name, Shape::Plane(plane))
    }

    /// A joint with the default radius; joints default to red.
    pub fn joint(name: impl Into<String>) -> Self {
        let mut node = Self::new(name, Shape::Joint(JointShape::default()));
        node.surface.diffuse = Color::new(1.0, 0.0, 0.0);
        node
    }

    pub fn with_pose(mut self, pose: Pose) -> Self {
        self.pose = pose;
        self
    }

    pub fn with_surface(mut self, surface: Surface) -> Self {
        self.surface = surface;
        self
    }

    /// Parent link (`None` for roots).
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Owned children, in insertion order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn is_joint(&self) -> bool {
        matches!(self.shape, Shape::Joint(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pose_default_is_identity() {
        assert_eq!(Pose::default().local_matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn test_pivot_displacement() {
        let pose = Pose::default()
            .with_rotation(Vec3::new(0.0, 0.0, 90.0))
            .with_pivot(Vec3::Y);
        // R * (0,1,0) = (-1,0,0) so the origin shifts by (1,1,0)
        assert!((pose.pivot_displacement() - Vec3::new(1.0, 1.0, 0.0)).length() < 1e-5);
        assert!((pose.local_matrix().transform_point3(Vec3::ZERO) - Vec3::new(1.0, 1.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_joint_defaults() {
        let joint = Node::joint("hip");
        assert!(joint.is_joint());
        assert_eq!(joint.shape.radius(), Some(0.1));
        assert!(joint.parent().is_none());
        assert!(joint.children().is_empty());
    }

    #[test]
    fn test_plane_normal_is_normalized() {
        let plane = PlaneShape::new(Vec3::new(0.0, 3.0, 0.0), 4.0, 2.0);
        assert_eq!(plane.normal, Vec3::Y);
    }
}
