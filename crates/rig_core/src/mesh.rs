//! Triangle mesh geometry shared between joint attachments.
//!
//! A [`MeshData`] holds separate position and normal buffers; each
//! [`Triangle`] indexes into both. The data is immutable once built and is
//! shared through `Arc`, with the placement carried by a [`MeshInstance`].

use std::sync::Arc;

use rig_math::{Mat4, Vec3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while building or loading a mesh.
#[derive(Error, Debug)]
pub enum MeshError {
    #[error("mesh '{mesh}': triangle {triangle} references position {index}, but only {count} exist")]
    PositionIndexOutOfRange {
        mesh: String,
        triangle: usize,
        index: u32,
        count: usize,
    },

    #[error("mesh '{mesh}': triangle {triangle} references normal {index}, but only {count} exist")]
    NormalIndexOutOfRange {
        mesh: String,
        triangle: usize,
        index: u32,
        count: usize,
    },

    #[error("failed to load OBJ {path}: {source}")]
    Obj {
        path: String,
        #[source]
        source: tobj::LoadError,
    },

    #[error("OBJ {0} contains no triangles")]
    Empty(String),
}

pub type MeshResult<T> = Result<T, MeshError>;

/// How the surface normal of a mesh hit is computed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shading {
    /// Barycentric blend of the three vertex normals
    #[default]
    Smooth,
    /// Face normal from the triangle's edges
    Flat,
}

/// One triangle: three position indices and three normal indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Triangle {
    pub positions: [u32; 3],
    pub normals: [u32; 3],
}

impl Triangle {
    pub fn new(positions: [u32; 3], normals: [u32; 3]) -> Self {
        Self { positions, normals }
    }
}

/// Immutable triangle mesh.
#[derive(Debug, Clone)]
pub struct MeshData {
    pub name: String,
    positions: Vec<Vec3>,
    normals: Vec<Vec3>,
    triangles: Vec<Triangle>,
}

impl MeshData {
    /// Build a mesh, checking every triangle index against its buffer.
    pub fn new(
        name: impl Into<String>,
        positions: Vec<Vec3>,
        normals: Vec<Vec3>,
        triangles: Vec<Triangle>,
    ) -> MeshResult<Self> {
        let name = name.into();

        for (i, tri) in triangles.iter().enumerate() {
            if let Some(&index) = tri.positions.iter().find(|&&idx| idx as usize >= positions.len()) {
                return Err(MeshError::PositionIndexOutOfRange {
                    mesh: name,
                    triangle: i,
                    index,
                    count: positions.len(),
                });
            }
            if let Some(&index) = tri.normals.iter().find(|&&idx| idx as usize >= normals.len()) {
                return Err(MeshError::NormalIndexOutOfRange {
                    mesh: name,
                    triangle: i,
                    index,
                    count: normals.len(),
                });
            }
        }

        Ok(Self {
            name,
            positions,
            normals,
            triangles,
        })
    }

    /// Build a mesh from positions and flat triangle indices, generating
    /// smooth per-vertex normals (normal index == position index).
    pub fn from_indexed(name: impl Into<String>, positions: Vec<Vec3>, indices: &[u32]) -> MeshResult<Self> {
        let triangles: Vec<Triangle> = indices
            .chunks_exact(3)
            .map(|face| {
                let face = [face[0], face[1], face[2]];
                Triangle::new(face, face)
            })
            .collect();

        let normals = compute_vertex_normals(&positions, &triangles);
        Self::new(name, positions, normals, triangles)
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn normals(&self) -> &[Vec3] {
        &self.normals
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Positions of a triangle's three corners (mesh space).
    #[inline]
    pub fn triangle_positions(&self, tri: &Triangle) -> [Vec3; 3] {
        tri.positions.map(|i| self.positions[i as usize])
    }

    /// Normals of a triangle's three corners (mesh space).
    #[inline]
    pub fn triangle_normals(&self, tri: &Triangle) -> [Vec3; 3] {
        tri.normals.map(|i| self.normals[i as usize])
    }

    /// Lowest and highest y over all positions; `None` for an empty mesh.
    pub fn vertical_extent(&self) -> Option<(f32, f32)> {
        self.positions.iter().fold(None, |acc, p| match acc {
            None => Some((p.y, p.y)),
            Some((lo, hi)) => Some((lo.min(p.y), hi.max(p.y))),
        })
    }

    /// Mesh height along y.
    pub fn height(&self) -> f32 {
        self.vertical_extent().map_or(0.0, |(lo, hi)| hi - lo)
    }

    /// Approximate memory footprint of the geometry buffers.
    pub fn size_bytes(&self) -> usize {
        (self.positions.len() + self.normals.len()) * std::mem::size_of::<Vec3>()
            + self.triangles.len() * std::mem::size_of::<Triangle>()
    }
}

/// Average face normals into per-vertex normals.
///
/// Counter-clockwise winding; vertices with no (or degenerate) faces get +Y.
pub fn compute_vertex_normals(positions: &[Vec3], triangles: &[Triangle]) -> Vec<Vec3> {
    let mut normals = vec![Vec3::ZERO; positions.len()];

    for tri in triangles {
        let [i0, i1, i2] = tri.positions.map(|i| i as usize);
        if i0 >= positions.len() || i1 >= positions.len() || i2 >= positions.len() {
            continue;
        }

        let face_normal = (positions[i1] - positions[i0]).cross(positions[i2] - positions[i0]);
        normals[i0] += face_normal;
        normals[i1] += face_normal;
        normals[i2] += face_normal;
    }

    for normal in &mut normals {
        *normal = normal.try_normalize().unwrap_or(Vec3::Y);
    }

    normals
}

/// A placed reference to shared mesh data.
#[derive(Debug, Clone)]
pub struct MeshInstance {
    pub mesh: Arc<MeshData>,
    /// Mesh-to-world transform applied at intersection time
    pub transform: Mat4,
    pub shading: Shading,
}

impl MeshInstance {
    pub fn new(mesh: Arc<MeshData>, transform: Mat4, shading: Shading) -> Self {
        Self {
            mesh,
            transform,
            shading,
        }
    }
}
