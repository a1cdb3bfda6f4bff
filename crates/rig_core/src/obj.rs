//! Wavefront OBJ loading into [`MeshData`].
//!
//! Faces keep separate position and normal indices (`f v//vn`), matching the
//! mesh's split buffers. Files without `vn` records get generated smooth
//! normals.

use std::io::{BufReader, Cursor};
use std::path::Path;

use rig_math::Vec3;

use crate::mesh::{compute_vertex_normals, MeshData, MeshError, MeshResult, Triangle};

fn load_options() -> tobj::LoadOptions {
    tobj::LoadOptions {
        single_index: false,
        triangulate: true,
        ..Default::default()
    }
}

/// Load an OBJ file. All models in the file are merged into one mesh named
/// after the file stem.
pub fn load_obj(path: impl AsRef<Path>) -> MeshResult<MeshData> {
    let path = path.as_ref();
    let label = path.display().to_string();

    let (models, _materials) = tobj::load_obj(path, &load_options()).map_err(|source| MeshError::Obj {
        path: label.clone(),
        source,
    })?;

    let name = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| label.clone());

    merge_models(name, &label, &models)
}

/// Parse OBJ text already in memory. Material libraries are ignored.
pub fn load_obj_from_str(name: &str, source: &str) -> MeshResult<MeshData> {
    let mut reader = BufReader::new(Cursor::new(source.as_bytes()));
    let (models, _materials) = tobj::load_obj_buf(&mut reader, &load_options(), |_| {
        Err(tobj::LoadError::OpenFileFailed)
    })
    .map_err(|source| MeshError::Obj {
        path: name.to_string(),
        source,
    })?;

    merge_models(name.to_string(), name, &models)
}

fn merge_models(name: String, label: &str, models: &[tobj::Model]) -> MeshResult<MeshData> {
    let mut positions: Vec<Vec3> = Vec::new();
    let mut normals: Vec<Vec3> = Vec::new();
    let mut triangles: Vec<Triangle> = Vec::new();
    let mut needs_generated_normals = false;

    for model in models {
        let mesh = &model.mesh;
        let position_base = positions.len() as u32;
        let normal_base = normals.len() as u32;

        positions.extend(mesh.positions.chunks_exact(3).map(|p| Vec3::new(p[0], p[1], p[2])));
        normals.extend(mesh.normals.chunks_exact(3).map(|n| Vec3::new(n[0], n[1], n[2])));

        let has_normals = mesh.normal_indices.len() == mesh.indices.len();
        if !has_normals {
            needs_generated_normals = true;
        }

        for (face, position_indices) in mesh.indices.chunks_exact(3).enumerate() {
            let face_positions = [position_indices[0], position_indices[1], position_indices[2]]
                .map(|i| i + position_base);
            let face_normals = if has_normals {
                let n = &mesh.normal_indices[face * 3..face * 3 + 3];
                [n[0], n[1], n[2]].map(|i| i + normal_base)
            } else {
                face_positions
            };
            triangles.push(Triangle::new(face_positions, face_normals));
        }
    }

    if triangles.is_empty() {
        return Err(MeshError::Empty(label.to_string()));
    }

    if needs_generated_normals {
        if !normals.is_empty() {
            log::warn!("{}: some faces lack normal indices, generating smooth normals for all faces", label);
            for tri in &mut triangles {
                tri.normals = tri.positions;
            }
        }
        normals = compute_vertex_normals(&positions, &triangles);
    }

    let mesh = MeshData::new(name, positions, normals, triangles)?;

    log::info!(
        "Loaded mesh '{}': {} vertices, {} faces, {} KB",
        mesh.name,
        mesh.vertex_count(),
        mesh.triangle_count(),
        mesh.size_bytes() / 1000
    );

    Ok(mesh)
}
