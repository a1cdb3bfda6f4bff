//! Triangle mesh primitive.
//!
//! Vertices and normals stay in mesh space and are moved by the instance
//! transform for every test, so one shared buffer can be placed by many
//! instances.

use std::sync::Arc;

use rig_core::{MeshData, MeshInstance, Shading};
use rig_math::{Interval, Mat4, Ray};

use crate::hittable::{HitRecord, Hittable};
use crate::triangle::{face_normal, intersect_triangle};

/// A placed mesh instance ready for intersection.
#[derive(Debug, Clone)]
pub struct Mesh {
    mesh: Arc<MeshData>,
    transform: Mat4,
    shading: Shading,
}

impl Mesh {
    pub fn new(instance: MeshInstance) -> Self {
        Self {
            mesh: instance.mesh,
            transform: instance.transform,
            shading: instance.shading,
        }
    }

    pub fn data(&self) -> &MeshData {
        &self.mesh
    }

    pub fn shading(&self) -> Shading {
        self.shading
    }
}

impl Hittable for Mesh {
    fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<HitRecord> {
        let mut closest = None;
        let mut closest_so_far = ray_t.max;

        for tri in self.mesh.triangles() {
            let [v0, v1, v2] = self
                .mesh
                .triangle_positions(tri)
                .map(|p| self.transform.transform_point3(p));

            let Some(hit) = intersect_triangle(ray, v0, v1, v2, ray_t.with_max(closest_so_far)) else {
                continue;
            };
            closest_so_far = hit.t;

            let normal = match self.shading {
                Shading::Smooth => {
                    let [n0, n1, n2] = self
                        .mesh
                        .triangle_normals(tri)
                        .map(|n| self.transform.transform_vector3(n).normalize_or_zero());
                    hit.interpolate(n0, n1, n2).normalize_or_zero()
                }
                Shading::Flat => face_normal(v0, v1, v2),
            };

            closest = Some(HitRecord::new(hit.t, ray.at(hit.t), normal));
        }

        closest
    }
}
