//! Render-time snapshot of a scene.
//!
//! A [`World`] resolves every scene entity to a world-space primitive once,
//! before the pixel loop. Rendering then only reads the snapshot, so worker
//! threads never touch the editable [`Scene`].

use rig_core::{Color, Entity, NodeId, PointLight, Scene, SceneResult, Shape, Surface};
use rig_math::{Interval, Ray, Vec3};

use crate::hittable::{HitRecord, Hittable};
use crate::mesh::Mesh;
use crate::plane::{plane_axes, Plane};
use crate::sphere::Sphere;

/// Closed set of intersectable geometry.
#[derive(Debug, Clone)]
pub enum Primitive {
    Sphere(Sphere),
    Plane(Plane),
    Mesh(Mesh),
}

impl Hittable for Primitive {
    fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<HitRecord> {
        match self {
            Primitive::Sphere(sphere) => sphere.hit(ray, ray_t),
            Primitive::Plane(plane) => plane.hit(ray, ray_t),
            Primitive::Mesh(mesh) => mesh.hit(ray, ray_t),
        }
    }
}

/// A primitive and the surface it is shaded with.
#[derive(Debug, Clone)]
pub struct WorldObject {
    pub primitive: Primitive,
    pub surface: Surface,
}

impl WorldObject {
    pub fn new(primitive: Primitive, surface: Surface) -> Self {
        Self { primitive, surface }
    }

    /// Diffuse color at a hit point; textured planes look up their texture.
    pub fn diffuse_at(&self, p: Vec3) -> Color {
        match &self.primitive {
            Primitive::Plane(plane) => plane.color_at(p, self.surface.diffuse),
            _ => self.surface.diffuse,
        }
    }
}

/// Closest intersection found by [`World::closest_hit`].
#[derive(Debug, Clone, Copy)]
pub struct WorldHit<'a> {
    pub object: &'a WorldObject,
    pub index: usize,
    pub record: HitRecord,
}

/// Immutable world-space geometry and lights.
#[derive(Debug, Clone, Default)]
pub struct World {
    objects: Vec<WorldObject>,
    lights: Vec<PointLight>,
}

impl World {
    /// Create an empty world.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve every entity of `scene` to world space.
    ///
    /// Entities whose node no longer exists, or that have nothing to draw,
    /// are skipped with a warning.
    pub fn from_scene(scene: &Scene) -> Self {
        let mut world = Self::new();

        for entity in &scene.entities {
            match resolve_entity(scene, entity) {
                Ok(Some(object)) => world.objects.push(object),
                Ok(None) => log::warn!("Skipping {}: nothing to render", entity_label(entity)),
                Err(err) => log::warn!("Skipping {}: {}", entity_label(entity), err),
            }
        }
        world.lights = scene.lights.clone();

        log::debug!(
            "World snapshot of '{}': {} primitives, {} lights",
            scene.name,
            world.objects.len(),
            world.lights.len()
        );
        world
    }

    pub fn add(&mut self, primitive: Primitive, surface: Surface) {
        self.objects.push(WorldObject::new(primitive, surface));
    }

    pub fn add_light(&mut self, light: PointLight) {
        self.lights.push(light);
    }

    pub fn objects(&self) -> &[WorldObject] {
        &self.objects
    }

    pub fn lights(&self) -> &[PointLight] {
        &self.lights
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Object whose hit point is nearest the ray origin. Ties go to the
    /// object added first.
    pub fn closest_hit(&self, ray: &Ray) -> Option<WorldHit<'_>> {
        let mut closest: Option<WorldHit<'_>> = None;
        let mut shortest = f32::INFINITY;

        for (index, object) in self.objects.iter().enumerate() {
            let Some(record) = object.primitive.hit(ray, Interval::POSITIVE) else {
                continue;
            };
            let distance = ray.origin().distance(record.p);
            if distance < shortest {
                shortest = distance;
                closest = Some(WorldHit { object, index, record });
            }
        }

        closest
    }

    /// True if any object blocks the segment from `origin` to `light`.
    ///
    /// A hit counts only when it is nearer to the origin than the light is
    /// and also nearer to the light than the origin is, so geometry beyond
    /// the light never casts a shadow.
    pub fn occluded(&self, origin: Vec3, light: Vec3) -> bool {
        let span = origin.distance(light);
        let ray = Ray::new(origin, light - origin).normalized();

        self.objects.iter().any(|object| {
            object.primitive.hit(&ray, Interval::POSITIVE).is_some_and(|record| {
                origin.distance(record.p) < span && record.p.distance(light) < span
            })
        })
    }
}

fn entity_label(entity: &Entity) -> String {
    match entity {
        Entity::Node(id) => format!("node {}", id),
        Entity::AttachedMesh(id) => format!("mesh on joint {}", id),
        Entity::Mesh(instance) => format!("mesh '{}'", instance.mesh.name),
    }
}

fn resolve_entity(scene: &Scene, entity: &Entity) -> SceneResult<Option<WorldObject>> {
    match entity {
        Entity::Node(id) => resolve_node(scene, *id),
        Entity::AttachedMesh(joint) => Ok(scene
            .mesh_instance(*joint)?
            .map(|instance| WorldObject::new(Primitive::Mesh(Mesh::new(instance)), Surface::default()))),
        Entity::Mesh(instance) => Ok(Some(WorldObject::new(
            Primitive::Mesh(Mesh::new(instance.clone())),
            Surface::default(),
        ))),
    }
}

fn resolve_node(scene: &Scene, id: NodeId) -> SceneResult<Option<WorldObject>> {
    let node = scene.graph.node(id)?;
    let world = scene.graph.world_matrix(id)?;
    let center = world.transform_point3(Vec3::ZERO);

    let primitive = match &node.shape {
        Shape::Group => return Ok(None),
        Shape::Sphere { radius } => Primitive::Sphere(Sphere::new(center, *radius)),
        Shape::Joint(joint) => Primitive::Sphere(Sphere::new(center, joint.radius)),
        Shape::Plane(plane) => {
            let (u_axis, v_axis) = plane_axes(plane.normal);
            let normal = world.transform_vector3(plane.normal);
            let u_axis = world.transform_vector3(u_axis);
            let v_axis = world.transform_vector3(v_axis);
            Primitive::Plane(
                Plane::with_axes(center, normal, u_axis, v_axis, plane.width, plane.height)
                    .with_texture(plane.texture.clone()),
            )
        }
    };

    Ok(Some(WorldObject::new(primitive, node.surface)))
}
