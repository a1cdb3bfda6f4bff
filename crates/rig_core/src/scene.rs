//! Scene state: the node hierarchy, the render list and the lights.
//!
//! A [`Scene`] is the explicit object the editor mutates between renders.
//! The renderer only ever reads it, through a snapshot taken before the
//! pixel loop starts.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use rig_math::{euler_yxz, rotate_to_vector_or, Mat4, Vec3};
use thiserror::Error;

use crate::graph::{GraphError, SceneGraph};
use crate::light::PointLight;
use crate::mesh::{MeshData, MeshInstance, Shading};
use crate::node::{MeshAttachment, Node, NodeId, Pose};
use crate::skeleton_file::{JointRecord, SkeletonFile};

/// Errors raised by scene edits.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SceneError {
    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("node {0} is not a joint")]
    NotAJoint(NodeId),

    #[error("joint {0} is a root joint and has no bone to carry a mesh")]
    RootJointMesh(NodeId),

    #[error("joint '{joint}' names unknown parent '{parent}'")]
    UnknownParent { joint: String, parent: String },

    #[error("joint name '{0}' is used more than once")]
    DuplicateJoint(String),
}

pub type SceneResult<T> = Result<T, SceneError>;

/// Direction an attached mesh points along before it is aligned to its bone.
const MESH_DIRECTION: Vec3 = Vec3::NEG_Y;

/// One element of the render list.
#[derive(Debug, Clone)]
pub enum Entity {
    /// A node rendered by its own shape (sphere, plane or joint sphere)
    Node(NodeId),

    /// The mesh attached to this joint, placed by the joint's bone
    AttachedMesh(NodeId),

    /// A free-standing mesh with an explicit instance matrix
    Mesh(MeshInstance),
}

impl Entity {
    /// Node this entity depends on, if any.
    pub fn node(&self) -> Option<NodeId> {
        match self {
            Entity::Node(id) | Entity::AttachedMesh(id) => Some(*id),
            Entity::Mesh(_) => None,
        }
    }
}

/// Scene hierarchy plus the ordered entity and light lists.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    pub name: String,
    pub graph: SceneGraph,
    pub entities: Vec<Entity>,
    pub lights: Vec<PointLight>,
}

impl Scene {
    /// Create an empty scene.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Insert a node into the hierarchy without rendering it.
    pub fn add_node(&mut self, node: Node, parent: Option<NodeId>) -> SceneResult<NodeId> {
        Ok(self.graph.insert(node, parent)?)
    }

    /// Insert a node and append it to the render list.
    pub fn add_entity_node(&mut self, node: Node, parent: Option<NodeId>) -> SceneResult<NodeId> {
        let id = self.add_node(node, parent)?;
        self.entities.push(Entity::Node(id));
        Ok(id)
    }

    /// Append a free-standing mesh to the render list.
    pub fn add_mesh_instance(&mut self, instance: MeshInstance) {
        self.entities.push(Entity::Mesh(instance));
    }

    pub fn add_light(&mut self, light: PointLight) {
        self.lights.push(light);
    }

    /// Set the intensity of every light.
    pub fn set_light_intensity(&mut self, intensity: f32) {
        for light in &mut self.lights {
            light.intensity = intensity;
        }
    }

    /// Joints in insertion order.
    pub fn joints(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.graph
            .iter()
            .filter(|(_, node)| node.is_joint())
            .map(|(id, _)| id)
    }

    pub fn joint_by_name(&self, name: &str) -> Option<NodeId> {
        self.graph
            .iter()
            .find(|(_, node)| node.is_joint() && node.name == name)
            .map(|(id, _)| id)
    }

    /// `requested` if no joint uses it yet, otherwise the first free
    /// `joint<N>` name.
    pub fn unique_joint_name(&self, requested: Option<&str>) -> String {
        if let Some(name) = requested {
            if self.joint_by_name(name).is_none() {
                return name.to_string();
            }
        }

        (0..)
            .map(|n| format!("joint{}", n))
            .find(|name| self.joint_by_name(name).is_none())
            .unwrap_or_default()
    }

    /// Add a joint, optionally under another joint. The pose is local to the
    /// parent.
    pub fn add_joint(&mut self, name: Option<&str>, pose: Pose, parent: Option<NodeId>) -> SceneResult<NodeId> {
        if let Some(parent) = parent {
            self.require_joint(parent)?;
        }

        let name = self.unique_joint_name(name);
        let id = self.add_node(Node::joint(name).with_pose(pose), parent)?;
        log::debug!("Added joint {} '{}'", id, self.graph.node(id)?.name);
        Ok(id)
    }

    /// Delete a joint. Its children move to its parent keeping their world
    /// pose; any child left without a parent loses its mesh, since a root
    /// joint has no bone.
    pub fn delete_joint(&mut self, id: NodeId) -> SceneResult<Node> {
        self.require_joint(id)?;

        let children = self.graph.node(id)?.children().to_vec();
        self.entities.retain(|entity| entity.node() != Some(id));
        let removed = self.graph.remove(id)?;

        for child in children {
            if self.graph.parent(child)?.is_none() && self.detach_mesh(child)?.is_some() {
                log::warn!("Joint {} became a root joint, its mesh was detached", child);
            }
        }

        Ok(removed)
    }

    /// Hang `mesh` on the bone between `joint` and its parent, replacing any
    /// previous attachment.
    pub fn attach_mesh(&mut self, joint: NodeId, mesh: Arc<MeshData>, y_offset: f32, shading: Shading) -> SceneResult<()> {
        self.require_joint(joint)?;
        if self.graph.parent(joint)?.is_none() {
            return Err(SceneError::RootJointMesh(joint));
        }

        let name = mesh.name.clone();
        if let Some(shape) = self.graph.node_mut(joint)?.shape.as_joint_mut() {
            shape.attachment = Some(MeshAttachment::new(mesh, y_offset, shading));
        }

        self.entities
            .retain(|entity| !matches!(entity, Entity::AttachedMesh(id) if *id == joint));
        self.entities.push(Entity::AttachedMesh(joint));

        log::debug!("Attached mesh '{}' to joint {}", name, joint);
        Ok(())
    }

    /// Remove a joint's mesh and its render list entry.
    pub fn detach_mesh(&mut self, joint: NodeId) -> SceneResult<Option<MeshAttachment>> {
        let attachment = self
            .graph
            .node_mut(joint)?
            .shape
            .as_joint_mut()
            .ok_or(SceneError::NotAJoint(joint))?
            .attachment
            .take();

        self.entities
            .retain(|entity| !matches!(entity, Entity::AttachedMesh(id) if *id == joint));
        Ok(attachment)
    }

    /// Change the vertical offset of a joint's mesh along its bone.
    pub fn set_mesh_offset(&mut self, joint: NodeId, y_offset: f32) -> SceneResult<()> {
        let shape = self
            .graph
            .node_mut(joint)?
            .shape
            .as_joint_mut()
            .ok_or(SceneError::NotAJoint(joint))?;
        if let Some(attachment) = &mut shape.attachment {
            attachment.set_y_offset(y_offset);
        }
        Ok(())
    }

    /// Apply a shading mode to every attached mesh.
    pub fn set_shading(&mut self, shading: Shading) {
        let joints: Vec<NodeId> = self.joints().collect();
        for id in joints {
            let attachment = self
                .graph
                .get_mut(id)
                .and_then(|node| node.shape.as_joint_mut())
                .and_then(|joint| joint.attachment.as_mut());
            if let Some(attachment) = attachment {
                attachment.shading = shading;
            }
        }
    }

    /// Bone placement for a joint: translation to the midpoint between the
    /// joint and its parent, times the rotation taking -Y onto the
    /// joint-to-parent direction. `None` for root joints.
    ///
    /// When the bone is vertical the alignment is undefined, so the parent's
    /// own rotation is used instead (with an extra 180° roll when the bone
    /// points up).
    pub fn bone_transform(&self, joint: NodeId) -> SceneResult<Option<Mat4>> {
        self.require_joint(joint)?;
        let Some(parent) = self.graph.parent(joint)? else {
            return Ok(None);
        };

        let joint_position = self.graph.world_position(joint)?;
        let parent_position = self.graph.world_position(parent)?;
        let to_parent = (parent_position - joint_position).normalize_or_zero();

        let parent_rotation = self.graph.node(parent)?.pose.rotation;
        let align = rotate_to_vector_or(
            MESH_DIRECTION,
            to_parent,
            euler_yxz(parent_rotation),
            euler_yxz(parent_rotation + Vec3::new(0.0, 0.0, 180.0)),
        );

        let midpoint = joint_position.lerp(parent_position, 0.5);
        Ok(Some(Mat4::from_translation(midpoint) * align))
    }

    /// World placement of the mesh attached to `joint`, if any.
    pub fn mesh_instance(&self, joint: NodeId) -> SceneResult<Option<MeshInstance>> {
        let shape = self
            .graph
            .node(joint)?
            .shape
            .as_joint()
            .ok_or(SceneError::NotAJoint(joint))?;

        let (Some(attachment), Some(bone)) = (&shape.attachment, self.bone_transform(joint)?) else {
            return Ok(None);
        };

        Ok(Some(MeshInstance::new(
            Arc::clone(&attachment.mesh),
            bone * attachment.pose.local_matrix(),
            attachment.shading,
        )))
    }

    /// Replace every joint (and its mesh) with the joints of a skeleton file.
    pub fn load_skeleton(&mut self, file: &SkeletonFile) -> SceneResult<()> {
        let mut seen = HashSet::new();
        if let Some(record) = file.joints.iter().find(|record| !seen.insert(record.name.as_str())) {
            return Err(SceneError::DuplicateJoint(record.name.clone()));
        }

        self.clear_joints()?;

        let mut by_name: HashMap<&str, NodeId> = HashMap::new();
        for record in &file.joints {
            let parent = match &record.parent {
                Some(parent) => Some(*by_name.get(parent.as_str()).ok_or_else(|| SceneError::UnknownParent {
                    joint: record.name.clone(),
                    parent: parent.clone(),
                })?),
                None => None,
            };

            let pose = Pose::from_translation(record.translation).with_rotation(record.rotation);
            let id = self.add_joint(Some(&record.name), pose, parent)?;
            by_name.insert(record.name.as_str(), id);
        }

        log::info!("Loaded skeleton into '{}': {} joints", self.name, file.joints.len());
        Ok(())
    }

    /// Export the joints, parents before children.
    pub fn skeleton_file(&self) -> SkeletonFile {
        let joints = self
            .graph
            .depth_first()
            .into_iter()
            .filter_map(|id| self.graph.get(id).filter(|node| node.is_joint()))
            .map(|node| JointRecord {
                name: node.name.clone(),
                rotation: node.pose.rotation,
                translation: node.pose.translation,
                parent: node
                    .parent()
                    .and_then(|parent| self.graph.get(parent))
                    .filter(|parent| parent.is_joint())
                    .map(|parent| parent.name.clone()),
            })
            .collect();

        SkeletonFile { joints }
    }

    /// Remove every joint along with its render list entries.
    fn clear_joints(&mut self) -> SceneResult<()> {
        let mut joints: Vec<NodeId> = self
            .graph
            .depth_first()
            .into_iter()
            .filter(|&id| self.graph.get(id).is_some_and(Node::is_joint))
            .collect();
        joints.reverse();

        self.entities
            .retain(|entity| entity.node().map_or(true, |id| !joints.contains(&id)));
        for id in joints {
            self.graph.remove(id)?;
        }
        Ok(())
    }

    fn require_joint(&self, id: NodeId) -> SceneResult<()> {
        if self.graph.node(id)?.is_joint() {
            Ok(())
        } else {
            Err(SceneError::NotAJoint(id))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::PlaneShape;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-4
    }

    fn triangle() -> Arc<MeshData> {
        Arc::new(
            MeshData::from_indexed(
                "tri",
                vec![Vec3::new(-0.5, 0.0, 0.0), Vec3::new(0.5, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0)],
                &[0, 1, 2],
            )
            .unwrap(),
        )
    }

    fn chain() -> (Scene, NodeId, NodeId, NodeId) {
        let mut scene = Scene::new("test");
        let hip = scene
            .add_joint(Some("hip"), Pose::from_translation(Vec3::new(0.0, 2.0, 0.0)), None)
            .unwrap();
        let knee = scene
            .add_joint(Some("knee"), Pose::from_translation(Vec3::new(1.0, 0.0, 0.0)), Some(hip))
            .unwrap();
        let ankle = scene
            .add_joint(Some("ankle"), Pose::from_translation(Vec3::new(0.0, -1.0, 0.0)), Some(knee))
            .unwrap();
        (scene, hip, knee, ankle)
    }

    #[test]
    fn test_unique_joint_names() {
        let mut scene = Scene::new("names");
        let a = scene.add_joint(None, Pose::default(), None).unwrap();
        let b = scene.add_joint(Some("joint0"), Pose::default(), None).unwrap();
        let c = scene.add_joint(Some("hip"), Pose::default(), None).unwrap();
        let d = scene.add_joint(Some("hip"), Pose::default(), None).unwrap();

        let names: Vec<&str> = [a, b, c, d]
            .iter()
            .map(|&id| scene.graph.node(id).unwrap().name.as_str())
            .collect();
        assert_eq!(names, vec!["joint0", "joint1", "hip", "joint2"]);
        assert_eq!(scene.joint_by_name("hip"), Some(c));
    }

    #[test]
    fn test_joint_parent_must_be_a_joint() {
        let mut scene = Scene::new("parents");
        let floor = scene
            .add_entity_node(Node::plane("floor", PlaneShape::default()), None)
            .unwrap();
        let err = scene.add_joint(None, Pose::default(), Some(floor)).unwrap_err();
        assert_eq!(err, SceneError::NotAJoint(floor));
    }

    #[test]
    fn test_root_joint_cannot_carry_mesh() {
        let (mut scene, hip, _, _) = chain();
        let err = scene.attach_mesh(hip, triangle(), 0.0, Shading::Smooth).unwrap_err();
        assert_eq!(err, SceneError::RootJointMesh(hip));
        assert!(scene.entities.is_empty());
    }

    #[test]
    fn test_attach_replaces_previous_mesh() {
        let (mut scene, _, knee, _) = chain();
        scene.attach_mesh(knee, triangle(), 0.0, Shading::Smooth).unwrap();
        scene.attach_mesh(knee, triangle(), 0.25, Shading::Flat).unwrap();

        assert_eq!(scene.entities.len(), 1);
        let instance = scene.mesh_instance(knee).unwrap().unwrap();
        assert_eq!(instance.shading, Shading::Flat);

        scene.set_shading(Shading::Smooth);
        assert_eq!(scene.mesh_instance(knee).unwrap().unwrap().shading, Shading::Smooth);

        assert!(scene.detach_mesh(knee).unwrap().is_some());
        assert!(scene.entities.is_empty());
        assert!(scene.mesh_instance(knee).unwrap().is_none());
    }

    #[test]
    fn test_bone_transform_horizontal() {
        let (scene, hip, knee, _) = chain();
        assert_eq!(scene.bone_transform(hip).unwrap(), None);

        // knee sits at (1,2,0), hip at (0,2,0): bone points along -X
        let bone = scene.bone_transform(knee).unwrap().unwrap();
        assert!(approx(bone.transform_point3(Vec3::ZERO), Vec3::new(0.5, 2.0, 0.0)));
        assert!(approx(bone.transform_vector3(MESH_DIRECTION), Vec3::NEG_X));
    }

    #[test]
    fn test_bone_transform_vertical_uses_parent_rotation() {
        let (mut scene, _, knee, ankle) = chain();
        scene.graph.node_mut(knee).unwrap().pose.rotation = Vec3::new(0.0, 30.0, 0.0);

        // Ankle hangs straight below the knee: the joint-to-parent direction
        // is +Y, anti-parallel to the mesh direction
        let bone = scene.bone_transform(ankle).unwrap().unwrap();
        let expected = euler_yxz(Vec3::new(0.0, 30.0, 180.0));
        assert!(approx(bone.transform_vector3(Vec3::X), expected.transform_vector3(Vec3::X)));
        assert!(approx(bone.transform_vector3(MESH_DIRECTION), Vec3::Y));

        let knee_position = scene.graph.world_position(knee).unwrap();
        let ankle_position = scene.graph.world_position(ankle).unwrap();
        assert!(approx(
            bone.transform_point3(Vec3::ZERO),
            (knee_position + ankle_position) * 0.5
        ));
    }

    #[test]
    fn test_mesh_offset_moves_along_bone() {
        let (mut scene, _, knee, _) = chain();
        scene.attach_mesh(knee, triangle(), 0.0, Shading::Smooth).unwrap();
        let before = scene.mesh_instance(knee).unwrap().unwrap().transform;

        scene.set_mesh_offset(knee, 0.5).unwrap();
        let after = scene.mesh_instance(knee).unwrap().unwrap().transform;

        // +0.5 in mesh space y is +X in world for this bone
        let shift = after.transform_point3(Vec3::ZERO) - before.transform_point3(Vec3::ZERO);
        assert!(approx(shift, Vec3::new(0.5, 0.0, 0.0)));
    }

    #[test]
    fn test_delete_joint_rehomes_children_and_drops_mesh() {
        let (mut scene, hip, knee, ankle) = chain();
        scene.attach_mesh(knee, triangle(), 0.0, Shading::Smooth).unwrap();
        scene.attach_mesh(ankle, triangle(), 0.0, Shading::Smooth).unwrap();
        let ankle_world = scene.graph.world_position(ankle).unwrap();

        let removed = scene.delete_joint(knee).unwrap();
        assert_eq!(removed.name, "knee");

        assert_eq!(scene.graph.parent(ankle).unwrap(), Some(hip));
        assert!(approx(scene.graph.world_position(ankle).unwrap(), ankle_world));
        // Only the ankle's mesh is left in the render list
        assert_eq!(scene.entities.len(), 1);
        assert!(matches!(scene.entities[0], Entity::AttachedMesh(id) if id == ankle));
    }

    #[test]
    fn test_delete_root_detaches_orphaned_meshes() {
        let (mut scene, hip, knee, _) = chain();
        scene.attach_mesh(knee, triangle(), 0.0, Shading::Smooth).unwrap();

        scene.delete_joint(hip).unwrap();

        assert_eq!(scene.graph.parent(knee).unwrap(), None);
        assert!(scene.entities.is_empty());
        assert!(scene.mesh_instance(knee).unwrap().is_none());
    }

    #[test]
    fn test_set_light_intensity() {
        let mut scene = Scene::new("lights");
        scene.add_light(PointLight::new(Vec3::Y, 1.0));
        scene.add_light(PointLight::new(Vec3::X, 2.0));
        scene.set_light_intensity(100.0);
        assert!(scene.lights.iter().all(|light| light.intensity == 100.0));
    }

    #[test]
    fn test_skeleton_export_and_reload() {
        let (mut scene, _, knee, _) = chain();
        scene.attach_mesh(knee, triangle(), 0.0, Shading::Smooth).unwrap();
        let floor = scene
            .add_entity_node(Node::plane("floor", PlaneShape::default()), None)
            .unwrap();

        let file = scene.skeleton_file();
        let names: Vec<&str> = file.joints.iter().map(|j| j.name.as_str()).collect();
        assert_eq!(names, vec!["hip", "knee", "ankle"]);
        assert_eq!(file.joints[2].parent.as_deref(), Some("knee"));

        scene.load_skeleton(&file).unwrap();

        assert_eq!(scene.joints().count(), 3);
        // Joint meshes go with the old joints; the floor stays
        assert_eq!(scene.entities.len(), 1);
        assert!(matches!(scene.entities[0], Entity::Node(id) if id == floor));
        let ankle = scene.joint_by_name("ankle").unwrap();
        assert!(approx(scene.graph.world_position(ankle).unwrap(), Vec3::new(1.0, 1.0, 0.0)));
        assert_eq!(scene.skeleton_file(), file);
    }

    #[test]
    fn test_load_skeleton_unknown_parent() {
        let mut scene = Scene::new("bad");
        let mut orphan = JointRecord::new("knee");
        orphan.parent = Some("hip".to_string());
        let file = SkeletonFile { joints: vec![orphan] };

        let err = scene.load_skeleton(&file).unwrap_err();
        assert!(matches!(err, SceneError::UnknownParent { .. }));
    }

    #[test]
    fn test_load_skeleton_duplicate_name() {
        let (mut scene, ..) = chain();
        let mut knee = JointRecord::new("knee");
        knee.parent = Some("hip".to_string());
        let file = SkeletonFile {
            joints: vec![JointRecord::new("hip"), JointRecord::new("hip"), knee],
        };

        let err = scene.load_skeleton(&file).unwrap_err();
        assert_eq!(err, SceneError::DuplicateJoint("hip".to_string()));
        // The rejected file leaves the current skeleton alone
        assert_eq!(scene.joints().count(), 3);
    }
}
