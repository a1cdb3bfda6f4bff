//! Arena-backed node hierarchy.
//!
//! Nodes are addressed by [`NodeId`] handles that stay valid until the node
//! is removed; removed slots are never reused. All parent/child edits go
//! through [`SceneGraph::insert`], [`SceneGraph::reparent`] and
//! [`SceneGraph::remove`], which keep the hierarchy acyclic.

use rig_math::{rotation_to_euler_yxz, Mat4, Quat, Vec3};
use thiserror::Error;

use crate::node::{Node, NodeId};

/// Errors raised by hierarchy edits.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("unknown node {0}")]
    UnknownNode(NodeId),

    #[error("cannot parent {node} under {parent}: it is the node itself or one of its descendants")]
    Cycle { node: NodeId, parent: NodeId },
}

pub type GraphResult<T> = Result<T, GraphError>;

/// Arena of nodes with parent/child links.
#[derive(Debug, Clone, Default)]
pub struct SceneGraph {
    slots: Vec<Option<Node>>,
    len: usize,
}

impl SceneGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node, optionally as the last child of `parent`.
    ///
    /// The node's pose is kept as-is, so it is interpreted relative to the
    /// new parent.
    pub fn insert(&mut self, mut node: Node, parent: Option<NodeId>) -> GraphResult<NodeId> {
        if let Some(parent) = parent {
            self.node(parent)?;
        }

        let id = NodeId(self.slots.len());
        node.parent = parent;
        node.children.clear();
        self.slots.push(Some(node));
        self.len += 1;

        if let Some(parent) = parent {
            self.node_mut(parent)?.children.push(id);
        }

        Ok(id)
    }

    /// Get a node by handle.
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.slots.get(id.0).and_then(Option::as_ref)
    }

    /// Get a mutable node by handle. Links stay read-only.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slots.get_mut(id.0).and_then(Option::as_mut)
    }

    /// Like [`get`](Self::get), but an unknown handle is an error.
    pub fn node(&self, id: NodeId) -> GraphResult<&Node> {
        self.get(id).ok_or(GraphError::UnknownNode(id))
    }

    pub fn node_mut(&mut self, id: NodeId) -> GraphResult<&mut Node> {
        self.get_mut(id).ok_or(GraphError::UnknownNode(id))
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Remove every node. Previously issued handles become unknown.
    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            *slot = None;
        }
        self.len = 0;
    }

    /// Live nodes in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|node| (NodeId(i), node)))
    }

    /// Nodes without a parent, in insertion order.
    pub fn roots(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.iter()
            .filter(|(_, node)| node.parent.is_none())
            .map(|(id, _)| id)
    }

    /// Depth-first order starting from every root; parents precede children.
    pub fn depth_first(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.len);
        let mut stack: Vec<NodeId> = self.roots().collect();
        stack.reverse();

        while let Some(id) = stack.pop() {
            order.push(id);
            if let Some(node) = self.get(id) {
                stack.extend(node.children.iter().rev().copied());
            }
        }

        order
    }

    pub fn parent(&self, id: NodeId) -> GraphResult<Option<NodeId>> {
        Ok(self.node(id)?.parent)
    }

    /// Returns true if `ancestor` appears on the parent chain of `id`.
    pub fn is_descendant(&self, id: NodeId, ancestor: NodeId) -> bool {
        let mut current = self.get(id).and_then(|node| node.parent);
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            current = self.get(parent).and_then(|node| node.parent);
        }
        false
    }

    /// Local transform of a single node.
    pub fn local_matrix(&self, id: NodeId) -> GraphResult<Mat4> {
        Ok(self.node(id)?.pose.local_matrix())
    }

    /// Local-to-world transform: `parentWorld * local`, walking ancestor links.
    pub fn world_matrix(&self, id: NodeId) -> GraphResult<Mat4> {
        let node = self.node(id)?;
        let mut matrix = node.pose.local_matrix();
        let mut current = node.parent;

        while let Some(parent_id) = current {
            let parent = self.node(parent_id)?;
            matrix = parent.pose.local_matrix() * matrix;
            current = parent.parent;
        }

        Ok(matrix)
    }

    /// World transform of the node's parent, identity for roots.
    pub fn parent_world_matrix(&self, id: NodeId) -> GraphResult<Mat4> {
        match self.node(id)?.parent {
            Some(parent) => self.world_matrix(parent),
            None => Ok(Mat4::IDENTITY),
        }
    }

    /// Local origin in world space.
    pub fn world_position(&self, id: NodeId) -> GraphResult<Vec3> {
        Ok(self.world_matrix(id)?.transform_point3(Vec3::ZERO))
    }

    /// Accumulated rotation from the root down to this node.
    ///
    /// Scale is ignored, so this is exact only for uniformly scaled ancestors.
    pub fn world_rotation(&self, id: NodeId) -> GraphResult<Quat> {
        let node = self.node(id)?;
        let mut rotation = node.pose.rotation_quat();
        let mut current = node.parent;

        while let Some(parent_id) = current {
            let parent = self.node(parent_id)?;
            rotation = parent.pose.rotation_quat() * rotation;
            current = parent.parent;
        }

        Ok(rotation.normalize())
    }

    /// Accumulated per-axis scale from the root down to this node.
    ///
    /// Exact when every ancestor's scale is uniform or lines up with its
    /// rotation axes; a rotated non-uniform scale skews its descendants, which
    /// a pose cannot express.
    pub fn world_scale(&self, id: NodeId) -> GraphResult<Vec3> {
        let node = self.node(id)?;
        let mut scale = node.pose.scale;
        let mut current = node.parent;

        while let Some(parent_id) = current {
            let parent = self.node(parent_id)?;
            scale *= parent.pose.scale;
            current = parent.parent;
        }

        Ok(scale)
    }

    /// Move a node so its local origin lands on world point `position`.
    ///
    /// Only the translation changes; rotation, scale and pivot are kept.
    pub fn set_world_position(&mut self, id: NodeId, position: Vec3) -> GraphResult<()> {
        let parent_inverse = self.parent_world_matrix(id)?.inverse();
        let local_target = parent_inverse.transform_point3(position);

        let node = self.node_mut(id)?;
        node.pose.translation = local_target - node.pose.pivot_displacement();
        Ok(())
    }

    /// Move a node under `new_parent` (or make it a root), keeping its world
    /// position, orientation and scale.
    ///
    /// Scale is carried per axis, see [`SceneGraph::world_scale`]; a parent
    /// with a zero scale component leaves that component unchanged.
    pub fn reparent(&mut self, id: NodeId, new_parent: Option<NodeId>) -> GraphResult<()> {
        self.node(id)?;
        if let Some(parent) = new_parent {
            self.node(parent)?;
            if parent == id || self.is_descendant(parent, id) {
                return Err(GraphError::Cycle { node: id, parent });
            }
        }

        let world_position = self.world_position(id)?;
        let world_rotation = self.world_rotation(id)?;
        let world_scale = self.world_scale(id)?;

        self.unlink(id)?;
        self.node_mut(id)?.parent = new_parent;
        if let Some(parent) = new_parent {
            self.node_mut(parent)?.children.push(id);
        }

        let (parent_rotation, parent_scale) = match new_parent {
            Some(parent) => (self.world_rotation(parent)?, self.world_scale(parent)?),
            None => (Quat::IDENTITY, Vec3::ONE),
        };
        let local_rotation = parent_rotation.inverse() * world_rotation;
        let pose = &mut self.node_mut(id)?.pose;
        pose.rotation = rotation_to_euler_yxz(local_rotation);
        pose.scale = Vec3::select(parent_scale.cmpeq(Vec3::ZERO), pose.scale, world_scale / parent_scale);

        self.set_world_position(id, world_position)
    }

    /// Remove a node. Its children move to its parent (or become roots)
    /// without changing their world placement.
    pub fn remove(&mut self, id: NodeId) -> GraphResult<Node> {
        let node = self.node(id)?;
        let parent = node.parent;
        let children = node.children.clone();

        for child in children {
            self.reparent(child, parent)?;
        }

        self.unlink(id)?;
        let node = self.slots[id.0].take().ok_or(GraphError::UnknownNode(id))?;
        self.len -= 1;

        log::debug!("Removed node {} '{}'", id, node.name);
        Ok(node)
    }

    /// Detach a node from its parent's child list and clear its parent link.
    fn unlink(&mut self, id: NodeId) -> GraphResult<()> {
        if let Some(parent) = self.node(id)?.parent {
            self.node_mut(parent)?.children.retain(|&child| child != id);
        }
        self.node_mut(id)?.parent = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Pose;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-4
    }

    fn group(name: &str, pose: Pose) -> Node {
        Node::new(name, crate::node::Shape::Group).with_pose(pose)
    }

    #[test]
    fn test_insert_links_parent_and_child() {
        let mut graph = SceneGraph::new();
        let root = graph.insert(group("root", Pose::default()), None).unwrap();
        let child = graph.insert(group("child", Pose::default()), Some(root)).unwrap();

        assert_eq!(graph.len(), 2);
        assert_eq!(graph.parent(child).unwrap(), Some(root));
        assert_eq!(graph.node(root).unwrap().children(), &[child]);
        assert_eq!(graph.roots().collect::<Vec<_>>(), vec![root]);
    }

    #[test]
    fn test_insert_unknown_parent() {
        let mut graph = SceneGraph::new();
        let err = graph.insert(group("orphan", Pose::default()), Some(NodeId(7)));
        assert_eq!(err, Err(GraphError::UnknownNode(NodeId(7))));
        assert!(graph.is_empty());
    }

    #[test]
    fn test_root_world_matrix_is_local() {
        let mut graph = SceneGraph::new();
        let pose = Pose::from_translation(Vec3::new(1.0, 2.0, 3.0)).with_rotation(Vec3::new(10.0, 20.0, 30.0));
        let root = graph.insert(group("root", pose), None).unwrap();
        assert_eq!(graph.world_matrix(root).unwrap(), pose.local_matrix());
    }

    #[test]
    fn test_child_inherits_parent_translation() {
        let mut graph = SceneGraph::new();
        let parent = graph
            .insert(group("parent", Pose::from_translation(Vec3::new(1.0, 2.0, 3.0))), None)
            .unwrap();
        let child = graph
            .insert(group("child", Pose::from_translation(Vec3::new(0.5, -1.0, 4.0))), Some(parent))
            .unwrap();

        let world = graph.world_position(child).unwrap();
        assert!(approx(world, Vec3::new(1.5, 1.0, 7.0)));
    }

    #[test]
    fn test_world_matrix_composes_rotation() {
        let mut graph = SceneGraph::new();
        let parent = graph
            .insert(group("parent", Pose::default().with_rotation(Vec3::new(0.0, 0.0, 90.0))), None)
            .unwrap();
        let child = graph
            .insert(group("child", Pose::from_translation(Vec3::X)), Some(parent))
            .unwrap();

        // Parent's 90° roll swings the child's +X offset onto +Y
        assert!(approx(graph.world_position(child).unwrap(), Vec3::Y));
    }

    #[test]
    fn test_set_world_position_solves_translation_only() {
        let mut graph = SceneGraph::new();
        let parent = graph
            .insert(
                group(
                    "parent",
                    Pose::from_translation(Vec3::new(2.0, 0.0, 0.0)).with_rotation(Vec3::new(0.0, 90.0, 0.0)),
                ),
                None,
            )
            .unwrap();
        let child_pose = Pose::default()
            .with_rotation(Vec3::new(15.0, 0.0, 0.0))
            .with_scale(Vec3::splat(2.0))
            .with_pivot(Vec3::new(0.0, 1.0, 0.0));
        let child = graph.insert(group("child", child_pose), Some(parent)).unwrap();

        let target = Vec3::new(-3.0, 4.0, 1.5);
        graph.set_world_position(child, target).unwrap();

        assert!(approx(graph.world_position(child).unwrap(), target));
        let pose = graph.node(child).unwrap().pose;
        assert_eq!(pose.rotation, child_pose.rotation);
        assert_eq!(pose.scale, child_pose.scale);
        assert_eq!(pose.pivot, child_pose.pivot);
    }

    #[test]
    fn test_reparent_to_none_preserves_world_position() {
        let mut graph = SceneGraph::new();
        let parent = graph
            .insert(
                group(
                    "parent",
                    Pose::from_translation(Vec3::new(1.0, 2.0, 3.0)).with_rotation(Vec3::new(0.0, 45.0, 0.0)),
                ),
                None,
            )
            .unwrap();
        let child = graph
            .insert(group("child", Pose::from_translation(Vec3::new(0.0, 1.0, 2.0))), Some(parent))
            .unwrap();

        let before = graph.world_position(child).unwrap();
        graph.reparent(child, None).unwrap();

        assert_eq!(graph.parent(child).unwrap(), None);
        assert!(graph.node(parent).unwrap().children().is_empty());
        assert!(approx(graph.world_position(child).unwrap(), before));
        // Orientation inherited from the parent is baked into the local rotation
        assert!((graph.node(child).unwrap().pose.rotation.y - 45.0).abs() < 1e-3);
    }

    #[test]
    fn test_reparent_preserves_world_orientation() {
        let mut graph = SceneGraph::new();
        let a = graph
            .insert(group("a", Pose::default().with_rotation(Vec3::new(30.0, 0.0, 0.0))), None)
            .unwrap();
        let b = graph
            .insert(
                group("b", Pose::from_translation(Vec3::new(5.0, 0.0, 0.0)).with_rotation(Vec3::new(0.0, 0.0, 60.0))),
                None,
            )
            .unwrap();
        let child = graph
            .insert(
                group("child", Pose::from_translation(Vec3::new(0.0, 2.0, 0.0)).with_rotation(Vec3::new(0.0, 20.0, 0.0))),
                Some(a),
            )
            .unwrap();

        let position = graph.world_position(child).unwrap();
        let before = graph.world_matrix(child).unwrap().transform_vector3(Vec3::X);

        graph.reparent(child, Some(b)).unwrap();

        assert_eq!(graph.parent(child).unwrap(), Some(b));
        assert!(approx(graph.world_position(child).unwrap(), position));
        let after = graph.world_matrix(child).unwrap().transform_vector3(Vec3::X);
        assert!(approx(after, before));
    }

    #[test]
    fn test_reparent_keeps_world_scale() {
        let mut graph = SceneGraph::new();
        let big = graph
            .insert(group("big", Pose::default().with_scale(Vec3::splat(2.0))), None)
            .unwrap();
        let small = graph
            .insert(group("small", Pose::default().with_scale(Vec3::splat(0.5))), None)
            .unwrap();
        let child = graph
            .insert(group("child", Pose::from_translation(Vec3::new(1.0, 0.0, 0.0))), Some(big))
            .unwrap();

        let position = graph.world_position(child).unwrap();
        let extent = graph.world_matrix(child).unwrap().transform_vector3(Vec3::ONE);

        graph.reparent(child, None).unwrap();
        assert!(approx(graph.node(child).unwrap().pose.scale, Vec3::splat(2.0)));
        assert!(approx(graph.world_position(child).unwrap(), position));

        graph.reparent(child, Some(small)).unwrap();
        assert!(approx(graph.node(child).unwrap().pose.scale, Vec3::splat(4.0)));
        assert!(approx(graph.world_position(child).unwrap(), position));
        assert!(approx(graph.world_matrix(child).unwrap().transform_vector3(Vec3::ONE), extent));
    }

    #[test]
    fn test_reparent_rejects_cycles() {
        let mut graph = SceneGraph::new();
        let root = graph.insert(group("root", Pose::default()), None).unwrap();
        let mid = graph.insert(group("mid", Pose::default()), Some(root)).unwrap();
        let leaf = graph.insert(group("leaf", Pose::default()), Some(mid)).unwrap();

        assert_eq!(
            graph.reparent(root, Some(leaf)),
            Err(GraphError::Cycle { node: root, parent: leaf })
        );
        assert_eq!(
            graph.reparent(mid, Some(mid)),
            Err(GraphError::Cycle { node: mid, parent: mid })
        );
        // Failed edits leave links untouched
        assert_eq!(graph.parent(mid).unwrap(), Some(root));
        assert_eq!(graph.parent(root).unwrap(), None);
    }

    #[test]
    fn test_remove_rehomes_children() {
        let mut graph = SceneGraph::new();
        let root = graph
            .insert(group("root", Pose::from_translation(Vec3::new(0.0, 1.0, 0.0))), None)
            .unwrap();
        let mid = graph
            .insert(
                group("mid", Pose::from_translation(Vec3::new(1.0, 0.0, 0.0)).with_rotation(Vec3::new(0.0, 0.0, 90.0))),
                Some(root),
            )
            .unwrap();
        let leaf = graph
            .insert(group("leaf", Pose::from_translation(Vec3::new(2.0, 0.0, 0.0))), Some(mid))
            .unwrap();

        let before = graph.world_position(leaf).unwrap();
        let removed = graph.remove(mid).unwrap();

        assert_eq!(removed.name, "mid");
        assert!(!graph.contains(mid));
        assert_eq!(graph.len(), 2);
        assert_eq!(graph.parent(leaf).unwrap(), Some(root));
        assert_eq!(graph.node(root).unwrap().children(), &[leaf]);
        assert!(approx(graph.world_position(leaf).unwrap(), before));
    }

    #[test]
    fn test_remove_root_makes_children_roots() {
        let mut graph = SceneGraph::new();
        let root = graph
            .insert(group("root", Pose::from_translation(Vec3::new(0.0, 3.0, 0.0))), None)
            .unwrap();
        let child = graph
            .insert(group("child", Pose::from_translation(Vec3::X)), Some(root))
            .unwrap();

        graph.remove(root).unwrap();

        assert_eq!(graph.parent(child).unwrap(), None);
        assert!(approx(graph.world_position(child).unwrap(), Vec3::new(1.0, 3.0, 0.0)));
        assert_eq!(graph.remove(root).unwrap_err(), GraphError::UnknownNode(root));
    }

    #[test]
    fn test_depth_first_parents_first() {
        let mut graph = SceneGraph::new();
        let a = graph.insert(group("a", Pose::default()), None).unwrap();
        let b = graph.insert(group("b", Pose::default()), None).unwrap();
        let c = graph.insert(group("c", Pose::default()), Some(b)).unwrap();
        // Move `a` under `c`: insertion order is now child-before-parent
        graph.reparent(a, Some(c)).unwrap();

        assert_eq!(graph.depth_first(), vec![b, c, a]);
    }
}
