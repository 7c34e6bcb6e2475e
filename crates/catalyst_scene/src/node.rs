//! Scene node arena.
//!
//! Nodes live in one `Vec` per graph and refer to each other through
//! [`NodeId`] handles: parents, children, and skin joints alike. Copying a
//! graph clones the arena and rewrites the handles through a remap table.

use std::sync::Arc;

use catalyst_assets::{mesh::SceneMesh, skin::SceneSkin};
use catalyst_core::transform::Transform;
use glam::Mat4;

use crate::error::SceneError;

/// Handle of a node within one [`SceneGraph`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Bone state of one skinned primitive. The inverse bind matrices stay with
/// the shared skin; only the joint handles and the computed bones are
/// per-graph.
#[derive(Clone, Debug)]
pub struct PrimitiveBones {
    pub skin: Arc<SceneSkin>,
    pub joints: Vec<NodeId>,
    pub matrices: Vec<Mat4>,
}

/// A mesh attached to a node, with optional bones per primitive.
#[derive(Clone, Debug)]
pub struct NodeMesh {
    pub mesh: Arc<SceneMesh>,
    pub bones: Vec<Option<PrimitiveBones>>,
}

impl NodeMesh {
    pub fn new(mesh: Arc<SceneMesh>) -> Self {
        let bones = vec![None; mesh.primitives.len()];
        Self { mesh, bones }
    }
}

#[derive(Clone, Debug)]
pub struct SceneNode {
    pub name: String,
    /// Index of the document node this was built from.
    pub source_index: Option<usize>,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub transform: Transform,
    pub local_transform: Mat4,
    pub world_transform: Mat4,
    /// Set once an animation writes `local_transform` directly; the TRS
    /// fields are ignored until it is cleared.
    pub is_animated: bool,
    pub inherit_transform: bool,
    pub mesh: Option<NodeMesh>,
    pub camera: Option<usize>,
    pub skin: Option<usize>,
    pub weights: Vec<f32>,
}

impl SceneNode {
    pub fn new(name: impl Into<String>, transform: Transform) -> Self {
        Self {
            name: name.into(),
            source_index: None,
            parent: None,
            children: Vec::new(),
            transform,
            local_transform: transform.compute_matrix(),
            world_transform: Mat4::IDENTITY,
            is_animated: false,
            inherit_transform: true,
            mesh: None,
            camera: None,
            skin: None,
            weights: Vec::new(),
        }
    }

    pub fn has_mesh(&self) -> bool {
        self.mesh.is_some()
    }

    pub fn has_camera(&self) -> bool {
        self.camera.is_some()
    }

    /// Re-derives the local matrix from TRS unless an animation owns it.
    pub fn calculate_local_transform(&mut self) {
        if !self.is_animated {
            self.local_transform = self.transform.compute_matrix();
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct SceneGraph {
    nodes: Vec<SceneNode>,
    roots: Vec<NodeId>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node below `parent`, or as a new root.
    pub fn add_node(&mut self, mut node: SceneNode, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        node.parent = parent;
        self.nodes.push(node);
        match parent {
            Some(parent) => self.nodes[parent.index()].children.push(id),
            None => self.roots.push(id),
        }
        id
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn node(&self, id: NodeId) -> &SceneNode {
        &self.nodes[id.index()]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut SceneNode {
        &mut self.nodes[id.index()]
    }

    pub fn get(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(id.index())
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &SceneNode)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (NodeId(i as u32), node))
    }

    /// Every node below `root` (inclusive), parents before children.
    pub fn depth_first(&self, root: NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.node(id).children.iter().rev());
        }
        order
    }

    /// Every node of the graph, root by root, parents before children.
    pub fn depth_first_all(&self) -> Vec<NodeId> {
        self.roots
            .iter()
            .flat_map(|&root| self.depth_first(root))
            .collect()
    }

    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.nodes().find(|(_, node)| node.name == name).map(|(id, _)| id)
    }

    pub fn find_by_source_index(&self, index: usize) -> Option<NodeId> {
        self.nodes()
            .find(|(_, node)| node.source_index == Some(index))
            .map(|(id, _)| id)
    }

    /// Recomputes local and world matrices top-down, then every bone.
    pub fn calculate_transforms(&mut self) {
        for id in self.depth_first_all() {
            self.calculate_node_transform(id);
        }
        self.calculate_bone_transforms();
    }

    fn calculate_node_transform(&mut self, id: NodeId) {
        let parent_world = self
            .node(id)
            .parent
            .map(|parent| self.node(parent).world_transform);
        let node = self.node_mut(id);
        node.calculate_local_transform();
        node.world_transform = match parent_world {
            Some(parent_world) if node.inherit_transform => parent_world * node.local_transform,
            _ => node.local_transform,
        };
    }

    /// `bone[i] = world(joint[i]) * inverse_bind[i]`. World matrices must be
    /// current.
    pub fn calculate_bone_transforms(&mut self) {
        let worlds: Vec<Mat4> = self.nodes.iter().map(|node| node.world_transform).collect();
        for node in &mut self.nodes {
            let Some(mesh) = &mut node.mesh else {
                continue;
            };
            for bones in mesh.bones.iter_mut().flatten() {
                for (i, (matrix, joint)) in bones.matrices.iter_mut().zip(&bones.joints).enumerate() {
                    *matrix = worlds[joint.index()] * bones.skin.inverse_bind_matrices[i];
                }
            }
        }
    }

    /// Copies the subtrees under `roots` into a new graph. The returned
    /// table maps every old handle to its new one, or `None` for nodes that
    /// were left out. Bone joints are remapped; a joint outside the copied
    /// subtrees fails the copy.
    pub fn copy_subtrees(
        &self,
        roots: &[NodeId],
    ) -> Result<(SceneGraph, Vec<Option<NodeId>>), SceneError> {
        let mut remap = vec![None; self.nodes.len()];
        let mut order = Vec::new();
        for &root in roots {
            for id in self.depth_first(root) {
                remap[id.index()] = Some(NodeId(order.len() as u32));
                order.push(id);
            }
        }

        let map = |id: NodeId| remap[id.index()];
        let mut nodes = Vec::with_capacity(order.len());
        for &old in &order {
            let mut node = self.node(old).clone();
            node.parent = node.parent.and_then(map);
            node.children = node.children.iter().filter_map(|&child| map(child)).collect();
            if let Some(mesh) = &mut node.mesh {
                for bones in mesh.bones.iter_mut().flatten() {
                    for (joint, &source) in bones.joints.iter_mut().zip(&bones.skin.joints) {
                        *joint = map(*joint).ok_or(SceneError::MissingJoint {
                            skin: bones.skin.index,
                            joint: source,
                        })?;
                    }
                }
            }
            nodes.push(node);
        }

        let graph = SceneGraph {
            nodes,
            roots: roots.iter().filter_map(|&root| map(root)).collect(),
        };
        Ok((graph, remap))
    }
}

#[cfg(test)]
mod tests {
    use glam::{Quat, Vec3};

    use super::*;

    fn chain() -> (SceneGraph, NodeId, NodeId) {
        let mut graph = SceneGraph::new();
        let parent = graph.add_node(SceneNode::new("parent", Transform::from_xyz(1.0, 0.0, 0.0)), None);
        let child = graph.add_node(
            SceneNode::new("child", Transform::from_rotation(Quat::from_rotation_z(0.5))),
            Some(parent),
        );
        graph.calculate_transforms();
        (graph, parent, child)
    }

    #[test]
    fn world_is_parent_world_times_local() {
        let (graph, parent, child) = chain();
        let expected = graph.node(parent).world_transform * graph.node(child).local_transform;
        assert_eq!(graph.node(child).world_transform, expected);
    }

    #[test]
    fn non_inheriting_node_uses_local_as_world() {
        let (mut graph, _, child) = chain();
        graph.node_mut(child).inherit_transform = false;
        graph.calculate_transforms();
        assert_eq!(graph.node(child).world_transform, graph.node(child).local_transform);
    }

    #[test]
    fn local_transform_follows_trs_until_animated() {
        let (mut graph, parent, _) = chain();
        let node = graph.node_mut(parent);
        node.calculate_local_transform();
        let first = node.local_transform;
        node.calculate_local_transform();
        assert_eq!(node.local_transform, first);

        node.transform.translation = Vec3::new(0.0, 3.0, 0.0);
        node.calculate_local_transform();
        assert_eq!(node.local_transform, Mat4::from_translation(Vec3::new(0.0, 3.0, 0.0)));

        node.is_animated = true;
        node.local_transform = Mat4::from_scale(Vec3::splat(2.0));
        node.transform.translation = Vec3::ZERO;
        node.calculate_local_transform();
        assert_eq!(node.local_transform, Mat4::from_scale(Vec3::splat(2.0)));
    }

    #[test]
    fn copy_of_one_subtree_remaps_handles() {
        let mut graph = SceneGraph::new();
        let a = graph.add_node(SceneNode::new("a", Transform::IDENTITY), None);
        let b = graph.add_node(SceneNode::new("b", Transform::IDENTITY), None);
        let b_child = graph.add_node(SceneNode::new("b_child", Transform::IDENTITY), Some(b));

        let (copy, remap) = graph.copy_subtrees(&[b]).unwrap();

        assert_eq!(copy.len(), 2);
        assert_eq!(remap[a.index()], None);
        let new_b = remap[b.index()].unwrap();
        let new_child = remap[b_child.index()].unwrap();
        assert_eq!(copy.roots(), &[new_b]);
        assert_eq!(copy.node(new_b).parent, None);
        assert_eq!(copy.node(new_b).children, [new_child]);
        assert_eq!(copy.node(new_child).parent, Some(new_b));
        assert_eq!(copy.find_by_name("b_child"), Some(new_child));
    }
}
