use catalyst_assets::SceneResourceContext;
use glam::Mat4;

use crate::{
    animation::SceneAnimation,
    error::SceneError,
    node::{NodeId, NodeMesh, PrimitiveBones, SceneGraph, SceneNode},
};

/// The shared, read-only graph of a loaded asset. Instances copy it.
#[derive(Clone, Debug)]
pub struct SceneModel {
    pub name: String,
    pub graph: SceneGraph,
    pub animations: Vec<SceneAnimation>,
}

impl SceneModel {
    /// Builds the document's default scene.
    pub fn from_context(name: impl Into<String>, context: &SceneResourceContext) -> Result<Self, SceneError> {
        let scene = context.default_scene.ok_or(SceneError::NoScenes)?;
        Self::from_scene(name, context, scene)
    }

    pub fn from_scene(
        name: impl Into<String>,
        context: &SceneResourceContext,
        scene: usize,
    ) -> Result<Self, SceneError> {
        let name = name.into();
        let scene_data = context.scenes.get(scene).ok_or(SceneError::MissingScene(scene))?;

        // --- STEP 1: NODES ---
        let mut graph = SceneGraph::new();
        for &root in &scene_data.nodes {
            build_node(context, &mut graph, root, None);
        }

        // --- STEP 2: SKINS ---
        wire_skins(context, &mut graph)?;

        // --- STEP 3: ANIMATIONS ---
        let animations = discover_animations(context, &graph);

        // --- STEP 4: TRANSFORMS ---
        graph.calculate_transforms();

        log::info!(
            "built scene model {name}: {} nodes, {} animations",
            graph.len(),
            animations.len()
        );
        Ok(Self {
            name,
            graph,
            animations,
        })
    }

    pub fn animation(&self, name: &str) -> Option<&SceneAnimation> {
        self.animations.iter().find(|animation| animation.name == name)
    }
}

fn build_node(context: &SceneResourceContext, graph: &mut SceneGraph, index: usize, parent: Option<NodeId>) {
    let data = &context.nodes[index];
    let name = data.name.clone().unwrap_or_else(|| format!("node{index}"));
    let mut node = SceneNode::new(name, data.transform());
    node.source_index = Some(index);
    node.skin = data.skin;

    if let Some(mesh) = data.mesh {
        let mesh = context.meshes[mesh].clone();
        node.weights = if data.weights.is_empty() {
            mesh.weights.clone()
        } else {
            data.weights.clone()
        };
        node.mesh = Some(NodeMesh::new(mesh));
    } else {
        node.camera = data.camera;
    }

    let id = graph.add_node(node, parent);
    for &child in &data.children {
        build_node(context, graph, child, Some(id));
    }
}

/// Binds every primitive carrying joint and weight streams to the joint
/// nodes of its skin. The joints are looked up across the whole graph.
fn wire_skins(context: &SceneResourceContext, graph: &mut SceneGraph) -> Result<(), SceneError> {
    let skinned: Vec<(NodeId, usize)> = graph
        .nodes()
        .filter(|(_, node)| node.has_mesh())
        .filter_map(|(id, node)| node.skin.map(|skin| (id, skin)))
        .collect();

    for (id, skin_index) in skinned {
        let skin = &context.skins[skin_index];
        let joints = skin
            .joints
            .iter()
            .map(|&joint| {
                graph
                    .find_by_source_index(joint)
                    .ok_or(SceneError::MissingJoint {
                        skin: skin_index,
                        joint,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        if let Some(mesh) = &mut graph.node_mut(id).mesh {
            // Primitives without joint and weight streams stay rigid
            for (bones, primitive) in mesh.bones.iter_mut().zip(&mesh.mesh.primitives) {
                *bones = primitive.is_skinned().then(|| PrimitiveBones {
                    skin: skin.clone(),
                    joints: joints.clone(),
                    matrices: vec![Mat4::IDENTITY; joints.len()],
                });
            }
        }
    }
    Ok(())
}

/// Groups the samplers of every node in the graph by animation name, in
/// document order.
fn discover_animations(context: &SceneResourceContext, graph: &SceneGraph) -> Vec<SceneAnimation> {
    let mut animations: Vec<SceneAnimation> = context
        .animation_data
        .names
        .iter()
        .map(SceneAnimation::new)
        .collect();

    for id in graph.depth_first_all() {
        let Some(source) = graph.node(id).source_index else {
            continue;
        };
        for binding in context.animation_data.for_node(source) {
            if let Some(animation) = animations.iter_mut().find(|animation| animation.name == binding.animation) {
                animation.add_sampler(id, binding.sampler.clone());
            }
        }
    }

    animations.retain(|animation| !animation.nodes.is_empty());
    animations
}
