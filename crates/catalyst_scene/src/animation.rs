use std::sync::Arc;

use catalyst_assets::animation::{AnimationSampler, SampledValue};

use crate::{
    error::SceneError,
    node::{NodeId, SceneGraph},
};

/// The samplers of one animation that drive one node.
#[derive(Clone, Debug)]
pub struct SceneNodeAnimation {
    pub node: NodeId,
    pub samplers: Vec<Arc<AnimationSampler>>,
}

#[derive(Clone, Debug)]
pub struct SceneAnimation {
    pub name: String,
    pub max_time: f32,
    pub nodes: Vec<SceneNodeAnimation>,
}

impl SceneAnimation {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            max_time: 0.0,
            nodes: Vec::new(),
        }
    }

    pub fn add_sampler(&mut self, node: NodeId, sampler: Arc<AnimationSampler>) {
        self.max_time = self.max_time.max(sampler.max_time());
        match self.nodes.iter_mut().find(|animation| animation.node == node) {
            Some(animation) => animation.samplers.push(sampler),
            None => self.nodes.push(SceneNodeAnimation {
                node,
                samplers: vec![sampler],
            }),
        }
    }

    /// Writes the pose at `time` into the local matrices of the animated
    /// nodes. Properties without a sampler keep their rest value. World
    /// matrices are left for the caller to recompute.
    pub fn apply(&self, graph: &mut SceneGraph, time: f32) {
        for animation in &self.nodes {
            let node = graph.node_mut(animation.node);
            let mut pose = node.transform;
            for sampler in &animation.samplers {
                match sampler.sample(time) {
                    SampledValue::Translation(translation) => pose.translation = translation,
                    SampledValue::Rotation(rotation) => pose.rotation = rotation.normalize(),
                    SampledValue::Scale(scale) => pose.scale = scale,
                    SampledValue::Weight(weight) => match node.weights.first_mut() {
                        Some(first) => *first = weight,
                        None => node.weights.push(weight),
                    },
                }
            }
            node.local_transform = pose.compute_matrix();
            node.is_animated = true;
        }
    }

    /// Hands the animated nodes back to their TRS fields.
    pub fn reset(&self, graph: &mut SceneGraph) {
        for animation in &self.nodes {
            graph.node_mut(animation.node).is_animated = false;
        }
    }

    /// Rebinds the animation to a copied graph. Nodes that were filtered out
    /// of the copy are dropped when `allow_missing` is set; otherwise a
    /// missing node fails the copy.
    pub fn remap(
        &self,
        remap: &[Option<NodeId>],
        allow_missing: bool,
    ) -> Result<Self, SceneError> {
        let mut nodes = Vec::with_capacity(self.nodes.len());
        for animation in &self.nodes {
            match remap.get(animation.node.index()).copied().flatten() {
                Some(node) => nodes.push(SceneNodeAnimation {
                    node,
                    samplers: animation.samplers.clone(),
                }),
                None if allow_missing => continue,
                None => {
                    return Err(SceneError::UnresolvedAnimationNode {
                        animation: self.name.clone(),
                    });
                }
            }
        }
        Ok(Self {
            name: self.name.clone(),
            max_time: self.max_time,
            nodes,
        })
    }
}

#[cfg(test)]
mod tests {
    use catalyst_assets::animation::{Interpolation, KeyframeTrack};
    use catalyst_core::transform::Transform;
    use glam::{Mat4, Vec3};

    use super::*;
    use crate::node::SceneNode;

    fn slide() -> Arc<AnimationSampler> {
        let track = KeyframeTrack::new(
            &[0.0, 2.0],
            &[Vec3::ZERO, Vec3::new(4.0, 0.0, 0.0)],
            Interpolation::Linear,
        )
        .unwrap();
        Arc::new(AnimationSampler::Translation(track))
    }

    #[test]
    fn apply_overrides_only_sampled_properties() {
        let mut graph = SceneGraph::new();
        let mut rest = Transform::IDENTITY;
        rest.scale = Vec3::splat(2.0);
        let node = graph.add_node(SceneNode::new("mover", rest), None);
        let mut animation = SceneAnimation::new("slide");
        animation.add_sampler(node, slide());

        animation.apply(&mut graph, 1.0);

        assert_eq!(animation.max_time, 2.0);
        assert!(graph.node(node).is_animated);
        assert_eq!(
            graph.node(node).local_transform,
            Mat4::from_scale_rotation_translation(Vec3::splat(2.0), Default::default(), Vec3::new(2.0, 0.0, 0.0))
        );

        animation.reset(&mut graph);
        graph.calculate_transforms();
        assert_eq!(graph.node(node).local_transform, rest.compute_matrix());
    }

    #[test]
    fn remap_fails_on_missing_node_unless_allowed() {
        let mut animation = SceneAnimation::new("slide");
        animation.add_sampler(NodeId(1), slide());

        assert!(matches!(
            animation.remap(&[Some(NodeId(0)), None], false),
            Err(SceneError::UnresolvedAnimationNode { .. })
        ));
        assert!(animation.remap(&[Some(NodeId(0)), None], true).unwrap().nodes.is_empty());
        assert_eq!(
            animation.remap(&[None, Some(NodeId(0))], false).unwrap().nodes[0].node,
            NodeId(0)
        );
    }
}
