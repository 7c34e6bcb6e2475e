use std::sync::Arc;

use flecs_ecs::prelude::*;
use glam::Mat4;

use crate::{
    animation::SceneAnimation,
    error::SceneError,
    model::SceneModel,
    node::{NodeId, SceneGraph},
};

/// A placed copy of a [`SceneModel`]. It owns its own graph, so animating or
/// moving it never touches the model or other instances.
#[derive(Component, Debug)]
pub struct SceneModelInstance {
    pub model: Arc<SceneModel>,
    pub transform: Mat4,
    pub graph: SceneGraph,
    pub animations: Vec<SceneAnimation>,
    active_animation: Option<usize>,
    animation_time: f32,
}

impl SceneModelInstance {
    /// Copies the model's graph, or only the root subtrees named in
    /// `root_filter` when it is not empty. The first animation starts
    /// playing and all transforms are computed before this returns.
    pub fn new(model: Arc<SceneModel>, transform: Mat4, root_filter: &[&str]) -> Result<Self, SceneError> {
        let master = &model.graph;
        let roots: Vec<NodeId> = if root_filter.is_empty() {
            master.roots().to_vec()
        } else {
            let roots: Vec<NodeId> = master
                .roots()
                .iter()
                .copied()
                .filter(|&root| root_filter.contains(&master.node(root).name.as_str()))
                .collect();
            if roots.is_empty() {
                return Err(SceneError::EmptyFilter(
                    root_filter.iter().map(|name| name.to_string()).collect(),
                ));
            }
            roots
        };

        let (graph, remap) = master.copy_subtrees(&roots)?;
        let filtered = !root_filter.is_empty();
        let animations = model
            .animations
            .iter()
            .map(|animation| animation.remap(&remap, filtered))
            .filter(|animation| animation.as_ref().map_or(true, |animation| !animation.nodes.is_empty()))
            .collect::<Result<Vec<_>, _>>()?;

        let mut instance = Self {
            model,
            transform,
            graph,
            active_animation: if animations.is_empty() { None } else { Some(0) },
            animations,
            animation_time: 0.0,
        };
        instance.calculate_transforms();
        Ok(instance)
    }

    /// Recomputes local, world and bone matrices, posing the active
    /// animation at the current time first.
    pub fn calculate_transforms(&mut self) {
        if let Some(animation) = self.active_animation.map(|index| &self.animations[index]) {
            animation.apply(&mut self.graph, self.animation_time);
        }
        self.graph.calculate_transforms();
    }

    /// Advances the active animation by `delta` seconds. Time past the end
    /// of the animation wraps back to zero.
    pub fn update(&mut self, delta: f32) {
        let Some(index) = self.active_animation else {
            return;
        };
        self.animation_time += delta;
        if self.animation_time > self.animations[index].max_time {
            self.animation_time = 0.0;
        }
        self.calculate_transforms();
    }

    /// Switches to the named animation and restarts it.
    pub fn set_animation(&mut self, name: &str) -> Result<(), SceneError> {
        let index = self
            .animations
            .iter()
            .position(|animation| animation.name == name)
            .ok_or_else(|| SceneError::AnimationNotFound(name.to_string()))?;
        if let Some(previous) = self.active_animation {
            self.animations[previous].reset(&mut self.graph);
        }
        self.active_animation = Some(index);
        self.animation_time = 0.0;
        self.calculate_transforms();
        Ok(())
    }

    /// Stops animating and returns every node to its rest pose.
    pub fn stop_animation(&mut self) {
        if let Some(previous) = self.active_animation.take() {
            self.animations[previous].reset(&mut self.graph);
        }
        self.animation_time = 0.0;
        self.calculate_transforms();
    }

    pub fn active_animation(&self) -> Option<&SceneAnimation> {
        self.active_animation.map(|index| &self.animations[index])
    }

    pub fn animation_time(&self) -> f32 {
        self.animation_time
    }

    /// Sets the playback time of the active animation directly.
    pub fn seek(&mut self, time: f32) {
        self.animation_time = time;
        self.calculate_transforms();
    }

    /// World matrix of a node including the instance placement.
    pub fn node_world_transform(&self, node: NodeId) -> Mat4 {
        self.transform * self.graph.node(node).world_transform
    }
}
