use std::{cmp::Ordering, sync::Arc};

use catalyst_assets::{
    material::{MaterialMask, SceneMaterial},
    mesh::{SceneMesh, SceneMeshPrimitive, VertexAttributes},
};
use catalyst_scene::{SceneModelInstance, node::NodeId};
use flecs_ecs::prelude::*;
use glam::Mat4;

use crate::{
    error::RenderError,
    shader::{ShaderHandle, ShaderKey, ShaderProvider},
};

/// One mesh primitive ready to draw this frame.
#[derive(Clone, Debug)]
pub struct Renderable {
    /// Model matrix. For bone driven primitives this is the instance
    /// placement only; the bones carry the node transforms.
    pub world_transform: Mat4,
    /// Empty when the primitive is not skinned.
    pub bones: Vec<Mat4>,
    pub mesh: Option<Arc<SceneMesh>>,
    pub primitive: usize,
    pub material: Option<Arc<SceneMaterial>>,
    pub vertex_mask: VertexAttributes,
    /// Shader used last time this renderable was drawn.
    pub shader: Option<ShaderHandle>,
    pub node: Option<NodeId>,
}

impl Default for Renderable {
    fn default() -> Self {
        Self {
            world_transform: Mat4::IDENTITY,
            bones: Vec::new(),
            mesh: None,
            primitive: 0,
            material: None,
            vertex_mask: VertexAttributes::empty(),
            shader: None,
            node: None,
        }
    }
}

impl Renderable {
    pub fn has_bones(&self) -> bool {
        !self.bones.is_empty()
    }

    pub fn material_mask(&self) -> MaterialMask {
        self.material
            .as_ref()
            .map_or(MaterialMask::empty(), |material| material.mask())
    }

    pub fn key(&self) -> ShaderKey {
        ShaderKey {
            material: self.material_mask(),
            vertex: self.vertex_mask,
        }
    }

    pub fn mesh_primitive(&self) -> Option<&SceneMeshPrimitive> {
        self.mesh.as_ref()?.primitives.get(self.primitive)
    }

    /// Drops every reference but keeps the bone allocation for reuse. The
    /// last shader is kept as a lookup hint.
    fn reset(&mut self) {
        self.world_transform = Mat4::IDENTITY;
        self.bones.clear();
        self.mesh = None;
        self.primitive = 0;
        self.material = None;
        self.vertex_mask = VertexAttributes::empty();
        self.node = None;
    }
}

/// Free list of renderables, refilled by [`RenderableProvider::free_all`].
#[derive(Debug, Default)]
pub struct RenderablePool {
    free: Vec<Renderable>,
}

impl RenderablePool {
    pub fn obtain(&mut self) -> Renderable {
        self.free.pop().unwrap_or_default()
    }

    pub fn free(&mut self, mut renderable: Renderable) {
        renderable.reset();
        self.free.push(renderable);
    }

    pub fn available(&self) -> usize {
        self.free.len()
    }
}

/// Turns scene model instances into renderables. A render pass calls
/// `obtain_scene_renderables`, `sort`, draws, then `free_all`, every frame.
#[derive(Debug, Default)]
pub struct RenderableProvider {
    pool: RenderablePool,
}

impl RenderableProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pool(&self) -> &RenderablePool {
        &self.pool
    }

    /// Emits the renderables of every instance matched by `instances`.
    pub fn obtain_scene_renderables(
        &mut self,
        instances: &Query<&SceneModelInstance>,
        shaders: &mut ShaderProvider,
        out: &mut Vec<Renderable>,
    ) -> Result<(), RenderError> {
        let mut result = Ok(());
        instances.each(|instance| {
            if result.is_ok() {
                result = self.obtain_instance_renderables(instance, shaders, out);
            }
        });
        result
    }

    /// Emits one renderable per primitive of every mesh node of `instance`.
    pub fn obtain_instance_renderables(
        &mut self,
        instance: &SceneModelInstance,
        shaders: &mut ShaderProvider,
        out: &mut Vec<Renderable>,
    ) -> Result<(), RenderError> {
        for id in instance.graph.depth_first_all() {
            let node = instance.graph.node(id);
            let Some(node_mesh) = &node.mesh else {
                continue;
            };
            for (p, primitive) in node_mesh.mesh.primitives.iter().enumerate() {
                let mut renderable = self.pool.obtain();
                renderable.mesh = Some(node_mesh.mesh.clone());
                renderable.primitive = p;
                renderable.node = Some(id);
                renderable.material = Some(primitive.material.clone());
                renderable.vertex_mask = primitive.vertex_info.mask;

                match node_mesh.bones.get(p).and_then(Option::as_ref) {
                    Some(bones) if !bones.matrices.is_empty() => {
                        renderable.bones.extend_from_slice(&bones.matrices);
                        renderable.world_transform = instance.transform;
                    }
                    _ => {
                        renderable.vertex_mask.remove(VertexAttributes::SKINNING);
                        renderable.world_transform = instance.transform * node.world_transform;
                    }
                }

                match shaders.get_shader(&renderable) {
                    Ok(shader) => renderable.shader = Some(shader),
                    Err(err) => {
                        self.pool.free(renderable);
                        return Err(err);
                    }
                }
                out.push(renderable);
            }
        }
        Ok(())
    }

    /// Orders renderables by their shaders' relative ordering, grouping
    /// equal shaders together.
    pub fn sort(&self, out: &mut [Renderable], shaders: &ShaderProvider) {
        out.sort_by(|a, b| {
            let programs = (
                a.shader.and_then(|handle| shaders.program(handle)),
                b.shader.and_then(|handle| shaders.program(handle)),
            );
            match programs {
                (Some(pa), Some(pb)) => pa
                    .compare_to(pb)
                    .then_with(|| a.shader.map(|h| h.index).cmp(&b.shader.map(|h| h.index))),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            }
        });
    }

    /// Returns every renderable in `out` to the pool.
    pub fn free_all(&mut self, out: &mut Vec<Renderable>) {
        for renderable in out.drain(..) {
            self.pool.free(renderable);
        }
    }
}
