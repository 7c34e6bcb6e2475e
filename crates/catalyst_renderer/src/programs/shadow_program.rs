use catalyst_assets::{material::MaterialMask, mesh::VertexAttributes};

use super::{bind_transforms, bones_fit, push_define, push_vertex_defines};
use crate::{
    renderable::Renderable,
    shader::{ShaderConfig, ShaderKey, ShaderProgram},
    uniforms::UniformBinder,
};

/// Shadow map pass: geometry only, one variant per skinned / unskinned.
pub struct ShadowProgram {
    key: ShaderKey,
    config: ShaderConfig,
    prefix: String,
}

impl ShadowProgram {
    pub fn key_for(renderable: &Renderable) -> ShaderKey {
        ShaderKey {
            material: MaterialMask::empty(),
            vertex: renderable.vertex_mask
                & (VertexAttributes::POSITION | VertexAttributes::SKINNING),
        }
    }

    pub fn new(key: ShaderKey, config: &ShaderConfig) -> Self {
        let mut prefix = String::new();
        push_define(&mut prefix, "shadowMapFlag");
        push_vertex_defines(&mut prefix, key.vertex, config);
        Self {
            key,
            config: *config,
            prefix,
        }
    }

    pub fn create(renderable: &Renderable, config: &ShaderConfig) -> Box<dyn ShaderProgram> {
        Box::new(Self::new(Self::key_for(renderable), config))
    }
}

impl ShaderProgram for ShadowProgram {
    fn key(&self) -> ShaderKey {
        self.key
    }

    fn can_render(&self, renderable: &Renderable) -> bool {
        Self::key_for(renderable) == self.key && bones_fit(renderable, &self.config)
    }

    fn weight(&self) -> i32 {
        -20
    }

    fn prefix(&self) -> &str {
        &self.prefix
    }

    fn bind(&self, renderable: &Renderable, binder: &mut dyn UniformBinder) {
        bind_transforms(renderable, binder);
    }
}
