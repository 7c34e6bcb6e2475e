use catalyst_assets::{
    material::{AttributeKind, MaterialMask},
    mesh::VertexAttributes,
};

use super::{bind_transforms, bones_fit, push_define, push_vertex_defines};
use crate::{
    renderable::Renderable,
    shader::{ShaderConfig, ShaderKey, ShaderProgram},
    uniforms::UniformBinder,
};

/// Depth prepass. Only positions, skinning and alpha testing change the
/// output, so many material variants collapse onto one depth variant.
pub struct DepthProgram {
    key: ShaderKey,
    config: ShaderConfig,
    prefix: String,
}

impl DepthProgram {
    pub fn key_for(renderable: &Renderable) -> ShaderKey {
        let material = renderable.material_mask();
        if material.contains(MaterialMask::ALPHA_TEST) {
            ShaderKey {
                material: material
                    & (MaterialMask::ALPHA_TEST
                        | MaterialMask::BASE_COLOUR
                        | MaterialMask::DIFFUSE_TEXTURE),
                vertex: renderable.vertex_mask
                    & (VertexAttributes::POSITION
                        | VertexAttributes::TEXCOORD_0
                        | VertexAttributes::SKINNING),
            }
        } else {
            ShaderKey {
                material: MaterialMask::empty(),
                vertex: renderable.vertex_mask
                    & (VertexAttributes::POSITION | VertexAttributes::SKINNING),
            }
        }
    }

    pub fn new(key: ShaderKey, config: &ShaderConfig) -> Self {
        let mut prefix = String::new();
        push_define(&mut prefix, "depthFlag");
        for kind in [
            AttributeKind::AlphaTest,
            AttributeKind::BaseColour,
            AttributeKind::DiffuseTexture,
        ] {
            if key.material.contains(kind.mask()) {
                push_define(&mut prefix, kind.define());
            }
        }
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

impl ShaderProgram for DepthProgram {
    fn key(&self) -> ShaderKey {
        self.key
    }

    fn can_render(&self, renderable: &Renderable) -> bool {
        Self::key_for(renderable) == self.key && bones_fit(renderable, &self.config)
    }

    fn weight(&self) -> i32 {
        -10
    }

    fn prefix(&self) -> &str {
        &self.prefix
    }

    fn bind(&self, renderable: &Renderable, binder: &mut dyn UniformBinder) {
        bind_transforms(renderable, binder);
        if !self.key.material.contains(MaterialMask::ALPHA_TEST) {
            return;
        }
        let Some(material) = &renderable.material else {
            return;
        };
        if let Some(cutoff) = material.alpha_cutoff() {
            binder.set_float("u_alphaTest", cutoff);
        }
        if let Some(colour) = material.base_colour() {
            binder.set_vec4("u_baseColour", colour);
        }
        if let Some(texture) = material.texture(AttributeKind::DiffuseTexture) {
            binder.set_texture("u_diffuseTexture", 0, &texture.texture);
        }
    }
}
