use std::cmp::Ordering;

use bytemuck::{Pod, Zeroable};
use catalyst_assets::material::{AttributeKind, MaterialAttribute, MaterialMask, SceneMaterial};

use super::{bind_transforms, bones_fit, push_define, push_vertex_defines};
use crate::{
    renderable::Renderable,
    shader::{ShaderConfig, ShaderKey, ShaderProgram},
    uniforms::UniformBinder,
};

const TEXTURE_SLOTS: [(AttributeKind, &str); 5] = [
    (AttributeKind::DiffuseTexture, "u_diffuseTexture"),
    (AttributeKind::MetallicRoughnessTexture, "u_metallicRoughnessTexture"),
    (AttributeKind::NormalTexture, "u_normalTexture"),
    (AttributeKind::OcclusionTexture, "u_occlusionTexture"),
    (AttributeKind::EmissiveTexture, "u_emissiveTexture"),
];

// Scalar material settings, uploaded as one block
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct MaterialUniform {
    pub base_colour: [f32; 4],   // 16 bytes
    pub emissive: [f32; 4],      // 16 bytes, w unused
    pub metallic: f32,           // 4 bytes
    pub roughness: f32,          // 4 bytes
    pub alpha_cutoff: f32,       // 4 bytes
    pub normal_scale: f32,       // 4 bytes
    pub occlusion_strength: f32, // 4 bytes
    pub _padding: [f32; 3],      // 12 bytes (Total: 64 bytes)
}

impl Default for MaterialUniform {
    fn default() -> Self {
        Self {
            base_colour: [1.0; 4],
            emissive: [0.0; 4],
            metallic: 1.0,
            roughness: 1.0,
            alpha_cutoff: 0.0,
            normal_scale: 1.0,
            occlusion_strength: 1.0,
            _padding: [0.0; 3],
        }
    }
}

impl From<&SceneMaterial> for MaterialUniform {
    fn from(material: &SceneMaterial) -> Self {
        let mut uniform = Self::default();
        for attribute in material.attributes() {
            match attribute {
                MaterialAttribute::BaseColour(colour) => uniform.base_colour = colour.to_array(),
                MaterialAttribute::Metallic(metallic) => uniform.metallic = *metallic,
                MaterialAttribute::Roughness(roughness) => uniform.roughness = *roughness,
                MaterialAttribute::Emissive(emissive) => {
                    uniform.emissive = emissive.extend(0.0).to_array()
                }
                MaterialAttribute::NormalTexture(texture) => uniform.normal_scale = texture.scale,
                MaterialAttribute::OcclusionTexture(texture) => {
                    uniform.occlusion_strength = texture.scale
                }
                MaterialAttribute::AlphaTest(cutoff) => uniform.alpha_cutoff = *cutoff,
                _ => {}
            }
        }
        uniform
    }
}

/// Lit pass variant generated for one exact (material, vertex) mask pair.
pub struct MaterialProgram {
    key: ShaderKey,
    config: ShaderConfig,
    prefix: String,
}

impl MaterialProgram {
    pub fn new(key: ShaderKey, config: &ShaderConfig) -> Self {
        let mut prefix = String::new();
        for kind in AttributeKind::ALL {
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
        Box::new(Self::new(renderable.key(), config))
    }
}

impl ShaderProgram for MaterialProgram {
    fn key(&self) -> ShaderKey {
        self.key
    }

    fn can_render(&self, renderable: &Renderable) -> bool {
        renderable.key() == self.key && bones_fit(renderable, &self.config)
    }

    /// Blended variants draw after every opaque one.
    fn weight(&self) -> i32 {
        if self.key.material.contains(MaterialMask::BLENDED) {
            10
        } else {
            0
        }
    }

    fn compare_to(&self, other: &dyn ShaderProgram) -> Ordering {
        self.weight()
            .cmp(&other.weight())
            .then_with(|| self.key.cmp(&other.key()))
    }

    fn prefix(&self) -> &str {
        &self.prefix
    }

    fn bind(&self, renderable: &Renderable, binder: &mut dyn UniformBinder) {
        bind_transforms(renderable, binder);
        let Some(material) = &renderable.material else {
            return;
        };

        let uniform = MaterialUniform::from(material.as_ref());
        binder.set_block("u_material", bytemuck::bytes_of(&uniform));

        for (unit, (kind, name)) in TEXTURE_SLOTS.into_iter().enumerate() {
            if let Some(texture) = material.texture(kind) {
                binder.set_texture(name, unit as u32, &texture.texture);
            }
        }
    }
}
