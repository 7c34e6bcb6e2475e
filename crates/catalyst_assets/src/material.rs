use std::{collections::BTreeMap, sync::Arc};

use bitflags::bitflags;
use glam::{Vec3, Vec4};

use crate::{
    document::{AlphaMode, MaterialData},
    texture::SceneTexture,
};

bitflags! {
    /// One bit per [`AttributeKind`] present on a material.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
    pub struct MaterialMask: u64 {
        const BASE_COLOUR = 1 << 0;
        const METALLIC = 1 << 1;
        const ROUGHNESS = 1 << 2;
        const EMISSIVE = 1 << 3;
        const DIFFUSE_TEXTURE = 1 << 4;
        const METALLIC_ROUGHNESS_TEXTURE = 1 << 5;
        const NORMAL_TEXTURE = 1 << 6;
        const OCCLUSION_TEXTURE = 1 << 7;
        const EMISSIVE_TEXTURE = 1 << 8;
        const DOUBLE_SIDED = 1 << 9;
        const ALPHA_TEST = 1 << 10;
        const BLENDED = 1 << 11;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AttributeKind {
    BaseColour,
    Metallic,
    Roughness,
    Emissive,
    DiffuseTexture,
    MetallicRoughnessTexture,
    NormalTexture,
    OcclusionTexture,
    EmissiveTexture,
    DoubleSided,
    AlphaTest,
    Blended,
}

impl AttributeKind {
    pub const ALL: [AttributeKind; 12] = [
        Self::BaseColour,
        Self::Metallic,
        Self::Roughness,
        Self::Emissive,
        Self::DiffuseTexture,
        Self::MetallicRoughnessTexture,
        Self::NormalTexture,
        Self::OcclusionTexture,
        Self::EmissiveTexture,
        Self::DoubleSided,
        Self::AlphaTest,
        Self::Blended,
    ];

    pub fn mask(self) -> MaterialMask {
        match self {
            Self::BaseColour => MaterialMask::BASE_COLOUR,
            Self::Metallic => MaterialMask::METALLIC,
            Self::Roughness => MaterialMask::ROUGHNESS,
            Self::Emissive => MaterialMask::EMISSIVE,
            Self::DiffuseTexture => MaterialMask::DIFFUSE_TEXTURE,
            Self::MetallicRoughnessTexture => MaterialMask::METALLIC_ROUGHNESS_TEXTURE,
            Self::NormalTexture => MaterialMask::NORMAL_TEXTURE,
            Self::OcclusionTexture => MaterialMask::OCCLUSION_TEXTURE,
            Self::EmissiveTexture => MaterialMask::EMISSIVE_TEXTURE,
            Self::DoubleSided => MaterialMask::DOUBLE_SIDED,
            Self::AlphaTest => MaterialMask::ALPHA_TEST,
            Self::Blended => MaterialMask::BLENDED,
        }
    }

    /// Name used for the matching shader `#define`.
    pub fn define(self) -> &'static str {
        match self {
            Self::BaseColour => "baseColourFlag",
            Self::Metallic => "metallicFlag",
            Self::Roughness => "roughnessFlag",
            Self::Emissive => "emissiveFlag",
            Self::DiffuseTexture => "diffuseTextureFlag",
            Self::MetallicRoughnessTexture => "metallicRoughnessTextureFlag",
            Self::NormalTexture => "normalTextureFlag",
            Self::OcclusionTexture => "occlusionTextureFlag",
            Self::EmissiveTexture => "emissiveTextureFlag",
            Self::DoubleSided => "doubleSidedFlag",
            Self::AlphaTest => "alphaTestFlag",
            Self::Blended => "blendedFlag",
        }
    }
}

#[derive(Clone, Debug)]
pub struct TextureAttribute {
    pub texture: Arc<SceneTexture>,
    pub tex_coord: u32,
    /// Normal map scale or occlusion strength; 1 for the other slots.
    pub scale: f32,
}

#[derive(Clone, Debug)]
pub enum MaterialAttribute {
    BaseColour(Vec4),
    Metallic(f32),
    Roughness(f32),
    Emissive(Vec3),
    DiffuseTexture(TextureAttribute),
    MetallicRoughnessTexture(TextureAttribute),
    NormalTexture(TextureAttribute),
    OcclusionTexture(TextureAttribute),
    EmissiveTexture(TextureAttribute),
    DoubleSided,
    /// Alpha cutoff.
    AlphaTest(f32),
    Blended,
}

impl MaterialAttribute {
    pub fn kind(&self) -> AttributeKind {
        match self {
            Self::BaseColour(_) => AttributeKind::BaseColour,
            Self::Metallic(_) => AttributeKind::Metallic,
            Self::Roughness(_) => AttributeKind::Roughness,
            Self::Emissive(_) => AttributeKind::Emissive,
            Self::DiffuseTexture(_) => AttributeKind::DiffuseTexture,
            Self::MetallicRoughnessTexture(_) => AttributeKind::MetallicRoughnessTexture,
            Self::NormalTexture(_) => AttributeKind::NormalTexture,
            Self::OcclusionTexture(_) => AttributeKind::OcclusionTexture,
            Self::EmissiveTexture(_) => AttributeKind::EmissiveTexture,
            Self::DoubleSided => AttributeKind::DoubleSided,
            Self::AlphaTest(_) => AttributeKind::AlphaTest,
            Self::Blended => AttributeKind::Blended,
        }
    }

    pub fn texture(&self) -> Option<&TextureAttribute> {
        match self {
            Self::DiffuseTexture(texture)
            | Self::MetallicRoughnessTexture(texture)
            | Self::NormalTexture(texture)
            | Self::OcclusionTexture(texture)
            | Self::EmissiveTexture(texture) => Some(texture),
            _ => None,
        }
    }
}

/// A sparse bag of material attributes. The mask always mirrors the set of
/// kinds present.
#[derive(Clone, Debug, Default)]
pub struct SceneMaterial {
    pub name: String,
    attributes: BTreeMap<AttributeKind, MaterialAttribute>,
    mask: MaterialMask,
}

impl SceneMaterial {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// The material used by primitives that name none: plain white.
    pub fn default_material() -> Self {
        let mut material = Self::new("default");
        material.set(MaterialAttribute::BaseColour(Vec4::ONE));
        material
    }

    pub fn set(&mut self, attribute: MaterialAttribute) {
        let kind = attribute.kind();
        self.mask |= kind.mask();
        self.attributes.insert(kind, attribute);
    }

    pub fn remove(&mut self, kind: AttributeKind) -> Option<MaterialAttribute> {
        self.mask.remove(kind.mask());
        self.attributes.remove(&kind)
    }

    pub fn get(&self, kind: AttributeKind) -> Option<&MaterialAttribute> {
        self.attributes.get(&kind)
    }

    pub fn has(&self, kind: AttributeKind) -> bool {
        self.mask.contains(kind.mask())
    }

    pub fn mask(&self) -> MaterialMask {
        self.mask
    }

    pub fn attributes(&self) -> impl Iterator<Item = &MaterialAttribute> {
        self.attributes.values()
    }

    pub fn base_colour(&self) -> Option<Vec4> {
        match self.get(AttributeKind::BaseColour) {
            Some(MaterialAttribute::BaseColour(colour)) => Some(*colour),
            _ => None,
        }
    }

    pub fn alpha_cutoff(&self) -> Option<f32> {
        match self.get(AttributeKind::AlphaTest) {
            Some(MaterialAttribute::AlphaTest(cutoff)) => Some(*cutoff),
            _ => None,
        }
    }

    pub fn texture(&self, kind: AttributeKind) -> Option<&TextureAttribute> {
        self.get(kind).and_then(MaterialAttribute::texture)
    }
}

/// Builds a material from its document form. Only what the source declares
/// is attached; a texture slot whose image failed to load is skipped.
pub fn build_material(
    index: usize,
    data: &MaterialData,
    textures: &[Option<Arc<SceneTexture>>],
) -> SceneMaterial {
    let name = data.name.clone().unwrap_or_else(|| format!("material{index}"));
    let mut material = SceneMaterial::new(name);

    let resolve = |texture: usize, tex_coord: u32, scale: f32| {
        let resolved = textures[texture].clone().map(|texture| TextureAttribute {
            texture,
            tex_coord,
            scale,
        });
        if resolved.is_none() {
            log::warn!("material {index}: texture {texture} has no image, slot left empty");
        }
        resolved
    };

    if let Some(pbr) = &data.pbr_metallic_roughness {
        if let Some(colour) = pbr.base_color_factor {
            material.set(MaterialAttribute::BaseColour(Vec4::from_array(colour)));
        }
        if let Some(metallic) = pbr.metallic_factor {
            material.set(MaterialAttribute::Metallic(metallic));
        }
        if let Some(roughness) = pbr.roughness_factor {
            material.set(MaterialAttribute::Roughness(roughness));
        }
        if let Some(info) = pbr.base_color_texture {
            if let Some(texture) = resolve(info.index, info.tex_coord, 1.0) {
                material.set(MaterialAttribute::DiffuseTexture(texture));
            }
        }
        if let Some(info) = pbr.metallic_roughness_texture {
            if let Some(texture) = resolve(info.index, info.tex_coord, 1.0) {
                material.set(MaterialAttribute::MetallicRoughnessTexture(texture));
            }
        }
    }
    if let Some(info) = data.normal_texture {
        if let Some(texture) = resolve(info.index, info.tex_coord, info.scale) {
            material.set(MaterialAttribute::NormalTexture(texture));
        }
    }
    if let Some(info) = data.occlusion_texture {
        if let Some(texture) = resolve(info.index, info.tex_coord, info.strength) {
            material.set(MaterialAttribute::OcclusionTexture(texture));
        }
    }
    if let Some(info) = data.emissive_texture {
        if let Some(texture) = resolve(info.index, info.tex_coord, 1.0) {
            material.set(MaterialAttribute::EmissiveTexture(texture));
        }
    }
    if let Some(emissive) = data.emissive_factor {
        material.set(MaterialAttribute::Emissive(Vec3::from_array(emissive)));
    }
    if data.double_sided {
        material.set(MaterialAttribute::DoubleSided);
    }
    match data.alpha_mode {
        AlphaMode::Opaque => {}
        AlphaMode::Mask => {
            material.set(MaterialAttribute::AlphaTest(data.alpha_cutoff.unwrap_or(0.5)))
        }
        AlphaMode::Blend => material.set(MaterialAttribute::Blended),
    }

    material
}
