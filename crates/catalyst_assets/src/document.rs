//! In-memory mirror of a glTF-style JSON document.
//!
//! These types are plain data: they are deserialized once, validated, handed
//! to [`SceneResourceContext`](crate::context::SceneResourceContext) and then
//! dropped. Optional indices are `Option<usize>`, never a sentinel.

use std::fmt;

use catalyst_core::transform::Transform;
use glam::{Mat4, Quat, Vec3};
use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;

use crate::error::DocumentError;

#[derive(Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(default)]
    pub asset: Option<AssetInfo>,
    #[serde(default)]
    pub scene: Option<usize>,
    #[serde(default)]
    pub scenes: Vec<SceneData>,
    #[serde(default)]
    pub nodes: Vec<NodeData>,
    #[serde(default)]
    pub meshes: Vec<MeshData>,
    #[serde(default)]
    pub materials: Vec<MaterialData>,
    #[serde(default)]
    pub textures: Vec<TextureData>,
    #[serde(default)]
    pub images: Vec<ImageData>,
    #[serde(default)]
    pub samplers: Vec<SamplerData>,
    #[serde(default)]
    pub accessors: Vec<AccessorData>,
    #[serde(default)]
    pub buffer_views: Vec<BufferViewData>,
    #[serde(default)]
    pub buffers: Vec<BufferData>,
    #[serde(default)]
    pub skins: Vec<SkinData>,
    #[serde(default)]
    pub animations: Vec<AnimationData>,
    #[serde(default)]
    pub cameras: Vec<CameraData>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct AssetInfo {
    pub version: String,
    #[serde(default)]
    pub generator: Option<String>,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct SceneData {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub nodes: Vec<usize>,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct NodeData {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub children: Vec<usize>,
    #[serde(default)]
    pub translation: Option<[f32; 3]>,
    #[serde(default)]
    pub rotation: Option<[f32; 4]>,
    #[serde(default)]
    pub scale: Option<[f32; 3]>,
    #[serde(default)]
    pub matrix: Option<[f32; 16]>,
    #[serde(default)]
    pub mesh: Option<usize>,
    #[serde(default)]
    pub camera: Option<usize>,
    #[serde(default)]
    pub skin: Option<usize>,
    #[serde(default)]
    pub weights: Vec<f32>,
}

impl NodeData {
    /// The node's local TRS. A raw `matrix` wins over the individual fields
    /// and is decomposed.
    pub fn transform(&self) -> Transform {
        if let Some(matrix) = self.matrix {
            return Transform::from_matrix(Mat4::from_cols_array(&matrix));
        }
        Transform {
            translation: self.translation.map(Vec3::from).unwrap_or(Vec3::ZERO),
            rotation: self.rotation.map(Quat::from_array).unwrap_or(Quat::IDENTITY),
            scale: self.scale.map(Vec3::from).unwrap_or(Vec3::ONE),
        }
    }
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct MeshData {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub primitives: Vec<PrimitiveData>,
    #[serde(default)]
    pub weights: Vec<f32>,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct PrimitiveData {
    /// Attribute semantic -> accessor index, in document order.
    #[serde(deserialize_with = "ordered_attributes")]
    pub attributes: Vec<(String, usize)>,
    #[serde(default)]
    pub indices: Option<usize>,
    #[serde(default)]
    pub material: Option<usize>,
    #[serde(default = "default_primitive_mode")]
    pub mode: u32,
}

fn default_primitive_mode() -> u32 {
    4
}

/// Keeps the attribute map in the order it was written. The engine vertex
/// layout follows this order.
fn ordered_attributes<'de, D>(deserializer: D) -> Result<Vec<(String, usize)>, D::Error>
where
    D: Deserializer<'de>,
{
    struct AttributesVisitor;

    impl<'de> Visitor<'de> for AttributesVisitor {
        type Value = Vec<(String, usize)>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a map of attribute semantics to accessor indices")
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut attributes = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((semantic, accessor)) = map.next_entry::<String, usize>()? {
                attributes.push((semantic, accessor));
            }
            Ok(attributes)
        }
    }

    deserializer.deserialize_map(AttributesVisitor)
}

#[derive(Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum AlphaMode {
    #[default]
    Opaque,
    Mask,
    Blend,
}

#[derive(Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct MaterialData {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub pbr_metallic_roughness: Option<PbrMetallicRoughness>,
    #[serde(default)]
    pub normal_texture: Option<NormalTextureInfo>,
    #[serde(default)]
    pub occlusion_texture: Option<OcclusionTextureInfo>,
    #[serde(default)]
    pub emissive_texture: Option<TextureInfo>,
    #[serde(default)]
    pub emissive_factor: Option<[f32; 3]>,
    #[serde(default)]
    pub alpha_mode: AlphaMode,
    #[serde(default)]
    pub alpha_cutoff: Option<f32>,
    #[serde(default)]
    pub double_sided: bool,
}

#[derive(Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct PbrMetallicRoughness {
    #[serde(default)]
    pub base_color_factor: Option<[f32; 4]>,
    #[serde(default)]
    pub base_color_texture: Option<TextureInfo>,
    #[serde(default)]
    pub metallic_factor: Option<f32>,
    #[serde(default)]
    pub roughness_factor: Option<f32>,
    #[serde(default)]
    pub metallic_roughness_texture: Option<TextureInfo>,
}

#[derive(Deserialize, Clone, Copy, Debug)]
#[serde(rename_all = "camelCase")]
pub struct TextureInfo {
    pub index: usize,
    #[serde(default)]
    pub tex_coord: u32,
}

#[derive(Deserialize, Clone, Copy, Debug)]
#[serde(rename_all = "camelCase")]
pub struct NormalTextureInfo {
    pub index: usize,
    #[serde(default)]
    pub tex_coord: u32,
    #[serde(default = "one")]
    pub scale: f32,
}

#[derive(Deserialize, Clone, Copy, Debug)]
#[serde(rename_all = "camelCase")]
pub struct OcclusionTextureInfo {
    pub index: usize,
    #[serde(default)]
    pub tex_coord: u32,
    #[serde(default = "one")]
    pub strength: f32,
}

fn one() -> f32 {
    1.0
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct TextureData {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub sampler: Option<usize>,
    #[serde(default)]
    pub source: Option<usize>,
}

#[derive(Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct ImageData {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub buffer_view: Option<usize>,
    #[serde(default)]
    pub mime_type: Option<String>,
}

#[derive(Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SamplerData {
    #[serde(default)]
    pub mag_filter: Option<u32>,
    #[serde(default)]
    pub min_filter: Option<u32>,
    #[serde(default = "default_wrap")]
    pub wrap_s: u32,
    #[serde(default = "default_wrap")]
    pub wrap_t: u32,
}

fn default_wrap() -> u32 {
    10497
}

/// Numeric component type codes of the interchange format.
#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(try_from = "u32")]
pub enum ComponentType {
    Byte = 5120,
    UnsignedByte = 5121,
    Short = 5122,
    UnsignedShort = 5123,
    UnsignedInt = 5125,
    Float = 5126,
}

#[derive(Debug, thiserror::Error)]
#[error("unknown component type {0}")]
pub struct UnknownComponentType(pub u32);

impl TryFrom<u32> for ComponentType {
    type Error = UnknownComponentType;

    fn try_from(code: u32) -> Result<Self, Self::Error> {
        match code {
            5120 => Ok(Self::Byte),
            5121 => Ok(Self::UnsignedByte),
            5122 => Ok(Self::Short),
            5123 => Ok(Self::UnsignedShort),
            5125 => Ok(Self::UnsignedInt),
            5126 => Ok(Self::Float),
            other => Err(UnknownComponentType(other)),
        }
    }
}

impl ComponentType {
    pub fn size(self) -> usize {
        match self {
            Self::Byte | Self::UnsignedByte => 1,
            Self::Short | Self::UnsignedShort => 2,
            Self::UnsignedInt | Self::Float => 4,
        }
    }
}

#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum AccessorType {
    Scalar,
    Vec2,
    Vec3,
    Vec4,
    Mat2,
    Mat3,
    Mat4,
}

impl AccessorType {
    pub fn components(self) -> usize {
        match self {
            Self::Scalar => 1,
            Self::Vec2 => 2,
            Self::Vec3 => 3,
            Self::Vec4 | Self::Mat2 => 4,
            Self::Mat3 => 9,
            Self::Mat4 => 16,
        }
    }
}

#[derive(Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AccessorData {
    #[serde(default)]
    pub buffer_view: Option<usize>,
    #[serde(default)]
    pub byte_offset: usize,
    pub component_type: ComponentType,
    #[serde(default)]
    pub normalized: bool,
    pub count: usize,
    #[serde(rename = "type")]
    pub kind: AccessorType,
    #[serde(default)]
    pub min: Vec<f32>,
    #[serde(default)]
    pub max: Vec<f32>,
}

impl AccessorData {
    pub fn element_size(&self) -> usize {
        self.kind.components() * self.component_type.size()
    }
}

#[derive(Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct BufferViewData {
    pub buffer: usize,
    #[serde(default)]
    pub byte_offset: usize,
    pub byte_length: usize,
    #[serde(default)]
    pub byte_stride: Option<usize>,
}

#[derive(Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct BufferData {
    pub byte_length: usize,
    #[serde(default)]
    pub uri: Option<String>,
}

#[derive(Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct SkinData {
    #[serde(default)]
    pub name: Option<String>,
    pub joints: Vec<usize>,
    #[serde(default)]
    pub inverse_bind_matrices: Option<usize>,
    #[serde(default)]
    pub skeleton: Option<usize>,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct AnimationData {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub channels: Vec<ChannelData>,
    #[serde(default)]
    pub samplers: Vec<AnimationSamplerData>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ChannelData {
    pub sampler: usize,
    pub target: ChannelTarget,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ChannelTarget {
    #[serde(default)]
    pub node: Option<usize>,
    pub path: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct AnimationSamplerData {
    pub input: usize,
    pub output: usize,
    #[serde(default = "default_interpolation")]
    pub interpolation: String,
}

fn default_interpolation() -> String {
    "LINEAR".to_string()
}

#[derive(Deserialize, Clone, Debug)]
pub struct CameraData {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub perspective: Option<PerspectiveData>,
    #[serde(default)]
    pub orthographic: Option<OrthographicData>,
}

#[derive(Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PerspectiveData {
    pub yfov: f32,
    pub znear: f32,
    #[serde(default)]
    pub zfar: Option<f32>,
    #[serde(default)]
    pub aspect_ratio: Option<f32>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct OrthographicData {
    pub xmag: f32,
    pub ymag: f32,
    pub znear: f32,
    pub zfar: f32,
}

impl Document {
    /// Parses and validates a JSON document.
    pub fn from_json(json: &str) -> Result<Self, DocumentError> {
        let document: Document = serde_json::from_str(json)?;
        document.validate()?;
        Ok(document)
    }

    /// The scene to show by default: the declared one, else the first.
    pub fn default_scene(&self) -> Option<usize> {
        self.scene.or(if self.scenes.is_empty() { None } else { Some(0) })
    }

    /// Checks every cross reference and the shape of the node hierarchy.
    pub fn validate(&self) -> Result<(), DocumentError> {
        if let Some(scene) = self.scene {
            check(scene, self.scenes.len(), "scene", || "document".to_string())?;
        }
        for (i, scene) in self.scenes.iter().enumerate() {
            for &node in &scene.nodes {
                check(node, self.nodes.len(), "node", || format!("scene {i}"))?;
            }
        }

        let mut parents = vec![None; self.nodes.len()];
        for (i, node) in self.nodes.iter().enumerate() {
            let referenced_by = || format!("node {i}");
            for &child in &node.children {
                check(child, self.nodes.len(), "node", referenced_by)?;
                if parents[child].replace(i).is_some() {
                    return Err(DocumentError::MultipleParents { node: child });
                }
            }
            if let Some(mesh) = node.mesh {
                check(mesh, self.meshes.len(), "mesh", referenced_by)?;
                if node.camera.is_some() {
                    log::warn!("node {i} has both a mesh and a camera, the camera is ignored");
                }
            }
            if let Some(camera) = node.camera {
                check(camera, self.cameras.len(), "camera", referenced_by)?;
            }
            if let Some(skin) = node.skin {
                check(skin, self.skins.len(), "skin", referenced_by)?;
            }
        }
        for start in 0..self.nodes.len() {
            let mut current = start;
            let mut steps = 0;
            while let Some(parent) = parents[current] {
                current = parent;
                steps += 1;
                if steps > self.nodes.len() {
                    return Err(DocumentError::NodeCycle { node: start });
                }
            }
        }
        for (i, scene) in self.scenes.iter().enumerate() {
            for (r, &root) in scene.nodes.iter().enumerate() {
                if let Some(parent) = parents[root] {
                    return Err(DocumentError::RootHasParent { scene: i, node: root, parent });
                }
                if scene.nodes[..r].contains(&root) {
                    return Err(DocumentError::DuplicateRoot { scene: i, node: root });
                }
            }
        }

        for (m, mesh) in self.meshes.iter().enumerate() {
            for (p, primitive) in mesh.primitives.iter().enumerate() {
                let referenced_by = || format!("primitive {p} of mesh {m}");
                for (_, accessor) in &primitive.attributes {
                    check(*accessor, self.accessors.len(), "accessor", referenced_by)?;
                }
                if let Some(indices) = primitive.indices {
                    check(indices, self.accessors.len(), "accessor", referenced_by)?;
                }
                if let Some(material) = primitive.material {
                    check(material, self.materials.len(), "material", referenced_by)?;
                }
            }
        }

        for (i, material) in self.materials.iter().enumerate() {
            let referenced_by = || format!("material {i}");
            let pbr = material.pbr_metallic_roughness.as_ref();
            let textures = [
                pbr.and_then(|pbr| pbr.base_color_texture).map(|info| info.index),
                pbr.and_then(|pbr| pbr.metallic_roughness_texture).map(|info| info.index),
                material.normal_texture.map(|info| info.index),
                material.occlusion_texture.map(|info| info.index),
                material.emissive_texture.map(|info| info.index),
            ];
            for texture in textures.into_iter().flatten() {
                check(texture, self.textures.len(), "texture", referenced_by)?;
            }
        }

        for (i, texture) in self.textures.iter().enumerate() {
            let referenced_by = || format!("texture {i}");
            if let Some(source) = texture.source {
                check(source, self.images.len(), "image", referenced_by)?;
            }
            if let Some(sampler) = texture.sampler {
                check(sampler, self.samplers.len(), "sampler", referenced_by)?;
            }
        }

        for (i, image) in self.images.iter().enumerate() {
            if let Some(view) = image.buffer_view {
                check(view, self.buffer_views.len(), "buffer view", || format!("image {i}"))?;
            }
        }

        for (i, accessor) in self.accessors.iter().enumerate() {
            if let Some(view) = accessor.buffer_view {
                check(view, self.buffer_views.len(), "buffer view", || format!("accessor {i}"))?;
            }
        }

        for (i, view) in self.buffer_views.iter().enumerate() {
            check(view.buffer, self.buffers.len(), "buffer", || format!("buffer view {i}"))?;
        }

        for (i, skin) in self.skins.iter().enumerate() {
            let referenced_by = || format!("skin {i}");
            for &joint in &skin.joints {
                check(joint, self.nodes.len(), "node", referenced_by)?;
            }
            if let Some(skeleton) = skin.skeleton {
                check(skeleton, self.nodes.len(), "node", referenced_by)?;
            }
            if let Some(matrices) = skin.inverse_bind_matrices {
                check(matrices, self.accessors.len(), "accessor", referenced_by)?;
            }
        }

        for (a, animation) in self.animations.iter().enumerate() {
            for (c, channel) in animation.channels.iter().enumerate() {
                let referenced_by = || format!("channel {c} of animation {a}");
                check(channel.sampler, animation.samplers.len(), "sampler", referenced_by)?;
                if let Some(node) = channel.target.node {
                    check(node, self.nodes.len(), "node", referenced_by)?;
                }
            }
            for (s, sampler) in animation.samplers.iter().enumerate() {
                let referenced_by = || format!("sampler {s} of animation {a}");
                check(sampler.input, self.accessors.len(), "accessor", referenced_by)?;
                check(sampler.output, self.accessors.len(), "accessor", referenced_by)?;
            }
        }

        Ok(())
    }
}

fn check(
    index: usize,
    len: usize,
    kind: &'static str,
    referenced_by: impl FnOnce() -> String,
) -> Result<(), DocumentError> {
    if index < len {
        Ok(())
    } else {
        Err(DocumentError::MissingReference {
            kind,
            index,
            referenced_by: referenced_by(),
        })
    }
}
