use std::sync::Arc;

use bitflags::bitflags;

use crate::{
    accessor::AccessorReader,
    context::{IndexPolicy, LoadOptions},
    document::{MeshData, PrimitiveData},
    error::AssetError,
    material::SceneMaterial,
};

bitflags! {
    /// Vertex attributes present in a primitive's vertex buffer.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
    pub struct VertexAttributes: u32 {
        const POSITION = 1 << 0;
        const NORMAL = 1 << 1;
        const TANGENT = 1 << 2;
        const COLOR_0 = 1 << 3;
        const TEXCOORD_0 = 1 << 4;
        const TEXCOORD_1 = 1 << 5;
        const JOINTS_0 = 1 << 6;
        const WEIGHTS_0 = 1 << 7;

        const SKINNING = Self::JOINTS_0.bits() | Self::WEIGHTS_0.bits();
    }
}

impl VertexAttributes {
    pub fn from_semantic(semantic: &str) -> Option<Self> {
        Some(match semantic {
            "POSITION" => Self::POSITION,
            "NORMAL" => Self::NORMAL,
            "TANGENT" => Self::TANGENT,
            "COLOR_0" => Self::COLOR_0,
            "TEXCOORD_0" => Self::TEXCOORD_0,
            "TEXCOORD_1" => Self::TEXCOORD_1,
            "JOINTS_0" => Self::JOINTS_0,
            "WEIGHTS_0" => Self::WEIGHTS_0,
            _ => return None,
        })
    }
}

/// Placement of one attribute inside an interleaved vertex, in floats.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VertexElement {
    pub attribute: VertexAttributes,
    pub components: usize,
    pub offset: usize,
}

/// Interleaved layout of a primitive's vertex buffer. Elements follow the
/// order the attributes were declared in.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VertexInfo {
    pub elements: Vec<VertexElement>,
    /// Floats per vertex.
    pub stride: usize,
    pub mask: VertexAttributes,
}

impl VertexInfo {
    fn push(&mut self, attribute: VertexAttributes, components: usize) {
        self.elements.push(VertexElement {
            attribute,
            components,
            offset: self.stride,
        });
        self.stride += components;
        self.mask |= attribute;
    }

    pub fn element(&self, attribute: VertexAttributes) -> Option<&VertexElement> {
        self.elements.iter().find(|element| element.attribute == attribute)
    }

    pub fn stride_bytes(&self) -> usize {
        self.stride * std::mem::size_of::<f32>()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum RenderMode {
    Points,
    Lines,
    LineLoop,
    LineStrip,
    #[default]
    Triangles,
    TriangleStrip,
    TriangleFan,
}

impl RenderMode {
    pub fn from_code(code: u32) -> Option<Self> {
        Some(match code {
            0 => Self::Points,
            1 => Self::Lines,
            2 => Self::LineLoop,
            3 => Self::LineStrip,
            4 => Self::Triangles,
            5 => Self::TriangleStrip,
            6 => Self::TriangleFan,
            _ => return None,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IndexData {
    U16(Vec<u16>),
    U32(Vec<u32>),
}

impl IndexData {
    pub fn len(&self) -> usize {
        match self {
            Self::U16(indices) => indices.len(),
            Self::U32(indices) => indices.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, i: usize) -> Option<u32> {
        match self {
            Self::U16(indices) => indices.get(i).map(|&index| index as u32),
            Self::U32(indices) => indices.get(i).copied(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::U16(indices) => bytemuck::cast_slice(indices),
            Self::U32(indices) => bytemuck::cast_slice(indices),
        }
    }

    fn from_u32(
        indices: Vec<u32>,
        policy: IndexPolicy,
        mesh: usize,
        primitive: usize,
    ) -> Result<Self, AssetError> {
        let largest = indices.iter().copied().max().unwrap_or(0);
        if largest <= u16::MAX as u32 {
            return Ok(Self::U16(indices.into_iter().map(|index| index as u16).collect()));
        }
        match policy {
            IndexPolicy::Preserve => Ok(Self::U32(indices)),
            IndexPolicy::Narrow16 => Err(AssetError::IndexOutOfRange {
                mesh,
                primitive,
                value: largest,
            }),
        }
    }
}

#[derive(Clone, Debug)]
pub struct SceneMeshPrimitive {
    pub vertex_info: VertexInfo,
    /// Interleaved per `vertex_info`.
    pub vertices: Vec<f32>,
    pub vertex_count: usize,
    pub indices: IndexData,
    pub material: Arc<SceneMaterial>,
    pub mode: RenderMode,
}

impl SceneMeshPrimitive {
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// The floats of one attribute of one vertex.
    pub fn attribute(&self, vertex: usize, attribute: VertexAttributes) -> Option<&[f32]> {
        let element = self.vertex_info.element(attribute)?;
        let start = vertex * self.vertex_info.stride + element.offset;
        self.vertices.get(start..start + element.components)
    }

    pub fn is_skinned(&self) -> bool {
        self.vertex_info.mask.contains(VertexAttributes::SKINNING)
    }
}

#[derive(Clone, Debug)]
pub struct SceneMesh {
    pub name: String,
    pub index: usize,
    pub primitives: Vec<SceneMeshPrimitive>,
    /// Default morph target weights.
    pub weights: Vec<f32>,
}

pub fn build_mesh(
    reader: &AccessorReader<'_>,
    index: usize,
    data: &MeshData,
    materials: &[Arc<SceneMaterial>],
    default_material: &Arc<SceneMaterial>,
    options: &LoadOptions,
) -> Result<SceneMesh, AssetError> {
    let primitives = data
        .primitives
        .iter()
        .enumerate()
        .map(|(p, primitive)| {
            build_primitive(reader, index, p, primitive, materials, default_material, options)
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(SceneMesh {
        name: data.name.clone().unwrap_or_else(|| format!("mesh{index}")),
        index,
        primitives,
        weights: data.weights.clone(),
    })
}

fn build_primitive(
    reader: &AccessorReader<'_>,
    mesh: usize,
    primitive: usize,
    data: &PrimitiveData,
    materials: &[Arc<SceneMaterial>],
    default_material: &Arc<SceneMaterial>,
    options: &LoadOptions,
) -> Result<SceneMeshPrimitive, AssetError> {
    // A. De-interleave each declared attribute into its own float array
    let mut vertex_info = VertexInfo::default();
    let mut streams: Vec<Vec<f32>> = Vec::new();
    let mut vertex_count = None;

    for (semantic, accessor) in &data.attributes {
        let Some(attribute) = VertexAttributes::from_semantic(semantic) else {
            log::warn!("mesh {mesh} primitive {primitive}: skipping unsupported attribute {semantic}");
            continue;
        };
        if vertex_info.mask.contains(attribute) {
            continue;
        }
        let count = reader.accessor(*accessor).count;
        if *vertex_count.get_or_insert(count) != count {
            return Err(AssetError::VertexCountMismatch { mesh, primitive });
        }
        let floats = reader.read_vertex_floats(*accessor, options.normalize_unsigned_bytes)?;
        vertex_info.push(attribute, reader.accessor(*accessor).kind.components());
        streams.push(floats);
    }

    if !vertex_info.mask.contains(VertexAttributes::POSITION) {
        return Err(AssetError::MissingPositions { mesh, primitive });
    }
    let vertex_count = vertex_count.unwrap_or(0);

    // B. Re-interleave in declaration order
    let mut vertices = Vec::with_capacity(vertex_count * vertex_info.stride);
    for vertex in 0..vertex_count {
        for (element, stream) in vertex_info.elements.iter().zip(&streams) {
            let start = vertex * element.components;
            vertices.extend_from_slice(&stream[start..start + element.components]);
        }
    }

    // C. Indices, sequential when the primitive has none
    let raw_indices = match data.indices {
        Some(accessor) => reader.read_indices(accessor)?,
        None => (0..vertex_count as u32).collect(),
    };
    if let Some(&value) = raw_indices.iter().find(|&&value| value as usize >= vertex_count) {
        return Err(AssetError::IndexBeyondVertices {
            mesh,
            primitive,
            value,
            vertex_count,
        });
    }
    let indices = IndexData::from_u32(raw_indices, options.index_policy, mesh, primitive)?;

    let material = match data.material {
        Some(material) => materials[material].clone(),
        None => default_material.clone(),
    };

    let mode = RenderMode::from_code(data.mode).unwrap_or_else(|| {
        log::warn!("mesh {mesh} primitive {primitive}: unknown mode {}, drawing triangles", data.mode);
        RenderMode::Triangles
    });

    Ok(SceneMeshPrimitive {
        vertex_info,
        vertices,
        vertex_count,
        indices,
        material,
        mode,
    })
}
