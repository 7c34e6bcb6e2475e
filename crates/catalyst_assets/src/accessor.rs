use std::borrow::Cow;

use crate::{
    document::{AccessorData, AccessorType, ComponentType, Document},
    error::AssetError,
};

/// Reads typed data out of decoded buffers through accessors and their
/// buffer views.
pub struct AccessorReader<'a> {
    document: &'a Document,
    buffers: &'a [Vec<u8>],
}

impl<'a> AccessorReader<'a> {
    pub fn new(document: &'a Document, buffers: &'a [Vec<u8>]) -> Self {
        Self { document, buffers }
    }

    pub fn accessor(&self, index: usize) -> &'a AccessorData {
        &self.document.accessors[index]
    }

    /// The exact bytes covered by the accessor. Accessors without a buffer
    /// view read as zeros.
    fn bytes(&self, index: usize) -> Result<Cow<'a, [u8]>, AssetError> {
        let accessor = self.accessor(index);
        let out_of_bounds = |needed: Option<usize>, available: usize| AssetError::AccessorOutOfBounds {
            accessor: index,
            needed: needed.unwrap_or(usize::MAX),
            available,
        };
        let needed = accessor.count.checked_mul(accessor.element_size());
        let Some(view_index) = accessor.buffer_view else {
            let needed = needed.ok_or_else(|| out_of_bounds(None, 0))?;
            let mut zeros = Vec::new();
            zeros
                .try_reserve_exact(needed)
                .map_err(|_| out_of_bounds(Some(needed), 0))?;
            zeros.resize(needed, 0);
            return Ok(Cow::Owned(zeros));
        };
        let view = &self.document.buffer_views[view_index];
        if let Some(stride) = view.byte_stride {
            if stride != accessor.element_size() {
                return Err(AssetError::StridedBufferView {
                    accessor: index,
                    stride,
                });
            }
        }
        let needed = needed.ok_or_else(|| out_of_bounds(None, view.byte_length))?;
        let in_view = accessor.byte_offset.checked_add(needed);
        match in_view {
            Some(in_view) if in_view <= view.byte_length => {}
            _ => return Err(out_of_bounds(in_view, view.byte_length)),
        }
        let buffer = &self.buffers[view.buffer];
        let start = view.byte_offset.checked_add(accessor.byte_offset);
        let end = start.and_then(|start| start.checked_add(needed));
        match (start, end) {
            (Some(start), Some(end)) if end <= buffer.len() => {
                Ok(Cow::Borrowed(&buffer[start..end]))
            }
            _ => Err(out_of_bounds(end, buffer.len())),
        }
    }

    /// Vertex attribute data as floats, `count * components` values in
    /// source order. Only FLOAT and UNSIGNED_BYTE are accepted. Bytes are
    /// passed through as raw `0..=255` values unless the accessor is flagged
    /// `normalized` or `normalize_bytes` is set.
    pub fn read_vertex_floats(
        &self,
        index: usize,
        normalize_bytes: bool,
    ) -> Result<Vec<f32>, AssetError> {
        let accessor = self.accessor(index);
        let bytes = self.bytes(index)?;
        match accessor.component_type {
            ComponentType::Float => Ok(read_f32s(&bytes)),
            ComponentType::UnsignedByte => {
                let scale = if accessor.normalized || normalize_bytes {
                    1.0 / 255.0
                } else {
                    1.0
                };
                Ok(bytes.iter().map(|&byte| byte as f32 * scale).collect())
            }
            component_type => Err(AssetError::UnsupportedComponentType {
                accessor: index,
                component_type,
                usage: "vertex data",
            }),
        }
    }

    /// FLOAT data of the given element type, used for animation keyframes
    /// and inverse bind matrices.
    pub fn read_typed_floats(
        &self,
        index: usize,
        expected: AccessorType,
        usage: &'static str,
    ) -> Result<Vec<f32>, AssetError> {
        let accessor = self.accessor(index);
        if accessor.component_type != ComponentType::Float {
            return Err(AssetError::UnsupportedComponentType {
                accessor: index,
                component_type: accessor.component_type,
                usage,
            });
        }
        if accessor.kind != expected {
            return Err(AssetError::AccessorTypeMismatch {
                accessor: index,
                usage,
                expected,
                found: accessor.kind,
            });
        }
        Ok(read_f32s(&self.bytes(index)?))
    }

    /// Index data widened to `u32`.
    pub fn read_indices(&self, index: usize) -> Result<Vec<u32>, AssetError> {
        let accessor = self.accessor(index);
        if accessor.kind != AccessorType::Scalar {
            return Err(AssetError::AccessorTypeMismatch {
                accessor: index,
                usage: "indices",
                expected: AccessorType::Scalar,
                found: accessor.kind,
            });
        }
        let bytes = self.bytes(index)?;
        let indices = match accessor.component_type {
            ComponentType::UnsignedByte => bytes.iter().map(|&i| i as u32).collect(),
            ComponentType::UnsignedShort | ComponentType::Short => bytes
                .chunks_exact(2)
                .map(|c| u16::from_le_bytes([c[0], c[1]]) as u32)
                .collect(),
            ComponentType::UnsignedInt => bytes
                .chunks_exact(4)
                .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                .collect(),
            component_type => {
                return Err(AssetError::UnsupportedComponentType {
                    accessor: index,
                    component_type,
                    usage: "indices",
                });
            }
        };
        Ok(indices)
    }
}

fn read_f32s(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(bytemuck::pod_read_unaligned::<f32>)
        .collect()
}
