use thiserror::Error;

use crate::document::{AccessorType, ComponentType};

/// Problems with the interchange document itself: malformed JSON or
/// cross references that point nowhere.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("failed to parse document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{referenced_by} references {kind} {index}, which does not exist")]
    MissingReference {
        kind: &'static str,
        index: usize,
        referenced_by: String,
    },

    #[error("node {node} is listed as a child of more than one node")]
    MultipleParents { node: usize },

    #[error("node {node} is part of a parent/child cycle")]
    NodeCycle { node: usize },

    #[error("scene {scene} lists node {node} as a root but it is a child of node {parent}")]
    RootHasParent { scene: usize, node: usize, parent: usize },

    #[error("scene {scene} lists root node {node} more than once")]
    DuplicateRoot { scene: usize, node: usize },
}

/// Failures while turning a document into engine resources. Every variant
/// aborts the whole load.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error("buffer {index} refers to \"{uri}\", which was not supplied")]
    MissingBuffer { index: usize, uri: String },

    #[error("malformed data uri: {0}")]
    InvalidDataUri(String),

    #[error("failed to decode base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("buffer {index} declares {declared} bytes but only {actual} are available")]
    BufferTooShort {
        index: usize,
        declared: usize,
        actual: usize,
    },

    #[error("accessor {accessor} reads a buffer view with unsupported byte stride {stride}")]
    StridedBufferView { accessor: usize, stride: usize },

    #[error("accessor {accessor} needs {needed} bytes but its buffer view only has {available}")]
    AccessorOutOfBounds {
        accessor: usize,
        needed: usize,
        available: usize,
    },

    #[error("accessor {accessor} has component type {component_type:?}, which is not supported for {usage}")]
    UnsupportedComponentType {
        accessor: usize,
        component_type: ComponentType,
        usage: &'static str,
    },

    #[error("accessor {accessor} used as {usage} must be {expected:?}, found {found:?}")]
    AccessorTypeMismatch {
        accessor: usize,
        usage: &'static str,
        expected: AccessorType,
        found: AccessorType,
    },

    #[error("primitive {primitive} of mesh {mesh} has attributes with differing vertex counts")]
    VertexCountMismatch { mesh: usize, primitive: usize },

    #[error("primitive {primitive} of mesh {mesh} has no POSITION attribute")]
    MissingPositions { mesh: usize, primitive: usize },

    #[error("primitive {primitive} of mesh {mesh} has index {value}, which does not fit the 16-bit index type")]
    IndexOutOfRange {
        mesh: usize,
        primitive: usize,
        value: u32,
    },

    #[error("primitive {primitive} of mesh {mesh} has index {value} but only {vertex_count} vertices")]
    IndexBeyondVertices {
        mesh: usize,
        primitive: usize,
        value: u32,
        vertex_count: usize,
    },

    #[error("skin {skin} has {joints} joints but only {matrices} inverse bind matrices")]
    MissingInverseBindMatrices {
        skin: usize,
        joints: usize,
        matrices: usize,
    },

    #[error("unknown interpolation mode \"{0}\"")]
    UnknownInterpolation(String),

    #[error("unknown animation target path \"{0}\"")]
    UnknownTargetPath(String),

    #[error("animation sampler has {inputs} keyframe times but {outputs} output values")]
    KeyframeCountMismatch { inputs: usize, outputs: usize },
}
