#![allow(dead_code)]

use std::f32::consts::FRAC_PI_2;

use glam::{Mat4, Quat, Vec3};

pub const TRIANGLE: &str = r#"{
    "asset": { "version": "2.0" },
    "scenes": [{ "nodes": [0] }],
    "nodes": [{ "name": "triangle", "mesh": 0 }],
    "meshes": [{ "primitives": [{ "attributes": { "POSITION": 0 }, "indices": 1 }] }],
    "buffers": [{ "byteLength": 42, "uri": "triangle.bin" }],
    "bufferViews": [
        { "buffer": 0, "byteLength": 36 },
        { "buffer": 0, "byteOffset": 36, "byteLength": 6 }
    ],
    "accessors": [
        { "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3" },
        { "bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR" }
    ]
}"#;

pub fn triangle_bin() -> Vec<u8> {
    let mut bytes: Vec<u8> =
        bytemuck::cast_slice(&[0.0f32, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]).to_vec();
    bytes.extend_from_slice(bytemuck::cast_slice(&[0u16, 1, 2]));
    bytes
}

/// A skinned triangle bound to a two-joint chain. The tip joint sits one
/// unit above the root and rotates a quarter turn about Z over one second.
pub const SKINNED: &str = r#"{
    "scenes": [{ "nodes": [0, 1] }],
    "nodes": [
        { "name": "body", "mesh": 0, "skin": 0 },
        { "name": "root_joint", "children": [2] },
        { "name": "tip_joint", "translation": [0, 1, 0] }
    ],
    "meshes": [{ "primitives": [{
        "attributes": { "POSITION": 0, "JOINTS_0": 1, "WEIGHTS_0": 2 }
    }] }],
    "skins": [{ "joints": [1, 2], "inverseBindMatrices": 3, "skeleton": 1 }],
    "animations": [{
        "name": "bend",
        "channels": [{ "sampler": 0, "target": { "node": 2, "path": "rotation" } }],
        "samplers": [{ "input": 4, "output": 5, "interpolation": "LINEAR" }]
    }],
    "buffers": [{ "byteLength": 264 }],
    "bufferViews": [
        { "buffer": 0, "byteOffset": 0, "byteLength": 36 },
        { "buffer": 0, "byteOffset": 36, "byteLength": 12 },
        { "buffer": 0, "byteOffset": 48, "byteLength": 48 },
        { "buffer": 0, "byteOffset": 96, "byteLength": 128 },
        { "buffer": 0, "byteOffset": 224, "byteLength": 8 },
        { "buffer": 0, "byteOffset": 232, "byteLength": 32 }
    ],
    "accessors": [
        { "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3" },
        { "bufferView": 1, "componentType": 5121, "count": 3, "type": "VEC4" },
        { "bufferView": 2, "componentType": 5126, "count": 3, "type": "VEC4" },
        { "bufferView": 3, "componentType": 5126, "count": 2, "type": "MAT4" },
        { "bufferView": 4, "componentType": 5126, "count": 2, "type": "SCALAR" },
        { "bufferView": 5, "componentType": 5126, "count": 2, "type": "VEC4" }
    ]
}"#;

pub fn tip_rest() -> Mat4 {
    Mat4::from_translation(Vec3::Y)
}

pub fn bend_end() -> Quat {
    Quat::from_rotation_z(FRAC_PI_2)
}

pub fn skinned_bin() -> Vec<u8> {
    let mut bytes = Vec::with_capacity(264);
    let positions = [0.0f32, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 2.0, 0.0];
    bytes.extend_from_slice(bytemuck::cast_slice(&positions));
    bytes.extend_from_slice(&[0u8, 0, 0, 0, 1, 0, 0, 0, 1, 0, 0, 0]);
    let weights = [1.0f32, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0];
    bytes.extend_from_slice(bytemuck::cast_slice(&weights));
    let inverse_bind = [Mat4::IDENTITY, tip_rest().inverse()];
    bytes.extend_from_slice(bytemuck::cast_slice(&inverse_bind));
    bytes.extend_from_slice(bytemuck::cast_slice(&[0.0f32, 1.0]));
    let rotations = [Quat::IDENTITY, bend_end()];
    bytes.extend_from_slice(bytemuck::cast_slice(&rotations));
    assert_eq!(bytes.len(), 264);
    bytes
}
