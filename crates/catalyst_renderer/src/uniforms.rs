use std::collections::BTreeMap;

use catalyst_assets::texture::SceneTexture;
use glam::{Mat4, Vec3, Vec4};

/// Receives the uniforms a shader program sets for one draw. Implemented by
/// the GPU backend; programs never talk to the graphics API directly.
pub trait UniformBinder {
    fn set_float(&mut self, name: &str, value: f32);
    fn set_vec3(&mut self, name: &str, value: Vec3);
    fn set_vec4(&mut self, name: &str, value: Vec4);
    fn set_mat4(&mut self, name: &str, value: &Mat4);
    fn set_mat4_array(&mut self, name: &str, values: &[Mat4]);
    fn set_texture(&mut self, name: &str, unit: u32, texture: &SceneTexture);
    /// A `#[repr(C)]` uniform block, uploaded as is.
    fn set_block(&mut self, name: &str, bytes: &[u8]);
}

/// Keeps the raw bytes of every uniform set through it. Textures are
/// recorded as `[unit, source image]`.
#[derive(Debug, Default)]
pub struct UniformRecorder {
    values: BTreeMap<String, Vec<u8>>,
}

impl UniformRecorder {
    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn bytes(&self, name: &str) -> Option<&[u8]> {
        self.values.get(name).map(Vec::as_slice)
    }

    pub fn floats(&self, name: &str) -> Option<Vec<f32>> {
        self.bytes(name).map(|bytes| {
            bytes
                .chunks_exact(4)
                .map(bytemuck::pod_read_unaligned::<f32>)
                .collect()
        })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    fn record(&mut self, name: &str, bytes: &[u8]) {
        self.values.insert(name.to_string(), bytes.to_vec());
    }
}

impl UniformBinder for UniformRecorder {
    fn set_float(&mut self, name: &str, value: f32) {
        self.record(name, bytemuck::bytes_of(&value));
    }

    fn set_vec3(&mut self, name: &str, value: Vec3) {
        self.record(name, bytemuck::bytes_of(&value));
    }

    fn set_vec4(&mut self, name: &str, value: Vec4) {
        self.record(name, bytemuck::bytes_of(&value));
    }

    fn set_mat4(&mut self, name: &str, value: &Mat4) {
        self.record(name, bytemuck::bytes_of(value));
    }

    fn set_mat4_array(&mut self, name: &str, values: &[Mat4]) {
        self.record(name, bytemuck::cast_slice(values));
    }

    fn set_texture(&mut self, name: &str, unit: u32, texture: &SceneTexture) {
        self.record(name, bytemuck::cast_slice(&[unit, texture.source as u32]));
    }

    fn set_block(&mut self, name: &str, bytes: &[u8]) {
        self.record(name, bytes);
    }
}
