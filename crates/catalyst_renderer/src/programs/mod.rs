mod depth_program;
mod material_program;
mod shadow_program;

pub use depth_program::DepthProgram;
pub use material_program::{MaterialProgram, MaterialUniform};
pub use shadow_program::ShadowProgram;

use catalyst_assets::mesh::VertexAttributes;

use crate::{renderable::Renderable, shader::ShaderConfig, uniforms::UniformBinder};

const VERTEX_DEFINES: [(VertexAttributes, &str); 8] = [
    (VertexAttributes::POSITION, "positionFlag"),
    (VertexAttributes::NORMAL, "normalFlag"),
    (VertexAttributes::TANGENT, "tangentFlag"),
    (VertexAttributes::COLOR_0, "colorFlag"),
    (VertexAttributes::TEXCOORD_0, "texCoord0Flag"),
    (VertexAttributes::TEXCOORD_1, "texCoord1Flag"),
    (VertexAttributes::JOINTS_0, "jointsFlag"),
    (VertexAttributes::WEIGHTS_0, "weightsFlag"),
];

fn push_define(prefix: &mut String, name: &str) {
    prefix.push_str("#define ");
    prefix.push_str(name);
    prefix.push('\n');
}

/// Defines for every vertex attribute in `vertex`, plus the bone array size
/// when the variant is skinned.
fn push_vertex_defines(prefix: &mut String, vertex: VertexAttributes, config: &ShaderConfig) {
    for (attribute, name) in VERTEX_DEFINES {
        if vertex.contains(attribute) {
            push_define(prefix, name);
        }
    }
    if vertex.contains(VertexAttributes::SKINNING) {
        push_define(prefix, &format!("numBones {}", config.max_bones));
    }
}

fn bones_fit(renderable: &Renderable, config: &ShaderConfig) -> bool {
    renderable.bones.len() <= config.max_bones
}

/// Transform uniforms shared by every pass.
fn bind_transforms(renderable: &Renderable, binder: &mut dyn UniformBinder) {
    binder.set_mat4("u_worldTrans", &renderable.world_transform);
    if renderable.has_bones() {
        binder.set_mat4_array("u_bones", &renderable.bones);
    }
}
