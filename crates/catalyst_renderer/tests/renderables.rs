mod common;

use std::{sync::Arc, time::Duration};

use catalyst_assets::{
    LoadOptions, SceneResourceContext,
    material::{MaterialAttribute, MaterialMask, SceneMaterial},
    mesh::VertexAttributes,
};
use catalyst_core::{App, WorldGet};
use catalyst_renderer::{
    RenderError, RenderPasses, RenderPlugin, Renderable, RenderableProvider, ShaderConfig,
    ShaderProvider, UniformRecorder,
    programs::{DepthProgram, MaterialProgram, MaterialUniform, ShadowProgram},
};
use catalyst_scene::{SceneModel, SceneModelInstance, ScenePlugin};
use glam::{Mat4, Vec3, Vec4};

fn model(json: &str, bin: &[u8]) -> Arc<SceneModel> {
    let context =
        SceneResourceContext::load_from_json(json, &[("triangle.bin", bin), ("", bin)], LoadOptions::default())
            .unwrap();
    Arc::new(SceneModel::from_context("model", &context).unwrap())
}

fn triangle() -> Arc<SceneModel> {
    model(common::TRIANGLE, &common::triangle_bin())
}

fn skinned() -> Arc<SceneModel> {
    model(common::SKINNED, &common::skinned_bin())
}

fn material_provider() -> ShaderProvider {
    ShaderProvider::new(MaterialProgram::create, ShaderConfig::default())
}

fn with_material(material: SceneMaterial, vertex_mask: VertexAttributes) -> Renderable {
    Renderable {
        material: Some(Arc::new(material)),
        vertex_mask,
        ..Default::default()
    }
}

#[test]
fn identical_masks_share_one_shader() {
    let model = triangle();
    let a = SceneModelInstance::new(model.clone(), Mat4::IDENTITY, &[]).unwrap();
    let b = SceneModelInstance::new(model, Mat4::from_translation(Vec3::X), &[]).unwrap();
    let mut provider = RenderableProvider::new();
    let mut shaders = material_provider();
    let mut out = Vec::new();

    provider.obtain_instance_renderables(&a, &mut shaders, &mut out).unwrap();
    provider.obtain_instance_renderables(&b, &mut shaders, &mut out).unwrap();

    assert_eq!(out.len(), 2);
    assert!(out[0].shader.is_some());
    assert_eq!(out[0].shader, out[1].shader);
    assert_eq!(shaders.len(), 1);
}

#[test]
fn unskinned_primitive_never_reuses_a_bone_shader() {
    let mut shaders = material_provider();
    let mut skinned = with_material(
        SceneMaterial::default_material(),
        VertexAttributes::POSITION | VertexAttributes::SKINNING,
    );
    skinned.bones = vec![Mat4::IDENTITY; 2];
    let rigid = with_material(SceneMaterial::default_material(), VertexAttributes::POSITION);

    let bone_shader = shaders.get_shader(&skinned).unwrap();
    let rigid_shader = shaders.get_shader(&rigid).unwrap();

    assert_ne!(bone_shader, rigid_shader);
    assert!(!shaders.program(bone_shader).unwrap().can_render(&rigid));
    assert_eq!(shaders.len(), 2);
}

#[test]
fn previous_shader_is_reused_when_it_still_matches() {
    let mut shaders = material_provider();
    let mut renderable = with_material(SceneMaterial::default_material(), VertexAttributes::POSITION);
    let first = shaders.get_shader(&renderable).unwrap();
    renderable.shader = Some(first);

    // A hint from another provider is ignored.
    let mut other = material_provider();
    let second = other.get_shader(&renderable).unwrap();
    assert_ne!(first, second);
    assert_eq!(shaders.get_shader(&renderable).unwrap(), first);

    renderable.vertex_mask |= VertexAttributes::NORMAL;
    let widened = shaders.get_shader(&renderable).unwrap();
    assert_ne!(widened, first);
    assert_eq!(shaders.len(), 2);
}

#[test]
fn too_many_bones_is_an_error() {
    let mut shaders = ShaderProvider::new(MaterialProgram::create, ShaderConfig { max_bones: 1 });
    let mut renderable = with_material(
        SceneMaterial::default_material(),
        VertexAttributes::POSITION | VertexAttributes::SKINNING,
    );
    renderable.bones = vec![Mat4::IDENTITY; 2];

    assert!(matches!(
        shaders.get_shader(&renderable),
        Err(RenderError::TooManyBones { bones: 2, max: 1 })
    ));
    assert!(shaders.is_empty());
}

#[test]
fn rigid_primitive_combines_instance_and_node_transforms() {
    let placement = Mat4::from_translation(Vec3::new(2.0, 0.0, 0.0));
    let instance = SceneModelInstance::new(triangle(), placement, &[]).unwrap();
    let mut provider = RenderableProvider::new();
    let mut shaders = material_provider();
    let mut out = Vec::new();

    provider.obtain_instance_renderables(&instance, &mut shaders, &mut out).unwrap();

    let node = out[0].node.unwrap();
    assert_eq!(out[0].world_transform, placement * instance.graph.node(node).world_transform);
    assert!(!out[0].has_bones());
    assert_eq!(out[0].mesh_primitive().unwrap().vertex_count, 3);
}

#[test]
fn skinned_primitive_uses_instance_transform_and_bones() {
    let placement = Mat4::from_translation(Vec3::new(0.0, 0.0, -3.0));
    let mut instance = SceneModelInstance::new(skinned(), placement, &[]).unwrap();
    instance.update(0.5);
    let mut provider = RenderableProvider::new();
    let mut shaders = material_provider();
    let mut out = Vec::new();

    provider.obtain_instance_renderables(&instance, &mut shaders, &mut out).unwrap();

    assert_eq!(out.len(), 1);
    assert_eq!(out[0].world_transform, placement);
    assert_eq!(out[0].bones.len(), 2);
    assert!(out[0].vertex_mask.contains(VertexAttributes::SKINNING));
    assert!(!out[0].bones[1].abs_diff_eq(Mat4::IDENTITY, 1e-3));
}

#[test]
fn rigid_primitive_beside_a_skin_keeps_node_transform() {
    let placement = Mat4::from_translation(Vec3::new(2.0, 0.0, 0.0));
    let instance = SceneModelInstance::new(
        model(&common::skinned_with_rigid_part(), &common::skinned_bin()),
        placement,
        &[],
    )
    .unwrap();
    let mut provider = RenderableProvider::new();
    let mut shaders = material_provider();
    let mut out = Vec::new();

    provider.obtain_instance_renderables(&instance, &mut shaders, &mut out).unwrap();

    assert_eq!(out.len(), 2);
    let node = instance.graph.node(out[1].node.unwrap());
    assert!(node.mesh.as_ref().unwrap().bones[1].is_none());
    assert_eq!(out[0].world_transform, placement);
    assert!(out[0].has_bones());
    let expected = placement * Mat4::from_translation(Vec3::new(0.0, 0.0, 3.0));
    assert!(out[1].world_transform.abs_diff_eq(expected, 1e-6));
    assert!(!out[1].has_bones());
    assert!(!out[1].vertex_mask.contains(VertexAttributes::SKINNING));
}

#[test]
fn sort_draws_opaque_before_blended() {
    let mut shaders = material_provider();
    let provider = RenderableProvider::new();

    let mut glass = SceneMaterial::new("glass");
    glass.set(MaterialAttribute::BaseColour(Vec4::new(1.0, 1.0, 1.0, 0.5)));
    glass.set(MaterialAttribute::Blended);

    let mut out = vec![
        with_material(glass, VertexAttributes::POSITION),
        Renderable::default(),
        with_material(SceneMaterial::default_material(), VertexAttributes::POSITION),
    ];
    for i in [0, 2] {
        let shader = shaders.get_shader(&out[i]).unwrap();
        out[i].shader = Some(shader);
    }

    provider.sort(&mut out, &shaders);

    assert_eq!(out[0].material.as_ref().unwrap().name, "default");
    assert_eq!(out[1].material.as_ref().unwrap().name, "glass");
    assert!(out[2].shader.is_none());
}

#[test]
fn free_all_returns_renderables_to_the_pool() {
    let instance = SceneModelInstance::new(triangle(), Mat4::IDENTITY, &[]).unwrap();
    let mut provider = RenderableProvider::new();
    let mut shaders = material_provider();
    let mut out = Vec::new();

    provider.obtain_instance_renderables(&instance, &mut shaders, &mut out).unwrap();
    provider.obtain_instance_renderables(&instance, &mut shaders, &mut out).unwrap();
    provider.free_all(&mut out);
    assert!(out.is_empty());
    assert_eq!(provider.pool().available(), 2);

    provider.obtain_instance_renderables(&instance, &mut shaders, &mut out).unwrap();
    assert_eq!(provider.pool().available(), 1);
    assert!(out[0].material.is_some());
}

#[test]
fn material_program_binds_its_uniforms() {
    let mut shaders = material_provider();
    let mut material = SceneMaterial::new("painted");
    material.set(MaterialAttribute::BaseColour(Vec4::new(1.0, 0.0, 0.0, 1.0)));
    material.set(MaterialAttribute::Roughness(0.25));
    let mut renderable = with_material(material, VertexAttributes::POSITION | VertexAttributes::NORMAL);
    renderable.world_transform = Mat4::from_translation(Vec3::Y);

    let handle = shaders.get_shader(&renderable).unwrap();
    let program = shaders.program(handle).unwrap();
    let mut recorder = UniformRecorder::default();
    program.bind(&renderable, &mut recorder);

    assert!(program.prefix().contains("#define baseColourFlag\n"));
    assert!(program.prefix().contains("#define roughnessFlag\n"));
    assert!(program.prefix().contains("#define normalFlag\n"));
    assert!(!program.prefix().contains("numBones"));
    assert_eq!(
        recorder.floats("u_worldTrans").unwrap(),
        Mat4::from_translation(Vec3::Y).to_cols_array()
    );
    assert!(!recorder.contains("u_bones"));

    let uniform: MaterialUniform = bytemuck::pod_read_unaligned(recorder.bytes("u_material").unwrap());
    assert_eq!(uniform.base_colour, [1.0, 0.0, 0.0, 1.0]);
    assert_eq!(uniform.roughness, 0.25);
    assert_eq!(uniform.metallic, 1.0);
}

#[test]
fn skinned_variant_declares_bone_count_and_binds_bones() {
    let mut shaders = material_provider();
    let mut renderable = with_material(
        SceneMaterial::default_material(),
        VertexAttributes::POSITION | VertexAttributes::SKINNING,
    );
    renderable.bones = vec![Mat4::IDENTITY, Mat4::from_translation(Vec3::X)];

    let handle = shaders.get_shader(&renderable).unwrap();
    let program = shaders.program(handle).unwrap();
    let mut recorder = UniformRecorder::default();
    program.bind(&renderable, &mut recorder);

    assert!(program.prefix().contains("#define numBones 64\n"));
    assert!(program.prefix().contains("#define jointsFlag\n"));
    assert_eq!(recorder.floats("u_bones").unwrap().len(), 32);
}

#[test]
fn depth_and_shadow_passes_collapse_material_variants() {
    let mut depth = ShaderProvider::new(DepthProgram::create, ShaderConfig::default());
    let mut shadow = ShaderProvider::new(ShadowProgram::create, ShaderConfig::default());

    let mut metal = SceneMaterial::default_material();
    metal.set(MaterialAttribute::Metallic(1.0));
    let mut leaves = SceneMaterial::default_material();
    leaves.set(MaterialAttribute::AlphaTest(0.3));

    let plain = with_material(SceneMaterial::default_material(), VertexAttributes::POSITION);
    let metal = with_material(metal, VertexAttributes::POSITION | VertexAttributes::NORMAL);
    let leaves = with_material(leaves, VertexAttributes::POSITION | VertexAttributes::TEXCOORD_0);

    let plain_depth = depth.get_shader(&plain).unwrap();
    assert_eq!(depth.get_shader(&metal).unwrap(), plain_depth);
    let leaves_depth = depth.get_shader(&leaves).unwrap();
    assert_ne!(leaves_depth, plain_depth);

    let mut recorder = UniformRecorder::default();
    depth.program(leaves_depth).unwrap().bind(&leaves, &mut recorder);
    assert_eq!(recorder.floats("u_alphaTest").unwrap(), [0.3]);

    for renderable in [&plain, &metal, &leaves] {
        shadow.get_shader(renderable).unwrap();
    }
    assert_eq!(shadow.len(), 1);

    let shadow_handle = shadow.get_shader(&plain).unwrap();
    let shadow_program = shadow.program(shadow_handle).unwrap();
    let depth_program = depth.program(plain_depth).unwrap();
    assert!(shadow_program.compare_to(depth_program).is_lt());
    assert!(shadow_program.key().material.is_empty());
    assert_eq!(depth_program.key().material, MaterialMask::empty());
}

#[test]
fn render_plugin_extracts_every_pass_each_frame() {
    let mut app = App::new();
    app.add_plugin(ScenePlugin).add_plugin(RenderPlugin::default());
    let model = skinned();
    app.world
        .entity()
        .set(SceneModelInstance::new(model.clone(), Mat4::IDENTITY, &[]).unwrap());
    app.world
        .entity()
        .set(SceneModelInstance::new(model, Mat4::from_translation(Vec3::X), &[]).unwrap());

    app.update_with_delta(Duration::from_millis(100));
    app.update_with_delta(Duration::from_millis(100));

    app.world.get::<&RenderPasses>(|passes| {
        assert!(passes.failure.is_none());
        for pass in passes.passes() {
            assert_eq!(pass.renderables.len(), 2, "{} pass", pass.name);
            assert_eq!(pass.shaders.len(), 1, "{} pass", pass.name);
        }
        assert_eq!(passes.provider.pool().available(), 0);
    });
}

#[test]
fn render_plugin_records_extraction_failures() {
    let mut app = App::new();
    app.add_plugin(ScenePlugin).add_plugin(RenderPlugin {
        config: ShaderConfig { max_bones: 1 },
    });
    app.world
        .entity()
        .set(SceneModelInstance::new(skinned(), Mat4::IDENTITY, &[]).unwrap());

    app.update_with_delta(Duration::from_millis(16));

    app.world.get::<&RenderPasses>(|passes| {
        assert!(matches!(
            passes.failure,
            Some(RenderError::TooManyBones { bones: 2, max: 1 })
        ));
        assert!(passes.passes().iter().all(|pass| pass.renderables.is_empty()));
    });
}
