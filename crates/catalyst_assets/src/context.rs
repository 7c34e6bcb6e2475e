use std::sync::Arc;

use crate::{
    accessor::AccessorReader,
    animation::{SceneAnimationData, build_animation_data},
    buffer::{Resources, decode_buffers},
    document::{CameraData, Document, NodeData, SceneData},
    error::{AssetError, DocumentError},
    material::{SceneMaterial, build_material},
    mesh::{SceneMesh, build_mesh},
    skin::{SceneSkin, build_skin},
    texture::{SceneTexture, load_textures},
};

/// What to do with indices that do not fit 16 bits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum IndexPolicy {
    /// Keep 16-bit indices only; larger values fail the load.
    Narrow16,
    /// Fall back to 32-bit indices for primitives that need them.
    #[default]
    Preserve,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct LoadOptions {
    pub index_policy: IndexPolicy,
    /// Divide UNSIGNED_BYTE vertex data by 255. Accessors flagged
    /// `normalized` are always divided.
    pub normalize_unsigned_bytes: bool,
}

/// Engine resources built from one document. Shared, read-only data that
/// every scene graph of the asset points into.
pub struct SceneResourceContext {
    pub textures: Vec<Option<Arc<SceneTexture>>>,
    pub materials: Vec<Arc<SceneMaterial>>,
    pub default_material: Arc<SceneMaterial>,
    pub meshes: Vec<Arc<SceneMesh>>,
    pub skins: Vec<Arc<SceneSkin>>,
    pub animation_data: SceneAnimationData,
    pub nodes: Vec<NodeData>,
    pub scenes: Vec<SceneData>,
    pub default_scene: Option<usize>,
    pub cameras: Vec<CameraData>,
}

impl SceneResourceContext {
    /// Parses, validates and loads a JSON document.
    pub fn load_from_json(
        json: &str,
        resources: &Resources<'_>,
        options: LoadOptions,
    ) -> Result<Self, AssetError> {
        let document: Document = serde_json::from_str(json).map_err(DocumentError::from)?;
        Self::load_from_data_model(document, resources, options)
    }

    /// Validates a document model and builds every resource it names. The
    /// stages run in order since each one reads what the previous produced.
    pub fn load_from_data_model(
        document: Document,
        resources: &Resources<'_>,
        options: LoadOptions,
    ) -> Result<Self, AssetError> {
        document.validate()?;

        // --- STEP 1: BUFFERS ---
        let buffers = decode_buffers(&document, resources)?;
        let reader = AccessorReader::new(&document, &buffers);

        // --- STEP 2: TEXTURES ---
        let textures = load_textures(&document, &buffers, resources);

        // --- STEP 3: MATERIALS ---
        let materials: Vec<Arc<SceneMaterial>> = document
            .materials
            .iter()
            .enumerate()
            .map(|(i, material)| Arc::new(build_material(i, material, &textures)))
            .collect();
        let default_material = Arc::new(SceneMaterial::default_material());

        // --- STEP 4: MESHES AND INDICES ---
        let meshes = document
            .meshes
            .iter()
            .enumerate()
            .map(|(i, mesh)| {
                build_mesh(&reader, i, mesh, &materials, &default_material, &options).map(Arc::new)
            })
            .collect::<Result<Vec<_>, _>>()?;

        // --- STEP 5: SKINS ---
        let skins = document
            .skins
            .iter()
            .enumerate()
            .map(|(i, skin)| build_skin(&reader, i, skin).map(Arc::new))
            .collect::<Result<Vec<_>, _>>()?;

        // --- STEP 6: ANIMATIONS ---
        let animation_data = build_animation_data(&reader, &document.animations)?;

        log::info!(
            "loaded {} textures, {} materials, {} meshes, {} skins, {} animations",
            textures.iter().flatten().count(),
            materials.len(),
            meshes.len(),
            skins.len(),
            animation_data.names.len()
        );

        let default_scene = document.default_scene();
        Ok(Self {
            textures,
            materials,
            default_material,
            meshes,
            skins,
            animation_data,
            nodes: document.nodes,
            scenes: document.scenes,
            default_scene,
            cameras: document.cameras,
        })
    }

    pub fn scene_index(&self, name: &str) -> Option<usize> {
        self.scenes
            .iter()
            .position(|scene| scene.name.as_deref() == Some(name))
    }
}
