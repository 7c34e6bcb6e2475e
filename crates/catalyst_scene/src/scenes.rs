use std::{collections::HashMap, sync::Arc};

use catalyst_assets::{LoadOptions, Resources, SceneResourceContext};
use flecs_ecs::prelude::*;

use crate::{error::SceneError, model::SceneModel, node::NodeId};

/// Process-wide cache of loaded models, keyed by asset path or model name.
/// Models keep their registration order so name lookups are repeatable.
#[derive(Component, Default)]
pub struct Scenes {
    models: Vec<Arc<SceneModel>>,
    keys: HashMap<String, usize>,
    pub options: LoadOptions,
}

impl Scenes {
    /// Loads the default scene of a document once; later calls with the same
    /// path return the cached model.
    pub fn load(
        &mut self,
        path: &str,
        json: &str,
        resources: &Resources<'_>,
    ) -> Result<Arc<SceneModel>, SceneError> {
        if let Some(&slot) = self.keys.get(path) {
            return Ok(self.models[slot].clone());
        }
        let context = SceneResourceContext::load_from_json(json, resources, self.options)?;
        let model = Arc::new(SceneModel::from_context(path, &context)?);
        self.insert(path, model.clone());
        log::info!("scene {path} loaded");
        Ok(model)
    }

    /// Registers an already built model under its name.
    pub fn add_scene(&mut self, model: SceneModel) -> Arc<SceneModel> {
        let model = Arc::new(model);
        if self.insert(&model.name, model.clone()) {
            log::warn!("scene {} replaced an earlier model with the same name", model.name);
        }
        model
    }

    /// Replaced models keep the slot of the one they replace.
    fn insert(&mut self, key: &str, model: Arc<SceneModel>) -> bool {
        match self.keys.get(key) {
            Some(&slot) => {
                self.models[slot] = model;
                true
            }
            None => {
                self.keys.insert(key.to_string(), self.models.len());
                self.models.push(model);
                false
            }
        }
    }

    pub fn get_scene(&self, name: &str) -> Result<Arc<SceneModel>, SceneError> {
        self.keys
            .get(name)
            .map(|&slot| self.models[slot].clone())
            .ok_or_else(|| SceneError::SceneNotFound(name.to_string()))
    }

    /// Finds a node by name, searching models in registration order.
    pub fn get_scene_node(&self, name: &str) -> Result<(Arc<SceneModel>, NodeId), SceneError> {
        self.models
            .iter()
            .find_map(|model| model.graph.find_by_name(name).map(|node| (model.clone(), node)))
            .ok_or_else(|| SceneError::NodeNotFound(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}
