use std::{
    cmp::Ordering,
    collections::HashMap,
    sync::atomic::{AtomicU32, Ordering as AtomicOrdering},
};

use catalyst_assets::{material::MaterialMask, mesh::VertexAttributes};

use crate::{error::RenderError, renderable::Renderable, uniforms::UniformBinder};

/// Attribute masks a shader variant is selected by.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShaderKey {
    pub material: MaterialMask,
    pub vertex: VertexAttributes,
}

/// Points at a program owned by one [`ShaderProvider`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ShaderHandle {
    pub provider: u32,
    pub index: u32,
}

#[derive(Clone, Copy, Debug)]
pub struct ShaderConfig {
    pub max_bones: usize,
}

impl Default for ShaderConfig {
    fn default() -> Self {
        Self { max_bones: 64 }
    }
}

/// One compiled shader variant.
pub trait ShaderProgram: Send + Sync {
    /// The masks this variant was generated from.
    fn key(&self) -> ShaderKey;

    fn can_render(&self, renderable: &Renderable) -> bool;

    /// Relative draw order; lower weights draw first.
    fn weight(&self) -> i32;

    fn compare_to(&self, other: &dyn ShaderProgram) -> Ordering {
        self.weight().cmp(&other.weight())
    }

    /// Preprocessor prefix put in front of the shader source.
    fn prefix(&self) -> &str;

    /// Sets the per-draw uniforms of `renderable`.
    fn bind(&self, renderable: &Renderable, binder: &mut dyn UniformBinder);
}

/// Builds the variant a renderable needs.
pub trait ProgramFactory: Send + Sync {
    fn create(&self, renderable: &Renderable, config: &ShaderConfig) -> Box<dyn ShaderProgram>;
}

impl<F> ProgramFactory for F
where
    F: Fn(&Renderable, &ShaderConfig) -> Box<dyn ShaderProgram> + Send + Sync,
{
    fn create(&self, renderable: &Renderable, config: &ShaderConfig) -> Box<dyn ShaderProgram> {
        self(renderable, config)
    }
}

static NEXT_PROVIDER_ID: AtomicU32 = AtomicU32::new(1);

/// Cache of shader variants for one render pass.
pub struct ShaderProvider {
    id: u32,
    config: ShaderConfig,
    factory: Box<dyn ProgramFactory>,
    programs: Vec<Box<dyn ShaderProgram>>,
    by_key: HashMap<ShaderKey, u32>,
}

impl ShaderProvider {
    pub fn new(factory: impl ProgramFactory + 'static, config: ShaderConfig) -> Self {
        Self {
            id: NEXT_PROVIDER_ID.fetch_add(1, AtomicOrdering::Relaxed),
            config,
            factory: Box::new(factory),
            programs: Vec::new(),
            by_key: HashMap::new(),
        }
    }

    pub fn config(&self) -> &ShaderConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.programs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }

    pub fn program(&self, handle: ShaderHandle) -> Option<&dyn ShaderProgram> {
        if handle.provider != self.id {
            return None;
        }
        self.programs.get(handle.index as usize).map(Box::as_ref)
    }

    fn handle(&self, index: u32) -> ShaderHandle {
        ShaderHandle {
            provider: self.id,
            index,
        }
    }

    fn matches(&self, index: u32, renderable: &Renderable) -> bool {
        self.programs[index as usize].can_render(renderable)
    }

    /// Finds or creates a shader able to render `renderable`: its previous
    /// shader first, then the cache, then every known variant, and finally a
    /// new variant.
    pub fn get_shader(&mut self, renderable: &Renderable) -> Result<ShaderHandle, RenderError> {
        if let Some(previous) = renderable.shader {
            if previous.provider == self.id && self.matches(previous.index, renderable) {
                return Ok(previous);
            }
        }

        let key = renderable.key();
        if let Some(&index) = self.by_key.get(&key) {
            if self.matches(index, renderable) {
                return Ok(self.handle(index));
            }
        }

        if let Some(index) = self
            .programs
            .iter()
            .position(|program| program.can_render(renderable))
        {
            let index = index as u32;
            self.by_key.insert(key, index);
            return Ok(self.handle(index));
        }

        if renderable.bones.len() > self.config.max_bones {
            return Err(RenderError::TooManyBones {
                bones: renderable.bones.len(),
                max: self.config.max_bones,
            });
        }

        let program = self.factory.create(renderable, &self.config);
        if !program.can_render(renderable) {
            return Err(RenderError::ShaderMismatch { key });
        }
        log::debug!("created shader variant {:?}", program.key());
        let index = self.programs.len() as u32;
        self.programs.push(program);
        self.by_key.insert(key, index);
        Ok(self.handle(index))
    }
}
