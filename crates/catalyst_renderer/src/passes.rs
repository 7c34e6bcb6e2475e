use catalyst_scene::SceneModelInstance;
use flecs_ecs::prelude::*;

use crate::{
    error::RenderError,
    programs::{DepthProgram, MaterialProgram, ShadowProgram},
    renderable::{Renderable, RenderableProvider},
    shader::{ProgramFactory, ShaderConfig, ShaderProvider},
};

/// One render pass: its shader variants and this frame's sorted renderables.
pub struct RenderPass {
    pub name: &'static str,
    pub shaders: ShaderProvider,
    pub renderables: Vec<Renderable>,
}

impl RenderPass {
    pub fn new(name: &'static str, factory: impl ProgramFactory + 'static, config: ShaderConfig) -> Self {
        Self {
            name,
            shaders: ShaderProvider::new(factory, config),
            renderables: Vec::new(),
        }
    }
}

/// The passes fed from scene model instances, in draw order.
#[derive(Component)]
pub struct RenderPasses {
    pub provider: RenderableProvider,
    pub shadow: RenderPass,
    pub depth: RenderPass,
    pub shaded: RenderPass,
    /// First extraction error; extraction stops once set.
    pub failure: Option<RenderError>,
}

impl RenderPasses {
    pub fn new(config: ShaderConfig) -> Self {
        Self {
            provider: RenderableProvider::new(),
            shadow: RenderPass::new("shadow", ShadowProgram::create, config),
            depth: RenderPass::new("depth", DepthProgram::create, config),
            shaded: RenderPass::new("shaded", MaterialProgram::create, config),
            failure: None,
        }
    }

    pub fn passes(&self) -> [&RenderPass; 3] {
        [&self.shadow, &self.depth, &self.shaded]
    }

    /// Returns last frame's renderables to the pool, then gathers and sorts
    /// this frame's for every pass.
    pub fn extract(&mut self, instances: &Query<&SceneModelInstance>) -> Result<(), RenderError> {
        for pass in [&mut self.shadow, &mut self.depth, &mut self.shaded] {
            self.provider.free_all(&mut pass.renderables);
            self.provider
                .obtain_scene_renderables(instances, &mut pass.shaders, &mut pass.renderables)?;
            self.provider.sort(&mut pass.renderables, &pass.shaders);
        }
        Ok(())
    }

    pub fn release(&mut self) {
        for pass in [&mut self.shadow, &mut self.depth, &mut self.shaded] {
            self.provider.free_all(&mut pass.renderables);
        }
    }
}
