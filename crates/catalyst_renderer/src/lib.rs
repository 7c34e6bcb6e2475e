use catalyst_core::{App, Plugin};
use catalyst_scene::SceneModelInstance;
use flecs_ecs::prelude::*;

pub mod error;
pub mod passes;
pub mod programs;
pub mod renderable;
pub mod shader;
pub mod uniforms;

pub use error::RenderError;
pub use passes::{RenderPass, RenderPasses};
pub use renderable::{Renderable, RenderablePool, RenderableProvider};
pub use shader::{ProgramFactory, ShaderConfig, ShaderHandle, ShaderKey, ShaderProgram, ShaderProvider};
pub use uniforms::{UniformBinder, UniformRecorder};

/// Extracts renderables from every scene model instance once per frame.
/// Drawing happens in `OnStore`, after extraction in `PreStore`.
#[derive(Default)]
pub struct RenderPlugin {
    pub config: ShaderConfig,
}

impl Plugin for RenderPlugin {
    fn build(&self, app: &mut App) {
        app.world
            .component::<RenderPasses>()
            .add_trait::<flecs::Singleton>();
        app.world.set(RenderPasses::new(self.config));

        register_extract_renderables(&app.world);
    }
}

pub fn register_extract_renderables(world: &World) {
    let instances = world
        .query_named::<&SceneModelInstance>("scene_model_instances")
        .set_cached()
        .build();

    world
        .system_named::<&mut RenderPasses>("Extract Scene Renderables")
        .kind(flecs::pipeline::PreStore)
        .each(move |passes| {
            if passes.failure.is_some() {
                return;
            }
            if let Err(err) = passes.extract(&instances) {
                log::error!("renderable extraction failed: {err}");
                passes.release();
                passes.failure = Some(err);
            }
        });
}
