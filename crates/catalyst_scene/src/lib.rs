use catalyst_core::{App, Plugin, time::Time};
use flecs_ecs::prelude::*;

pub mod animation;
pub mod error;
pub mod instance;
pub mod model;
pub mod node;
pub mod scenes;

pub use animation::{SceneAnimation, SceneNodeAnimation};
pub use error::SceneError;
pub use instance::SceneModelInstance;
pub use model::SceneModel;
pub use node::{NodeId, SceneGraph, SceneNode};
pub use scenes::Scenes;

pub struct ScenePlugin;

impl Plugin for ScenePlugin {
    fn build(&self, app: &mut App) {
        app.world.component::<SceneModelInstance>();
        app.world
            .component::<Scenes>()
            .add_trait::<flecs::Singleton>();
        app.world.set(Scenes::default());

        register_animate_scenes(&app.world);
    }
}

pub fn register_animate_scenes(world: &World) {
    world
        .system_named::<(&mut SceneModelInstance, &Time)>("Advance Scene Animations")
        .kind(flecs::pipeline::OnUpdate)
        .each(|(instance, time)| {
            instance.update(time.delta_seconds());
        });
}
