pub use flecs_ecs::prelude::*;

use std::time::Duration;

pub mod time;
pub mod transform;

use crate::time::Time;

/// The Plugin Trait
/// Every module (Assets, Scene, Renderer) must implement this.
pub trait Plugin {
    fn build(&self, app: &mut App);
}

/// The Engine Application
/// Holds the ECS World and drives one frame at a time.
pub struct App {
    pub world: World,
    pub running: bool,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl App {
    pub fn new() -> Self {
        let world = World::new();

        world.component::<Time>().add_trait::<flecs::Singleton>();
        world.set(Time::default());

        Self {
            world,
            running: true,
        }
    }

    pub fn add_plugin<P: Plugin>(&mut self, plugin: P) -> &mut Self {
        log::debug!("adding plugin {}", std::any::type_name::<P>());
        plugin.build(self);
        self
    }

    /// Runs ONE frame, measuring the delta from the wall clock.
    pub fn update(&mut self) {
        if !self.running {
            return;
        }
        self.world.get::<&mut Time>(|time| time.update());
        self.running = self.world.progress();
    }

    /// Runs ONE frame with an externally supplied delta.
    /// Used by headless drivers and anything that needs deterministic ticks.
    pub fn update_with_delta(&mut self, delta: Duration) {
        if !self.running {
            return;
        }
        self.world.get::<&mut Time>(|time| time.advance_by(delta));
        self.running = self.world.progress();
    }

    pub fn delta_seconds(&self) -> f32 {
        self.world.get::<&Time>(|time| time.delta_seconds())
    }
}
