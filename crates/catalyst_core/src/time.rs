use std::time::{Duration, Instant};

use flecs_ecs::macros::Component;

/// Frame clock. The engine never advances it on its own: the host calls
/// [`Time::update`] (wall clock) or [`Time::advance_by`] (fixed step) once
/// per frame, and every system reads the resulting delta.
#[derive(Component, Debug)]
pub struct Time {
    last_update: Instant,
    delta: Duration,
    elapsed: Duration,
    frame: u64,
}

impl Default for Time {
    fn default() -> Self {
        Self {
            last_update: Instant::now(),
            delta: Duration::ZERO,
            elapsed: Duration::ZERO,
            frame: 0,
        }
    }
}

impl Time {
    /// Called by the engine loop once per frame
    pub fn update(&mut self) {
        let now = Instant::now();
        let delta = now - self.last_update;
        self.advance_by(delta);
        self.last_update = now;
    }

    pub fn advance_by(&mut self, delta: Duration) {
        self.delta = delta;
        self.elapsed += delta;
        self.frame += 1;
    }

    /// Returns time in seconds since last frame (e.g., 0.016 for 60fps)
    pub fn delta_seconds(&self) -> f32 {
        self.delta.as_secs_f32()
    }

    /// Returns the accumulated frame time
    pub fn elapsed_seconds(&self) -> f32 {
        self.elapsed.as_secs_f32()
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }
}
