//! Host-side frame timing.
//!
//! [`WorldTime`] is the bevy resource the host loop updates once per frame
//! via [`update_world_time`](crate::systems::host::update_world_time).
//! `delta` is already scaled by `time_scale`; `real_delta` is the raw frame
//! time handed to the [`Director`](crate::systems::director::Director),
//! which applies its own scale.

use bevy_ecs::prelude::Resource;

#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct WorldTime {
    pub elapsed: f32,
    pub delta: f32,
    pub real_delta: f32,
    pub time_scale: f32,
    pub frame_count: u64,
}

impl Default for WorldTime {
    fn default() -> Self {
        WorldTime {
            elapsed: 0.0,
            delta: 0.0,
            real_delta: 0.0,
            time_scale: 1.0,
            frame_count: 0,
        }
    }
}

impl WorldTime {
    /// Builder: start with a specific time scale.
    pub fn with_time_scale(mut self, time_scale: f32) -> Self {
        self.time_scale = time_scale;
        self
    }
}
