use bevy_ecs::prelude::Component;

/// World position of a marked entity, mirrored into sensor managers.
#[derive(Component, Clone, Copy, Debug, PartialEq, Default)]
pub struct MarkPosition {
    pub x: f32,
    pub y: f32,
}

impl MarkPosition {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn as_tuple(&self) -> (f32, f32) {
        (self.x, self.y)
    }
}
