//! Sensor detections.

use crate::components::marker::MarkId;

/// Raised by [`SensorManager`](crate::systems::sensor::SensorManager) when a
/// marked entity enters or leaves a sensor's range, and when its
/// detections are reset.
#[derive(Debug, Clone, PartialEq)]
pub enum SensorEvent {
    Detected {
        sensor: String,
        mark: MarkId,
        distance: f32,
    },
    Lost {
        sensor: String,
        mark: MarkId,
    },
    /// Every detection was cleared. `Lost` for each cleared pair comes first.
    Reset,
}
