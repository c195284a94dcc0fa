//! Slowdown / time-freeze notifications.
//!
//! Published by [`SlowdownManager`](crate::systems::slowdown::SlowdownManager)
//! on its output channel. Requests travel the other way on an input channel
//! the manager subscribes to during `awake`.

/// Notification raised when the global time scale changes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SlowdownEvent {
    /// Time now runs at `time_scale` for `duration` real seconds.
    Started { time_scale: f32, duration: f32 },
    /// Time is stopped for `duration` real seconds.
    Frozen { duration: f32 },
    /// The effect ended (or was cancelled) and `time_scale` was restored.
    Reset { time_scale: f32 },
}

/// Request accepted on the manager's input channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SlowdownRequest {
    /// Slow time to `time_scale` for `duration` real seconds.
    SlowDown { time_scale: f32, duration: f32 },
    /// Freeze time for `duration` real seconds.
    Freeze { duration: f32 },
    /// Cancel any running effect.
    Reset,
}
