//! Volume control notifications.
//!
//! The audio mixer lives in the host; it listens for [`VolumeChanged`] and
//! applies the effective level to its own buses.

use serde::{Deserialize, Serialize};

/// Logical mixer buses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VolumeBus {
    Master,
    Music,
    Sfx,
}

impl VolumeBus {
    pub const ALL: [VolumeBus; 3] = [VolumeBus::Master, VolumeBus::Music, VolumeBus::Sfx];

    pub fn index(self) -> usize {
        match self {
            VolumeBus::Master => 0,
            VolumeBus::Music => 1,
            VolumeBus::Sfx => 2,
        }
    }
}

/// Raised whenever a bus level or mute state changes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumeChanged {
    pub bus: VolumeBus,
    /// Level set on this bus, `0.0..=1.0`.
    pub level: f32,
    /// Level after applying master volume and mute.
    pub effective: f32,
    pub muted: bool,
    /// True when the change comes from a reset to defaults.
    pub reset: bool,
}
