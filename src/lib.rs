//! Playkit library.
//!
//! Lifecycle-managed gameplay modules, typed event channels, data buckets
//! and persistence, hosted on a bevy_ecs world. Exposed for the `playkit`
//! binary and for integration tests.

pub mod components;
pub mod error;
pub mod events;
pub mod resources;
pub mod systems;
