//! Long-lived data shared by modules and the bevy host.
//!
//! Overview
//! - `kitconfig` – INI-backed settings (tick rate, time scales, volumes, save path)
//! - `objectbucket` – named authored objects with a lazy name index
//! - `savestore` – key/value persistence (memory or JSON file)
//! - `typedbucket` – string key/value pairs decoded on access
//! - `worldtime` – host frame time and delta
pub mod kitconfig;
pub mod objectbucket;
pub mod savestore;
pub mod typedbucket;
pub mod worldtime;
