//! Module lifecycle and the gameplay modules built on it.
//!
//! Submodules overview
//! - [`module`] – lifecycle states, update cadence and the `Module` trait
//! - [`director`] – registry and driver for every module
//! - [`host`] – bevy systems that drive the director each frame
//! - [`notes`] – collected note ids with JSON persistence
//! - [`sensor`] – range sensors over marked entities
//! - [`slowdown`] – slow-motion and freeze effects on the time scale
//! - [`volume`] – per-bus volume with mute, fades and persistence

pub mod director;
pub mod host;
pub mod module;
pub mod notes;
pub mod sensor;
pub mod slowdown;
pub mod volume;
