//! ECS components for marked entities.
//!
//! Submodules overview:
//! - [`marker`] – lets an entity register with manager modules, by priority
//! - [`markposition`] – world-space position mirrored into sensor managers

pub mod marker;
pub mod markposition;
