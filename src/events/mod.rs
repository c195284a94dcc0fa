//! Event channels and the payloads modules exchange through them.
//!
//! Channels decouple publishers from subscribers: a module holds a clone of
//! an [`channel::EventChannel`] and raises payloads without knowing who
//! listens. A [`converter::ConverterChannel`] maps one channel's payloads
//! into another's.
//!
//! Submodules:
//! - [`channel`] – multicast channel with subscription tokens
//! - [`converter`] – filtering/mapping bridge between two channels
//! - [`notes`] – note collected/removed/loaded notifications
//! - [`sensor`] – marks entering or leaving a sensor
//! - [`slowdown`] – time-scale requests and announcements
//! - [`volume`] – per-bus volume change notifications
pub mod channel;
pub mod converter;
pub mod notes;
pub mod sensor;
pub mod slowdown;
pub mod volume;
