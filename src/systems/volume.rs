//! Volume control module.
//!
//! Keeps a level per [`VolumeBus`] and raises [`VolumeChanged`] whenever a
//! level, mute flag or fade step changes. Levels are clamped to `0.0..=1.0`;
//! the effective level of a non-master bus is `level * master`, and `0.0`
//! while either the bus or master is muted.
//!
//! Levels are loaded from the save store in `start` and written back in
//! `destroy`, under the `"volume"` key.

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::KitResult;
use crate::events::channel::EventChannel;
use crate::events::volume::{VolumeBus, VolumeChanged};
use crate::resources::kitconfig::KitConfig;
use crate::resources::savestore::{SharedSaveStore, load_json, save_json};
use crate::systems::director::Director;
use crate::systems::module::{Module, Tick, UpdateMode};

/// Save-store key for persisted levels.
pub const VOLUME_SAVE_KEY: &str = "volume";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct BusState {
    level: f32,
    muted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Fade {
    from: f32,
    to: f32,
    duration: f32,
    elapsed: f32,
}

/// Per-bus volume levels with mute and fades.
pub struct VolumeControl {
    defaults: [f32; 3],
    buses: [BusState; 3],
    fades: [Option<Fade>; 3],
    output: EventChannel<VolumeChanged>,
    store: Option<SharedSaveStore>,
}

impl VolumeControl {
    pub fn new(config: &KitConfig, output: EventChannel<VolumeChanged>) -> Self {
        let defaults = [
            config.master_volume.clamp(0.0, 1.0),
            config.music_volume.clamp(0.0, 1.0),
            config.sfx_volume.clamp(0.0, 1.0),
        ];
        Self {
            defaults,
            buses: defaults.map(|level| BusState {
                level,
                muted: false,
            }),
            fades: [None; 3],
            output,
            store: None,
        }
    }

    /// Builder: persist levels in `store`.
    pub fn with_store(mut self, store: SharedSaveStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn output(&self) -> &EventChannel<VolumeChanged> {
        &self.output
    }

    pub fn level(&self, bus: VolumeBus) -> f32 {
        self.buses[bus.index()].level
    }

    pub fn is_muted(&self, bus: VolumeBus) -> bool {
        self.buses[bus.index()].muted
    }

    /// Level the mixer should apply to `bus`.
    pub fn effective(&self, bus: VolumeBus) -> f32 {
        let master = self.buses[VolumeBus::Master.index()];
        let state = self.buses[bus.index()];
        if master.muted || state.muted {
            return 0.0;
        }
        match bus {
            VolumeBus::Master => master.level,
            _ => state.level * master.level,
        }
    }

    pub fn is_fading(&self, bus: VolumeBus) -> bool {
        self.fades[bus.index()].is_some()
    }

    /// Set a level immediately, cancelling any fade on that bus.
    pub fn set_level(&mut self, bus: VolumeBus, level: f32) {
        self.fades[bus.index()] = None;
        self.write_level(bus, level);
    }

    /// Fade `bus` to `target` over `duration` real seconds.
    pub fn fade_to(&mut self, bus: VolumeBus, target: f32, duration: f32) {
        if duration <= 0.0 {
            self.set_level(bus, target);
            return;
        }
        self.fades[bus.index()] = Some(Fade {
            from: self.level(bus),
            to: target.clamp(0.0, 1.0),
            duration,
            elapsed: 0.0,
        });
    }

    pub fn mute(&mut self, bus: VolumeBus) {
        self.set_muted(bus, true);
    }

    pub fn unmute(&mut self, bus: VolumeBus) {
        self.set_muted(bus, false);
    }

    /// Restore configured defaults, unmute, cancel fades, announce each bus.
    pub fn reset(&mut self) {
        self.fades = [None; 3];
        for bus in VolumeBus::ALL {
            self.buses[bus.index()] = BusState {
                level: self.defaults[bus.index()],
                muted: false,
            };
        }
        for bus in VolumeBus::ALL {
            self.announce(bus, true);
        }
    }

    /// Write current levels to the save store, if any.
    pub fn save(&self) -> KitResult<()> {
        let Some(store) = &self.store else {
            return Ok(());
        };
        let mut store = store.borrow_mut();
        save_json(&mut *store, VOLUME_SAVE_KEY, &self.buses)?;
        store.flush()
    }

    /// Read levels from the save store, if any. Missing data keeps defaults.
    pub fn load(&mut self) -> KitResult<()> {
        let Some(store) = &self.store else {
            return Ok(());
        };
        let saved: Option<[BusState; 3]> = load_json(&*store.borrow(), VOLUME_SAVE_KEY)?;
        if let Some(saved) = saved {
            for (bus, state) in VolumeBus::ALL.into_iter().zip(saved) {
                self.buses[bus.index()] = BusState {
                    level: state.level.clamp(0.0, 1.0),
                    muted: state.muted,
                };
            }
            debug!("VolumeControl: restored saved levels");
        }
        Ok(())
    }

    fn write_level(&mut self, bus: VolumeBus, level: f32) {
        let level = level.clamp(0.0, 1.0);
        let state = &mut self.buses[bus.index()];
        if state.level == level {
            return;
        }
        state.level = level;
        self.announce(bus, false);
    }

    fn set_muted(&mut self, bus: VolumeBus, muted: bool) {
        let state = &mut self.buses[bus.index()];
        if state.muted == muted {
            return;
        }
        state.muted = muted;
        self.announce(bus, false);
    }

    fn announce(&self, bus: VolumeBus, reset: bool) {
        let state = self.buses[bus.index()];
        self.output.raise(&VolumeChanged {
            bus,
            level: state.level,
            effective: self.effective(bus),
            muted: state.muted,
            reset,
        });
    }
}

impl Module for VolumeControl {
    fn name(&self) -> &str {
        "volume"
    }

    fn start(&mut self, _director: &Director) {
        if let Err(e) = self.load() {
            warn!("VolumeControl: could not load saved levels: {}", e);
        }
        for bus in VolumeBus::ALL {
            self.announce(bus, false);
        }
    }

    fn update_mode(&self) -> UpdateMode {
        UpdateMode::EveryTick
    }

    fn update(&mut self, _director: &Director, tick: &Tick) {
        for bus in VolumeBus::ALL {
            let Some(mut fade) = self.fades[bus.index()] else {
                continue;
            };
            fade.elapsed += tick.unscaled_delta;
            let t = (fade.elapsed / fade.duration).min(1.0);
            let level = fade.from + (fade.to - fade.from) * t;
            self.fades[bus.index()] = if t >= 1.0 { None } else { Some(fade) };
            self.write_level(bus, level);
        }
    }

    fn destroy(&mut self, _director: &Director) {
        if let Err(e) = self.save() {
            warn!("VolumeControl: could not save levels: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn control() -> (VolumeControl, Rc<RefCell<Vec<VolumeChanged>>>) {
        let output = EventChannel::new("volume");
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let _sub = output.add_listener(move |e: &VolumeChanged| sink.borrow_mut().push(*e));
        (VolumeControl::new(&KitConfig::new(), output), seen)
    }

    #[test]
    fn levels_clamp() {
        let (mut volume, _seen) = control();
        volume.set_level(VolumeBus::Music, 3.0);
        assert_eq!(volume.level(VolumeBus::Music), 1.0);
        volume.set_level(VolumeBus::Music, -1.0);
        assert_eq!(volume.level(VolumeBus::Music), 0.0);
    }

    #[test]
    fn effective_level_scales_by_master() {
        let (mut volume, _seen) = control();
        volume.set_level(VolumeBus::Master, 0.5);
        volume.set_level(VolumeBus::Sfx, 0.5);
        assert!((volume.effective(VolumeBus::Sfx) - 0.25).abs() < 1e-6);
        volume.mute(VolumeBus::Master);
        assert_eq!(volume.effective(VolumeBus::Sfx), 0.0);
        volume.unmute(VolumeBus::Master);
        assert!((volume.effective(VolumeBus::Sfx) - 0.25).abs() < 1e-6);
    }

    #[test]
    fn mute_keeps_level_for_unmute() {
        let (mut volume, seen) = control();
        volume.set_level(VolumeBus::Music, 0.4);
        volume.mute(VolumeBus::Music);
        volume.mute(VolumeBus::Music);
        assert_eq!(volume.level(VolumeBus::Music), 0.4);
        volume.unmute(VolumeBus::Music);
        let events = seen.borrow();
        assert_eq!(events.len(), 3);
        assert!(events[1].muted);
        assert_eq!(events[1].effective, 0.0);
        assert!(!events[2].muted);
    }

    #[test]
    fn unchanged_level_is_not_announced() {
        let (mut volume, seen) = control();
        let current = volume.level(VolumeBus::Sfx);
        volume.set_level(VolumeBus::Sfx, current);
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn reset_restores_defaults_and_announces() {
        let (mut volume, seen) = control();
        volume.set_level(VolumeBus::Music, 0.1);
        volume.mute(VolumeBus::Sfx);
        seen.borrow_mut().clear();
        volume.reset();
        assert!((volume.level(VolumeBus::Music) - 0.6).abs() < 1e-6);
        assert!(!volume.is_muted(VolumeBus::Sfx));
        let events = seen.borrow();
        assert_eq!(events.len(), 3);
        assert!(events.iter().all(|e| e.reset));
    }
}
