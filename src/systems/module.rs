//! Lifecycle base for long-lived gameplay modules.
//!
//! A [`Module`] is driven by the [`Director`] through an explicit state
//! machine instead of host callbacks:
//!
//! ```text
//! Uninitialized → Constructed → Awake → Started → Live ⇄ Paused → Destroyed
//! ```
//!
//! - **Constructed** – the value exists and is owned by the director
//! - **Awake** – `awake` ran once; the module is discoverable by type
//! - **Started** – `start` ran once; the first `update` is next
//! - **Live / Paused** – `update` runs at the module's [`UpdateMode`] cadence
//!   only while live
//! - **Destroyed** – `destroy` ran once; no further hooks
//!
//! # Related
//!
//! - [`crate::systems::director`] – owns slots and advances the state machine
//! - [`crate::systems::host`] – drives the director from a bevy schedule
//!
//! [`Director`]: crate::systems::director::Director

use std::any::Any;

use crate::systems::director::Director;

/// Per-instance lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LifecycleState {
    #[default]
    Uninitialized,
    Constructed,
    Awake,
    Started,
    Live,
    Paused,
    Destroyed,
}

impl LifecycleState {
    /// Whether `update` may run in this state.
    pub fn is_live(self) -> bool {
        matches!(self, LifecycleState::Live)
    }

    /// Whether `awake` has already run (and `destroy` has not).
    pub fn is_awake(self) -> bool {
        matches!(
            self,
            LifecycleState::Awake
                | LifecycleState::Started
                | LifecycleState::Live
                | LifecycleState::Paused
        )
    }

    /// Legal single-step transitions.
    pub fn can_transition_to(self, next: LifecycleState) -> bool {
        use LifecycleState::*;
        matches!(
            (self, next),
            (Uninitialized, Constructed)
                | (Constructed, Awake)
                | (Awake, Started)
                | (Started, Live)
                | (Started, Paused)
                | (Live, Paused)
                | (Paused, Live)
                | (Constructed, Destroyed)
                | (Awake, Destroyed)
                | (Started, Destroyed)
                | (Live, Destroyed)
                | (Paused, Destroyed)
        )
    }
}

/// How often a module wants `update`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum UpdateMode {
    /// Every director tick.
    #[default]
    EveryTick,
    /// Every `n`th tick. `0` behaves like `1`.
    EveryNTicks(u32),
    /// Whenever this many real (unscaled) seconds have accumulated.
    Interval(f32),
}

/// Timing passed to [`Module::update`].
///
/// `delta` and `unscaled_delta` cover the whole span since the module last
/// updated, so a module on a slow cadence still sees all elapsed time.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Tick {
    /// Director frame counter (1 on the first advance).
    pub frame: u64,
    /// Scaled seconds since this module's previous update.
    pub delta: f32,
    /// Real seconds since this module's previous update.
    pub unscaled_delta: f32,
    /// Scaled seconds since the director started.
    pub elapsed: f32,
    /// Time scale in effect for this frame.
    pub time_scale: f32,
}

/// Accumulator deciding whether a module acts on a given tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cadence {
    mode: UpdateMode,
    ticks: u32,
    scaled: f32,
    unscaled: f32,
}

impl Cadence {
    pub fn new(mode: UpdateMode) -> Self {
        Self {
            mode,
            ticks: 0,
            scaled: 0.0,
            unscaled: 0.0,
        }
    }

    pub fn mode(&self) -> UpdateMode {
        self.mode
    }

    /// Feed one director tick. Returns the accumulated `(scaled, unscaled)`
    /// deltas when the module should update, and resets the accumulator.
    ///
    /// In interval mode a tick longer than the interval fires once and
    /// reports the whole span; no backlog is kept.
    pub fn advance(&mut self, scaled_dt: f32, unscaled_dt: f32) -> Option<(f32, f32)> {
        self.ticks += 1;
        self.scaled += scaled_dt;
        self.unscaled += unscaled_dt;

        let fire = match self.mode {
            UpdateMode::EveryTick => true,
            UpdateMode::EveryNTicks(n) => self.ticks >= n.max(1),
            UpdateMode::Interval(seconds) => seconds <= 0.0 || self.unscaled >= seconds,
        };
        if !fire {
            return None;
        }

        let out = (self.scaled, self.unscaled);
        self.reset();
        Some(out)
    }

    /// Forget accumulated time, e.g. after a pause.
    pub fn reset(&mut self) {
        self.ticks = 0;
        self.scaled = 0.0;
        self.unscaled = 0.0;
    }
}

/// A lifecycle-managed gameplay module.
///
/// All hooks except `update` default to no-ops. Hooks receive the
/// [`Director`] so a module can look up other modules, publish through
/// channels it holds, or adjust the time scale.
pub trait Module: Any {
    /// Diagnostic name.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Cadence, read once when the module is registered.
    fn update_mode(&self) -> UpdateMode {
        UpdateMode::EveryTick
    }

    /// Runs once before `start`; wire subscriptions here.
    fn awake(&mut self, _director: &Director) {}

    /// Runs once after `awake` and before the first `update`; load state here.
    fn start(&mut self, _director: &Director) {}

    /// Runs while live, at the configured cadence.
    fn update(&mut self, director: &Director, tick: &Tick);

    /// Runs once; release subscriptions taken in `awake`.
    fn destroy(&mut self, _director: &Director) {}
}
