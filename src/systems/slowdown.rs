//! Slowdown / time-freeze module.
//!
//! [`SlowdownManager`] owns the director's time scale while an effect runs:
//!
//! - `slow_down(scale, duration)` – run time at `scale` for `duration` real seconds
//! - `freeze(duration)` – stop time for `duration` real seconds
//! - `reset()` – restore the default scale immediately
//!
//! Effects count down in real (unscaled) time, otherwise a freeze would never
//! end. When the countdown elapses, `update` calls `reset`, which restores the
//! default scale and raises [`SlowdownEvent::Reset`] on the output channel.
//!
//! Gameplay code can also raise [`SlowdownRequest`]s on the request channel;
//! the manager subscribes in `awake`, queues them and applies them on its
//! next update.
//!
//! While the manager is not live (`set_live(false)`) new requests are ignored,
//! but a running effect still expires.

use std::cell::RefCell;
use std::rc::Rc;

use log::{debug, info};

use crate::events::channel::{EventChannel, Subscription};
use crate::events::slowdown::{SlowdownEvent, SlowdownRequest};
use crate::resources::kitconfig::KitConfig;
use crate::systems::director::Director;
use crate::systems::module::{Module, Tick};

#[derive(Debug, Clone, Copy, PartialEq)]
struct ActiveEffect {
    time_scale: f32,
    remaining: f32,
}

/// Time-scale manager module.
pub struct SlowdownManager {
    default_scale: f32,
    slow_scale: f32,
    default_duration: f32,
    live: bool,
    active: Option<ActiveEffect>,
    requests: EventChannel<SlowdownRequest>,
    output: EventChannel<SlowdownEvent>,
    pending: Rc<RefCell<Vec<SlowdownRequest>>>,
    subscription: Option<Subscription>,
}

impl SlowdownManager {
    pub fn new(
        requests: EventChannel<SlowdownRequest>,
        output: EventChannel<SlowdownEvent>,
    ) -> Self {
        Self::from_config(&KitConfig::default(), requests, output)
    }

    pub fn from_config(
        config: &KitConfig,
        requests: EventChannel<SlowdownRequest>,
        output: EventChannel<SlowdownEvent>,
    ) -> Self {
        Self {
            default_scale: config.default_time_scale.max(0.0),
            slow_scale: config.slow_time_scale.max(0.0),
            default_duration: config.freeze_duration.max(0.0),
            live: true,
            active: None,
            requests,
            output,
            pending: Rc::new(RefCell::new(Vec::new())),
            subscription: None,
        }
    }

    pub fn is_live(&self) -> bool {
        self.live
    }

    pub fn set_live(&mut self, live: bool) {
        self.live = live;
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Real seconds left on the running effect.
    pub fn remaining(&self) -> Option<f32> {
        self.active.map(|effect| effect.remaining)
    }

    pub fn default_scale(&self) -> f32 {
        self.default_scale
    }

    /// Scale used by `slow_down_default`.
    pub fn slow_scale(&self) -> f32 {
        self.slow_scale
    }

    pub fn output(&self) -> &EventChannel<SlowdownEvent> {
        &self.output
    }

    /// Run time at `time_scale` for `duration` real seconds.
    pub fn slow_down(&mut self, director: &Director, time_scale: f32, duration: f32) {
        if !self.live {
            debug!("SlowdownManager: not live, slow_down ignored");
            return;
        }
        let time_scale = time_scale.max(0.0);
        self.active = Some(ActiveEffect {
            time_scale,
            remaining: duration.max(0.0),
        });
        director.set_time_scale(time_scale);
        info!(
            "SlowdownManager: time scale {} for {}s",
            time_scale, duration
        );
        if time_scale == 0.0 {
            self.output.raise(&SlowdownEvent::Frozen { duration });
        } else {
            self.output
                .raise(&SlowdownEvent::Started { time_scale, duration });
        }
    }

    /// Slow down using the configured scale and duration.
    pub fn slow_down_default(&mut self, director: &Director) {
        self.slow_down(director, self.slow_scale, self.default_duration);
    }

    /// Stop time for `duration` real seconds.
    pub fn freeze(&mut self, director: &Director, duration: f32) {
        self.slow_down(director, 0.0, duration);
    }

    /// Restore the default scale and announce it.
    pub fn reset(&mut self, director: &Director) {
        self.active = None;
        director.set_time_scale(self.default_scale);
        debug!("SlowdownManager: reset to {}", self.default_scale);
        self.output.raise(&SlowdownEvent::Reset {
            time_scale: self.default_scale,
        });
    }

    fn apply(&mut self, director: &Director, request: SlowdownRequest) {
        match request {
            SlowdownRequest::SlowDown {
                time_scale,
                duration,
            } => self.slow_down(director, time_scale, duration),
            SlowdownRequest::Freeze { duration } => self.freeze(director, duration),
            SlowdownRequest::Reset => self.reset(director),
        }
    }
}

impl Module for SlowdownManager {
    fn name(&self) -> &str {
        "slowdown"
    }

    fn awake(&mut self, _director: &Director) {
        let pending = Rc::clone(&self.pending);
        self.subscription = Some(
            self.requests
                .add_listener(move |request: &SlowdownRequest| pending.borrow_mut().push(*request)),
        );
    }

    fn start(&mut self, director: &Director) {
        director.set_time_scale(self.default_scale);
    }

    fn update(&mut self, director: &Director, tick: &Tick) {
        if let Some(effect) = self.active.as_mut() {
            effect.remaining -= tick.unscaled_delta;
            if effect.remaining <= 0.0 {
                self.reset(director);
            }
        }

        let requests: Vec<SlowdownRequest> = self.pending.borrow_mut().drain(..).collect();
        for request in requests {
            self.apply(director, request);
        }
    }

    fn destroy(&mut self, director: &Director) {
        if let Some(subscription) = self.subscription.take() {
            self.requests.remove_listener(subscription);
        }
        if self.active.is_some() {
            self.reset(director);
        }
    }
}
