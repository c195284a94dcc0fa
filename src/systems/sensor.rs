//! Sensor marking module.
//!
//! [`SensorManager`] is a [`MarkManager`]: entities carrying a
//! [`Marker`](crate::components::marker::Marker) bound to it are tracked by
//! [`MarkId`]. Each sensor is a circle (origin + range); every update the
//! manager compares tracked mark positions against each sensor and raises
//! [`SensorEvent::Detected`] when a mark enters range and
//! [`SensorEvent::Lost`] when it leaves or is unregistered.
//! [`SensorManager::reset`] drops every detection and announces
//! [`SensorEvent::Reset`].
//!
//! Positions are pushed in by the host (see
//! [`sync_mark_positions`](crate::systems::host::sync_mark_positions)); a
//! mark without a position is tracked but never detected.

use log::{debug, trace};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::components::marker::{MarkId, MarkManager};
use crate::events::channel::EventChannel;
use crate::events::sensor::SensorEvent;
use crate::resources::objectbucket::{Named, ObjectBucket};
use crate::systems::director::Director;
use crate::systems::module::{Module, Tick, UpdateMode};

/// Authored sensor volume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sensor {
    pub name: String,
    pub origin: (f32, f32),
    pub range: f32,
}

impl Named for Sensor {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Sensor {
    pub fn new(name: impl Into<String>, origin: (f32, f32), range: f32) -> Self {
        Self {
            name: name.into(),
            origin,
            range,
        }
    }

    fn distance_to(&self, pos: (f32, f32)) -> f32 {
        let dx = pos.0 - self.origin.0;
        let dy = pos.1 - self.origin.1;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Tracks marked entities and reports them entering/leaving sensors.
pub struct SensorManager {
    sensors: ObjectBucket<Sensor>,
    marks: FxHashMap<MarkId, Option<(f32, f32)>>,
    inside: FxHashSet<(usize, MarkId)>,
    mode: UpdateMode,
    output: EventChannel<SensorEvent>,
}

impl SensorManager {
    pub fn new(sensors: ObjectBucket<Sensor>, output: EventChannel<SensorEvent>) -> Self {
        Self {
            sensors,
            marks: FxHashMap::default(),
            inside: FxHashSet::default(),
            mode: UpdateMode::EveryTick,
            output,
        }
    }

    /// Builder: scan at a different cadence.
    pub fn with_update_mode(mut self, mode: UpdateMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn output(&self) -> &EventChannel<SensorEvent> {
        &self.output
    }

    pub fn sensor(&self, name: &str) -> Option<&Sensor> {
        self.sensors.get(name)
    }

    pub fn is_tracking(&self, mark: MarkId) -> bool {
        self.marks.contains_key(&mark)
    }

    pub fn tracked(&self) -> usize {
        self.marks.len()
    }

    /// Update a tracked mark's position. Untracked marks are ignored.
    pub fn set_position(&mut self, mark: MarkId, pos: (f32, f32)) {
        if let Some(slot) = self.marks.get_mut(&mark) {
            *slot = Some(pos);
        } else {
            trace!("SensorManager: position for untracked {:?}", mark);
        }
    }

    /// Whether `mark` is currently inside the named sensor.
    pub fn is_detected(&self, sensor: &str, mark: MarkId) -> bool {
        self.sensor_index(sensor)
            .is_some_and(|idx| self.inside.contains(&(idx, mark)))
    }

    /// Marks currently inside the named sensor, sorted by id.
    pub fn detected_in(&self, sensor: &str) -> Vec<MarkId> {
        let Some(idx) = self.sensor_index(sensor) else {
            return Vec::new();
        };
        let mut marks: Vec<MarkId> = self
            .inside
            .iter()
            .filter(|(i, _)| *i == idx)
            .map(|(_, mark)| *mark)
            .collect();
        marks.sort();
        marks
    }

    /// Forget every detection. Each cleared detection raises `Lost` (sensor
    /// order, then mark), followed by a single [`SensorEvent::Reset`]. Marks
    /// stay tracked, so a mark still in range is detected again on the next
    /// scan.
    pub fn reset(&mut self) {
        let mut cleared: Vec<(usize, MarkId)> = self.inside.drain().collect();
        cleared.sort_unstable();
        for (idx, mark) in cleared {
            if let Some(sensor) = self.sensors.items().get(idx) {
                self.output.raise(&SensorEvent::Lost {
                    sensor: sensor.name.clone(),
                    mark,
                });
            }
        }
        debug!("SensorManager: reset");
        self.output.raise(&SensorEvent::Reset);
    }

    fn sensor_index(&self, name: &str) -> Option<usize> {
        self.sensors.items().iter().position(|s| s.name == name)
    }

    fn scan(&mut self) {
        let mut marks: Vec<(MarkId, (f32, f32))> = self
            .marks
            .iter()
            .filter_map(|(mark, pos)| pos.map(|pos| (*mark, pos)))
            .collect();
        marks.sort_by_key(|(mark, _)| *mark);

        let mut events = Vec::new();
        for (idx, sensor) in self.sensors.items().iter().enumerate() {
            for (mark, pos) in &marks {
                let distance = sensor.distance_to(*pos);
                let key = (idx, *mark);
                let was_inside = self.inside.contains(&key);
                if distance <= sensor.range && !was_inside {
                    self.inside.insert(key);
                    events.push(SensorEvent::Detected {
                        sensor: sensor.name.clone(),
                        mark: *mark,
                        distance,
                    });
                } else if distance > sensor.range && was_inside {
                    self.inside.remove(&key);
                    events.push(SensorEvent::Lost {
                        sensor: sensor.name.clone(),
                        mark: *mark,
                    });
                }
            }
        }
        for event in &events {
            self.output.raise(event);
        }
    }
}

impl MarkManager for SensorManager {
    fn register_mark(&mut self, mark: MarkId) {
        self.marks.entry(mark).or_insert(None);
        debug!("SensorManager: tracking {:?}", mark);
    }

    fn unregister_mark(&mut self, mark: MarkId) {
        if self.marks.remove(&mark).is_none() {
            return;
        }
        let mut lost: Vec<usize> = self
            .inside
            .iter()
            .filter(|(_, m)| *m == mark)
            .map(|(idx, _)| *idx)
            .collect();
        lost.sort_unstable();
        self.inside.retain(|(_, m)| *m != mark);
        for idx in lost {
            if let Some(sensor) = self.sensors.items().get(idx) {
                self.output.raise(&SensorEvent::Lost {
                    sensor: sensor.name.clone(),
                    mark,
                });
            }
        }
        debug!("SensorManager: released {:?}", mark);
    }
}

impl Module for SensorManager {
    fn name(&self) -> &str {
        "sensor"
    }

    fn update_mode(&self) -> UpdateMode {
        self.mode
    }

    fn awake(&mut self, _director: &Director) {
        self.sensors.on_enable();
    }

    fn update(&mut self, _director: &Director, _tick: &Tick) {
        self.scan();
    }

    fn destroy(&mut self, _director: &Director) {
        self.sensors.on_disable();
        self.marks.clear();
        self.inside.clear();
    }
}
