//! Bevy host adapter.
//!
//! The [`Director`] lives in the bevy [`World`] as a non-send resource
//! (modules share `Rc` channels, so it is `!Send`). Each host frame:
//!
//! 1. [`update_world_time`] writes the raw frame delta into [`WorldTime`]
//! 2. the schedule from [`build_schedule`] runs:
//!    - [`register_markers`] retries pending [`Marker`] registrations
//!    - [`sync_mark_positions`] pushes changed [`MarkPosition`]s into the
//!      [`SensorManager`]
//!    - [`drive_director`] advances every module and copies the director's
//!      time scale back into [`WorldTime`]
//! 3. change trackers are cleared
//!
//! [`run_frame`] bundles the three steps. Entities carrying a marker should be
//! removed through [`release_marker`] so managers drop them first.

use bevy_ecs::prelude::*;
use log::{debug, warn};
use rustc_hash::FxHashSet;

use crate::components::marker::Marker;
use crate::components::markposition::MarkPosition;
use crate::resources::worldtime::WorldTime;
use crate::systems::director::Director;
use crate::systems::sensor::SensorManager;

/// Update elapsed and delta seconds on the `WorldTime` resource.
///
/// `dt` is the unscaled frame delta in seconds; it is kept as `real_delta`
/// for the director and scaled by the current `time_scale` into `delta`.
pub fn update_world_time(world: &mut World, dt: f32) {
    let mut wt = world.resource_mut::<WorldTime>();
    let scaled_dt = dt * wt.time_scale;
    wt.real_delta = dt;
    wt.elapsed += scaled_dt;
    wt.delta = scaled_dt;
    wt.frame_count += 1;
}

/// Advance the director by the frame's real delta.
pub fn drive_director(director: NonSend<Director>, mut world_time: ResMut<WorldTime>) {
    director.advance(world_time.real_delta);
    let scale = director.time_scale();
    if world_time.time_scale != scale {
        debug!("host: time scale {} -> {}", world_time.time_scale, scale);
        world_time.time_scale = scale;
    }
}

/// Register markers whose managers were not discoverable yet.
///
/// A marker is flagged as changed only when a registration succeeds.
pub fn register_markers(mut query: Query<&mut Marker>, director: NonSend<Director>) {
    for mut marker in query.iter_mut() {
        if !marker.has_pending() {
            continue;
        }
        let mut seen = FxHashSet::default();
        let newly = marker
            .bypass_change_detection()
            .register_self(&director, &mut seen);
        if !newly.is_empty() {
            marker.set_changed();
        }
    }
}

/// Mirror changed positions into the sensor manager.
pub fn sync_mark_positions(
    query: Query<(&Marker, &MarkPosition), Or<(Changed<MarkPosition>, Changed<Marker>)>>,
    director: NonSend<Director>,
) {
    let Some(sensors) = director.get_system::<SensorManager>() else {
        return;
    };
    let Ok(mut sensors) = sensors.try_borrow_mut() else {
        warn!("host: sensor manager busy, positions not synced");
        return;
    };
    for (marker, position) in query.iter() {
        if marker.is_registered_with::<SensorManager>() {
            sensors.set_position(marker.id(), position.as_tuple());
        }
    }
}

/// Unregister `entity`'s marker from its managers, then despawn it.
///
/// Returns `false` if the entity does not exist.
pub fn release_marker(world: &mut World, entity: Entity) -> bool {
    let marker = match world.get_entity_mut(entity) {
        Ok(mut entity_mut) => entity_mut.take::<Marker>(),
        Err(_) => return false,
    };
    if let Some(mut marker) = marker {
        match world.get_non_send_resource::<Director>() {
            Some(director) => marker.unregister_self(director),
            None => warn!("host: no director, {:?} released unregistered", marker.id()),
        }
    }
    world.despawn(entity)
}

/// The per-frame host schedule.
pub fn build_schedule() -> Schedule {
    let mut schedule = Schedule::default();
    schedule.add_systems((register_markers, sync_mark_positions, drive_director).chain());
    schedule
}

/// Run one host frame of `dt` real seconds.
pub fn run_frame(world: &mut World, schedule: &mut Schedule, dt: f32) {
    update_world_time(world, dt);
    schedule.run(world);
    world.clear_trackers();
}
