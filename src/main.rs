//! Playkit demo driver.
//!
//! Builds a director with every gameplay module, hosts it on a bevy_ecs
//! world and runs a fixed number of ticks:
//!
//! 1. Load `KitConfig` (INI) and open the JSON save file
//! 2. Register the slowdown, volume, notes and sensor modules
//! 3. Spawn a marked entity that walks through the sensors
//! 4. Run the host schedule; the `[demo]` config section schedules a slowdown
//!    and collects a note along the way
//! 5. Shut the director down (modules save their state) and log a summary
//!
//! # Running
//!
//! ```sh
//! cargo run --release -- --config config.ini --ticks 240
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use bevy_ecs::prelude::*;
use clap::Parser;
use log::{error, info, warn};

use playkit::components::marker::{MarkId, Marker};
use playkit::components::markposition::MarkPosition;
use playkit::error::KitResult;
use playkit::events::channel::EventChannel;
use playkit::events::converter::ConverterChannel;
use playkit::events::notes::NoteEvent;
use playkit::events::sensor::SensorEvent;
use playkit::events::slowdown::{SlowdownEvent, SlowdownRequest};
use playkit::events::volume::VolumeChanged;
use playkit::resources::kitconfig::KitConfig;
use playkit::resources::objectbucket::ObjectBucket;
use playkit::resources::savestore::{FileSaveStore, shared};
use playkit::resources::typedbucket::TypedBucket;
use playkit::resources::worldtime::WorldTime;
use playkit::systems::director::Director;
use playkit::systems::host::{build_schedule, release_marker, run_frame};
use playkit::systems::notes::NoteTracker;
use playkit::systems::sensor::{Sensor, SensorManager};
use playkit::systems::slowdown::SlowdownManager;
use playkit::systems::volume::VolumeControl;

/// Playkit module lifecycle demo
#[derive(Parser)]
#[command(version, about = "Runs the playkit gameplay modules on a headless bevy world.")]
struct Cli {
    /// INI configuration file.
    #[arg(long, value_name = "PATH", default_value = "./config.ini")]
    config: PathBuf,

    /// Number of ticks to run (overrides the config file).
    #[arg(long)]
    ticks: Option<u32>,

    /// JSON save file (overrides the config file).
    #[arg(long, value_name = "PATH")]
    save: Option<PathBuf>,

    /// JSON file with a list of sensors.
    #[arg(long, value_name = "PATH")]
    sensors: Option<PathBuf>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        error!("playkit: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> KitResult<()> {
    let mut config = KitConfig::with_path(&cli.config);
    if cli.config.exists() {
        config.load_from_file()?;
    } else {
        warn!("Config file {:?} not found, using defaults", cli.config);
    }
    if let Some(ticks) = cli.ticks {
        config.ticks = ticks;
    }
    if let Some(save) = cli.save {
        config.save_path = save;
    }
    let demo = load_demo_bucket(&cli.config);
    let sensors = load_sensors(cli.sensors.as_deref())?;

    let store = shared(FileSaveStore::open(&config.save_path)?);

    // Channels
    let slowdown_requests: EventChannel<SlowdownRequest> = EventChannel::new("slowdown.requests");
    let slowdown_events: EventChannel<SlowdownEvent> = EventChannel::new("slowdown.events");
    let volume_events: EventChannel<VolumeChanged> = EventChannel::new("volume.changed");
    let note_events: EventChannel<NoteEvent> = EventChannel::new("notes");
    let sensor_events: EventChannel<SensorEvent> = EventChannel::new("sensor");

    let _slowdown_log = slowdown_events.add_listener(|e: &SlowdownEvent| info!("slowdown: {:?}", e));
    let _volume_log = volume_events.add_listener(|e: &VolumeChanged| {
        info!("volume: {:?} -> {:.2} (effective {:.2})", e.bus, e.level, e.effective)
    });
    let _note_log = note_events.add_listener(|e: &NoteEvent| info!("notes: {:?}", e));

    // Entering a sensor freezes time briefly.
    let detections = ConverterChannel::with_output(&sensor_events, slowdown_requests.clone(), {
        let duration = config.freeze_duration;
        move |e: &SensorEvent| match e {
            SensorEvent::Detected { sensor, mark, .. } => {
                info!("sensor '{}' detected {:?}", sensor, mark);
                Some(SlowdownRequest::Freeze { duration })
            }
            SensorEvent::Lost { sensor, mark } => {
                info!("sensor '{}' lost {:?}", sensor, mark);
                None
            }
            SensorEvent::Reset => {
                info!("sensors reset");
                None
            }
        }
    });

    // Modules
    let director = Director::new();
    director.register(SlowdownManager::from_config(
        &config,
        slowdown_requests.clone(),
        slowdown_events,
    ))?;
    director.register(VolumeControl::new(&config, volume_events).with_store(store.clone()))?;
    let notes = director.register(NoteTracker::new(note_events).with_store(store.clone()))?;
    director.register(SensorManager::new(
        ObjectBucket::new("sensors", sensors),
        sensor_events,
    ))?;

    // World
    let mut world = World::new();
    world.insert_resource(WorldTime::default().with_time_scale(config.default_time_scale));
    world.insert_resource(config.clone());
    world.insert_non_send_resource(director);
    let walker = world
        .spawn((
            Marker::new(MarkId(1)).bind::<SensorManager>(0),
            MarkPosition::new(-20.0, 0.0),
        ))
        .id();

    let dt = config.tick_delta();
    let speed = demo.try_get::<f32>("speed").unwrap_or(10.0);
    let note_at = demo.try_get::<u32>("note_at").unwrap_or(config.ticks / 2);
    let note_id = demo
        .try_get::<String>("note")
        .unwrap_or_else(|_| "first_steps".to_string());
    let slow_at = demo.try_get::<u32>("slow_at").ok();

    let mut schedule = build_schedule();
    for tick in 0..config.ticks {
        if tick == note_at {
            notes.borrow_mut().add_note(note_id.as_str());
        }
        if Some(tick) == slow_at {
            slowdown_requests.raise(&SlowdownRequest::SlowDown {
                time_scale: config.slow_time_scale,
                duration: config.freeze_duration,
            });
        }
        if let Some(mut pos) = world.get_mut::<MarkPosition>(walker) {
            pos.x += speed * dt;
        }
        run_frame(&mut world, &mut schedule, dt);
    }

    release_marker(&mut world, walker);
    drop(detections);

    let wt = *world.resource::<WorldTime>();
    let director = world.non_send_resource::<Director>();
    for (name, state) in director.modules() {
        info!("module {}: {:?}", name, state);
    }
    info!(
        "ran {} frame(s): real {:.2}s, scaled {:.2}s, {} note(s)",
        wt.frame_count,
        wt.frame_count as f32 * dt,
        wt.elapsed,
        notes.borrow().len()
    );
    director.shutdown();
    Ok(())
}

/// Optional `[demo]` section of the config file.
fn load_demo_bucket(config_path: &Path) -> TypedBucket {
    let Ok(text) = fs::read_to_string(config_path) else {
        return TypedBucket::new("demo");
    };
    TypedBucket::from_ini_str("demo", &text, "demo").unwrap_or_else(|_| TypedBucket::new("demo"))
}

fn load_sensors(path: Option<&Path>) -> KitResult<Vec<Sensor>> {
    match path {
        Some(path) => {
            let text = fs::read_to_string(path)?;
            Ok(serde_json::from_str(&text)?)
        }
        None => Ok(vec![
            Sensor::new("gate", (0.0, 0.0), 2.0),
            Sensor::new("tower", (30.0, 0.0), 5.0),
        ]),
    }
}
