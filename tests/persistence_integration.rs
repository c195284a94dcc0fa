//! Integration tests for notes and volume persistence through the director
//! lifecycle and a file-backed save store.
//!
//! # Usage
//!
//! ```sh
//! cargo test --test persistence_integration
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use tempfile::TempDir;

use playkit::events::channel::EventChannel;
use playkit::events::notes::NoteEvent;
use playkit::events::volume::{VolumeBus, VolumeChanged};
use playkit::resources::kitconfig::KitConfig;
use playkit::resources::savestore::{
    FileSaveStore, MemorySaveStore, SaveStore, SharedSaveStore, shared,
};
use playkit::systems::director::Director;
use playkit::systems::notes::{NOTES_SAVE_KEY, NoteTracker};
use playkit::systems::volume::VolumeControl;

const DT: f32 = 1.0 / 60.0;

fn notes_session(store: &SharedSaveStore, collect: &[&str]) -> (Vec<String>, Vec<NoteEvent>) {
    let events = Rc::new(RefCell::new(Vec::new()));
    let output = EventChannel::new("notes");
    let sink = Rc::clone(&events);
    let _sub = output.add_listener(move |e: &NoteEvent| sink.borrow_mut().push(e.clone()));

    let director = Director::new();
    let notes = director
        .register(NoteTracker::new(output).with_store(Rc::clone(store)))
        .unwrap();
    director.advance(DT);
    for id in collect {
        notes.borrow_mut().add_note(*id);
    }
    director.advance(DT);
    let ids = notes.borrow().notes().to_vec();
    director.shutdown();
    let events = events.borrow().clone();
    (ids, events)
}

#[test]
fn notes_round_trip_through_a_save_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("saves").join("slot1.json");

    let store = shared(FileSaveStore::open(&path).unwrap());
    let (first, _) = notes_session(&store, &["cave", "bridge", "cave", "tower"]);
    assert_eq!(first, vec!["cave", "bridge", "tower"]);
    assert!(path.exists());

    // Fresh process: reopen the file.
    let store = shared(FileSaveStore::open(&path).unwrap());
    let (second, events) = notes_session(&store, &["bridge", "gate"]);
    assert_eq!(second, vec!["cave", "bridge", "tower", "gate"]);
    assert_eq!(events[0], NoteEvent::Loaded(3));
    assert_eq!(events[1], NoteEvent::Added("gate".into()));
}

#[test]
fn notes_autosave_on_interval() {
    let memory = Rc::new(RefCell::new(MemorySaveStore::new()));
    let store: SharedSaveStore = memory.clone();
    let director = Director::new();
    let notes = director
        .register(
            NoteTracker::new(EventChannel::new("notes"))
                .with_store(store)
                .with_autosave_interval(0.5),
        )
        .unwrap();

    director.advance(0.25);
    notes.borrow_mut().add_note("map");
    assert!(!memory.borrow().has_key(NOTES_SAVE_KEY));

    director.advance(0.25);
    assert_eq!(
        memory.borrow().get_string(NOTES_SAVE_KEY).as_deref(),
        Some(r#"["map"]"#)
    );
    assert!(!notes.borrow().is_dirty());
}

#[test]
fn volume_levels_survive_restart() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("volume.json");
    let config = KitConfig::new();

    {
        let store = shared(FileSaveStore::open(&path).unwrap());
        let director = Director::new();
        let volume = director
            .register(VolumeControl::new(&config, EventChannel::new("volume")).with_store(store))
            .unwrap();
        director.advance(DT);
        volume.borrow_mut().set_level(VolumeBus::Music, 0.25);
        volume.borrow_mut().mute(VolumeBus::Sfx);
        director.shutdown();
    }

    let store = shared(FileSaveStore::open(&path).unwrap());
    let output = EventChannel::new("volume");
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let _sub = output.add_listener(move |e: &VolumeChanged| sink.borrow_mut().push(*e));
    let director = Director::new();
    let volume = director
        .register(VolumeControl::new(&config, output).with_store(store))
        .unwrap();
    director.advance(DT);

    assert_eq!(volume.borrow().level(VolumeBus::Music), 0.25);
    assert!(volume.borrow().is_muted(VolumeBus::Sfx));
    // `start` announces every bus once.
    assert_eq!(seen.borrow().len(), 3);
    assert_eq!(seen.borrow()[2].effective, 0.0);
}

#[test]
fn volume_fade_reaches_target_in_real_time() {
    let director = Director::new();
    let volume = director
        .register(VolumeControl::new(&KitConfig::new(), EventChannel::new("volume")))
        .unwrap();
    director.advance(DT);
    volume.borrow_mut().set_level(VolumeBus::Music, 0.0);
    volume.borrow_mut().fade_to(VolumeBus::Music, 1.0, 1.0);

    director.set_time_scale(0.0);
    for _ in 0..5 {
        director.advance(0.1);
    }
    let halfway = volume.borrow().level(VolumeBus::Music);
    assert!((halfway - 0.5).abs() < 1e-4, "halfway was {}", halfway);

    for _ in 0..10 {
        director.advance(0.1);
    }
    assert_eq!(volume.borrow().level(VolumeBus::Music), 1.0);
    assert!(!volume.borrow().is_fading(VolumeBus::Music));
}

#[test]
fn memory_store_delete_and_flush() {
    let mut store = MemorySaveStore::new();
    store.set_string("a", "1".to_string());
    assert!(store.delete_key("a"));
    assert!(!store.delete_key("a"));
    store.flush().unwrap();
    assert!(store.is_empty());
}
