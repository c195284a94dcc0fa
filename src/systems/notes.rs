//! Note / quest tracking module.
//!
//! [`NoteTracker`] keeps the ordered list of collected note ids. Adding an id
//! that is already present is ignored, so the list never holds duplicates.
//!
//! Persistence is a JSON array of ids stored under [`NOTES_SAVE_KEY`]:
//! `start` loads it, `destroy` writes it, and `update` autosaves on its
//! interval when something changed.
//!
//! An optional catalog ([`ObjectBucket`] of [`NoteDefinition`]) resolves ids
//! to titles and text for display.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::error::KitResult;
use crate::events::channel::EventChannel;
use crate::events::notes::NoteEvent;
use crate::resources::objectbucket::{Named, ObjectBucket};
use crate::resources::savestore::{SaveStore, SharedSaveStore, load_json, save_json};
use crate::systems::director::Director;
use crate::systems::module::{Module, Tick, UpdateMode};

/// Save-store key for the note id list.
pub const NOTES_SAVE_KEY: &str = "notes";

const DEFAULT_AUTOSAVE_INTERVAL: f32 = 5.0;

/// Authored note content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteDefinition {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub text: String,
}

impl Named for NoteDefinition {
    fn name(&self) -> &str {
        &self.id
    }
}

/// Collected note ids, in collection order.
pub struct NoteTracker {
    notes: Vec<String>,
    dirty: bool,
    autosave_interval: f32,
    catalog: Option<ObjectBucket<NoteDefinition>>,
    output: EventChannel<NoteEvent>,
    store: Option<SharedSaveStore>,
}

impl NoteTracker {
    pub fn new(output: EventChannel<NoteEvent>) -> Self {
        Self {
            notes: Vec::new(),
            dirty: false,
            autosave_interval: DEFAULT_AUTOSAVE_INTERVAL,
            catalog: None,
            output,
            store: None,
        }
    }

    /// Builder: persist notes in `store`.
    pub fn with_store(mut self, store: SharedSaveStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Builder: resolve ids against `catalog`.
    pub fn with_catalog(mut self, catalog: ObjectBucket<NoteDefinition>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Builder: autosave interval in real seconds.
    pub fn with_autosave_interval(mut self, seconds: f32) -> Self {
        self.autosave_interval = seconds;
        self
    }

    pub fn output(&self) -> &EventChannel<NoteEvent> {
        &self.output
    }

    /// Collect `id`. Returns `false` if it was already collected.
    pub fn add_note(&mut self, id: impl Into<String>) -> bool {
        let id = id.into();
        if self.has_note(&id) {
            debug!("NoteTracker: '{}' already collected", id);
            return false;
        }
        if let Some(catalog) = &self.catalog {
            if !catalog.contains_key(&id) {
                warn!("NoteTracker: '{}' is not in the catalog", id);
            }
        }
        self.notes.push(id.clone());
        self.dirty = true;
        self.output.raise(&NoteEvent::Added(id));
        true
    }

    /// Drop `id`. Returns `false` if it was not collected.
    pub fn remove_note(&mut self, id: &str) -> bool {
        let Some(pos) = self.notes.iter().position(|n| n == id) else {
            return false;
        };
        let removed = self.notes.remove(pos);
        self.dirty = true;
        self.output.raise(&NoteEvent::Removed(removed));
        true
    }

    pub fn has_note(&self, id: &str) -> bool {
        self.notes.iter().any(|n| n == id)
    }

    /// Collected ids in collection order.
    pub fn notes(&self) -> &[String] {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// True if there are changes not yet saved.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Catalog entries for collected ids, skipping unknown ids.
    pub fn entries(&self) -> Vec<&NoteDefinition> {
        let Some(catalog) = &self.catalog else {
            return Vec::new();
        };
        self.notes
            .iter()
            .filter_map(|id| catalog.get(id))
            .collect()
    }

    /// Forget every note and announce it.
    pub fn reset(&mut self) {
        self.notes.clear();
        self.dirty = true;
        self.output.raise(&NoteEvent::Cleared);
    }

    /// Write ids into `store` as a JSON array.
    pub fn save_to(&mut self, store: &mut dyn SaveStore) -> KitResult<()> {
        save_json(store, NOTES_SAVE_KEY, &self.notes)?;
        self.dirty = false;
        Ok(())
    }

    /// Replace ids with the ones in `store`; duplicates collapse to the first
    /// occurrence. A missing key leaves the tracker untouched.
    pub fn load_from(&mut self, store: &dyn SaveStore) -> KitResult<()> {
        let Some(saved) = load_json::<Vec<String>>(store, NOTES_SAVE_KEY)? else {
            return Ok(());
        };
        self.notes.clear();
        for id in saved {
            if !self.has_note(&id) {
                self.notes.push(id);
            }
        }
        self.dirty = false;
        self.output.raise(&NoteEvent::Loaded(self.notes.len()));
        Ok(())
    }

    /// Save into the configured store and flush it.
    pub fn save(&mut self) -> KitResult<()> {
        let Some(store) = self.store.clone() else {
            return Ok(());
        };
        let mut store = store.borrow_mut();
        self.save_to(&mut *store)?;
        store.flush()
    }

    /// Load from the configured store.
    pub fn load(&mut self) -> KitResult<()> {
        let Some(store) = self.store.clone() else {
            return Ok(());
        };
        let store = store.borrow();
        self.load_from(&*store)
    }
}

impl Module for NoteTracker {
    fn name(&self) -> &str {
        "notes"
    }

    fn update_mode(&self) -> UpdateMode {
        UpdateMode::Interval(self.autosave_interval)
    }

    fn awake(&mut self, _director: &Director) {
        if let Some(catalog) = &self.catalog {
            catalog.on_enable();
        }
    }

    fn start(&mut self, _director: &Director) {
        match self.load() {
            Ok(()) => info!("NoteTracker: {} note(s) loaded", self.notes.len()),
            Err(e) => warn!("NoteTracker: could not load notes: {}", e),
        }
    }

    fn update(&mut self, _director: &Director, _tick: &Tick) {
        if !self.dirty {
            return;
        }
        if let Err(e) = self.save() {
            warn!("NoteTracker: autosave failed: {}", e);
        }
    }

    fn destroy(&mut self, _director: &Director) {
        if let Err(e) = self.save() {
            warn!("NoteTracker: could not save notes: {}", e);
        }
        if let Some(catalog) = &self.catalog {
            catalog.on_disable();
        }
    }
}
