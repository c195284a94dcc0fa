//! Name-keyed store of authored objects.
//!
//! An [`ObjectBucket`] keeps the authored, ordered list of items and a
//! derived `name → index` map. The map is built lazily on the first lookup
//! and rebuilt whenever it is found empty, so the owner only has to clear it
//! on enable/disable transitions ([`on_enable`](ObjectBucket::on_enable),
//! [`on_disable`](ObjectBucket::on_disable)) to pick up authoring edits.
//!
//! If two items share a name, the first one in authored order wins.

use std::cell::RefCell;

use log::{debug, warn};
use rustc_hash::FxHashMap;

/// Items that expose a lookup name.
pub trait Named {
    fn name(&self) -> &str;
}

/// Authored list of `T` with lazy by-name lookup.
#[derive(Debug)]
pub struct ObjectBucket<T: Named> {
    label: String,
    items: Vec<T>,
    index: RefCell<FxHashMap<String, usize>>,
}

impl<T: Named> ObjectBucket<T> {
    /// Create a bucket over `items`. The lookup map is not built yet.
    pub fn new(label: impl Into<String>, items: Vec<T>) -> Self {
        Self {
            label: label.into(),
            items,
            index: RefCell::new(FxHashMap::default()),
        }
    }

    /// Authoring-time append. Drops the derived map so the next lookup sees it.
    pub fn push(&mut self, item: T) {
        self.items.push(item);
        self.index.get_mut().clear();
    }

    /// Look up an item by name, rebuilding the map first if it is empty.
    pub fn get(&self, name: &str) -> Option<&T> {
        match self.lookup(name) {
            Some(idx) => self.items.get(idx),
            None => {
                warn!("ObjectBucket '{}': '{}' not found", self.label, name);
                None
            }
        }
    }

    /// Same lazy rebuild as [`get`](Self::get), without logging on a miss.
    pub fn contains_key(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    /// Visit every item in authored order.
    pub fn for_each(&self, mut action: impl FnMut(&T)) {
        for item in &self.items {
            action(item);
        }
    }

    /// Owning context became active: force a fresh rebuild.
    pub fn on_enable(&self) {
        self.index.borrow_mut().clear();
    }

    /// Owning context became inactive: drop the derived map.
    pub fn on_disable(&self) {
        self.index.borrow_mut().clear();
    }

    /// True when the derived map currently holds entries.
    pub fn is_indexed(&self) -> bool {
        !self.index.borrow().is_empty()
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn lookup(&self, name: &str) -> Option<usize> {
        self.ensure_index();
        self.index.borrow().get(name).copied()
    }

    fn ensure_index(&self) {
        let mut index = self.index.borrow_mut();
        if !index.is_empty() || self.items.is_empty() {
            return;
        }
        for (idx, item) in self.items.iter().enumerate() {
            index.entry(item.name().to_string()).or_insert(idx);
        }
        debug!(
            "ObjectBucket '{}': indexed {} item(s)",
            self.label,
            index.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Clip {
        name: String,
        length: f32,
    }

    impl Named for Clip {
        fn name(&self) -> &str {
            &self.name
        }
    }

    fn clip(name: &str, length: f32) -> Clip {
        Clip {
            name: name.to_string(),
            length,
        }
    }

    fn bucket() -> ObjectBucket<Clip> {
        ObjectBucket::new(
            "clips",
            vec![clip("jump", 0.4), clip("land", 0.2), clip("jump", 9.0)],
        )
    }

    #[test]
    fn map_is_built_lazily() {
        let b = bucket();
        assert!(!b.is_indexed());
        assert_eq!(b.get("land").map(|c| c.length), Some(0.2));
        assert!(b.is_indexed());
    }

    #[test]
    fn first_duplicate_wins() {
        let b = bucket();
        assert_eq!(b.get("jump").map(|c| c.length), Some(0.4));
    }

    #[test]
    fn miss_returns_none() {
        let b = bucket();
        assert!(b.get("roll").is_none());
        assert!(!b.contains_key("roll"));
        assert!(b.contains_key("jump"));
    }

    #[test]
    fn disable_enable_cycle_rebuilds_on_next_get() {
        let b = bucket();
        assert!(b.contains_key("land"));
        b.on_disable();
        assert!(!b.is_indexed());
        b.on_enable();
        assert_eq!(b.get("land"), Some(&clip("land", 0.2)));
        assert!(b.is_indexed());
    }

    #[test]
    fn push_is_visible_after_index_was_built() {
        let mut b = bucket();
        assert!(!b.contains_key("dash"));
        b.push(clip("dash", 0.1));
        assert!(b.contains_key("dash"));
    }

    #[test]
    fn for_each_visits_in_authored_order() {
        let b = bucket();
        let mut names = Vec::new();
        b.for_each(|c| names.push(c.name.clone()));
        assert_eq!(names, vec!["jump", "land", "jump"]);
    }

    #[test]
    fn empty_bucket_never_indexes() {
        let b: ObjectBucket<Clip> = ObjectBucket::new("none", Vec::new());
        assert!(b.get("x").is_none());
        assert!(!b.is_indexed());
        assert!(b.is_empty());
    }
}
