//! Integration tests for the module lifecycle and director.
//!
//! # Usage
//!
//! ```sh
//! cargo test --test lifecycle_integration
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use playkit::error::KitError;
use playkit::systems::director::Director;
use playkit::systems::module::{LifecycleState, Module, Tick, UpdateMode};

type Journal = Rc<RefCell<Vec<String>>>;

struct Recorder {
    journal: Journal,
    mode: UpdateMode,
}

impl Recorder {
    fn new(journal: &Journal, mode: UpdateMode) -> Self {
        Self {
            journal: Rc::clone(journal),
            mode,
        }
    }
}

impl Module for Recorder {
    fn name(&self) -> &str {
        "recorder"
    }
    fn update_mode(&self) -> UpdateMode {
        self.mode
    }
    fn awake(&mut self, director: &Director) {
        let visible = director.has_system::<Recorder>();
        self.journal.borrow_mut().push(format!("awake visible={}", visible));
    }
    fn start(&mut self, _director: &Director) {
        self.journal.borrow_mut().push("start".into());
    }
    fn update(&mut self, _director: &Director, tick: &Tick) {
        self.journal.borrow_mut().push(format!("update{}", tick.frame));
    }
    fn destroy(&mut self, _director: &Director) {
        self.journal.borrow_mut().push("destroy".into());
    }
}

/// Looks up `Recorder` from its own hooks.
struct Lookup {
    found_in_awake: Rc<RefCell<Option<bool>>>,
}

impl Module for Lookup {
    fn awake(&mut self, director: &Director) {
        *self.found_in_awake.borrow_mut() = Some(director.get_system::<Recorder>().is_some());
    }
    fn update(&mut self, _director: &Director, _tick: &Tick) {}
}

fn updates(journal: &Journal) -> Vec<String> {
    journal
        .borrow()
        .iter()
        .filter(|entry| entry.starts_with("update"))
        .cloned()
        .collect()
}

#[test]
fn update_never_runs_before_start_or_after_destroy() {
    let journal: Journal = Rc::new(RefCell::new(Vec::new()));
    let director = Director::new();
    let handle = director
        .register(Recorder::new(&journal, UpdateMode::EveryTick))
        .unwrap();

    for _ in 0..3 {
        director.advance(1.0 / 60.0);
    }
    assert!(director.destroy::<Recorder>());
    for _ in 0..3 {
        director.advance(1.0 / 60.0);
    }

    let entries = journal.borrow().clone();
    let start = entries.iter().position(|e| e == "start").unwrap();
    let destroy = entries.iter().position(|e| e == "destroy").unwrap();
    for (i, entry) in entries.iter().enumerate() {
        if entry.starts_with("update") {
            assert!(i > start && i < destroy, "{} out of order", entry);
        }
    }
    assert_eq!(updates(&journal), vec!["update1", "update2", "update3"]);
    assert_eq!(handle.state(), LifecycleState::Destroyed);
}

#[test]
fn get_system_is_absent_before_awake_and_present_after() {
    let journal: Journal = Rc::new(RefCell::new(Vec::new()));
    let director = Director::new();
    let _handle = director
        .register(Recorder::new(&journal, UpdateMode::EveryTick))
        .unwrap();

    assert!(director.get_system::<Recorder>().is_none());
    assert_eq!(director.state_of::<Recorder>(), Some(LifecycleState::Constructed));

    director.awake_all();
    let found = director.get_system::<Recorder>().unwrap();
    assert_eq!(found.borrow().name(), "recorder");
    assert_eq!(journal.borrow()[0], "awake visible=true");
}

#[test]
fn modules_awake_before_any_start() {
    let journal: Journal = Rc::new(RefCell::new(Vec::new()));
    let found = Rc::new(RefCell::new(None));
    let director = Director::new();
    let _lookup = director
        .register(Lookup {
            found_in_awake: Rc::clone(&found),
        })
        .unwrap();
    let _recorder = director
        .register(Recorder::new(&journal, UpdateMode::EveryTick))
        .unwrap();

    director.advance(0.1);
    // Lookup awoke first, before Recorder was discoverable.
    assert_eq!(*found.borrow(), Some(false));
    assert_eq!(director.state_of::<Recorder>(), Some(LifecycleState::Live));
}

#[test]
fn pause_and_resume_gate_updates() {
    let journal: Journal = Rc::new(RefCell::new(Vec::new()));
    let director = Director::new();
    let handle = director
        .register(Recorder::new(&journal, UpdateMode::EveryTick))
        .unwrap();

    director.advance(0.1);
    assert!(director.pause::<Recorder>());
    assert_eq!(handle.state(), LifecycleState::Paused);
    director.advance(0.1);
    director.advance(0.1);
    assert!(director.resume::<Recorder>());
    director.advance(0.1);

    assert_eq!(updates(&journal), vec!["update1", "update4"]);
}

#[test]
fn interval_mode_uses_real_time() {
    let journal: Journal = Rc::new(RefCell::new(Vec::new()));
    let director = Director::new();
    let _handle = director
        .register(Recorder::new(&journal, UpdateMode::Interval(0.5)))
        .unwrap();

    director.set_time_scale(0.0);
    for _ in 0..8 {
        director.advance(0.25);
    }
    assert_eq!(updates(&journal), vec!["update2", "update4", "update6", "update8"]);
    assert_eq!(director.elapsed(), 0.0);
}

#[test]
fn interval_tick_longer_than_interval_reports_real_span() {
    struct Spans(Rc<RefCell<Vec<f32>>>);
    impl Module for Spans {
        fn update_mode(&self) -> UpdateMode {
            UpdateMode::Interval(0.5)
        }
        fn update(&mut self, _director: &Director, tick: &Tick) {
            self.0.borrow_mut().push(tick.unscaled_delta);
        }
    }

    let spans = Rc::new(RefCell::new(Vec::new()));
    let director = Director::new();
    let _handle = director.register(Spans(Rc::clone(&spans))).unwrap();

    director.advance(2.0);
    for _ in 0..5 {
        director.advance(0.0);
    }
    assert_eq!(*spans.borrow(), vec![2.0]);

    director.advance(0.25);
    director.advance(0.25);
    assert_eq!(*spans.borrow(), vec![2.0, 0.5]);
}

#[test]
fn duplicate_registration_is_an_error() {
    let journal: Journal = Rc::new(RefCell::new(Vec::new()));
    let director = Director::new();
    let _first = director
        .register(Recorder::new(&journal, UpdateMode::EveryTick))
        .unwrap();
    let second = director.register(Recorder::new(&journal, UpdateMode::EveryTick));
    assert!(matches!(second, Err(KitError::DuplicateRegistration(_))));
}

#[test]
fn shutdown_destroys_newest_first() {
    struct Named(&'static str, Journal);
    impl Module for Named {
        fn update(&mut self, _director: &Director, _tick: &Tick) {}
        fn destroy(&mut self, _director: &Director) {
            self.1.borrow_mut().push(self.0.to_string());
        }
    }
    struct Second(Named);
    impl Module for Second {
        fn update(&mut self, _director: &Director, _tick: &Tick) {}
        fn destroy(&mut self, director: &Director) {
            self.0.destroy(director);
        }
    }

    let journal: Journal = Rc::new(RefCell::new(Vec::new()));
    let director = Director::new();
    let _a = director.register(Named("first", Rc::clone(&journal))).unwrap();
    let _b = director
        .register(Second(Named("second", Rc::clone(&journal))))
        .unwrap();
    director.advance(0.1);
    director.shutdown();

    assert_eq!(*journal.borrow(), vec!["second", "first"]);
    assert_eq!(director.module_count(), 0);
}

#[test]
fn independent_directors_do_not_share_registries() {
    let journal: Journal = Rc::new(RefCell::new(Vec::new()));
    let a = Director::new();
    let b = Director::new();
    let _handle = a
        .register(Recorder::new(&journal, UpdateMode::EveryTick))
        .unwrap();
    a.awake_all();
    assert!(a.has_system::<Recorder>());
    assert!(!b.has_system::<Recorder>());
}
