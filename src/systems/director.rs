//! Module registry and lifecycle driver.
//!
//! The [`Director`] is the explicit context object that owns every
//! [`Module`] and advances its state machine. It replaces a process-wide
//! singleton registry: each director is independent, so tests can run
//! several side by side.
//!
//! # Registration contract
//!
//! - [`register`](Director::register) takes ownership and puts the module in
//!   the `Constructed` state. A second live module of the same concrete type
//!   is rejected with [`KitError::DuplicateRegistration`].
//! - The type becomes discoverable through
//!   [`get_system`](Director::get_system) when `awake` runs, and stops being
//!   discoverable when `destroy` runs.
//!
//! # Tick flow
//!
//! [`advance`](Director::advance) is the only entry point a host needs:
//!
//! 1. apply the time scale to the real delta
//! 2. run `awake` on every `Constructed` module, then `start` on every
//!    `Awake` module (so `awake` always precedes `start`, and `start`
//!    precedes the first `update`)
//! 3. for each module in registration order: `Started → Live`, then
//!    `update` if live and its cadence fires
//! 4. finalize any destroy requested while a module was mid-update
//!
//! Hooks receive `&Director`, so modules may look up other modules,
//! register new ones or change the time scale while the director runs.

use std::any::{Any, TypeId};
use std::cell::{Cell, Ref, RefCell, RefMut};
use std::rc::Rc;

use log::{debug, error, info, warn};
use rustc_hash::FxHashMap;

use crate::error::{KitError, KitResult};
use crate::systems::module::{Cadence, LifecycleState, Module, Tick};

/// Director-owned bookkeeping for one module.
pub(crate) struct ModuleSlot {
    type_id: TypeId,
    type_name: &'static str,
    state: Cell<LifecycleState>,
    cadence: RefCell<Cadence>,
    destroy_requested: Cell<bool>,
    module: Rc<RefCell<dyn Module>>,
    any: Rc<dyn Any>,
}

impl ModuleSlot {
    fn set_state(&self, next: LifecycleState) {
        let current = self.state.get();
        debug_assert!(
            current.can_transition_to(next),
            "illegal lifecycle transition {:?} -> {:?} for {}",
            current,
            next,
            self.type_name
        );
        self.state.set(next);
    }
}

/// Typed handle returned by [`Director::register`].
///
/// Keeps direct access to the module value and its lifecycle state even
/// before the type is discoverable through [`Director::get_system`].
pub struct ModuleHandle<M: Module> {
    module: Rc<RefCell<M>>,
    slot: Rc<ModuleSlot>,
}

impl<M: Module> Clone for ModuleHandle<M> {
    fn clone(&self) -> Self {
        Self {
            module: Rc::clone(&self.module),
            slot: Rc::clone(&self.slot),
        }
    }
}

impl<M: Module> ModuleHandle<M> {
    pub fn state(&self) -> LifecycleState {
        self.slot.state.get()
    }

    pub fn borrow(&self) -> Ref<'_, M> {
        self.module.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, M> {
        self.module.borrow_mut()
    }

    pub fn rc(&self) -> Rc<RefCell<M>> {
        Rc::clone(&self.module)
    }
}

/// Context object: module registry plus lifecycle driver.
pub struct Director {
    slots: RefCell<Vec<Rc<ModuleSlot>>>,
    registry: RefCell<FxHashMap<TypeId, Rc<ModuleSlot>>>,
    frame: Cell<u64>,
    elapsed: Cell<f32>,
    time_scale: Cell<f32>,
}

impl Default for Director {
    fn default() -> Self {
        Self::new()
    }
}

impl Director {
    pub fn new() -> Self {
        Self {
            slots: RefCell::new(Vec::new()),
            registry: RefCell::new(FxHashMap::default()),
            frame: Cell::new(0),
            elapsed: Cell::new(0.0),
            time_scale: Cell::new(1.0),
        }
    }

    //--- Registration -----------------------------------------------------

    /// Take ownership of `module` in the `Constructed` state.
    pub fn register<M: Module>(&self, module: M) -> KitResult<ModuleHandle<M>> {
        let type_id = TypeId::of::<M>();
        let type_name = std::any::type_name::<M>();
        if self.slot_of(type_id).is_some() {
            error!("Director: {} registered twice", type_name);
            return Err(KitError::DuplicateRegistration(type_name));
        }

        let cadence = Cadence::new(module.update_mode());
        let typed = Rc::new(RefCell::new(module));
        let driven: Rc<RefCell<dyn Module>> = typed.clone();
        let any: Rc<dyn Any> = typed.clone();
        let slot = Rc::new(ModuleSlot {
            type_id,
            type_name,
            state: Cell::new(LifecycleState::Uninitialized),
            cadence: RefCell::new(cadence),
            destroy_requested: Cell::new(false),
            module: driven,
            any,
        });
        slot.set_state(LifecycleState::Constructed);
        self.slots.borrow_mut().push(Rc::clone(&slot));
        debug!("Director: constructed {}", type_name);

        Ok(ModuleHandle {
            module: typed,
            slot,
        })
    }

    /// Look up the awake module of type `M`.
    ///
    /// `None` before `awake` has run and after `destroy`.
    pub fn get_system<M: Module>(&self) -> Option<Rc<RefCell<M>>> {
        let slot = self.registry.borrow().get(&TypeId::of::<M>()).cloned();
        match slot {
            Some(slot) => Rc::clone(&slot.any).downcast::<RefCell<M>>().ok(),
            None => {
                debug!(
                    "Director: system {} not available",
                    std::any::type_name::<M>()
                );
                None
            }
        }
    }

    /// True if a module of type `M` is discoverable.
    pub fn has_system<M: Module>(&self) -> bool {
        self.registry.borrow().contains_key(&TypeId::of::<M>())
    }

    /// Lifecycle state of the registered module of type `M`.
    pub fn state_of<M: Module>(&self) -> Option<LifecycleState> {
        self.slot_of(TypeId::of::<M>()).map(|slot| slot.state.get())
    }

    //--- Lifecycle phases -------------------------------------------------

    /// Run `awake` on every `Constructed` module, in registration order.
    pub fn awake_all(&self) {
        for slot in self.snapshot() {
            if slot.state.get() == LifecycleState::Constructed {
                self.awake_slot(&slot);
            }
        }
    }

    /// Run `start` on every `Awake` module, in registration order.
    pub fn start_all(&self) {
        for slot in self.snapshot() {
            if slot.state.get() == LifecycleState::Awake {
                self.start_slot(&slot);
            }
        }
    }

    /// Advance one host tick of `dt` real seconds.
    pub fn advance(&self, dt: f32) {
        let time_scale = self.time_scale.get();
        let scaled_dt = dt * time_scale;
        self.frame.set(self.frame.get() + 1);
        self.elapsed.set(self.elapsed.get() + scaled_dt);

        self.awake_all();
        self.start_all();

        for slot in self.snapshot() {
            if slot.state.get() == LifecycleState::Started {
                slot.set_state(LifecycleState::Live);
            }
            if !slot.state.get().is_live() {
                continue;
            }
            let Some((delta, unscaled_delta)) =
                slot.cadence.borrow_mut().advance(scaled_dt, dt)
            else {
                continue;
            };
            let tick = Tick {
                frame: self.frame.get(),
                delta,
                unscaled_delta,
                elapsed: self.elapsed.get(),
                time_scale,
            };
            match slot.module.try_borrow_mut() {
                Ok(mut module) => module.update(self, &tick),
                Err(_) => warn!("Director: {} is busy, update skipped", slot.type_name),
            }
            if slot.destroy_requested.get() {
                self.finish_destroy(&slot);
            }
        }
    }

    /// `Live → Paused`. Returns `false` if `M` is not live.
    pub fn pause<M: Module>(&self) -> bool {
        let Some(slot) = self.slot_of(TypeId::of::<M>()) else {
            return false;
        };
        match slot.state.get() {
            LifecycleState::Live | LifecycleState::Started => {
                slot.set_state(LifecycleState::Paused);
                debug!("Director: paused {}", slot.type_name);
                true
            }
            _ => false,
        }
    }

    /// `Paused → Live`. Accumulated cadence time is discarded.
    pub fn resume<M: Module>(&self) -> bool {
        let Some(slot) = self.slot_of(TypeId::of::<M>()) else {
            return false;
        };
        if slot.state.get() != LifecycleState::Paused {
            return false;
        }
        slot.cadence.borrow_mut().reset();
        slot.set_state(LifecycleState::Live);
        debug!("Director: resumed {}", slot.type_name);
        true
    }

    /// Destroy the module of type `M`.
    ///
    /// If the module is currently inside one of its own hooks, destruction
    /// is deferred until that hook returns. Returns `false` if no such module
    /// is registered.
    pub fn destroy<M: Module>(&self) -> bool {
        match self.slot_of(TypeId::of::<M>()) {
            Some(slot) => {
                self.destroy_slot(&slot);
                true
            }
            None => false,
        }
    }

    /// Destroy every module, newest first.
    pub fn shutdown(&self) {
        let slots = self.snapshot();
        for slot in slots.iter().rev() {
            self.destroy_slot(slot);
        }
        info!("Director: shut down after {} frame(s)", self.frame.get());
    }

    //--- Time -------------------------------------------------------------

    pub fn time_scale(&self) -> f32 {
        self.time_scale.get()
    }

    /// Set the multiplier applied to real time. Negative values clamp to 0.
    pub fn set_time_scale(&self, scale: f32) {
        self.time_scale.set(scale.max(0.0));
    }

    pub fn frame(&self) -> u64 {
        self.frame.get()
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed.get()
    }

    //--- Inspection -------------------------------------------------------

    pub fn module_count(&self) -> usize {
        self.slots.borrow().len()
    }

    /// `(name, state)` of every module in registration order.
    pub fn modules(&self) -> Vec<(String, LifecycleState)> {
        self.snapshot()
            .iter()
            .map(|slot| {
                let name = slot
                    .module
                    .try_borrow()
                    .map(|m| m.name().to_string())
                    .unwrap_or_else(|_| slot.type_name.to_string());
                (name, slot.state.get())
            })
            .collect()
    }

    //--- Internals --------------------------------------------------------

    fn snapshot(&self) -> Vec<Rc<ModuleSlot>> {
        self.slots.borrow().clone()
    }

    fn slot_of(&self, type_id: TypeId) -> Option<Rc<ModuleSlot>> {
        self.slots
            .borrow()
            .iter()
            .find(|slot| slot.type_id == type_id)
            .cloned()
    }

    fn awake_slot(&self, slot: &Rc<ModuleSlot>) {
        {
            let mut registry = self.registry.borrow_mut();
            if registry.contains_key(&slot.type_id) {
                error!("Director: {} is already awake", slot.type_name);
                return;
            }
            registry.insert(slot.type_id, Rc::clone(slot));
        }
        slot.set_state(LifecycleState::Awake);
        match slot.module.try_borrow_mut() {
            Ok(mut module) => module.awake(self),
            Err(_) => warn!("Director: {} is busy, awake skipped", slot.type_name),
        }
        debug!("Director: {} awake", slot.type_name);
        if slot.destroy_requested.get() {
            self.finish_destroy(slot);
        }
    }

    fn start_slot(&self, slot: &Rc<ModuleSlot>) {
        slot.set_state(LifecycleState::Started);
        match slot.module.try_borrow_mut() {
            Ok(mut module) => module.start(self),
            Err(_) => warn!("Director: {} is busy, start skipped", slot.type_name),
        }
        debug!("Director: {} started", slot.type_name);
        if slot.destroy_requested.get() {
            self.finish_destroy(slot);
        }
    }

    fn destroy_slot(&self, slot: &Rc<ModuleSlot>) {
        if slot.state.get() == LifecycleState::Destroyed {
            return;
        }
        if slot.module.try_borrow_mut().is_err() {
            debug!("Director: {} destroy deferred", slot.type_name);
            slot.destroy_requested.set(true);
            return;
        }
        self.finish_destroy(slot);
    }

    fn finish_destroy(&self, slot: &Rc<ModuleSlot>) {
        if slot.state.get() == LifecycleState::Destroyed {
            return;
        }
        let was_awake = slot.state.get().is_awake();
        slot.destroy_requested.set(false);
        slot.set_state(LifecycleState::Destroyed);
        self.registry.borrow_mut().remove(&slot.type_id);
        self.slots
            .borrow_mut()
            .retain(|other| !Rc::ptr_eq(other, slot));

        if was_awake {
            match slot.module.try_borrow_mut() {
                Ok(mut module) => module.destroy(self),
                Err(_) => warn!("Director: {} is busy, destroy hook skipped", slot.type_name),
            }
        }
        debug!("Director: {} destroyed", slot.type_name);
    }
}
