//! Marker component: lets an entity register with manager modules.
//!
//! A [`Marker`] carries a list of `(manager type, priority)` bindings. When
//! activated, [`register_self`](Marker::register_self) walks the bindings in
//! priority order (highest first, ties in bind order) and registers the
//! marker's [`MarkId`] with each manager module found through the
//! [`Director`]. Deactivation ([`unregister_self`](Marker::unregister_self))
//! undoes every registration that actually happened.
//!
//! The `already_registered` set passed to `register_self` lets a caller run
//! several markers of one entity in a single pass without registering the
//! same manager type twice.
//!
//! # Example
//!
//! ```
//! use std::any::TypeId;
//!
//! use playkit::components::marker::{MarkId, Marker};
//! use playkit::events::channel::EventChannel;
//! use playkit::resources::objectbucket::ObjectBucket;
//! use playkit::systems::director::Director;
//! use playkit::systems::sensor::{Sensor, SensorManager};
//! use rustc_hash::FxHashSet;
//!
//! let director = Director::new();
//! let sensors = director
//!     .register(SensorManager::new(
//!         ObjectBucket::new("sensors", vec![Sensor::new("gate", (0.0, 0.0), 1.0)]),
//!         EventChannel::new("sensor"),
//!     ))
//!     .unwrap();
//! director.awake_all();
//!
//! let mut marker = Marker::new(MarkId(7)).bind::<SensorManager>(10);
//! let mut seen = FxHashSet::default();
//! let newly = marker.register_self(&director, &mut seen);
//! assert_eq!(newly, vec![TypeId::of::<SensorManager>()]);
//! assert!(sensors.borrow().is_tracking(MarkId(7)));
//!
//! marker.unregister_self(&director);
//! assert!(!sensors.borrow().is_tracking(MarkId(7)));
//! ```

use std::any::TypeId;

use bevy_ecs::prelude::Component;
use log::{debug, warn};
use rustc_hash::FxHashSet;
use smallvec::SmallVec;

use crate::systems::director::Director;
use crate::systems::module::Module;

/// Identifier a manager uses to track a marked entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkId(pub u64);

/// Implemented by modules that keep track of marked entities.
pub trait MarkManager {
    fn register_mark(&mut self, mark: MarkId);
    fn unregister_mark(&mut self, mark: MarkId);
}

/// One `(manager type, priority)` binding.
#[derive(Debug, Clone, Copy)]
pub struct ManagerBinding {
    manager: TypeId,
    manager_name: &'static str,
    priority: i32,
    register: fn(&Director, MarkId) -> bool,
    unregister: fn(&Director, MarkId) -> bool,
}

impl ManagerBinding {
    pub fn manager(&self) -> TypeId {
        self.manager
    }

    pub fn manager_name(&self) -> &'static str {
        self.manager_name
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }
}

fn register_with<M: Module + MarkManager>(director: &Director, mark: MarkId) -> bool {
    let Some(manager) = director.get_system::<M>() else {
        return false;
    };
    match manager.try_borrow_mut() {
        Ok(mut manager) => {
            manager.register_mark(mark);
            true
        }
        Err(_) => {
            warn!(
                "Marker {:?}: {} is busy, registration skipped",
                mark,
                std::any::type_name::<M>()
            );
            false
        }
    }
}

fn unregister_with<M: Module + MarkManager>(director: &Director, mark: MarkId) -> bool {
    let Some(manager) = director.get_system::<M>() else {
        return false;
    };
    match manager.try_borrow_mut() {
        Ok(mut manager) => {
            manager.unregister_mark(mark);
            true
        }
        Err(_) => {
            warn!(
                "Marker {:?}: {} is busy, unregistration skipped",
                mark,
                std::any::type_name::<M>()
            );
            false
        }
    }
}

/// Registration capability attached to a gameplay entity.
#[derive(Component, Debug, Clone)]
pub struct Marker {
    id: MarkId,
    bindings: SmallVec<[ManagerBinding; 2]>,
    registered: SmallVec<[TypeId; 2]>,
}

impl Marker {
    pub fn new(id: MarkId) -> Self {
        Self {
            id,
            bindings: SmallVec::new(),
            registered: SmallVec::new(),
        }
    }

    /// Builder: bind to manager module `M` with `priority`.
    ///
    /// Binding the same manager twice keeps the first binding.
    pub fn bind<M: Module + MarkManager>(mut self, priority: i32) -> Self {
        let manager = TypeId::of::<M>();
        if self.bindings.iter().any(|b| b.manager == manager) {
            warn!(
                "Marker {:?}: {} bound twice",
                self.id,
                std::any::type_name::<M>()
            );
            return self;
        }
        self.bindings.push(ManagerBinding {
            manager,
            manager_name: std::any::type_name::<M>(),
            priority,
            register: register_with::<M>,
            unregister: unregister_with::<M>,
        });
        // Stable: equal priorities keep bind order.
        self.bindings.sort_by(|a, b| b.priority.cmp(&a.priority));
        self
    }

    pub fn id(&self) -> MarkId {
        self.id
    }

    /// Bindings in registration order.
    pub fn bindings(&self) -> &[ManagerBinding] {
        &self.bindings
    }

    /// Manager types this marker is currently registered with.
    pub fn registered(&self) -> &[TypeId] {
        &self.registered
    }

    pub fn is_registered_with<M: 'static>(&self) -> bool {
        self.registered.contains(&TypeId::of::<M>())
    }

    /// True if some binding has not been registered yet.
    pub fn has_pending(&self) -> bool {
        self.bindings
            .iter()
            .any(|b| !self.registered.contains(&b.manager))
    }

    /// Register with every bound manager not in `already_registered`.
    ///
    /// Managers that are not discoverable yet are skipped and can be picked
    /// up by a later call. Returns the manager types registered by this call.
    pub fn register_self(
        &mut self,
        director: &Director,
        already_registered: &mut FxHashSet<TypeId>,
    ) -> Vec<TypeId> {
        let mut newly = Vec::new();
        for binding in &self.bindings {
            if already_registered.contains(&binding.manager)
                || self.registered.contains(&binding.manager)
            {
                continue;
            }
            if (binding.register)(director, self.id) {
                debug!(
                    "Marker {:?}: registered with {} (priority {})",
                    self.id, binding.manager_name, binding.priority
                );
                self.registered.push(binding.manager);
                already_registered.insert(binding.manager);
                newly.push(binding.manager);
            } else {
                debug!(
                    "Marker {:?}: {} not available",
                    self.id, binding.manager_name
                );
            }
        }
        newly
    }

    /// Unregister from every manager this marker registered with.
    ///
    /// Safe to call repeatedly or before any registration.
    pub fn unregister_self(&mut self, director: &Director) {
        for manager in self.registered.drain(..) {
            if let Some(binding) = self.bindings.iter().find(|b| b.manager == manager) {
                if !(binding.unregister)(director, self.id) {
                    debug!(
                        "Marker {:?}: {} gone before unregistration",
                        self.id, binding.manager_name
                    );
                }
            }
        }
    }
}
