//! Typed in-process publish/subscribe channel.
//!
//! An [`EventChannel<T>`] is a cheap, clonable handle to one listener list.
//! Every clone raises into and subscribes to the same list, so a channel can
//! be handed to producers and consumers independently.
//!
//! # Subscriptions
//!
//! [`add_listener`](EventChannel::add_listener) returns a [`Subscription`]
//! token, and [`remove_listener`](EventChannel::remove_listener) takes that
//! token back. There is no removal by callback identity: registering the
//! same callback twice gives two tokens and two invocations per raise.
//!
//! # Raise semantics
//!
//! [`raise`](EventChannel::raise) is synchronous and calls listeners in
//! registration order. The listener list is snapshotted when the raise
//! begins:
//!
//! - a listener added during a raise is first called on the next raise
//! - a listener removed during a raise still receives the current payload
//!
//! Listeners may raise on the same channel; the nested raise takes its own
//! snapshot.
//!
//! Channels are single-threaded (`Rc`), matching the tick-driven model.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use log::{trace, warn};

static NEXT_CHANNEL_ID: AtomicU64 = AtomicU64::new(1);

/// Shared listener callback.
pub type Listener<T> = Rc<dyn Fn(&T)>;

/// Token returned by [`EventChannel::add_listener`].
///
/// Remembers which channel issued it, so handing it to another channel is a
/// no-op rather than removing an unrelated listener.
#[derive(Debug, PartialEq, Eq, Hash)]
#[must_use = "dropping the token makes the listener impossible to remove"]
pub struct Subscription {
    channel: u64,
    id: u64,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }
}

struct ChannelInner<T> {
    id: u64,
    name: String,
    next_listener: Cell<u64>,
    listeners: RefCell<Vec<(u64, Listener<T>)>>,
}

/// Handle to a typed listener list.
pub struct EventChannel<T: 'static> {
    inner: Rc<ChannelInner<T>>,
}

impl<T: 'static> Clone for EventChannel<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: 'static> fmt::Debug for EventChannel<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventChannel")
            .field("name", &self.inner.name)
            .field("listeners", &self.listener_count())
            .finish()
    }
}

impl<T: 'static> Default for EventChannel<T> {
    fn default() -> Self {
        Self::new(std::any::type_name::<T>())
    }
}

impl<T: 'static> EventChannel<T> {
    /// Create a channel with no listeners. `name` is used in logs.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            inner: Rc::new(ChannelInner {
                id: NEXT_CHANNEL_ID.fetch_add(1, Ordering::Relaxed),
                name: name.into(),
                next_listener: Cell::new(1),
                listeners: RefCell::new(Vec::new()),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Append a listener.
    pub fn add_listener(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        self.add_shared_listener(Rc::new(callback))
    }

    /// Append an already shared listener. Adding the same `Rc` twice makes it
    /// fire twice per raise.
    pub fn add_shared_listener(&self, callback: Listener<T>) -> Subscription {
        let id = self.inner.next_listener.get();
        self.inner.next_listener.set(id + 1);
        self.inner.listeners.borrow_mut().push((id, callback));
        trace!("EventChannel '{}': listener {} added", self.inner.name, id);
        Subscription {
            channel: self.inner.id,
            id,
        }
    }

    /// Remove the listener identified by `subscription`.
    ///
    /// Returns `false` if the token belongs to another channel or was
    /// already removed.
    pub fn remove_listener(&self, subscription: Subscription) -> bool {
        if subscription.channel != self.inner.id {
            warn!(
                "EventChannel '{}': subscription {} belongs to another channel",
                self.inner.name, subscription.id
            );
            return false;
        }
        let mut listeners = self.inner.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(id, _)| *id != subscription.id);
        listeners.len() != before
    }

    /// Call every listener registered when the raise begins.
    pub fn raise(&self, payload: &T) {
        let snapshot: Vec<Listener<T>> = self
            .inner
            .listeners
            .borrow()
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect();
        trace!(
            "EventChannel '{}': raising to {} listener(s)",
            self.inner.name,
            snapshot.len()
        );
        for listener in snapshot {
            listener(payload);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners.borrow().len()
    }

    /// Drop every listener.
    pub fn clear(&self) {
        self.inner.listeners.borrow_mut().clear();
    }

    /// True if both handles point at the same listener list.
    pub fn same_channel(&self, other: &EventChannel<T>) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder() -> (Rc<RefCell<Vec<i32>>>, impl Fn(&i32) + 'static) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        (seen, move |v: &i32| sink.borrow_mut().push(*v))
    }

    #[test]
    fn raise_calls_listeners_in_registration_order() {
        let channel = EventChannel::<i32>::new("order");
        let log = Rc::new(RefCell::new(Vec::new()));
        for tag in ["a", "b", "c"] {
            let log = Rc::clone(&log);
            let _ = channel.add_listener(move |v| log.borrow_mut().push(format!("{tag}{v}")));
        }
        channel.raise(&1);
        assert_eq!(*log.borrow(), vec!["a1", "b1", "c1"]);
    }

    #[test]
    fn same_callback_twice_fires_twice() {
        let channel = EventChannel::<i32>::new("dup");
        let count = Rc::new(Cell::new(0));
        let counter = Rc::clone(&count);
        let listener: Listener<i32> = Rc::new(move |_| counter.set(counter.get() + 1));

        let first = channel.add_shared_listener(Rc::clone(&listener));
        let second = channel.add_shared_listener(listener);
        assert_ne!(first, second);

        channel.raise(&0);
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn remove_listener_by_token() {
        let channel = EventChannel::<i32>::new("remove");
        let (seen, listener) = recorder();
        let sub = channel.add_listener(listener);
        channel.raise(&1);
        assert!(channel.remove_listener(sub));
        channel.raise(&2);
        assert_eq!(*seen.borrow(), vec![1]);
        assert_eq!(channel.listener_count(), 0);
    }

    #[test]
    fn foreign_token_is_rejected() {
        let a = EventChannel::<i32>::new("a");
        let b = EventChannel::<i32>::new("b");
        let (_seen, listener) = recorder();
        let _keep = a.add_listener(|_| {});
        let sub_b = b.add_listener(listener);
        // Same listener id (1) on both channels, but the token knows its owner.
        assert!(!a.remove_listener(sub_b));
        assert_eq!(a.listener_count(), 1);
        assert_eq!(b.listener_count(), 1);
    }

    #[test]
    fn clones_share_listeners() {
        let channel = EventChannel::<i32>::new("shared");
        let producer = channel.clone();
        let (seen, listener) = recorder();
        let _sub = channel.add_listener(listener);
        producer.raise(&9);
        assert_eq!(*seen.borrow(), vec![9]);
        assert!(producer.same_channel(&channel));
    }

    #[test]
    fn listener_added_during_raise_waits_for_next_raise() {
        let channel = EventChannel::<i32>::new("snapshot-add");
        let (seen, late_listener) = recorder();
        let late_listener: Listener<i32> = Rc::new(late_listener);
        let handle = channel.clone();
        let added = Rc::new(Cell::new(false));
        let flag = Rc::clone(&added);
        let _sub = channel.add_listener(move |_| {
            if !flag.get() {
                flag.set(true);
                let _ = handle.add_shared_listener(Rc::clone(&late_listener));
            }
        });

        channel.raise(&1);
        assert!(seen.borrow().is_empty());
        channel.raise(&2);
        assert_eq!(*seen.borrow(), vec![2]);
    }

    #[test]
    fn listener_removed_during_raise_still_gets_current_payload() {
        let channel = EventChannel::<i32>::new("snapshot-remove");
        let victim_token: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));

        let handle = channel.clone();
        let token = Rc::clone(&victim_token);
        let _remover = channel.add_listener(move |_| {
            if let Some(sub) = token.borrow_mut().take() {
                handle.remove_listener(sub);
            }
        });
        let (seen, victim) = recorder();
        *victim_token.borrow_mut() = Some(channel.add_listener(victim));

        channel.raise(&1);
        channel.raise(&2);
        assert_eq!(*seen.borrow(), vec![1]);
    }

    #[test]
    fn nested_raise_on_same_channel() {
        let channel = EventChannel::<i32>::new("nested");
        let (seen, listener) = recorder();
        let _rec = channel.add_listener(listener);
        let handle = channel.clone();
        let _echo = channel.add_listener(move |v| {
            if *v > 0 {
                handle.raise(&(v - 1));
            }
        });
        channel.raise(&2);
        assert_eq!(*seen.borrow(), vec![2, 1, 0]);
    }
}
