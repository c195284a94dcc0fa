//! Converter channels: filter and transform one channel into another.
//!
//! A [`ConverterChannel<U, T>`] listens on a source `EventChannel<U>`, runs
//! each payload through a pure `convert` function and re-raises `Some(t)` on
//! its own output `EventChannel<T>`. `None` drops the payload. Producers
//! and final consumers never see each other's types, and converters can be
//! chained by using one converter's output as the next one's source.
//!
//! The source subscription is released by [`detach`](ConverterChannel::detach)
//! or when the converter is dropped.
//!
//! # Example
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use playkit::events::channel::EventChannel;
//! use playkit::events::converter::ConverterChannel;
//!
//! let numbers = EventChannel::<i32>::new("numbers");
//! let evens = ConverterChannel::new(&numbers, |n: &i32| (n % 2 == 0).then(|| n.to_string()));
//!
//! let seen = Rc::new(RefCell::new(Vec::new()));
//! let sink = Rc::clone(&seen);
//! let _sub = evens.output().add_listener(move |s: &String| sink.borrow_mut().push(s.clone()));
//!
//! for n in 1..=4 {
//!     numbers.raise(&n);
//! }
//! assert_eq!(*seen.borrow(), vec!["2", "4"]);
//! ```

use log::debug;

use super::channel::{EventChannel, Subscription};

/// Source channel + convert function + output channel.
pub struct ConverterChannel<U: 'static, T: 'static> {
    source: EventChannel<U>,
    output: EventChannel<T>,
    subscription: Option<Subscription>,
}

impl<U: 'static, T: 'static> ConverterChannel<U, T> {
    /// Subscribe to `source` and forward converted payloads.
    pub fn new(source: &EventChannel<U>, convert: impl Fn(&U) -> Option<T> + 'static) -> Self {
        let output = EventChannel::new(format!("{} (converted)", source.name()));
        Self::with_output(source, output, convert)
    }

    /// Same as [`new`](Self::new) but forwards into an existing channel.
    pub fn with_output(
        source: &EventChannel<U>,
        output: EventChannel<T>,
        convert: impl Fn(&U) -> Option<T> + 'static,
    ) -> Self {
        let forward = output.clone();
        let subscription = source.add_listener(move |payload| {
            if let Some(converted) = convert(payload) {
                forward.raise(&converted);
            }
        });
        debug!(
            "ConverterChannel: '{}' -> '{}'",
            source.name(),
            output.name()
        );
        Self {
            source: source.clone(),
            output,
            subscription: Some(subscription),
        }
    }

    /// Channel that downstream listeners subscribe to.
    pub fn output(&self) -> &EventChannel<T> {
        &self.output
    }

    pub fn source(&self) -> &EventChannel<U> {
        &self.source
    }

    pub fn is_attached(&self) -> bool {
        self.subscription.is_some()
    }

    /// Stop forwarding. Idempotent.
    pub fn detach(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            self.source.remove_listener(subscription);
        }
    }
}

impl<U: 'static, T: 'static> Drop for ConverterChannel<U, T> {
    fn drop(&mut self) {
        self.detach();
    }
}
