//! # formkit-signals
//!
//! Change signals for the formkit data model. A [`Signal`] is a list of named
//! receivers that are called, in connection order, whenever a reactive value
//! they depend on changes. Properties notify dependents through signals, and
//! lookup loaders announce reloads through them.
//!
//! Signals are single-threaded: the data model lives on one thread and its
//! receivers hold `Rc` handles into the model.
//!
//! ## Usage
//!
//! ```
//! use formkit_signals::Signal;
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let signal: Signal<i32> = Signal::new();
//! let total = Rc::new(Cell::new(0));
//!
//! let t = Rc::clone(&total);
//! signal.connect("sum", Rc::new(move |v: &i32| t.set(t.get() + v)));
//!
//! signal.send(&2);
//! signal.send(&3);
//! assert_eq!(total.get(), 5);
//! ```

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// The type signature for a signal receiver callback.
pub type SignalReceiver<T> = Rc<dyn Fn(&T)>;

/// A signal that can be connected to and dispatched.
///
/// Each signal carries a payload type `T`. Receivers are called in the order
/// they were connected. A receiver may connect or disconnect receivers on the
/// signal it is being called from; the change takes effect on the next send.
pub struct Signal<T: 'static> {
    receivers: RefCell<Vec<(String, SignalReceiver<T>)>>,
}

impl<T: 'static> Default for Signal<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let receivers = self.receivers.borrow();
        f.debug_struct("Signal")
            .field(
                "receivers",
                &receivers.iter().map(|(id, _)| id.as_str()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl<T: 'static> Signal<T> {
    /// Creates a new signal with no connected receivers.
    pub const fn new() -> Self {
        Self {
            receivers: RefCell::new(Vec::new()),
        }
    }

    /// Connects a receiver to this signal.
    ///
    /// The `receiver_id` is used to identify the receiver for later disconnection.
    /// If a receiver with the same ID is already connected, it is replaced in
    /// place and keeps its position.
    pub fn connect(&self, receiver_id: impl Into<String>, callback: SignalReceiver<T>) {
        let id = receiver_id.into();
        let mut receivers = self.receivers.borrow_mut();

        if let Some(entry) = receivers.iter_mut().find(|(rid, _)| *rid == id) {
            tracing::trace!(receiver = %id, "replacing signal receiver");
            entry.1 = callback;
        } else {
            receivers.push((id, callback));
        }
    }

    /// Disconnects the receiver with the given ID.
    ///
    /// Returns `true` if a receiver was found and removed.
    pub fn disconnect(&self, receiver_id: &str) -> bool {
        let mut receivers = self.receivers.borrow_mut();
        let len_before = receivers.len();
        receivers.retain(|(id, _)| id != receiver_id);
        receivers.len() < len_before
    }

    /// Disconnects every receiver whose ID starts with `prefix`.
    ///
    /// Returns the number of receivers removed.
    pub fn disconnect_prefix(&self, prefix: &str) -> usize {
        let mut receivers = self.receivers.borrow_mut();
        let len_before = receivers.len();
        receivers.retain(|(id, _)| !id.starts_with(prefix));
        len_before - receivers.len()
    }

    /// Returns `true` if a receiver with the given ID is connected.
    pub fn is_connected(&self, receiver_id: &str) -> bool {
        self.receivers.borrow().iter().any(|(id, _)| id == receiver_id)
    }

    /// Sends the signal to all connected receivers.
    ///
    /// Receivers are called in connection order, against a snapshot of the
    /// receiver list taken before the first call. Returns the number of
    /// receivers called.
    pub fn send(&self, payload: &T) -> usize {
        let snapshot: Vec<SignalReceiver<T>> = self
            .receivers
            .borrow()
            .iter()
            .map(|(_, callback)| Rc::clone(callback))
            .collect();
        for callback in &snapshot {
            callback(payload);
        }
        snapshot.len()
    }

    /// Returns the number of connected receivers.
    pub fn receiver_count(&self) -> usize {
        self.receivers.borrow().len()
    }
}
