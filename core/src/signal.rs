//! Lightweight multicast signals with scoped subscriptions.
//!
//! A [`Signal`] holds a list of handlers. [`Signal::connect`] returns a
//! [`Subscription`] token; dropping the token disconnects the handler. The
//! signal does not keep subscribers alive and subscribers do not keep the
//! signal alive, so either side may be dropped first.
//!
//! Handlers are invoked outside the internal lock, which makes it legal for a
//! handler to connect new handlers or drop its own subscription while the
//! signal is being emitted.
//!
//! ```
//! use lilium_core::signal::Signal;
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! let signal = Signal::<u32>::new();
//! let hits = Arc::new(AtomicUsize::new(0));
//! let counter = hits.clone();
//! let subscription = signal.connect(move |v| {
//!     counter.fetch_add(*v as usize, Ordering::Relaxed);
//! });
//!
//! signal.emit(&2);
//! drop(subscription);
//! signal.emit(&5);
//! assert_eq!(hits.load(Ordering::Relaxed), 2);
//! ```

use std::sync::{Arc, Weak};

use parking_lot::Mutex;

type Handler<E> = Arc<dyn Fn(&E) + Send + Sync>;

struct SlotTable<E> {
    next_id: u64,
    slots: Vec<(u64, Handler<E>)>,
}

impl<E> SlotTable<E> {
    fn contains(&self, id: u64) -> bool {
        self.slots.iter().any(|(slot, _)| *slot == id)
    }
}

/// Type-erased view of a slot table, held weakly by [`Subscription`].
trait Disconnect: Send + Sync {
    fn disconnect(&self, id: u64);
    fn is_connected(&self, id: u64) -> bool;
}

impl<E> Disconnect for Mutex<SlotTable<E>> {
    fn disconnect(&self, id: u64) {
        self.lock().slots.retain(|(slot, _)| *slot != id);
    }

    fn is_connected(&self, id: u64) -> bool {
        self.lock().contains(id)
    }
}

/// A multicast event source.
pub struct Signal<E: 'static> {
    table: Arc<Mutex<SlotTable<E>>>,
}

impl<E: 'static> Signal<E> {
    pub fn new() -> Self {
        Self {
            table: Arc::new(Mutex::new(SlotTable {
                next_id: 0,
                slots: Vec::new(),
            })),
        }
    }

    /// Connect a handler. It stays connected until the returned token drops.
    pub fn connect<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        let mut table = self.table.lock();
        let id = table.next_id;
        table.next_id += 1;
        table.slots.push((id, Arc::new(handler)));
        drop(table);

        let weak: Weak<Mutex<SlotTable<E>>> = Arc::downgrade(&self.table);
        let weak: Weak<dyn Disconnect> = weak;
        Subscription {
            table: Some(weak),
            id,
        }
    }

    /// Invoke every connected handler in connection order.
    ///
    /// A handler disconnected by an earlier handler during the same emit is
    /// not invoked.
    pub fn emit(&self, event: &E) {
        let handlers: Vec<(u64, Handler<E>)> = self.table.lock().slots.clone();
        for (id, handler) in handlers {
            if self.table.lock().contains(id) {
                handler(event);
            }
        }
    }

    pub fn connection_count(&self) -> usize {
        self.table.lock().slots.len()
    }

    /// Drop every handler. Outstanding tokens become inert.
    pub fn disconnect_all(&self) {
        self.table.lock().slots.clear();
    }
}

impl<E: 'static> Default for Signal<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: 'static> std::fmt::Debug for Signal<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("connections", &self.connection_count())
            .finish()
    }
}

/// RAII token for a connected handler.
#[must_use = "dropping a Subscription disconnects its handler immediately"]
pub struct Subscription {
    table: Option<Weak<dyn Disconnect>>,
    id: u64,
}

impl Subscription {
    /// True while both the signal and the handler are alive.
    pub fn is_connected(&self) -> bool {
        self.table
            .as_ref()
            .and_then(Weak::upgrade)
            .is_some_and(|table| table.is_connected(self.id))
    }

    /// Disconnect now. Equivalent to dropping the token.
    pub fn disconnect(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(table) = self.table.take().and_then(|weak| weak.upgrade()) {
            table.disconnect(self.id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("connected", &self.is_connected())
            .finish()
    }
}
