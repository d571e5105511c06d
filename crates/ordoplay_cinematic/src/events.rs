// SPDX-License-Identifier: MIT OR Apache-2.0
//! Public finished notification.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Identifier returned by [`FinishedEvent::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Listener {
    id: SubscriptionId,
    callback: Box<dyn FnMut()>,
}

#[derive(Default)]
struct EventInner {
    listeners: RefCell<Vec<Listener>>,
    removed: RefCell<Vec<SubscriptionId>>,
    next_id: Cell<u64>,
    emitted: Cell<u64>,
}

/// Zero-argument notification raised when a cinematic finishes.
///
/// Listeners may subscribe or unsubscribe from inside a callback.
#[derive(Clone, Default)]
pub struct FinishedEvent {
    inner: Rc<EventInner>,
}

impl FinishedEvent {
    /// Create an event with no listeners
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a listener
    pub fn subscribe(&self, callback: impl FnMut() + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.inner.next_id.get());
        self.inner.next_id.set(id.0 + 1);
        self.inner.listeners.borrow_mut().push(Listener {
            id,
            callback: Box::new(callback),
        });
        id
    }

    /// Remove a listener
    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.inner.listeners.borrow_mut().retain(|l| l.id != id);
        self.inner.removed.borrow_mut().push(id);
    }

    /// Number of listeners
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.borrow().len()
    }

    /// Times the event has fired
    pub fn emit_count(&self) -> u64 {
        self.inner.emitted.get()
    }

    pub(crate) fn emit(&self) {
        self.inner.emitted.set(self.inner.emitted.get() + 1);
        self.inner.removed.borrow_mut().clear();

        let mut listeners = std::mem::take(&mut *self.inner.listeners.borrow_mut());
        for listener in &mut listeners {
            if !self.inner.removed.borrow().contains(&listener.id) {
                (listener.callback)();
            }
        }

        let removed = std::mem::take(&mut *self.inner.removed.borrow_mut());
        listeners.retain(|l| !removed.contains(&l.id));

        let mut current = self.inner.listeners.borrow_mut();
        listeners.append(&mut current);
        *current = listeners;
    }
}
