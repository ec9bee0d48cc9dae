use super::store::StoreInner;
use crate::action::Action;
use crate::listener::{Entry, Listener, Notify};
use log::debug;
use std::fmt;
use std::sync::{Arc, Weak};

enum Handle {
    State(Arc<Entry<dyn Notify>>),
    Action(Arc<Entry<Listener<Action>>>),
}

/// Handle for managing a listener's lifecycle.
///
/// Dropping the handle keeps the listener registered; call
/// [`Subscription::cancel`] or [`Store::shutdown`](crate::Store::shutdown) to
/// stop notifications.
pub struct Subscription {
    handle: Handle,
    store: Weak<StoreInner>,
}

impl Subscription {
    pub(crate) fn for_state(entry: Arc<Entry<dyn Notify>>, store: Weak<StoreInner>) -> Self {
        Self {
            handle: Handle::State(entry),
            store,
        }
    }

    pub(crate) fn for_actions(entry: Arc<Entry<Listener<Action>>>, store: Weak<StoreInner>) -> Self {
        Self {
            handle: Handle::Action(entry),
            store,
        }
    }

    /// Stop notifications to this listener.
    ///
    /// Takes effect immediately, including for a notification pass that is
    /// currently running and has not reached this listener yet. Safe to call
    /// from inside the listener itself.
    pub fn cancel(&self) {
        let store = self.store.upgrade();
        match (&self.handle, store) {
            (Handle::State(entry), Some(store)) => {
                store.listeners.remove(entry);
            }
            (Handle::Action(entry), Some(store)) => {
                store.action_listeners.remove(entry);
            }
            (Handle::State(entry), None) => entry.deactivate(),
            (Handle::Action(entry), None) => entry.deactivate(),
        }
        debug!("subscription {} cancelled", self.id());
    }

    /// Register the listener again after [`Subscription::cancel`].
    ///
    /// Does nothing if the subscription is active or the store is gone.
    pub fn resume(&self) {
        let Some(store) = self.store.upgrade() else {
            return;
        };
        let resumed = match &self.handle {
            Handle::State(entry) => store.listeners.resume(entry),
            Handle::Action(entry) => store.action_listeners.resume(entry),
        };
        if resumed {
            debug!("subscription {} resumed", self.id());
        }
    }

    /// Deliver the currently selected value.
    ///
    /// The filter is not consulted. The value goes through the store's
    /// notifier, so in background mode it arrives after every change already
    /// queued for this listener. Action subscriptions have no current value
    /// and ignore this call.
    pub fn inform_with_current_state(&self) {
        let Handle::State(entry) = &self.handle else {
            return;
        };
        if !entry.is_active() {
            return;
        }
        if let Some(store) = self.store.upgrade() {
            store.inform(Arc::clone(entry));
        }
    }

    pub fn is_active(&self) -> bool {
        match &self.handle {
            Handle::State(entry) => entry.is_active(),
            Handle::Action(entry) => entry.is_active(),
        }
    }

    fn id(&self) -> u64 {
        match &self.handle {
            Handle::State(entry) => entry.id(),
            Handle::Action(entry) => entry.id(),
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.handle {
            Handle::State(_) => "state",
            Handle::Action(_) => "action",
        };
        f.debug_struct("Subscription")
            .field("id", &self.id())
            .field("kind", &kind)
            .field("active", &self.is_active())
            .finish()
    }
}
