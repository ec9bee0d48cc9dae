use super::filter::Filter;
use super::listener::Listener;
use super::selector::{Selection, Selector};
use crate::state::State;
use log::warn;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockWriteGuard};

/// A state subscription with its element type erased.
pub(crate) trait Notify: Send + Sync {
    /// Deliver the transition from `old` to `new` if it matches.
    ///
    /// `force` treats every scope as changed and skips the filter.
    fn notify(&self, old: &Arc<State>, new: &Arc<State>, force: bool);

    /// Deliver the currently selected value unconditionally.
    fn inform(&self, state: &Arc<State>);
}

/// Selector, filter and callback of one state subscription.
pub(crate) struct StateListener<E: ?Sized> {
    selector: Selector<E>,
    filter: Filter<E>,
    listener: Listener<E>,
}

impl<E: ?Sized + 'static> StateListener<E> {
    pub fn new(selector: Selector<E>, filter: Filter<E>, listener: Listener<E>) -> Self {
        Self {
            selector,
            filter,
            listener,
        }
    }

    fn current(&self, state: &Arc<State>) -> Option<Arc<E>> {
        match self.selector.select(state) {
            Selection::Found(value) => Some(value),
            Selection::Absent => None,
            Selection::Mismatch {
                key,
                expected,
                actual,
            } => {
                warn!(
                    "listener expects `{}` at scope `{}` but found `{}`; not notifying",
                    expected, key, actual
                );
                None
            }
        }
    }
}

impl<E: ?Sized + 'static> Notify for StateListener<E> {
    fn notify(&self, old: &Arc<State>, new: &Arc<State>, force: bool) {
        if !force && !self.selector.touched(old, new) {
            return;
        }
        let Some(current) = self.current(new) else {
            return;
        };
        if !force {
            // A scope that just appeared or changed type counts as changed.
            if let Selection::Found(previous) = self.selector.select(old) {
                if !self.filter.matches(&*previous, &*current) {
                    return;
                }
            }
        }
        self.listener.call(&*current);
    }

    fn inform(&self, state: &Arc<State>) {
        if let Some(current) = self.current(state) {
            self.listener.call(&*current);
        }
    }
}

/// One registered subscription.
pub(crate) struct Entry<N: ?Sized> {
    id: u64,
    listener_id: usize,
    active: AtomicBool,
    target: Box<N>,
}

impl<N: ?Sized> Entry<N> {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn target(&self) -> &N {
        &self.target
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    pub fn deactivate(&self) {
        self.active.store(false, Ordering::SeqCst);
    }

    /// Mark the entry active again; `true` if it was inactive.
    pub fn activate(&self) -> bool {
        !self.active.swap(true, Ordering::SeqCst)
    }
}

/// Active subscriptions of one kind.
///
/// Notification passes work on a [`snapshot`](ListenerRegistry::snapshot) and
/// check [`Entry::is_active`] right before each delivery, so removing an entry
/// mid-pass stops any delivery that has not happened yet.
pub(crate) struct ListenerRegistry<N: ?Sized> {
    entries: RwLock<Vec<Arc<Entry<N>>>>,
    next_id: AtomicU64,
}

impl<N: ?Sized> Default for ListenerRegistry<N> {
    fn default() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(0),
        }
    }
}

impl<N: ?Sized> ListenerRegistry<N> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, listener_id: usize, target: Box<N>) -> Arc<Entry<N>> {
        let entry = Arc::new(Entry {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            listener_id,
            active: AtomicBool::new(true),
            target,
        });
        self.write().push(Arc::clone(&entry));
        entry
    }

    /// Reactivate a removed entry and put it back.
    ///
    /// The flag and the list change together under the write lock, so a
    /// concurrent [`remove`](ListenerRegistry::remove) never leaves an active
    /// entry outside the registry.
    pub fn resume(&self, entry: &Arc<Entry<N>>) -> bool {
        let mut entries = self.write();
        if !entry.activate() {
            return false;
        }
        if !entries.iter().any(|existing| existing.id == entry.id) {
            entries.push(Arc::clone(entry));
        }
        true
    }

    /// Deactivate and drop `entry`.
    pub fn remove(&self, entry: &Entry<N>) -> bool {
        let mut entries = self.write();
        entry.deactivate();
        let before = entries.len();
        entries.retain(|existing| existing.id != entry.id);
        entries.len() != before
    }

    /// Deactivate and drop every entry registered with the given callback.
    pub fn remove_listener(&self, listener_id: usize) -> usize {
        let mut entries = self.write();
        let before = entries.len();
        entries.retain(|entry| {
            if entry.listener_id == listener_id {
                entry.deactivate();
                false
            } else {
                true
            }
        });
        before - entries.len()
    }

    pub fn snapshot(&self) -> Vec<Arc<Entry<N>>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn clear(&self) {
        let mut entries = self.write();
        for entry in entries.drain(..) {
            entry.deactivate();
        }
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Arc<Entry<N>>>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }
}
