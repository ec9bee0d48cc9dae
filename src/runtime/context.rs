use std::cell::RefCell;
use std::sync::atomic::{AtomicUsize, Ordering};

static NEXT_STORE_ID: AtomicUsize = AtomicUsize::new(0);

// Thread-local stack of stores currently running reducers.
thread_local! {
    static REDUCING: RefCell<Vec<usize>> = const { RefCell::new(Vec::new()) };
}

/// Generate a unique ID for a new store.
pub(crate) fn next_store_id() -> usize {
    NEXT_STORE_ID.fetch_add(1, Ordering::SeqCst)
}

/// Whether the store with `store_id` is reducing on this thread.
pub(crate) fn is_reducing(store_id: usize) -> bool {
    REDUCING.with(|stack| stack.borrow().contains(&store_id))
}

/// Marks a store as reducing on this thread until dropped.
///
/// The mark is removed on unwind as well, so a panicking reducer does not
/// leave the store locked in the reducing phase.
pub(crate) struct ReducingScope {
    store_id: usize,
}

impl ReducingScope {
    pub(crate) fn enter(store_id: usize) -> Self {
        REDUCING.with(|stack| stack.borrow_mut().push(store_id));
        Self { store_id }
    }
}

impl Drop for ReducingScope {
    fn drop(&mut self) {
        REDUCING.with(|stack| {
            let mut stack = stack.borrow_mut();
            if let Some(pos) = stack.iter().rposition(|id| *id == self.store_id) {
                stack.remove(pos);
            }
        });
    }
}
