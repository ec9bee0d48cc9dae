use super::builder::StoreBuilder;
use super::notifier::{panic_message, Delivery, Notifier};
use super::queue::{DispatchQueue, Job};
use super::subscription::Subscription;
use crate::action::Action;
use crate::error::{Result, StoreError};
use crate::listener::{
    DefaultFilter, Entry, Listener, ListenerConfig, ListenerRegistry, Notify, Selector,
    StateListener,
};
use crate::middleware::{self, Middleware};
use crate::reducer::ReducerRegistry;
use crate::runtime::{self, ReducingScope};
use crate::state::{Scope, State, StateValue};
use log::{debug, error, trace};
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

pub(crate) struct StoreInner {
    id: usize,
    state: RwLock<Arc<State>>,
    reducers: ReducerRegistry,
    middleware: Vec<Box<dyn Middleware>>,
    pub(super) listeners: ListenerRegistry<dyn Notify>,
    pub(super) action_listeners: ListenerRegistry<Listener<Action>>,
    queue: Mutex<DispatchQueue>,
    notifier: Notifier,
    default_filter: DefaultFilter,
}

impl StoreInner {
    pub(super) fn current_state(&self) -> Arc<State> {
        Arc::clone(&self.state.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Replay the current state to one subscription through the notifier.
    pub(super) fn inform(&self, entry: Arc<Entry<dyn Notify>>) {
        self.notifier.deliver(Delivery::Inform {
            entry,
            state: self.current_state(),
        });
    }

    fn queue(&self) -> MutexGuard<'_, DispatchQueue> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A thread-safe store holding the application state.
///
/// The Store follows the Redux pattern:
/// - Centralized state, split into scopes
/// - Actions are dispatched through middleware to the reducers
/// - Reducers produce a new immutable snapshot
/// - Listeners are notified about the parts of the state they selected
///
/// Dispatches are serialized: one caller at a time runs the pipeline and
/// works off actions queued by everyone else (including listeners and
/// middleware) in arrival order. Readers always see a complete snapshot.
///
/// Cloning a store yields another handle to the same state.
///
/// # Example
///
/// ```
/// use scopestore::{Action, ReducerFn, Store};
/// use std::sync::{Arc, Mutex};
///
/// let store = Store::builder()
///     .reducer(ReducerFn::new("counter", 0i64, |n: &i64, _: &Action| Some(n + 1)).on(["INCREMENT"]))
///     .unwrap()
///     .build()
///     .unwrap();
///
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let sink = seen.clone();
/// store
///     .add_typed_listener("counter", move |count: &i64| sink.lock().unwrap().push(*count))
///     .unwrap();
///
/// store.dispatch(Action::new("INCREMENT")).unwrap();
/// store.dispatch(Action::new("INCREMENT")).unwrap();
/// assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
/// ```
pub struct Store {
    inner: Arc<StoreInner>,
}

impl Store {
    /// Create a store without reducers or middleware.
    pub fn new(initial: State) -> Self {
        let builder = StoreBuilder::new().initial_state(initial);
        Self::assemble(runtime::next_store_id(), builder, Notifier::Inline)
    }

    pub fn builder() -> StoreBuilder {
        StoreBuilder::new()
    }

    pub(super) fn assemble(id: usize, builder: StoreBuilder, notifier: Notifier) -> Self {
        let StoreBuilder {
            initial_state,
            reducers,
            middleware,
            config,
        } = builder;

        let mut state = reducers.initial_state();
        state.merge(&initial_state);
        debug!(
            "store {} created with {} scopes, {} reducers, {} middleware",
            id,
            state.len(),
            reducers.len(),
            middleware.len()
        );

        Self {
            inner: Arc::new(StoreInner {
                id,
                state: RwLock::new(Arc::new(state)),
                reducers,
                middleware,
                listeners: ListenerRegistry::new(),
                action_listeners: ListenerRegistry::new(),
                queue: Mutex::new(DispatchQueue::default()),
                notifier,
                default_filter: config.default_filter,
            }),
        }
    }

    /// Get the current state snapshot.
    pub fn state(&self) -> Arc<State> {
        self.inner.current_state()
    }

    /// Get the value of the scope under `key`.
    pub fn state_of(&self, key: &str) -> Option<Arc<dyn StateValue>> {
        self.state().value(key).cloned()
    }

    /// Get the value under `key` if it is a `T`.
    pub fn state_as<T: Any + Send + Sync>(&self, key: &str) -> Option<Arc<T>> {
        let value = self.state_of(key)?;
        StateValue::into_any(value).downcast::<T>().ok()
    }

    /// Get the value of the scope owned by `T`.
    pub fn scope<T: Scope>(&self) -> Option<Arc<T>> {
        self.state_as::<T>(T::KEY)
    }

    /// Dispatch an action through the middleware chain to the reducers.
    ///
    /// If another dispatch is in progress the action is queued and processed
    /// by that caller once the actions ahead of it are done.
    ///
    /// # Errors
    ///
    /// [`StoreError::Reentrancy`] when called from inside one of this
    /// store's reducers.
    pub fn dispatch(&self, action: Action) -> Result<()> {
        if runtime::is_reducing(self.inner.id) {
            return Err(StoreError::Reentrancy {
                action_type: action.action_type().to_string(),
            });
        }
        self.enqueue(Job::Dispatch(action));
        Ok(())
    }

    /// Replace the whole state and notify every active listener.
    ///
    /// Scopes missing from `state` fall back to their reducers' initial
    /// values. Filters are skipped: every subscription whose selection is
    /// present in the new state is notified once.
    pub fn reset(&self, state: State) -> Result<()> {
        if runtime::is_reducing(self.inner.id) {
            return Err(StoreError::Reentrancy {
                action_type: "reset".to_string(),
            });
        }
        self.enqueue(Job::Reset(state));
        Ok(())
    }

    /// Register a listener for the part of the state `config` selects.
    ///
    /// # Errors
    ///
    /// [`StoreError::InvalidSelector`] when the selector can never match.
    pub fn subscribe<E>(
        &self,
        config: impl Into<ListenerConfig<E>>,
        listener: Listener<E>,
    ) -> Result<Subscription>
    where
        E: ?Sized + 'static,
    {
        let ListenerConfig { selector, filter } = config.into();
        selector
            .validate()
            .map_err(|reason| StoreError::InvalidSelector { reason })?;
        let filter =
            filter.unwrap_or_else(|| self.inner.default_filter.resolve(selector.equality()));

        debug!("store {}: listener added for {}", self.inner.id, selector);
        let listener_id = listener.id();
        let target: Box<dyn Notify> = Box::new(StateListener::new(selector, filter, listener));
        let entry = self.inner.listeners.register(listener_id, target);
        Ok(Subscription::for_state(entry, Arc::downgrade(&self.inner)))
    }

    /// Listen to every change of the state.
    pub fn add_listener<F>(&self, listener: F) -> Result<Subscription>
    where
        F: Fn(&State) + Send + Sync + 'static,
    {
        self.subscribe(Selector::all(), Listener::new(listener))
    }

    /// Listen to the scope under `key`, whatever its type.
    pub fn add_key_listener<F>(&self, key: impl Into<String>, listener: F) -> Result<Subscription>
    where
        F: Fn(&(dyn StateValue + 'static)) + Send + Sync + 'static,
    {
        self.subscribe(Selector::key(key), Listener::new(listener))
    }

    /// Listen to the scope under `key` as a `T`.
    ///
    /// Changes to a value of another type are logged and not delivered.
    pub fn add_typed_listener<T, F>(&self, key: impl Into<String>, listener: F) -> Result<Subscription>
    where
        T: StateValue + PartialEq,
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.subscribe(Selector::<T>::key_as(key), Listener::new(listener))
    }

    /// Listen to the scope owned by `T`.
    pub fn add_scope_listener<T, F>(&self, listener: F) -> Result<Subscription>
    where
        T: Scope + PartialEq,
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.subscribe(Selector::<T>::scope(), Listener::new(listener))
    }

    /// Listen to a value derived from the state.
    pub fn add_projection_listener<E, P, F>(&self, projection: P, listener: F) -> Result<Subscription>
    where
        E: PartialEq + Send + Sync + 'static,
        P: Fn(&State) -> E + Send + Sync + 'static,
        F: Fn(&E) + Send + Sync + 'static,
    {
        self.subscribe(Selector::project(projection), Listener::new(listener))
    }

    /// Register a listener receiving every dispatched action.
    ///
    /// The listener sees the action as dispatched, before middleware, even
    /// if middleware later suppresses it.
    pub fn subscribe_actions(&self, listener: Listener<Action>) -> Subscription {
        debug!("store {}: action listener added", self.inner.id);
        let entry = self
            .inner
            .action_listeners
            .register(listener.id(), Box::new(listener));
        Subscription::for_actions(entry, Arc::downgrade(&self.inner))
    }

    /// Closure form of [`Store::subscribe_actions`].
    pub fn add_action_listener<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&Action) + Send + Sync + 'static,
    {
        self.subscribe_actions(Listener::new(listener))
    }

    /// Cancel every subscription registered with `listener`.
    ///
    /// Returns whether anything was removed.
    pub fn remove_listener<E: ?Sized>(&self, listener: &Listener<E>) -> bool {
        let id = listener.id();
        let removed =
            self.inner.listeners.remove_listener(id) + self.inner.action_listeners.remove_listener(id);
        debug!("store {}: removed {} subscriptions", self.inner.id, removed);
        removed > 0
    }

    /// Number of active subscriptions, action listeners included.
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.len() + self.inner.action_listeners.len()
    }

    /// Cancel every subscription and stop the notification thread.
    ///
    /// Notifications already queued for the background thread are delivered
    /// first. The store stays usable; listeners added afterwards are notified
    /// inline.
    pub fn shutdown(&self) {
        debug!("store {}: shutting down", self.inner.id);
        self.inner.listeners.clear();
        self.inner.action_listeners.clear();
        if self.inner.notifier.close() {
            debug!("store {}: notification thread stopped", self.inner.id);
        }
    }

    fn enqueue(&self, job: Job) {
        let must_drain = {
            let mut queue = self.inner.queue();
            let must_drain = queue.push(job);
            if !must_drain {
                trace!("store {}: queued behind {} jobs", self.inner.id, queue.len() - 1);
            }
            must_drain
        };
        if must_drain {
            self.drain();
        }
    }

    fn drain(&self) {
        loop {
            let job = self.inner.queue().next();
            let Some(job) = job else { break };
            let label = job.label().to_string();
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| match job {
                Job::Dispatch(action) => self.process(action),
                Job::Reset(state) => self.apply_reset(state),
            }));
            if let Err(panic) = outcome {
                error!(
                    "store {}: `{}` panicked, state left unchanged: {}",
                    self.inner.id,
                    label,
                    panic_message(&*panic)
                );
            }
        }
    }

    fn process(&self, action: Action) {
        trace!("store {}: dispatching {:?}", self.inner.id, action);

        let action_listeners = self.inner.action_listeners.snapshot();
        if !action_listeners.is_empty() {
            self.inner.notifier.deliver(Delivery::Action {
                entries: action_listeners,
                action: action.clone(),
            });
        }

        let Some(action) = middleware::run_chain(&self.inner.middleware, self, action) else {
            debug!("store {}: action suppressed by middleware", self.inner.id);
            return;
        };

        let old = self.state();
        let next = {
            let _reducing = ReducingScope::enter(self.inner.id);
            self.inner.reducers.reduce(&old, &action)
        };
        match next {
            Some(next) => self.publish(old, Arc::new(next), false),
            None => trace!(
                "store {}: `{}` left the state unchanged",
                self.inner.id,
                action.action_type()
            ),
        }
    }

    fn apply_reset(&self, state: State) {
        let mut next = self.inner.reducers.initial_state();
        next.merge(&state);
        debug!("store {}: reset to {} scopes", self.inner.id, next.len());
        let old = self.state();
        self.publish(old, Arc::new(next), true);
    }

    /// Make `new` the current snapshot, then notify listeners.
    fn publish(&self, old: Arc<State>, new: Arc<State>, force: bool) {
        *self
            .inner
            .state
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Arc::clone(&new);

        let entries = self.inner.listeners.snapshot();
        if entries.is_empty() {
            return;
        }
        self.inner.notifier.deliver(Delivery::State {
            entries,
            old,
            new,
            force,
        });
    }
}

impl Clone for Store {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new(State::new())
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("id", &self.inner.id)
            .field("state", &self.state())
            .field("listeners", &self.listener_count())
            .finish()
    }
}
