use super::notifier::Notifier;
use super::store::Store;
use crate::error::Result;
use crate::listener::DefaultFilter;
use crate::middleware::Middleware;
use crate::reducer::{Reducer, ReducerRegistry};
use crate::runtime;
use crate::state::State;

/// Where listeners run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NotificationMode {
    /// On the dispatching thread, before `dispatch` returns.
    #[default]
    Inline,
    /// On a dedicated thread owned by the store.
    ///
    /// Each listener still sees changes in dispatch order.
    Background,
}

/// Store-wide settings.
#[derive(Debug, Clone, Default)]
pub struct StoreConfig {
    pub notification_mode: NotificationMode,
    /// Filter for subscriptions registered without one.
    pub default_filter: DefaultFilter,
}

/// Assembles a [`Store`] from reducers, middleware and configuration.
///
/// ```
/// use scopestore::{Action, LoggingMiddleware, ReducerFn, State, Store};
///
/// let store = Store::builder()
///     .reducer(ReducerFn::new("counter", 0i64, |n: &i64, _: &Action| Some(n + 1)).on(["INCREMENT"]))
///     .unwrap()
///     .middleware(LoggingMiddleware::new())
///     .initial_state(State::new().with("counter", 10i64))
///     .build()
///     .unwrap();
///
/// store.dispatch(Action::new("INCREMENT")).unwrap();
/// assert_eq!(*store.state_as::<i64>("counter").unwrap(), 11);
/// ```
pub struct StoreBuilder {
    pub(super) initial_state: State,
    pub(super) reducers: ReducerRegistry,
    pub(super) middleware: Vec<Box<dyn Middleware>>,
    pub(super) config: StoreConfig,
}

impl StoreBuilder {
    pub fn new() -> Self {
        Self {
            initial_state: State::new(),
            reducers: ReducerRegistry::new(),
            middleware: Vec::new(),
            config: StoreConfig::default(),
        }
    }

    /// Scopes overriding the reducers' initial values.
    pub fn initial_state(mut self, state: State) -> Self {
        self.initial_state = state;
        self
    }

    /// Register a reducer.
    ///
    /// Fails if another reducer already handles one of its action types for
    /// the same scope.
    pub fn reducer<R: Reducer>(mut self, reducer: R) -> Result<Self> {
        self.reducers.register(reducer)?;
        Ok(self)
    }

    /// Append middleware. Middleware runs in the order it was added.
    pub fn middleware<M: Middleware>(mut self, middleware: M) -> Self {
        self.middleware.push(Box::new(middleware));
        self
    }

    pub fn config(mut self, config: StoreConfig) -> Self {
        self.config = config;
        self
    }

    pub fn notification_mode(mut self, mode: NotificationMode) -> Self {
        self.config.notification_mode = mode;
        self
    }

    pub fn default_filter(mut self, filter: DefaultFilter) -> Self {
        self.config.default_filter = filter;
        self
    }

    pub fn build(self) -> Result<Store> {
        let id = runtime::next_store_id();
        let notifier = match self.config.notification_mode {
            NotificationMode::Inline => Notifier::Inline,
            NotificationMode::Background => Notifier::background(format!("scopestore-{}", id))?,
        };
        Ok(Store::assemble(id, self, notifier))
    }
}

impl Default for StoreBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Action;
    use crate::error::StoreError;
    use crate::reducer::ReducerFn;

    #[test]
    fn initial_state_overrides_reducer_defaults() {
        let store = StoreBuilder::new()
            .reducer(ReducerFn::new("a", 1i32, |_: &i32, _: &Action| None))
            .unwrap()
            .reducer(ReducerFn::new("b", 2i32, |_: &i32, _: &Action| None))
            .unwrap()
            .initial_state(State::new().with("b", 20i32).with("c", 30i32))
            .build()
            .unwrap();

        let state = store.state();
        assert_eq!(state.get_as::<i32>("a"), Some(&1));
        assert_eq!(state.get_as::<i32>("b"), Some(&20));
        assert_eq!(state.get_as::<i32>("c"), Some(&30));
    }

    #[test]
    fn duplicate_reducer_fails_at_registration() {
        let result = StoreBuilder::new()
            .reducer(ReducerFn::new("a", 1i32, |_: &i32, _: &Action| None).on(["X"]))
            .unwrap()
            .reducer(ReducerFn::new("a", 1i32, |_: &i32, _: &Action| None).on(["X", "Y"]));

        match result {
            Err(err) => {
                assert!(err.is_configuration());
                assert!(matches!(err, StoreError::DuplicateReducer { .. }));
            }
            Ok(_) => panic!("expected a configuration error"),
        }
    }

    #[test]
    fn config_defaults() {
        let config = StoreConfig::default();
        assert_eq!(config.notification_mode, NotificationMode::Inline);
        assert_eq!(config.default_filter, DefaultFilter::Equality);
    }
}
