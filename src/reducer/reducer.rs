use crate::action::Action;
use crate::state::{Scope, StateValue};
use std::any;
use std::borrow::Cow;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// The action types a reducer responds to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ActionTypes {
    /// Every action.
    #[default]
    All,
    /// Only the listed action types.
    Only(BTreeSet<String>),
}

impl ActionTypes {
    /// Restrict to the given action types.
    pub fn only<I, T>(types: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        ActionTypes::Only(types.into_iter().map(Into::into).collect())
    }

    pub fn contains(&self, action_type: &str) -> bool {
        match self {
            ActionTypes::All => true,
            ActionTypes::Only(types) => types.contains(action_type),
        }
    }

    /// First action type claimed by both sets, if any.
    pub(crate) fn overlap(&self, other: &ActionTypes) -> Option<String> {
        match (self, other) {
            (ActionTypes::Only(a), ActionTypes::Only(b)) => a.intersection(b).next().cloned(),
            (ActionTypes::Only(types), ActionTypes::All)
            | (ActionTypes::All, ActionTypes::Only(types)) => types.iter().next().cloned(),
            (ActionTypes::All, ActionTypes::All) => Some("*".to_string()),
        }
    }
}

impl fmt::Display for ActionTypes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionTypes::All => f.write_str("*"),
            ActionTypes::Only(types) => {
                let types: Vec<&str> = types.iter().map(String::as_str).collect();
                write!(f, "{}", types.join("|"))
            }
        }
    }
}

/// Pure update logic for a single scope.
///
/// `reduce` receives the scope's current value and returns `Some(next)` to
/// replace it or `None` to leave it untouched. Reducers run while the store
/// is reducing and must not dispatch synchronously.
///
/// ```
/// use scopestore::{Action, ActionTypes, Reducer};
///
/// struct Counter;
///
/// impl Reducer for Counter {
///     type State = i64;
///
///     fn key(&self) -> &str {
///         "counter"
///     }
///
///     fn initial_state(&self) -> i64 {
///         0
///     }
///
///     fn action_types(&self) -> ActionTypes {
///         ActionTypes::only(["INCREMENT"])
///     }
///
///     fn reduce(&self, count: &i64, _action: &Action) -> Option<i64> {
///         Some(count + 1)
///     }
/// }
/// ```
pub trait Reducer: Send + Sync + 'static {
    /// Type of the scope value.
    type State: StateValue;

    /// Key of the scope this reducer owns.
    fn key(&self) -> &str;

    /// Value of the scope before any action has been reduced.
    fn initial_state(&self) -> Self::State;

    /// Action types this reducer responds to. Defaults to all.
    fn action_types(&self) -> ActionTypes {
        ActionTypes::All
    }

    /// Compute the next scope value, or `None` if nothing changes.
    fn reduce(&self, state: &Self::State, action: &Action) -> Option<Self::State>;
}

/// Outcome of running a reducer against a type-erased scope value.
pub(crate) enum Reduced {
    Changed(Arc<dyn StateValue>),
    Unchanged,
    TypeMismatch { expected: &'static str },
}

/// Object-safe view of a [`Reducer`] used by the registry.
pub(crate) trait AnyReducer: Send + Sync {
    fn initial_value(&self) -> Arc<dyn StateValue>;

    fn reduce_value(&self, state: &dyn StateValue, action: &Action) -> Reduced;
}

impl<R: Reducer> AnyReducer for R {
    fn initial_value(&self) -> Arc<dyn StateValue> {
        Arc::new(self.initial_state())
    }

    fn reduce_value(&self, state: &dyn StateValue, action: &Action) -> Reduced {
        let Some(state) = state.downcast_ref::<R::State>() else {
            return Reduced::TypeMismatch {
                expected: any::type_name::<R::State>(),
            };
        };
        match self.reduce(state, action) {
            Some(next) => Reduced::Changed(Arc::new(next)),
            None => Reduced::Unchanged,
        }
    }
}

/// A [`Reducer`] built from a closure.
///
/// ```
/// use scopestore::{Action, ReducerFn};
///
/// let counter = ReducerFn::new("counter", 0i64, |count: &i64, _action: &Action| Some(count + 1))
///     .on(["INCREMENT"]);
/// ```
pub struct ReducerFn<S, F> {
    key: Cow<'static, str>,
    initial: S,
    action_types: ActionTypes,
    reduce: F,
}

impl<S, F> ReducerFn<S, F>
where
    S: StateValue + Clone,
    F: Fn(&S, &Action) -> Option<S> + Send + Sync + 'static,
{
    /// Create a reducer for `key` responding to every action.
    pub fn new(key: impl Into<Cow<'static, str>>, initial: S, reduce: F) -> Self {
        Self {
            key: key.into(),
            initial,
            action_types: ActionTypes::All,
            reduce,
        }
    }

    /// Restrict the reducer to the given action types.
    pub fn on<I, T>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.action_types = ActionTypes::only(types);
        self
    }
}

impl<S, F> ReducerFn<S, F>
where
    S: Scope + Clone,
    F: Fn(&S, &Action) -> Option<S> + Send + Sync + 'static,
{
    /// Create a reducer for the scope owned by `S`.
    pub fn scoped(initial: S, reduce: F) -> Self {
        Self::new(S::KEY, initial, reduce)
    }
}

impl<S, F> Reducer for ReducerFn<S, F>
where
    S: StateValue + Clone,
    F: Fn(&S, &Action) -> Option<S> + Send + Sync + 'static,
{
    type State = S;

    fn key(&self) -> &str {
        &self.key
    }

    fn initial_state(&self) -> S {
        self.initial.clone()
    }

    fn action_types(&self) -> ActionTypes {
        self.action_types.clone()
    }

    fn reduce(&self, state: &S, action: &Action) -> Option<S> {
        (self.reduce)(state, action)
    }
}
