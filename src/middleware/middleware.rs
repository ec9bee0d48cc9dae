use crate::action::Action;
use crate::store::Store;
use log::Level;

/// Middleware trait - handles actions before they reach the reducers
///
/// Middleware is called in registration order for each action. Calling
/// `next.run(action)` hands the (possibly replaced) action to the next
/// middleware; dropping `next` suppresses the action, which is not an error.
///
/// # Example
///
/// ```
/// use scopestore::{Action, Middleware, Next, Store};
///
/// struct DropEmptyNames;
///
/// impl Middleware for DropEmptyNames {
///     fn on_action(&self, action: Action, _store: &Store, next: Next<'_>) {
///         match action.payload::<String>() {
///             Some(name) if name.is_empty() => {}
///             _ => next.run(action),
///         }
///     }
/// }
/// ```
pub trait Middleware: Send + Sync + 'static {
    /// Handle an action before it reaches the reducers
    ///
    /// # Parameters
    /// - `action`: The action being dispatched
    /// - `store`: The store, for reading state or dispatching follow-up actions
    /// - `next`: Continuation into the rest of the chain
    fn on_action(&self, action: Action, store: &Store, next: Next<'_>);
}

/// The remainder of a middleware chain.
///
/// Consumed by [`Next::run`], so an action is forwarded at most once.
pub struct Next<'a> {
    rest: &'a [Box<dyn Middleware>],
    store: &'a Store,
    outcome: &'a mut Option<Action>,
}

impl Next<'_> {
    /// Forward `action` to the next middleware, or to the reducers at the end
    /// of the chain.
    pub fn run(self, action: Action) {
        match self.rest.split_first() {
            Some((head, rest)) => head.on_action(
                action,
                self.store,
                Next {
                    rest,
                    store: self.store,
                    outcome: self.outcome,
                },
            ),
            None => *self.outcome = Some(action),
        }
    }
}

/// Run `action` through `chain`.
///
/// Returns the action that reached the end of the chain, or `None` if some
/// middleware suppressed it.
pub(crate) fn run_chain(
    chain: &[Box<dyn Middleware>],
    store: &Store,
    action: Action,
) -> Option<Action> {
    let mut outcome = None;
    Next {
        rest: chain,
        store,
        outcome: &mut outcome,
    }
    .run(action);
    outcome
}

/// Middleware built from a closure, see [`middleware_fn`].
pub struct FnMiddleware<F>(F);

impl<F> Middleware for FnMiddleware<F>
where
    F: Fn(Action, &Store, Next<'_>) + Send + Sync + 'static,
{
    fn on_action(&self, action: Action, store: &Store, next: Next<'_>) {
        (self.0)(action, store, next)
    }
}

/// Wrap a closure as middleware.
///
/// ```
/// use scopestore::{middleware_fn, Action, Store};
///
/// let uppercase = middleware_fn(|action: Action, _store: &Store, next| {
///     let renamed = Action::new(action.action_type().to_uppercase());
///     next.run(renamed);
/// });
/// let store = Store::builder().middleware(uppercase).build().unwrap();
/// store.dispatch(Action::new("increment")).unwrap();
/// ```
pub fn middleware_fn<F>(f: F) -> FnMiddleware<F>
where
    F: Fn(Action, &Store, Next<'_>) + Send + Sync + 'static,
{
    FnMiddleware(f)
}

/// LoggingMiddleware - logs all actions that pass through the store
///
/// Always forwards the action unchanged.
pub struct LoggingMiddleware {
    level: Level,
}

impl LoggingMiddleware {
    pub fn new() -> Self {
        Self::with_level(Level::Debug)
    }

    pub fn with_level(level: Level) -> Self {
        Self { level }
    }
}

impl Default for LoggingMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

impl Middleware for LoggingMiddleware {
    fn on_action(&self, action: Action, _store: &Store, next: Next<'_>) {
        log::log!(self.level, "Action: {:?}", action);
        next.run(action);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    struct Recorder {
        name: &'static str,
        seen: Arc<Mutex<Vec<String>>>,
    }

    impl Middleware for Recorder {
        fn on_action(&self, action: Action, _store: &Store, next: Next<'_>) {
            self.seen
                .lock()
                .unwrap()
                .push(format!("{}:{}", self.name, action.action_type()));
            next.run(action);
        }
    }

    struct Block;

    impl Middleware for Block {
        fn on_action(&self, _action: Action, _store: &Store, _next: Next<'_>) {}
    }

    #[test]
    fn chain_runs_in_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let chain: Vec<Box<dyn Middleware>> = vec![
            Box::new(Recorder {
                name: "first",
                seen: seen.clone(),
            }),
            Box::new(Recorder {
                name: "second",
                seen: seen.clone(),
            }),
        ];
        let store = Store::new(Default::default());

        let outcome = run_chain(&chain, &store, Action::new("PING"));

        assert_eq!(outcome.unwrap().action_type(), "PING");
        assert_eq!(*seen.lock().unwrap(), vec!["first:PING", "second:PING"]);
    }

    #[test]
    fn blocking_middleware_stops_the_chain() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let chain: Vec<Box<dyn Middleware>> = vec![
            Box::new(Block),
            Box::new(Recorder {
                name: "after",
                seen: seen.clone(),
            }),
        ];
        let store = Store::new(Default::default());

        assert!(run_chain(&chain, &store, Action::new("PING")).is_none());
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn middleware_can_replace_the_action() {
        let chain: Vec<Box<dyn Middleware>> = vec![
            Box::new(middleware_fn(|_action: Action, _store: &Store, next: Next<'_>| {
                next.run(Action::with_payload("REPLACED", 7u8))
            })),
            Box::new(LoggingMiddleware::new()),
        ];
        let store = Store::new(Default::default());

        let outcome = run_chain(&chain, &store, Action::new("ORIGINAL")).unwrap();
        assert_eq!(outcome.action_type(), "REPLACED");
        assert_eq!(outcome.payload::<u8>(), Some(&7));
    }

    #[test]
    fn empty_chain_passes_through() {
        let store = Store::new(Default::default());
        let outcome = run_chain(&[], &store, Action::new("PING"));
        assert_eq!(outcome.unwrap().action_type(), "PING");
    }
}
