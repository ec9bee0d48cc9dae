//! # Scopestore
//!
//! An in-process observable state store for Rust.
//!
//! Scopestore keeps application state as an immutable snapshot split into
//! named scopes and changes it only through dispatched actions:
//!
//! ## Dispatch pipeline
//!
//! - `Action` - A message with a type and an optional payload
//! - `Middleware` - Intercepts, replaces or suppresses actions before reducers run
//! - `Reducer` - Produces the next value of one scope, or reports no change
//!
//! ## Observation
//!
//! - `Store::subscribe` - Listen to the whole state, a scope, or a projection
//! - `Filter` - Decides whether a change is worth a notification
//! - `Subscription` - Cancel, resume or replay a listener
//!
//! ```
//! use scopestore::{Action, ReducerFn, Store};
//!
//! let store = Store::builder()
//!     .reducer(ReducerFn::new("counter", 0i64, |n: &i64, _: &Action| Some(n + 1)).on(["INCREMENT"]))
//!     .unwrap()
//!     .build()
//!     .unwrap();
//!
//! store.add_typed_listener("counter", |count: &i64| println!("counter = {}", count)).unwrap();
//! store.dispatch(Action::new("INCREMENT")).unwrap();
//! ```

pub mod action;
pub mod error;
pub mod listener;
pub mod middleware;
pub mod reducer;
pub mod state;
pub mod store;

mod runtime;

// Re-export main types for convenience
pub use action::Action;
pub use error::{Result, StoreError};
pub use listener::{DefaultFilter, Filter, Listener, ListenerConfig, Selector};
pub use middleware::{middleware_fn, FnMiddleware, LoggingMiddleware, Middleware, Next};
pub use reducer::{ActionTypes, Reducer, ReducerFn};
pub use state::{Scope, State, StateValue};
pub use store::{NotificationMode, Store, StoreBuilder, StoreConfig, Subscription};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_works() {
        // Basic smoke test
        let store = Store::new(State::new().with("greeting", "hello".to_string()));
        assert_eq!(store.state_as::<String>("greeting").unwrap().as_str(), "hello");
        store.dispatch(Action::new("ANYTHING")).unwrap();
        assert_eq!(store.state().len(), 1);
    }
}
