//! Middleware system for the dispatch pipeline
//!
//! Middleware sits between action dispatch and reducer execution, allowing
//! side effects, validation, logging, and other cross-cutting concerns
//! to be handled in a composable way.
//!
//! ## Design
//!
//! ```text
//! Action → Middleware Chain → Reducers → State → Listeners
//! ```
//!
//! Each middleware can:
//! - Inspect actions and the current state
//! - Replace or transform the action handed to the rest of the chain
//! - Dispatch new actions (they start a fresh trip through the chain)
//! - Block actions by never calling [`Next::run`]

mod middleware;

pub use middleware::{middleware_fn, FnMiddleware, LoggingMiddleware, Middleware, Next};
pub(crate) use middleware::run_chain;
