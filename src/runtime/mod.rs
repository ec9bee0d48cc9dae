//! Execution context of the dispatch pipeline.
//!
//! Tracks which stores are reducing on the current thread so that a reducer
//! dispatching synchronously into its own store can be rejected.

mod context;

pub(crate) use context::{is_reducing, next_store_id, ReducingScope};
