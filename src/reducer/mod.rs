//! Reducers: the only code allowed to produce new scope values.
//!
//! A reducer owns one scope and optionally restricts itself to a set of
//! action types. Reducers are registered while the store is being built;
//! two reducers claiming the same action type for the same scope are a
//! configuration error.

mod reducer;
mod registry;

pub use reducer::{ActionTypes, Reducer, ReducerFn};
pub(crate) use registry::ReducerRegistry;
