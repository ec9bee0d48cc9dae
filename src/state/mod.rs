//! Keyed state snapshots.
//!
//! A [`State`] maps scope keys to immutable values. Every value is shared
//! behind an `Arc`, so copying a snapshot is shallow and replacing a scope in
//! the copy never touches the original.

mod state;

pub use state::{Scope, State, StateValue};
