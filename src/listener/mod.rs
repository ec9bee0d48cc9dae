//! Subscriptions: selectors, filters and listener callbacks.
//!
//! A subscription is matched against every state transition in two steps:
//!
//! 1. The [`Selector`] decides whether its part of the state was touched.
//!    Keyed selectors compare the scope's allocation in the old and new
//!    snapshot; all-state and projection selectors match any transition.
//! 2. The [`Filter`] compares the old and new selected values and decides
//!    whether the change is worth a notification.
//!
//! A value whose runtime type differs from the one a typed selector expects
//! is never delivered; the mismatch is logged as a warning instead.

mod filter;
mod listener;
mod registry;
mod selector;

pub use filter::{DefaultFilter, Filter};
pub use listener::{Listener, ListenerConfig};
pub use selector::Selector;

pub(crate) use registry::{Entry, ListenerRegistry, Notify, StateListener};
