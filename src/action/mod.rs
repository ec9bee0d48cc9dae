//! Actions describing intended state changes.

mod action;

pub use action::Action;
