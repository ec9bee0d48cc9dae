//! The store: state ownership, the dispatch pipeline and notification.
//!
//! ```text
//! dispatch(action) ─► action listeners
//!                  └► middleware chain ─► reducers ─► new snapshot ─► state listeners
//! ```
//!
//! Only one dispatch runs the pipeline at a time. Actions dispatched while
//! it runs, from listeners, middleware or other threads, are queued and
//! processed in arrival order by the thread already draining the queue.

mod builder;
mod notifier;
mod queue;
mod store;
mod subscription;

pub use builder::{NotificationMode, StoreBuilder, StoreConfig};
pub use store::Store;
pub use subscription::Subscription;
