use std::fmt;
use std::ptr;
use std::sync::Arc;

/// Decides whether a change from `old` to `new` is worth a notification.
///
/// Filters see values at the granularity the subscription selected: the
/// scope value for keyed subscriptions, the projected value for projections
/// and the whole snapshot for all-state subscriptions.
pub struct Filter<E: ?Sized> {
    predicate: Arc<dyn Fn(&E, &E) -> bool + Send + Sync>,
}

impl<E: ?Sized + 'static> Filter<E> {
    /// Create a filter from a predicate returning `true` to notify.
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&E, &E) -> bool + Send + Sync + 'static,
    {
        Self {
            predicate: Arc::new(predicate),
        }
    }

    /// Notify on every change, even to an equal value.
    pub fn always() -> Self {
        Self::new(|_: &E, _: &E| true)
    }

    /// Notify when the value was replaced by another allocation.
    ///
    /// Projections produce a fresh value on every pass, so for them this
    /// behaves like [`Filter::always`].
    pub fn identity_changed() -> Self {
        Self::new(|old: &E, new: &E| !ptr::addr_eq(old, new))
    }

    pub fn matches(&self, old: &E, new: &E) -> bool {
        (self.predicate)(old, new)
    }
}

impl<E: PartialEq + ?Sized + 'static> Filter<E> {
    /// Notify when the value is no longer equal to the previous one.
    pub fn changed() -> Self {
        Self::new(|old: &E, new: &E| old != new)
    }
}

impl<E: ?Sized> Clone for Filter<E> {
    fn clone(&self) -> Self {
        Self {
            predicate: Arc::clone(&self.predicate),
        }
    }
}

impl<E: ?Sized> fmt::Debug for Filter<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Filter").finish_non_exhaustive()
    }
}

/// Filter used by subscriptions registered without one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DefaultFilter {
    /// Notify when the new value is not equal to the old one.
    #[default]
    Equality,
    /// Notify when the value was replaced, even by an equal one.
    Identity,
    /// Notify whenever the subscription matches.
    Always,
}

impl DefaultFilter {
    /// Build the filter for a value type compared with `equal`.
    pub(crate) fn resolve<E: ?Sized + 'static>(self, equal: fn(&E, &E) -> bool) -> Filter<E> {
        match self {
            DefaultFilter::Equality => Filter::new(move |old: &E, new: &E| !equal(old, new)),
            DefaultFilter::Identity => Filter::identity_changed(),
            DefaultFilter::Always => Filter::always(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn changed_compares_values() {
        let filter = Filter::<i32>::changed();
        assert!(filter.matches(&1, &2));
        assert!(!filter.matches(&1, &1));
    }

    #[test]
    fn identity_compares_addresses() {
        let filter = Filter::<String>::identity_changed();
        let a = "x".to_string();
        let b = "x".to_string();
        assert!(filter.matches(&a, &b));
        assert!(!filter.matches(&a, &a));
    }

    #[test]
    fn default_filter_resolution() {
        let equal: fn(&i32, &i32) -> bool = |a, b| a == b;

        let equality = DefaultFilter::Equality.resolve(equal);
        assert!(!equality.matches(&3, &3));
        assert!(equality.matches(&3, &4));

        let always = DefaultFilter::Always.resolve(equal);
        assert!(always.matches(&3, &3));
    }
}
