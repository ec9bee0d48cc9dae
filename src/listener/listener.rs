use super::filter::Filter;
use super::selector::Selector;
use std::fmt;
use std::sync::Arc;

/// A callback receiving selected values.
///
/// Clones share identity, which is what
/// [`Store::remove_listener`](crate::Store::remove_listener) matches on.
pub struct Listener<E: ?Sized> {
    callback: Arc<dyn Fn(&E) + Send + Sync>,
}

impl<E: ?Sized + 'static> Listener<E> {
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        Self {
            callback: Arc::new(callback),
        }
    }
}

impl<E: ?Sized> Listener<E> {
    pub(crate) fn call(&self, value: &E) {
        (self.callback)(value)
    }

    /// Identity of the underlying callback.
    pub(crate) fn id(&self) -> usize {
        Arc::as_ptr(&self.callback) as *const () as usize
    }
}

impl<E: ?Sized> Clone for Listener<E> {
    fn clone(&self) -> Self {
        Self {
            callback: Arc::clone(&self.callback),
        }
    }
}

impl<E: ?Sized> fmt::Debug for Listener<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Listener").field(&self.id()).finish()
    }
}

/// Everything a subscription needs besides its callback.
///
/// Without an explicit filter the store's [`DefaultFilter`](super::DefaultFilter)
/// applies.
///
/// ```
/// use scopestore::{Filter, ListenerConfig, Selector};
///
/// let config = ListenerConfig::new(Selector::<i64>::key_as("counter"))
///     .filter(Filter::new(|old: &i64, new: &i64| new > old));
/// ```
pub struct ListenerConfig<E: ?Sized> {
    pub(crate) selector: Selector<E>,
    pub(crate) filter: Option<Filter<E>>,
}

impl<E: ?Sized> ListenerConfig<E> {
    pub fn new(selector: Selector<E>) -> Self {
        Self {
            selector,
            filter: None,
        }
    }

    /// Replace the default filter for this subscription.
    pub fn filter(mut self, filter: Filter<E>) -> Self {
        self.filter = Some(filter);
        self
    }
}

impl<E: ?Sized> From<Selector<E>> for ListenerConfig<E> {
    fn from(selector: Selector<E>) -> Self {
        Self::new(selector)
    }
}

impl<E: ?Sized> Clone for ListenerConfig<E> {
    fn clone(&self) -> Self {
        Self {
            selector: self.selector.clone(),
            filter: self.filter.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn clones_share_identity() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        let listener = Listener::new(move |value: &i32| {
            calls_clone.fetch_add(*value as usize, Ordering::SeqCst);
        });
        let other = Listener::new(|_: &i32| {});

        assert_eq!(listener.id(), listener.clone().id());
        assert_ne!(listener.id(), other.id());

        listener.clone().call(&2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
