use std::any::{self, Any};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A value that can live in a scope of a [`State`].
///
/// Implemented for every `'static` type that is `Send + Sync + PartialEq +
/// Debug`. Equality backs the default "notify only if changed" filter; the
/// type name shows up in type-mismatch warnings.
pub trait StateValue: Any + Send + Sync + fmt::Debug {
    /// View the value as `Any` for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Convert a shared value into a shared `Any` for `Arc::downcast`.
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;

    /// Compare against another scope value of possibly different type.
    fn eq_value(&self, other: &dyn StateValue) -> bool;

    /// Name of the concrete type.
    fn type_name(&self) -> &'static str;
}

impl<T> StateValue for T
where
    T: Any + Send + Sync + PartialEq + fmt::Debug,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }

    fn eq_value(&self, other: &dyn StateValue) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .is_some_and(|other| self == other)
    }

    fn type_name(&self) -> &'static str {
        any::type_name::<T>()
    }
}

impl<'a> dyn StateValue + 'a {
    /// Downcast to a concrete type.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// Whether the value is of type `T`.
    pub fn is<T: Any>(&self) -> bool {
        self.as_any().is::<T>()
    }
}

/// A type that owns a scope under a fixed key.
///
/// This is the type-derived addressing mode: the key is declared once per
/// type instead of being recovered through reflection, so two unrelated
/// types sharing a name never collide.
///
/// ```
/// use scopestore::{Scope, State};
///
/// #[derive(Debug, Clone, PartialEq)]
/// struct Session {
///     user: String,
/// }
///
/// impl Scope for Session {
///     const KEY: &'static str = "session";
/// }
///
/// let mut state = State::new();
/// state.insert_scope(Session { user: "ada".into() });
/// assert_eq!(state.get_scope::<Session>().unwrap().user, "ada");
/// assert!(state.contains_key("session"));
/// ```
pub trait Scope: StateValue + Sized {
    /// Key of the scope holding values of this type.
    const KEY: &'static str;
}

/// An immutable snapshot of the whole application state.
#[derive(Clone, Default)]
pub struct State {
    scopes: HashMap<String, Arc<dyn StateValue>>,
}

impl State {
    /// Create an empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`State::insert`].
    pub fn with<T: StateValue>(mut self, key: impl Into<String>, value: T) -> Self {
        self.insert(key, value);
        self
    }

    /// Builder-style [`State::insert_scope`].
    pub fn with_scope<T: Scope>(mut self, value: T) -> Self {
        self.insert_scope(value);
        self
    }

    /// Get the value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&(dyn StateValue + 'static)> {
        self.scopes.get(key).map(|value| &**value)
    }

    /// Get the value stored under `key` if it is a `T`.
    ///
    /// A value of any other type reads as absent.
    pub fn get_as<T: Any>(&self, key: &str) -> Option<&T> {
        self.get(key)?.downcast_ref::<T>()
    }

    /// Get the value of the scope owned by `T`.
    pub fn get_scope<T: Scope>(&self) -> Option<&T> {
        self.get_as::<T>(T::KEY)
    }

    /// Insert or overwrite the value under `key`.
    pub fn insert<T: StateValue>(&mut self, key: impl Into<String>, value: T) {
        self.scopes.insert(key.into(), Arc::new(value));
    }

    /// Insert or overwrite the scope owned by `T`.
    pub fn insert_scope<T: Scope>(&mut self, value: T) {
        self.insert(T::KEY, value);
    }

    /// Iterate over the scope keys.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.scopes.keys().map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.scopes.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    pub(crate) fn value(&self, key: &str) -> Option<&Arc<dyn StateValue>> {
        self.scopes.get(key)
    }

    pub(crate) fn update(&mut self, key: impl Into<String>, value: Arc<dyn StateValue>) {
        self.scopes.insert(key.into(), value);
    }

    /// Overlay every scope of `other` onto this state.
    pub(crate) fn merge(&mut self, other: &State) {
        for (key, value) in &other.scopes {
            self.scopes.insert(key.clone(), Arc::clone(value));
        }
    }

    /// Whether `key` holds the same allocation in both snapshots.
    pub(crate) fn same_value(&self, other: &State, key: &str) -> bool {
        match (self.value(key), other.value(key)) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }
}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        self.scopes.len() == other.scopes.len()
            && self.scopes.iter().all(|(key, value)| {
                other
                    .scopes
                    .get(key)
                    .is_some_and(|other| Arc::ptr_eq(value, other) || value.eq_value(&**other))
            })
    }
}

impl fmt::Debug for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.scopes.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Profile {
        name: String,
    }

    impl Scope for Profile {
        const KEY: &'static str = "profile";
    }

    #[test]
    fn get_by_key_and_type() {
        let state = State::new().with("counter", 1i32);

        assert!(state.get("counter").is_some());
        assert_eq!(state.get_as::<i32>("counter"), Some(&1));
        assert_eq!(state.get_as::<String>("counter"), None);
        assert!(state.get("missing").is_none());
    }

    #[test]
    fn type_derived_keys() {
        let mut state = State::new();
        state.insert_scope(Profile {
            name: "ada".to_string(),
        });

        assert_eq!(state.get_scope::<Profile>().unwrap().name, "ada");
        assert_eq!(state.keys().collect::<Vec<_>>(), vec!["profile"]);
    }

    #[test]
    fn copy_does_not_touch_original() {
        let original = State::new().with("counter", 1i32);
        let mut copy = original.clone();
        copy.insert("counter", 2i32);
        copy.insert("other", "x".to_string());

        assert_eq!(original.get_as::<i32>("counter"), Some(&1));
        assert_eq!(original.len(), 1);
        assert_eq!(copy.get_as::<i32>("counter"), Some(&2));
        assert_eq!(copy.len(), 2);
    }

    #[test]
    fn equality_compares_contents() {
        let a = State::new().with("counter", 1i32).with("name", "x".to_string());
        let b = State::new().with("name", "x".to_string()).with("counter", 1i32);
        let c = State::new().with("counter", 1u32).with("name", "x".to_string());

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, State::new());
    }

    #[test]
    fn same_value_tracks_allocations() {
        let a = State::new().with("counter", 1i32);
        let mut b = a.clone();
        assert!(a.same_value(&b, "counter"));
        assert!(a.same_value(&b, "missing"));

        b.insert("counter", 1i32);
        assert!(!a.same_value(&b, "counter"));
    }

    #[test]
    fn merge_overlays_scopes() {
        let mut base = State::new().with("a", 1i32).with("b", 2i32);
        base.merge(&State::new().with("b", 20i32).with("c", 30i32));

        assert_eq!(base.get_as::<i32>("a"), Some(&1));
        assert_eq!(base.get_as::<i32>("b"), Some(&20));
        assert_eq!(base.get_as::<i32>("c"), Some(&30));
    }
}
