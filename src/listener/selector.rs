use crate::state::{Scope, State, StateValue};
use std::any;
use std::fmt;
use std::sync::Arc;

/// What a selector found in a snapshot.
pub(crate) enum Selection<E: ?Sized> {
    Found(Arc<E>),
    Absent,
    Mismatch {
        key: String,
        expected: &'static str,
        actual: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Target {
    All,
    Key(String),
    Projection,
}

/// Which part of the state a subscription is interested in.
///
/// | constructor | listener receives |
/// |---|---|
/// | [`Selector::all`] | the whole [`State`] |
/// | [`Selector::key`] | the raw scope value |
/// | [`Selector::scope`] | the scope owned by a [`Scope`] type |
/// | [`Selector::key_as`] | the scope under a key, if it has the given type |
/// | [`Selector::project`] | a value derived from the whole state |
pub struct Selector<E: ?Sized> {
    target: Target,
    select: Arc<dyn Fn(&Arc<State>) -> Selection<E> + Send + Sync>,
    equal: fn(&E, &E) -> bool,
}

impl Selector<State> {
    /// Select the whole state.
    pub fn all() -> Self {
        Self {
            target: Target::All,
            select: Arc::new(|state: &Arc<State>| Selection::Found(Arc::clone(state))),
            equal: |old, new| old == new,
        }
    }
}

impl Selector<dyn StateValue> {
    /// Select the value under `key`, whatever its type.
    pub fn key(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            target: Target::Key(key.clone()),
            select: Arc::new(move |state: &Arc<State>| match state.value(&key) {
                Some(value) => Selection::Found(Arc::clone(value)),
                None => Selection::Absent,
            }),
            equal: |old, new| old.eq_value(new),
        }
    }
}

impl<T: StateValue + PartialEq> Selector<T> {
    /// Select the value under `key` if it is a `T`.
    pub fn key_as(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            target: Target::Key(key.clone()),
            select: Arc::new(move |state: &Arc<State>| {
                let Some(value) = state.value(&key) else {
                    return Selection::Absent;
                };
                match StateValue::into_any(Arc::clone(value)).downcast::<T>() {
                    Ok(value) => Selection::Found(value),
                    Err(_) => Selection::Mismatch {
                        key: key.clone(),
                        expected: any::type_name::<T>(),
                        actual: value.type_name(),
                    },
                }
            }),
            equal: |old, new| old == new,
        }
    }
}

impl<T: Scope + PartialEq> Selector<T> {
    /// Select the scope owned by `T`.
    pub fn scope() -> Self {
        Self::key_as(T::KEY)
    }
}

impl<E: PartialEq + Send + Sync + 'static> Selector<E> {
    /// Select a value derived from the whole state.
    ///
    /// The projection runs on the old and the new snapshot of every change;
    /// filters compare the two projected values.
    pub fn project<F>(projection: F) -> Self
    where
        F: Fn(&State) -> E + Send + Sync + 'static,
    {
        Self {
            target: Target::Projection,
            select: Arc::new(move |state: &Arc<State>| Selection::Found(Arc::new(projection(state)))),
            equal: |old, new| old == new,
        }
    }
}

impl<E: ?Sized> Selector<E> {
    pub(crate) fn select(&self, state: &Arc<State>) -> Selection<E> {
        (self.select)(state)
    }

    /// Whether the selected part may differ between two snapshots.
    pub(crate) fn touched(&self, old: &Arc<State>, new: &Arc<State>) -> bool {
        match &self.target {
            Target::Key(key) => !old.same_value(new, key),
            Target::All | Target::Projection => !Arc::ptr_eq(old, new),
        }
    }

    pub(crate) fn equality(&self) -> fn(&E, &E) -> bool {
        self.equal
    }

    pub(crate) fn validate(&self) -> Result<(), String> {
        match &self.target {
            Target::Key(key) if key.is_empty() => Err("scope key must not be empty".to_string()),
            _ => Ok(()),
        }
    }
}

impl<E: ?Sized> Clone for Selector<E> {
    fn clone(&self) -> Self {
        Self {
            target: self.target.clone(),
            select: Arc::clone(&self.select),
            equal: self.equal,
        }
    }
}

impl<E: ?Sized> fmt::Display for Selector<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.target {
            Target::All => f.write_str("all"),
            Target::Key(key) => write!(f, "key `{}`", key),
            Target::Projection => f.write_str("projection"),
        }
    }
}

impl<E: ?Sized> fmt::Debug for Selector<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Selector")
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Theme(String);

    impl Scope for Theme {
        const KEY: &'static str = "theme";
    }

    fn found<E: ?Sized>(selection: Selection<E>) -> Arc<E> {
        match selection {
            Selection::Found(value) => value,
            Selection::Absent => panic!("absent"),
            Selection::Mismatch { .. } => panic!("mismatch"),
        }
    }

    #[test]
    fn select_by_key() {
        let state = Arc::new(State::new().with("counter", 3i32));

        let raw = found(Selector::key("counter").select(&state));
        assert_eq!(raw.downcast_ref::<i32>(), Some(&3));

        let typed = found(Selector::<i32>::key_as("counter").select(&state));
        assert_eq!(*typed, 3);

        assert!(matches!(
            Selector::key("missing").select(&state),
            Selection::Absent
        ));
    }

    #[test]
    fn typed_selection_reports_mismatch() {
        let state = Arc::new(State::new().with("counter", 3i32));

        match Selector::<String>::key_as("counter").select(&state) {
            Selection::Mismatch {
                key,
                expected,
                actual,
            } => {
                assert_eq!(key, "counter");
                assert!(expected.contains("String"));
                assert_eq!(actual, "i32");
            }
            _ => panic!("expected a mismatch"),
        }
    }

    #[test]
    fn select_scope_and_projection() {
        let state = Arc::new(
            State::new()
                .with_scope(Theme("dark".to_string()))
                .with("counter", 2i32),
        );

        let theme = found(Selector::<Theme>::scope().select(&state));
        assert_eq!(theme.0, "dark");

        let doubled = Selector::project(|state: &State| {
            state.get_as::<i32>("counter").copied().unwrap_or_default() * 2
        });
        assert_eq!(*found(doubled.select(&state)), 4);
    }

    #[test]
    fn touched_follows_the_target() {
        let old = Arc::new(State::new().with("a", 1i32).with("b", 1i32));
        let mut next = (*old).clone();
        next.insert("a", 2i32);
        let new = Arc::new(next);

        assert!(Selector::key("a").touched(&old, &new));
        assert!(!Selector::key("b").touched(&old, &new));
        assert!(Selector::all().touched(&old, &new));
        assert!(!Selector::all().touched(&old, &old));
    }

    #[test]
    fn empty_key_is_invalid() {
        assert!(Selector::key("").validate().is_err());
        assert!(Selector::<i32>::key_as("counter").validate().is_ok());
        assert!(Selector::all().validate().is_ok());
    }
}
