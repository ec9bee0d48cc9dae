use super::reducer::{ActionTypes, AnyReducer, Reduced, Reducer};
use crate::action::Action;
use crate::error::{Result, StoreError};
use crate::state::State;
use log::{trace, warn};

struct ReducerEntry {
    key: String,
    action_types: ActionTypes,
    reducer: Box<dyn AnyReducer>,
}

/// Reducers keyed by scope and action type, in registration order.
#[derive(Default)]
pub(crate) struct ReducerRegistry {
    entries: Vec<ReducerEntry>,
}

impl ReducerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a reducer, rejecting overlaps with reducers of the same scope.
    pub fn register<R: Reducer>(&mut self, reducer: R) -> Result<()> {
        let key = reducer.key().to_string();
        if key.is_empty() {
            return Err(StoreError::EmptyScopeKey);
        }
        let action_types = reducer.action_types();
        if matches!(&action_types, ActionTypes::Only(types) if types.is_empty()) {
            return Err(StoreError::EmptyActionTypes { key });
        }

        for existing in self.entries.iter().filter(|entry| entry.key == key) {
            if let Some(action_type) = existing.action_types.overlap(&action_types) {
                return Err(StoreError::DuplicateReducer { key, action_type });
            }
        }

        trace!("registered reducer for `{}` on {}", key, action_types);
        self.entries.push(ReducerEntry {
            key,
            action_types,
            reducer: Box::new(reducer),
        });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Initial value of every registered scope.
    ///
    /// When several reducers share a scope the first registered one decides.
    pub fn initial_state(&self) -> State {
        let mut state = State::new();
        for entry in &self.entries {
            if !state.contains_key(&entry.key) {
                state.update(entry.key.clone(), entry.reducer.initial_value());
            }
        }
        state
    }

    /// Apply `action` to every scope with a matching reducer.
    ///
    /// Returns the next snapshot, or `None` if no scope changed.
    pub fn reduce(&self, state: &State, action: &Action) -> Option<State> {
        let mut next: Option<State> = None;

        for entry in &self.entries {
            if !entry.action_types.contains(action.action_type()) {
                continue;
            }

            let current = match state.value(&entry.key) {
                Some(value) => value.clone(),
                None => entry.reducer.initial_value(),
            };

            match entry.reducer.reduce_value(&*current, action) {
                Reduced::Changed(value) => {
                    trace!("`{}` changed scope `{}`", action.action_type(), entry.key);
                    next.get_or_insert_with(|| state.clone())
                        .update(entry.key.clone(), value);
                }
                Reduced::Unchanged => {}
                Reduced::TypeMismatch { expected } => {
                    warn!(
                        "reducer for `{}` expects `{}` but the scope holds `{}`; skipping",
                        entry.key,
                        expected,
                        current.type_name()
                    );
                }
            }
        }

        next
    }
}
