//! Error types for store configuration and dispatch.

use thiserror::Error;

/// Errors reported by the store.
///
/// Configuration errors surface while the store is being assembled or a
/// listener is being registered. [`StoreError::Reentrancy`] surfaces to the
/// caller of `dispatch`/`reset`. Per-listener problems (type mismatches,
/// panicking callbacks) are never returned; they are logged instead.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Two reducers claim the same action type for the same scope.
    #[error("scope `{key}` already has a reducer for action type `{action_type}`")]
    DuplicateReducer { key: String, action_type: String },

    /// A reducer restricted itself to an empty set of action types.
    #[error("reducer for scope `{key}` handles no action types")]
    EmptyActionTypes { key: String },

    /// A reducer was registered without a scope key.
    #[error("scope key must not be empty")]
    EmptyScopeKey,

    /// A listener was registered with a selector that can never match.
    #[error("invalid selector: {reason}")]
    InvalidSelector { reason: String },

    /// `dispatch` or `reset` was called synchronously from inside a reducer.
    #[error("cannot dispatch `{action_type}` while the store is reducing")]
    Reentrancy { action_type: String },

    /// The background notification thread could not be started.
    #[error("failed to start notification thread")]
    NotifierSpawn(#[source] std::io::Error),
}

impl StoreError {
    /// Whether this error stems from store or listener configuration.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            StoreError::DuplicateReducer { .. }
                | StoreError::EmptyActionTypes { .. }
                | StoreError::EmptyScopeKey
                | StoreError::InvalidSelector { .. }
        )
    }
}

/// Result alias used throughout the crate.
pub type Result<T, E = StoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_configuration_errors() {
        let duplicate = StoreError::DuplicateReducer {
            key: "counter".to_string(),
            action_type: "INCREMENT".to_string(),
        };
        assert!(duplicate.is_configuration());
        assert_eq!(
            duplicate.to_string(),
            "scope `counter` already has a reducer for action type `INCREMENT`"
        );

        let reentrant = StoreError::Reentrancy {
            action_type: "INCREMENT".to_string(),
        };
        assert!(!reentrant.is_configuration());
    }
}
