use std::any::Any;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// An immutable message describing an intended state change.
///
/// The action type selects which reducers run; the payload is opaque to the
/// store and read back by reducers, middleware and action listeners.
///
/// ```
/// use scopestore::Action;
///
/// let action = Action::with_payload("ADD", 5i32);
/// assert_eq!(action.action_type(), "ADD");
/// assert_eq!(action.payload::<i32>(), Some(&5));
/// assert_eq!(action.payload::<u8>(), None);
/// ```
#[derive(Clone)]
pub struct Action {
    action_type: Cow<'static, str>,
    payload: Option<Arc<dyn Any + Send + Sync>>,
}

impl Action {
    /// Create an action without payload.
    pub fn new(action_type: impl Into<Cow<'static, str>>) -> Self {
        Self {
            action_type: action_type.into(),
            payload: None,
        }
    }

    /// Create an action carrying a payload.
    pub fn with_payload<P>(action_type: impl Into<Cow<'static, str>>, payload: P) -> Self
    where
        P: Any + Send + Sync,
    {
        Self {
            action_type: action_type.into(),
            payload: Some(Arc::new(payload)),
        }
    }

    pub fn action_type(&self) -> &str {
        &self.action_type
    }

    /// Read the payload as a `P`.
    ///
    /// Returns `None` when there is no payload or it has a different type.
    pub fn payload<P: Any>(&self) -> Option<&P> {
        self.payload.as_deref()?.downcast_ref::<P>()
    }

    pub fn has_payload(&self) -> bool {
        self.payload.is_some()
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("action_type", &self.action_type)
            .field("has_payload", &self.has_payload())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_without_payload() {
        let action = Action::new("INCREMENT");
        assert_eq!(action.action_type(), "INCREMENT");
        assert!(!action.has_payload());
        assert_eq!(action.payload::<i32>(), None);
    }

    #[test]
    fn payload_survives_clone() {
        let action = Action::with_payload(String::from("RENAME"), "ada".to_string());
        let copy = action.clone();

        assert_eq!(copy.action_type(), "RENAME");
        assert_eq!(copy.payload::<String>().map(String::as_str), Some("ada"));
    }
}
