//! Actions and the registry that resolves them.
//!
//! An [`Action`] is a zero-argument, side-effecting callable. Sequences and
//! command bindings never hold callables directly: they reference an
//! [`ActionRef`], which is resolved against an [`ActionRegistry`] at the
//! moment the action fires.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Error returned by a failing action.
pub type ActionFailure = Box<dyn std::error::Error + Send + Sync>;

/// Result of invoking an action.
pub type ActionResult = Result<(), ActionFailure>;

/// A zero-argument, side-effecting callable.
pub trait Action: Send + Sync {
    /// Runs the action once.
    ///
    /// # Errors
    ///
    /// Returns whatever failure the underlying side effect reports.
    fn invoke(&self) -> ActionResult;
}

impl<F> Action for F
where
    F: Fn() -> ActionResult + Send + Sync,
{
    fn invoke(&self) -> ActionResult {
        self()
    }
}

/// Opaque identifier of a registered action.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionRef(String);

impl ActionRef {
    /// Creates a reference from an identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ActionRef {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ActionRef {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Capability lookup from identifier to callable.
pub trait ActionRegistry: Send + Sync {
    /// Resolves an identifier to its callable.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::UnresolvableAction` if nothing is registered
    /// under `action`.
    fn resolve(&self, action: &ActionRef) -> Result<Arc<dyn Action>, DomainError>;
}

/// Registry backed by an in-process map. Registration may happen at any time,
/// including after sequences referencing the action were loaded.
#[derive(Default)]
pub struct InMemoryActionRegistry {
    actions: RwLock<HashMap<ActionRef, Arc<dyn Action>>>,
}

impl InMemoryActionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `action` under `id`, replacing any previous registration.
    /// Returns `true` if an earlier action was replaced.
    pub fn register(&self, id: impl Into<ActionRef>, action: impl Action + 'static) -> bool {
        self.register_arc(id, Arc::new(action))
    }

    /// Registers an already shared callable under `id`.
    pub fn register_arc(&self, id: impl Into<ActionRef>, action: Arc<dyn Action>) -> bool {
        self.actions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.into(), action)
            .is_some()
    }

    /// Removes the action registered under `id`.
    pub fn unregister(&self, id: &ActionRef) -> bool {
        self.actions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id)
            .is_some()
    }

    /// Returns the registered identifiers, sorted.
    #[must_use]
    pub fn ids(&self) -> Vec<ActionRef> {
        let mut ids: Vec<ActionRef> = self
            .actions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        ids.sort();
        ids
    }
}

impl fmt::Debug for InMemoryActionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryActionRegistry")
            .field("ids", &self.ids())
            .finish()
    }
}

impl ActionRegistry for InMemoryActionRegistry {
    fn resolve(&self, action: &ActionRef) -> Result<Arc<dyn Action>, DomainError> {
        self.actions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(action)
            .cloned()
            .ok_or_else(|| DomainError::UnresolvableAction(action.clone()))
    }
}

/// Resolves `action` and invokes it once, containing any failure.
///
/// A panic inside the callable is caught here and reported like a returned
/// error, so the caller's task keeps running.
///
/// # Errors
///
/// Returns `DomainError::UnresolvableAction` if the identifier is not
/// registered, or `DomainError::ActionExecution` if the callable fails.
pub fn invoke(registry: &dyn ActionRegistry, action: &ActionRef) -> Result<(), DomainError> {
    let callable = registry.resolve(action)?;
    match panic::catch_unwind(AssertUnwindSafe(|| callable.invoke())) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(failure)) => Err(DomainError::ActionExecution {
            action: action.clone(),
            reason: failure.to_string(),
        }),
        Err(payload) => Err(DomainError::ActionExecution {
            action: action.clone(),
            reason: panic_message(payload.as_ref()),
        }),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("panicked: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("panicked: {message}")
    } else {
        "panicked".to_owned()
    }
}
