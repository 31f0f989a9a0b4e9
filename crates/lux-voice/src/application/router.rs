//! The command router: maps normalized phrases to actions.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use lux_core::action::{self, ActionRef, ActionRegistry};
use lux_core::error::DomainError;
use lux_core::key::normalize;
use tracing::{debug, error, info, warn};

use crate::domain::binding::Binding;

/// Result of routing one utterance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// A binding matched and its action ran.
    Matched(Binding),
    /// No binding exists for the utterance; nothing ran.
    NoMatch,
    /// A binding matched but its action could not be resolved or failed.
    /// Only produced by [`CommandRouter::feed`].
    Failed(Binding),
}

/// Exact-match router from spoken phrase to action.
///
/// Bindings live in memory only and are lost on restart.
pub struct CommandRouter {
    registry: Arc<dyn ActionRegistry>,
    bindings: RwLock<HashMap<String, ActionRef>>,
}

impl std::fmt::Debug for CommandRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandRouter")
            .field("bindings", &self.bindings())
            .finish_non_exhaustive()
    }
}

impl CommandRouter {
    /// Creates a router with no bindings.
    #[must_use]
    pub fn new(registry: Arc<dyn ActionRegistry>) -> Self {
        Self {
            registry,
            bindings: RwLock::new(HashMap::new()),
        }
    }

    /// Binds `phrase` to `action`, replacing any binding for the same
    /// normalized phrase. Returns the replaced binding.
    pub fn bind(&self, phrase: &str, action: impl Into<ActionRef>) -> Option<Binding> {
        let binding = Binding::new(phrase, action);
        let previous = self
            .bindings
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(binding.phrase.clone(), binding.action.clone());
        info!(phrase = %binding.phrase, action = %binding.action, "bound phrase");
        previous.map(|action| Binding {
            phrase: binding.phrase,
            action,
        })
    }

    /// Removes the binding for `phrase`. Returns `true` if one existed.
    pub fn unbind(&self, phrase: &str) -> bool {
        self.bindings
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&normalize(phrase))
            .is_some()
    }

    /// All bindings, sorted by phrase.
    #[must_use]
    pub fn bindings(&self) -> Vec<Binding> {
        let mut bindings: Vec<Binding> = self
            .bindings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(phrase, action)| Binding {
                phrase: phrase.clone(),
                action: action.clone(),
            })
            .collect();
        bindings.sort_by(|a, b| a.phrase.cmp(&b.phrase));
        bindings
    }

    fn lookup(&self, utterance: &str) -> Option<Binding> {
        let phrase = normalize(utterance);
        let action = self
            .bindings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&phrase)
            .cloned()?;
        Some(Binding { phrase, action })
    }

    fn dispatch(&self, binding: &Binding) -> Result<(), DomainError> {
        action::invoke(self.registry.as_ref(), &binding.action)?;
        info!(phrase = %binding.phrase, action = %binding.action, "routed command");
        Ok(())
    }

    /// Invokes the action bound to `utterance`, if any.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::UnresolvableAction` if the bound action is not
    /// registered, or `DomainError::ActionExecution` if it fails.
    pub fn resolve(&self, utterance: &str) -> Result<Resolution, DomainError> {
        let Some(binding) = self.lookup(utterance) else {
            debug!(utterance, "no binding for utterance");
            return Ok(Resolution::NoMatch);
        };
        self.dispatch(&binding)?;
        Ok(Resolution::Matched(binding))
    }

    /// Routes one utterance from a voice session. Failures are logged and
    /// reported as `Resolution::Failed`; they never propagate.
    pub fn feed(&self, utterance: &str) -> Resolution {
        let Some(binding) = self.lookup(utterance) else {
            debug!(utterance, "no binding for utterance");
            return Resolution::NoMatch;
        };
        match self.dispatch(&binding) {
            Ok(()) => Resolution::Matched(binding),
            Err(e @ DomainError::UnresolvableAction(_)) => {
                warn!(phrase = %binding.phrase, error = %e, "bound action is not registered");
                Resolution::Failed(binding)
            }
            Err(e) => {
                error!(phrase = %binding.phrase, error = %e, "bound action failed");
                Resolution::Failed(binding)
            }
        }
    }
}
