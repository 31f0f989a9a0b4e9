//! Domain error types.

use thiserror::Error;

use crate::action::ActionRef;

/// Top-level domain error type.
#[derive(Debug, Error)]
pub enum DomainError {
    /// No sequence is stored under the requested name.
    #[error("sequence not found: {0}")]
    SequenceNotFound(String),

    /// Persisted content could not be parsed.
    #[error("deserialization error: {0}")]
    Deserialization(String),

    /// An action identifier has no registered callable.
    #[error("unresolvable action: {0}")]
    UnresolvableAction(ActionRef),

    /// An action's callable returned an error or panicked.
    #[error("action {action} failed: {reason}")]
    ActionExecution {
        /// The action that failed.
        action: ActionRef,
        /// The failure reported by the callable.
        reason: String,
    },

    /// A validation error in domain logic.
    #[error("validation error: {0}")]
    Validation(String),

    /// The voice source could not be started.
    #[error("voice source unavailable: {0}")]
    VoiceUnavailable(String),

    /// An infrastructure/persistence error.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}
