//! Voice input abstraction.
//!
//! Speech recognition is owned by an external recognizer. This module only
//! describes the stream of recognized utterances it hands to the router.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::DomainError;

/// One element of a live recognition session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceEvent {
    /// A final recognized utterance.
    Utterance(String),
    /// A recoverable recognizer error reported mid-session.
    Error(String),
}

/// Receiving half of a recognition session.
pub type Utterances = mpsc::Receiver<VoiceEvent>;

/// Source of recognized utterances.
///
/// A session is live and unbounded: it yields events until `stop` is called
/// or the recognizer ends it by dropping the sender.
#[async_trait]
pub trait VoiceSource: Send + Sync {
    /// Starts a recognition session.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::VoiceUnavailable` if recognition is not
    /// supported or the session cannot be (re)started.
    async fn start(&self) -> Result<Utterances, DomainError>;

    /// Stops the current session. Stopping an idle source is a no-op.
    async fn stop(&self);
}
