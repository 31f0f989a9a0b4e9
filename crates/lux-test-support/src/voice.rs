//! Test voice sources: `VoiceSource` implementations for tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use lux_core::error::DomainError;
use lux_core::voice::{Utterances, VoiceEvent, VoiceSource};
use tokio::sync::mpsc;

/// A source that replays a fixed list of events and then ends the session.
/// Like a real recognizer it can only be started once.
#[derive(Debug)]
pub struct ScriptedVoiceSource {
    events: Mutex<Option<Vec<VoiceEvent>>>,
    stops: AtomicUsize,
}

impl ScriptedVoiceSource {
    /// Create a source that will emit `events` in order.
    #[must_use]
    pub fn new(events: Vec<VoiceEvent>) -> Self {
        Self {
            events: Mutex::new(Some(events)),
            stops: AtomicUsize::new(0),
        }
    }

    /// Create a source that emits one utterance per phrase.
    #[must_use]
    pub fn utterances(phrases: &[&str]) -> Self {
        Self::new(
            phrases
                .iter()
                .map(|p| VoiceEvent::Utterance((*p).to_owned()))
                .collect(),
        )
    }

    /// Number of `stop` calls received.
    #[must_use]
    pub fn stop_calls(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VoiceSource for ScriptedVoiceSource {
    async fn start(&self) -> Result<Utterances, DomainError> {
        let events = self
            .events
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| DomainError::VoiceUnavailable("session already started".into()))?;
        let (tx, rx) = mpsc::channel(events.len().max(1));
        for event in events {
            // Capacity covers every event, so this never waits.
            tx.try_send(event).unwrap();
        }
        Ok(rx)
    }

    async fn stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }
}

/// A source on a host without speech recognition.
#[derive(Debug)]
pub struct UnavailableVoiceSource;

#[async_trait]
impl VoiceSource for UnavailableVoiceSource {
    async fn start(&self) -> Result<Utterances, DomainError> {
        Err(DomainError::VoiceUnavailable(
            "speech recognition not supported".into(),
        ))
    }

    async fn stop(&self) {}
}
