//! A `VoiceSource` fed by an external recognizer's text output.
//!
//! Each non-blank line read from the input is one recognized utterance. This
//! is how a transcriber running in another process (or a person typing at a
//! terminal) drives the router.
//!
//! Blocking inputs such as the process's standard input are read on a
//! dedicated OS thread rather than the runtime's blocking pool, so a pending
//! read never holds up runtime shutdown.

use std::io::BufRead;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use lux_core::error::DomainError;
use lux_core::voice::{Utterances, VoiceEvent, VoiceSource};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

const CHANNEL_CAPACITY: usize = 64;

enum LineInput {
    Async(Box<dyn AsyncBufRead + Send + Unpin>),
    Blocking(Box<dyn BufRead + Send>),
}

/// Line-oriented voice source. Like a recognition session it cannot be
/// restarted once started.
pub struct LineVoiceSource {
    input: Mutex<Option<LineInput>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for LineVoiceSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LineVoiceSource").finish_non_exhaustive()
    }
}

impl LineVoiceSource {
    /// Wraps a buffered reader of recognized lines.
    #[must_use]
    pub fn new(reader: impl AsyncBufRead + Send + Unpin + 'static) -> Self {
        Self::with_input(LineInput::Async(Box::new(reader)))
    }

    /// Wraps a blocking reader. Lines are read on a dedicated thread, which
    /// exits at end of input or at the first line read after the session's
    /// receiver is gone.
    #[must_use]
    pub fn blocking(reader: impl BufRead + Send + 'static) -> Self {
        Self::with_input(LineInput::Blocking(Box::new(reader)))
    }

    /// Reads utterances from the process's standard input.
    #[must_use]
    pub fn stdin() -> Self {
        Self::blocking(std::io::BufReader::new(std::io::stdin()))
    }

    fn with_input(input: LineInput) -> Self {
        Self {
            input: Mutex::new(Some(input)),
            task: Mutex::new(None),
        }
    }
}

async fn pump_async(reader: Box<dyn AsyncBufRead + Send + Unpin>, tx: mpsc::Sender<VoiceEvent>) {
    let mut lines = reader.lines();
    loop {
        let event = match lines.next_line().await {
            Ok(Some(line)) if line.trim().is_empty() => continue,
            Ok(Some(line)) => VoiceEvent::Utterance(line),
            Ok(None) => break,
            Err(e) => VoiceEvent::Error(e.to_string()),
        };
        let fatal = matches!(event, VoiceEvent::Error(_));
        if tx.send(event).await.is_err() || fatal {
            break;
        }
    }
    debug!("line voice source reached end of input");
}

fn pump_blocking(reader: Box<dyn BufRead + Send>, tx: &mpsc::Sender<VoiceEvent>) {
    for line in BufRead::lines(reader) {
        let event = match line {
            Ok(line) if line.trim().is_empty() => continue,
            Ok(line) => VoiceEvent::Utterance(line),
            Err(e) => VoiceEvent::Error(e.to_string()),
        };
        let fatal = matches!(event, VoiceEvent::Error(_));
        if tx.blocking_send(event).is_err() || fatal {
            break;
        }
    }
    debug!("line voice source reached end of input");
}

#[async_trait]
impl VoiceSource for LineVoiceSource {
    async fn start(&self) -> Result<Utterances, DomainError> {
        let input = self
            .input
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or_else(|| DomainError::VoiceUnavailable("line source already started".into()))?;

        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        match input {
            LineInput::Async(reader) => {
                let task = tokio::spawn(pump_async(reader, tx));
                *self.task.lock().unwrap_or_else(PoisonError::into_inner) = Some(task);
            }
            LineInput::Blocking(reader) => {
                std::thread::Builder::new()
                    .name("lux-line-voice".into())
                    .spawn(move || pump_blocking(reader, &tx))
                    .map_err(|e| {
                        DomainError::VoiceUnavailable(format!("failed to start reader thread: {e}"))
                    })?;
            }
        }
        Ok(rx)
    }

    async fn stop(&self) {
        if let Some(task) = self
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn collect(mut rx: Utterances) -> Vec<VoiceEvent> {
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn test_each_non_blank_line_is_an_utterance() {
        let source = LineVoiceSource::new(&b"run sequence\n\n   \nPulse\n"[..]);

        let events = collect(source.start().await.unwrap()).await;

        assert_eq!(
            events,
            vec![
                VoiceEvent::Utterance("run sequence".into()),
                VoiceEvent::Utterance("Pulse".into()),
            ]
        );
    }

    #[tokio::test]
    async fn test_blocking_reader_feeds_the_session_from_its_own_thread() {
        let source = LineVoiceSource::blocking(std::io::Cursor::new(b"pulse\n\nwhat time is it\n"));

        let events = collect(source.start().await.unwrap()).await;

        assert_eq!(
            events,
            vec![
                VoiceEvent::Utterance("pulse".into()),
                VoiceEvent::Utterance("what time is it".into()),
            ]
        );
    }

    #[tokio::test]
    async fn test_blocking_reader_reports_invalid_utf8_and_stops() {
        let source = LineVoiceSource::blocking(std::io::Cursor::new(b"pulse\n\xff\xfe\nreset\n"));

        let events = collect(source.start().await.unwrap()).await;

        assert_eq!(events.len(), 2);
        assert!(matches!(events[1], VoiceEvent::Error(_)));
    }

    #[tokio::test]
    async fn test_blocking_source_cannot_restart() {
        let source = LineVoiceSource::blocking(std::io::Cursor::new(Vec::new()));
        let _ = source.start().await.unwrap();

        let second = source.start().await;

        assert!(matches!(second, Err(DomainError::VoiceUnavailable(_))));
    }

    #[tokio::test]
    async fn test_source_cannot_restart() {
        let source = LineVoiceSource::new(&b""[..]);
        let _ = source.start().await.unwrap();

        let second = source.start().await;

        assert!(matches!(second, Err(DomainError::VoiceUnavailable(_))));
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_reported_and_ends_session() {
        let source = LineVoiceSource::new(&b"pulse\n\xff\xfe\nreset\n"[..]);

        let events = collect(source.start().await.unwrap()).await;

        assert_eq!(events.len(), 2);
        assert_eq!(events[0], VoiceEvent::Utterance("pulse".into()));
        assert!(matches!(events[1], VoiceEvent::Error(_)));
    }
}
