//! Voice listener: feeds a live voice session into the command router.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use lux_core::voice::{VoiceEvent, VoiceSource};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::application::router::CommandRouter;

/// A running (or inactive) subscription of a router to a voice source.
///
/// Stopping the listener halts voice-triggered actions only; cues already
/// scheduled by those actions still fire.
pub struct VoiceListener {
    source: Option<Arc<dyn VoiceSource>>,
    active: Arc<AtomicBool>,
    task: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for VoiceListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoiceListener")
            .field("active", &self.is_active())
            .finish_non_exhaustive()
    }
}

impl VoiceListener {
    /// Starts routing utterances from `source` into `router`.
    ///
    /// A missing source, or one that fails to start, yields an inactive
    /// listener; this is logged and is not an error.
    pub async fn attach(router: Arc<CommandRouter>, source: Option<Arc<dyn VoiceSource>>) -> Self {
        let inactive = |source: Option<Arc<dyn VoiceSource>>| Self {
            source,
            active: Arc::new(AtomicBool::new(false)),
            task: None,
        };

        let Some(source) = source else {
            info!("no voice source configured; voice commands disabled");
            return inactive(None);
        };

        let mut utterances = match source.start().await {
            Ok(utterances) => utterances,
            Err(e) => {
                warn!(error = %e, "voice source failed to start; voice commands disabled");
                return inactive(Some(source));
            }
        };

        let active = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&active);
        let task = tokio::spawn(async move {
            while let Some(event) = utterances.recv().await {
                if !flag.load(Ordering::SeqCst) {
                    break;
                }
                match event {
                    VoiceEvent::Utterance(text) => {
                        info!(utterance = %text.trim(), "heard utterance");
                        router.feed(&text);
                    }
                    VoiceEvent::Error(message) => {
                        warn!(error = %message, "voice recognition error");
                    }
                }
            }
            flag.store(false, Ordering::SeqCst);
            info!("voice session ended");
        });
        info!("voice listener started");

        Self {
            source: Some(source),
            active,
            task: Some(task),
        }
    }

    /// Returns `true` while utterances are being routed.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Stops routing utterances and asks the source to end its session.
    pub async fn stop(&mut self) {
        self.active.store(false, Ordering::SeqCst);
        if let Some(task) = self.task.take() {
            task.abort();
        }
        if let Some(source) = &self.source {
            source.stop().await;
        }
        info!("voice listener stopped");
    }

    /// Waits until the voice session ends on its own.
    pub async fn finished(&mut self) {
        if let Some(task) = self.task.take() {
            // An aborted or panicked feed task has nothing left to report.
            let _ = task.await;
        }
    }
}
