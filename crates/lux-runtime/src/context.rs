//! Application context holding the shared runtime components.

use std::sync::Arc;

use lux_core::action::InMemoryActionRegistry;
use lux_core::clock::Clock;
use lux_core::error::DomainError;
use lux_core::store::KeyValueStore;
use lux_core::voice::VoiceSource;
use lux_script::application::scheduler::CueScheduler;
use lux_voice::application::listener::VoiceListener;
use lux_voice::application::router::CommandRouter;
use tracing::{error, info, warn};

use crate::stage::{
    CORE_SEQUENCE, DEFAULT_BINDINGS, Stage, core_sequence, register_payload_actions,
    register_stage_actions,
};

/// Everything one Lux host needs, wired together.
#[derive(Debug, Clone)]
pub struct LuxContext {
    /// Actions reachable from sequences and voice bindings.
    pub registry: Arc<InMemoryActionRegistry>,
    /// Named sequences and their playback.
    pub scheduler: Arc<CueScheduler>,
    /// Phrase bindings.
    pub router: Arc<CommandRouter>,
    /// Presentation state the actions drive.
    pub stage: Arc<Stage>,
}

impl LuxContext {
    /// Registers all actions, restores the persisted sequence table from
    /// `store`, seeds the sample sequence if it is missing and binds the
    /// default phrases.
    ///
    /// A malformed table is logged and replaced by an empty one.
    ///
    /// # Errors
    ///
    /// Returns the store error if the table cannot be read. Nothing is
    /// written in that case, so the persisted table survives the outage.
    pub async fn init(
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        storage_key: &str,
    ) -> Result<Self, DomainError> {
        let registry = Arc::new(InMemoryActionRegistry::new());
        let stage = Arc::new(Stage::new(clock));
        register_stage_actions(&registry, &stage);

        let scheduler = Arc::new(
            CueScheduler::new(Arc::clone(&registry) as _, store).with_storage_key(storage_key),
        );
        register_payload_actions(&registry, &scheduler);

        match scheduler.load().await {
            Ok(count) => info!(count, "restored sequences"),
            Err(DomainError::Deserialization(_)) => {
                warn!("persisted sequences were malformed; starting with an empty table");
            }
            Err(e) => {
                error!(error = %e, "could not read persisted sequences; refusing to start");
                return Err(e);
            }
        }

        if scheduler.get(CORE_SEQUENCE).is_none() {
            match scheduler.create(CORE_SEQUENCE, core_sequence()).await {
                Ok(status) => info!(?status, "seeded sample sequence"),
                Err(e) => warn!(error = %e, "failed to create sample sequence"),
            }
        }

        let router = Arc::new(CommandRouter::new(Arc::clone(&registry) as _));
        for (phrase, action) in DEFAULT_BINDINGS {
            router.bind(phrase, *action);
        }

        info!(
            actions = registry.ids().len(),
            sequences = scheduler.names().len(),
            bindings = router.bindings().len(),
            "lux context ready"
        );

        Ok(Self {
            registry,
            scheduler,
            router,
            stage,
        })
    }

    /// Starts routing voice input into the command router.
    pub async fn listen(&self, source: Option<Arc<dyn VoiceSource>>) -> VoiceListener {
        VoiceListener::attach(Arc::clone(&self.router), source).await
    }

    /// Stops voice input and writes the sequence table back to the store.
    ///
    /// # Errors
    ///
    /// Returns the store error if the final save fails.
    pub async fn shutdown(&self, listener: &mut VoiceListener) -> Result<(), DomainError> {
        listener.stop().await;
        self.scheduler.save().await?;
        info!("lux context shut down");
        Ok(())
    }
}
