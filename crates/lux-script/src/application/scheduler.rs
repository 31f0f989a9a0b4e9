//! The cue scheduler: stores named sequences and replays them.
//!
//! Each `run` spawns one task per cue. Tasks sleep for their cue's delay,
//! resolve the action and invoke it; a failure in one task is logged and
//! never reaches its siblings or the caller.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use lux_core::action::{self, ActionRef, ActionRegistry};
use lux_core::error::DomainError;
use lux_core::store::KeyValueStore;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;

use crate::domain::sequence::{Cue, Sequence, SequenceTable};

/// Store key holding the serialized sequence table.
pub const DEFAULT_STORAGE_KEY: &str = "LuxScripts";

/// Whether a table change reached the persistence boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveStatus {
    /// The full table was written.
    Saved,
    /// The write failed; the in-memory table remains authoritative.
    Unsaved,
}

/// What happened to a single cue of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CueOutcome {
    /// The action ran successfully.
    Fired(ActionRef),
    /// No action was registered under the cue's identifier at fire time.
    Unresolvable(ActionRef),
    /// The action returned an error or panicked.
    Failed {
        /// The failing action.
        action: ActionRef,
        /// The reported failure.
        reason: String,
    },
    /// The run was cancelled before the cue fired.
    Cancelled,
}

/// Handle to one invocation of a sequence.
///
/// Dropping the handle detaches the invocation; its cues still fire.
#[derive(Debug)]
pub struct RunHandle {
    invocation_id: Uuid,
    sequence: String,
    tasks: Vec<(ActionRef, JoinHandle<CueOutcome>)>,
}

impl RunHandle {
    /// Identifier attached to every log line of this invocation.
    #[must_use]
    pub fn invocation_id(&self) -> Uuid {
        self.invocation_id
    }

    /// Normalized name of the sequence being run.
    #[must_use]
    pub fn sequence(&self) -> &str {
        &self.sequence
    }

    /// Number of cues that have not finished yet.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.tasks
            .iter()
            .filter(|(_, task)| !task.is_finished())
            .count()
    }

    /// Returns `true` once every cue has finished.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.pending() == 0
    }

    /// Aborts all cues that have not fired yet. Cues already fired are
    /// unaffected.
    pub fn cancel(&self) {
        for (_, task) in &self.tasks {
            task.abort();
        }
        info!(invocation_id = %self.invocation_id, sequence = %self.sequence, "run cancelled");
    }

    /// Waits for every cue and returns their outcomes in authored order.
    pub async fn join(self) -> Vec<CueOutcome> {
        let mut outcomes = Vec::with_capacity(self.tasks.len());
        for (action, task) in self.tasks {
            let outcome = match task.await {
                Ok(outcome) => outcome,
                Err(e) if e.is_cancelled() => CueOutcome::Cancelled,
                Err(e) => CueOutcome::Failed {
                    action,
                    reason: e.to_string(),
                },
            };
            outcomes.push(outcome);
        }
        outcomes
    }
}

/// Stores named sequences, persists them, and schedules their cues.
pub struct CueScheduler {
    registry: Arc<dyn ActionRegistry>,
    store: Arc<dyn KeyValueStore>,
    storage_key: String,
    table: Mutex<SequenceTable>,
}

impl std::fmt::Debug for CueScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CueScheduler")
            .field("storage_key", &self.storage_key)
            .field("sequences", &self.names())
            .finish_non_exhaustive()
    }
}

impl CueScheduler {
    /// Creates a scheduler with an empty table persisting under
    /// [`DEFAULT_STORAGE_KEY`].
    #[must_use]
    pub fn new(registry: Arc<dyn ActionRegistry>, store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            registry,
            store,
            storage_key: DEFAULT_STORAGE_KEY.to_owned(),
            table: Mutex::new(SequenceTable::new()),
        }
    }

    /// Persists under `key` instead of the default.
    #[must_use]
    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    fn table(&self) -> MutexGuard<'_, SequenceTable> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stores `cues` under `name`, replacing any existing sequence, then
    /// writes the full table to the store.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if `name` is blank. Store failures
    /// are not errors: they are logged and reported as
    /// `SaveStatus::Unsaved`.
    pub async fn create(&self, name: &str, cues: Vec<Cue>) -> Result<SaveStatus, DomainError> {
        let sequence = Sequence::new(name, cues)?;
        let cue_count = sequence.cues().len();
        let sequence_name = sequence.name().to_owned();
        let snapshot = {
            let mut table = self.table();
            table.insert(sequence);
            table.to_json()
        };
        info!(sequence = %sequence_name, cue_count, "created sequence");
        Ok(self.persist_best_effort(snapshot).await)
    }

    /// Removes a sequence and writes the table back. Returns `false` if no
    /// sequence had that name.
    pub async fn remove(&self, name: &str) -> bool {
        let snapshot = {
            let mut table = self.table();
            if !table.remove(name) {
                return false;
            }
            table.to_json()
        };
        info!(sequence = %name, "removed sequence");
        self.persist_best_effort(snapshot).await;
        true
    }

    /// Empties the table and deletes the persisted entry.
    ///
    /// # Errors
    ///
    /// Returns the store error if the entry could not be deleted; the
    /// in-memory table is cleared regardless.
    pub async fn clear(&self) -> Result<(), DomainError> {
        *self.table() = SequenceTable::new();
        self.store.remove(&self.storage_key).await?;
        info!(key = %self.storage_key, "cleared sequence table");
        Ok(())
    }

    /// Writes the full table to the store.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if serialization or the store
    /// write fails.
    pub async fn save(&self) -> Result<(), DomainError> {
        let raw = self.table().to_json()?;
        self.store.set(&self.storage_key, &raw).await?;
        debug!(key = %self.storage_key, "saved sequence table");
        Ok(())
    }

    /// Replaces the in-memory table with the persisted one and returns the
    /// number of sequences loaded. A missing entry yields an empty table.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Deserialization` if the persisted content is
    /// malformed; the table is left empty in that case, so callers may
    /// ignore the error and continue. Returns `DomainError::Infrastructure`
    /// if the store cannot be read; the table is left untouched.
    pub async fn load(&self) -> Result<usize, DomainError> {
        let raw = self.store.get(&self.storage_key).await?;
        let loaded = match raw.as_deref().map(SequenceTable::from_json) {
            None => SequenceTable::new(),
            Some(Ok(table)) => table,
            Some(Err(e)) => {
                *self.table() = SequenceTable::new();
                warn!(key = %self.storage_key, error = %e, "discarded malformed sequence table");
                return Err(e);
            }
        };
        let count = loaded.len();
        *self.table() = loaded;
        info!(key = %self.storage_key, count, "loaded sequence table");
        Ok(count)
    }

    /// Looks up a sequence by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Sequence> {
        self.table().get(name)
    }

    /// Names of all stored sequences, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.table().names()
    }

    /// Schedules every cue of the named sequence relative to now and returns
    /// without waiting for any of them.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::SequenceNotFound` if no sequence has that name,
    /// or `DomainError::Infrastructure` if called outside a tokio runtime.
    /// Nothing is scheduled in either case.
    pub fn run(&self, name: &str) -> Result<RunHandle, DomainError> {
        let Some(sequence) = self.get(name) else {
            warn!(sequence = %name, "run requested for unknown sequence");
            return Err(DomainError::SequenceNotFound(name.to_owned()));
        };
        let runtime = Handle::try_current()
            .map_err(|e| DomainError::Infrastructure(format!("no async runtime: {e}")))?;

        let invocation_id = Uuid::new_v4();
        info!(
            sequence = %sequence.name(),
            %invocation_id,
            cue_count = sequence.cues().len(),
            "running sequence"
        );

        let tasks = sequence
            .cues()
            .iter()
            .cloned()
            .map(|cue| {
                let span = info_span!(
                    "cue",
                    %invocation_id,
                    action = %cue.action,
                    delay_ms = cue.delay
                );
                let action = cue.action.clone();
                let task = runtime.spawn(fire(Arc::clone(&self.registry), cue).instrument(span));
                (action, task)
            })
            .collect();

        Ok(RunHandle {
            invocation_id,
            sequence: sequence.name().to_owned(),
            tasks,
        })
    }

    async fn persist_best_effort(&self, snapshot: Result<String, DomainError>) -> SaveStatus {
        let result = match snapshot {
            Ok(raw) => self.store.set(&self.storage_key, &raw).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(()) => SaveStatus::Saved,
            Err(e) => {
                warn!(
                    key = %self.storage_key,
                    error = %e,
                    "failed to persist sequence table; keeping in-memory copy"
                );
                SaveStatus::Unsaved
            }
        }
    }
}

async fn fire(registry: Arc<dyn ActionRegistry>, cue: Cue) -> CueOutcome {
    tokio::time::sleep(cue.delay()).await;
    match action::invoke(registry.as_ref(), &cue.action) {
        Ok(()) => {
            debug!("cue fired");
            CueOutcome::Fired(cue.action)
        }
        Err(DomainError::UnresolvableAction(action)) => {
            warn!("cue skipped: no action registered");
            CueOutcome::Unresolvable(action)
        }
        Err(e) => {
            error!(error = %e, "cue action failed");
            CueOutcome::Failed {
                action: cue.action,
                reason: e.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use lux_core::action::{Action, InMemoryActionRegistry};
    use lux_test_support::{
        CountingAction, EmptyKeyValueStore, FailingAction, FailingKeyValueStore, PanickingAction,
        RecordingKeyValueStore,
    };

    use super::*;

    fn scheduler_with(
        registry: &Arc<InMemoryActionRegistry>,
        store: Arc<dyn KeyValueStore>,
    ) -> CueScheduler {
        let registry: Arc<dyn ActionRegistry> = registry.clone();
        CueScheduler::new(registry, store)
    }

    #[tokio::test]
    async fn test_create_persists_full_table() {
        // Arrange
        let registry = Arc::new(InMemoryActionRegistry::new());
        let store = Arc::new(RecordingKeyValueStore::new());
        let scheduler = scheduler_with(&registry, store.clone());

        // Act
        let first = scheduler
            .create("intro", vec![Cue::new("core.reset", 0)])
            .await
            .unwrap();
        let second = scheduler
            .create("outro", vec![Cue::new("pulse.trigger", 10)])
            .await
            .unwrap();

        // Assert
        assert_eq!(first, SaveStatus::Saved);
        assert_eq!(second, SaveStatus::Saved);
        assert_eq!(store.writes().len(), 2);
        let persisted = store.value(DEFAULT_STORAGE_KEY).unwrap();
        let table = SequenceTable::from_json(&persisted).unwrap();
        assert_eq!(table.names(), vec!["intro".to_owned(), "outro".to_owned()]);
    }

    #[tokio::test]
    async fn test_create_rejects_blank_name_without_writing() {
        let registry = Arc::new(InMemoryActionRegistry::new());
        let store = Arc::new(RecordingKeyValueStore::new());
        let scheduler = scheduler_with(&registry, store.clone());

        let result = scheduler.create("  ", vec![]).await;

        assert!(matches!(result, Err(DomainError::Validation(_))));
        assert!(store.writes().is_empty());
        assert!(scheduler.names().is_empty());
    }

    #[tokio::test]
    async fn test_create_keeps_in_memory_copy_when_store_fails() {
        let registry = Arc::new(InMemoryActionRegistry::new());
        let scheduler = scheduler_with(&registry, Arc::new(FailingKeyValueStore));

        let status = scheduler
            .create("intro", vec![Cue::new("core.reset", 0)])
            .await
            .unwrap();

        assert_eq!(status, SaveStatus::Unsaved);
        assert_eq!(scheduler.get("intro").unwrap().cues().len(), 1);
    }

    #[tokio::test]
    async fn test_create_then_load_round_trips() {
        // Arrange
        let registry = Arc::new(InMemoryActionRegistry::new());
        let store = Arc::new(RecordingKeyValueStore::new());
        let author = scheduler_with(&registry, store.clone());
        let cues = vec![
            Cue::new("core.reset", 0),
            Cue::new("visual.amber", 1000),
            Cue::new("pulse.trigger", 4000),
            Cue::new("sound.pulse", 4000),
        ];
        author.create("coreSequence", cues.clone()).await.unwrap();
        let expected = Sequence::new("coreSequence", cues).unwrap();

        // Act
        let reader = scheduler_with(&registry, store);
        let count = reader.load().await.unwrap();

        // Assert
        assert_eq!(count, 1);
        assert_eq!(reader.get(expected.name()), Some(expected));
    }

    #[tokio::test]
    async fn test_recreate_replaces_cues() {
        let registry = Arc::new(InMemoryActionRegistry::new());
        let store = Arc::new(RecordingKeyValueStore::new());
        let scheduler = scheduler_with(&registry, store.clone());
        scheduler
            .create("intro", vec![Cue::new("a", 0), Cue::new("b", 5)])
            .await
            .unwrap();

        scheduler
            .create("INTRO", vec![Cue::new("c", 7)])
            .await
            .unwrap();
        scheduler.load().await.unwrap();

        assert_eq!(scheduler.get("intro").unwrap().cues(), &[Cue::new("c", 7)]);
    }

    #[tokio::test]
    async fn test_load_without_entry_yields_empty_table() {
        let registry = Arc::new(InMemoryActionRegistry::new());
        let scheduler = scheduler_with(&registry, Arc::new(EmptyKeyValueStore));
        scheduler.create("stale", vec![]).await.unwrap();

        let count = scheduler.load().await.unwrap();

        assert_eq!(count, 0);
        assert!(scheduler.names().is_empty());
    }

    #[tokio::test]
    async fn test_load_of_corrupt_entry_empties_table_and_reports() {
        // Arrange
        let registry = Arc::new(InMemoryActionRegistry::new());
        let store = Arc::new(RecordingKeyValueStore::with_entry(
            DEFAULT_STORAGE_KEY,
            "{ definitely not json",
        ));
        let scheduler = scheduler_with(&registry, store);
        {
            scheduler
                .table()
                .insert(Sequence::new("stale", vec![Cue::new("a", 0)]).unwrap());
        }

        // Act
        let result = scheduler.load().await;

        // Assert
        assert!(matches!(result, Err(DomainError::Deserialization(_))));
        assert!(scheduler.names().is_empty());
    }

    #[tokio::test]
    async fn test_load_failure_keeps_current_table() {
        let registry = Arc::new(InMemoryActionRegistry::new());
        let scheduler = scheduler_with(&registry, Arc::new(FailingKeyValueStore));
        scheduler.create("intro", vec![]).await.unwrap();

        let result = scheduler.load().await;

        assert!(matches!(result, Err(DomainError::Infrastructure(_))));
        assert_eq!(scheduler.names(), vec!["intro".to_owned()]);
    }

    #[tokio::test]
    async fn test_custom_storage_key_is_used() {
        let registry: Arc<dyn ActionRegistry> = Arc::new(InMemoryActionRegistry::new());
        let store = Arc::new(RecordingKeyValueStore::new());
        let scheduler =
            CueScheduler::new(registry, store.clone()).with_storage_key("StageScripts");

        scheduler.create("intro", vec![]).await.unwrap();

        assert!(store.value("StageScripts").is_some());
        assert!(store.value(DEFAULT_STORAGE_KEY).is_none());
    }

    #[tokio::test]
    async fn test_remove_and_clear() {
        let registry = Arc::new(InMemoryActionRegistry::new());
        let store = Arc::new(RecordingKeyValueStore::new());
        let scheduler = scheduler_with(&registry, store.clone());
        scheduler.create("intro", vec![]).await.unwrap();
        scheduler.create("outro", vec![]).await.unwrap();

        assert!(scheduler.remove("Intro").await);
        assert!(!scheduler.remove("intro").await);
        assert_eq!(
            SequenceTable::from_json(&store.value(DEFAULT_STORAGE_KEY).unwrap())
                .unwrap()
                .names(),
            vec!["outro".to_owned()]
        );

        scheduler.clear().await.unwrap();
        assert!(scheduler.names().is_empty());
        assert!(store.value(DEFAULT_STORAGE_KEY).is_none());
    }

    #[tokio::test]
    async fn test_save_surfaces_store_errors() {
        let registry = Arc::new(InMemoryActionRegistry::new());
        let scheduler = scheduler_with(&registry, Arc::new(FailingKeyValueStore));

        let result = scheduler.save().await;

        assert!(matches!(result, Err(DomainError::Infrastructure(_))));
    }

    #[tokio::test]
    async fn test_run_unknown_sequence_schedules_nothing() {
        let registry = Arc::new(InMemoryActionRegistry::new());
        let scheduler = scheduler_with(&registry, Arc::new(EmptyKeyValueStore));

        let result = scheduler.run("missing");

        match result {
            Err(DomainError::SequenceNotFound(name)) => assert_eq!(name, "missing"),
            other => panic!("expected SequenceNotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_run_outside_runtime_is_an_error() {
        let registry = Arc::new(InMemoryActionRegistry::new());
        let scheduler = scheduler_with(&registry, Arc::new(EmptyKeyValueStore));
        scheduler
            .table()
            .insert(Sequence::new("intro", vec![Cue::new("a", 0)]).unwrap());

        let result = scheduler.run("intro");

        assert!(matches!(result, Err(DomainError::Infrastructure(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_returns_before_cues_fire_and_fires_by_delay() {
        // Arrange
        let registry = Arc::new(InMemoryActionRegistry::new());
        let early = CountingAction::new();
        let late = CountingAction::new();
        registry.register("early", early.clone());
        registry.register("late", late.clone());
        let scheduler = scheduler_with(&registry, Arc::new(EmptyKeyValueStore));
        scheduler
            .create("show", vec![Cue::new("late", 1000), Cue::new("early", 100)])
            .await
            .unwrap();

        // Act
        let handle = scheduler.run("show").unwrap();

        // Assert
        assert_eq!(early.calls(), 0);
        assert_eq!(handle.sequence(), "show");

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(early.calls(), 1);
        assert_eq!(late.calls(), 0);
        assert_eq!(handle.pending(), 1);

        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(late.calls(), 1);
        assert!(handle.is_complete());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failing_cue_does_not_stop_later_cue() {
        // Arrange
        let registry = Arc::new(InMemoryActionRegistry::new());
        let later = CountingAction::new();
        registry.register("a", FailingAction("renderer offline"));
        registry.register("b", later.clone());
        let scheduler = scheduler_with(&registry, Arc::new(EmptyKeyValueStore));
        scheduler
            .create("seq", vec![Cue::new("a", 0), Cue::new("b", 10)])
            .await
            .unwrap();

        // Act
        let handle = scheduler.run("seq").unwrap();
        tokio::time::sleep(Duration::from_millis(11)).await;

        // Assert
        assert_eq!(later.calls(), 1);
        let outcomes = handle.join().await;
        assert_eq!(
            outcomes,
            vec![
                CueOutcome::Failed {
                    action: ActionRef::new("a"),
                    reason: "action a failed: renderer offline".to_owned(),
                },
                CueOutcome::Fired(ActionRef::new("b")),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_and_unresolvable_cues_are_contained() {
        let registry = Arc::new(InMemoryActionRegistry::new());
        let survivor = CountingAction::new();
        registry.register("explode", PanickingAction("scene lost"));
        registry.register("survivor", survivor.clone());
        let scheduler = scheduler_with(&registry, Arc::new(EmptyKeyValueStore));
        scheduler
            .create(
                "seq",
                vec![
                    Cue::new("explode", 0),
                    Cue::new("ghost", 5),
                    Cue::new("survivor", 20),
                ],
            )
            .await
            .unwrap();

        let outcomes = scheduler.run("seq").unwrap().join().await;

        assert!(matches!(outcomes[0], CueOutcome::Failed { .. }));
        assert_eq!(outcomes[1], CueOutcome::Unresolvable(ActionRef::new("ghost")));
        assert_eq!(outcomes[2], CueOutcome::Fired(ActionRef::new("survivor")));
        assert_eq!(survivor.calls(), 1);
    }

    struct BrokenRegistry;

    impl ActionRegistry for BrokenRegistry {
        fn resolve(&self, _action: &ActionRef) -> Result<Arc<dyn Action>, DomainError> {
            panic!("registry corrupted");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_task_panic_outside_action_names_the_cue() {
        // Arrange
        let scheduler = CueScheduler::new(Arc::new(BrokenRegistry), Arc::new(EmptyKeyValueStore));
        scheduler
            .create("seq", vec![Cue::new("visual.amber", 0)])
            .await
            .unwrap();

        // Act
        let outcomes = scheduler.run("seq").unwrap().join().await;

        // Assert
        match &outcomes[..] {
            [CueOutcome::Failed { action, reason }] => {
                assert_eq!(action, &ActionRef::new("visual.amber"));
                assert!(reason.contains("panicked"), "unexpected reason: {reason}");
            }
            other => panic!("expected one Failed outcome, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_actions_resolve_at_fire_time() {
        let registry = Arc::new(InMemoryActionRegistry::new());
        let scheduler = scheduler_with(&registry, Arc::new(EmptyKeyValueStore));
        scheduler
            .create("seq", vec![Cue::new("late.bound", 50)])
            .await
            .unwrap();
        let handle = scheduler.run("seq").unwrap();

        let action = CountingAction::new();
        registry.register("late.bound", action.clone());
        let outcomes = handle.join().await;

        assert_eq!(outcomes, vec![CueOutcome::Fired(ActionRef::new("late.bound"))]);
        assert_eq!(action.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_unfired_cues_only() {
        // Arrange
        let registry = Arc::new(InMemoryActionRegistry::new());
        let first = CountingAction::new();
        let second = CountingAction::new();
        registry.register("first", first.clone());
        registry.register("second", second.clone());
        let scheduler = scheduler_with(&registry, Arc::new(EmptyKeyValueStore));
        scheduler
            .create("seq", vec![Cue::new("first", 0), Cue::new("second", 500)])
            .await
            .unwrap();
        let handle = scheduler.run("seq").unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;

        // Act
        handle.cancel();
        let outcomes = handle.join().await;

        // Assert
        assert_eq!(
            outcomes,
            vec![CueOutcome::Fired(ActionRef::new("first")), CueOutcome::Cancelled]
        );
        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(second.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlapping_runs_fire_independently() {
        let registry = Arc::new(InMemoryActionRegistry::new());
        let action = CountingAction::new();
        registry.register("tick", action.clone());
        let scheduler = scheduler_with(&registry, Arc::new(EmptyKeyValueStore));
        scheduler
            .create("seq", vec![Cue::new("tick", 100), Cue::new("tick", 100)])
            .await
            .unwrap();

        let first = scheduler.run("seq").unwrap();
        let second = scheduler.run("seq").unwrap();
        assert_ne!(first.invocation_id(), second.invocation_id());
        first.join().await;
        second.join().await;

        assert_eq!(action.calls(), 4);
    }

    #[tokio::test]
    async fn test_empty_sequence_completes_immediately() {
        let registry = Arc::new(InMemoryActionRegistry::new());
        let scheduler = scheduler_with(&registry, Arc::new(EmptyKeyValueStore));
        scheduler.create("noop", vec![]).await.unwrap();

        let handle = scheduler.run("noop").unwrap();

        assert!(handle.is_complete());
        assert!(handle.join().await.is_empty());
    }
}
