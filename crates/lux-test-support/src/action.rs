//! Test actions: `Action` implementations with observable behavior.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use lux_core::action::{Action, ActionResult};

/// An action that counts its invocations. Clones share the same counter, so
/// one clone can be registered while the test keeps another.
#[derive(Debug, Clone, Default)]
pub struct CountingAction {
    calls: Arc<AtomicUsize>,
}

impl CountingAction {
    /// Create a counter starting at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of times the action has run.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Action for CountingAction {
    fn invoke(&self) -> ActionResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// An action that always returns an error.
#[derive(Debug, Clone)]
pub struct FailingAction(pub &'static str);

impl Action for FailingAction {
    fn invoke(&self) -> ActionResult {
        Err(self.0.into())
    }
}

/// An action that always panics.
#[derive(Debug, Clone)]
pub struct PanickingAction(pub &'static str);

impl Action for PanickingAction {
    fn invoke(&self) -> ActionResult {
        panic!("{}", self.0)
    }
}
