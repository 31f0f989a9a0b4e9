//! Shared test mocks and utilities for the Lux workspace.

mod action;
mod clock;
mod store;
mod voice;

pub use action::{CountingAction, FailingAction, PanickingAction};
pub use clock::FixedClock;
pub use store::{
    EmptyKeyValueStore, FailingKeyValueStore, RecordingKeyValueStore, UnreadableKeyValueStore,
};
pub use voice::{ScriptedVoiceSource, UnavailableVoiceSource};
