//! Lux voice: command routing.
//!
//! Responsible for binding spoken phrases to actions and dispatching each
//! recognized utterance from a live voice session to its bound action.

pub mod application;
pub mod domain;
pub mod source;
