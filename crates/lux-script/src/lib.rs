//! Lux script: timed cue sequences.
//!
//! Responsible for authoring named sequences of delayed actions, persisting
//! them through the key-value boundary, and replaying them on demand.

pub mod application;
pub mod domain;
