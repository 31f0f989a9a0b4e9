//! Lux host runtime.
//!
//! Wires the action registry, cue scheduler and command router into one
//! application context and registers the stage actions they drive.

pub mod config;
pub mod context;
pub mod error;
pub mod stage;
