//! Lux core: shared abstractions.
//!
//! This crate defines the action, persistence and voice-input seams that the
//! scheduler and router depend on. It contains no infrastructure code.

pub mod action;
pub mod clock;
pub mod error;
pub mod key;
pub mod store;
pub mod voice;
