//! Domain model for voice commands.

pub mod binding;
