//! Application services for cue sequences.

pub mod scheduler;
