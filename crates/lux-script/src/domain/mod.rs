//! Domain model for cue sequences.

pub mod sequence;
