//! Application services for voice commands.

pub mod listener;
pub mod router;
