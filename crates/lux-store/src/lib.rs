//! Key-value store backends for the Lux persistence boundary.

pub mod file_store;
pub mod pg_store;
pub mod schema;
