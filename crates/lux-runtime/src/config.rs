//! Runtime configuration read from the environment.

use std::path::PathBuf;

use lux_script::application::scheduler::DEFAULT_STORAGE_KEY;

use crate::error::AppError;

const DEFAULT_STORE_PATH: &str = "lux-store.json";

/// Where the sequence table is persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    /// A JSON file on local disk.
    File(PathBuf),
    /// A PostgreSQL database.
    Postgres {
        /// Connection string.
        database_url: String,
    },
}

/// Where recognized utterances come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceInput {
    /// One utterance per line on standard input.
    Stdin,
    /// Voice commands disabled.
    Off,
}

/// Host configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Persistence backend.
    pub store: StoreBackend,
    /// Store key holding the sequence table.
    pub storage_key: String,
    /// Voice input source.
    pub voice: VoiceInput,
}

impl RuntimeConfig {
    /// Reads configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a variable holds an invalid value or a
    /// required one is missing.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`, which maps a variable name to
    /// its value.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a variable holds an invalid value or a
    /// required one is missing.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let store = match lookup("LUX_STORE").as_deref().unwrap_or("file") {
            "file" => StoreBackend::File(
                lookup("LUX_STORE_PATH")
                    .map_or_else(|| PathBuf::from(DEFAULT_STORE_PATH), PathBuf::from),
            ),
            "postgres" => StoreBackend::Postgres {
                database_url: lookup("DATABASE_URL").ok_or_else(|| {
                    AppError::Config(
                        "DATABASE_URL environment variable must be set when LUX_STORE=postgres"
                            .into(),
                    )
                })?,
            },
            other => {
                return Err(AppError::Config(format!(
                    "LUX_STORE must be `file` or `postgres`, got `{other}`"
                )));
            }
        };

        let storage_key = lookup("LUX_SCRIPTS_KEY").unwrap_or_else(|| DEFAULT_STORAGE_KEY.to_owned());
        if storage_key.trim().is_empty() {
            return Err(AppError::Config("LUX_SCRIPTS_KEY must not be empty".into()));
        }

        let voice = match lookup("LUX_VOICE").as_deref().unwrap_or("stdin") {
            "stdin" => VoiceInput::Stdin,
            "off" => VoiceInput::Off,
            other => {
                return Err(AppError::Config(format!(
                    "LUX_VOICE must be `stdin` or `off`, got `{other}`"
                )));
            }
        };

        Ok(Self {
            store,
            storage_key,
            voice,
        })
    }
}
