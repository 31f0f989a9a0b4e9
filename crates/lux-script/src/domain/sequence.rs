//! Cues, sequences and the persisted sequence table.

use std::collections::BTreeMap;
use std::time::Duration;

use lux_core::action::ActionRef;
use lux_core::error::DomainError;
use lux_core::key::normalize;
use serde::{Deserialize, Serialize};

/// One action scheduled at a fixed offset from the start of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cue {
    /// The action to fire.
    pub action: ActionRef,
    /// Offset from run start, in milliseconds.
    pub delay: u64,
}

impl Cue {
    /// Creates a cue firing `action` after `delay_ms` milliseconds.
    #[must_use]
    pub fn new(action: impl Into<ActionRef>, delay_ms: u64) -> Self {
        Self {
            action: action.into(),
            delay: delay_ms,
        }
    }

    /// The offset as a `Duration`.
    #[must_use]
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay)
    }
}

/// A named, ordered list of cues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequence {
    name: String,
    cues: Vec<Cue>,
}

impl Sequence {
    /// Creates a sequence under the normalized form of `name`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if `name` is blank.
    pub fn new(name: &str, cues: Vec<Cue>) -> Result<Self, DomainError> {
        let name = normalize(name);
        if name.is_empty() {
            return Err(DomainError::Validation(
                "sequence name must not be empty".into(),
            ));
        }
        Ok(Self { name, cues })
    }

    /// The normalized name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The cues in authored order.
    #[must_use]
    pub fn cues(&self) -> &[Cue] {
        &self.cues
    }

    /// Offset of the last cue; zero for an empty sequence.
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.cues.iter().map(Cue::delay).max().unwrap_or_default()
    }
}

/// Every known sequence, keyed by normalized name.
///
/// Serialized as a JSON object mapping each name to its list of
/// `{ "action": ..., "delay": ... }` entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SequenceTable {
    sequences: BTreeMap<String, Vec<Cue>>,
}

impl SequenceTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `sequence`, fully replacing any sequence with the same name.
    /// Returns the replaced cue list, if any.
    pub fn insert(&mut self, sequence: Sequence) -> Option<Vec<Cue>> {
        self.sequences.insert(sequence.name, sequence.cues)
    }

    /// Looks up a sequence by (unnormalized) name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Sequence> {
        let name = normalize(name);
        self.sequences.get(&name).map(|cues| Sequence {
            cues: cues.clone(),
            name,
        })
    }

    /// Removes a sequence. Returns `true` if it existed.
    pub fn remove(&mut self, name: &str) -> bool {
        self.sequences.remove(&normalize(name)).is_some()
    }

    /// Normalized names in sorted order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.sequences.keys().cloned().collect()
    }

    /// Number of sequences.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    /// Returns `true` if the table holds no sequences.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    /// Serializes the table to its persisted JSON form.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if serialization fails.
    pub fn to_json(&self) -> Result<String, DomainError> {
        serde_json::to_string(self).map_err(|e| {
            DomainError::Infrastructure(format!("sequence table serialization failed: {e}"))
        })
    }

    /// Parses a persisted table. Names are re-normalized so hand-edited
    /// entries still resolve; the cue content is only structurally checked.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Deserialization` if `raw` is not a valid table.
    pub fn from_json(raw: &str) -> Result<Self, DomainError> {
        let parsed: BTreeMap<String, Vec<Cue>> = serde_json::from_str(raw)
            .map_err(|e| DomainError::Deserialization(format!("sequence table: {e}")))?;
        let sequences = parsed
            .into_iter()
            .map(|(name, cues)| (normalize(&name), cues))
            .collect();
        Ok(Self { sequences })
    }
}
