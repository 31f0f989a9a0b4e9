//! Phrase-to-action bindings.

use lux_core::action::ActionRef;
use lux_core::key::normalize;

/// A spoken phrase bound to an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    /// The normalized phrase.
    pub phrase: String,
    /// The action fired when the phrase is heard.
    pub action: ActionRef,
}

impl Binding {
    /// Creates a binding under the normalized form of `phrase`.
    #[must_use]
    pub fn new(phrase: &str, action: impl Into<ActionRef>) -> Self {
        Self {
            phrase: normalize(phrase),
            action: action.into(),
        }
    }
}
