//! Key normalization shared by sequence names and command phrases.

/// Normalizes a sequence name or spoken phrase into its lookup key.
///
/// Leading and trailing whitespace is dropped, internal whitespace runs are
/// collapsed to a single space, and the result is lowercased.
#[must_use]
pub fn normalize(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::normalize;

    #[test]
    fn test_normalize_trims_and_lowercases() {
        assert_eq!(normalize("  Go Up "), "go up");
    }

    #[test]
    fn test_normalize_collapses_internal_whitespace() {
        assert_eq!(normalize("Go  \t Up"), "go up");
    }

    #[test]
    fn test_normalize_of_blank_input_is_empty() {
        assert_eq!(normalize(" \n "), "");
    }

    #[test]
    fn test_normalize_handles_non_ascii() {
        assert_eq!(normalize("ÜBERARBEITE Alles"), "überarbeite alles");
    }
}
