/// Canonical form used for answer comparison: surrounding whitespace trimmed,
/// ASCII letters upper-cased. Non-ASCII characters pass through untouched.
pub fn normalize(s: &str) -> String {
    s.trim().to_ascii_uppercase()
}

/// Exact match of the normalized candidate against the normalized answer.
/// An empty candidate never matches a non-empty answer.
pub fn validate(candidate: &str, canonical_answer: &str) -> bool {
    normalize(candidate) == normalize(canonical_answer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_trims_and_uppercases() {
        assert_eq!(normalize("  theta-231-omega \n"), "THETA-231-OMEGA");
        assert_eq!(normalize("CODE-231"), "CODE-231");
    }

    #[test]
    fn test_validate_ignores_case_and_outer_whitespace() {
        assert!(validate("theta-231-omega", "THETA-231-OMEGA"));
        assert!(validate("\tTheta-231-Omega  ", "THETA-231-OMEGA"));
    }

    #[test]
    fn test_validate_rejects_partial_and_inner_whitespace() {
        assert!(!validate("THETA-231", "THETA-231-OMEGA"));
        assert!(!validate("THETA - 231 - OMEGA", "THETA-231-OMEGA"));
        assert!(!validate("THETA-231-OMEGAX", "THETA-231-OMEGA"));
    }

    #[test]
    fn test_validate_empty_candidate() {
        assert!(!validate("", "KEY-231-LAB"));
        assert!(!validate("   ", "KEY-231-LAB"));
    }

    #[test]
    fn test_validate_only_ascii_folding() {
        // 'ß' has no single-char ASCII uppercase form and must not be expanded
        assert!(!validate("straße", "STRASSE"));
    }
}
