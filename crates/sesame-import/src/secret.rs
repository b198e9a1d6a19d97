//! Secret sanitization.
//!
//! Exported secrets arrive space-grouped (`abcd efgh`), tab-padded, or
//! lower-cased depending on the source application. Every router passes
//! raw secrets through [`normalize_secret`] before building a record.

/// Strip all whitespace from a raw secret and upper-case the remainder.
///
/// No Base32 alphabet validation is performed here — downstream
/// consumers reject malformed secrets when they first derive a code.
/// Pure and infallible; normalizing an already-normalized secret is a
/// no-op.
#[must_use]
pub fn normalize_secret(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase()
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_interior_whitespace() {
        assert_eq!(normalize_secret("abcd efgh"), "ABCDEFGH");
    }

    #[test]
    fn strips_tabs_and_newlines() {
        assert_eq!(normalize_secret(" jbsw\ty3dp\nehpk 3pxp "), "JBSWY3DPEHPK3PXP");
    }

    #[test]
    fn upper_cases_mixed_case() {
        assert_eq!(normalize_secret("JbSwY3dP"), "JBSWY3DP");
    }

    #[test]
    fn idempotent_on_normalized_input() {
        let once = normalize_secret("abcd efgh");
        assert_eq!(normalize_secret(&once), once);
    }

    #[test]
    fn empty_input_stays_empty() {
        assert_eq!(normalize_secret(""), "");
        assert_eq!(normalize_secret("   "), "");
    }

    #[test]
    fn non_base32_characters_pass_through() {
        // Alphabet validation is a downstream concern.
        assert_eq!(normalize_secret("not base32!"), "NOTBASE32!");
    }
}
