//! Short codes derived from link tokens.
//!
//! A short code is a display and manual-entry affordance only. Redeeming a
//! link always keys on the full token, never on its short code.

/// Default length of a derived short code.
pub const SHORT_CODE_LEN: usize = 8;

/// Derive the default-length short code for a token.
pub fn derive_short_code(token: &str) -> String {
    derive_short_code_with_len(token, SHORT_CODE_LEN)
}

/// Derive a short code of `len` characters.
///
/// Deterministic: separators and other non-alphanumerics are stripped, the
/// rest is uppercased, and the first `len` characters are kept. Tokens
/// shorter than `len` yield everything they have.
pub fn derive_short_code_with_len(token: &str, len: usize) -> String {
    token
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_uppercase())
        .take(len)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_strips_separators_and_uppercases() {
        assert_eq!(derive_short_code("ab-cd_12.ef34gh"), "ABCD12EF");
    }

    #[test]
    fn test_short_token() {
        assert_eq!(derive_short_code("a-b"), "AB");
        assert_eq!(derive_short_code(""), "");
    }

    #[test]
    fn test_custom_length() {
        assert_eq!(derive_short_code_with_len("0123456789abcdef", 4), "0123");
    }

    proptest! {
        #[test]
        fn test_derivation_is_stable(token in "[a-zA-Z0-9_-]{0,80}") {
            prop_assert_eq!(derive_short_code(&token), derive_short_code(&token));
        }

        #[test]
        fn test_output_is_uppercase_alphanumeric(token in ".{0,80}") {
            let code = derive_short_code(&token);
            prop_assert!(code.len() <= SHORT_CODE_LEN);
            prop_assert!(code.chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
        }
    }
}
