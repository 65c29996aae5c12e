//! Property-based tests for subdomain normalization
//!
//! These tests verify:
//! - Already-valid subdomains pass through unchanged
//! - Arbitrary input never panics, and accepted output always satisfies
//!   the published rules
//! - Normalization is idempotent

use proptest::prelude::*;

use rahba_auth_core::{normalize_subdomain, RESERVED_SUBDOMAINS};

proptest! {
    #[test]
    fn valid_subdomains_pass_through_unchanged(s in "[a-z0-9][a-z0-9-]{1,28}[a-z0-9]") {
        prop_assume!(!RESERVED_SUBDOMAINS.contains(&s.as_str()));
        prop_assert_eq!(normalize_subdomain(&s).unwrap(), s);
    }

    #[test]
    fn uppercase_input_is_lowered(s in "[A-Z0-9]{3,30}") {
        let lowered = s.to_lowercase();
        prop_assume!(!RESERVED_SUBDOMAINS.contains(&lowered.as_str()));
        prop_assert_eq!(normalize_subdomain(&s).unwrap(), lowered);
    }

    #[test]
    fn arbitrary_input_never_panics_and_accepted_output_is_valid(s in ".*") {
        if let Ok(out) = normalize_subdomain(&s) {
            prop_assert!((3..=30).contains(&out.len()));
            prop_assert!(out
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
            prop_assert!(!out.starts_with('-'));
            prop_assert!(!out.ends_with('-'));
            prop_assert!(!RESERVED_SUBDOMAINS.contains(&out.as_str()));
            // Running the output through again changes nothing.
            prop_assert_eq!(normalize_subdomain(&out).unwrap(), out);
        }
    }
}
