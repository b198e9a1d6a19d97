#![allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]

//! Property tests for the secret normalizer and the URI builder laws.

use proptest::prelude::*;

use sesame_import::{
    build_otpauth_uri, normalize_secret, CredentialFields, OtpType,
};

proptest! {
    /// Normalization is idempotent: a second pass changes nothing.
    #[test]
    fn normalize_is_idempotent(raw in "\\PC{0,64}") {
        let once = normalize_secret(&raw);
        prop_assert_eq!(normalize_secret(&once), once);
    }

    /// The normalized form never contains whitespace or lowercase ASCII.
    #[test]
    fn normalized_form_is_compact_uppercase(raw in "\\PC{0,64}") {
        let normalized = normalize_secret(&raw);
        prop_assert!(!normalized.chars().any(char::is_whitespace));
        prop_assert!(!normalized.chars().any(|c| c.is_ascii_lowercase()));
    }

    /// Default-valued fields never surface in the query string.
    #[test]
    fn default_fields_are_omitted_from_uri(
        issuer in "[A-Za-z0-9]{0,12}",
        account in "[A-Za-z0-9]{0,12}",
        secret in "[A-Z2-7]{1,32}",
    ) {
        let uri = build_otpauth_uri(&CredentialFields {
            issuer: issuer.clone(),
            account,
            secret,
            ..CredentialFields::default()
        });

        prop_assert!(uri.starts_with("otpauth://totp/"));
        prop_assert!(!uri.contains("digits="));
        prop_assert!(!uri.contains("period="));
        prop_assert!(!uri.contains("algorithm="));
        prop_assert!(!uri.contains("counter="));
        prop_assert_eq!(uri.contains("issuer="), !issuer.is_empty());
    }

    /// Changing exactly one parameter away from its default surfaces
    /// exactly that parameter.
    #[test]
    fn single_non_default_field_appears_alone(
        digits in 1u32..=10,
        period in 1u32..=120,
    ) {
        prop_assume!(digits != 6);
        prop_assume!(period != 30);

        let base = CredentialFields {
            issuer: "Acme".into(),
            secret: "JBSWY3DP".into(),
            ..CredentialFields::default()
        };

        let with_digits = build_otpauth_uri(&CredentialFields { digits, ..base.clone() });
        let expected_digits = format!("digits={digits}");
        prop_assert!(with_digits.contains(&expected_digits));
        prop_assert!(!with_digits.contains("period="));
        prop_assert!(!with_digits.contains("algorithm="));

        let with_period = build_otpauth_uri(&CredentialFields { period, ..base.clone() });
        let expected_period = format!("period={period}");
        prop_assert!(with_period.contains(&expected_period));
        prop_assert!(!with_period.contains("digits="));
        prop_assert!(!with_period.contains("algorithm="));
    }

    /// HOTP URIs always carry a counter, TOTP URIs never do.
    #[test]
    fn counter_presence_follows_otp_type(counter in 0u64..=1_000_000) {
        let base = CredentialFields {
            issuer: "Acme".into(),
            secret: "JBSWY3DP".into(),
            counter,
            ..CredentialFields::default()
        };

        let totp = build_otpauth_uri(&base.clone());
        prop_assert!(!totp.contains("counter="));

        let hotp = build_otpauth_uri(&CredentialFields {
            otp_type: OtpType::Hotp,
            ..base
        });
        let expected_counter = format!("counter={counter}");
        prop_assert!(hotp.contains(&expected_counter));
    }
}
