//! JSON export router.
//!
//! Operates on an already-parsed [`serde_json::Value`] — the caller
//! owns deserialization of the raw text. Two dialects:
//!
//! - **Flat list**: the top-level object has a `secrets` array; each
//!   element carries the full field set with per-field defaults.
//! - **Nested accounts**: the top-level object has a `version` field
//!   and an `accounts` array whose first element exposes an
//!   `issuerName` and a `timeStep` (plus either a `secret` or a
//!   push-notification marker). Entries without a secret are
//!   push-only and dropped.
//!
//! Both dialects emit full [`CredentialRecord`]s; the nested-accounts
//! source has no category concept, so its records carry an explicit
//! empty category.

use serde_json::Value;

use crate::record::{
    CredentialFields, CredentialRecord, OtpType, DEFAULT_ALGORITHM, DEFAULT_DIGITS, DEFAULT_PERIOD,
};
use crate::report::{Diagnostic, EntrySource, LogReporter, Reporter};
use crate::secret::normalize_secret;

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Parse a JSON export value, logging diagnostics through `tracing`.
///
/// Never fails: an unrecognized top-level shape yields an empty vec.
#[must_use]
pub fn parse_json(value: &Value) -> Vec<CredentialRecord> {
    parse_json_with(value, &mut LogReporter)
}

/// Parse a JSON export value, sending skips and faults to `reporter`.
pub fn parse_json_with(value: &Value, reporter: &mut dyn Reporter) -> Vec<CredentialRecord> {
    if let Some(secrets) = value.get("secrets").and_then(Value::as_array) {
        return parse_flat_list(secrets, reporter);
    }

    if let Some(accounts) = detect_nested_accounts(value) {
        return parse_nested_accounts(accounts, reporter);
    }

    reporter.report(Diagnostic::warning(
        EntrySource::Input,
        "JSON input matches no known export dialect",
    ));
    Vec::new()
}

// ---------------------------------------------------------------------------
// Field helpers
// ---------------------------------------------------------------------------

fn str_field(element: &Value, key: &str) -> String {
    element
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Numeric field, `None` when absent, non-numeric, overflowing, or
/// zero (zero means "unset" in every source dialect).
fn u32_field(element: &Value, key: &str) -> Option<u32> {
    element
        .get(key)
        .and_then(Value::as_u64)
        .and_then(|v| u32::try_from(v).ok())
        .filter(|v| *v != 0)
}

fn first_non_empty(primary: String, fallback: String) -> String {
    if primary.is_empty() {
        fallback
    } else {
        primary
    }
}

// ---------------------------------------------------------------------------
// Dialect A: flat secrets list
// ---------------------------------------------------------------------------

fn parse_flat_list(secrets: &[Value], reporter: &mut dyn Reporter) -> Vec<CredentialRecord> {
    let mut records = Vec::new();

    for (index, element) in secrets.iter().enumerate() {
        let source = EntrySource::Element { index };

        let secret_raw = str_field(element, "secret");
        if secret_raw.trim().is_empty() {
            reporter.report(Diagnostic::warning(
                source,
                "element has an empty secret, dropped",
            ));
            continue;
        }

        let algorithm = {
            let raw = str_field(element, "algorithm");
            if raw.is_empty() {
                DEFAULT_ALGORITHM.to_string()
            } else {
                raw.to_uppercase()
            }
        };

        records.push(CredentialRecord::from_fields(CredentialFields {
            issuer: first_non_empty(str_field(element, "issuer"), str_field(element, "name")),
            account: str_field(element, "account"),
            secret: normalize_secret(&secret_raw),
            otp_type: OtpType::from_source_token(&str_field(element, "type")),
            digits: u32_field(element, "digits").unwrap_or(DEFAULT_DIGITS),
            period: u32_field(element, "period").unwrap_or(DEFAULT_PERIOD),
            counter: element.get("counter").and_then(Value::as_u64).unwrap_or(0),
            algorithm,
            category: str_field(element, "category"),
        }));
    }

    records
}

// ---------------------------------------------------------------------------
// Dialect B: nested accounts
// ---------------------------------------------------------------------------

/// Signature check: `version` present, `accounts` a non-empty list, and
/// the first account shaped like an authenticator entry.
fn detect_nested_accounts(value: &Value) -> Option<&Vec<Value>> {
    value.get("version")?;
    let accounts = value.get("accounts")?.as_array()?;
    let first = accounts.first()?;

    let has_entry_shape = first.get("issuerName").is_some()
        && first.get("timeStep").is_some()
        && (first.get("secret").is_some() || first.get("pushNotification").is_some());

    has_entry_shape.then_some(accounts)
}

fn parse_nested_accounts(accounts: &[Value], reporter: &mut dyn Reporter) -> Vec<CredentialRecord> {
    let mut records = Vec::new();

    for (index, account) in accounts.iter().enumerate() {
        let source = EntrySource::Element { index };

        let secret_raw = str_field(account, "secret");
        if secret_raw.trim().is_empty() {
            reporter.report(Diagnostic::warning(
                source,
                "account has no secret (push-only entries are dropped)",
            ));
            continue;
        }

        let algorithm = {
            let raw = str_field(account, "algorithm");
            if raw.is_empty() {
                DEFAULT_ALGORITHM.to_string()
            } else {
                raw.to_uppercase()
            }
        };

        records.push(CredentialRecord::from_fields(CredentialFields {
            issuer: first_non_empty(
                str_field(account, "issuerName"),
                str_field(account, "issuer"),
            ),
            account: first_non_empty(str_field(account, "userName"), str_field(account, "name")),
            secret: normalize_secret(&secret_raw),
            digits: u32_field(account, "digits").unwrap_or(DEFAULT_DIGITS),
            period: u32_field(account, "timeStep")
                .or_else(|| u32_field(account, "period"))
                .unwrap_or(DEFAULT_PERIOD),
            algorithm,
            ..CredentialFields::default()
        }));
    }

    records
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
