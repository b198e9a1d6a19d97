//! Canonical `otpauth://` URI construction.
//!
//! The produced URIs are byte-compatible with the convention consumed
//! by every mainstream authenticator: percent-encoded label, fixed
//! query parameter order, and default-valued parameters omitted
//! entirely (a `digits=6` or `period=30` is never written).

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use url::form_urlencoded;

use crate::record::{CredentialFields, OtpType, DEFAULT_ALGORITHM, DEFAULT_DIGITS, DEFAULT_PERIOD};

/// Percent-encoding set equivalent to JavaScript's `encodeURIComponent`:
/// everything except ASCII alphanumerics and `- _ . ! ~ * ' ( )`.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Percent-encode one label part.
fn encode_label_part(raw: &str) -> String {
    utf8_percent_encode(raw, COMPONENT).to_string()
}

/// Build the URI label from issuer and account.
///
/// Both non-empty: `issuer:account`. One non-empty: that one alone.
/// Neither: the literal `Unknown`.
fn build_label(issuer: &str, account: &str) -> String {
    match (issuer.is_empty(), account.is_empty()) {
        (false, false) => format!(
            "{}:{}",
            encode_label_part(issuer),
            encode_label_part(account)
        ),
        (false, true) => encode_label_part(issuer),
        (true, false) => encode_label_part(account),
        (true, true) => "Unknown".to_string(),
    }
}

/// Assemble the canonical `otpauth://` URI for a field set.
///
/// Query parameters appear in this exact precedence, each suppressed at
/// its default value:
///
/// 1. `secret` — always present.
/// 2. `issuer` — iff issuer is non-empty.
/// 3. `digits` — iff digits ≠ 6.
/// 4. `period` — iff period ≠ 30 (TOTP only).
/// 5. `algorithm` — iff algorithm ≠ `SHA1`.
/// 6. `counter` — iff the type is HOTP, regardless of value.
///
/// Query encoding follows `application/x-www-form-urlencoded` (spaces
/// become `+`), matching what `URLSearchParams` produces.
#[must_use]
pub fn build_otpauth_uri(fields: &CredentialFields) -> String {
    let label = build_label(&fields.issuer, &fields.account);

    let mut query = form_urlencoded::Serializer::new(String::new());
    query.append_pair("secret", &fields.secret);
    if !fields.issuer.is_empty() {
        query.append_pair("issuer", &fields.issuer);
    }
    if fields.digits != DEFAULT_DIGITS {
        query.append_pair("digits", &fields.digits.to_string());
    }
    if fields.otp_type == OtpType::Totp && fields.period != DEFAULT_PERIOD {
        query.append_pair("period", &fields.period.to_string());
    }
    if fields.algorithm != DEFAULT_ALGORITHM {
        query.append_pair("algorithm", &fields.algorithm);
    }
    if fields.otp_type == OtpType::Hotp {
        query.append_pair("counter", &fields.counter.to_string());
    }

    format!(
        "otpauth://{}/{label}?{}",
        fields.otp_type.as_uri_str(),
        query.finish()
    )
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
