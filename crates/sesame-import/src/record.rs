//! Canonical credential records produced by the import routers.
//!
//! A [`CredentialRecord`] is constructed in full from one source entry
//! (one table row, one CSV line, one JSON element) and never mutated
//! afterwards. Its `canonical_uri` is derived once at construction time
//! via [`crate::uri::build_otpauth_uri`] and stays consistent with the
//! other fields by construction.

use serde::Serialize;

use crate::uri;

/// Default OTP digit count.
pub const DEFAULT_DIGITS: u32 = 6;

/// Default TOTP period in seconds.
pub const DEFAULT_PERIOD: u32 = 30;

/// Default OTP hash algorithm token.
pub const DEFAULT_ALGORITHM: &str = "SHA1";

// ---------------------------------------------------------------------------
// OTP type
// ---------------------------------------------------------------------------

/// OTP flavor for an imported credential.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OtpType {
    /// Time-based one-time password (RFC 6238).
    #[default]
    Totp,
    /// HMAC-based one-time password (RFC 4226).
    Hotp,
}

impl OtpType {
    /// Convert to the scheme segment of an `otpauth://` URI.
    #[must_use]
    pub const fn as_uri_str(self) -> &'static str {
        match self {
            Self::Totp => "totp",
            Self::Hotp => "hotp",
        }
    }

    /// Interpret a source token, case-insensitively.
    ///
    /// Anything that is not explicitly `hotp` — including an empty or
    /// absent token — is TOTP.
    #[must_use]
    pub fn from_source_token(token: &str) -> Self {
        if token.trim().eq_ignore_ascii_case("hotp") {
            Self::Hotp
        } else {
            Self::Totp
        }
    }
}

// ---------------------------------------------------------------------------
// Field set and record
// ---------------------------------------------------------------------------

/// Field set for one credential, before URI derivation.
///
/// Extraction strategies fill this in from the source entry, leaving
/// absent fields at their defaults, then hand it to
/// [`CredentialRecord::from_fields`].
#[derive(Debug, Clone)]
pub struct CredentialFields {
    /// Service/provider name. May be empty.
    pub issuer: String,
    /// Account/user label. May be empty.
    pub account: String,
    /// Normalized Base32 secret. A record is never built from an empty
    /// secret — routers drop such entries before reaching this type.
    pub secret: String,
    /// OTP flavor.
    pub otp_type: OtpType,
    /// OTP digit count.
    pub digits: u32,
    /// TOTP period in seconds. Meaningful only for TOTP.
    pub period: u32,
    /// HOTP counter. Meaningful only for HOTP.
    pub counter: u64,
    /// Upper-cased hash algorithm token (`SHA1`, `SHA256`, `SHA512`, or
    /// a pass-through token from the source).
    pub algorithm: String,
    /// Free-text grouping label. Empty string means "uncategorized".
    pub category: String,
}

impl Default for CredentialFields {
    fn default() -> Self {
        Self {
            issuer: String::new(),
            account: String::new(),
            secret: String::new(),
            otp_type: OtpType::Totp,
            digits: DEFAULT_DIGITS,
            period: DEFAULT_PERIOD,
            counter: 0,
            algorithm: DEFAULT_ALGORITHM.to_string(),
            category: String::new(),
        }
    }
}

/// The canonical unit of output for every import router.
///
/// Serializes to camelCase JSON for the UI layer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialRecord {
    /// Service/provider name. May be empty.
    pub issuer: String,
    /// Account/user label. May be empty.
    pub account: String,
    /// Normalized Base32 secret. Non-empty.
    pub secret: String,
    /// OTP flavor.
    pub otp_type: OtpType,
    /// OTP digit count.
    pub digits: u32,
    /// TOTP period in seconds.
    pub period: u32,
    /// HOTP counter.
    pub counter: u64,
    /// Upper-cased hash algorithm token.
    pub algorithm: String,
    /// Free-text grouping label. Empty string means "uncategorized",
    /// never null.
    pub category: String,
    /// The derived `otpauth://` representation. Computed exactly once
    /// at construction, never edited independently.
    pub canonical_uri: String,
}

impl CredentialRecord {
    /// Build a record from extracted fields, deriving `canonical_uri`.
    #[must_use]
    pub fn from_fields(fields: CredentialFields) -> Self {
        let canonical_uri = uri::build_otpauth_uri(&fields);
        Self {
            issuer: fields.issuer,
            account: fields.account,
            secret: fields.secret,
            otp_type: fields.otp_type,
            digits: fields.digits,
            period: fields.period,
            counter: fields.counter,
            algorithm: fields.algorithm,
            category: fields.category,
            canonical_uri,
        }
    }
}

// ---------------------------------------------------------------------------
// Field extraction helpers (shared by the routers)
// ---------------------------------------------------------------------------

/// Parse a numeric field, falling back to `default` when the value is
/// absent, unparsable, or zero (zero means "unset" in every source
/// dialect).
pub(crate) fn u32_or(raw: &str, default: u32) -> u32 {
    raw.trim()
        .parse::<u32>()
        .ok()
        .filter(|v| *v != 0)
        .unwrap_or(default)
}

/// Return `value` unless it is empty after trimming, else `default`.
pub(crate) fn non_empty_or(value: String, default: &str) -> String {
    if value.trim().is_empty() {
        default.to_string()
    } else {
        value
    }
}

/// Map the `-` "no value" marker some exports write into empty cells to
/// an actual empty string.
pub(crate) fn non_sentinel(value: String) -> String {
    if value == "-" {
        String::new()
    } else {
        value
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
