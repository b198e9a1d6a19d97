//! `sesame-import` — multi-format OTP backup import engine for SÉSAME.
//!
//! Ingests credential backups exported by unrelated authenticator
//! applications — each with its own HTML, CSV, or JSON layout — and
//! normalizes every entry into a [`CredentialRecord`] carrying a
//! canonical `otpauth://` URI.
//!
//! Each router (`parse_html`, `parse_csv`, `parse_json`) runs format
//! detection first: dialects are tried in a fixed priority order and the
//! first structural signature match wins. No dialect is ever assumed.
//!
//! The central reliability contract: a `parse_*` call never fails the
//! batch. A malformed entry is dropped with a [`Diagnostic`], an
//! unrecognized input yields an empty result, and processing of one
//! entry can never affect its siblings.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::arithmetic_side_effects))]

pub mod csv;
pub mod error;
pub mod html;
pub mod json;
pub mod record;
pub mod report;
pub mod secret;
pub mod uri;

pub use csv::{parse_csv, parse_csv_with};
pub use error::ImportError;
pub use html::{parse_html, parse_html_with};
pub use json::{parse_json, parse_json_with};
pub use record::{
    CredentialFields, CredentialRecord, OtpType, DEFAULT_ALGORITHM, DEFAULT_DIGITS, DEFAULT_PERIOD,
};
pub use report::{CollectingReporter, Diagnostic, EntrySource, LogReporter, Reporter, Severity};
pub use secret::normalize_secret;
pub use uri::build_otpauth_uri;
