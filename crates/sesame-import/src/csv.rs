//! CSV export router.
//!
//! Two dialects, detected from the header line and tried in fixed
//! order:
//!
//! - **Embedded-URI** (password-manager style): the header names both a
//!   TOTP field and a folder field, and every data line carries a full
//!   `otpauth://` URI in one of its columns. Extraction is URI parsing,
//!   not field reconstruction.
//! - **Columnar**: the header names service/secret columns (localized
//!   or English); column indices are resolved from the header and data
//!   lines are read positionally.
//!
//! When neither signature matches, the result is empty plus a warning,
//! never an error to the caller.

use once_cell::sync::Lazy;
use percent_encoding::percent_decode_str;
use regex::Regex;
use url::Url;

use crate::error::ImportError;
use crate::record::{
    non_empty_or, u32_or, CredentialFields, CredentialRecord, OtpType, DEFAULT_ALGORITHM,
    DEFAULT_DIGITS, DEFAULT_PERIOD,
};
use crate::report::{Diagnostic, EntrySource, LogReporter, Reporter};
use crate::secret::normalize_secret;

// ---------------------------------------------------------------------------
// Dialect signatures
// ---------------------------------------------------------------------------

/// Embedded-URI dialect header tokens.
const TOTP_FIELD_TOKEN: &str = "login_totp";
const FOLDER_FIELD_TOKEN: &str = "folder";

/// Columnar dialect header tokens (localized forms are exact,
/// English forms are case-insensitive).
const HEADER_SERVICE: &str = "服务名称";
const HEADER_ACCOUNT_LONG: &str = "账户信息";
const HEADER_ACCOUNT: &str = "账户";
const HEADER_SECRET: &str = "密钥";
const HEADER_TYPE: &str = "类型";
const HEADER_DIGITS: &str = "位数";
const HEADER_PERIOD: &str = "周期";
const HEADER_ALGORITHM: &str = "算法";
const HEADER_CATEGORY: &str = "分类";

/// Matches an embedded `otpauth://` URI up to the next comma or
/// whitespace.
static OTPAUTH_URI: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"otpauth://[^,\s]+").unwrap_or_else(|e| unreachable!("static pattern: {e}"))
});

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Parse a CSV export, logging diagnostics through `tracing`.
///
/// Never fails: unrecognized or unparsable input yields an empty vec.
#[must_use]
pub fn parse_csv(csv_text: &str) -> Vec<CredentialRecord> {
    parse_csv_with(csv_text, &mut LogReporter)
}

/// Parse a CSV export, sending skips and faults to `reporter`.
pub fn parse_csv_with(csv_text: &str, reporter: &mut dyn Reporter) -> Vec<CredentialRecord> {
    let lines: Vec<&str> = csv_text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    if lines.len() < 2 {
        reporter.report(Diagnostic::warning(
            EntrySource::Input,
            "CSV input has no data lines",
        ));
        return Vec::new();
    }

    let header = lines[0];
    if header.contains(TOTP_FIELD_TOKEN) && header.contains(FOLDER_FIELD_TOKEN) {
        return parse_embedded_uri_lines(&lines, reporter);
    }

    let header_lower = header.to_lowercase();
    if header.contains(HEADER_SERVICE)
        || header.contains(HEADER_SECRET)
        || header_lower.contains("service")
        || header_lower.contains("secret")
    {
        return parse_columnar_lines(&lines, reporter);
    }

    reporter.report(Diagnostic::warning(
        EntrySource::Input,
        ImportError::UnrecognizedFormat("CSV header matches no known export dialect".to_string())
            .to_string(),
    ));
    Vec::new()
}

// ---------------------------------------------------------------------------
// Dialect A: embedded otpauth:// URI per line
// ---------------------------------------------------------------------------

fn parse_embedded_uri_lines(lines: &[&str], reporter: &mut dyn Reporter) -> Vec<CredentialRecord> {
    let mut records = Vec::new();

    for (offset, line) in lines.iter().enumerate().skip(1) {
        let source = EntrySource::Line {
            line: offset.saturating_add(1),
        };

        let Some(uri_match) = OTPAUTH_URI.find(line) else {
            reporter.report(Diagnostic::warning(
                source,
                "no embedded otpauth:// URI in line, dropped",
            ));
            continue;
        };

        match extract_from_embedded_uri(uri_match.as_str()) {
            Ok(fields) => records.push(CredentialRecord::from_fields(fields)),
            Err(e) => reporter.report(Diagnostic::error(source, e.to_string())),
        }
    }

    records
}

/// Decode an embedded `otpauth://` URI and read its own query
/// parameters back out.
///
/// The issuer falls back to the first label segment when the URI has no
/// `issuer` parameter; the account is everything after the first label
/// segment.
fn extract_from_embedded_uri(raw: &str) -> Result<CredentialFields, ImportError> {
    let decoded = percent_decode_str(raw)
        .decode_utf8()
        .map_err(|e| ImportError::InvalidUri(format!("URI is not valid UTF-8 once decoded: {e}")))?;
    let url = Url::parse(&decoded)
        .map_err(|e| ImportError::InvalidUri(format!("embedded URI does not parse: {e}")))?;

    let mut fields = CredentialFields::default();
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "issuer" => fields.issuer = value.into_owned(),
            "secret" => fields.secret = value.into_owned(),
            "digits" => fields.digits = u32_or(&value, DEFAULT_DIGITS),
            "period" => fields.period = u32_or(&value, DEFAULT_PERIOD),
            "algorithm" => fields.algorithm = non_empty_or(value.into_owned(), DEFAULT_ALGORITHM),
            _ => {}
        }
    }

    if fields.secret.trim().is_empty() {
        return Err(ImportError::MalformedEntry(
            "embedded URI carries no secret parameter".to_string(),
        ));
    }
    fields.secret = normalize_secret(&fields.secret);

    let label = percent_decode_str(url.path().trim_start_matches('/'))
        .decode_utf8_lossy()
        .into_owned();
    match label.split_once(':') {
        Some((issuer_part, account)) => {
            fields.account = account.to_string();
            if fields.issuer.is_empty() {
                fields.issuer = issuer_part.to_string();
            }
        }
        None => {
            if fields.issuer.is_empty() {
                fields.issuer = label;
            }
        }
    }

    Ok(fields)
}

// ---------------------------------------------------------------------------
// Dialect B: columnar
// ---------------------------------------------------------------------------

/// Tokenize one CSV line into fields, respecting quoting.
fn split_csv_line(line: &str) -> Vec<String> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(line.as_bytes());

    reader
        .records()
        .next()
        .and_then(Result::ok)
        .map(|record| record.iter().map(ToString::to_string).collect())
        .unwrap_or_default()
}

/// Resolved column index for each recognized header, `None` when the
/// column is absent (the field then takes its default).
struct ColumnMap {
    service: Option<usize>,
    account: Option<usize>,
    secret: Option<usize>,
    otp_type: Option<usize>,
    digits: Option<usize>,
    period: Option<usize>,
    algorithm: Option<usize>,
    category: Option<usize>,
}

fn resolve_columns(headers: &[String]) -> ColumnMap {
    let position = |matches: &dyn Fn(&str) -> bool| headers.iter().position(|h| matches(h));
    ColumnMap {
        service: position(&|h| h == HEADER_SERVICE || h.eq_ignore_ascii_case("service")),
        account: position(&|h| {
            h == HEADER_ACCOUNT_LONG || h == HEADER_ACCOUNT || h.eq_ignore_ascii_case("account")
        }),
        secret: position(&|h| h == HEADER_SECRET || h.eq_ignore_ascii_case("secret")),
        otp_type: position(&|h| h == HEADER_TYPE || h.eq_ignore_ascii_case("type")),
        digits: position(&|h| h == HEADER_DIGITS || h.eq_ignore_ascii_case("digits")),
        period: position(&|h| h.contains(HEADER_PERIOD) || h.to_lowercase().contains("period")),
        algorithm: position(&|h| h == HEADER_ALGORITHM || h.eq_ignore_ascii_case("algorithm")),
        category: position(&|h| h == HEADER_CATEGORY || h.eq_ignore_ascii_case("category")),
    }
}

fn parse_columnar_lines(lines: &[&str], reporter: &mut dyn Reporter) -> Vec<CredentialRecord> {
    let columns = resolve_columns(&split_csv_line(lines[0]));
    let mut records = Vec::new();

    for (offset, line) in lines.iter().enumerate().skip(1) {
        let source = EntrySource::Line {
            line: offset.saturating_add(1),
        };

        let values = split_csv_line(line);
        let field =
            |column: Option<usize>| column.and_then(|idx| values.get(idx)).cloned().unwrap_or_default();

        let secret_raw = field(columns.secret);
        if secret_raw.trim().is_empty() {
            reporter.report(Diagnostic::warning(source, "line has an empty secret, dropped"));
            continue;
        }

        records.push(CredentialRecord::from_fields(CredentialFields {
            issuer: field(columns.service),
            account: field(columns.account),
            secret: normalize_secret(&secret_raw),
            otp_type: OtpType::from_source_token(&field(columns.otp_type)),
            digits: u32_or(&field(columns.digits), DEFAULT_DIGITS),
            period: u32_or(&field(columns.period), DEFAULT_PERIOD),
            algorithm: non_empty_or(field(columns.algorithm), DEFAULT_ALGORITHM),
            category: field(columns.category),
            ..CredentialFields::default()
        }));
    }

    records
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{CollectingReporter, Severity};

    #[test]
    fn too_few_lines_yield_empty_with_warning() {
        let mut reporter = CollectingReporter::new();
        assert!(parse_csv_with("服务名称,密钥\n", &mut reporter).is_empty());
        assert_eq!(reporter.count(Severity::Warning), 1);
    }

    #[test]
    fn unrecognized_header_yields_empty_with_warning() {
        let mut reporter = CollectingReporter::new();
        let records = parse_csv_with("name,age\nbob,42\n", &mut reporter);
        assert!(records.is_empty());
        assert_eq!(reporter.count(Severity::Warning), 1);
    }

    #[test]
    fn embedded_uri_dialect_round_trips_parameters() {
        let input = "folder,favorite,type,name,login_uri,login_totp\n\
                     ,,login,Acme,,otpauth://totp/Acme:bob?secret=ABC123&digits=8\n";
        let records = parse_csv(input);
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.issuer, "Acme");
        assert_eq!(record.account, "bob");
        assert_eq!(record.secret, "ABC123");
        assert_eq!(record.digits, 8);
        assert_eq!(record.period, 30);
        assert!(record.canonical_uri.contains("digits=8"));
    }

    #[test]
    fn embedded_uri_issuer_parameter_wins_over_label() {
        let input = "folder,login_totp\n\
                     ,otpauth://totp/Label:alice?secret=AAAA&issuer=RealIssuer\n";
        let records = parse_csv(input);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].issuer, "RealIssuer");
        assert_eq!(records[0].account, "alice");
    }

    #[test]
    fn embedded_uri_percent_encoded_label_is_decoded() {
        let input = "folder,login_totp\n\
                     ,otpauth://totp/Acme%3Abob%40x.com?secret=AAAA\n";
        let records = parse_csv(input);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].issuer, "Acme");
        assert_eq!(records[0].account, "bob@x.com");
    }

    #[test]
    fn embedded_uri_line_without_uri_is_dropped() {
        let input = "folder,login_totp\n\
                     some,plain,line\n\
                     ,otpauth://totp/A?secret=BBBB\n";
        let mut reporter = CollectingReporter::new();
        let records = parse_csv_with(input, &mut reporter);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].secret, "BBBB");
        assert_eq!(reporter.count(Severity::Warning), 1);
        assert_eq!(reporter.diagnostics[0].source, EntrySource::Line { line: 2 });
    }

    #[test]
    fn embedded_uri_without_secret_is_an_entry_error() {
        let input = "folder,login_totp\n\
                     ,otpauth://totp/Acme:bob?digits=8\n";
        let mut reporter = CollectingReporter::new();
        let records = parse_csv_with(input, &mut reporter);
        assert!(records.is_empty());
        assert_eq!(reporter.count(Severity::Error), 1);
    }

    #[test]
    fn columnar_dialect_resolves_localized_headers() {
        let input = "分类,服务名称,账户信息,密钥,位数\n\
                     Work,GitHub,bob@x.com,abcd efgh,8\n";
        let records = parse_csv(input);
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.issuer, "GitHub");
        assert_eq!(record.account, "bob@x.com");
        assert_eq!(record.category, "Work");
        assert_eq!(record.secret, "ABCDEFGH");
        assert_eq!(record.digits, 8);
    }

    #[test]
    fn columnar_dialect_accepts_english_headers_case_insensitively() {
        let input = "Service,Account,Secret,Type\n\
                     Acme,alice,jbswy3dp,hotp\n";
        let records = parse_csv(input);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].otp_type, OtpType::Hotp);
        assert!(records[0].canonical_uri.starts_with("otpauth://hotp/"));
    }

    #[test]
    fn columnar_missing_columns_take_defaults() {
        let input = "service,secret\nAcme,JBSWY3DP\n";
        let records = parse_csv(input);
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.account, "");
        assert_eq!(record.digits, 6);
        assert_eq!(record.period, 30);
        assert_eq!(record.algorithm, "SHA1");
        assert_eq!(record.category, "");
    }

    #[test]
    fn columnar_blank_secret_is_dropped() {
        let input = "service,secret\nAcme,\nBeta,JBSWY3DP\n";
        let mut reporter = CollectingReporter::new();
        let records = parse_csv_with(input, &mut reporter);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].issuer, "Beta");
        assert_eq!(reporter.count(Severity::Warning), 1);
    }

    #[test]
    fn columnar_quoted_fields_are_tokenized() {
        let input = "service,account,secret\n\"Acme, Inc\",alice,JBSWY3DP\n";
        let records = parse_csv(input);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].issuer, "Acme, Inc");
    }
}
