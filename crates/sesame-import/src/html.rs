//! HTML export router.
//!
//! Detects one of three mutually exclusive HTML export dialects, tried
//! in fixed priority order — first structural match wins, no fallback
//! blending:
//!
//! 1. **Tagged-table**: `<table class="otp-entry">` blocks whose first
//!    cell holds a sequence of `<p><b>…</b></p>` field paragraphs
//!    (issuer, account, then `Type:`/`Algorithm:`/`Digits:`/`Secret:`/
//!    `Period:` labeled values).
//! 2. **Header-column**: some table's header row names at least a
//!    service and a secret column. Column order is resolved from the
//!    header texts, never assumed.
//! 3. **Legacy headerless**: every row of every table read
//!    positionally — issuer, account, secret (or issuer, secret for
//!    two-cell rows).
//!
//! Each row or table entry is processed in isolation: a fault in one
//! produces a diagnostic and never affects its siblings.

use scraper::{ElementRef, Html, Selector};

use crate::error::ImportError;
use crate::record::{
    non_empty_or, non_sentinel, u32_or, CredentialFields, CredentialRecord, OtpType,
    DEFAULT_ALGORITHM, DEFAULT_DIGITS, DEFAULT_PERIOD,
};
use crate::report::{Diagnostic, EntrySource, LogReporter, Reporter};
use crate::secret::normalize_secret;

// ---------------------------------------------------------------------------
// Dialect signatures
// ---------------------------------------------------------------------------

/// Marker class carried by tagged-table export tables.
const TAGGED_TABLE_SELECTOR: &str = "table.otp-entry";

/// Header tokens for the header-column dialect (substring match).
const HEADER_SERVICE: &str = "服务名称";
const HEADER_ACCOUNT: &str = "账户";
const HEADER_CATEGORY: &str = "分类";
const HEADER_SECRET: &str = "密钥";
const HEADER_DIGITS: &str = "位数";
const HEADER_PERIOD: &str = "周期";
const HEADER_ALGORITHM: &str = "算法";

/// Field label prefixes inside tagged-table paragraphs.
const LABEL_TYPE: &str = "Type:";
const LABEL_ALGORITHM: &str = "Algorithm:";
const LABEL_DIGITS: &str = "Digits:";
const LABEL_SECRET: &str = "Secret:";
const LABEL_PERIOD: &str = "Period:";

/// Minimum field paragraphs for a tagged-table entry to be usable.
const MIN_TAGGED_PARAGRAPHS: usize = 4;

// ---------------------------------------------------------------------------
// Selectors
// ---------------------------------------------------------------------------

struct Selectors {
    table: Selector,
    tagged_table: Selector,
    tr: Selector,
    th: Selector,
    td: Selector,
    p: Selector,
    b: Selector,
}

impl Selectors {
    fn new() -> Result<Self, String> {
        Ok(Self {
            table: parse_selector("table")?,
            tagged_table: parse_selector(TAGGED_TABLE_SELECTOR)?,
            tr: parse_selector("tr")?,
            th: parse_selector("th")?,
            td: parse_selector("td")?,
            p: parse_selector("p")?,
            b: parse_selector("b")?,
        })
    }
}

fn parse_selector(css: &str) -> Result<Selector, String> {
    Selector::parse(css).map_err(|e| format!("invalid selector `{css}`: {e}"))
}

/// Concatenated, trimmed text content of an element.
fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Parse an HTML export, logging diagnostics through `tracing`.
///
/// Never fails: unrecognized or unparsable input yields an empty vec.
#[must_use]
pub fn parse_html(html_text: &str) -> Vec<CredentialRecord> {
    parse_html_with(html_text, &mut LogReporter)
}

/// Parse an HTML export, sending skips and faults to `reporter`.
pub fn parse_html_with(html_text: &str, reporter: &mut dyn Reporter) -> Vec<CredentialRecord> {
    let selectors = match Selectors::new() {
        Ok(s) => s,
        Err(message) => {
            reporter.report(Diagnostic::error(
                EntrySource::Input,
                ImportError::Capability(message).to_string(),
            ));
            return Vec::new();
        }
    };

    let doc = Html::parse_document(html_text);

    let tables: Vec<ElementRef<'_>> = doc.select(&selectors.table).collect();
    if tables.is_empty() {
        reporter.report(Diagnostic::warning(
            EntrySource::Input,
            "no <table> element found in HTML input",
        ));
        return Vec::new();
    }

    let tagged: Vec<ElementRef<'_>> = doc.select(&selectors.tagged_table).collect();
    if !tagged.is_empty() {
        return parse_tagged_tables(&tagged, &selectors, reporter);
    }

    if detect_header_column(&tables, &selectors) {
        return parse_header_column_tables(&tables, &selectors, reporter);
    }

    parse_legacy_tables(&tables, &selectors, reporter)
}

// ---------------------------------------------------------------------------
// Dialect 1: tagged-table
// ---------------------------------------------------------------------------

fn parse_tagged_tables(
    tables: &[ElementRef<'_>],
    selectors: &Selectors,
    reporter: &mut dyn Reporter,
) -> Vec<CredentialRecord> {
    let mut records = Vec::new();
    for (table_idx, table) in tables.iter().enumerate() {
        match parse_tagged_table(*table, table_idx, selectors) {
            Ok(fields) => records.push(CredentialRecord::from_fields(fields)),
            Err(diagnostic) => reporter.report(diagnostic),
        }
    }
    records
}

/// Extract one entry from a tagged table.
///
/// The zeroth paragraph's bold span is the issuer, the first is the
/// account; remaining paragraphs carry `Label: <b>value</b>` pairs.
fn parse_tagged_table(
    table: ElementRef<'_>,
    table_idx: usize,
    selectors: &Selectors,
) -> Result<CredentialFields, Diagnostic> {
    let source = EntrySource::Table { table: table_idx };

    let Some(first_cell) = table.select(&selectors.td).next() else {
        return Err(Diagnostic::warning(source, "tagged table has no <td> cell"));
    };

    let paragraphs: Vec<ElementRef<'_>> = first_cell.select(&selectors.p).collect();
    if paragraphs.len() < MIN_TAGGED_PARAGRAPHS {
        return Err(Diagnostic::warning(
            source,
            format!(
                "tagged entry has {} field paragraph(s), expected at least {MIN_TAGGED_PARAGRAPHS}",
                paragraphs.len()
            ),
        ));
    }

    let mut fields = CredentialFields::default();
    let mut secret_raw = String::new();

    for (idx, paragraph) in paragraphs.iter().enumerate() {
        let Some(bold) = paragraph.select(&selectors.b).next() else {
            continue;
        };
        let text = element_text(*paragraph);
        let value = element_text(bold);

        if idx == 0 {
            fields.issuer = value;
        } else if idx == 1 {
            fields.account = value;
        } else if text.starts_with(LABEL_TYPE) {
            fields.otp_type = OtpType::from_source_token(&value);
        } else if text.starts_with(LABEL_ALGORITHM) {
            fields.algorithm = value.to_uppercase();
        } else if text.starts_with(LABEL_DIGITS) {
            fields.digits = u32_or(&value, DEFAULT_DIGITS);
        } else if text.starts_with(LABEL_SECRET) {
            secret_raw = value;
        } else if text.starts_with(LABEL_PERIOD) {
            fields.period = u32_or(&value, DEFAULT_PERIOD);
        }
    }

    if secret_raw.trim().is_empty() {
        return Err(Diagnostic::warning(
            source,
            "tagged entry has no parsable secret, dropped",
        ));
    }
    fields.secret = normalize_secret(&secret_raw);

    Ok(fields)
}

// ---------------------------------------------------------------------------
// Dialect 2: header-column
// ---------------------------------------------------------------------------

/// A table qualifies when it has at least a header row plus one data
/// row and its `<th>` texts contain both the service and secret tokens.
fn detect_header_column(tables: &[ElementRef<'_>], selectors: &Selectors) -> bool {
    tables.iter().any(|table| {
        let rows: Vec<ElementRef<'_>> = table.select(&selectors.tr).collect();
        let Some(header_row) = rows.first() else {
            return false;
        };
        if rows.len() < 2 {
            return false;
        }
        let header = header_texts(*header_row, selectors).join(",");
        header.contains(HEADER_SERVICE) && header.contains(HEADER_SECRET)
    })
}

fn header_texts(header_row: ElementRef<'_>, selectors: &Selectors) -> Vec<String> {
    header_row
        .select(&selectors.th)
        .map(element_text)
        .collect()
}

/// Resolved column index for each recognized header, `None` when the
/// header is absent (the field then takes its default).
struct HeaderColumns {
    service: Option<usize>,
    account: Option<usize>,
    category: Option<usize>,
    secret: Option<usize>,
    digits: Option<usize>,
    period: Option<usize>,
    algorithm: Option<usize>,
}

fn resolve_columns(headers: &[String]) -> HeaderColumns {
    let find = |token: &str| headers.iter().position(|h| h.contains(token));
    HeaderColumns {
        service: find(HEADER_SERVICE),
        account: find(HEADER_ACCOUNT),
        category: find(HEADER_CATEGORY),
        secret: find(HEADER_SECRET),
        digits: find(HEADER_DIGITS),
        period: find(HEADER_PERIOD),
        algorithm: find(HEADER_ALGORITHM),
    }
}

fn parse_header_column_tables(
    tables: &[ElementRef<'_>],
    selectors: &Selectors,
    reporter: &mut dyn Reporter,
) -> Vec<CredentialRecord> {
    let mut records = Vec::new();

    for (table_idx, table) in tables.iter().enumerate() {
        let rows: Vec<ElementRef<'_>> = table.select(&selectors.tr).collect();
        let Some((header_row, data_rows)) = rows.split_first() else {
            continue;
        };
        let columns = resolve_columns(&header_texts(*header_row, selectors));

        for (offset, row) in data_rows.iter().enumerate() {
            let source = EntrySource::TableRow {
                table: table_idx,
                row: offset.saturating_add(1),
            };
            match parse_header_column_row(*row, &columns, selectors, source) {
                Ok(fields) => records.push(CredentialRecord::from_fields(fields)),
                Err(diagnostic) => reporter.report(diagnostic),
            }
        }
    }

    records
}

/// Text of the cell a resolved column points at, or empty when the
/// column is unresolved or the row is too short.
fn cell_text(cells: &[ElementRef<'_>], column: Option<usize>) -> String {
    column
        .and_then(|idx| cells.get(idx))
        .map_or_else(String::new, |cell| element_text(*cell))
}

fn parse_header_column_row(
    row: ElementRef<'_>,
    columns: &HeaderColumns,
    selectors: &Selectors,
    source: EntrySource,
) -> Result<CredentialFields, Diagnostic> {
    let cells: Vec<ElementRef<'_>> = row.select(&selectors.td).collect();
    if cells.len() < 3 {
        return Err(Diagnostic::warning(
            source,
            format!("row has {} cell(s), expected at least 3", cells.len()),
        ));
    }

    let secret_raw = cell_text(&cells, columns.secret);
    if secret_raw.trim().is_empty() || secret_raw == "-" {
        return Err(Diagnostic::warning(source, "row has an empty secret, dropped"));
    }

    Ok(CredentialFields {
        issuer: cell_text(&cells, columns.service),
        account: non_sentinel(cell_text(&cells, columns.account)),
        category: non_sentinel(cell_text(&cells, columns.category)),
        secret: normalize_secret(&secret_raw),
        digits: u32_or(&cell_text(&cells, columns.digits), DEFAULT_DIGITS),
        period: u32_or(&cell_text(&cells, columns.period), DEFAULT_PERIOD),
        algorithm: non_empty_or(cell_text(&cells, columns.algorithm), DEFAULT_ALGORITHM),
        ..CredentialFields::default()
    })
}

// ---------------------------------------------------------------------------
// Dialect 3: legacy headerless
// ---------------------------------------------------------------------------

fn parse_legacy_tables(
    tables: &[ElementRef<'_>],
    selectors: &Selectors,
    reporter: &mut dyn Reporter,
) -> Vec<CredentialRecord> {
    let mut records = Vec::new();

    for (table_idx, table) in tables.iter().enumerate() {
        for (row_idx, row) in table.select(&selectors.tr).enumerate() {
            let cells: Vec<ElementRef<'_>> = row.select(&selectors.td).collect();
            // Layout rows (headers, separators) have fewer than 2 cells.
            if cells.len() < 2 {
                continue;
            }

            let source = EntrySource::TableRow {
                table: table_idx,
                row: row_idx,
            };

            let (issuer, account, secret_raw) = if cells.len() >= 3 {
                (
                    element_text(cells[0]),
                    element_text(cells[1]),
                    element_text(cells[2]),
                )
            } else {
                (element_text(cells[0]), String::new(), element_text(cells[1]))
            };

            if secret_raw.trim().is_empty() {
                reporter.report(Diagnostic::warning(
                    source,
                    "row has an empty secret, dropped",
                ));
                continue;
            }

            records.push(CredentialRecord::from_fields(CredentialFields {
                issuer,
                account,
                secret: normalize_secret(&secret_raw),
                ..CredentialFields::default()
            }));
        }
    }

    records
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
