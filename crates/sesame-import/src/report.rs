//! Structured diagnostics for skipped entries and entry-level faults.
//!
//! The routers never fail a batch: every drop, skip, or fault is
//! surfaced as a [`Diagnostic`] through an injected [`Reporter`] sink,
//! so callers can render them, count them, or assert on them in tests.
//! The sink is advisory only — it never affects the returned records.

use std::fmt;

use tracing::{error, warn};

/// How serious a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// An expected skip: empty secret, missing columns, unrecognized
    /// format. The batch is unaffected.
    Warning,
    /// An unexpected fault while processing one entry or the input as a
    /// whole. The offending entry is dropped; the batch continues.
    Error,
}

/// Where in the source input a diagnostic originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntrySource {
    /// The input as a whole (format detection, capability failures).
    Input,
    /// A table in an HTML export (0-based).
    Table {
        /// Table index in document order.
        table: usize,
    },
    /// A row within an HTML table (both 0-based; row 0 is the header
    /// row in header-column exports).
    TableRow {
        /// Table index in document order.
        table: usize,
        /// Row index within the table.
        row: usize,
    },
    /// A line in a CSV export (1-based over non-blank lines; line 1 is
    /// the header).
    Line {
        /// Line number.
        line: usize,
    },
    /// An element of a JSON list (0-based).
    Element {
        /// Element index.
        index: usize,
    },
}

impl fmt::Display for EntrySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input => write!(f, "input"),
            Self::Table { table } => write!(f, "table {table}"),
            Self::TableRow { table, row } => write!(f, "table {table}, row {row}"),
            Self::Line { line } => write!(f, "line {line}"),
            Self::Element { index } => write!(f, "element {index}"),
        }
    }
}

/// One structured diagnostic event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Warning (expected skip) or error (unexpected fault).
    pub severity: Severity,
    /// Which part of the input produced the event.
    pub source: EntrySource,
    /// Human-readable description.
    pub message: String,
}

impl Diagnostic {
    /// Build a warning diagnostic.
    pub fn warning(source: EntrySource, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            source,
            message: message.into(),
        }
    }

    /// Build an error diagnostic.
    pub fn error(source: EntrySource, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            source,
            message: message.into(),
        }
    }
}

/// Sink for diagnostics emitted while parsing one input.
pub trait Reporter {
    /// Receive one diagnostic event.
    fn report(&mut self, diagnostic: Diagnostic);
}

/// Default reporter: forwards diagnostics to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn report(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Warning => {
                warn!(source = %diagnostic.source, "{}", diagnostic.message);
            }
            Severity::Error => {
                error!(source = %diagnostic.source, "{}", diagnostic.message);
            }
        }
    }
}

/// Reporter that collects diagnostics in memory.
///
/// Used by tests and by callers that want to show a per-entry skip
/// report after an import.
#[derive(Debug, Default)]
pub struct CollectingReporter {
    /// Every diagnostic received, in emission order.
    pub diagnostics: Vec<Diagnostic>,
}

impl CollectingReporter {
    /// Create an empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Count diagnostics of a given severity.
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }
}

impl Reporter for CollectingReporter {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
