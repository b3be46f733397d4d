//! Diagnostics for comment-sweep.
//!
//! Provides [`Diagnostic`], [`Severity`], [`Category`], [`Span`], [`Location`],
//! and [`LineIndex`] types used to report problems found while tokenizing and
//! classifying source text. Diagnostic codes are defined in the [`codes`]
//! module.
//!
//! Diagnostics are values, never panics or errors: recording one is an
//! in-memory append and cannot fail.

#![warn(missing_docs)]

/// Diagnostic ID constants auto-generated from the code registry.
pub mod codes;

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;

// ── LineIndex ────────────────────────────────────────────────────────────

/// Maps byte offsets in a source string to line and column positions.
///
/// Lines and columns are **0-indexed** internally. Use [`LineIndex::line_col`]
/// to get a `(line, col)` pair, or [`LineIndex::location`] for the 1-based
/// [`Location`] shown to users.
///
/// The index is built in O(n) time and each lookup is O(log n) via binary
/// search.
#[derive(Debug, Clone)]
pub struct LineIndex {
    /// Byte offset of the start of each line.
    /// `line_starts[0]` is always 0.
    line_starts: Vec<usize>,
}

impl LineIndex {
    /// Build a `LineIndex` from source text.
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0usize];
        for (i, b) in text.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(i + 1);
            }
        }
        Self { line_starts }
    }

    /// Convert a byte offset to a 0-indexed `(line, column)` pair.
    ///
    /// If `offset` is past the end of the source, the last line is returned
    /// and the column keeps counting past the line end.
    pub fn line_col(&self, offset: usize) -> (usize, usize) {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(exact) => exact,
            Err(next) => next.saturating_sub(1),
        };
        let col = offset.saturating_sub(self.line_starts[line]);
        (line, col)
    }

    /// Convert a byte offset to a 1-based [`Location`].
    pub fn location(&self, offset: usize) -> Location {
        let (line, col) = self.line_col(offset);
        Location {
            line: line + 1,
            column: col + 1,
        }
    }

    /// Byte offset of the start of the given 0-indexed line.
    ///
    /// Returns `None` if `line` is out of bounds.
    pub fn line_start(&self, line: usize) -> Option<usize> {
        self.line_starts.get(line).copied()
    }

    /// Total number of lines (at least 1, even for empty input).
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

// ── Severity / Category ──────────────────────────────────────────────────

/// Severity level for a diagnostic.
///
/// Severity drives propagation: `Low` and `Medium` are recorded and scanning
/// continues, `High` continues but should be surfaced prominently, and
/// `Critical` means the caller must fall back or leave the input unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Cosmetic problem, output is still exact.
    Low,
    /// Malformed construct recovered locally.
    Medium,
    /// Output is probably incomplete or degraded.
    High,
    /// No forward progress or gross corruption; fall back.
    Critical,
}

/// Subsystem a diagnostic originates from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[non_exhaustive]
pub enum Category {
    /// Scan-loop safety and generic scanner failures.
    Tokenization,
    /// Quoted string literals.
    StringHandling,
    /// Backtick template literals and their interpolations.
    TemplateLiteral,
    /// Regular expression literals.
    Regex,
    /// Line, block, and HTML comments.
    CommentDetection,
    /// Preservation rule evaluation and registration.
    Preservation,
    /// Whole-pass validation of the token stream.
    Parsing,
    /// Reading and writing files at the orchestration boundary.
    FileProcessing,
}

// ── Span / Location ──────────────────────────────────────────────────────

/// Byte span in the source input.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Span {
    /// Byte offset of the first character (0-based).
    pub start: usize,
    /// Byte offset one past the last character.
    pub end: usize,
}

impl Span {
    /// Create a span covering `[start, end)`.
    ///
    /// Panics if `end < start`.
    pub fn new(start: usize, end: usize) -> Self {
        assert!(end >= start, "Span end ({end}) < start ({start})");
        Self { start, end }
    }

    /// Create a zero-width span at the given position.
    pub fn empty(pos: usize) -> Self {
        Self {
            start: pos,
            end: pos,
        }
    }

    /// Length of the span in bytes.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Whether the span covers no bytes.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// 1-based line/column position, derived from a byte offset.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Location {
    /// Line number, starting at 1.
    pub line: usize,
    /// Byte column within the line, starting at 1.
    pub column: usize,
}

// ── Diagnostic ───────────────────────────────────────────────────────────

/// A diagnostic recorded by a lexer, the rule engine, or the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Unique diagnostic code (e.g., `"CS1101"`).
    pub id: Cow<'static, str>,
    /// Subsystem the diagnostic comes from.
    pub category: Category,
    /// Severity level.
    pub severity: Severity,
    /// Human-readable diagnostic message.
    pub message: String,
    /// Optional byte span in the source input that this diagnostic relates to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span: Option<Span>,
    /// Line/column of `span.start`, when the source text was available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    /// Surrounding source text window, newlines escaped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
    /// What the scanner did to continue past the problem.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recovery: Option<String>,
    /// Machine-readable context for tooling. Keys and values are free-form strings.
    ///
    /// Uses `BTreeMap` for deterministic key ordering in serialized output.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<BTreeMap<String, String>>,
}

impl Diagnostic {
    /// Create a diagnostic whose category and severity come from the code
    /// registry.
    ///
    /// Codes missing from the registry default to
    /// [`Category::Tokenization`] / [`Severity::Medium`].
    pub fn new(
        id: impl Into<Cow<'static, str>>,
        message: impl Into<String>,
        span: Option<Span>,
    ) -> Self {
        let id = id.into();
        let severity = default_severity(&id).unwrap_or(Severity::Medium);
        let category = default_category(&id).unwrap_or(Category::Tokenization);
        Self {
            id,
            category,
            severity,
            message: message.into(),
            span,
            location: None,
            snippet: None,
            recovery: None,
            context: None,
        }
    }

    /// Override the registry severity (builder pattern).
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Override the registry category (builder pattern).
    pub fn with_category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    /// Attach a 1-based line/column location.
    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    /// Attach a surrounding-text window.
    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = Some(snippet.into());
        self
    }

    /// Attach a note describing the recovery strategy taken.
    pub fn with_recovery(mut self, recovery: impl Into<String>) -> Self {
        self.recovery = Some(recovery.into());
        self
    }

    /// Attach machine-readable context metadata (builder pattern).
    pub fn with_context(mut self, ctx: BTreeMap<String, String>) -> Self {
        self.context = Some(ctx);
        self
    }

    /// Whether this diagnostic is [`Severity::Critical`].
    pub fn is_critical(&self) -> bool {
        self.severity == Severity::Critical
    }

    /// Returns the human-readable explanation for this diagnostic's code, if available.
    pub fn explain(&self) -> Option<&'static str> {
        explain(&self.id)
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Low => write!(f, "low"),
            Severity::Medium => write!(f, "medium"),
            Severity::High => write!(f, "high"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Category::Tokenization => "tokenization",
            Category::StringHandling => "string-handling",
            Category::TemplateLiteral => "template-literal",
            Category::Regex => "regex",
            Category::CommentDetection => "comment-detection",
            Category::Preservation => "preservation",
            Category::Parsing => "parsing",
            Category::FileProcessing => "file-processing",
        };
        f.write_str(s)
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}[{}]: {}", self.severity, self.id, self.message)?;
        if let Some(loc) = self.location {
            write!(f, " at {}:{}", loc.line, loc.column)?;
        }
        Ok(())
    }
}

/// Returns the human-readable explanation for a diagnostic code, if known.
///
/// Auto-generated from `registry/diagnostics.json` at build time.
pub fn explain(id: &str) -> Option<&'static str> {
    include!(concat!(env!("OUT_DIR"), "/generated_explain.rs"))
}

/// Default severity registered for a diagnostic code.
pub fn default_severity(id: &str) -> Option<Severity> {
    include!(concat!(env!("OUT_DIR"), "/generated_severity.rs"))
}

/// Category registered for a diagnostic code.
pub fn default_category(id: &str) -> Option<Category> {
    include!(concat!(env!("OUT_DIR"), "/generated_category.rs"))
}

/// Highest severity in a slice of diagnostics, if any.
pub fn max_severity(diagnostics: &[Diagnostic]) -> Option<Severity> {
    diagnostics.iter().map(|d| d.severity).max()
}
