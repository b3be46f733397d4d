use std::borrow::Cow;

use crate::diag::{Diagnostic, LineIndex, Span};

/// Bytes of source text kept on each side of a diagnostic position.
pub const SNIPPET_RADIUS: usize = 24;

/// Per-call diagnostic accumulator.
///
/// Owns the [`LineIndex`] for the current input so every recorded diagnostic
/// carries a 1-based location and a short window of surrounding text.
/// Recording never fails.
#[derive(Debug, Default)]
pub struct ErrorHandler {
    diags: Vec<Diagnostic>,
    index: Option<LineIndex>,
    source: String,
}

impl ErrorHandler {
    /// Create an empty handler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget all diagnostics and bind to a new input.
    pub fn reset(&mut self, input: &str) {
        self.diags.clear();
        self.index = Some(LineIndex::new(input));
        self.source.clear();
        self.source.push_str(input);
    }

    /// Record a diagnostic at `span`, with an optional recovery note.
    pub fn record(
        &mut self,
        id: impl Into<Cow<'static, str>>,
        message: impl Into<String>,
        span: Span,
        recovery: Option<&str>,
    ) {
        let mut diag = Diagnostic::new(id, message, Some(span));
        if let Some(index) = &self.index {
            diag = diag.with_location(index.location(span.start));
        }
        if let Some(snippet) = snippet(&self.source, span.start) {
            diag = diag.with_snippet(snippet);
        }
        if let Some(note) = recovery {
            diag = diag.with_recovery(note);
        }
        self.diags.push(diag);
    }

    /// Diagnostics recorded since the last reset.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diags
    }

    /// First critical diagnostic, if any.
    pub fn first_critical(&self) -> Option<&Diagnostic> {
        self.diags.iter().find(|d| d.is_critical())
    }

    /// Whether a critical diagnostic was recorded.
    pub fn has_critical(&self) -> bool {
        self.first_critical().is_some()
    }
}

/// Text around `pos`, at most [`SNIPPET_RADIUS`] bytes each side, snapped to
/// char boundaries, with line breaks and tabs escaped.
pub fn snippet(source: &str, pos: usize) -> Option<String> {
    if source.is_empty() {
        return None;
    }
    let pos = pos.min(source.len());
    let mut start = pos.saturating_sub(SNIPPET_RADIUS);
    while !source.is_char_boundary(start) {
        start -= 1;
    }
    let mut end = (pos + SNIPPET_RADIUS).min(source.len());
    while !source.is_char_boundary(end) {
        end += 1;
    }
    let mut out = String::with_capacity(end - start + 8);
    for c in source[start..end].chars() {
        match c {
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push('\u{fffd}'),
            c => out.push(c),
        }
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diag::{Category, Location, codes};

    #[test]
    fn record_derives_location_and_snippet() {
        let mut h = ErrorHandler::new();
        h.reset("let a = 1;\nlet b = 'oops\n");
        h.record(
            codes::UNTERMINATED_STRING,
            "unterminated string",
            Span::new(19, 24),
            Some("closed at end of line"),
        );
        let d = &h.diagnostics()[0];
        assert_eq!(d.location, Some(Location { line: 2, column: 9 }));
        assert_eq!(d.category, Category::StringHandling);
        assert!(d.snippet.as_deref().unwrap().contains("'oops\\n"));
        assert_eq!(d.recovery.as_deref(), Some("closed at end of line"));
    }

    #[test]
    fn reset_clears_previous_run() {
        let mut h = ErrorHandler::new();
        h.reset("`x");
        h.record(codes::ITERATION_LIMIT, "stuck", Span::empty(0), None);
        assert!(h.has_critical());
        h.reset("ok");
        assert!(h.diagnostics().is_empty());
        assert!(!h.has_critical());
    }

    #[test]
    fn snippet_snaps_to_char_boundaries() {
        let text = "ééééééééééééééééééééééééééééé/";
        let s = snippet(text, text.len() - 1).unwrap();
        assert!(s.ends_with('/'));
        assert!(snippet("", 0).is_none());
    }

    #[test]
    fn snippet_masks_control_bytes() {
        let s = snippet("\u{0}\u{1}\u{2}", 1).unwrap();
        assert_eq!(s, "\u{fffd}\u{fffd}\u{fffd}");
    }
}
