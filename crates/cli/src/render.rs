//! Pretty diagnostic rendering using ariadne.
//!
//! Converts comment-sweep's [`Diagnostic`] type into ariadne [`Report`]s for
//! coloured, source-annotated terminal output. Falls back to structured JSON
//! when the output is piped or when the user explicitly requests it.

use std::io::{self, IsTerminal};

use ariadne::{Color, Config, Label, Report, ReportKind, Source};
use comment_sweep_diagnostics::{Diagnostic, Severity};

// ── Output format ───────────────────────────────────────────────────────

/// Output format for reports and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Format {
    /// Coloured, source-annotated output (ariadne).
    Pretty,
    /// Machine-readable JSON.
    Json,
}

impl Format {
    /// Use the explicit choice, or pretty for terminals and JSON for pipes.
    pub(crate) fn resolve_or_detect(explicit: Option<&str>) -> Self {
        match explicit {
            Some("json") => Format::Json,
            Some("pretty") => Format::Pretty,
            _ => {
                if io::stdout().is_terminal() {
                    Format::Pretty
                } else {
                    Format::Json
                }
            }
        }
    }
}

// ── Severity mapping ────────────────────────────────────────────────────

fn report_kind(severity: Severity) -> ReportKind<'static> {
    match severity {
        Severity::Critical | Severity::High => ReportKind::Error,
        Severity::Medium => ReportKind::Warning,
        Severity::Low => ReportKind::Advice,
    }
}

fn severity_color(severity: Severity) -> Color {
    match severity {
        Severity::Critical => Color::Magenta,
        Severity::High => Color::Red,
        Severity::Medium => Color::Yellow,
        Severity::Low => Color::Blue,
    }
}

// ── Pretty rendering ────────────────────────────────────────────────────

/// Render diagnostics with source context to stderr.
///
/// Diagnostics without a span (fallback notices) are printed as standalone
/// lines.
pub(crate) fn render_diagnostics_pretty(source: &str, filename: &str, diagnostics: &[Diagnostic]) {
    if diagnostics.is_empty() {
        return;
    }

    let config = Config::default().with_compact(false);
    let mut cache = (filename, Source::from(source));

    for diag in diagnostics {
        if let Some(span) = &diag.span {
            // Clamp span to source length to avoid panics on truncated input.
            let start = span.start.min(source.len());
            let end = span.end.min(source.len()).max(start);

            let mut builder = Report::build(report_kind(diag.severity), (filename, start..end))
                .with_code(diag.id.as_ref())
                .with_message(&diag.message)
                .with_config(config);

            let label = diag.recovery.clone().unwrap_or_else(|| diag.message.clone());
            builder = builder.with_label(
                Label::new((filename, start..end))
                    .with_message(label)
                    .with_color(severity_color(diag.severity)),
            );

            if let Some(note) = context_note(diag) {
                builder = builder.with_note(note);
            }
            if let Some(explanation) = diag.explain() {
                builder = builder.with_help(explanation);
            }

            builder.finish().eprint(&mut cache).ok();
        } else {
            eprintln!("{}[{}]: {}", diag.severity, diag.id, diag.message);
            if let Some(recovery) = &diag.recovery {
                eprintln!("  = note: {recovery}");
            }
            if let Some(note) = context_note(diag) {
                eprintln!("  = note: {note}");
            }
            if let Some(explanation) = diag.explain() {
                eprintln!("  = help: {explanation}");
            }
        }
    }
}

fn context_note(diag: &Diagnostic) -> Option<String> {
    let ctx = diag.context.as_ref().filter(|c| !c.is_empty())?;
    Some(
        ctx.iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(", "),
    )
}

// ── Summary line ────────────────────────────────────────────────────────

/// Print a coloured per-severity count line, e.g. `1 high, 2 medium`.
pub(crate) fn print_summary(diagnostics: &[Diagnostic]) {
    use ariadne::Fmt;

    let mut counts = [0usize; 4];
    for d in diagnostics {
        counts[d.severity as usize] += 1;
    }
    let levels = [
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
    ];
    let parts: Vec<String> = levels
        .iter()
        .filter(|s| counts[**s as usize] > 0)
        .map(|s| {
            let text = format!("{} {s}", counts[*s as usize]);
            format!("{}", text.fg(severity_color(*s)))
        })
        .collect();
    if !parts.is_empty() {
        eprintln!("{}", parts.join(", "));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_format_wins() {
        assert_eq!(Format::resolve_or_detect(Some("json")), Format::Json);
        assert_eq!(Format::resolve_or_detect(Some("pretty")), Format::Pretty);
    }

    #[test]
    fn severities_map_to_report_kinds() {
        assert!(matches!(report_kind(Severity::Critical), ReportKind::Error));
        assert!(matches!(report_kind(Severity::Medium), ReportKind::Warning));
        assert!(matches!(report_kind(Severity::Low), ReportKind::Advice));
    }
}
