//! Debug-logging call removal.
//!
//! Line-oriented: call sites come from the legacy lexer's
//! [`call_spans`](crate::lexer::legacy::call_spans), so calls inside strings
//! and comments are never touched. A call that is the only thing on its
//! line(s) takes the whole line with it.

use serde::Serialize;

use crate::diag::Span;
use crate::lexer::LexError;
use crate::lexer::legacy::call_spans;

/// Callees removed when the configuration names none.
pub const DEFAULT_LOG_CALLEES: &[&str] = &[
    "console.log",
    "console.debug",
    "console.info",
    "console.trace",
];

/// Outcome of [`strip_log_calls`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogStripResult {
    /// Text with the calls removed.
    pub content: String,
    /// Whether `content` differs from the input.
    pub modified: bool,
    /// Calls removed.
    pub removed: usize,
}

/// Remove every call to one of `callees` that stands as a statement of its
/// own. Calls used as a value or as the body of a control header are kept.
///
/// ```
/// use comment_sweep_core::{DEFAULT_LOG_CALLEES, strip_log_calls};
///
/// let r = strip_log_calls("a();\n  console.log('x');\nb();\n", DEFAULT_LOG_CALLEES).unwrap();
/// assert_eq!(r.content, "a();\nb();\n");
/// assert_eq!(r.removed, 1);
/// ```
pub fn strip_log_calls<S: AsRef<str>>(
    input: &str,
    callees: &[S],
) -> Result<LogStripResult, LexError> {
    let spans = call_spans(input, callees)?;
    let mut content = String::with_capacity(input.len());
    let mut pos = 0usize;
    for span in &spans {
        let cut = widen_to_line(input, *span);
        content.push_str(&input[pos..cut.start]);
        pos = cut.end;
    }
    content.push_str(&input[pos..]);

    if !spans.is_empty() {
        log::debug!("removed {} log calls", spans.len());
    }
    Ok(LogStripResult {
        modified: !spans.is_empty(),
        content,
        removed: spans.len(),
    })
}

/// Grow `span` to whole lines (trailing newline included) when only
/// whitespace shares those lines with it.
fn widen_to_line(input: &str, span: Span) -> Span {
    let line_start = input[..span.start].rfind('\n').map_or(0, |i| i + 1);
    let line_end = input[span.end..]
        .find('\n')
        .map_or(input.len(), |i| span.end + i);
    let before = &input[line_start..span.start];
    let after = &input[span.end..line_end];
    if !before.trim().is_empty() || !after.trim().is_empty() {
        return span;
    }
    let end = if line_end < input.len() { line_end + 1 } else { line_end };
    Span::new(line_start, end)
}
