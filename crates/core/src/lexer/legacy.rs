//! Legacy lexer.
//!
//! A coarse, stateless single pass: it separates comments, quoted strings,
//! backtick regions, and code, but knows nothing about regular expression
//! literals or `${}` nesting. A backtick region ends at the next unescaped
//! backtick. It is the fallback for [`super::ContextLexer`] and the only
//! engine behind the line-oriented tools ([`crate::logs`], JSONC config).

use super::{CommentStyle, LexError, Token, TokenContext, TokenKind, Tokenize};
use crate::diag::{Diagnostic, Span};

/// The legacy lexer as a [`Tokenize`] engine.
///
/// It records no diagnostics: every construct simply ends at its closing
/// delimiter, a newline (strings), or end of input.
#[derive(Debug, Default, Clone, Copy)]
pub struct LegacyLexer;

impl LegacyLexer {
    /// Create the lexer.
    pub fn new() -> Self {
        Self
    }
}

impl Tokenize for LegacyLexer {
    fn name(&self) -> &'static str {
        "legacy"
    }

    fn tokenize<'a>(&mut self, input: &'a str) -> Result<Vec<Token<'a>>, LexError> {
        tokenize(input)
    }

    fn diagnostics(&self) -> &[Diagnostic] {
        &[]
    }
}

/// Tokenize `input` with the legacy rules.
pub fn tokenize(input: &str) -> Result<Vec<Token<'_>>, LexError> {
    let b = input.as_bytes();
    let len = b.len();
    let mut toks = Vec::new();
    let mut i = 0usize;

    while i < len {
        let start = i;
        let (ctx, end) = match b[i] {
            b'/' if b.get(i + 1) == Some(&b'/') => {
                let mut j = i + 2;
                while j < len && !matches!(b[j], b'\n' | b'\r') {
                    j += 1;
                }
                (comment(CommentStyle::Line), j)
            }
            b'/' if b.get(i + 1) == Some(&b'*') => {
                let end = input[i + 2..].find("*/").map_or(len, |rel| i + 2 + rel + 2);
                (comment(CommentStyle::Block), end)
            }
            b'<' if input[i..].starts_with("<!--") => {
                let end = input[i + 4..].find("-->").map_or(len, |rel| i + 4 + rel + 3);
                (comment(CommentStyle::Html), end)
            }
            q @ (b'\'' | b'"') => {
                let mut j = i + 1;
                while j < len && b[j] != q && b[j] != b'\n' {
                    if b[j] == b'\\' {
                        j += 1;
                    }
                    j += 1;
                }
                let end = if j < len && b[j] == q { j + 1 } else { j.min(len) };
                (TokenContext::String { quote: q as char }, end)
            }
            b'`' => {
                let mut j = i + 1;
                while j < len && b[j] != b'`' {
                    if b[j] == b'\\' {
                        j += 1;
                    }
                    j += 1;
                }
                (TokenContext::Template { depth: 0 }, (j + 1).min(len))
            }
            _ => {
                let mut j = next_boundary(input, i + 1);
                while j < len && !starts_literal(input, j) {
                    j += 1;
                }
                (TokenContext::Code, j)
            }
        };

        if end <= start || !input.is_char_boundary(end) {
            return Err(LexError::Stalled {
                name: "legacy",
                offset: start,
            });
        }
        toks.push(Token::new(input, ctx, start, end));
        i = end;
    }
    Ok(toks)
}

fn comment(style: CommentStyle) -> TokenContext {
    TokenContext::Comment { style }
}

fn next_boundary(s: &str, pos: usize) -> usize {
    super::context::next_char_boundary(s, pos)
}

fn starts_literal(input: &str, j: usize) -> bool {
    let b = input.as_bytes();
    match b[j] {
        b'\'' | b'"' | b'`' => true,
        b'/' => matches!(b.get(j + 1), Some(b'/') | Some(b'*')),
        b'<' => input[j..].starts_with("<!--"),
        _ => false,
    }
}

/// Concatenate every non-comment lexeme.
pub fn strip_comments(input: &str) -> Result<String, LexError> {
    let toks = tokenize(input)?;
    Ok(toks
        .iter()
        .filter(|t| !t.is_comment())
        .map(|t| t.text)
        .collect())
}

/// Find call expressions of the given callees (e.g. `console.log`) in code.
///
/// A match must start in a code region at an identifier boundary (so
/// `my.console.log(...)` and strings mentioning `console.log(` are ignored),
/// be followed by optional whitespace and `(`, and have balanced parentheses.
/// Quoted arguments, regex literals, and comments are skipped while
/// balancing. A trailing `;` on the same line is included in the span.
///
/// Only calls in statement position are reported: deleting one must not
/// change which code a control header, arrow, or operator applies to. Calls
/// such as `if (x) console.log(x);` or `() => console.log(x)` are left alone,
/// as are calls that never close.
///
/// Spans are returned in source order and never overlap.
pub fn call_spans<S: AsRef<str>>(input: &str, callees: &[S]) -> Result<Vec<Span>, LexError> {
    let b = input.as_bytes();
    let toks = tokenize(input)?;
    let mut found: Vec<Span> = Vec::new();

    for tok in toks.iter().filter(|t| t.kind == TokenKind::Code) {
        for callee in callees {
            let callee = callee.as_ref();
            if callee.is_empty() {
                continue;
            }
            for (rel, _) in tok.text.match_indices(callee) {
                let at = tok.start + rel;
                if at > 0 && (is_ident_byte(b[at - 1]) || b[at - 1] == b'.') {
                    continue;
                }
                let mut open = at + callee.len();
                while open < b.len() && matches!(b[open], b' ' | b'\t') {
                    open += 1;
                }
                if b.get(open) != Some(&b'(') {
                    continue;
                }
                if !in_statement_position(input, &toks, at) {
                    log::debug!("skipping call at byte {at}: not a statement of its own");
                    continue;
                }
                if let Some(close) = balance_parens(b, open) {
                    found.push(Span::new(at, absorb_semicolon(b, close)));
                }
            }
        }
    }

    found.sort_by_key(|s| s.start);
    let mut spans: Vec<Span> = Vec::with_capacity(found.len());
    for span in found {
        match spans.last() {
            Some(prev) if span.start < prev.end => {}
            _ => spans.push(span),
        }
    }
    Ok(spans)
}

/// Words after which the following code is an operand or a body, never a
/// statement of its own.
const CONTINUING_KEYWORDS: &[&str] = &[
    "else", "do", "return", "throw", "typeof", "void", "delete", "await", "yield", "new",
    "case", "in", "of", "instanceof",
];

/// Heads of control statements whose body follows their `(...)`.
const CONTROL_HEADS: &[&str] = &["if", "while", "for", "with"];

/// Whether code starting at `at` begins a statement of its own.
///
/// Looks back over whitespace and comments to the previous significant
/// byte. Start of input, `;`, `{` and `}` begin a statement. A value (word,
/// `)`, `]`, literal) does so only across a line break, and only when the
/// `)` does not close a control header. Anything else (`=`, `=>`, `,`, `(`,
/// `?`, `:`, operators, `else`) continues an expression or needs a body.
fn in_statement_position(input: &str, toks: &[Token<'_>], at: usize) -> bool {
    let b = input.as_bytes();
    let mut newline = false;
    let mut prev = None;
    'scan: for tok in toks.iter().rev().skip_while(|t| t.start >= at) {
        match tok.kind {
            TokenKind::Comment => {
                newline |= tok.text.contains('\n');
            }
            TokenKind::Code => {
                for j in (tok.start..tok.end.min(at)).rev() {
                    match b[j] {
                        b'\n' => newline = true,
                        c if c.is_ascii_whitespace() => {}
                        _ => {
                            prev = Some(j);
                            break 'scan;
                        }
                    }
                }
            }
            _ => {
                prev = Some(tok.end - 1);
                break;
            }
        }
    }

    let Some(p) = prev else {
        return true;
    };
    match b[p] {
        b';' | b'{' | b'}' => true,
        b')' => newline && !closes_control_header(input, p),
        c if is_ident_byte(c) => {
            let mut k = p;
            while k > 0 && is_ident_byte(b[k - 1]) {
                k -= 1;
            }
            let word = &input[k..=p];
            let member = k > 0 && b[k - 1] == b'.';
            newline && (member || !CONTINUING_KEYWORDS.contains(&word))
        }
        b']' | b'\'' | b'"' | b'`' => newline,
        _ => false,
    }
}

/// Whether the `)` at `close` ends the condition of `if`/`while`/`for`/`with`.
fn closes_control_header(input: &str, close: usize) -> bool {
    let b = input.as_bytes();
    let mut depth = 0usize;
    let mut j = close + 1;
    let open = loop {
        if j == 0 {
            return false;
        }
        j -= 1;
        match b[j] {
            b')' => depth += 1,
            b'(' => {
                depth -= 1;
                if depth == 0 {
                    break j;
                }
            }
            _ => {}
        }
    };
    let mut end = open;
    while end > 0 && b[end - 1].is_ascii_whitespace() {
        end -= 1;
    }
    let mut start = end;
    while start > 0 && is_ident_byte(b[start - 1]) {
        start -= 1;
    }
    CONTROL_HEADS.contains(&&input[start..end])
}

/// Bytes after which a `/` inside call arguments opens a regex literal.
const REGEX_AFTER: &[u8] = b"(,=:[!&|?{};+-*%~^<>";

/// Position just past the `)` matching the `(` at `open`.
fn balance_parens(b: &[u8], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut last = b'(';
    let mut j = open;
    while j < b.len() {
        let c = b[j];
        match c {
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(j + 1);
                }
            }
            q @ (b'\'' | b'"' | b'`') => {
                j += 1;
                while j < b.len() && b[j] != q {
                    if b[j] == b'\\' {
                        j += 1;
                    }
                    j += 1;
                }
            }
            b'/' if b.get(j + 1) == Some(&b'/') => {
                while j < b.len() && b[j] != b'\n' {
                    j += 1;
                }
                continue;
            }
            b'/' if b.get(j + 1) == Some(&b'*') => {
                let rel = b[j + 2..].windows(2).position(|w| w == b"*/")?;
                j += 2 + rel + 2;
                continue;
            }
            b'/' if REGEX_AFTER.contains(&last) => j = skip_regex(b, j)?,
            _ => {}
        }
        if !c.is_ascii_whitespace() {
            last = c;
        }
        j += 1;
    }
    None
}

/// Index of the `/` closing the regex literal opened at `start`, or `None`
/// when the line ends first.
fn skip_regex(b: &[u8], start: usize) -> Option<usize> {
    let mut in_class = false;
    let mut j = start + 1;
    while j < b.len() {
        match b[j] {
            b'\\' => j += 1,
            b'\n' => return None,
            b'[' => in_class = true,
            b']' => in_class = false,
            b'/' if !in_class => return Some(j),
            _ => {}
        }
        j += 1;
    }
    None
}

fn absorb_semicolon(b: &[u8], close: usize) -> usize {
    let mut j = close;
    while j < b.len() && matches!(b[j], b' ' | b'\t') {
        j += 1;
    }
    if b.get(j) == Some(&b';') { j + 1 } else { close }
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}
