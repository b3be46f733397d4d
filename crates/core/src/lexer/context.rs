//! Context-aware lexer.
//!
//! Partitions JavaScript-family source (including markup with `<!-- -->`
//! comments, as in Svelte and Vue templates) into code, string, template,
//! regex, and comment tokens. The scanner:
//!
//! - decides whether a `/` opens a regular expression or is division by
//!   looking backward to the previous significant character,
//! - tracks `${` interpolation depth inside template literals,
//! - recovers locally from unterminated constructs, recording a
//!   [`Diagnostic`] instead of failing,
//! - is bounded by an iteration ceiling of twice the input length.
//!
//! All delimiters are ASCII, so scanning works on bytes: UTF-8 continuation
//! bytes (0x80–0xBF) never compare equal to a delimiter, and every token
//! boundary the scanner produces lands on a char boundary.

use std::fmt;

use super::errors::ErrorHandler;
use super::{CommentStyle, LexError, Token, TokenContext, Tokenize};
use crate::diag::{Diagnostic, Span, codes};

/// Bytes after which a `/` starts a regular expression literal.
const REGEX_PRECEDERS: &[u8] = b"=([,:;!&|?+-*/%{}\n";

/// Keywords after which an expression (and so a regex literal) may start.
const REGEX_KEYWORDS: &[&str] = &[
    "return",
    "typeof",
    "instanceof",
    "in",
    "of",
    "new",
    "delete",
    "void",
    "throw",
    "case",
    "do",
    "else",
    "yield",
    "await",
];

/// Reusable context-aware lexer.
///
/// Each call to [`ContextLexer::tokenize`] resets position and diagnostics,
/// so one instance can process many inputs sequentially. Give each thread
/// its own instance.
///
/// ```
/// use comment_sweep_core::lexer::{ContextLexer, TokenKind};
///
/// let mut lexer = ContextLexer::new();
/// let toks = lexer.tokenize("x = /a\\/b/g; // done");
/// assert!(toks.iter().any(|t| t.kind == TokenKind::Regex && t.text == "/a\\/b/g"));
/// assert!(toks.iter().any(|t| t.kind == TokenKind::Comment && t.text == "// done"));
/// ```
#[derive(Debug, Default)]
pub struct ContextLexer {
    errors: ErrorHandler,
    max_iterations: Option<usize>,
}

impl ContextLexer {
    /// Create a lexer with the default iteration ceiling.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the iteration ceiling (default: `2 × input length`).
    pub fn with_max_iterations(mut self, limit: usize) -> Self {
        self.max_iterations = Some(limit);
        self
    }

    /// Tokenize `input`.
    ///
    /// Never panics and always terminates. Problems are available from
    /// [`ContextLexer::diagnostics`] until the next call. When the iteration
    /// ceiling is hit the tokens gathered so far are returned.
    pub fn tokenize<'a>(&mut self, input: &'a str) -> Vec<Token<'a>> {
        self.errors.reset(input);
        let limit = self
            .max_iterations
            .unwrap_or_else(|| input.len().saturating_mul(2));
        let tokens = Scanner {
            input,
            b: input.as_bytes(),
            errors: &mut self.errors,
        }
        .run(limit);
        self.validate(input, &tokens);
        log::debug!(
            "context lexer: {} bytes -> {} tokens, {} diagnostics",
            input.len(),
            tokens.len(),
            self.errors.diagnostics().len()
        );
        tokens
    }

    /// Diagnostics recorded by the most recent [`ContextLexer::tokenize`].
    pub fn diagnostics(&self) -> &[Diagnostic] {
        self.errors.diagnostics()
    }

    /// Whole-pass checks on the produced stream.
    fn validate(&mut self, input: &str, tokens: &[Token<'_>]) {
        if !input.is_empty() && tokens.is_empty() {
            self.errors.record(
                codes::NO_TOKENS,
                "no tokens produced for non-empty input",
                Span::new(0, input.len()),
                None,
            );
            return;
        }
        let total: usize = tokens.iter().map(|t| t.text.len()).sum();
        if total.abs_diff(input.len()) * 2 > input.len() {
            self.errors.record(
                codes::CONTENT_LENGTH_MISMATCH,
                format!(
                    "token stream covers {total} bytes of {} byte input",
                    input.len()
                ),
                Span::new(0, input.len()),
                None,
            );
        }
    }
}

impl Tokenize for ContextLexer {
    fn name(&self) -> &'static str {
        "context"
    }

    fn tokenize<'a>(&mut self, input: &'a str) -> Result<Vec<Token<'a>>, LexError> {
        let tokens = ContextLexer::tokenize(self, input);
        match self.errors.first_critical() {
            Some(d) => Err(LexError::Critical {
                name: "context",
                id: d.id.to_string(),
                message: d.message.clone(),
            }),
            None => Ok(tokens),
        }
    }

    fn diagnostics(&self) -> &[Diagnostic] {
        self.errors.diagnostics()
    }
}

// ── Scanner ─────────────────────────────────────────────────────────────

/// A recognizer could not produce a usable token at this position.
#[derive(Debug)]
enum ScanFault {
    /// The recognizer consumed nothing.
    Empty { at: usize },
    /// The computed end is not a char boundary.
    Boundary { at: usize },
}

impl fmt::Display for ScanFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanFault::Empty { at } => write!(f, "recognizer consumed nothing at byte {at}"),
            ScanFault::Boundary { at } => write!(f, "token would end inside a character at byte {at}"),
        }
    }
}

/// One scanning pass over a single input.
struct Scanner<'a, 'h> {
    input: &'a str,
    b: &'a [u8],
    errors: &'h mut ErrorHandler,
}

impl<'a> Scanner<'a, '_> {
    fn run(mut self, limit: usize) -> Vec<Token<'a>> {
        let mut toks = Vec::new();
        let mut pos = 0usize;
        let mut iterations = 0usize;

        while pos < self.b.len() {
            if iterations >= limit {
                self.errors.record(
                    codes::ITERATION_LIMIT,
                    format!("scan stopped after {iterations} iterations"),
                    Span::empty(pos),
                    Some("returned the tokens gathered so far"),
                );
                break;
            }
            iterations += 1;

            match self.next_token(pos) {
                Ok(tok) => {
                    pos = tok.end;
                    toks.push(tok);
                }
                Err(fault) => {
                    // Force at least one character forward so the loop cannot stall.
                    let end = next_char_boundary(self.input, pos + 1);
                    self.errors.record(
                        codes::SCAN_FAULT,
                        fault.to_string(),
                        Span::new(pos, end),
                        Some("emitted one character as code and continued"),
                    );
                    toks.push(Token::new(self.input, TokenContext::Code, pos, end));
                    pos = end;
                }
            }
        }
        toks
    }

    fn peek(&self, i: usize) -> Option<u8> {
        self.b.get(i).copied()
    }

    fn starts_with_at(&self, i: usize, pat: &[u8]) -> bool {
        self.b.get(i..i + pat.len()) == Some(pat)
    }

    /// Validate `[start, end)` and build the token.
    fn token(&self, ctx: TokenContext, start: usize, end: usize) -> Result<Token<'a>, ScanFault> {
        if end <= start {
            return Err(ScanFault::Empty { at: start });
        }
        if !self.input.is_char_boundary(end) {
            return Err(ScanFault::Boundary { at: end });
        }
        Ok(Token::new(self.input, ctx, start, end))
    }

    fn next_token(&mut self, start: usize) -> Result<Token<'a>, ScanFault> {
        match self.b[start] {
            b'/' => match self.peek(start + 1) {
                Some(b'/') => self.line_comment(start),
                Some(b'*') => self.block_comment(start),
                _ if self.regex_allowed(start) => self.regex(start),
                _ => self.code(start),
            },
            b'<' if self.starts_with_at(start, b"<!--") => self.html_comment(start),
            b'\'' | b'"' => self.string(start),
            b'`' => self.template(start),
            c if c.is_ascii_whitespace() => self.token(TokenContext::Code, start, start + 1),
            _ => self.code(start),
        }
    }

    // ── Disambiguation ──────────────────────────────────────────────────

    /// Whether a `/` at `slash` opens a regex literal rather than dividing.
    fn regex_allowed(&self, slash: usize) -> bool {
        let mut j = slash;
        while j > 0 && matches!(self.b[j - 1], b' ' | b'\t' | b'\r' | 0x0b | 0x0c) {
            j -= 1;
        }
        if j == 0 {
            return true;
        }
        let prev = self.b[j - 1];
        if REGEX_PRECEDERS.contains(&prev) {
            return true;
        }
        // Arrow function body.
        if prev == b'>' && j >= 2 && self.b[j - 2] == b'=' {
            return true;
        }
        if is_ident_byte(prev) {
            let mut k = j;
            while k > 0 && is_ident_byte(self.b[k - 1]) {
                k -= 1;
            }
            // `obj.return / 2` is a property access, not the keyword.
            if k > 0 && self.b[k - 1] == b'.' {
                return false;
            }
            return REGEX_KEYWORDS.contains(&&self.input[k..j]);
        }
        false
    }

    // ── Recognizers ─────────────────────────────────────────────────────

    /// Code run up to the next delimiter or whitespace; always consumes the
    /// first byte's character.
    fn code(&self, start: usize) -> Result<Token<'a>, ScanFault> {
        let mut i = next_char_boundary(self.input, start + 1);
        while i < self.b.len() && !self.is_delimiter_start(i) {
            i += 1;
        }
        self.token(TokenContext::Code, start, i)
    }

    fn is_delimiter_start(&self, i: usize) -> bool {
        match self.b[i] {
            b'\'' | b'"' | b'`' | b'/' => true,
            b'<' => self.starts_with_at(i, b"<!--"),
            c => c.is_ascii_whitespace(),
        }
    }

    fn string(&mut self, start: usize) -> Result<Token<'a>, ScanFault> {
        let quote = self.b[start];
        let ctx = TokenContext::String {
            quote: quote as char,
        };
        let len = self.b.len();
        let mut i = start + 1;
        loop {
            if i >= len {
                self.errors.record(
                    codes::UNTERMINATED_STRING,
                    format!("unterminated string literal (missing {})", quote as char),
                    Span::new(start, len),
                    Some("string runs to end of input"),
                );
                return self.token(ctx, start, len);
            }
            match self.b[i] {
                b'\\' => i = self.skip_escape(i),
                b'\n' => {
                    self.errors.record(
                        codes::UNTERMINATED_STRING,
                        format!("unterminated string literal (missing {})", quote as char),
                        Span::new(start, i),
                        Some("string closed at end of line"),
                    );
                    return self.token(ctx, start, i);
                }
                c if c == quote => return self.token(ctx, start, i + 1),
                _ => i += 1,
            }
        }
    }

    /// Position after a backslash escape at `i`. A CRLF line continuation is
    /// consumed as one unit.
    fn skip_escape(&self, i: usize) -> usize {
        let len = self.b.len();
        if self.peek(i + 1) == Some(b'\r') && self.peek(i + 2) == Some(b'\n') {
            return (i + 3).min(len);
        }
        (i + 2).min(len)
    }

    fn template(&mut self, start: usize) -> Result<Token<'a>, ScanFault> {
        let len = self.b.len();
        let mut depth = 0usize;
        let mut max_depth = 0usize;
        let mut i = start + 1;
        loop {
            if i >= len {
                self.errors.record(
                    codes::UNTERMINATED_TEMPLATE,
                    if depth > 0 {
                        format!("unterminated template literal ({depth} open interpolation(s))")
                    } else {
                        "unterminated template literal".to_string()
                    },
                    Span::new(start, len),
                    Some("template runs to end of input"),
                );
                return self.token(TokenContext::Template { depth: max_depth }, start, len);
            }
            match self.b[i] {
                b'\\' => i = self.skip_escape(i),
                b'$' if self.peek(i + 1) == Some(b'{') => {
                    depth += 1;
                    max_depth = max_depth.max(depth);
                    i += 2;
                }
                // Any close brace inside an interpolation counts against the
                // depth, including braces of nested object literals.
                b'}' if depth > 0 => {
                    depth -= 1;
                    i += 1;
                }
                b'`' if depth == 0 => {
                    return self.token(TokenContext::Template { depth: max_depth }, start, i + 1);
                }
                _ => i += 1,
            }
        }
    }

    fn regex(&mut self, start: usize) -> Result<Token<'a>, ScanFault> {
        let len = self.b.len();
        let mut in_class = false;
        let mut i = start + 1;
        loop {
            if i >= len {
                self.errors.record(
                    codes::UNTERMINATED_REGEX,
                    "unterminated regular expression literal",
                    Span::new(start, len),
                    Some("literal runs to end of input"),
                );
                return self.token(TokenContext::Regex { flags: 0 }, start, len);
            }
            match self.b[i] {
                b'\\' if self.peek(i + 1) == Some(b'\n') => i += 1,
                b'\\' => i = (i + 2).min(len),
                b'\n' => {
                    self.errors.record(
                        codes::UNTERMINATED_REGEX,
                        "unterminated regular expression literal",
                        Span::new(start, i),
                        Some("literal truncated at end of line"),
                    );
                    return self.token(TokenContext::Regex { flags: 0 }, start, i);
                }
                b'[' => {
                    in_class = true;
                    i += 1;
                }
                b']' => {
                    in_class = false;
                    i += 1;
                }
                b'/' if !in_class => {
                    i += 1;
                    let body_end = i;
                    while i < len && self.b[i].is_ascii_alphabetic() {
                        i += 1;
                    }
                    return self.token(TokenContext::Regex { flags: i - body_end }, start, i);
                }
                _ => i += 1,
            }
        }
    }

    fn line_comment(&self, start: usize) -> Result<Token<'a>, ScanFault> {
        let mut i = start + 2;
        while i < self.b.len() && !matches!(self.b[i], b'\n' | b'\r') {
            i += 1;
        }
        self.token(
            TokenContext::Comment {
                style: CommentStyle::Line,
            },
            start,
            i,
        )
    }

    fn block_comment(&mut self, start: usize) -> Result<Token<'a>, ScanFault> {
        let ctx = TokenContext::Comment {
            style: CommentStyle::Block,
        };
        match self.input[start + 2..].find("*/") {
            Some(rel) => self.token(ctx, start, start + 2 + rel + 2),
            None => {
                self.errors.record(
                    codes::UNTERMINATED_BLOCK_COMMENT,
                    "unterminated block comment (missing */)",
                    Span::new(start, self.b.len()),
                    Some("comment runs to end of input"),
                );
                self.token(ctx, start, self.b.len())
            }
        }
    }

    fn html_comment(&mut self, start: usize) -> Result<Token<'a>, ScanFault> {
        let ctx = TokenContext::Comment {
            style: CommentStyle::Html,
        };
        match self.input[start + 4..].find("-->") {
            Some(rel) => self.token(ctx, start, start + 4 + rel + 3),
            None => {
                self.errors.record(
                    codes::UNTERMINATED_HTML_COMMENT,
                    "unterminated HTML comment (missing -->)",
                    Span::new(start, self.b.len()),
                    Some("comment runs to end of input"),
                );
                self.token(ctx, start, self.b.len())
            }
        }
    }
}

/// Smallest index >= `pos` that is a char boundary, clamped to `s.len()`.
pub(crate) fn next_char_boundary(s: &str, pos: usize) -> usize {
    let mut p = pos;
    while p < s.len() && !s.is_char_boundary(p) {
        p += 1;
    }
    p.min(s.len())
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::{TokenKind, covers_input};

    fn kinds(input: &str) -> Vec<(TokenKind, String)> {
        ContextLexer::new()
            .tokenize(input)
            .into_iter()
            .filter(|t| !(t.kind == TokenKind::Code && t.text.trim().is_empty()))
            .map(|t| (t.kind, t.text.to_string()))
            .collect()
    }

    fn of_kind(input: &str, kind: TokenKind) -> Vec<String> {
        kinds(input)
            .into_iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, t)| t)
            .collect()
    }

    #[test]
    fn division_is_not_regex() {
        assert!(of_kind("a / b / c", TokenKind::Regex).is_empty());
        assert!(of_kind("(x + 1) / 2 / y", TokenKind::Regex).is_empty());
        assert!(of_kind("arr[0] / total", TokenKind::Regex).is_empty());
    }

    #[test]
    fn regex_after_operators_and_keywords() {
        assert_eq!(of_kind("/test/g", TokenKind::Regex), ["/test/g"]);
        assert_eq!(of_kind("return /test/g;", TokenKind::Regex), ["/test/g"]);
        assert_eq!(of_kind("x ? /test/g : null", TokenKind::Regex), ["/test/g"]);
        assert_eq!(of_kind("s.replace(/a+/gi, '')", TokenKind::Regex), ["/a+/gi"]);
        assert_eq!(of_kind("typeof /x/", TokenKind::Regex), ["/x/"]);
    }

    #[test]
    fn regex_after_arrow() {
        assert_eq!(
            of_kind("xs.filter(s => /^\\/\\//.test(s)); keep();", TokenKind::Regex),
            ["/^\\/\\//"]
        );
        assert!(of_kind("xs.filter(s => /^\\/\\//.test(s));", TokenKind::Comment).is_empty());
        // A bare `>` is still a comparison followed by division.
        assert!(of_kind("a > b / c", TokenKind::Regex).is_empty());
    }

    #[test]
    fn property_named_like_keyword_divides() {
        assert!(of_kind("obj.return / 2", TokenKind::Regex).is_empty());
    }

    #[test]
    fn regex_character_class_keeps_slash() {
        assert_eq!(of_kind("x = /[/]+/g;", TokenKind::Regex), ["/[/]+/g"]);
    }

    #[test]
    fn regex_with_comment_like_body() {
        let input = "const r = /\\/\\*.*\\*\\//g;";
        assert_eq!(of_kind(input, TokenKind::Regex), ["/\\/\\*.*\\*\\//g"]);
        assert!(of_kind(input, TokenKind::Comment).is_empty());
    }

    #[test]
    fn strings_hide_comment_markers() {
        assert!(of_kind("\"this // is not a comment\"", TokenKind::Comment).is_empty());
        assert_eq!(
            of_kind("'it\\'s /* fine */'", TokenKind::String),
            ["'it\\'s /* fine */'"]
        );
    }

    #[test]
    fn template_hides_comment_markers() {
        let toks = of_kind("`this /* not */ a comment`", TokenKind::Template);
        assert_eq!(toks, ["`this /* not */ a comment`"]);
        assert!(of_kind("`this /* not */ a comment`", TokenKind::Comment).is_empty());
    }

    #[test]
    fn template_interpolation_depth() {
        let mut lexer = ContextLexer::new();
        let toks = lexer.tokenize("`a ${b ? `c ${d}` : e} f` // end");
        let tpl = &toks[0];
        assert_eq!(tpl.text, "`a ${b ? `c ${d}` : e} f`");
        assert_eq!(tpl.context, TokenContext::Template { depth: 2 });
        assert_eq!(toks.last().unwrap().text, "// end");
    }

    #[test]
    fn template_with_balanced_object_literal() {
        let toks = of_kind("`${ fn({ a: 1 }) }` // c", TokenKind::Template);
        assert_eq!(toks, ["`${ fn({ a: 1 }) }`"]);
    }

    #[test]
    fn comment_styles() {
        let mut lexer = ContextLexer::new();
        let toks = lexer.tokenize("a // x\r\nb /* y */ <!-- z -->");
        let comments: Vec<_> = toks.iter().filter(|t| t.is_comment()).collect();
        assert_eq!(comments.len(), 3);
        assert_eq!(comments[0].text, "// x");
        assert_eq!(
            comments[1].context,
            TokenContext::Comment {
                style: CommentStyle::Block
            }
        );
        assert_eq!(comments[2].text, "<!-- z -->");
        assert!(lexer.diagnostics().is_empty());
    }

    #[test]
    fn unterminated_string_stops_at_newline() {
        let mut lexer = ContextLexer::new();
        let input = "let s = 'oops\nlet t = 1; // c";
        let toks = lexer.tokenize(input);
        assert!(covers_input(&toks, input));
        assert!(toks.iter().any(|t| t.text == "'oops"));
        assert!(toks.iter().any(|t| t.text == "// c"));
        assert_eq!(lexer.diagnostics()[0].id, codes::UNTERMINATED_STRING);
    }

    #[test]
    fn unterminated_regex_truncates_at_newline() {
        let mut lexer = ContextLexer::new();
        let toks = lexer.tokenize("x = /abc\ny = 2;");
        assert!(toks.iter().any(|t| t.kind == TokenKind::Regex && t.text == "/abc"));
        assert_eq!(lexer.diagnostics()[0].id, codes::UNTERMINATED_REGEX);
    }

    #[test]
    fn unterminated_block_comment_is_low() {
        let mut lexer = ContextLexer::new();
        let toks = lexer.tokenize("a /* never closed");
        assert_eq!(toks.last().unwrap().text, "/* never closed");
        assert_eq!(lexer.diagnostics()[0].id, codes::UNTERMINATED_BLOCK_COMMENT);
        assert_eq!(lexer.diagnostics()[0].severity, crate::diag::Severity::Low);
    }

    #[test]
    fn unterminated_html_comment_is_low() {
        let mut lexer = ContextLexer::new();
        let input = "<div></div>\n<!-- left open";
        let toks = lexer.tokenize(input);
        assert!(covers_input(&toks, input));
        assert_eq!(toks.last().unwrap().text, "<!-- left open");
        let d = &lexer.diagnostics()[0];
        assert_eq!(d.id, codes::UNTERMINATED_HTML_COMMENT);
        assert_eq!(d.severity, crate::diag::Severity::Low);
    }

    #[test]
    fn no_tokens_for_non_empty_input_is_critical() {
        let mut lexer = ContextLexer::new().with_max_iterations(0);
        assert!(lexer.tokenize("abc").is_empty());
        let ids: Vec<_> = lexer.diagnostics().iter().map(|d| d.id.as_ref()).collect();
        assert_eq!(ids, [codes::ITERATION_LIMIT, codes::NO_TOKENS]);
        assert!(lexer.diagnostics()[1].is_critical());
        // Empty input needs no tokens.
        assert!(lexer.tokenize("").is_empty());
        assert!(lexer.diagnostics().is_empty());
    }

    #[test]
    fn short_stream_reports_length_mismatch() {
        let mut lexer = ContextLexer::new().with_max_iterations(1);
        let toks = lexer.tokenize("a b c d e f");
        assert_eq!(toks.len(), 1);
        let d = lexer
            .diagnostics()
            .iter()
            .find(|d| d.id == codes::CONTENT_LENGTH_MISMATCH)
            .expect("length mismatch recorded");
        assert_eq!(d.severity, crate::diag::Severity::High);
        assert!(d.message.contains("1 bytes of 11"), "{}", d.message);
    }

    #[test]
    fn diagnostics_reset_between_calls() {
        let mut lexer = ContextLexer::new();
        lexer.tokenize("\"open");
        assert_eq!(lexer.diagnostics().len(), 1);
        lexer.tokenize("closed()");
        assert!(lexer.diagnostics().is_empty());
    }

    #[test]
    fn iteration_ceiling_is_critical() {
        let mut lexer = ContextLexer::new().with_max_iterations(2);
        let toks = lexer.tokenize("a b c d");
        assert_eq!(toks.len(), 2);
        let d = &lexer.diagnostics()[0];
        assert_eq!(d.id, codes::ITERATION_LIMIT);
        assert!(d.is_critical());
        let err = Tokenize::tokenize(&mut lexer, "a b c d").unwrap_err();
        assert!(matches!(err, LexError::Critical { .. }));
    }

    #[test]
    fn multibyte_code_is_covered() {
        let input = "const é = '日本' / 2; // ü";
        let toks = ContextLexer::new().tokenize(input);
        assert!(covers_input(&toks, input));
        assert_eq!(toks.last().unwrap().text, "// ü");
    }

    #[test]
    fn whitespace_is_single_char_tokens() {
        let toks = ContextLexer::new().tokenize("a  b");
        let texts: Vec<_> = toks.iter().map(|t| t.text).collect();
        assert_eq!(texts, ["a", " ", " ", "b"]);
    }
}
