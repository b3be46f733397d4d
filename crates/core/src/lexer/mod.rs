//! Token model shared by the context-aware and legacy lexers.

/// Context-aware lexer: regex/division disambiguation, template depth, recovery.
pub mod context;
/// Per-call diagnostic accumulator with position and snippet derivation.
pub mod errors;
/// Coarse single-pass lexer used as fallback and by line-oriented tools.
pub mod legacy;

use serde::Serialize;

use crate::diag::Diagnostic;

pub use context::ContextLexer;
pub use legacy::LegacyLexer;

/// Classification of a lexer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    /// Anything that is not a literal or a comment.
    Code,
    /// A single- or double-quoted string literal.
    String,
    /// A backtick template literal, interpolations included.
    Template,
    /// A regular expression literal, flags included.
    Regex,
    /// A line, block, or HTML comment.
    Comment,
}

/// Comment delimiter style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CommentStyle {
    /// `// ...` up to (not including) the newline.
    Line,
    /// `/* ... */`.
    Block,
    /// `<!-- ... -->`.
    Html,
}

/// Extra information attached to a token so downstream code can recheck how
/// it was delimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TokenContext {
    /// Plain code.
    Code,
    /// String literal opened by `quote`.
    String {
        /// `'` or `"`.
        quote: char,
    },
    /// Template literal.
    Template {
        /// Deepest `${` interpolation nesting seen inside the literal.
        depth: usize,
    },
    /// Regular expression literal.
    Regex {
        /// Number of trailing flag characters.
        flags: usize,
    },
    /// Comment.
    Comment {
        /// Delimiter style.
        style: CommentStyle,
    },
}

impl TokenContext {
    /// The token kind this context belongs to.
    pub fn kind(&self) -> TokenKind {
        match self {
            TokenContext::Code => TokenKind::Code,
            TokenContext::String { .. } => TokenKind::String,
            TokenContext::Template { .. } => TokenKind::Template,
            TokenContext::Regex { .. } => TokenKind::Regex,
            TokenContext::Comment { .. } => TokenKind::Comment,
        }
    }
}

/// A token that borrows its text directly from the source input.
///
/// `text` is always exactly `&input[start..end]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token<'a> {
    /// The classification of this token.
    pub kind: TokenKind,
    /// Borrowed slice of the source input for this token.
    pub text: &'a str,
    /// Delimiting context.
    pub context: TokenContext,
    /// Byte offset of the first character.
    pub start: usize,
    /// Byte offset one past the last character.
    pub end: usize,
}

impl<'a> Token<'a> {
    /// Build a token over `input[start..end]`.
    pub(crate) fn new(input: &'a str, context: TokenContext, start: usize, end: usize) -> Self {
        Self {
            kind: context.kind(),
            text: &input[start..end],
            context,
            start,
            end,
        }
    }

    /// Whether this token is a comment.
    pub fn is_comment(&self) -> bool {
        self.kind == TokenKind::Comment
    }
}

/// Concatenate token lexemes in order.
pub fn reassemble(tokens: &[Token<'_>]) -> String {
    let mut out = String::with_capacity(tokens.iter().map(|t| t.text.len()).sum());
    for tok in tokens {
        out.push_str(tok.text);
    }
    out
}

/// Whether `tokens` are ordered, contiguous, and reproduce `input` exactly.
pub fn covers_input(tokens: &[Token<'_>], input: &str) -> bool {
    let mut pos = 0usize;
    for tok in tokens {
        if tok.start != pos || tok.end < tok.start {
            return false;
        }
        pos = tok.end;
    }
    pos == input.len()
}

/// Failure of a whole tokenization pass.
///
/// Local problems (an unterminated string, a stray slash) are never errors;
/// they are recorded as [`Diagnostic`]s and scanning continues.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum LexError {
    /// A critical diagnostic was recorded during the pass.
    #[error("{name} lexer failed [{id}]: {message}")]
    Critical {
        /// Lexer that failed.
        name: &'static str,
        /// Diagnostic code of the critical diagnostic.
        id: String,
        /// Its message.
        message: String,
    },
    /// A scanning step did not advance.
    #[error("{name} lexer stalled at byte {offset}")]
    Stalled {
        /// Lexer that failed.
        name: &'static str,
        /// Byte offset where scanning stopped.
        offset: usize,
    },
    /// The token stream does not reproduce the input byte-for-byte.
    #[error("{name} lexer covered {covered} of {len} input bytes")]
    Incomplete {
        /// Lexer that failed.
        name: &'static str,
        /// Bytes reproduced by the token stream.
        covered: usize,
        /// Input length.
        len: usize,
    },
}

/// A lexer the orchestrator can drive.
///
/// Implementations reset their per-call state (position, diagnostics) at the
/// start of every [`Tokenize::tokenize`] call.
pub trait Tokenize {
    /// Short name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Tokenize `input`, or report that no usable token stream exists.
    fn tokenize<'a>(&mut self, input: &'a str) -> Result<Vec<Token<'a>>, LexError>;

    /// Diagnostics recorded by the most recent call.
    fn diagnostics(&self) -> &[Diagnostic];
}
