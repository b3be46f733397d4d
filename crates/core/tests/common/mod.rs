//! Shared test helpers for `comment_sweep_core` integration tests.

#![allow(unreachable_pub)]

use comment_sweep_core::diag::Diagnostic;
use comment_sweep_core::lexer::{LexError, Token, TokenKind, Tokenize};

/// Lexemes of every token of `kind`, in order.
#[allow(dead_code)]
pub fn texts_of<'a>(tokens: &[Token<'a>], kind: TokenKind) -> Vec<&'a str> {
    tokens
        .iter()
        .filter(|t| t.kind == kind)
        .map(|t| t.text)
        .collect()
}

/// Whether any diagnostic carries `id`.
#[allow(dead_code)]
pub fn has_id(diags: &[Diagnostic], id: &str) -> bool {
    diags.iter().any(|d| d.id == id)
}

/// A lexer that always fails, for driving the orchestrator's fallback paths.
#[allow(dead_code)]
pub struct FailingLexer;

impl Tokenize for FailingLexer {
    fn name(&self) -> &'static str {
        "failing"
    }

    fn tokenize<'a>(&mut self, _input: &'a str) -> Result<Vec<Token<'a>>, LexError> {
        Err(LexError::Stalled {
            name: "failing",
            offset: 0,
        })
    }

    fn diagnostics(&self) -> &[Diagnostic] {
        &[]
    }
}

/// A lexer that succeeds but drops the last byte of its input.
#[allow(dead_code)]
pub struct TruncatingLexer;

impl Tokenize for TruncatingLexer {
    fn name(&self) -> &'static str {
        "truncating"
    }

    fn tokenize<'a>(&mut self, input: &'a str) -> Result<Vec<Token<'a>>, LexError> {
        let mut tokens = comment_sweep_core::lexer::legacy::tokenize(input)?;
        tokens.pop();
        Ok(tokens)
    }

    fn diagnostics(&self) -> &[Diagnostic] {
        &[]
    }
}
