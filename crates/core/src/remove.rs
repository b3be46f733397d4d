//! Comment removal orchestrator.
//!
//! Tokenizes with the context-aware lexer, falls back to the legacy lexer
//! when the primary pass fails, and rebuilds the text from every non-comment
//! lexeme plus the comments the rule engine preserves. If both lexers fail
//! the input is returned unchanged.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use serde::Serialize;

use crate::diag::{Diagnostic, codes};
use crate::lexer::{ContextLexer, LegacyLexer, LexError, Token, Tokenize, covers_input};
use crate::preserve::RuleEngine;

static DEFAULT_RULES: LazyLock<RuleEngine> = LazyLock::new(RuleEngine::new);

/// Which lexer produced the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    /// The primary lexer (context-aware unless injected).
    Context,
    /// The fallback lexer.
    Legacy,
    /// Both failed; the input was returned unchanged.
    None,
}

/// Outcome of [`remove_comments`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessResult {
    /// Rebuilt text (the input itself when nothing could be tokenized).
    pub content: String,
    /// Whether `content` differs from the input.
    pub modified: bool,
    /// Comments dropped.
    pub removed: usize,
    /// Comments kept by a preservation rule.
    pub preserved: usize,
    /// Both lexers failed.
    pub critical: bool,
    /// Lexer whose token stream was used.
    pub engine: Engine,
    /// Preserved comments per rule category.
    pub preserved_by_category: BTreeMap<String, usize>,
    /// Diagnostics from every lexer that ran, plus fallback notices.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

impl ProcessResult {
    fn unchanged(input: &str, diagnostics: Vec<Diagnostic>) -> Self {
        Self {
            content: input.to_string(),
            modified: false,
            removed: 0,
            preserved: 0,
            critical: true,
            engine: Engine::None,
            preserved_by_category: BTreeMap::new(),
            diagnostics,
        }
    }
}

/// Remove comments using the built-in preservation rules.
///
/// ```
/// let r = comment_sweep_core::remove_comments("const x = 5; // comment");
/// assert_eq!(r.content, "const x = 5; ");
/// assert_eq!((r.removed, r.preserved), (1, 0));
/// ```
pub fn remove_comments(input: &str) -> ProcessResult {
    remove_comments_with(input, &DEFAULT_RULES)
}

/// Remove comments using a caller-configured rule engine.
pub fn remove_comments_with(input: &str, rules: &RuleEngine) -> ProcessResult {
    remove_with(
        input,
        rules,
        &mut ContextLexer::new(),
        &mut LegacyLexer::new(),
    )
}

/// Remove comments with explicit primary and fallback lexers.
pub fn remove_with(
    input: &str,
    rules: &RuleEngine,
    primary: &mut dyn Tokenize,
    fallback: &mut dyn Tokenize,
) -> ProcessResult {
    let first = attempt(primary, input);
    let mut diagnostics = primary.diagnostics().to_vec();
    let primary_err = match first {
        Ok(tokens) => return rebuild(input, &tokens, rules, Engine::Context, diagnostics),
        Err(e) => e,
    };

    log::warn!(
        "{} lexer failed ({primary_err}), retrying with {}",
        primary.name(),
        fallback.name()
    );
    diagnostics.push(
        Diagnostic::new(
            codes::FALLBACK_TOKENIZER,
            format!(
                "{} lexer failed: {primary_err}; used {} lexer",
                primary.name(),
                fallback.name()
            ),
            None,
        )
        .with_recovery(format!("output produced by the {} lexer", fallback.name())),
    );

    let second = attempt(fallback, input);
    diagnostics.extend(fallback.diagnostics().iter().cloned());
    match second {
        Ok(tokens) => rebuild(input, &tokens, rules, Engine::Legacy, diagnostics),
        Err(e) => {
            log::warn!("{} lexer failed ({e}), leaving input unchanged", fallback.name());
            diagnostics.push(
                Diagnostic::new(
                    codes::UNCHANGED_AFTER_FAILURE,
                    format!("both lexers failed: {primary_err}; {e}"),
                    None,
                )
                .with_recovery("input returned unchanged"),
            );
            ProcessResult::unchanged(input, diagnostics)
        }
    }
}

/// Run one lexer and insist its tokens reproduce the input exactly.
fn attempt<'a>(lexer: &mut dyn Tokenize, input: &'a str) -> Result<Vec<Token<'a>>, LexError> {
    let tokens = lexer.tokenize(input)?;
    if !covers_input(&tokens, input) {
        return Err(LexError::Incomplete {
            name: lexer.name(),
            covered: tokens.iter().map(|t| t.text.len()).sum(),
            len: input.len(),
        });
    }
    Ok(tokens)
}

fn rebuild(
    input: &str,
    tokens: &[Token<'_>],
    rules: &RuleEngine,
    engine: Engine,
    diagnostics: Vec<Diagnostic>,
) -> ProcessResult {
    let mut content = String::with_capacity(input.len());
    let mut removed = 0usize;
    let mut preserved = 0usize;
    let mut by_category: BTreeMap<String, usize> = BTreeMap::new();

    for tok in tokens {
        if !tok.is_comment() {
            content.push_str(tok.text);
            continue;
        }
        let class = rules.classify(tok.text);
        if class.preserve {
            preserved += 1;
            *by_category.entry(class.label()).or_default() += 1;
            content.push_str(tok.text);
        } else {
            removed += 1;
        }
    }

    log::debug!("{engine:?}: removed {removed}, preserved {preserved}");
    ProcessResult {
        modified: removed > 0,
        content,
        removed,
        preserved,
        critical: false,
        engine,
        preserved_by_category: by_category,
        diagnostics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diag::Severity;

    #[test]
    fn keeps_code_and_preserved_comments() {
        let r = remove_comments("a(); // drop\n// TODO: keep\nb();");
        assert_eq!(r.content, "a(); \n// TODO: keep\nb();");
        assert!(r.modified);
        assert_eq!(r.engine, Engine::Context);
        assert_eq!(r.preserved_by_category.get("development"), Some(&1));
        assert!(r.diagnostics.is_empty());
    }

    #[test]
    fn comment_free_input_is_unmodified() {
        let input = "const s = '// not a comment';\nlet t = `/* nope */`;";
        let r = remove_comments(input);
        assert!(!r.modified);
        assert_eq!(r.content, input);
        assert_eq!((r.removed, r.preserved), (0, 0));
    }

    #[test]
    fn preserved_only_input_is_unmodified() {
        let input = "// eslint-disable-next-line\nfoo();";
        let r = remove_comments(input);
        assert!(!r.modified);
        assert_eq!(r.preserved, 1);
    }

    #[test]
    fn comment_mentioning_a_linter_is_removed() {
        let r = remove_comments("// we run eslint in CI\nx();");
        assert_eq!(r.content, "\nx();");
        assert_eq!((r.removed, r.preserved), (1, 0));
    }

    #[test]
    fn arrow_body_regex_is_not_a_comment() {
        let input = "ok = xs.filter(s => /^\\/\\//.test(s)); keep(); // drop";
        let r = remove_comments(input);
        assert_eq!(r.content, "ok = xs.filter(s => /^\\/\\//.test(s)); keep(); ");
        assert_eq!(r.removed, 1);
    }

    #[test]
    fn empty_engine_drops_everything() {
        let r = remove_comments_with("/* TODO */x", &RuleEngine::empty());
        assert_eq!(r.content, "x");
        assert_eq!(r.removed, 1);
    }

    #[test]
    fn recoverable_problems_are_reported_without_fallback() {
        let r = remove_comments("x = 'open\n// c\n");
        assert_eq!(r.engine, Engine::Context);
        assert_eq!(r.removed, 1);
        assert!(r.diagnostics.iter().any(|d| d.id == codes::UNTERMINATED_STRING));
        assert!(r.diagnostics.iter().all(|d| d.severity < Severity::High));
    }

    #[test]
    fn iteration_ceiling_falls_back_to_legacy() {
        let rules = RuleEngine::new();
        let mut primary = ContextLexer::new().with_max_iterations(1);
        let r = remove_with(
            "a; // x\nb; // y",
            &rules,
            &mut primary,
            &mut LegacyLexer::new(),
        );
        assert_eq!(r.engine, Engine::Legacy);
        assert_eq!(r.content, "a; \nb; ");
        assert_eq!(r.removed, 2);
        assert!(!r.critical);
        let ids: Vec<_> = r.diagnostics.iter().map(|d| d.id.as_ref()).collect();
        assert!(ids.contains(&codes::ITERATION_LIMIT));
        assert!(ids.contains(&codes::FALLBACK_TOKENIZER));
    }
}
