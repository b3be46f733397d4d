//! comment-sweep core library.
//!
//! Removes non-essential comments from JavaScript-family source (including
//! Svelte and Vue markup) without touching string, template, or regular
//! expression literals, while keeping comments that carry operational meaning.
//! The main entry points are [`remove_comments`] for comment removal,
//! [`RuleEngine`] for classification, and [`strip_log_calls`] for dropping
//! debug logging.

#![warn(missing_docs)]

/// Loading and validating `csweep.jsonc` configuration.
pub mod config;
/// Re-exports from the diagnostics crate.
pub mod diag;
/// Token model, context-aware lexer, and legacy fallback lexer.
pub mod lexer;
/// Debug-logging call removal.
pub mod logs;
/// Preservation rule engine.
pub mod preserve;
/// Comment removal orchestrator.
pub mod remove;

// ── Convenience re-exports ──────────────────────────────────────────────────

// Lexers
pub use lexer::{
    ContextLexer, LegacyLexer, LexError, Token, TokenContext, TokenKind, Tokenize, reassemble,
};

// Rules
pub use preserve::{Classification, PreservationRule, RuleCategory, RuleEngine, RuleError, RuleMetadata};

// Orchestrator
pub use remove::{Engine, ProcessResult, remove_comments, remove_comments_with, remove_with};

// Log stripping
pub use logs::{DEFAULT_LOG_CALLEES, LogStripResult, strip_log_calls};

// Configuration
pub use config::{Config, ConfigError, CustomRule, load_config, load_config_from_str};

// Diagnostics (re-exported from the diagnostics crate)
pub use diag::{Diagnostic, Severity, Span, codes};
