//! Preservation rule engine.
//!
//! Decides, for one comment lexeme, whether it carries operational meaning
//! (framework directive, tooling pragma, documentation tag, development
//! marker, or a caller-supplied pattern) and must survive comment removal.
//!
//! Rules are kept sorted by descending priority; the first matching rule wins.
//! Rules of equal priority are evaluated in insertion order.
//!
//! ```
//! use comment_sweep_core::preserve::{RuleCategory, RuleEngine};
//!
//! let mut engine = RuleEngine::new();
//! engine.add_custom("keep-region", r"#region").unwrap();
//!
//! assert!(engine.classify("// TODO: tidy").preserve);
//! assert_eq!(
//!     engine.classify("// #region helpers").category,
//!     Some(RuleCategory::Custom)
//! );
//! assert!(!engine.classify("// increment i").preserve);
//! ```

mod builtin;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};
use serde::Serialize;

use crate::diag::{Diagnostic, codes};

/// Default priority of caller-supplied rules.
pub const CUSTOM_PRIORITY: i32 = 100;

/// Errors raised while registering rules.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum RuleError {
    /// The pattern is not a valid case-insensitive regular expression.
    #[error("invalid preservation pattern `{pattern}` for rule {name}")]
    InvalidPattern {
        /// Name of the rejected rule.
        name: String,
        /// The offending pattern source.
        pattern: String,
        /// Compiler error.
        #[source]
        source: regex::Error,
    },
}

impl RuleError {
    /// The error as a `CS1501` diagnostic, for reporting alongside scan diagnostics.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            RuleError::InvalidPattern {
                name,
                pattern,
                source,
            } => Diagnostic::new(
                codes::INVALID_RULE_PATTERN,
                format!("invalid pattern `{pattern}` for rule {name}: {source}"),
                None,
            )
            .with_context(BTreeMap::from([
                ("rule".to_string(), name.clone()),
                ("pattern".to_string(), pattern.clone()),
            ])),
        }
    }
}

/// Category of a preservation rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleCategory {
    /// Framework, bundler, and compiler directives.
    Framework,
    /// Linter, formatter, type-checker, and coverage pragmas.
    Tooling,
    /// Comments with `@tag` annotations.
    Documentation,
    /// TODO-style markers.
    Development,
    /// Caller-supplied.
    Custom,
}

impl RuleCategory {
    /// Priority built-in rules of this category are registered with.
    pub fn default_priority(self) -> i32 {
        match self {
            RuleCategory::Framework => 900,
            RuleCategory::Tooling => 800,
            RuleCategory::Documentation => 750,
            RuleCategory::Development => 700,
            RuleCategory::Custom => CUSTOM_PRIORITY,
        }
    }

    /// Category-specific details about a comment matched by `pattern`.
    ///
    /// Only informational: never affects the keep/drop decision.
    pub fn extract_metadata(self, pattern: &Regex, comment: &str) -> RuleMetadata {
        match self {
            RuleCategory::Framework => RuleMetadata::Framework {
                framework: builtin::framework_of(comment).to_string(),
            },
            RuleCategory::Tooling => RuleMetadata::Tooling {
                tool: builtin::tool_of(comment).to_string(),
            },
            RuleCategory::Documentation => RuleMetadata::Documentation {
                tags: doc_tags(comment),
            },
            RuleCategory::Development => RuleMetadata::Development {
                keyword: pattern
                    .find(comment)
                    .map(|m| m.as_str().to_ascii_uppercase())
                    .unwrap_or_default(),
            },
            RuleCategory::Custom => RuleMetadata::Custom {
                matched: pattern
                    .find(comment)
                    .map(|m| m.as_str().to_string())
                    .unwrap_or_default(),
            },
        }
    }
}

impl fmt::Display for RuleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RuleCategory::Framework => "framework",
            RuleCategory::Tooling => "tooling",
            RuleCategory::Documentation => "documentation",
            RuleCategory::Development => "development",
            RuleCategory::Custom => "custom",
        };
        f.write_str(s)
    }
}

/// Details extracted from a preserved comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RuleMetadata {
    /// Framework directive.
    Framework {
        /// e.g. `svelte`, `webpack`, `legal`.
        framework: String,
    },
    /// Tooling pragma.
    Tooling {
        /// e.g. `eslint`, `typescript`.
        tool: String,
    },
    /// Documentation comment.
    Documentation {
        /// Tags in order of appearance, without `@`, deduplicated.
        tags: Vec<String>,
    },
    /// Development marker.
    Development {
        /// The keyword, upper-cased.
        keyword: String,
    },
    /// Caller-supplied rule.
    Custom {
        /// Text the pattern matched.
        matched: String,
    },
}

static DOC_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[\s*])@([A-Za-z][\w-]*)").unwrap_or_else(|e| panic!("doc tag pattern: {e}"))
});

fn doc_tags(comment: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for cap in DOC_TAG.captures_iter(comment) {
        let tag = cap[1].to_string();
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    tags
}

/// A named, prioritised pattern over comment lexemes.
#[derive(Debug, Clone)]
pub struct PreservationRule {
    /// Rule name (not required to be unique).
    pub name: String,
    /// Case-insensitive pattern applied to the whole lexeme, delimiters included.
    pub pattern: Regex,
    /// Higher wins.
    pub priority: i32,
    /// Human description.
    pub description: String,
    /// Rule category.
    pub category: RuleCategory,
}

impl PreservationRule {
    /// Compile a rule. The pattern is always compiled case-insensitively.
    pub fn new(
        name: impl Into<String>,
        pattern: &str,
        priority: i32,
        description: impl Into<String>,
        category: RuleCategory,
    ) -> Result<Self, RuleError> {
        let name = name.into();
        let compiled = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|source| RuleError::InvalidPattern {
                name: name.clone(),
                pattern: pattern.to_string(),
                source,
            })?;
        Ok(Self {
            name,
            pattern: compiled,
            priority,
            description: description.into(),
            category,
        })
    }

    /// Whether the rule matches `comment`.
    pub fn matches(&self, comment: &str) -> bool {
        self.pattern.is_match(comment)
    }
}

/// Outcome of classifying one comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification {
    /// Category of the winning rule; `None` means a regular comment.
    pub category: Option<RuleCategory>,
    /// Name of the winning rule.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule: Option<String>,
    /// Whether the comment must be kept.
    pub preserve: bool,
    /// Category-specific details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<RuleMetadata>,
}

impl Classification {
    /// A comment no rule matched.
    pub fn regular() -> Self {
        Self {
            category: None,
            rule: None,
            preserve: false,
            metadata: None,
        }
    }

    /// Category label, `regular` when nothing matched.
    pub fn label(&self) -> String {
        self.category
            .map_or_else(|| "regular".to_string(), |c| c.to_string())
    }
}

/// Priority-ordered rule collection.
///
/// `classify` takes `&self`, so one engine can be shared read-only across
/// threads once all rules are registered.
#[derive(Debug, Clone)]
pub struct RuleEngine {
    rules: Vec<PreservationRule>,
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleEngine {
    /// Engine with the built-in rules.
    pub fn new() -> Self {
        let mut engine = Self {
            rules: builtin::rules(),
        };
        engine.sort();
        engine
    }

    /// Engine with no rules at all; every comment is regular.
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Drop every custom rule and restore the built-ins.
    pub fn reset(&mut self) {
        self.rules = builtin::rules();
        self.sort();
    }

    /// Register a custom rule with an explicit priority.
    ///
    /// On error the engine is left unchanged.
    pub fn add_rule(
        &mut self,
        name: impl Into<String>,
        pattern: &str,
        priority: i32,
        description: impl Into<String>,
    ) -> Result<(), RuleError> {
        let rule = PreservationRule::new(name, pattern, priority, description, RuleCategory::Custom)?;
        self.push(rule);
        Ok(())
    }

    /// Register a custom rule at [`CUSTOM_PRIORITY`].
    pub fn add_custom(&mut self, name: impl Into<String>, pattern: &str) -> Result<(), RuleError> {
        self.add_rule(name, pattern, CUSTOM_PRIORITY, "custom rule")
    }

    /// Register an already-compiled rule.
    pub fn push(&mut self, rule: PreservationRule) {
        self.rules.push(rule);
        self.sort();
    }

    /// Rules in evaluation order.
    pub fn rules(&self) -> &[PreservationRule] {
        &self.rules
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the engine has no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Classify a comment lexeme; first match in priority order wins.
    pub fn classify(&self, comment: &str) -> Classification {
        match self.rules.iter().find(|r| r.matches(comment)) {
            Some(rule) => Classification {
                category: Some(rule.category),
                rule: Some(rule.name.clone()),
                preserve: true,
                metadata: Some(rule.category.extract_metadata(&rule.pattern, comment)),
            },
            None => Classification::regular(),
        }
    }

    fn sort(&mut self) {
        // Stable: equal priorities keep insertion order.
        self.rules.sort_by(|a, b| b.priority.cmp(&a.priority));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rules_are_priority_sorted() {
        let engine = RuleEngine::new();
        let priorities: Vec<i32> = engine.rules().iter().map(|r| r.priority).collect();
        let mut sorted = priorities.clone();
        sorted.sort_by(|a, b| b.cmp(a));
        assert_eq!(priorities, sorted);
        assert_eq!(engine.rules()[0].category, RuleCategory::Framework);
    }

    #[test]
    fn regular_comment_is_dropped() {
        let c = RuleEngine::new().classify("// a");
        assert_eq!(c, Classification::regular());
        assert_eq!(c.label(), "regular");
    }

    #[test]
    fn development_keywords_case_insensitive() {
        let engine = RuleEngine::new();
        for comment in ["/* TODO: b */", "// fixme later", "// Hack around it"] {
            let c = engine.classify(comment);
            assert!(c.preserve, "{comment}");
            assert_eq!(c.category, Some(RuleCategory::Development));
        }
        let c = engine.classify("// fixme later");
        assert_eq!(
            c.metadata,
            Some(RuleMetadata::Development {
                keyword: "FIXME".into()
            })
        );
    }

    #[test]
    fn keyword_needs_word_boundary() {
        assert!(!RuleEngine::new().classify("// mastodon bugle").preserve);
    }

    #[test]
    fn framework_beats_development() {
        let c = RuleEngine::new().classify("<!-- svelte-ignore a11y-autofocus TODO remove -->");
        assert_eq!(c.category, Some(RuleCategory::Framework));
        assert_eq!(c.rule.as_deref(), Some("svelte-ignore"));
        assert_eq!(
            c.metadata,
            Some(RuleMetadata::Framework {
                framework: "svelte".into()
            })
        );
    }

    #[test]
    fn tooling_pragmas() {
        let engine = RuleEngine::new();
        for (comment, tool) in [
            ("// eslint-disable-next-line no-console", "eslint"),
            ("// prettier-ignore", "prettier"),
            ("// @ts-expect-error wrong types", "typescript"),
            ("/* istanbul ignore next */", "istanbul"),
            ("/* global window */", "eslint"),
            ("/* eslint no-console: off */", "eslint"),
            ("/* eslint-enable */", "eslint"),
        ] {
            let c = engine.classify(comment);
            assert_eq!(c.category, Some(RuleCategory::Tooling), "{comment}");
            assert_eq!(c.metadata, Some(RuleMetadata::Tooling { tool: tool.into() }));
        }
    }

    #[test]
    fn mentioning_eslint_is_not_a_directive() {
        let engine = RuleEngine::new();
        for comment in [
            "// we run eslint in CI",
            "// eslint is configured in package.json",
            "/* see the eslint docs */",
        ] {
            assert!(!engine.classify(comment).preserve, "{comment}");
        }
    }

    #[test]
    fn documentation_tags_listed() {
        let c = RuleEngine::new().classify("/**\n * Add.\n * @param a first\n * @param b\n * @returns sum\n */");
        assert_eq!(c.category, Some(RuleCategory::Documentation));
        assert_eq!(
            c.metadata,
            Some(RuleMetadata::Documentation {
                tags: vec!["param".into(), "returns".into()]
            })
        );
    }

    #[test]
    fn email_is_not_a_doc_tag() {
        assert!(!RuleEngine::new().classify("// mail me: dev@example.com").preserve);
    }

    #[test]
    fn bundler_and_references() {
        let engine = RuleEngine::new();
        assert!(engine.classify("/* webpackChunkName: \"admin\" */").preserve);
        assert!(engine.classify("/*#__PURE__*/").preserve);
        assert!(engine.classify("/// <reference types=\"node\" />").preserve);
        assert!(engine.classify("/*! jQuery v3 | (c) OpenJS */").preserve);
        assert!(engine.classify("/* @vite-ignore */").preserve);
    }

    #[test]
    fn custom_rule_default_and_explicit_priority() {
        let mut engine = RuleEngine::new();
        engine.add_custom("region", "#region").unwrap();
        let c = engine.classify("// #region TODO");
        // Development keyword (700) outranks a default custom rule (100).
        assert_eq!(c.category, Some(RuleCategory::Development));

        engine.add_rule("region-high", "#region", 1000, "regions first").unwrap();
        let c = engine.classify("// #region TODO");
        assert_eq!(c.category, Some(RuleCategory::Custom));
        assert_eq!(c.rule.as_deref(), Some("region-high"));
        assert_eq!(
            c.metadata,
            Some(RuleMetadata::Custom {
                matched: "#region".into()
            })
        );
    }

    #[test]
    fn equal_priority_keeps_insertion_order() {
        let mut engine = RuleEngine::empty();
        engine.add_custom("first", "keep").unwrap();
        engine.add_custom("second", "keep").unwrap();
        engine.add_custom("first", "other").unwrap();
        assert_eq!(engine.len(), 3);
        assert_eq!(engine.classify("// keep").rule.as_deref(), Some("first"));
        let names: Vec<_> = engine.rules().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["first", "second", "first"]);
    }

    #[test]
    fn custom_patterns_are_case_insensitive() {
        let mut engine = RuleEngine::empty();
        engine.add_custom("keep", "KEEP-ME").unwrap();
        assert!(engine.classify("// keep-me please").preserve);
    }

    #[test]
    fn invalid_pattern_is_reported_and_engine_unchanged() {
        let mut engine = RuleEngine::new();
        let before = engine.len();
        let err = engine.add_custom("broken", "(unclosed").unwrap_err();
        assert!(err.to_string().contains("(unclosed"), "{err}");
        assert_eq!(engine.len(), before);

        let diag = err.to_diagnostic();
        assert_eq!(diag.id, codes::INVALID_RULE_PATTERN);
        assert_eq!(diag.severity, crate::diag::Severity::High);
        assert_eq!(diag.context.unwrap()["rule"], "broken");
    }

    #[test]
    fn reset_restores_builtins() {
        let mut engine = RuleEngine::new();
        let builtin = engine.len();
        engine.add_custom("x", "x").unwrap();
        engine.reset();
        assert_eq!(engine.len(), builtin);
        assert!(engine.rules().iter().all(|r| r.category != RuleCategory::Custom));
    }

    #[test]
    fn engine_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RuleEngine>();
    }
}
