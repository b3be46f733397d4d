//! Built-in preservation vocabulary.

use std::sync::LazyLock;

use super::{PreservationRule, RuleCategory};

/// `(name, pattern, category, description)` for every built-in rule.
const BUILTIN: &[(&str, &str, RuleCategory, &str)] = &[
    // ── Framework directives ────────────────────────────────────────────
    (
        "svelte-ignore",
        r"svelte-ignore\b",
        RuleCategory::Framework,
        "Svelte compiler warning suppression",
    ),
    (
        "vue-directive",
        r"@vue-(ignore|expect-error|skip|generic)\b",
        RuleCategory::Framework,
        "Vue language tools template directive",
    ),
    (
        "triple-slash-directive",
        r"^///\s*<(reference|amd-module|amd-dependency)\b",
        RuleCategory::Framework,
        "TypeScript triple-slash reference directive",
    ),
    (
        "jsx-pragma",
        r"@jsx(ImportSource|Frag|Runtime)?\b",
        RuleCategory::Framework,
        "JSX factory and runtime pragma",
    ),
    (
        "bundler-magic-comment",
        r"webpack(ChunkName|Prefetch|Preload|Ignore|Mode|Include|Exclude|Exports)\b|@vite-ignore\b|turbopackIgnore\b",
        RuleCategory::Framework,
        "Bundler import hint (magic comment)",
    ),
    (
        "pure-annotation",
        r"[@#]__(PURE|NO_SIDE_EFFECTS|INLINE|NOINLINE)__",
        RuleCategory::Framework,
        "Tree-shaking purity annotation",
    ),
    (
        "legal-banner",
        r"^/\*!|@(license|preserve|copyright)\b",
        RuleCategory::Framework,
        "License or legal banner kept by minifiers",
    ),
    // ── Tooling pragmas ─────────────────────────────────────────────────
    (
        "eslint-directive",
        r"\beslint-(disable(-next-line|-line)?|enable|env)\b|^/\*+\s*(eslint|global|globals|exported)\s",
        RuleCategory::Tooling,
        "ESLint configuration or suppression comment",
    ),
    (
        "prettier-ignore",
        r"\bprettier-ignore\b",
        RuleCategory::Tooling,
        "Prettier formatting suppression",
    ),
    (
        "typescript-directive",
        r"@ts-(ignore|expect-error|nocheck|check)\b",
        RuleCategory::Tooling,
        "TypeScript checker directive",
    ),
    (
        "flow-directive",
        r"@flow\b|\$Flow(FixMe|Ignore|ExpectedError|Issue)\b",
        RuleCategory::Tooling,
        "Flow type checker directive",
    ),
    (
        "coverage-directive",
        r"\b(istanbul|c8|v8)\s+ignore\b",
        RuleCategory::Tooling,
        "Code coverage exclusion hint",
    ),
    (
        "linter-ignore",
        r"\b(biome-ignore|deno-lint-ignore(-file)?|deno-fmt-ignore(-file)?|oxlint-disable(-next-line)?|stylelint-(disable|enable)(-next-line|-line)?|jshint|jslint|jscs:(disable|enable)|tslint:(disable|enable))",
        RuleCategory::Tooling,
        "Other linter or formatter suppression",
    ),
    // ── Documentation ───────────────────────────────────────────────────
    (
        "doc-tag",
        r"(^|[\s*])@[a-z][\w-]*",
        RuleCategory::Documentation,
        "Documentation comment with @tag annotations",
    ),
    // ── Development keywords ────────────────────────────────────────────
    (
        "dev-keyword",
        r"\b(TODO|FIXME|HACK|XXX|BUG|NOTE|OPTIMIZE|REVIEW|DEPRECATED|SECURITY|PERF)\b",
        RuleCategory::Development,
        "Development marker such as TODO or FIXME",
    ),
];

static RULES: LazyLock<Vec<PreservationRule>> = LazyLock::new(|| {
    BUILTIN
        .iter()
        .map(|&(name, pattern, category, description)| {
            PreservationRule::new(
                name,
                pattern,
                category.default_priority(),
                description,
                category,
            )
            .unwrap_or_else(|e| panic!("built-in rule {name} must compile: {e}"))
        })
        .collect()
});

/// The built-in rules, in declaration order (not yet priority-sorted).
pub(crate) fn rules() -> Vec<PreservationRule> {
    RULES.clone()
}

/// Framework a framework-directive comment belongs to.
pub(crate) fn framework_of(comment: &str) -> &'static str {
    let lower = comment.to_ascii_lowercase();
    const TABLE: &[(&str, &str)] = &[
        ("svelte-ignore", "svelte"),
        ("@vue-", "vue"),
        ("<reference", "typescript"),
        ("<amd-", "typescript"),
        ("@jsx", "jsx"),
        ("webpack", "webpack"),
        ("vite-ignore", "vite"),
        ("turbopack", "turbopack"),
        ("__pure__", "bundler"),
        ("__no_side_effects__", "bundler"),
        ("__inline__", "bundler"),
        ("__noinline__", "bundler"),
    ];
    TABLE
        .iter()
        .find(|(needle, _)| lower.contains(needle))
        .map_or("legal", |(_, name)| name)
}

/// Tool a tooling pragma is addressed to.
pub(crate) fn tool_of(comment: &str) -> &'static str {
    let lower = comment.to_ascii_lowercase();
    const TABLE: &[(&str, &str)] = &[
        ("stylelint", "stylelint"),
        ("eslint", "eslint"),
        ("prettier", "prettier"),
        ("@ts-", "typescript"),
        ("flow", "flow"),
        ("istanbul", "istanbul"),
        ("c8 ", "c8"),
        ("v8 ", "v8"),
        ("biome", "biome"),
        ("deno-", "deno"),
        ("oxlint", "oxlint"),
        ("jshint", "jshint"),
        ("jslint", "jslint"),
        ("jscs", "jscs"),
        ("tslint", "tslint"),
        ("global", "eslint"),
        ("exported", "eslint"),
    ];
    TABLE
        .iter()
        .find(|(needle, _)| lower.contains(needle))
        .map_or("unknown", |(_, name)| name)
}
