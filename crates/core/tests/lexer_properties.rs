//! Behavioural properties of the context-aware lexer and the orchestrator on
//! small, hand-picked inputs.

mod common;

use common::{has_id, texts_of};
use comment_sweep_core::codes;
use comment_sweep_core::lexer::{ContextLexer, TokenContext, TokenKind, covers_input};
use comment_sweep_core::{RuleCategory, RuleEngine, remove_comments};

fn lex(input: &str) -> (Vec<(TokenKind, String)>, ContextLexer) {
    let mut lexer = ContextLexer::new();
    let toks = lexer
        .tokenize(input)
        .into_iter()
        .map(|t| (t.kind, t.text.to_string()))
        .collect();
    (toks, lexer)
}

fn regexes(input: &str) -> Vec<String> {
    let mut lexer = ContextLexer::new();
    let toks = lexer.tokenize(input);
    texts_of(&toks, TokenKind::Regex)
        .into_iter()
        .map(str::to_string)
        .collect()
}

// ─── Coverage ───────────────────────────────────────────────────────────────

#[test]
fn tokens_cover_input_in_order() {
    let inputs = [
        "",
        "a / b / c",
        "const r = /\\/\\*.*\\*\\//g; // x",
        "`a ${ {k: `b ${c}`} } d` /* e */",
        "<!-- html --> <div>{x}</div>",
        "'é' + \"ü\" // ñ\n",
        "x = 'open\ny = `open",
    ];
    for input in inputs {
        let mut lexer = ContextLexer::new();
        let toks = lexer.tokenize(input);
        assert!(covers_input(&toks, input), "{input:?}");
        for pair in toks.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
    }
}

#[test]
fn removal_only_drops_comment_bytes() {
    let input = "a = 1; // one\nb = /x/g; /* two */ c = `${d}`;";
    let r = remove_comments(input);
    assert_eq!(r.content, "a = 1; \nb = /x/g;  c = `${d}`;");
}

// ─── Regex / division ───────────────────────────────────────────────────────

#[test]
fn division_chain_has_no_regex() {
    assert!(regexes("a / b / c").is_empty());
    assert!(regexes("(a + b) / 2 / c").is_empty());
    assert!(regexes("arr[0] / arr[1]").is_empty());
}

#[test]
fn regex_literals_include_flags() {
    assert_eq!(regexes("/test/g"), ["/test/g"]);
    assert_eq!(regexes("return /test/g;"), ["/test/g"]);
    assert_eq!(regexes("x ? /test/g : null"), ["/test/g"]);
    assert_eq!(regexes("s.replace(/a/gimsuy, '')"), ["/a/gimsuy"]);
}

#[test]
fn regex_after_newline_starts_a_statement() {
    assert_eq!(regexes("x = 1\n/ab+c/.test(s)"), ["/ab+c/"]);
}

#[test]
fn slash_inside_character_class() {
    assert_eq!(regexes("r = /[/*]+/;"), ["/[/*]+/"]);
}

#[test]
fn member_named_like_keyword_divides() {
    assert!(regexes("obj.return / 2 / 3").is_empty());
}

// ─── String and template immunity ───────────────────────────────────────────

#[test]
fn comment_delimiters_inside_literals() {
    for input in [
        "\"this // is not a comment\"",
        "`this /* not */ a comment`",
        "'<!-- nor this -->'",
    ] {
        let (toks, _) = lex(input);
        assert!(toks.iter().all(|(k, _)| *k != TokenKind::Comment), "{input}");
        assert_eq!(toks.len(), 1);
        assert_eq!(toks[0].1, input);
    }
}

#[test]
fn template_interpolation_depth() {
    let input = "`outer ${ `inner ${x}` } tail`";
    let mut lexer = ContextLexer::new();
    let toks = lexer.tokenize(input);
    assert_eq!(toks.len(), 1);
    assert_eq!(toks[0].context, TokenContext::Template { depth: 2 });
    assert!(lexer.diagnostics().is_empty());
}

// ─── Preservation ───────────────────────────────────────────────────────────

#[test]
fn higher_priority_rule_wins_and_counts_once() {
    let r = remove_comments("<!-- svelte-ignore a11y-missing-attribute TODO -->\n<img>");
    assert_eq!(r.preserved, 1);
    assert_eq!(r.removed, 0);
    assert_eq!(r.preserved_by_category.get("framework"), Some(&1));
    assert_eq!(r.preserved_by_category.get("development"), None);

    let c = RuleEngine::new().classify("// @ts-ignore TODO");
    assert_eq!(c.category, Some(RuleCategory::Tooling));
}

// ─── Recovery ───────────────────────────────────────────────────────────────

#[test]
fn unterminated_constructs_terminate_with_diagnostics() {
    for (input, id) in [
        ("\"unterminated", codes::UNTERMINATED_STRING),
        ("`unterminated", codes::UNTERMINATED_TEMPLATE),
        ("/unterminated", codes::UNTERMINATED_REGEX),
    ] {
        let (toks, lexer) = lex(input);
        assert!(!toks.is_empty(), "{input}");
        assert!(has_id(lexer.diagnostics(), id), "{input}: {:?}", lexer.diagnostics());
    }
}

#[test]
fn control_bytes_terminate() {
    let (toks, _) = lex("\x00\x01\x02");
    assert!(!toks.is_empty());
    assert_eq!(
        toks.iter().map(|(_, t)| t.as_str()).collect::<String>(),
        "\x00\x01\x02"
    );
}

// ─── Concrete scenario ──────────────────────────────────────────────────────

#[test]
fn regex_with_comment_lookalikes_survives() {
    let input = "// a\n/* TODO: b */\nconst r = /\\/\\*.*\\*\\//g;";
    let r = remove_comments(input);
    assert_eq!(r.removed, 1);
    assert_eq!(r.preserved, 1);
    assert!(r.content.contains("/\\/\\*.*\\*\\//g"));
    assert!(r.content.contains("/* TODO: b */"));
    assert!(!r.content.contains("// a"));
    assert_eq!(r.content, "\n/* TODO: b */\nconst r = /\\/\\*.*\\*\\//g;");
}
