mod discover;
mod render;

use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use comment_sweep_core::config::DEFAULT_CONFIG_FILE;
use comment_sweep_core::lexer::{ContextLexer, legacy};
use comment_sweep_core::{
    Config, ConfigError, load_config, remove_comments_with, strip_log_calls,
};
use comment_sweep_diagnostics::{self as diag, Diagnostic, codes};
use serde_json::{Map, Value, json};

use crate::discover::{FileFilter, collect_files};
use crate::render::{Format, print_summary, render_diagnostics_pretty};

// ── CLI definition ──────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "csweep",
    version,
    about = "comment-sweep: remove non-essential comments from JavaScript, TypeScript, Svelte, and Vue sources"
)]
struct Cli {
    /// Output mode: "pretty" for coloured terminal output, "json" for
    /// machine-readable JSON. Defaults to "pretty" when stdout is a TTY,
    /// "json" otherwise.
    #[arg(long, global = true, value_parser = ["pretty", "json"])]
    output: Option<String>,

    #[command(subcommand)]
    cmd: Cmd,
}

/// Arguments shared by the file-rewriting commands.
#[derive(Args, Debug)]
struct FileArgs {
    /// Files or directories. Directories are walked and filtered by the
    /// configured include/exclude globs.
    #[arg(required = true)]
    paths: Vec<PathBuf>,
    /// Write the result back to each file (in-place).
    #[arg(long, short, conflicts_with = "check")]
    write: bool,
    /// Exit 1 if any file would change. For CI.
    #[arg(long, conflicts_with = "write")]
    check: bool,
    /// Configuration file (default: ./csweep.jsonc when present).
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    // ── File transformation ─────────────────────────────────────────
    /// Remove comments, keeping directives, pragmas, doc tags, and markers.
    Strip(FileArgs),

    /// Remove debug logging calls such as console.log(...).
    StripLogs(FileArgs),

    // ── Inspection ──────────────────────────────────────────────────
    /// Print the token stream of a file as JSON.
    Tokenize {
        file: PathBuf,
        /// Use the legacy lexer instead of the context-aware one.
        #[arg(long)]
        legacy: bool,
    },

    /// Classify a single comment lexeme, delimiters included.
    Classify {
        comment: String,
        /// Configuration file with custom rules.
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Explain a diagnostic ID (e.g. CS1301).
    Explain { id: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Print,
    Write,
    Check,
}

impl From<&FileArgs> for Mode {
    fn from(args: &FileArgs) -> Self {
        if args.write {
            Mode::Write
        } else if args.check {
            Mode::Check
        } else {
            Mode::Print
        }
    }
}

// ── Main ────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .target(env_logger::Target::Stderr)
        .init();

    let cli = Cli::parse();
    let format = Format::resolve_or_detect(cli.output.as_deref());

    match cli.cmd {
        Cmd::Strip(args) => cmd_strip(&args, format)?,
        Cmd::StripLogs(args) => cmd_strip_logs(&args, format)?,
        Cmd::Tokenize { file, legacy } => cmd_tokenize(&file, legacy, format)?,
        Cmd::Classify { comment, config } => cmd_classify(&comment, config.as_deref(), format)?,
        Cmd::Explain { id } => cmd_explain(&id, format)?,
    }

    Ok(())
}

// ── Commands ────────────────────────────────────────────────────────────

fn cmd_strip(args: &FileArgs, format: Format) -> Result<()> {
    let config = resolve_config(args.config.as_deref())?;
    let rules = config.rule_engine()?;
    let files = discover(args, &config)?;

    process_files(&files, Mode::from(args), format, |input| {
        let r = remove_comments_with(input, &rules);
        let mut stats = Map::new();
        stats.insert("removed".into(), json!(r.removed));
        stats.insert("preserved".into(), json!(r.preserved));
        stats.insert("engine".into(), json!(r.engine));
        stats.insert("critical".into(), json!(r.critical));
        stats.insert(
            "preserved_by_category".into(),
            json!(r.preserved_by_category),
        );
        Ok(Processed {
            summary: format!("removed {}, preserved {}", r.removed, r.preserved),
            content: r.content,
            modified: r.modified,
            critical: r.critical,
            diagnostics: r.diagnostics,
            stats,
        })
    })
}

fn cmd_strip_logs(args: &FileArgs, format: Format) -> Result<()> {
    let config = resolve_config(args.config.as_deref())?;
    let callees = config.log_callees();
    let files = discover(args, &config)?;

    process_files(&files, Mode::from(args), format, |input| {
        let r = strip_log_calls(input, callees.as_slice())?;
        let mut stats = Map::new();
        stats.insert("removed".into(), json!(r.removed));
        Ok(Processed {
            summary: format!("removed {} calls", r.removed),
            content: r.content,
            modified: r.modified,
            critical: false,
            diagnostics: Vec::new(),
            stats,
        })
    })
}

fn cmd_tokenize(file: &Path, use_legacy: bool, format: Format) -> Result<()> {
    let input = read_source(file)?;
    let name = file.display().to_string();

    let mut lexer = ContextLexer::new();
    let tokens = if use_legacy {
        legacy::tokenize(&input)?
    } else {
        lexer.tokenize(&input)
    };
    let diagnostics = lexer.diagnostics();

    match format {
        Format::Json => {
            let out = json!({
                "tokens": tokens,
                "diagnostics": diagnostics,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Format::Pretty => {
            // Tokens to stdout, diagnostics to stderr.
            println!("{}", serde_json::to_string_pretty(&tokens)?);
            render_diagnostics_pretty(&input, &name, diagnostics);
            print_summary(diagnostics);
        }
    }

    exit_on_critical(diagnostics);
    Ok(())
}

fn cmd_classify(comment: &str, config_path: Option<&Path>, format: Format) -> Result<()> {
    let config = resolve_config(config_path)?;
    let engine = config.rule_engine()?;
    let class = engine.classify(comment);

    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&class)?),
        Format::Pretty => {
            use ariadne::{Color, Fmt};
            if class.preserve {
                println!(
                    "{} {} ({})",
                    "preserve".fg(Color::Green),
                    class.label(),
                    class.rule.as_deref().unwrap_or("-")
                );
                if let Some(meta) = &class.metadata {
                    println!("  {}", serde_json::to_string(meta)?);
                }
            } else {
                println!("{} regular comment", "remove".fg(Color::Red));
            }
        }
    }
    Ok(())
}

fn cmd_explain(id: &str, format: Format) -> Result<()> {
    match format {
        Format::Json => {
            let out = json!({
                "id": id,
                "severity": diag::default_severity(id),
                "category": diag::default_category(id),
                "explanation": diag::explain(id),
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Format::Pretty => {
            // Explanation is the expected output, so write to stdout, not stderr.
            if let Some(text) = diag::explain(id) {
                use ariadne::Fmt;
                println!("{}: {}", id.fg(ariadne::Color::Cyan), text);
            } else {
                println!("{}: (no explanation available)", id);
            }
        }
    }
    Ok(())
}

// ── File processing ─────────────────────────────────────────────────────

/// Result of transforming one file's text.
struct Processed {
    content: String,
    modified: bool,
    critical: bool,
    diagnostics: Vec<Diagnostic>,
    summary: String,
    stats: Map<String, Value>,
}

/// Run `process` over every file, then report and exit according to `mode`.
///
/// Exits 1 when a file could not be read, a critical diagnostic was
/// produced, or (`--check`) a file would change.
fn process_files<F>(files: &[PathBuf], mode: Mode, format: Format, mut process: F) -> Result<()>
where
    F: FnMut(&str) -> Result<Processed>,
{
    let mut reports = Vec::with_capacity(files.len());
    let mut all_diagnostics = Vec::new();
    let mut failed = false;
    let multiple = files.len() > 1;

    for file in files {
        let name = file.display().to_string();
        let input = match read_source(file) {
            Ok(s) => s,
            Err(e) => {
                let d = Diagnostic::new(codes::FILE_IO, format!("{e:#}"), None);
                if format == Format::Pretty {
                    render_diagnostics_pretty("", &name, std::slice::from_ref(&d));
                }
                reports.push(json!({ "file": name, "status": "error", "diagnostics": [&d] }));
                all_diagnostics.push(d);
                failed = true;
                continue;
            }
        };

        let out = process(&input)?;
        failed |= out.critical || out.diagnostics.iter().any(Diagnostic::is_critical);

        let status = match mode {
            Mode::Print if out.modified => "modified",
            Mode::Check if out.modified => {
                failed = true;
                "would change"
            }
            Mode::Write if out.modified => {
                fs::write(file, &out.content)
                    .with_context(|| format!("failed to write {name}"))?;
                "written"
            }
            _ => "unchanged",
        };

        if format == Format::Pretty {
            render_diagnostics_pretty(&input, &name, &out.diagnostics);
            if mode == Mode::Print {
                if multiple {
                    println!("==> {name} <==");
                }
                print!("{}", out.content);
            } else {
                eprintln!("{status}: {name} ({})", out.summary);
            }
        }

        let mut report = Map::new();
        report.insert("file".into(), json!(name));
        report.insert("status".into(), json!(status));
        report.extend(out.stats);
        if !out.diagnostics.is_empty() {
            report.insert("diagnostics".into(), json!(out.diagnostics));
            all_diagnostics.extend(out.diagnostics);
        }
        if mode == Mode::Print {
            report.insert("content".into(), json!(out.content));
        }
        reports.push(Value::Object(report));
    }

    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&reports)?),
        Format::Pretty => print_summary(&all_diagnostics),
    }

    if failed {
        process::exit(1);
    }
    Ok(())
}

// ── Helpers ─────────────────────────────────────────────────────────────

/// Exit with code 1 if any diagnostic is critical.
fn exit_on_critical(diagnostics: &[Diagnostic]) {
    if diagnostics.iter().any(Diagnostic::is_critical) {
        process::exit(1);
    }
}

fn read_source(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

/// Load configuration from (in priority order):
///   1. Explicit `--config` path
///   2. `csweep.jsonc` in the working directory
///
/// Falls back to the defaults when neither exists.
fn resolve_config(explicit: Option<&Path>) -> Result<Config> {
    if let Some(path) = explicit {
        return load_reporting(path);
    }
    let default = Path::new(DEFAULT_CONFIG_FILE);
    if default.is_file() {
        log::debug!("using {DEFAULT_CONFIG_FILE} from the working directory");
        return load_reporting(default);
    }
    Ok(Config::default())
}

/// Load a configuration file, rendering a rejected rule pattern as a
/// diagnostic before returning the error.
fn load_reporting(path: &Path) -> Result<Config> {
    let name = path.display().to_string();
    load_config(path).map_err(|e| {
        if let ConfigError::InvalidRule(rule) = &e {
            render_diagnostics_pretty("", &name, std::slice::from_ref(&rule.to_diagnostic()));
        }
        anyhow::Error::new(e).context(format!("failed to load configuration '{name}'"))
    })
}

fn discover(args: &FileArgs, config: &Config) -> Result<Vec<PathBuf>> {
    let filter = FileFilter::new(&config.include, &config.exclude)?;
    collect_files(&args.paths, &filter)
}
