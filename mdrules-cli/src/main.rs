use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use mdrules::config_locator::{self, ConfigSource};
use mdrules::{FormatOutcome, Formatter};

#[derive(Parser)]
#[command(name = "mdrules")]
#[command(about = "Format Markdown documents with configurable transformation rules")]
#[command(version)]
struct Args {
    /// Markdown file to format (reads stdin when omitted or "-")
    input: Option<PathBuf>,

    /// Path to config file (YAML, or JSON by extension)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write the formatted text here instead of stdout
    #[arg(short, long, conflicts_with = "in_place")]
    output: Option<PathBuf>,

    /// Overwrite INPUT with the formatted text
    #[arg(long)]
    in_place: bool,

    /// Print a unified before/after diff instead of the formatted text
    #[arg(long)]
    diff: bool,

    /// List every rule in the catalog and exit
    #[arg(long)]
    list_rules: bool,

    /// Print the execution order for the current config and exit
    #[arg(long)]
    plan: bool,

    /// How to report substitutions and warnings on stderr
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    report: ReportFormat,

    /// Enable debug logging for the formatting pipeline
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ReportFormat {
    Text,
    Json,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // --verbose enables DEBUG, otherwise use RUST_LOG or default to WARN
    let filter = if args.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let formatter = Formatter::with_builtins();

    if args.list_rules {
        for name in formatter.catalog().list_names() {
            println!("{name}");
        }
        return Ok(());
    }

    let (config, source) = config_locator::resolve(args.config.as_deref())?;
    debug!(?source, "resolved formatter config");
    match &source {
        ConfigSource::Explicit(path) | ConfigSource::Discovered(path) => {
            eprintln!("📋 Loaded config from: {}", path.display());
        }
        ConfigSource::Fallback(path) => {
            eprintln!("⚠️  Could not load {}, using default config", path.display());
        }
        ConfigSource::Defaults => eprintln!("📋 Using default config"),
    }

    if args.plan {
        match formatter.plan(&config) {
            Ok(order) => {
                for name in order {
                    println!("{name}");
                }
                return Ok(());
            }
            Err(e) => {
                eprintln!("❌ Planning failed: {e}");
                std::process::exit(1);
            }
        }
    }

    let input_path = args.input.as_deref().filter(|p| *p != Path::new("-"));
    if args.in_place && input_path.is_none() {
        bail!("--in-place needs an INPUT file");
    }
    let original = read_input(input_path)?;

    let outcome = match formatter.format(&original, &config) {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!("❌ Formatting failed: {e}");
            std::process::exit(1);
        }
    };

    let formatted = with_final_newline(&outcome.text);

    if args.diff {
        let patch = diffy::create_patch(&original, &formatted);
        print!("{patch}");
    } else if let Some(target) = output_target(&args, input_path) {
        std::fs::write(target, &formatted)
            .with_context(|| format!("Failed to write {}", target.display()))?;
        eprintln!("💾 Saved to: {}", target.display());
    } else {
        io::stdout()
            .write_all(formatted.as_bytes())
            .context("Failed to write to stdout")?;
    }

    report(&outcome, &original, args.report)?;
    Ok(())
}

fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read stdin")?;
            Ok(buffer)
        }
    }
}

fn output_target<'a>(args: &'a Args, input: Option<&'a Path>) -> Option<&'a Path> {
    if args.in_place {
        input
    } else {
        args.output.as_deref()
    }
}

/// Formatted text is trimmed; files and stdout get one trailing newline back.
fn with_final_newline(text: &str) -> String {
    if text.is_empty() {
        String::new()
    } else {
        format!("{text}\n")
    }
}

fn report(outcome: &FormatOutcome, original: &str, format: ReportFormat) -> Result<()> {
    match format {
        ReportFormat::Text => {
            eprintln!("✅ {} substitutions", outcome.substitutions);
            for warning in &outcome.warnings {
                eprintln!("⚠️  {warning}");
            }
        }
        ReportFormat::Json => {
            let summary = serde_json::json!({
                "substitutions": outcome.substitutions,
                "changed": outcome.changed(original.trim()),
                "applied": outcome.applied,
                "warnings": outcome.warnings,
            });
            eprintln!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }
    Ok(())
}
