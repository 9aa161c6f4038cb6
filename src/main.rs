use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use proofmark::{
    apply_fixes_to_transcript, apply_fixes_with_assistant, execute_detection, execute_render,
    export_to_csv, export_to_json, read_issues, read_transcript, sort_for_display,
    validate_line_numbers, write_issues_json, AcceptedSet, AnthropicClient, AnthropicConfig,
    DetectConfig, Issue, IssueCategory, RenderConfig, RenderInput, RenderTargets, Severity,
};

#[derive(Parser)]
#[command(name = "proofmark")]
#[command(author, version, about = "Transcript proofreading with reviewable, mechanically applied fixes", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect issues in a transcript with the language model
    Detect {
        /// Input transcript file (plain text, one line per line)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file for detected issues (JSON)
        #[arg(short, long)]
        output: PathBuf,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Apply accepted issues to a transcript
    Apply {
        /// Input transcript file (plain text)
        #[arg(short, long)]
        input: PathBuf,

        /// Issues file produced by `detect`
        #[arg(long)]
        issues: PathBuf,

        /// Output file for the corrected transcript
        #[arg(short, long)]
        output: PathBuf,

        /// Accept issues by their 1-based position in the issues file
        #[arg(long, num_args = 1.., value_name = "N")]
        accept: Vec<usize>,

        /// Accept every issue
        #[arg(long)]
        accept_all: bool,

        /// With --accept-all, skip issues below this confidence
        #[arg(long, default_value = "0.0")]
        min_confidence: f64,

        /// Output file for the Markdown review document
        #[arg(long)]
        markdown: Option<PathBuf>,

        /// Output file for the issue list (JSON)
        #[arg(long)]
        json: Option<PathBuf>,

        /// Output file for the issue list (CSV)
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Apply each fix with the language model, falling back to heuristics
        #[arg(long)]
        ai: bool,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Re-emit an issues file as JSON or CSV
    Export {
        /// Issues file to export
        #[arg(long)]
        issues: PathBuf,

        /// Export format
        #[arg(long, value_enum, default_value = "json")]
        format: ExportFormat,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Summarize issues by category and severity
    Stats {
        /// Input transcript file the issues were detected against
        #[arg(short, long)]
        input: PathBuf,

        /// Issues file
        #[arg(long)]
        issues: PathBuf,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ExportFormat {
    Json,
    Csv,
}

struct ApplyArgs {
    input: PathBuf,
    issues: PathBuf,
    output: PathBuf,
    accept: Vec<usize>,
    accept_all: bool,
    min_confidence: f64,
    markdown: Option<PathBuf>,
    json: Option<PathBuf>,
    csv: Option<PathBuf>,
    ai: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Detect {
            input,
            output,
            verbose,
        } => {
            setup_logging(verbose);
            detect_issues(input, output).await
        }
        Commands::Apply {
            input,
            issues,
            output,
            accept,
            accept_all,
            min_confidence,
            markdown,
            json,
            csv,
            ai,
            verbose,
        } => {
            setup_logging(verbose);
            apply_issues(ApplyArgs {
                input,
                issues,
                output,
                accept,
                accept_all,
                min_confidence,
                markdown,
                json,
                csv,
                ai,
            })
            .await
        }
        Commands::Export {
            issues,
            format,
            output,
            verbose,
        } => {
            setup_logging(verbose);
            export_issues(issues, format, output)
        }
        Commands::Stats {
            input,
            issues,
            verbose,
        } => {
            setup_logging(verbose);
            show_stats(input, issues)
        }
    }
}

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

async fn detect_issues(input: PathBuf, output: PathBuf) -> Result<()> {
    info!("Loading transcript from {:?}", input);
    let transcript = read_transcript(&input).context("Failed to read input transcript")?;

    let api_config = AnthropicConfig::from_env()?;
    let client = AnthropicClient::new(api_config);

    let result = execute_detection(&client, &transcript, &DetectConfig::default()).await?;

    write_issues_json(&output, &result.issues)?;
    info!(
        "Wrote {} issues for {} lines ({} returned by the model) to {:?}",
        result.issues.len(),
        result.total_lines,
        result.raw_count,
        output
    );

    Ok(())
}

/// Build the accepted set from 1-based positions and the accept-all switch
fn select_accepted(
    issues: &[Issue],
    positions: &[usize],
    accept_all: bool,
    min_confidence: f64,
) -> Result<AcceptedSet> {
    let mut accepted = AcceptedSet::new();

    if accept_all {
        for issue in issues.iter().filter(|i| i.confidence >= min_confidence) {
            accepted.accept(issue);
        }
    }

    for &position in positions {
        let issue = position
            .checked_sub(1)
            .and_then(|i| issues.get(i))
            .with_context(|| {
                format!(
                    "No issue at position {} ({} issues loaded)",
                    position,
                    issues.len()
                )
            })?;
        accepted.accept(issue);
    }

    Ok(accepted)
}

async fn apply_issues(args: ApplyArgs) -> Result<()> {
    info!("Loading transcript from {:?}", args.input);
    let transcript = read_transcript(&args.input).context("Failed to read input transcript")?;
    let issues = read_issues(&args.issues).context("Failed to read issues")?;

    info!(
        "Loaded {} lines and {} issues",
        transcript.line_count(),
        issues.len()
    );

    let accepted = select_accepted(&issues, &args.accept, args.accept_all, args.min_confidence)?;
    if accepted.is_empty() {
        warn!("No issues accepted; the corrected transcript will match the input");
    } else {
        info!("{} issues accepted", accepted.len());
    }

    let corrected = if args.ai {
        let api_config = AnthropicConfig::from_env()?;
        let client = AnthropicClient::new(api_config);
        apply_fixes_with_assistant(&client, &transcript, &issues, &accepted)
            .await
            .transcript
    } else {
        apply_fixes_to_transcript(&transcript, &issues, &accepted)
    };

    let changed = transcript
        .lines()
        .iter()
        .zip(corrected.lines())
        .filter(|(before, after)| before != after)
        .count();

    info!("Stage 3: Rendering output...");
    let input = RenderInput {
        original: &transcript,
        corrected: &corrected,
        issues: &issues,
        accepted: &accepted,
    };
    let targets = RenderTargets {
        corrected: Some(&args.output),
        markdown: args.markdown.as_deref(),
        json: args.json.as_deref(),
        csv: args.csv.as_deref(),
    };
    let result = execute_render(&input, &targets, &RenderConfig::default())?;

    info!("Corrected transcript written to {:?}", result.corrected_path);
    if let Some(path) = result.markdown_path {
        info!("Markdown review written to {:?}", path);
    }
    if let Some(path) = result.json_path {
        info!("Issue JSON written to {:?}", path);
    }
    if let Some(path) = result.csv_path {
        info!("Issue CSV written to {:?}", path);
    }

    info!(
        "Complete: {} of {} lines changed",
        changed,
        transcript.line_count()
    );

    Ok(())
}

fn export_issues(issues: PathBuf, format: ExportFormat, output: Option<PathBuf>) -> Result<()> {
    let issues = read_issues(&issues).context("Failed to read issues")?;

    let content = match format {
        ExportFormat::Json => export_to_json(&issues)?,
        ExportFormat::Csv => export_to_csv(&issues),
    };

    match output {
        Some(path) => {
            proofmark::write_text(&path, &content)?;
            info!("Exported {} issues to {:?}", issues.len(), path);
        }
        None => println!("{}", content),
    }

    Ok(())
}

fn show_stats(input: PathBuf, issues: PathBuf) -> Result<()> {
    let transcript = read_transcript(&input).context("Failed to read input transcript")?;
    let mut issues = read_issues(&issues).context("Failed to read issues")?;

    let total = issues.len();
    let in_range = validate_line_numbers(issues.clone(), transcript.line_count()).len();

    println!("Issue Summary");
    println!("=============");
    println!("Transcript lines: {}", transcript.line_count());
    println!("Total issues: {}", total);
    println!("Out-of-range issues: {}", total - in_range);
    let affected: HashSet<usize> = issues.iter().map(|i| i.line_number).collect();
    println!("Lines with issues: {}", affected.len());
    println!();

    println!("By Category");
    println!("-----------");
    for category in IssueCategory::DETECTABLE {
        let count = issues.iter().filter(|i| i.category == category).count();
        println!("{}: {}", category, count);
    }
    let mut unknown: BTreeMap<&str, usize> = BTreeMap::new();
    for issue in issues.iter().filter(|i| !i.category.is_known()) {
        *unknown.entry(issue.category.as_str()).or_default() += 1;
    }
    for (name, count) in unknown {
        println!("{} (unknown): {}", name, count);
    }
    println!();

    println!("By Severity");
    println!("-----------");
    for severity in [Severity::Blocking, Severity::Review, Severity::Info] {
        let count = issues.iter().filter(|i| i.severity == severity).count();
        println!("{}: {}", severity, count);
    }
    println!();

    sort_for_display(&mut issues);

    println!("Issues");
    println!("------");
    for issue in &issues {
        println!(
            "[{}] line {} {}: {} ({:.0}%)",
            issue.severity,
            issue.line_number,
            issue.category,
            issue.description,
            issue.confidence * 100.0
        );
        println!("    fix: {}", issue.suggested_fix);
    }

    Ok(())
}
