use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use similar::{ChangeTag, TextDiff};
use tsx_patcher::{PatchEngine, RuleOutcome, SystemClock, TargetFile};

#[derive(Parser)]
#[command(name = "tsx-patcher")]
#[command(about = "Targeted patcher for the contract page's searchParams handling", long_about = None)]
#[command(version)]
struct Cli {
    /// Project root the target path is resolved against (default: current directory)
    #[arg(short, long)]
    root: Option<PathBuf>,

    /// Target file, relative to the project root
    #[arg(short, long, default_value = "src/app/contract/page.tsx")]
    target: PathBuf,

    /// Dry run - report what would change without taking a backup or writing
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Show unified diff of changes
    #[arg(short, long)]
    diff: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let root = match cli.root {
        Some(path) => path.canonicalize().context("cannot resolve --root")?,
        None => env::current_dir()?,
    };

    let target = TargetFile::resolve(&root, &cli.target)
        .map_err(|e| anyhow::anyhow!("{}", e.to_string().red()))?;
    let original = target.read()?;

    // Backup before anything is decided, so the pre-patch content survives
    // even an interrupted run. Skipped in dry-run since nothing is written.
    let backup_path = if cli.dry_run {
        println!("{}", "[DRY RUN - no backup, no write]".cyan());
        None
    } else {
        Some(target.backup(&original, &SystemClock)?)
    };

    let outcome = PatchEngine::new()
        .run(original.clone())
        .map_err(|e| anyhow::anyhow!("{}", e.to_string().red()))?;

    for report in &outcome.reports {
        match report.outcome {
            RuleOutcome::Applied { via_fallback: false } => {
                println!("{} {}: applied", "✓".green(), report.rule);
            }
            RuleOutcome::Applied { via_fallback: true } => {
                println!("{} {}: applied (fallback anchor)", "✓".green(), report.rule);
            }
            RuleOutcome::AlreadyApplied => {
                println!("{} {}: already applied", "⊙".yellow(), report.rule);
            }
            RuleOutcome::Skipped => {
                println!("{} {}: skipped (pattern not found)", "⊘".cyan(), report.rule);
            }
        }
    }
    println!();

    if cli.diff && outcome.changed {
        display_diff(&target, &original, &outcome.text);
        println!();
    }

    if !outcome.changed {
        println!(
            "{}",
            format!("No changes needed: {}", target.path().display()).yellow()
        );
        return Ok(());
    }

    if cli.dry_run {
        println!(
            "{}",
            format!("Would patch: {}", target.path().display()).green()
        );
        return Ok(());
    }

    target.write(&outcome.text)?;
    println!(
        "{}",
        format!("Patched: {}", target.path().display()).green()
    );
    if let Some(backup) = backup_path {
        println!("Backup: {}", backup.display());
    }

    Ok(())
}

/// Show a unified diff between original and patched content.
fn display_diff(target: &TargetFile, original: &str, patched: &str) {
    println!(
        "{}",
        format!("--- {} (original)", target.path().display()).dimmed()
    );
    println!(
        "{}",
        format!("+++ {} (patched)", target.path().display()).dimmed()
    );

    let diff = TextDiff::from_lines(original, patched);

    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => format!("-{}", change).red(),
            ChangeTag::Insert => format!("+{}", change).green(),
            ChangeTag::Equal => format!(" {}", change).normal(),
        };
        print!("{}", sign);
    }
}
