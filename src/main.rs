use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use ctxsnap::config::load_settings;
use ctxsnap::edit::{atomic_write, FileEdit};
use ctxsnap::{
    apply_patch, decode_response, plan_patch, scan, ApplyError, ApplyReport, LocalBackup,
    NoVersioning, PatchSet, Versioning,
};
use similar::{ChangeTag, TextDiff};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ctxsnap")]
#[command(about = "Snapshot a workspace for an LLM and apply its edits back", long_about = None)]
#[command(version)]
struct Cli {
    /// Log per-file decisions to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Capture the workspace tree and file contents as JSON
    Scan {
        /// Workspace root
        #[arg(short, long, default_value = ".")]
        root: PathBuf,

        /// Short description embedded in the snapshot
        #[arg(short, long)]
        description: Option<String>,

        /// Only read these relative paths (the tree stays complete)
        #[arg(long = "only", value_name = "PATH", num_args = 1..)]
        only: Vec<String>,

        /// Also read files from packages the selected sources import
        #[arg(long)]
        smart: bool,

        /// Token budget for file contents (0 = unlimited)
        #[arg(short, long)]
        token_limit: Option<usize>,

        /// Write the snapshot here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Apply an LLM response (JSON or native dialect) to the workspace
    Apply {
        /// Workspace root
        #[arg(short, long, default_value = ".")]
        root: PathBuf,

        /// Read the response from a file instead of stdin
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Show what would change without writing
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Show unified diff of changes
        #[arg(long)]
        diff: bool,

        /// Do not save a local backup before writing
        #[arg(long)]
        no_backup: bool,
    },

    /// Restore files saved before an earlier apply
    Restore {
        /// Backup id printed by `apply`
        id: String,

        /// Workspace root
        #[arg(short, long, default_value = ".")]
        root: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Scan {
            root,
            description,
            only,
            smart,
            token_limit,
            output,
        } => cmd_scan(&root, description, only, smart, token_limit, output),

        Commands::Apply {
            root,
            input,
            dry_run,
            diff,
            no_backup,
        } => cmd_apply(&root, input, dry_run, diff, no_backup),

        Commands::Restore { id, root } => cmd_restore(&root, &id),
    }
}

/// Logs go to stderr so stdout stays machine-readable.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("ctxsnap=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn cmd_scan(
    root: &Path,
    description: Option<String>,
    only: Vec<String>,
    smart: bool,
    token_limit: Option<usize>,
    output: Option<PathBuf>,
) -> Result<()> {
    let settings = load_settings(root)?;

    let mut options = settings.scan_options();
    options.description = description;
    options.whitelist = only;
    options.smart |= smart;
    if let Some(limit) = token_limit {
        options.token_limit = (limit > 0).then_some(limit);
    }

    let snapshot = scan(root, &options)
        .with_context(|| format!("failed to scan {}", root.display()))?;
    let json = snapshot.to_json()?;

    match output {
        Some(path) => {
            atomic_write(&path, json.as_bytes())
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("{}", format!("Snapshot written to {}", path.display()).dimmed());
        }
        None => println!("{json}"),
    }

    eprintln!(
        "{} {} files, {} directories, ~{} tokens",
        "Scanned".green().bold(),
        snapshot.file_count,
        snapshot.dir_count,
        snapshot.token_count
    );
    Ok(())
}

fn read_response(input: Option<PathBuf>) -> Result<String> {
    match input {
        Some(path) => fs::read_to_string(&path)
            .with_context(|| format!("failed to read response from {}", path.display())),
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read response from stdin")?;
            Ok(buf)
        }
    }
}

/// Helper: Show unified diff between original and modified content
fn display_diff(file: &str, original: &str, modified: &str) {
    println!("\n{}", format!("--- {file} (original)").dimmed());
    println!("{}", format!("+++ {file} (patched)").dimmed());

    let diff = TextDiff::from_lines(original, modified);

    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => format!("-{}", change).red(),
            ChangeTag::Insert => format!("+{}", change).green(),
            ChangeTag::Equal => format!(" {}", change).normal(),
        };
        print!("{}", sign);
    }
}

fn show_edit_diff(path: &str, edit: &FileEdit) {
    if edit.is_noop() {
        return;
    }
    display_diff(
        path,
        edit.before().unwrap_or_default(),
        edit.after().unwrap_or_default(),
    );
}

fn cmd_apply(
    root: &Path,
    input: Option<PathBuf>,
    dry_run: bool,
    show_diff: bool,
    no_backup: bool,
) -> Result<()> {
    let settings = load_settings(root)?;
    let response = read_response(input)?;

    let Some(patch) = decode_response(&response) else {
        anyhow::bail!("no file changes found in the response");
    };

    println!("Workspace: {}", root.display());
    if let Some(description) = &patch.description {
        println!("Patch: {}", description);
    }
    println!();

    if dry_run || show_diff {
        let failed = preview(root, &patch, dry_run, show_diff)?;
        if dry_run {
            println!();
            println!("{}", "Summary:".bold());
            println!("  {} files planned", format!("{}", patch.len()).green());
            println!("  {} failed", format!("{}", failed).red());
            if failed > 0 {
                std::process::exit(1);
            }
            return Ok(());
        }
    }

    let mut versioning: Box<dyn Versioning> = if settings.backups && !no_backup {
        Box::new(LocalBackup::new())
    } else {
        Box::new(NoVersioning)
    };

    match apply_patch(root, &patch, versioning.as_mut()) {
        Ok(report) => {
            print_report(&report);
            print_summary(&report, 0);
            Ok(())
        }
        Err(partial) => {
            print_report(&partial.report);
            report_failure(&partial.error);
            print_summary(&partial.report, 1);
            if !partial.report.backup_id.is_empty() {
                eprintln!(
                    "  Restore with: ctxsnap restore {} --root {}",
                    partial.report.backup_id,
                    root.display()
                );
            }
            std::process::exit(1);
        }
    }
}

/// Plan every file and print what would happen. Returns the failure count.
fn preview(root: &Path, patch: &PatchSet, dry_run: bool, show_diff: bool) -> Result<usize> {
    if dry_run {
        println!("{}", "[DRY RUN - showing what would be applied]".cyan());
    }

    let mut failed = 0;
    for (path, plan) in plan_patch(root, patch)? {
        match plan {
            Ok(Some(edit)) => {
                if dry_run {
                    let verb = match &edit {
                        _ if edit.is_noop() => "Unchanged".yellow(),
                        FileEdit::Write { before: None, .. } => "Would create".green(),
                        FileEdit::Write { .. } => "Would update".green(),
                        FileEdit::Delete { .. } => "Would delete".red(),
                    };
                    println!("{} {}: {}", "✓".green(), path, verb);
                }
                if show_diff {
                    show_edit_diff(&path, &edit);
                }
            }
            Ok(None) => {
                if dry_run {
                    println!("{} {}: Skipped (outside workspace or ignored)", "⊘".cyan(), path);
                }
            }
            Err(e) => {
                if dry_run {
                    report_failure(&e);
                }
                failed += 1;
            }
        }
    }
    Ok(failed)
}

fn print_report(report: &ApplyReport) {
    if !report.backup_id.is_empty() {
        println!("{}", format!("Backup: {}", report.backup_id).dimmed());
    }
    for path in &report.written {
        println!("{} {}: Written", "✓".green(), path);
    }
    for path in &report.deleted {
        println!("{} {}: Deleted", "✓".green(), path);
    }
    for path in &report.unchanged {
        println!("{} {}: Unchanged", "⊙".yellow(), path);
    }
    for path in &report.skipped {
        println!("{} {}: Skipped (outside workspace or ignored)", "⊘".cyan(), path);
    }
}

fn report_failure(error: &ApplyError) {
    match error.path() {
        Some(path) => eprintln!("{} {}: Failed - {}", "✗".red(), path, error),
        None => eprintln!("{} Failed - {}", "✗".red(), error),
    }

    if let ApplyError::Hunk { .. } = error {
        eprintln!("  {}", "CONFLICT: search block not found in file".red());
        eprintln!("  Possible causes:");
        eprintln!("    - The file changed since the snapshot was taken");
        eprintln!("    - A previous hunk already rewrote this region");
    }
}

fn print_summary(report: &ApplyReport, failed: usize) {
    println!();
    println!("{}", "Summary:".bold());
    println!("  {} written", format!("{}", report.written.len()).green());
    println!("  {} deleted", format!("{}", report.deleted.len()).green());
    println!("  {} unchanged", format!("{}", report.unchanged.len()).yellow());
    println!("  {} skipped", format!("{}", report.skipped.len()).cyan());
    println!("  {} failed", format!("{}", failed).red());
}

fn cmd_restore(root: &Path, id: &str) -> Result<()> {
    match LocalBackup::restore(root, id) {
        Ok(restored) => {
            for path in &restored {
                println!("{} {}: Restored", "✓".green(), path);
            }
            println!();
            println!("{} {} files restored from {}", "Summary:".bold(), restored.len(), id);
            Ok(())
        }
        Err(ApplyError::UnknownBackup(id)) => {
            let known = LocalBackup::list(root);
            if known.is_empty() {
                anyhow::bail!("backup {id} not found; no backups exist in {}", root.display());
            }
            anyhow::bail!("backup {id} not found; known backups:\n  {}", known.join("\n  "))
        }
        Err(e) => Err(e.into()),
    }
}
