use clap::{CommandFactory, Parser, Subcommand};
use delta_merge::{AutoResolveMode, DeltaMergeError, MergeConfig, MergeData, Merger, format};
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "delta-merge", version)]
#[command(about = "Line-delta diff and 3-way merge with automatic conflict resolution")]
struct Cli {
    /// Log what the engine does
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the deltas between two files
    Diff {
        old: PathBuf,
        new: PathBuf,
        /// Take the line edits from a `git diff -U0` patch
        #[arg(long)]
        patch: Option<PathBuf>,
    },
    /// Merge two versions of a file that share BASE
    Merge {
        base: PathBuf,
        yours: PathBuf,
        theirs: PathBuf,
        /// Write the result here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = AutoResolveMode::Always)]
        auto_resolve: AutoResolveMode,
        /// Huge files are only auto-resolved up to this many changed lines
        #[arg(long, default_value_t = 50)]
        max_changed_lines: usize,
        /// Name shown in reports, defaults to the BASE path
        #[arg(long)]
        path: Option<String>,
    },
    /// Print shell completions
    Completions { shell: clap_complete::Shell },
    /// Print the man page
    Man,
}

fn read(path: &Path) -> Result<String, DeltaMergeError> {
    fs::read_to_string(path).map_err(|e| DeltaMergeError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

fn write(path: &Path, text: &str) -> Result<(), DeltaMergeError> {
    fs::write(path, text).map_err(|e| DeltaMergeError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

fn stdout_error(e: io::Error) -> DeltaMergeError {
    DeltaMergeError::Io {
        path: "stdout".to_string(),
        message: e.to_string(),
    }
}

/// Ask on the terminal whether to auto-resolve `data`
fn confirm(data: &MergeData) -> bool {
    eprint!(
        "{} has {} conflicting deltas. Auto-resolve the rest? [y/N] ",
        data.file_path().unwrap_or("file"),
        data.conflicting_count()
    );
    let mut answer = String::new();
    let asked = io::stderr()
        .flush()
        .and_then(|()| io::stdin().lock().read_line(&mut answer));
    asked.is_ok() && matches!(answer.trim(), "y" | "Y" | "yes")
}

fn run(cli: Cli) -> Result<(), DeltaMergeError> {
    match cli.command {
        Commands::Diff { old, new, patch } => {
            let merger = Merger::default();
            let (old_text, new_text) = (read(&old)?, read(&new)?);
            let diff = match patch {
                Some(patch) => merger.diff_with_patch(&old_text, &new_text, &read(&patch)?)?,
                None => merger.diff(&new.display().to_string(), &old_text, &new_text),
            };
            print!("{}", format::format_deltas(&diff));
        }
        Commands::Merge {
            base,
            yours,
            theirs,
            output,
            auto_resolve,
            max_changed_lines,
            path,
        } => {
            let merger = Merger::new(MergeConfig {
                auto_resolve,
                max_changed_lines,
                ..MergeConfig::default()
            });
            let path = path.unwrap_or_else(|| base.display().to_string());
            let outcome = merger.merge(&path, &read(&base)?, &read(&yours)?, &read(&theirs)?, confirm)?;

            match output {
                Some(output) => write(&output, &outcome.text)?,
                None => print!("{}", outcome.text),
            }
            if !outcome.resolved {
                eprint!("{}", outcome.conflicts);
                return Err(DeltaMergeError::UnresolvedConflicts {
                    path,
                    count: outcome.data.conflicting_count(),
                });
            }
        }
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "delta-merge", &mut io::stdout());
        }
        Commands::Man => {
            clap_mangen::Man::new(Cli::command())
                .render(&mut io::stdout())
                .map_err(stdout_error)?;
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(if cli.verbose { "debug" } else { "warn" }))
        .with_target(false)
        .without_time()
        .with_writer(io::stderr)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
