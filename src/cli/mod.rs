//! # CLI Module
//!
//! Command-line interface for the picture sorter.
//!
//! ## Usage
//! ```bash
//! # Orientation and GPS of some photos
//! picture-sorter info ~/Photos/IMG_0001.jpg ~/Photos/IMG_0002.jpg
//!
//! # List a folder with metadata, newest first
//! picture-sorter scan ~/Photos --sort date --descending
//!
//! # Interactive sorting session with undo/redo
//! picture-sorter session --target ~/Sorted
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use picture_sorter::core::history::{CommandHistory, HistoryConfig, DEFAULT_MAX_DEPTH};
use picture_sorter::core::metadata::{read_metadata, ImageMetadata};
use picture_sorter::core::operations::{
    BatchOperation, DeleteOperation, FileOperation, OperationReport, RotateOperation,
};
use picture_sorter::core::scanner::{
    CancellationToken, ImageItem, ImageLoader, LoadConfig, LoadResult, SortOrder,
};
use picture_sorter::error::{HistoryError, Result, SorterError};
use picture_sorter::events::{Event, EventChannel, HistoryEvent, LoadEvent};
use std::collections::HashSet;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::thread;

/// Picture Sorter - sort photos into folders with full undo
#[derive(Parser, Debug)]
#[command(name = "picture-sorter")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show orientation and GPS position of image files
    Info {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,
    },

    /// List the images in a folder with their metadata
    Scan {
        folder: PathBuf,

        /// Sort order: name, date or size
        #[arg(short, long, default_value = "name")]
        sort: SortOrder,

        /// Reverse the sort order
        #[arg(long)]
        descending: bool,

        /// Include hidden files
        #[arg(long)]
        include_hidden: bool,

        /// Folder depth to descend (1 = only the folder itself)
        #[arg(long, default_value = "1")]
        depth: usize,

        /// Output format
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,
    },

    /// Read sorting commands from stdin, with undo/redo
    Session {
        /// Folder that copy/move send files to
        #[arg(short, long)]
        target: PathBuf,

        /// Number of operations kept for undo
        #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
        max_depth: usize,

        /// Print every history notification
        #[arg(short, long)]
        verbose: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable output with colors
    Pretty,
    /// JSON output for scripting
    Json,
    /// Minimal output (paths only)
    Minimal,
}

/// Run the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Info { files, output } => run_info(&files, output),
        Commands::Scan {
            folder,
            sort,
            descending,
            include_hidden,
            depth,
            output,
        } => {
            let config = LoadConfig {
                include_hidden,
                max_depth: depth,
                extensions: None,
                sort,
                descending,
            };
            run_scan(&folder, config, output)
        }
        Commands::Session {
            target,
            max_depth,
            verbose,
        } => run_session(target, max_depth, verbose),
    }
}

fn run_info(files: &[PathBuf], output: OutputFormat) -> Result<()> {
    let entries: Vec<(&PathBuf, ImageMetadata)> =
        files.iter().map(|f| (f, read_metadata(f))).collect();

    match output {
        OutputFormat::Json => {
            let json: Vec<_> = entries
                .iter()
                .map(|(path, meta)| {
                    serde_json::json!({
                        "path": path,
                        "rotation_degrees": meta.orientation.degrees(),
                        "gps": meta.gps,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Minimal => {
            for (path, meta) in &entries {
                println!("{}\t{}", path.display(), meta.orientation.degrees());
            }
        }
        OutputFormat::Pretty => {
            let term = Term::stdout();
            for (path, meta) in &entries {
                let gps = meta
                    .gps
                    .map(|g| g.to_string())
                    .unwrap_or_else(|| "none".to_string());
                term.write_line(&format!(
                    "{}  rotate {}°  gps {}",
                    style(path.display()).bold(),
                    style(meta.orientation.degrees()).cyan(),
                    style(gps).dim()
                ))
                .ok();
            }
        }
    }
    Ok(())
}

fn run_scan(folder: &Path, config: LoadConfig, output: OutputFormat) -> Result<()> {
    let term = Term::stderr();
    let loader = ImageLoader::new(config);
    let (sender, receiver) = EventChannel::new();

    let progress = if matches!(output, OutputFormat::Pretty) {
        let pb = ProgressBar::new_spinner();
        if let Ok(spinner) = ProgressStyle::default_spinner().template("{spinner:.green} {pos}/{len} {msg}") {
            pb.set_style(spinner);
        }
        Some(pb)
    } else {
        None
    };

    let progress_clone = progress.clone();
    let event_thread = thread::spawn(move || {
        for event in receiver.iter() {
            let Some(pb) = progress_clone.as_ref() else {
                continue;
            };
            match event {
                Event::Load(LoadEvent::Progress(p)) => {
                    pb.set_length(p.total as u64);
                    pb.set_position(p.loaded as u64);
                    pb.set_message(
                        p.current_path
                            .file_name()
                            .unwrap_or_default()
                            .to_string_lossy()
                            .into_owned(),
                    );
                }
                Event::Load(LoadEvent::Completed { .. } | LoadEvent::Cancelled { .. }) => {
                    pb.finish_and_clear();
                }
                _ => {}
            }
        }
    });

    let result = loader.load(folder, &HashSet::new(), &CancellationToken::new(), &sender);

    drop(sender);
    event_thread.join().ok();
    if let Some(pb) = progress {
        pb.finish_and_clear();
    }
    let result = result?;

    match output {
        OutputFormat::Pretty => print_pretty_scan(&term, folder, &result),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result.items)?),
        OutputFormat::Minimal => {
            for item in &result.items {
                println!("{}", item.path.display());
            }
        }
    }
    Ok(())
}

fn print_pretty_scan(term: &Term, folder: &Path, result: &LoadResult) {
    term.write_line(&format!(
        "{} {} image(s) in {}",
        style("✓").green().bold(),
        style(result.items.len()).cyan(),
        folder.display()
    ))
    .ok();
    term.write_line("").ok();

    for item in &result.items {
        term.write_line(&format_item(item)).ok();
    }

    if !result.errors.is_empty() {
        term.write_line("").ok();
        for error in &result.errors {
            term.write_line(&format!("  {} {}", style("!").yellow(), error)).ok();
        }
    }
}

fn format_item(item: &ImageItem) -> String {
    let mut line = format!(
        "  {:<40} {:>10}",
        item.file_name,
        style(format_bytes(item.size)).dim()
    );
    if item.orientation.degrees() != 0 {
        line.push_str(&format!("  rotate {}°", item.orientation.degrees()));
    }
    if let Some(gps) = item.gps {
        line.push_str(&format!("  gps {}", gps));
    }
    line
}

/// One line of session input
#[derive(Debug, PartialEq, Eq)]
enum SessionCommand {
    Copy(Vec<PathBuf>),
    Move(Vec<PathBuf>),
    Delete(PathBuf),
    Rotate(PathBuf, i32),
    Undo,
    Redo,
    Status,
    Clear,
    Quit,
}

impl SessionCommand {
    fn parse(line: &str) -> std::result::Result<Self, String> {
        let mut words = line.split_whitespace();
        let verb = words.next().ok_or_else(|| "empty command".to_string())?;
        let args: Vec<&str> = words.collect();

        let paths = |args: &[&str]| -> std::result::Result<Vec<PathBuf>, String> {
            if args.is_empty() {
                Err(format!("'{}' needs at least one file", verb))
            } else {
                Ok(args.iter().map(PathBuf::from).collect())
            }
        };

        match (verb.to_lowercase().as_str(), args.as_slice()) {
            ("copy", rest) => Ok(SessionCommand::Copy(paths(rest)?)),
            ("move", rest) => Ok(SessionCommand::Move(paths(rest)?)),
            ("delete", [file]) => Ok(SessionCommand::Delete(PathBuf::from(file))),
            ("rotate", [file, degrees]) => degrees
                .parse()
                .map(|d| SessionCommand::Rotate(PathBuf::from(file), d))
                .map_err(|_| format!("'{}' is not a number of degrees", degrees)),
            ("undo", []) => Ok(SessionCommand::Undo),
            ("redo", []) => Ok(SessionCommand::Redo),
            ("status", []) => Ok(SessionCommand::Status),
            ("clear", []) => Ok(SessionCommand::Clear),
            ("quit" | "exit", []) => Ok(SessionCommand::Quit),
            ("delete", _) => Err("usage: delete <file>".to_string()),
            ("rotate", _) => Err("usage: rotate <file> <degrees>".to_string()),
            (other, _) => Err(format!("unknown command '{}'", other)),
        }
    }
}

/// The session target may be missing (it is created on first use) but not a file.
fn check_target(target: &Path) -> Result<()> {
    if target.exists() && !target.is_dir() {
        return Err(SorterError::Config(format!(
            "target {} is not a folder",
            target.display()
        )));
    }
    Ok(())
}

fn run_session(target: PathBuf, max_depth: usize, verbose: bool) -> Result<()> {
    check_target(&target)?;
    let term = Term::stderr();
    let (sender, receiver) = EventChannel::new();
    let mut history = CommandHistory::builder()
        .config(HistoryConfig { max_depth })
        .events(sender)
        .build();
    let mut processed: HashSet<PathBuf> = HashSet::new();

    let event_thread = thread::spawn(move || {
        let term = Term::stderr();
        for event in receiver.iter() {
            match event {
                Event::History(HistoryEvent::StateChanged(snapshot)) if verbose => {
                    term.write_line(&format!(
                        "  {} undo: {} / redo: {}",
                        style("·").dim(),
                        snapshot.undo_description.as_deref().unwrap_or("-"),
                        snapshot.redo_description.as_deref().unwrap_or("-")
                    ))
                    .ok();
                }
                Event::History(HistoryEvent::Failed { action, message, .. }) => {
                    term.write_line(&format!("  {} {} failed: {}", style("✗").red(), action, message))
                        .ok();
                }
                _ => {}
            }
        }
    });

    term.write_line(&format!(
        "{} {}",
        style("Picture Sorter session").bold().cyan(),
        style(format!("target: {}", target.display())).dim()
    ))
    .ok();

    for line in std::io::stdin().lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let command = match SessionCommand::parse(&line) {
            Ok(command) => command,
            Err(message) => {
                term.write_line(&format!("  {} {}", style("?").yellow(), message)).ok();
                continue;
            }
        };

        let outcome = match command {
            SessionCommand::Quit => break,
            SessionCommand::Status => {
                print_status(&term, &history, &processed);
                continue;
            }
            SessionCommand::Clear => {
                history.clear();
                term.write_line("  history cleared").ok();
                continue;
            }
            SessionCommand::Undo => history.undo().map(|r| (r, false)),
            SessionCommand::Redo => history.redo().map(|r| (r, true)),
            SessionCommand::Copy(files) => execute(&mut history, Box::new(BatchOperation::copy_all(files, &target))),
            SessionCommand::Move(files) => execute(&mut history, Box::new(BatchOperation::move_all(files, &target))),
            SessionCommand::Delete(file) => execute(&mut history, Box::new(DeleteOperation::new(file))),
            SessionCommand::Rotate(file, degrees) => match RotateOperation::new(file, degrees) {
                Ok(op) => execute(&mut history, Box::new(op)),
                Err(e) => {
                    term.write_line(&format!("  {} {}", style("✗").red(), e)).ok();
                    continue;
                }
            },
        };

        match outcome {
            Ok((report, applied)) => {
                track_processed(&mut processed, &report, applied);
                print_report(&term, &report, applied);
            }
            Err(HistoryError::NothingToUndo | HistoryError::NothingToRedo) => {
                term.write_line(&format!("  {}", style("nothing to do").dim())).ok();
            }
            // Failures are printed by the event thread
            Err(_) => {}
        }
    }

    drop(history);
    event_thread.join().ok();
    Ok(())
}

fn execute(
    history: &mut CommandHistory,
    op: Box<dyn FileOperation>,
) -> std::result::Result<(OperationReport, bool), HistoryError> {
    history.execute(op).map(|r| (r, true))
}

/// Applied operations mark their files processed; undone ones release them
fn track_processed(processed: &mut HashSet<PathBuf>, report: &OperationReport, applied: bool) {
    for path in &report.affected_paths {
        if applied {
            processed.insert(path.clone());
        } else {
            processed.remove(path);
        }
    }
}

fn print_report(term: &Term, report: &OperationReport, applied: bool) {
    let verb = if applied { "done" } else { "undone" };
    let mut line = format!("  {} {} ({})", style("✓").green(), report.description, verb);
    if let Some(summary) = report.summary {
        line.push_str(&format!(
            ": {} succeeded, {} skipped, {} failed",
            style(summary.succeeded).cyan(),
            style(summary.skipped).yellow(),
            style(summary.errored).red()
        ));
    }
    term.write_line(&line).ok();
}

fn print_status(term: &Term, history: &CommandHistory, processed: &HashSet<PathBuf>) {
    let snapshot = history.snapshot();
    term.write_line(&format!(
        "  undo {} ({}), redo {} ({})",
        snapshot.undo_depth,
        snapshot.undo_description.as_deref().unwrap_or("-"),
        snapshot.redo_depth,
        snapshot.redo_description.as_deref().unwrap_or("-")
    ))
    .ok();

    let mut paths: Vec<_> = processed.iter().collect();
    paths.sort();
    term.write_line(&format!("  {} processed file(s)", style(paths.len()).cyan()))
        .ok();
    for path in paths {
        term.write_line(&format!("    {}", style(path.display()).dim())).ok();
    }
}

fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}
