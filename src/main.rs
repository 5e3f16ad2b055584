//! snapsort - batch rename and reorder media files, safely.
//!
//! Usage:
//!   snapsort list [DIR]           List media files in display order
//!   snapsort reorder [DIR] -p X   Rename files to X1, X2, ... in order
//!   snapsort delete PATH          Delete a file, retrying brief locks
//!   snapsort --help               Show help

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Result, eyre};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use snapsort_core::{MediaEntry, NamingScheme, SortMode};
use snapsort_ops::{
    ConflictRequest, EngineError, FixedResolver, RenamePhase, ReorderReport, Verdict,
    conflict_channel, delete_file, reorder,
};
use snapsort_preview::PreviewScheduler;
use snapsort_scan::{ListOptions, file_size, list_folder};

#[derive(Parser)]
#[command(
    name = "snapsort",
    version,
    about = "Batch rename and reorder media files",
    long_about = "snapsort renames a folder of media files to a clean numbered\n\
                  sequence, in the order you choose, without ever colliding\n\
                  with its own targets - even while a viewer holds one of the\n\
                  files open."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List media files in display order
    List {
        /// Folder to list
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Listing order
        #[arg(short, long, default_value = "name")]
        sort: SortArg,

        /// Include video files as well as images
        #[arg(long)]
        videos: bool,

        /// Fetch and show file sizes
        #[arg(long)]
        sizes: bool,
    },

    /// Rename all media files in a folder to a numbered sequence
    Reorder {
        /// Folder whose files are renamed
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Base name applied to every file
        #[arg(short, long)]
        prefix: String,

        /// Number given to the first file
        #[arg(long, default_value = "1")]
        start: u64,

        /// Order the files are numbered in
        #[arg(short, long, default_value = "name")]
        sort: SortArg,

        /// Include video files as well as images
        #[arg(long)]
        videos: bool,

        /// What to do when a file is held open by another program
        #[arg(long, default_value = "ask")]
        on_conflict: ConflictArg,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Delete a file, retrying briefly if it is locked
    Delete {
        /// File to delete
        path: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum SortArg {
    #[default]
    Name,
    Created,
}

impl From<SortArg> for SortMode {
    fn from(sort: SortArg) -> Self {
        match sort {
            SortArg::Name => SortMode::Name,
            SortArg::Created => SortMode::Created,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum ConflictArg {
    /// Ask on stdin for each conflict
    #[default]
    Ask,
    Retry,
    Skip,
    Cancel,
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    match cli.command {
        Command::List {
            path,
            sort,
            videos,
            sizes,
        } => run_list(path, sort.into(), videos, sizes).await,
        Command::Reorder {
            path,
            prefix,
            start,
            sort,
            videos,
            on_conflict,
            format,
        } => run_reorder(path, prefix, start, sort.into(), videos, on_conflict, format).await,
        Command::Delete { path } => {
            delete_file(&path).await?;
            eprintln!("Deleted {}", path.display());
            Ok(())
        }
    }
}

/// List a folder and print its entries in display order.
async fn run_list(path: PathBuf, sort: SortMode, videos: bool, sizes: bool) -> Result<()> {
    let options = ListOptions::builder()
        .root(path)
        .sort(sort)
        .include_videos(videos)
        .build()?;
    let entries = list_folder(&options)?;

    if entries.is_empty() {
        println!("No media files found.");
        return Ok(());
    }

    let byte_sizes = if sizes {
        fetch_sizes(&entries).await
    } else {
        Vec::new()
    };

    for (i, entry) in entries.iter().enumerate() {
        let when: chrono::DateTime<chrono::Local> = entry.sort_timestamp().into();
        match byte_sizes.get(i).copied().flatten() {
            Some(bytes) => println!(
                "{:>4}. {:<40} {:>10}  {}",
                i + 1,
                entry.basename(),
                format_size(bytes),
                when.format("%Y-%m-%d %H:%M")
            ),
            None => println!(
                "{:>4}. {:<40}  {}",
                i + 1,
                entry.basename(),
                when.format("%Y-%m-%d %H:%M")
            ),
        }
    }

    Ok(())
}

/// Fetch file sizes through the preview scheduler, the same throttled
/// path a grid front end uses for thumbnail work.
async fn fetch_sizes(entries: &[MediaEntry]) -> Vec<Option<u64>> {
    let scheduler = PreviewScheduler::new();

    let submissions: Vec<_> = entries
        .iter()
        .map(|entry| {
            let path = entry.path.clone();
            scheduler.submit(async move {
                tokio::task::spawn_blocking(move || file_size(&path))
                    .await
                    .unwrap_or(None)
            })
        })
        .collect();

    let mut sizes = Vec::with_capacity(submissions.len());
    for submission in submissions {
        sizes.push(submission.await.flatten());
    }
    sizes
}

/// List a folder, then rename everything in the listed order.
async fn run_reorder(
    path: PathBuf,
    prefix: String,
    start: u64,
    sort: SortMode,
    videos: bool,
    on_conflict: ConflictArg,
    format: OutputFormat,
) -> Result<()> {
    let options = ListOptions::builder()
        .root(path.clone())
        .sort(sort)
        .include_videos(videos)
        .build()?;
    let entries = list_folder(&options)?;
    if entries.is_empty() {
        return Err(eyre!("No media files found in {}", path.display()));
    }

    let paths: Vec<PathBuf> = entries.iter().map(|entry| entry.path.clone()).collect();
    let scheme = NamingScheme::builder()
        .prefix(prefix)
        .start_number(start)
        .build()?;

    let result = match on_conflict {
        ConflictArg::Ask => reorder_interactive(paths, scheme).await?,
        ConflictArg::Retry => reorder(&paths, &scheme, &FixedResolver(Verdict::Retry)).await,
        ConflictArg::Skip => reorder(&paths, &scheme, &FixedResolver(Verdict::Skip)).await,
        ConflictArg::Cancel => reorder(&paths, &scheme, &FixedResolver(Verdict::Cancel)).await,
    };

    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&ReorderReport::from_result(&result))?
            );
        }
        OutputFormat::Text => match &result {
            Ok(new_paths) => println!("Renamed {} files", new_paths.len()),
            Err(error) if error.is_cancelled() => println!("{error}; earlier renames were kept"),
            Err(error) => return Err(eyre!("{error}")),
        },
    }

    Ok(())
}

/// Run the engine in a background task and answer its conflict
/// requests from stdin until it finishes.
async fn reorder_interactive(
    paths: Vec<PathBuf>,
    scheme: NamingScheme,
) -> Result<Result<Vec<PathBuf>, EngineError>> {
    let (resolver, mut requests) = conflict_channel(1);
    let engine = tokio::spawn(async move { reorder(&paths, &scheme, &resolver).await });

    // The receiver drains until the engine task drops its resolver.
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(request) = requests.recv().await {
        let verdict = prompt_verdict(&request, &mut lines).await?;
        request.respond(verdict);
    }

    engine.await.map_err(|e| eyre!("Engine task failed: {e}"))
}

/// Ask the user what to do about one locked file.
async fn prompt_verdict(
    request: &ConflictRequest,
    lines: &mut Lines<BufReader<Stdin>>,
) -> Result<Verdict> {
    let step = match request.event.phase {
        RenamePhase::Stage => "staging",
        RenamePhase::Commit => "renaming",
    };

    loop {
        eprintln!(
            "'{}' is in use by another program (while {step}).",
            request.event.basename
        );
        eprint!("  [r]etry, [s]kip, or [c]ancel? ");

        let Some(line) = lines.next_line().await? else {
            // stdin closed: treat like a cancel.
            return Ok(Verdict::Cancel);
        };
        match line.trim().to_lowercase().as_str() {
            "r" | "retry" => return Ok(Verdict::Retry),
            "s" | "skip" => return Ok(Verdict::Skip),
            "c" | "cancel" => return Ok(Verdict::Cancel),
            _ => eprintln!("  Please answer r, s, or c."),
        }
    }
}

/// Format size in human-readable form.
fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}
