//! Uploader CLI - push files into Study Tracker storage folders
//!
//! # Commands
//!
//! ```bash
//! uploader push a.csv b.csv --folder-id 12 --path /studies/CPA-10001   # Upload files
//! uploader check a.csv b.csv                                          # Dry run: what would be queued
//! uploader serve                                                      # Host an upload session (port 3000)
//! ```
//!
//! Settings come from the environment (or `.env`): `STUDY_TRACKER_URL`,
//! `STUDY_TRACKER_UPLOAD_PATH`, `UPLOAD_MAX_FILE_SIZE`, `UPLOAD_TIMEOUT_SECS`.

use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use uploader::{
    EnqueueReport, HttpUploader, NotificationHub, QueuedFile, SkipReason, StoredFile,
    SubmitReport, UploadConfig, UploadError, UploadOutcome, UploadQueue, UploadTarget,
    UploadTargetForm, Uploader,
};

#[derive(Parser)]
#[command(name = "uploader")]
#[command(about = "Upload files to Study Tracker storage folders", long_about = None)]
struct Cli {
    /// Study Tracker base URL (overrides STUDY_TRACKER_URL)
    #[arg(long, global = true)]
    url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload files to a storage folder
    Push {
        /// Files to upload
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Destination folder identifier
        #[arg(short, long)]
        folder_id: String,

        /// Target path inside the folder
        #[arg(short, long)]
        path: String,

        /// Do not offer to retry failed files
        #[arg(long)]
        no_prompt: bool,
    },

    /// Show which files would be queued, without uploading
    Check {
        /// Files to check
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Start the upload session host
    Serve {
        /// Port to listen on
        #[arg(short = 'P', long, default_value = "3000")]
        port: u16,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match UploadConfig::from_env() {
        Ok(config) => {
            let config = match cli.url.as_deref() {
                Some(url) => config.with_api_url(url),
                None => config,
            };
            run(cli.command, config).await
        }
        Err(e) => Err(e.into()),
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(command: Commands, config: UploadConfig) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Push {
            files,
            folder_id,
            path,
            no_prompt,
        } => cmd_push(&config, &files, folder_id, path, no_prompt).await,

        Commands::Check { files } => cmd_check(&config, &files).await,

        Commands::Serve { port } => uploader::server::start_server(&config, port).await,
    }
}

async fn read_files(paths: &[PathBuf]) -> Result<Vec<QueuedFile>, Box<dyn std::error::Error>> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        files.push(QueuedFile::from_path(path).await?);
    }
    Ok(files)
}

/// Oversize files are already announced by the notification hub.
fn print_enqueue(report: &EnqueueReport) {
    eprintln!("   Queued: {}", report.added.len());
    for name in &report.duplicates {
        eprintln!("   ↷ {} (duplicate, skipped)", name);
    }
}

/// Fails when files were refused on enqueue and so never uploaded.
fn ensure_all_admitted(report: &EnqueueReport) -> Result<(), Box<dyn std::error::Error>> {
    if report.rejected.is_empty() {
        return Ok(());
    }
    Err(format!("{} file(s) over the size limit not uploaded", report.rejected.len()).into())
}

/// Stand-in for `check`, which never submits.
struct DryRun;

impl Uploader for DryRun {
    async fn upload(&self, file: &QueuedFile, _target: &UploadTarget) -> Result<StoredFile, UploadError> {
        Err(UploadError::Transport(format!("dry run: {} not sent", file.name)))
    }
}

fn print_stored(outcomes: &[UploadOutcome]) {
    for outcome in outcomes {
        if let Some(path) = outcome.stored_path() {
            println!("   ✅ {} → {}", outcome.file.name, path);
        }
    }
}

async fn cmd_push(
    config: &UploadConfig,
    paths: &[PathBuf],
    folder_id: String,
    path: String,
    no_prompt: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let target = UploadTargetForm {
        folder_id: Some(folder_id),
        path: Some(path),
    }
    .validate()?;

    let uploader = HttpUploader::new(config)?;
    eprintln!("📤 Uploading to {}", uploader.url());
    eprintln!("   Folder: {}   Path: {}", target.folder_id, target.path);

    let queue = Arc::new(UploadQueue::new(uploader, NotificationHub::new(), config));
    let report = queue.enqueue(read_files(paths).await?)?;
    print_enqueue(&report);

    loop {
        match queue.submit(&target).await {
            SubmitReport::Completed(outcomes) => {
                print_stored(&outcomes);
                ensure_all_admitted(&report)?;
                eprintln!("\n✨ Done!");
                return Ok(());
            }

            SubmitReport::Skipped(SkipReason::EmptyQueue) => {
                eprintln!("📋 Nothing to upload.");
                return ensure_all_admitted(&report);
            }

            SubmitReport::PartialFailure(outcomes) => {
                print_stored(&outcomes);

                let remaining = queue.snapshot().queued;
                for file in &remaining {
                    eprintln!("   ❌ {}", file.name);
                }

                if no_prompt || !confirm(&format!("Retry {} failed file(s)?", remaining.len()))? {
                    return Err(format!("{} file(s) not uploaded", remaining.len()).into());
                }
            }

            SubmitReport::Skipped(SkipReason::InFlight) | SubmitReport::Discarded(_) => {
                return Err("Upload interrupted".into());
            }
        }
    }
}

async fn cmd_check(config: &UploadConfig, paths: &[PathBuf]) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("🔍 Checking {} file(s), limit {} bytes", paths.len(), config.max_file_size);

    let queue = UploadQueue::new(DryRun, NotificationHub::new(), config);
    let report = queue.enqueue(read_files(paths).await?)?;
    print_enqueue(&report);

    for file in queue.snapshot().queued {
        println!("{}\t{}", file.name, file.size);
    }

    Ok(())
}

fn confirm(question: &str) -> io::Result<bool> {
    eprint!("🔁 {} [y/N] ", question);
    io::stderr().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refused_files_fail_the_push() {
        let mut report = EnqueueReport::default();
        assert!(ensure_all_admitted(&report).is_ok());

        report.rejected.push("scan.tiff".into());
        let err = ensure_all_admitted(&report).unwrap_err();
        assert!(err.to_string().contains("1 file(s)"));
    }

    #[tokio::test]
    async fn test_check_reports_refused_files() {
        let config = UploadConfig {
            max_file_size: 4,
            ..UploadConfig::default()
        };
        let queue = UploadQueue::new(DryRun, NotificationHub::new(), &config);

        let report = queue
            .enqueue(vec![
                QueuedFile::new("big.csv", b"123456".to_vec()),
                QueuedFile::new("ok.csv", b"12".to_vec()),
            ])
            .unwrap();
        assert_eq!(report.rejected, vec!["big.csv".to_string()]);
        assert!(ensure_all_admitted(&report).is_err());
        assert_eq!(queue.snapshot().queued.len(), 1);
    }
}
