//! Subcommand implementations.

use color_eyre::eyre::eyre;
use color_eyre::Result;
use colored::Colorize;
use pf_core::config::models::AppConfig;
use pf_core::ingest::{BatchReport, IngestError, IngestionPipeline, UploadItem};
use pf_core::store::PhotoStore;
use pf_core::supervisor::{ActionTaken, ProcessSupervisor};
use pf_protocol::photo_models::BatchOutcome;
use pf_protocol::role_models::{RoleKind, RoleObservation};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// One-shot supervisor actions.
#[derive(Debug, Clone, Copy)]
pub enum Action {
    Toggle,
    Start,
    Stop,
}

pub async fn controller(config: &AppConfig) -> Result<ExitCode> {
    pf_tui::run_controller(config).await.map_err(|e| eyre!(e))?;
    Ok(ExitCode::SUCCESS)
}

pub async fn serve(config: &AppConfig) -> Result<ExitCode> {
    pf_web::serve(config).await.map_err(|e| eyre!(e))?;
    Ok(ExitCode::SUCCESS)
}

pub async fn status(config: &AppConfig, json: bool) -> Result<ExitCode> {
    let supervisor = ProcessSupervisor::new(config);
    let statuses = tokio::task::spawn_blocking(move || supervisor.probe().observe_all()).await?;

    let observations: Vec<RoleObservation> = statuses
        .into_iter()
        .map(|(role, running)| RoleObservation {
            running,
            ..RoleObservation::new(role)
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&observations)?);
    } else {
        for observation in &observations {
            let state = if observation.running {
                "running".green()
            } else {
                "stopped".dimmed()
            };
            println!("{:<10} {state}", observation.role.label());
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// Run one action and print its status line. Exit code 1 on failure.
pub async fn act(config: &AppConfig, role: RoleKind, action: Action) -> Result<ExitCode> {
    let supervisor = ProcessSupervisor::new(config);
    let taken = tokio::task::spawn_blocking(move || match action {
        Action::Toggle => supervisor.toggle(role),
        Action::Start => supervisor.start(role),
        Action::Stop => supervisor.stop(role),
    })
    .await?;

    let line = taken.status_line(role);
    match taken {
        ActionTaken::Failed(_) => {
            println!("{}", line.red());
            Ok(ExitCode::FAILURE)
        }
        ActionTaken::Started => {
            println!("{}", line.green());
            Ok(ExitCode::SUCCESS)
        }
        _ => {
            println!("{line}");
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Ingest local files as if they had been uploaded together.
///
/// Exit code 1 when nothing was stored.
pub async fn ingest(config: &AppConfig, files: Vec<PathBuf>) -> Result<ExitCode> {
    let pipeline = IngestionPipeline::new(PhotoStore::new(&config.store_dir), config.normalize);
    let limit = config.max_file_bytes;

    let report = tokio::task::spawn_blocking(move || {
        let mut report = BatchReport::default();
        for path in files {
            let filename = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            let result = read_local(&path, &filename, limit)
                .and_then(|item| pipeline.ingest(&item.bytes, &item.filename));
            report.record(result);
        }
        report
    })
    .await?;

    for entry in &report.stored {
        println!("{} {}", "stored".green(), entry.identity);
    }
    for err in &report.rejected {
        println!("{} {err}", "rejected".red());
    }
    println!("{}", report.message());

    Ok(match report.outcome() {
        BatchOutcome::AllStored | BatchOutcome::Partial => ExitCode::SUCCESS,
        BatchOutcome::Empty | BatchOutcome::NoneStored => ExitCode::FAILURE,
    })
}

fn read_local(path: &Path, filename: &str, limit: u64) -> Result<UploadItem, IngestError> {
    let fs_error = |source| IngestError::FileSystem {
        filename: filename.to_string(),
        path: path.to_path_buf(),
        source,
    };

    let size = std::fs::metadata(path).map_err(fs_error)?.len();
    if size > limit {
        return Err(IngestError::TooLarge {
            filename: filename.to_string(),
            limit,
        });
    }
    let bytes = std::fs::read(path).map_err(fs_error)?;
    Ok(UploadItem::new(filename, bytes))
}

pub async fn list(config: &AppConfig) -> Result<ExitCode> {
    let store = PhotoStore::new(&config.store_dir);
    let entries = tokio::task::spawn_blocking(move || store.list()).await?;

    if entries.is_empty() {
        println!("No photos in {}", config.store_dir.display());
        return Ok(ExitCode::SUCCESS);
    }
    for entry in entries {
        let info = entry.to_info();
        println!("{:<45} {:>10}  {}", info.filename, info.size, info.created);
    }
    Ok(ExitCode::SUCCESS)
}
