mod commands;
mod logging;

use clap::{Parser, Subcommand};
use color_eyre::eyre::WrapErr;
use pf_protocol::role_models::RoleKind;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "photo-frame")]
#[command(version, about = "Photo uploads, slideshow control and the terminal controller", long_about = None)]
struct Cli {
    /// Directory holding `.photo-frame/` and, by default, the photo store.
    #[arg(long, global = true, value_name = "DIR", default_value = ".")]
    base_dir: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Terminal controller for the server and slideshow (default).
    Controller,
    /// Run the upload web server.
    Serve,
    /// Show whether each role is running.
    Status {
        #[arg(long)]
        json: bool,
    },
    /// Start a role if it is stopped, stop it if it is running.
    Toggle {
        #[arg(value_name = "ROLE")]
        role: RoleKind,
    },
    Start {
        #[arg(value_name = "ROLE")]
        role: RoleKind,
    },
    Stop {
        #[arg(value_name = "ROLE")]
        role: RoleKind,
    },
    /// Add local image files to the store.
    Ingest {
        #[arg(value_name = "FILE", required = true)]
        files: Vec<PathBuf>,
    },
    /// List stored photos, newest first.
    List,
}

#[tokio::main]
async fn main() -> color_eyre::Result<ExitCode> {
    color_eyre::install()?;
    let cli = Cli::parse();

    let base_dir = std::fs::canonicalize(&cli.base_dir)
        .wrap_err_with(|| format!("Base directory {} is not accessible", cli.base_dir.display()))?;
    let config = pf_core::config::loader::load_config(&base_dir)?;

    let command = cli.command.unwrap_or(Command::Controller);
    match &command {
        Command::Controller => logging::init_to_file(&config.log_path())?,
        _ => logging::init_to_stderr()?,
    }

    match command {
        Command::Controller => commands::controller(&config).await,
        Command::Serve => commands::serve(&config).await,
        Command::Status { json } => commands::status(&config, json).await,
        Command::Toggle { role } => commands::act(&config, role, commands::Action::Toggle).await,
        Command::Start { role } => commands::act(&config, role, commands::Action::Start).await,
        Command::Stop { role } => commands::act(&config, role, commands::Action::Stop).await,
        Command::Ingest { files } => commands::ingest(&config, files).await,
        Command::List => commands::list(&config).await,
    }
}
