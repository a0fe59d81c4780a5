mod commands;
mod declaration;

use clap::{Parser, Subcommand};
use gameflow_cloud::StateManager;
use gameflow_cloud_gamelift::GameLiftProvider;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "gameflow")]
#[command(about = "Declare GameLift builds, fleets and aliases; gameflow keeps them in sync", long_about = None)]
struct Cli {
    /// Manifest path (defaults to discovery from the current directory)
    #[arg(short, long, global = true)]
    manifest: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show what apply would change
    Plan,
    /// Create, update, replace and delete resources to match the manifest
    Apply {
        /// Execute without asking
        #[arg(short, long)]
        yes: bool,
    },
    /// Re-read every tracked resource from GameLift
    Refresh,
    /// Delete every tracked resource
    Destroy {
        /// Execute without asking
        #[arg(short, long)]
        yes: bool,
    },
    /// Check the manifest against the resource schemas
    Validate,
    /// Show version information
    Version,
}

/// Directory holding `.gameflow/state.json` for a manifest
fn project_root(manifest_path: &Path) -> PathBuf {
    let dir = manifest_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    if dir.file_name().is_some_and(|name| name == ".gameflow") {
        dir.parent().unwrap_or(dir).to_path_buf()
    } else {
        dir.to_path_buf()
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if matches!(cli.command, Commands::Version) {
        println!("gameflow {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let manifest_path = match cli.manifest {
        Some(path) => path,
        None => gameflow_config::find_manifest_file()?,
    };
    let manifest = gameflow_config::load_manifest(&manifest_path)?;
    let catalog = gameflow_cloud_gamelift::catalog();
    tracing::debug!("Loaded manifest {}", manifest_path.display());

    if matches!(cli.command, Commands::Validate) {
        return commands::validate::handle(&manifest_path, &manifest, &catalog);
    }

    let resources = declaration::resource_set(&manifest, &catalog)?;
    let state_manager = StateManager::new(project_root(&manifest_path));

    if matches!(cli.command, Commands::Plan) {
        return commands::plan::handle(&resources, &state_manager, &catalog).await;
    }

    let settings = &manifest.provider;
    let provider = GameLiftProvider::from_env(settings.region.clone(), settings.profile.clone())
        .await
        .with_timeout(settings.timeout());

    match cli.command {
        Commands::Apply { yes } => {
            commands::apply::handle(&provider, &resources, &state_manager, yes).await?;
        }
        Commands::Refresh => {
            commands::refresh::handle(&provider, &state_manager).await?;
        }
        Commands::Destroy { yes } => {
            commands::destroy::handle(&provider, &state_manager, yes).await?;
        }
        Commands::Plan | Commands::Validate | Commands::Version => {}
    }

    Ok(())
}
