//! # livebundle
//! Resolve a bundled resource against the live cache from the command line,
//! optionally waiting for the remote update check to finish.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::*;
use livebundle::{DirBundle, LiveBundle, LiveBundleConfig, UpdateOutcome};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct BundleArgs {
    /// Directory holding the packaged resources
    #[arg(long)]
    bundle: PathBuf,
    /// Application identifier, used as the live cache namespace
    #[arg(long, default_value = "com.example.app")]
    id: String,
    /// Base URL checked for updates (overrides livebundle.toml and LIVEBUNDLE_URL)
    #[arg(long)]
    url: Option<String>,
    /// Live cache root (overrides livebundle.toml and LIVEBUNDLE_HOME)
    #[arg(long)]
    cache: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the best local path for a resource and start its update check
    Resolve {
        /// Resource name, e.g. `example`
        name: String,
        /// Resource type extension, e.g. `plist`
        ext: String,
        #[command(flatten)]
        bundle: BundleArgs,
        /// Wait for the update check and report its outcome
        #[arg(long)]
        wait: bool,
    },
    /// Print the bundled, live, temp and remote locations of a resource
    Paths {
        name: String,
        ext: String,
        #[command(flatten)]
        bundle: BundleArgs,
    },
}

fn open(args: BundleArgs) -> Result<LiveBundle> {
    let mut config = LiveBundleConfig::load(&args.bundle)
        .with_context(|| format!("reading settings from {}", args.bundle.display()))?;
    if let Some(url) = args.url {
        config.url = Some(url);
    }
    if let Some(cache) = args.cache {
        config.cache_root = Some(cache);
    }

    log::debug!("opening {} from {}", args.id, args.bundle.display());
    LiveBundle::builder(DirBundle::new(args.id, args.bundle))
        .config(config)
        .build()
}

#[async_std::main]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Resolve {
            name,
            ext,
            bundle,
            wait,
        } => {
            let live = open(bundle)?;
            let resolution = live.resolve_tracked(&name, &ext);

            match &resolution.path {
                Ok(path) => println!("{}", path.display()),
                Err(e) => eprintln!("{} {}", "unavailable:".red(), e),
            }

            if wait {
                if let Some(update) = resolution.update {
                    let outcome = update.outcome().await;
                    log::info!("update check for {}.{} finished: {:?}", name, ext, outcome);
                    match outcome {
                        UpdateOutcome::Updated(path) => {
                            println!("{} {}", "updated".green(), path.display())
                        }
                        UpdateOutcome::Unchanged => println!("{}", "up to date".cyan()),
                        UpdateOutcome::Skipped(why) => println!("{} {}", "skipped:".yellow(), why),
                        UpdateOutcome::Failed(why) => println!("{} {}", "failed:".red(), why),
                    }
                }
            }

            if resolution.path.is_err() {
                std::process::exit(1);
            }
        }
        Commands::Paths { name, ext, bundle } => {
            let live = open(bundle)?;
            let paths = live.candidate_paths(&name, &ext);
            let bundled = paths
                .bundled
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "-".dimmed().to_string());
            let remote = live
                .remote_url_for_resource(&name, &ext)
                .map(|u| u.to_string())
                .unwrap_or_else(|e| e.to_string().dimmed().to_string());

            println!("{:8} {}", "bundled".bold(), bundled);
            println!("{:8} {}", "live".bold(), paths.live.display());
            println!("{:8} {}", "temp".bold(), paths.temp.display());
            println!("{:8} {}", "remote".bold(), remote);
        }
    }

    Ok(())
}
