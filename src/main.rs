//! plugsync - Concurrently fetch, update, and prune editor plugins.
//!
//! Usage:
//!   plugsync sync [-c plugins.yaml] [--root DIR]   Fetch every plugin and prune stale ones
//!   plugsync validate [-c plugins.yaml]            Validate the manifest without fetching
//!   plugsync list [-c plugins.yaml]                List the plugins in the manifest
//!   plugsync clean [-c plugins.yaml] [--dry-run]   Remove plugins no longer in the manifest

use clap::{Parser, Subcommand};
use plugsync::{EventBus, EventHandler, Syncer, load_manifest};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

/// plugsync - Concurrently fetch, update, and prune editor plugins
#[derive(Parser)]
#[command(name = "plugsync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch or update every plugin, run hooks, and remove stale plugins
    Sync {
        /// Path to the plugin manifest (YAML, or a plain-text list)
        #[arg(short = 'c', long, default_value = "plugins.yaml")]
        config: PathBuf,

        /// Directory the plugin directories live in
        #[arg(long, default_value = ".")]
        root: PathBuf,

        /// Keep plugins that are no longer in the manifest
        #[arg(long)]
        no_clean: bool,
    },

    /// Validate the manifest without fetching anything
    Validate {
        /// Path to the plugin manifest
        #[arg(short = 'c', long, default_value = "plugins.yaml")]
        config: PathBuf,
    },

    /// List the plugins in the manifest
    List {
        /// Path to the plugin manifest
        #[arg(short = 'c', long, default_value = "plugins.yaml")]
        config: PathBuf,
    },

    /// Remove plugins that are no longer in the manifest
    Clean {
        /// Path to the plugin manifest
        #[arg(short = 'c', long, default_value = "plugins.yaml")]
        config: PathBuf,

        /// Directory the plugin directories live in
        #[arg(long, default_value = ".")]
        root: PathBuf,

        /// Only report what would be removed
        #[arg(long)]
        dry_run: bool,
    },
}

/// Event handler that logs each fetch as it finishes.
struct LoggingHandler;

#[async_trait::async_trait]
impl EventHandler for LoggingHandler {
    async fn handle(&self, event: &plugsync::Event) {
        match event {
            plugsync::Event::FetchCompleted {
                plugin,
                process,
                output,
                ..
            } => {
                info!("-- {} @{} {}", plugin, process, output.trim());
            }
            plugsync::Event::FetchFailed {
                plugin,
                process,
                error,
                output,
                ..
            } => {
                warn!("-- {} @{} {}", plugin, process, output.trim());
                error!("  Fetch of '{}' failed: {}", plugin, error);
            }
            plugsync::Event::HookCompleted {
                plugin,
                command,
                success,
                output,
                ..
            } => {
                if *success {
                    info!("  Hook for '{}' ran: {}", plugin, command);
                } else {
                    error!("  Hook for '{}' failed: {}", plugin, command);
                }
                for line in output.trim().lines() {
                    info!("    {}", line);
                }
            }
            plugsync::Event::PluginRemoved { plugin, path, .. } => {
                info!("  Removed '{}' ({})", plugin, path.display());
            }
            _ => {}
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Sync {
            config,
            root,
            no_clean,
        } => {
            sync_plugins(config, root, no_clean).await?;
        }
        Commands::Validate { config } => {
            validate_manifest(config)?;
        }
        Commands::List { config } => {
            list_plugins(config)?;
        }
        Commands::Clean {
            config,
            root,
            dry_run,
        } => {
            clean_plugins(config, root, dry_run).await?;
        }
    }

    Ok(())
}

/// Load the manifest and build a syncer that logs through [`LoggingHandler`].
async fn build_syncer(config: &Path, root: PathBuf) -> Result<Syncer, Box<dyn std::error::Error>> {
    info!("Loading manifest from: {}", config.display());
    let syncer = Syncer::from_manifest_file(root, config)?;
    if syncer.manifest().is_empty() {
        warn!("No plugins listed in {}", config.display());
    }

    let event_bus = EventBus::new();
    event_bus.register(Arc::new(LoggingHandler)).await;
    Ok(syncer.with_event_bus(event_bus))
}

/// Fetch every plugin and prune stale ones.
async fn sync_plugins(
    config: PathBuf,
    root: PathBuf,
    no_clean: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let syncer = build_syncer(&config, root).await?.with_cleanup(!no_clean);

    let report = syncer.run().await?;
    let failed = report.failed();

    if report.success() {
        info!(
            "Synced {} plugin(s) in {:?}",
            report.fetches.len(),
            report.duration
        );
        Ok(())
    } else if failed.is_empty() {
        Err("one or more post-fetch hooks failed".into())
    } else {
        let names: Vec<&str> = failed.iter().map(|f| f.plugin.as_str()).collect();
        error!("Failed to fetch: {}", names.join(", "));
        Err(format!("{} plugin(s) failed to fetch", failed.len()).into())
    }
}

/// Validate the manifest without fetching anything.
fn validate_manifest(config: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    info!("Validating manifest: {}", config.display());

    match load_manifest(&config) {
        Ok(manifest) => {
            info!("All {} plugin(s) are valid", manifest.len());
            Ok(())
        }
        Err(e) => {
            error!("Validation failed: {}", e);
            Err(e.into())
        }
    }
}

/// List the plugins in the manifest.
fn list_plugins(config: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let manifest = load_manifest(&config)?;

    if manifest.is_empty() {
        println!("No plugins listed in {}", config.display());
        return Ok(());
    }

    for dir in manifest.target_dirs() {
        let plugins: Vec<_> = manifest
            .plugins()
            .iter()
            .filter(|p| manifest.target_dir(p) == dir)
            .collect();
        if plugins.is_empty() {
            continue;
        }

        println!("{}:", dir.display());
        for plugin in plugins {
            let flags: Vec<&str> = plugin.flags().iter().map(|f| f.as_str()).collect();
            if flags.is_empty() {
                println!("  {} ({}) {}", plugin.name(), plugin.vcs(), plugin.url());
            } else {
                println!(
                    "  {} ({}) {} [{}]",
                    plugin.name(),
                    plugin.vcs(),
                    plugin.url(),
                    flags.join(", ")
                );
            }
        }
        println!();
    }

    for hook in manifest.hooks() {
        println!("post_fetch {}: {}", hook.plugin, hook.command);
    }

    Ok(())
}

/// Remove (or report) plugins that are no longer in the manifest.
async fn clean_plugins(
    config: PathBuf,
    root: PathBuf,
    dry_run: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let syncer = build_syncer(&config, root).await?;

    if dry_run {
        let stale = syncer.stale_plugins().await?;
        if stale.is_empty() {
            println!("Nothing to remove");
        }
        for entry in &stale {
            println!("would remove {}", entry.path.display());
        }
        return Ok(());
    }

    let removed = syncer.clean_stale().await?;
    info!("Removed {} plugin(s)", removed.len());
    Ok(())
}
