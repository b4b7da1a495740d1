//! CLI command implementations

use std::path::PathBuf;

use clap::Subcommand;
use showreel_core::config::ShowreelConfig;
use showreel_core::{LocalMediaStore, MediaEntry, MediaStore, Result};
use tracing::info;

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Start the media server
    Server {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,
        /// Port to bind to
        #[arg(short, long)]
        port: Option<u16>,
        /// Directory holding uploaded videos
        #[arg(long)]
        media_root: Option<PathBuf>,
    },
    /// List videos in the media library
    List {
        /// Directory holding uploaded videos
        #[arg(long)]
        media_root: Option<PathBuf>,
    },
}

/// Handle the CLI command
///
/// # Errors
/// Returns appropriate error based on the command that fails
pub async fn handle_command(command: Commands) -> Result<()> {
    match command {
        Commands::Server {
            host,
            port,
            media_root,
        } => {
            let config = apply_overrides(ShowreelConfig::from_env(), host, port, media_root);
            start_server(config).await
        }
        Commands::List { media_root } => {
            let config = apply_overrides(ShowreelConfig::from_env(), None, None, media_root);
            list_media(config).await
        }
    }
}

/// Layers command-line flags over environment configuration.
fn apply_overrides(
    mut config: ShowreelConfig,
    host: Option<String>,
    port: Option<u16>,
    media_root: Option<PathBuf>,
) -> ShowreelConfig {
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    if let Some(root) = media_root {
        config.media.root = root;
    }
    config
}

/// Start the web server
///
/// # Errors
/// - `ShowreelError::Configuration` - Invalid bind address
/// - `ShowreelError::Io` - Listener could not be bound
pub async fn start_server(config: ShowreelConfig) -> Result<()> {
    info!(
        "Starting server on {}:{} with range policy {:?}",
        config.server.host, config.server.port, config.media.range_policy
    );
    showreel_web::run_server(config).await
}

/// Print the media library
///
/// # Errors
/// - `ShowreelError::Storage` - Library could not be enumerated
pub async fn list_media(config: ShowreelConfig) -> Result<()> {
    let store = LocalMediaStore::new(config.media.root.clone());
    let items = store.list().await?;

    println!("Media library: {}", store.root().display());
    println!("{:-<60}", "");

    if items.is_empty() {
        println!("No videos found.");
        return Ok(());
    }

    for item in &items {
        println!("{}", format_entry(item));
    }
    let total: u64 = items.iter().map(|item| item.length).sum();
    println!("{:-<60}", "");
    println!("{} videos, {}", items.len(), format_size(total));

    Ok(())
}

fn format_entry(item: &MediaEntry) -> String {
    format!("{:<48} {:>11}", item.id, format_size(item.length))
}

fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{size:.1} {}", UNITS[unit])
    }
}
