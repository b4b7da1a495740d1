//! Showreel CLI - Command-line interface
//!
//! Runs the media server and inspects the video library.

mod commands;

use std::path::PathBuf;

use clap::Parser;
use showreel_core::ShowreelError;
use showreel_core::tracing_setup::{CliLogLevel, init_tracing};
use tracing::error;

#[derive(Parser)]
#[command(name = "showreel")]
#[command(about = "Range-aware video server for the event portfolio site")]
struct Cli {
    /// Console log level (RUST_LOG overrides)
    #[arg(long, value_enum, default_value_t = CliLogLevel::Info, global = true)]
    log_level: CliLogLevel,

    /// Directory for the full-trace log file
    #[arg(long, global = true)]
    logs_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: commands::Commands,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_tracing_level(), cli.logs_dir.as_deref())?;

    if let Err(e) = commands::handle_command(cli.command).await {
        if !e.is_user_error() {
            error!("Command failed: {}", e);
        }
        eprintln!("Error: {}", e.user_message());
        std::process::exit(exit_code(&e));
    }

    Ok(())
}

/// Exit status for a failed command: 2 for bad input, 1 for everything else.
fn exit_code(error: &ShowreelError) -> i32 {
    if error.is_user_error() { 2 } else { 1 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_server_flags() {
        let cli = Cli::try_parse_from([
            "showreel",
            "--log-level",
            "debug",
            "server",
            "--port",
            "8080",
            "--media-root",
            "/srv/videos",
        ])
        .unwrap();

        assert_eq!(cli.log_level, CliLogLevel::Debug);
        match cli.command {
            commands::Commands::Server {
                port, media_root, ..
            } => {
                assert_eq!(port, Some(8080));
                assert_eq!(media_root, Some(PathBuf::from("/srv/videos")));
            }
            commands::Commands::List { .. } => panic!("expected server command"),
        }
    }

    #[test]
    fn test_exit_code_separates_user_errors() {
        let bad_config = ShowreelError::Configuration {
            reason: "invalid bind address nowhere".to_string(),
        };
        assert_eq!(exit_code(&bad_config), 2);
        assert_eq!(
            bad_config.user_message(),
            "Configuration error: invalid bind address nowhere"
        );

        let io = ShowreelError::Io(std::io::Error::other("address in use"));
        assert_eq!(exit_code(&io), 1);
        assert_eq!(io.user_message(), "File system error occurred");
    }

    #[test]
    fn test_cli_rejects_unknown_log_level() {
        assert!(Cli::try_parse_from(["showreel", "--log-level", "loud", "list"]).is_err());
    }
}
