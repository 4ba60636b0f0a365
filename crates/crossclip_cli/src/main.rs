//! CrossClip CLI
//!
//! Runs the clipboard relay or a sync agent, and sends control requests to
//! a running relay.
//!
//! # Commands
//!
//! - `serve` - Run the relay server
//! - `agent` - Sync this machine's clipboard through a relay
//! - `arm` / `disarm` - Open or close the relay for one upload
//! - `status` - Show relay state
//! - `latest` - Show the most recent clip
//!
//! Settings fall back to environment variables, and a `.env` file in the
//! working directory is loaded first.

mod commands;

use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Clipboard relay and sync agent.
#[derive(Parser)]
#[command(name = "crossclip")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Relay URL for agent and control commands
    #[arg(
        global = true,
        long,
        env = "CROSSCLIP_SERVER",
        default_value = "http://127.0.0.1:8000"
    )]
    server: String,

    /// Shared secret
    #[arg(global = true, long, env = "API_SECRET", hide_env_values = true)]
    secret: Option<String>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the relay server
    Serve {
        /// Address to listen on
        #[arg(short, long, env = "CROSSCLIP_BIND", default_value = "0.0.0.0:8000")]
        bind: SocketAddr,

        /// Directory for uploaded images
        #[arg(short, long, env = "CROSSCLIP_UPLOAD_DIR", default_value = "uploads")]
        upload_dir: PathBuf,

        /// Number of clips kept in history
        #[arg(long, default_value_t = crossclip_protocol::DEFAULT_HISTORY_CAPACITY)]
        history: usize,
    },

    /// Sync the system clipboard through the relay
    Agent {
        /// Clipboard poll interval in milliseconds
        #[arg(long, default_value = "1000")]
        poll_ms: u64,

        /// Suppression window after applying a remote clip, in milliseconds
        #[arg(long, default_value = "500")]
        settle_ms: u64,

        /// Wait before reconnecting the push channel, in milliseconds
        #[arg(long, default_value = "2000")]
        backoff_ms: u64,
    },

    /// Arm the relay for one upload
    Arm,

    /// Disarm the relay
    Disarm,

    /// Show relay state
    Status {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show the most recent clip
    Latest {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env file is not an error
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let secret = cli
        .secret
        .filter(|s| !s.is_empty())
        .ok_or("Shared secret required: pass --secret or set API_SECRET")?;

    match cli.command {
        Commands::Serve {
            bind,
            upload_dir,
            history,
        } => {
            commands::serve::run(&secret, bind, upload_dir, history).await?;
        }
        Commands::Agent {
            poll_ms,
            settle_ms,
            backoff_ms,
        } => {
            let timing = commands::agent::Timing {
                poll_ms,
                settle_ms,
                backoff_ms,
            };
            commands::agent::run(&cli.server, &secret, timing).await?;
        }
        Commands::Arm => commands::control::arm(&cli.server, &secret).await?,
        Commands::Disarm => commands::control::disarm(&cli.server, &secret).await?,
        Commands::Status { format } => {
            commands::control::status(&cli.server, &secret, &format).await?;
        }
        Commands::Latest { format } => {
            commands::control::latest(&cli.server, &secret, &format).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn serve_flags_parse() {
        let cli = Cli::try_parse_from([
            "crossclip",
            "--secret",
            "s3cret",
            "serve",
            "--bind",
            "127.0.0.1:9000",
            "--upload-dir",
            "/tmp/clips",
        ])
        .unwrap();

        assert_eq!(cli.secret.as_deref(), Some("s3cret"));
        match cli.command {
            Commands::Serve {
                bind,
                upload_dir,
                history,
            } => {
                assert_eq!(bind, "127.0.0.1:9000".parse().unwrap());
                assert_eq!(upload_dir, PathBuf::from("/tmp/clips"));
                assert_eq!(history, crossclip_protocol::DEFAULT_HISTORY_CAPACITY);
            }
            _ => panic!("expected serve"),
        }
    }

    #[test]
    fn global_flags_follow_subcommand() {
        let cli =
            Cli::try_parse_from(["crossclip", "status", "--server", "http://relay:8000", "-v"])
                .unwrap();
        assert_eq!(cli.server, "http://relay:8000");
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Status { .. }));
    }
}
