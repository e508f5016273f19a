use std::path::PathBuf;

use clap::{Parser, Subcommand};
use folio_kb::commands::{init_config, seed, serve, show_config, status};
use folio_kb::config::{Config, DEFAULT_CONFIG_FILE};
use folio_kb::Result;

#[derive(Debug, Parser)]
#[command(name = "folio-kb")]
#[command(about = "Portfolio knowledge service: semantic search and retrieval-augmented chat")]
#[command(version)]
struct Cli {
    /// Path to the configuration file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Override the configured listen host
        #[arg(long)]
        host: Option<String>,
        /// Override the configured listen port
        #[arg(long)]
        port: Option<u16>,
    },
    /// Seed the databases from a profile file
    Seed {
        /// Path to the profile TOML file
        #[arg(long, default_value = "profile.toml")]
        profile: PathBuf,
        /// Re-embed every document even if its content is unchanged
        #[arg(long)]
        recompute: bool,
    },
    /// Show document counts, embedding counts, and provider reachability
    Status,
    /// Create or inspect the configuration file
    Config {
        /// Print the active configuration
        #[arg(long)]
        show: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;

    match cli.command {
        Commands::Serve { host, port } => {
            let mut config = config;
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            serve(config).await?;
        }
        Commands::Seed { profile, recompute } => {
            seed(config, &profile, recompute).await?;
        }
        Commands::Status => {
            status(config).await?;
        }
        Commands::Config { show } => {
            if show {
                show_config(&config)?;
            } else {
                init_config(&cli.config)?;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn cli_parses_serve_with_overrides() {
        let parsed = Cli::try_parse_from(["folio-kb", "serve", "--host", "0.0.0.0", "--port", "9000"])
            .expect("should parse");
        match parsed.command {
            Commands::Serve { host, port } => {
                assert_eq!(host.as_deref(), Some("0.0.0.0"));
                assert_eq!(port, Some(9000));
            }
            _ => panic!("expected serve command"),
        }
    }

    #[test]
    fn cli_parses_seed_with_flags() {
        let parsed =
            Cli::try_parse_from(["folio-kb", "seed", "--profile", "me.toml", "--recompute"])
                .expect("should parse");
        match parsed.command {
            Commands::Seed { profile, recompute } => {
                assert_eq!(profile, PathBuf::from("me.toml"));
                assert!(recompute);
            }
            _ => panic!("expected seed command"),
        }
    }

    #[test]
    fn cli_seed_defaults_profile_path() {
        let parsed = Cli::try_parse_from(["folio-kb", "seed"]).expect("should parse");
        match parsed.command {
            Commands::Seed { profile, recompute } => {
                assert_eq!(profile, PathBuf::from("profile.toml"));
                assert!(!recompute);
            }
            _ => panic!("expected seed command"),
        }
    }

    #[test]
    fn cli_uses_default_config_path() {
        let parsed = Cli::try_parse_from(["folio-kb", "status"]).expect("should parse");
        assert_eq!(parsed.config, PathBuf::from(DEFAULT_CONFIG_FILE));
    }

    #[test]
    fn cli_accepts_global_config_flag() {
        let parsed = Cli::try_parse_from(["folio-kb", "--config", "custom.toml", "status"])
            .expect("should parse");
        assert_eq!(parsed.config, PathBuf::from("custom.toml"));
    }

    #[test]
    fn cli_parses_config_show() {
        let parsed = Cli::try_parse_from(["folio-kb", "config", "--show"]).expect("should parse");
        match parsed.command {
            Commands::Config { show } => assert!(show),
            _ => panic!("expected config command"),
        }
    }

    #[test]
    fn cli_rejects_unknown_subcommand() {
        let err = Cli::try_parse_from(["folio-kb", "frobnicate"]).expect_err("should fail");
        assert_eq!(err.kind(), ErrorKind::InvalidSubcommand);
    }
}
