use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use quote_search::commands::{init_config, run_ingest, serve_http, show_config, show_status};
use quote_search::config::{Config, DEFAULT_CONFIG_FILE};

#[derive(Parser)]
#[command(name = "quote-search")]
#[command(about = "Semantic search over a dataset of quotations")]
#[command(version)]
struct Cli {
    /// Path to the configuration file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Embed the dataset and replace the collection contents
    Ingest {
        /// Dataset file (JSON array of quote records)
        #[arg(long)]
        data: Option<PathBuf>,
    },
    /// Start the HTTP search service
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
    /// Show configuration and collection status
    Status,
    /// Show or initialize the configuration file
    Config {
        /// Print the effective configuration
        #[arg(long, conflicts_with = "init")]
        show: bool,
        /// Write a default configuration file
        #[arg(long)]
        init: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Commands::Config { init: true, .. } = cli.command {
        return init_config(&cli.config);
    }

    let mut config = Config::load(&cli.config)?;

    match cli.command {
        Commands::Ingest { data } => {
            if let Some(data) = data {
                config.dataset.path = data;
            }
            config.validate()?;
            run_ingest(&config).await?;
        }
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            config.validate()?;
            serve_http(&config).await?;
        }
        Commands::Status => {
            show_status(&config).await?;
        }
        Commands::Config { .. } => {
            show_config(&config)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn ingest_without_flags() {
        let cli = Cli::try_parse_from(["quote-search", "ingest"]).expect("should parse");

        assert_eq!(cli.config, PathBuf::from(DEFAULT_CONFIG_FILE));
        assert!(matches!(cli.command, Commands::Ingest { data: None }));
    }

    #[test]
    fn ingest_with_data_path() {
        let cli = Cli::try_parse_from(["quote-search", "ingest", "--data", "other.json"])
            .expect("should parse");

        if let Commands::Ingest { data } = cli.command {
            assert_eq!(data, Some(PathBuf::from("other.json")));
        } else {
            panic!("expected ingest command");
        }
    }

    #[test]
    fn serve_with_overrides() {
        let cli = Cli::try_parse_from([
            "quote-search",
            "serve",
            "--host",
            "0.0.0.0",
            "--port",
            "9000",
            "--config",
            "custom.toml",
        ])
        .expect("should parse");

        assert_eq!(cli.config, PathBuf::from("custom.toml"));
        if let Commands::Serve { host, port } = cli.command {
            assert_eq!(host.as_deref(), Some("0.0.0.0"));
            assert_eq!(port, Some(9000));
        } else {
            panic!("expected serve command");
        }
    }

    #[test]
    fn config_flags_conflict() {
        let cli = Cli::try_parse_from(["quote-search", "config", "--show", "--init"]);
        assert!(cli.is_err());
    }

    #[test]
    fn status_command() {
        let cli = Cli::try_parse_from(["quote-search", "status"]).expect("should parse");
        assert!(matches!(cli.command, Commands::Status));
    }

    #[test]
    fn invalid_command() {
        let cli = Cli::try_parse_from(["quote-search", "invalid"]);
        assert!(cli.is_err());

        if let Err(err) = cli {
            assert_eq!(err.kind(), ErrorKind::InvalidSubcommand);
        }
    }

    #[test]
    fn invalid_port() {
        let cli = Cli::try_parse_from(["quote-search", "serve", "--port", "not-a-port"]);
        assert!(cli.is_err());
    }
}
