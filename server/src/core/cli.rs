use clap::{Parser, Subcommand};

use std::path::PathBuf;

use super::config::LookupBackend;
use super::constants::{
    ENV_CONFIG, ENV_DATA_DIR, ENV_HOST, ENV_LOOKUP_BACKEND, ENV_MAX_IN_FLIGHT, ENV_PORT,
    ENV_POSTGRES_URL, ENV_SENDER_ENDPOINT, ENV_STAGE_TIMEOUT_MS, ENV_TRIGGER_METRIC,
};

#[derive(Parser)]
#[command(name = "viaduct")]
#[command(version, about = "Prometheus remote write relay", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Server host address
    #[arg(long, short = 'H', global = true, env = ENV_HOST)]
    pub host: Option<String>,

    /// Server port
    #[arg(long, short = 'p', global = true, env = ENV_PORT)]
    pub port: Option<u16>,

    /// Path to config file
    #[arg(long, short = 'c', global = true, env = ENV_CONFIG)]
    pub config: Option<PathBuf>,

    /// Lookup store backend (sqlite or postgres)
    #[arg(long, global = true, env = ENV_LOOKUP_BACKEND, value_parser = parse_lookup_backend)]
    pub lookup_backend: Option<LookupBackend>,

    /// Data directory for the embedded SQLite backend
    #[arg(long, global = true, env = ENV_DATA_DIR)]
    pub data_dir: Option<PathBuf>,

    /// PostgreSQL connection URL (when using the postgres backend)
    #[arg(long, global = true, env = ENV_POSTGRES_URL)]
    pub postgres_url: Option<String>,

    /// Metric name that makes a series subject to view duplication
    #[arg(long, global = true, env = ENV_TRIGGER_METRIC)]
    pub trigger_metric: Option<String>,

    /// Maximum batch invocations in flight at once
    #[arg(long, global = true, env = ENV_MAX_IN_FLIGHT)]
    pub max_in_flight: Option<usize>,

    /// Per-stage timeout in milliseconds
    #[arg(long, global = true, env = ENV_STAGE_TIMEOUT_MS)]
    pub stage_timeout_ms: Option<u64>,

    /// Remote write endpoint transformed batches are forwarded to
    #[arg(long, global = true, env = ENV_SENDER_ENDPOINT)]
    pub endpoint: Option<String>,
}

/// Parse lookup backend from CLI/env string
fn parse_lookup_backend(s: &str) -> Result<LookupBackend, String> {
    match s.to_lowercase().as_str() {
        "sqlite" => Ok(LookupBackend::Sqlite),
        "postgres" | "postgresql" => Ok(LookupBackend::Postgres),
        _ => Err(format!(
            "Invalid lookup backend '{}'. Valid options: sqlite, postgres",
            s
        )),
    }
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Start the relay (default command)
    Start,
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub config: Option<PathBuf>,
    pub lookup_backend: Option<LookupBackend>,
    pub data_dir: Option<PathBuf>,
    pub postgres_url: Option<String>,
    pub trigger_metric: Option<String>,
    pub max_in_flight: Option<usize>,
    pub stage_timeout_ms: Option<u64>,
    pub endpoint: Option<String>,
}

/// Parse CLI arguments and return config with command
pub fn parse() -> (CliConfig, Option<Commands>) {
    let cli = Cli::parse();
    let config = CliConfig {
        host: cli.host,
        port: cli.port,
        config: cli.config,
        lookup_backend: cli.lookup_backend,
        data_dir: cli.data_dir,
        postgres_url: cli.postgres_url,
        trigger_metric: cli.trigger_metric,
        max_in_flight: cli.max_in_flight,
        stage_timeout_ms: cli.stage_timeout_ms,
        endpoint: cli.endpoint,
    };
    (config, cli.command)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_lookup_backend() {
        assert_eq!(
            parse_lookup_backend("sqlite").unwrap(),
            LookupBackend::Sqlite
        );
        assert_eq!(
            parse_lookup_backend("PostgreSQL").unwrap(),
            LookupBackend::Postgres
        );
        assert!(parse_lookup_backend("mongo").is_err());
    }

    #[test]
    fn test_cli_parses_flags() {
        let cli = Cli::try_parse_from([
            "viaduct",
            "--port",
            "9000",
            "--endpoint",
            "http://collector:9090/api/v1/write",
        ])
        .unwrap();
        assert_eq!(cli.port, Some(9000));
        assert_eq!(
            cli.endpoint.as_deref(),
            Some("http://collector:9090/api/v1/write")
        );
    }
}
