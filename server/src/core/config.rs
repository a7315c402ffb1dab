use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::cli::CliConfig;
use super::constants::{
    APP_DOT_FOLDER, CONFIG_FILE_NAME, DEFAULT_HOST, DEFAULT_MAX_IN_FLIGHT, DEFAULT_PORT,
    DEFAULT_QUEUE_CAPACITY, DEFAULT_SENDER_BASE_DELAY_MS, DEFAULT_SENDER_MAX_ATTEMPTS,
    DEFAULT_STAGE_TIMEOUT_MS, DEFAULT_TRIGGER_METRIC,
};

// =============================================================================
// Lookup Backend Enum
// =============================================================================

/// Lookup store backend for the metadata and rule tables
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LookupBackend {
    #[default]
    Sqlite,
    Postgres,
}

impl fmt::Display for LookupBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupBackend::Sqlite => write!(f, "sqlite"),
            LookupBackend::Postgres => write!(f, "postgres"),
        }
    }
}

// =============================================================================
// Resolved Configuration
// =============================================================================

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub backend: LookupBackend,
    /// Directory for the embedded SQLite database
    pub data_dir: PathBuf,
    pub postgres_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Maximum batch invocations in flight at once
    pub max_in_flight: usize,
    /// Host-imposed deadline for one stage invocation
    pub stage_timeout: Duration,
    /// Capacity of the receive queue between HTTP surface and pipeline
    pub queue_capacity: usize,
}

#[derive(Debug, Clone)]
pub struct DuplicationConfig {
    /// Metric name that makes a series subject to view duplication
    pub trigger_metric: String,
}

#[derive(Debug, Clone)]
pub struct SenderConfig {
    /// Remote write endpoint transformed batches are forwarded to
    pub endpoint: String,
    pub max_attempts: u32,
    pub base_delay_ms: u64,
}

/// Fully resolved application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub pipeline: PipelineConfig,
    pub duplication: DuplicationConfig,
    pub sender: SenderConfig,
}

impl AppConfig {
    /// Load configuration with precedence: defaults < profile config file
    /// (`~/.viaduct/viaduct.json`) < local or `--config` file < CLI flags
    /// (which also carry their env vars via clap).
    pub fn load(cli: &CliConfig) -> Result<Self> {
        tracing::debug!("Loading application configuration");

        let mut file_config = FileConfig::default();

        if let Some(profile_path) = profile_config_path()
            && profile_path.exists()
        {
            file_config.merge(FileConfig::load_from_file(&profile_path)?);
        }

        let overlay_path = if let Some(ref path) = cli.config {
            if !path.exists() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            Some(path.clone())
        } else {
            let local = PathBuf::from(CONFIG_FILE_NAME);
            if local.exists() { Some(local) } else { None }
        };

        if let Some(path) = overlay_path {
            file_config.merge(FileConfig::load_from_file(&path)?);
        }

        Self::resolve(file_config, cli)
    }

    /// Combine file config, CLI overrides, and defaults into the final
    /// configuration. Fails when required settings are missing or
    /// inconsistent.
    fn resolve(file: FileConfig, cli: &CliConfig) -> Result<Self> {
        let server_file = file.server.unwrap_or_default();
        let database_file = file.database.unwrap_or_default();
        let pipeline_file = file.pipeline.unwrap_or_default();
        let duplication_file = file.duplication.unwrap_or_default();
        let sender_file = file.sender.unwrap_or_default();

        let server = ServerConfig {
            host: cli
                .host
                .clone()
                .or(server_file.host)
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: cli.port.or(server_file.port).unwrap_or(DEFAULT_PORT),
        };

        let backend = cli
            .lookup_backend
            .or(database_file.backend)
            .unwrap_or_default();
        let postgres_url = cli.postgres_url.clone().or(database_file.postgres_url);
        if backend == LookupBackend::Postgres && postgres_url.is_none() {
            anyhow::bail!(
                "The postgres lookup backend requires a connection URL \
                 (--postgres-url or database.postgres_url)"
            );
        }
        let database = DatabaseConfig {
            backend,
            data_dir: cli
                .data_dir
                .clone()
                .or(database_file.data_dir)
                .unwrap_or_else(default_data_dir),
            postgres_url,
        };

        let pipeline = PipelineConfig {
            max_in_flight: cli
                .max_in_flight
                .or(pipeline_file.max_in_flight)
                .unwrap_or(DEFAULT_MAX_IN_FLIGHT),
            stage_timeout: Duration::from_millis(
                cli.stage_timeout_ms
                    .or(pipeline_file.stage_timeout_ms)
                    .unwrap_or(DEFAULT_STAGE_TIMEOUT_MS),
            ),
            queue_capacity: pipeline_file
                .queue_capacity
                .unwrap_or(DEFAULT_QUEUE_CAPACITY),
        };

        let duplication = DuplicationConfig {
            trigger_metric: cli
                .trigger_metric
                .clone()
                .or(duplication_file.trigger_metric)
                .unwrap_or_else(|| DEFAULT_TRIGGER_METRIC.to_string()),
        };

        let endpoint = cli
            .endpoint
            .clone()
            .or(sender_file.endpoint)
            .context("A remote write endpoint is required (--endpoint or sender.endpoint)")?;
        let sender = SenderConfig {
            endpoint,
            max_attempts: sender_file
                .max_attempts
                .unwrap_or(DEFAULT_SENDER_MAX_ATTEMPTS),
            base_delay_ms: sender_file
                .base_delay_ms
                .unwrap_or(DEFAULT_SENDER_BASE_DELAY_MS),
        };

        Ok(Self {
            server,
            database,
            pipeline,
            duplication,
            sender,
        })
    }
}

fn profile_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(APP_DOT_FOLDER).join(CONFIG_FILE_NAME))
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(APP_DOT_FOLDER))
        .unwrap_or_else(|| PathBuf::from(APP_DOT_FOLDER))
}

// =============================================================================
// File Configuration
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    server: Option<ServerFileConfig>,
    database: Option<DatabaseFileConfig>,
    pipeline: Option<PipelineFileConfig>,
    duplication: Option<DuplicationFileConfig>,
    sender: Option<SenderFileConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct ServerFileConfig {
    host: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct DatabaseFileConfig {
    backend: Option<LookupBackend>,
    data_dir: Option<PathBuf>,
    postgres_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct PipelineFileConfig {
    max_in_flight: Option<usize>,
    stage_timeout_ms: Option<u64>,
    queue_capacity: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct DuplicationFileConfig {
    trigger_metric: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct SenderFileConfig {
    endpoint: Option<String>,
    max_attempts: Option<u32>,
    base_delay_ms: Option<u64>,
}

impl FileConfig {
    fn load_from_file(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "Loading config file");
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Merge another FileConfig into this one (other takes precedence)
    fn merge(&mut self, other: FileConfig) {
        if let Some(server) = other.server {
            let current = self.server.get_or_insert_with(Default::default);
            if server.host.is_some() {
                current.host = server.host;
            }
            if server.port.is_some() {
                current.port = server.port;
            }
        }
        if let Some(database) = other.database {
            let current = self.database.get_or_insert_with(Default::default);
            if database.backend.is_some() {
                current.backend = database.backend;
            }
            if database.data_dir.is_some() {
                current.data_dir = database.data_dir;
            }
            if database.postgres_url.is_some() {
                current.postgres_url = database.postgres_url;
            }
        }
        if let Some(pipeline) = other.pipeline {
            let current = self.pipeline.get_or_insert_with(Default::default);
            if pipeline.max_in_flight.is_some() {
                current.max_in_flight = pipeline.max_in_flight;
            }
            if pipeline.stage_timeout_ms.is_some() {
                current.stage_timeout_ms = pipeline.stage_timeout_ms;
            }
            if pipeline.queue_capacity.is_some() {
                current.queue_capacity = pipeline.queue_capacity;
            }
        }
        if let Some(duplication) = other.duplication {
            let current = self.duplication.get_or_insert_with(Default::default);
            if duplication.trigger_metric.is_some() {
                current.trigger_metric = duplication.trigger_metric;
            }
        }
        if let Some(sender) = other.sender {
            let current = self.sender.get_or_insert_with(Default::default);
            if sender.endpoint.is_some() {
                current.endpoint = sender.endpoint;
            }
            if sender.max_attempts.is_some() {
                current.max_attempts = sender.max_attempts;
            }
            if sender.base_delay_ms.is_some() {
                current.base_delay_ms = sender.base_delay_ms;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli_with_endpoint() -> CliConfig {
        CliConfig {
            endpoint: Some("http://collector:9090/api/v1/write".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_resolve_applies_defaults() {
        let config = AppConfig::resolve(FileConfig::default(), &cli_with_endpoint()).unwrap();
        assert_eq!(config.server.host, DEFAULT_HOST);
        assert_eq!(config.server.port, DEFAULT_PORT);
        assert_eq!(config.database.backend, LookupBackend::Sqlite);
        assert_eq!(config.duplication.trigger_metric, DEFAULT_TRIGGER_METRIC);
        assert_eq!(
            config.pipeline.stage_timeout,
            Duration::from_millis(DEFAULT_STAGE_TIMEOUT_MS)
        );
    }

    #[test]
    fn test_resolve_requires_endpoint() {
        let result = AppConfig::resolve(FileConfig::default(), &CliConfig::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_resolve_requires_postgres_url_for_postgres_backend() {
        let cli = CliConfig {
            lookup_backend: Some(LookupBackend::Postgres),
            ..cli_with_endpoint()
        };
        assert!(AppConfig::resolve(FileConfig::default(), &cli).is_err());
    }

    #[test]
    fn test_file_config_parses_json() {
        let json = r#"{
            "server": {"port": 9000},
            "duplication": {"trigger_metric": "checkout_failed_total"},
            "sender": {"endpoint": "http://upstream/api/v1/write", "max_attempts": 5}
        }"#;
        let file: FileConfig = serde_json::from_str(json).unwrap();
        let config = AppConfig::resolve(file, &CliConfig::default()).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.duplication.trigger_metric, "checkout_failed_total");
        assert_eq!(config.sender.max_attempts, 5);
    }

    #[test]
    fn test_cli_overrides_file() {
        let json = r#"{"server": {"port": 9000}}"#;
        let file: FileConfig = serde_json::from_str(json).unwrap();
        let cli = CliConfig {
            port: Some(7000),
            ..cli_with_endpoint()
        };
        let config = AppConfig::resolve(file, &cli).unwrap();
        assert_eq!(config.server.port, 7000);
    }

    #[test]
    fn test_merge_overlay_takes_precedence() {
        let mut base: FileConfig =
            serde_json::from_str(r#"{"server": {"host": "0.0.0.0", "port": 9000}}"#).unwrap();
        let overlay: FileConfig = serde_json::from_str(r#"{"server": {"port": 7000}}"#).unwrap();
        base.merge(overlay);
        let server = base.server.unwrap();
        assert_eq!(server.host.as_deref(), Some("0.0.0.0"));
        assert_eq!(server.port, Some(7000));
    }
}
