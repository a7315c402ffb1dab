//! Core application

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;

use crate::api::ApiServer;
use crate::core::cli::{self, CliConfig, Commands};
use crate::core::config::AppConfig;
use crate::core::constants::{APP_NAME_LOWER, ENV_LOG};
use crate::core::shutdown::ShutdownService;
use crate::data::LookupService;
use crate::domain::{Forwarder, MetadataEnrichment, RelayPipeline, ViewDuplication};

pub struct CoreApp {
    pub shutdown: ShutdownService,
    pub config: AppConfig,
    pub lookups: Arc<LookupService>,
}

impl CoreApp {
    /// Run the application with CLI argument parsing
    pub async fn run() -> Result<()> {
        dotenvy::dotenv().ok();
        Self::init_logging();

        tracing::debug!("Application starting");

        let (cli_config, command) = cli::parse();

        match command {
            Some(Commands::Start) | None => {}
        }

        let app = Self::init(&cli_config).await?;
        Self::start_server(app).await
    }

    async fn init(cli: &CliConfig) -> Result<Self> {
        let config = AppConfig::load(cli)?;

        let lookups = Arc::new(
            LookupService::init(&config.database)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to initialize lookup store: {}", e))?,
        );
        tracing::debug!(backend = %lookups.backend(), "Lookup store initialized");

        let shutdown = ShutdownService::new(lookups.clone());

        Ok(Self {
            shutdown,
            config,
            lookups,
        })
    }

    fn init_logging() {
        let default_filter = format!("info,{}=info", APP_NAME_LOWER);

        let filter = std::env::var(ENV_LOG)
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or(default_filter);

        tracing_subscriber::fmt()
            .with_target(false)
            .with_thread_ids(false)
            .with_level(true)
            .with_ansi(true)
            .compact()
            .with_env_filter(filter)
            .init();
    }

    async fn start_server(app: Self) -> Result<()> {
        // Install signal handlers FIRST (before any blocking calls)
        app.shutdown.install_signal_handlers();

        let (queue_tx, queue_rx) = mpsc::channel(app.config.pipeline.queue_capacity);

        let pipeline = RelayPipeline::new(
            MetadataEnrichment::new(app.lookups.metadata_store()),
            ViewDuplication::new(
                app.lookups.rule_store(),
                app.config.duplication.trigger_metric.clone(),
            ),
            Arc::new(Forwarder::new(&app.config.sender)),
            &app.config.pipeline,
        );

        app.shutdown
            .register(pipeline.start(queue_rx, app.shutdown.subscribe()))
            .await;

        tracing::info!(
            endpoint = %app.config.sender.endpoint,
            trigger_metric = %app.config.duplication.trigger_metric,
            max_in_flight = app.config.pipeline.max_in_flight,
            "Relay pipeline started"
        );

        let server = ApiServer::new(
            app.config.server.clone(),
            queue_tx,
            app.shutdown.clone(),
        );
        server.start().await?;

        app.shutdown.shutdown().await;

        Ok(())
    }
}
