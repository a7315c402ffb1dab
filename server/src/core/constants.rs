// =============================================================================
// Application Identity
// =============================================================================

/// Application name in title case (for display)
pub const APP_NAME: &str = "Viaduct";

/// Application name in lowercase (for paths and identifiers)
pub const APP_NAME_LOWER: &str = "viaduct";

/// Unix-style dotfile folder name
pub const APP_DOT_FOLDER: &str = ".viaduct";

// =============================================================================
// Configuration Files
// =============================================================================

/// Config file name
pub const CONFIG_FILE_NAME: &str = "viaduct.json";

/// Environment variable for config file path
pub const ENV_CONFIG: &str = "VIADUCT_CONFIG";

// =============================================================================
// Environment Variables - Server
// =============================================================================

/// Environment variable for server host
pub const ENV_HOST: &str = "VIADUCT_HOST";

/// Environment variable for server port
pub const ENV_PORT: &str = "VIADUCT_PORT";

/// Environment variable for log level/filter
pub const ENV_LOG: &str = "VIADUCT_LOG";

// =============================================================================
// Environment Variables - Lookup stores
// =============================================================================

/// Environment variable for the lookup store backend (sqlite or postgres)
pub const ENV_LOOKUP_BACKEND: &str = "VIADUCT_LOOKUP_BACKEND";

/// Environment variable for the SQLite data directory
pub const ENV_DATA_DIR: &str = "VIADUCT_DATA_DIR";

/// Environment variable for the PostgreSQL connection URL
pub const ENV_POSTGRES_URL: &str = "VIADUCT_POSTGRES_URL";

// =============================================================================
// Environment Variables - Pipeline & Sender
// =============================================================================

/// Environment variable for the duplication trigger metric
pub const ENV_TRIGGER_METRIC: &str = "VIADUCT_TRIGGER_METRIC";

/// Environment variable for max concurrent batch invocations
pub const ENV_MAX_IN_FLIGHT: &str = "VIADUCT_MAX_IN_FLIGHT";

/// Environment variable for the per-stage timeout in milliseconds
pub const ENV_STAGE_TIMEOUT_MS: &str = "VIADUCT_STAGE_TIMEOUT_MS";

/// Environment variable for the remote write endpoint
pub const ENV_SENDER_ENDPOINT: &str = "VIADUCT_SENDER_ENDPOINT";

// =============================================================================
// Server Defaults
// =============================================================================

/// Default server host
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default server port
pub const DEFAULT_PORT: u16 = 9924;

// =============================================================================
// Pipeline Defaults
// =============================================================================

/// Default max concurrent batch invocations
pub const DEFAULT_MAX_IN_FLIGHT: usize = 16;

/// Default per-stage timeout in milliseconds
pub const DEFAULT_STAGE_TIMEOUT_MS: u64 = 5_000;

/// Default capacity of the receive queue between the HTTP surface and the
/// pipeline
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// Default metric name that makes a series subject to view duplication
pub const DEFAULT_TRIGGER_METRIC: &str = "order_create_failed_total";

// =============================================================================
// Sender Defaults
// =============================================================================

/// Default maximum delivery attempts per batch
pub const DEFAULT_SENDER_MAX_ATTEMPTS: u32 = 3;

/// Default base delay in milliseconds for sender backoff
pub const DEFAULT_SENDER_BASE_DELAY_MS: u64 = 200;

/// Content type for Remote Write 2.0 request bodies
pub const REMOTE_WRITE_CONTENT_TYPE: &str =
    "application/x-protobuf;proto=io.prometheus.write.v2.Request";

/// Remote write protocol version header value
pub const REMOTE_WRITE_VERSION: &str = "2.0.0";

/// User agent sent on outbound remote write requests
pub const SENDER_USER_AGENT: &str = concat!("viaduct/", env!("CARGO_PKG_VERSION"));

// =============================================================================
// Reserved Label Names
// =============================================================================

/// Enrichment lookup key
pub const LABEL_POD: &str = "pod";

/// Metric identity, duplication trigger
pub const LABEL_METRIC_NAME: &str = "__name__";

/// Enrichment-owned field
pub const LABEL_SERVICE: &str = "service";

/// Enrichment-owned field
pub const LABEL_TEAM: &str = "team";

/// Enrichment-owned field
pub const LABEL_TIER: &str = "tier";

/// Duplication-owned field
pub const LABEL_VIEW: &str = "view";

// =============================================================================
// SQLite
// =============================================================================

/// SQLite database file name
pub const SQLITE_DB_FILENAME: &str = "viaduct.db";

/// Maximum SQLite pool connections
pub const SQLITE_MAX_CONNECTIONS: u32 = 5;

/// SQLite busy timeout in seconds
pub const SQLITE_BUSY_TIMEOUT_SECS: u64 = 30;

/// SQLite page cache size (negative = KiB)
pub const SQLITE_CACHE_SIZE: &str = "-64000";

// =============================================================================
// PostgreSQL
// =============================================================================

/// Maximum PostgreSQL pool connections
pub const POSTGRES_MAX_CONNECTIONS: u32 = 5;

/// PostgreSQL connection acquire timeout in seconds
pub const POSTGRES_ACQUIRE_TIMEOUT_SECS: u64 = 10;

// =============================================================================
// HTTP Surface
// =============================================================================

/// Retry-After value returned when the receive queue is full
pub const BACKPRESSURE_RETRY_AFTER_SECS: u64 = 1;

// =============================================================================
// Shutdown
// =============================================================================

/// Maximum time to wait for background tasks during shutdown
pub const SHUTDOWN_TIMEOUT_SECS: u64 = 30;
