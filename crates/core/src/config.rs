use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

fn env_u16(key: &str, default: u16) -> u16 {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn flag(v: &Option<String>) -> &'static str {
    if v.is_some() {
        "(set)"
    } else {
        "(unset)"
    }
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub fetcher: FetcherConfig,
    pub telegram: TelegramConfig,
    pub sink: SinkConfig,
    pub schedule: ScheduleConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    pub fn from_env() -> Self {
        Self {
            server: ServerConfig::from_env(),
            store: StoreConfig::from_env(),
            fetcher: FetcherConfig::from_env(),
            telegram: TelegramConfig::from_env(),
            sink: SinkConfig::from_env(),
            schedule: ScheduleConfig::from_env(),
        }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded:");
        tracing::info!("  server:   host={}, port={}", self.server.host, self.server.port);
        tracing::info!(
            "  store:    backend={}, path={}",
            self.store.backend,
            self.store.path.display()
        );
        tracing::info!(
            "  fetcher:  url={}, timeout={}s",
            self.fetcher.base_url,
            self.fetcher.timeout_secs
        );
        tracing::info!(
            "  telegram: api_id={}, api_hash={}, session={}",
            flag(&self.telegram.api_id),
            flag(&self.telegram.api_hash),
            flag(&self.telegram.session_str)
        );
        tracing::info!("  sink:     timescale={}", flag(&self.sink.timescale_connection));
        tracing::info!(
            "  schedule: cron={}",
            self.schedule.cron.as_deref().unwrap_or("(disabled)")
        );
    }

    /// Return a redacted view safe for API responses (no secrets).
    pub fn redacted_summary(&self) -> serde_json::Value {
        serde_json::json!({
            "server": { "host": self.server.host, "port": self.server.port },
            "store": { "backend": self.store.backend, "path": self.store.path },
            "fetcher": {
                "base_url": self.fetcher.base_url,
                "timeout_secs": self.fetcher.timeout_secs,
            },
            "telegram": { "configured": self.telegram.is_configured() },
            "sink": { "timescale": self.sink.timescale_connection.is_some() },
            "schedule": { "cron": self.schedule.cron },
        })
    }
}

// ── Server ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    fn from_env() -> Self {
        Self {
            host: env_or("HOST", "0.0.0.0"),
            port: env_u16("PORT", 3001),
        }
    }
}

// ── Pointer store ─────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// "json" (durable file) or "memory" (ephemeral).
    pub backend: String,
    pub path: PathBuf,
}

impl StoreConfig {
    fn from_env() -> Self {
        Self {
            backend: env_or("POINTERS_BACKEND", "json"),
            path: PathBuf::from(env_or("POINTERS_PATH", "data/pointers.json")),
        }
    }
}

// ── Fetcher ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetcherConfig {
    /// Base URL of the fetcher container endpoint.
    pub base_url: String,
    /// Request timeout. The container can sleep when idle and a large
    /// backlog can take minutes to drain, so this is the tick budget,
    /// not a liveness probe.
    pub timeout_secs: u64,
}

impl FetcherConfig {
    fn from_env() -> Self {
        Self {
            base_url: env_or("FETCHER_URL", "http://localhost:8080"),
            timeout_secs: env_u64("FETCHER_TIMEOUT_SECS", 900),
        }
    }
}

// ── Telegram pass-through ─────────────────────────────────────

/// Credentials forwarded verbatim into the fetcher container's environment
/// by the deployment layer. Never inspected here; never logged in full.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    pub api_id: Option<String>,
    pub api_hash: Option<String>,
    pub session_str: Option<String>,
}

impl TelegramConfig {
    fn from_env() -> Self {
        Self {
            api_id: env_opt("TELEGRAM_API_ID"),
            api_hash: env_opt("TELEGRAM_API_HASH"),
            session_str: env_opt("TELEGRAM_SESSION_STR"),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_id.is_some() && self.api_hash.is_some() && self.session_str.is_some()
    }
}

// ── Sink pass-through ─────────────────────────────────────────

/// Connection string for the fetcher's own sink. Pass-through only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    pub timescale_connection: Option<String>,
}

impl SinkConfig {
    fn from_env() -> Self {
        Self {
            timescale_connection: env_opt("TIMESCALE_CONNECTION"),
        }
    }
}

// ── Schedule ──────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Cron expression for the internal scheduler (5- or 6-field).
    /// Unset disables the internal loop; an external scheduler can still
    /// drive ticks over HTTP.
    pub cron: Option<String>,
}

impl ScheduleConfig {
    fn from_env() -> Self {
        Self {
            cron: env_opt("SCHEDULE_CRON"),
        }
    }
}
