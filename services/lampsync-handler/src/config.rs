use std::time::Duration;

use clap::{Parser, ValueEnum};
use lampsync_common::LampSyncError;

/// How queue messages reach the handler.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Consume the queue topic from Kafka and serve `/messages` alongside.
    Kafka,
    /// Only accept messages posted to `/messages`.
    Http,
}

/// Service settings. Every option can also be supplied through its environment variable.
#[derive(Debug, Clone, Parser)]
#[command(name = "lampsync-handler", about = "Syncs lamp status from telemetry to the device registry")]
pub struct Config {
    /// Base URL of the device registry API
    #[arg(
        long,
        env = "REGISTRY_BASE_URL",
        default_value = "https://softwarebackenddeployment2.azurewebsites.net"
    )]
    pub registry_base_url: String,

    #[arg(long, env = "LAMPSYNC_MODE", value_enum, default_value_t = Mode::Kafka)]
    pub mode: Mode,

    #[arg(long, env = "KAFKA_BROKERS", default_value = "localhost:9092")]
    pub kafka_brokers: String,

    /// Queue (topic) carrying telemetry messages
    #[arg(long, env = "QUEUE_NAME", default_value = "iotqueue")]
    pub queue_name: String,

    #[arg(long, env = "KAFKA_GROUP_ID", default_value = "lampsync-handler")]
    pub group_id: String,

    /// Upper bound on messages handled concurrently
    #[arg(long, env = "MAX_IN_FLIGHT", default_value_t = 8)]
    pub max_in_flight: usize,

    /// Same-status updates closer together than this are dropped
    #[arg(long, env = "DEBOUNCE_MS", default_value_t = 1000)]
    pub debounce_ms: u64,

    /// Device type tag that receives the status update
    #[arg(long, env = "TARGET_DEVICE_TYPE", default_value = "Lamp")]
    pub target_device_type: String,

    /// Page size requested from GetAllDevices (always page 1)
    #[arg(long, env = "DEVICE_PAGE_SIZE", default_value_t = 10)]
    pub device_page_size: u32,

    /// Emit JSON log lines
    #[arg(long, env = "LOG_JSON", default_value_t = false)]
    pub log_json: bool,
}

impl Config {
    /// Parses flags and environment (exiting on `--help` or a malformed value),
    /// then checks cross-field constraints.
    pub fn load() -> Result<Self, LampSyncError> {
        Self::parse().validated()
    }

    pub fn validated(mut self) -> Result<Self, LampSyncError> {
        let base = self.registry_base_url.trim().trim_end_matches('/').to_string();
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(LampSyncError::config(format!(
                "REGISTRY_BASE_URL must be an http(s) URL, got {:?}",
                self.registry_base_url
            )));
        }
        self.registry_base_url = base;

        if self.max_in_flight == 0 {
            return Err(LampSyncError::config("MAX_IN_FLIGHT must be at least 1"));
        }
        if self.device_page_size == 0 {
            return Err(LampSyncError::config("DEVICE_PAGE_SIZE must be at least 1"));
        }
        if self.target_device_type.trim().is_empty() {
            return Err(LampSyncError::config("TARGET_DEVICE_TYPE must not be empty"));
        }
        Ok(self)
    }

    pub fn debounce_window(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}
