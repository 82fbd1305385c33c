pub mod device;
pub mod telemetry;

pub use device::{Device, DeviceListResponse, UpdateDeviceCommand};
pub use telemetry::{parse_timestamp, MessageProperties, Telemetry, TelemetryEnvelope};

/// Stable numeric codes attached to every [`LampSyncError`].
///
/// Codes are grouped by concern so log queries can filter on a range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[repr(u32)]
pub enum ErrorCode {
    ConfigInvalid = 1001,
    NetworkError = 7001,
    ResponseUndecodable = 7101,
    RegistryFetchFailed = 7201,
    RegistryUpdateFailed = 7202,
    QueueError = 8001,
}

#[derive(thiserror::Error, Debug)]
pub enum LampSyncError {
    #[error("Configuration error ({code:?}): {message}")]
    Config { code: ErrorCode, message: String },

    #[error("Network error ({code:?}): {source}")]
    Network { code: ErrorCode, source: reqwest::Error },

    #[error("Serialization error ({code:?}): {source}")]
    Serialization { code: ErrorCode, source: serde_json::Error },

    #[error("Registry returned {status} ({code:?}): {body}")]
    UpstreamStatus { code: ErrorCode, status: u16, body: String },

    #[error("Queue error ({code:?}): {message}")]
    Queue { code: ErrorCode, message: String },
}

impl LampSyncError {
    pub fn code(&self) -> ErrorCode {
        match self {
            LampSyncError::Config { code, .. } => *code,
            LampSyncError::Network { code, .. } => *code,
            LampSyncError::Serialization { code, .. } => *code,
            LampSyncError::UpstreamStatus { code, .. } => *code,
            LampSyncError::Queue { code, .. } => *code,
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            code: ErrorCode::ConfigInvalid,
            message: msg.into(),
        }
    }

    pub fn queue(msg: impl Into<String>) -> Self {
        Self::Queue {
            code: ErrorCode::QueueError,
            message: msg.into(),
        }
    }

    pub fn fetch_rejected(status: u16, body: impl Into<String>) -> Self {
        Self::UpstreamStatus {
            code: ErrorCode::RegistryFetchFailed,
            status,
            body: body.into(),
        }
    }

    pub fn update_rejected(status: u16, body: impl Into<String>) -> Self {
        Self::UpstreamStatus {
            code: ErrorCode::RegistryUpdateFailed,
            status,
            body: body.into(),
        }
    }
}

impl From<reqwest::Error> for LampSyncError {
    fn from(value: reqwest::Error) -> Self {
        Self::Network {
            code: ErrorCode::NetworkError,
            source: value,
        }
    }
}

impl From<serde_json::Error> for LampSyncError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization {
            code: ErrorCode::ResponseUndecodable,
            source: value,
        }
    }
}
