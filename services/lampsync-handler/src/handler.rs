use lampsync_common::{LampSyncError, TelemetryEnvelope, UpdateDeviceCommand};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info, info_span, Instrument};
use uuid::Uuid;

use crate::{config::Config, debounce::DebounceGate, registry::DeviceRegistry, selection::select_target};

const FIRST_PAGE: u32 = 1;
const DEFAULT_PAGE_SIZE: u32 = 10;
const DEFAULT_TARGET_TYPE: &str = "Lamp";

/// Field looked up when a message fails to deserialize.
const LED_STATUS_POINTER: &str = "/telemetry/led_status";

/// Result of one message that did not fail outright.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    Updated { device_id: i64, status: bool },
    Skipped { reason: SkipReason },
}

/// Why a message was dropped without touching the registry's device state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    MalformedMessage,
    MissingTelemetry,
    Debounced,
    FetchRejected { status: u16 },
    NoDevices,
    NoMatchingDevice,
}

impl Outcome {
    fn skipped(reason: SkipReason) -> Self {
        Self::Skipped { reason }
    }
}

/// Turns one telemetry message into at most one registry update.
///
/// Shared by all in-flight messages; the only cross-message state is the
/// debounce gate.
pub struct TelemetryHandler<R> {
    registry: R,
    debounce: DebounceGate,
    target_type: String,
    page_size: u32,
}

impl<R: DeviceRegistry> TelemetryHandler<R> {
    pub fn new(registry: R, debounce: DebounceGate) -> Self {
        Self {
            registry,
            debounce,
            target_type: DEFAULT_TARGET_TYPE.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn from_config(registry: R, cfg: &Config) -> Self {
        Self::new(registry, DebounceGate::new(cfg.debounce_window()))
            .with_target_type(cfg.target_device_type.clone())
            .with_page_size(cfg.device_page_size)
    }

    pub fn with_target_type(mut self, target_type: impl Into<String>) -> Self {
        self.target_type = target_type.into();
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn debounce(&self) -> &DebounceGate {
        &self.debounce
    }

    /// Handles one raw queue message.
    ///
    /// Anything that stops the update early is logged and returned as
    /// [`Outcome::Skipped`]. Transport failures and a rejected update are
    /// returned as errors so the host can apply its redelivery policy.
    pub async fn handle(&self, raw: &str) -> Result<Outcome, LampSyncError> {
        let span = info_span!("invocation", invocation_id = %Uuid::new_v4());
        self.process(raw).instrument(span).await
    }

    async fn process(&self, raw: &str) -> Result<Outcome, LampSyncError> {
        info!(raw, "received message");

        let envelope = match TelemetryEnvelope::from_json(raw) {
            Ok(envelope) => envelope,
            Err(err) => {
                error!(
                    error = %err,
                    line = err.line(),
                    column = err.column(),
                    "failed to deserialize message"
                );
                log_led_status_hint(raw);
                return Ok(Outcome::skipped(SkipReason::MalformedMessage));
            }
        };
        debug!(envelope = ?envelope, "deserialized message");

        let Some(led_on) = envelope.led_on() else {
            error!("telemetry section is missing, message is invalid");
            return Ok(Outcome::skipped(SkipReason::MissingTelemetry));
        };
        info!(
            device_id = envelope.device_id.as_deref().unwrap_or("-"),
            enqueued_time = ?envelope.enqueued_time,
            led_on,
            "derived lamp status"
        );

        if !self.debounce.try_accept(led_on) {
            info!(
                led_on,
                window = ?self.debounce.window(),
                "status unchanged within debounce window, no update"
            );
            return Ok(Outcome::skipped(SkipReason::Debounced));
        }

        let listing = match self.registry.list_devices(FIRST_PAGE, self.page_size).await {
            Ok(listing) => listing,
            Err(LampSyncError::UpstreamStatus { status, body, .. }) => {
                error!(status, %body, "failed to fetch devices");
                return Ok(Outcome::skipped(SkipReason::FetchRejected { status }));
            }
            Err(err) => {
                error!(code = ?err.code(), error = %err, "device fetch failed");
                return Err(err);
            }
        };

        let devices = listing.devices();
        if devices.is_empty() {
            error!(succeeded = listing.succeeded, message = ?listing.message, "no devices found");
            return Ok(Outcome::skipped(SkipReason::NoDevices));
        }

        let Some(target) = select_target(devices, &self.target_type) else {
            error!(
                device_type = %self.target_type,
                candidates = devices.len(),
                "no matching device found"
            );
            return Ok(Outcome::skipped(SkipReason::NoMatchingDevice));
        };
        info!(
            device_id = target.id,
            name = ?target.name,
            room_id = target.room_id,
            "selected target device"
        );

        let command = UpdateDeviceCommand::set_status(target, led_on);
        let body = serde_json::to_string(&command)?;
        info!(command = %body, "update command");

        if let Err(err) = self.registry.update_device(&command).await {
            match &err {
                LampSyncError::UpstreamStatus { status, body, .. } => {
                    error!(device_id = command.id, status, %body, "failed to update device");
                }
                other => {
                    error!(
                        device_id = command.id,
                        code = ?other.code(),
                        error = %other,
                        "failed to update device"
                    );
                }
            }
            return Err(err);
        }

        info!(device_id = command.id, status = led_on, "device updated");
        Ok(Outcome::Updated {
            device_id: command.id,
            status: led_on,
        })
    }
}

/// Diagnostic only: reports the raw `led_status` of a message that failed typed
/// parsing. Its own failures are logged and dropped.
fn log_led_status_hint(raw: &str) {
    match serde_json::from_str::<Value>(raw) {
        Ok(value) => {
            let hint = value
                .pointer(LED_STATUS_POINTER)
                .map(Value::to_string)
                .unwrap_or_else(|| "null".to_string());
            error!(led_status = %hint, "problematic property");
        }
        Err(err) => error!(error = %err, "could not re-parse message for led_status"),
    }
}
