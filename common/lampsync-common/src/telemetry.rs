use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use time::{
    format_description::well_known::{Iso8601, Rfc3339},
    OffsetDateTime, PrimitiveDateTime,
};

/// `led_status` value that means "on". Every other value means "off".
pub const LED_ON: i64 = 1;

/// One telemetry event as exported by the IoT application onto the queue.
///
/// Only [`Telemetry::led_status`] drives behaviour; the rest is carried for logging.
/// Every field is optional, unknown fields are ignored, and PascalCase keys are
/// accepted alongside camelCase.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryEnvelope {
    #[serde(default, alias = "ApplicationId", skip_serializing_if = "Option::is_none")]
    pub application_id: Option<String>,
    #[serde(default, alias = "DeviceId", skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,

    /// `None` when absent or not a recognisable timestamp; never fails the message.
    #[serde(
        default,
        alias = "EnqueuedTime",
        deserialize_with = "lenient_timestamp",
        serialize_with = "time::serde::rfc3339::option::serialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub enqueued_time: Option<OffsetDateTime>,

    /// Opaque enrichment data; never interpreted.
    #[serde(default, alias = "Enrichments", skip_serializing_if = "Value::is_null")]
    pub enrichments: Value,

    #[serde(default, alias = "MessageProperties", skip_serializing_if = "Option::is_none")]
    pub message_properties: Option<MessageProperties>,
    #[serde(default, alias = "MessageSource", skip_serializing_if = "Option::is_none")]
    pub message_source: Option<String>,
    #[serde(default, alias = "Schema", skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    #[serde(default, alias = "Telemetry", skip_serializing_if = "Option::is_none")]
    pub telemetry: Option<Telemetry>,
    #[serde(default, alias = "TemplateId", skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,
}

impl TelemetryEnvelope {
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Derived lamp status, or `None` when the telemetry section is missing.
    pub fn led_on(&self) -> Option<bool> {
        self.telemetry.as_ref().map(Telemetry::is_on)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageProperties {
    #[serde(
        default,
        rename = "iothub-creation-time-utc",
        alias = "iothub_creation_time_utc",
        skip_serializing_if = "Option::is_none"
    )]
    pub iothub_creation_time_utc: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Telemetry {
    #[serde(default, alias = "LedStatus", alias = "Led_Status")]
    pub led_status: i64,
}

impl Telemetry {
    pub fn is_on(&self) -> bool {
        self.led_status == LED_ON
    }
}

/// Parses RFC 3339, falling back to an offset-less ISO 8601 timestamp read as UTC.
pub fn parse_timestamp(raw: &str) -> Option<OffsetDateTime> {
    OffsetDateTime::parse(raw, &Rfc3339).ok().or_else(|| {
        PrimitiveDateTime::parse(raw, &Iso8601::DEFAULT)
            .ok()
            .map(PrimitiveDateTime::assume_utc)
    })
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<OffsetDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(Value::as_str).and_then(parse_timestamp))
}
