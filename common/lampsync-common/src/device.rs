use serde::{Deserialize, Serialize};

/// A controllable entity owned by the device registry.
///
/// The registry may emit camelCase or PascalCase names, so both are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    #[serde(alias = "Id")]
    pub id: i64,
    #[serde(default, alias = "Name")]
    pub name: Option<String>,
    #[serde(default, rename = "type", alias = "Type")]
    pub device_type: Option<String>,
    #[serde(default, alias = "Status")]
    pub status: bool,
    #[serde(default, alias = "RoomId")]
    pub room_id: i64,
}

impl Device {
    pub fn is_type(&self, device_type: &str) -> bool {
        self.device_type.as_deref() == Some(device_type)
    }
}

/// Paging envelope returned by `GetAllDevices`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceListResponse {
    #[serde(default, alias = "PageNumber")]
    pub page_number: i64,
    #[serde(default, alias = "PageSize")]
    pub page_size: i64,
    #[serde(default, alias = "Succeeded")]
    pub succeeded: bool,
    #[serde(default, alias = "Message")]
    pub message: Option<String>,
    #[serde(default, alias = "Errors")]
    pub errors: Option<Vec<String>>,
    #[serde(default, alias = "Data")]
    pub data: Option<Vec<Device>>,
}

impl DeviceListResponse {
    /// Devices on this page; empty when the registry sent no data array.
    pub fn devices(&self) -> &[Device] {
        self.data.as_deref().unwrap_or_default()
    }
}

/// Body of `UpdateDevice`. Only the status changes; the name is echoed back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateDeviceCommand {
    pub id: i64,
    pub name: Option<String>,
    pub status: bool,
}

impl UpdateDeviceCommand {
    pub fn set_status(device: &Device, status: bool) -> Self {
        Self {
            id: device.id,
            name: device.name.clone(),
            status,
        }
    }
}
