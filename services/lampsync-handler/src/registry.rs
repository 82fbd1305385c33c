use async_trait::async_trait;
use lampsync_common::{DeviceListResponse, LampSyncError, UpdateDeviceCommand};
use tracing::info;

/// The external device registry: one paged read, one partial update.
#[async_trait]
pub trait DeviceRegistry: Send + Sync {
    /// Non-success statuses come back as [`LampSyncError::UpstreamStatus`].
    async fn list_devices(&self, page_number: u32, page_size: u32) -> Result<DeviceListResponse, LampSyncError>;

    async fn update_device(&self, command: &UpdateDeviceCommand) -> Result<(), LampSyncError>;
}

/// [`DeviceRegistry`] over the registry's REST API. No retries and no timeouts
/// beyond the client defaults; failures surface to the caller.
#[derive(Clone)]
pub struct HttpDeviceRegistry {
    http: reqwest::Client,
    base_url: String,
}

impl HttpDeviceRegistry {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    pub fn list_url(&self, page_number: u32, page_size: u32) -> String {
        format!(
            "{}/api/v1/Device/GetAllDevices?PageNumber={page_number}&PageSize={page_size}",
            self.base_url
        )
    }

    pub fn update_url(&self, device_id: i64) -> String {
        format!("{}/api/v1/Device/UpdateDevice?id={device_id}", self.base_url)
    }
}

#[async_trait]
impl DeviceRegistry for HttpDeviceRegistry {
    async fn list_devices(&self, page_number: u32, page_size: u32) -> Result<DeviceListResponse, LampSyncError> {
        let url = self.list_url(page_number, page_size);
        info!(%url, "fetching devices");

        let resp = self.http.get(&url).send().await?;
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(LampSyncError::fetch_rejected(status.as_u16(), body));
        }

        Ok(serde_json::from_str(&body)?)
    }

    async fn update_device(&self, command: &UpdateDeviceCommand) -> Result<(), LampSyncError> {
        let url = self.update_url(command.id);
        info!(%url, "sending device update");

        let resp = self.http.put(&url).json(command).send().await?;
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(LampSyncError::update_rejected(status.as_u16(), body));
        }
        Ok(())
    }
}

#[async_trait]
impl<T: DeviceRegistry + ?Sized> DeviceRegistry for std::sync::Arc<T> {
    async fn list_devices(&self, page_number: u32, page_size: u32) -> Result<DeviceListResponse, LampSyncError> {
        (**self).list_devices(page_number, page_size).await
    }

    async fn update_device(&self, command: &UpdateDeviceCommand) -> Result<(), LampSyncError> {
        (**self).update_device(command).await
    }
}
