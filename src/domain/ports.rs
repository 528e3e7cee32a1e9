use crate::domain::model::{AvailableMonth, DashboardLoad, DetailKey, Period, ServiceDetail};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Backend endpoints consumed by the dashboard.
#[async_trait]
pub trait DashboardApi: Send + Sync {
    async fn available_months(&self) -> Result<Vec<AvailableMonth>>;
    async fn dashboard_data(&self, period: Period) -> Result<DashboardLoad>;
    async fn service_details(&self, key: &DetailKey) -> Result<Vec<ServiceDetail>>;
    async fn update_rework(&self, os_id: i64, rework: bool) -> Result<()>;
}

pub trait ConfigProvider: Send + Sync {
    fn base_url(&self) -> &str;
    fn request_timeout(&self) -> Duration;
    fn viewport_width(&self) -> u32;
    fn resize_debounce(&self) -> Duration;
    fn extra_headers(&self) -> Vec<(String, String)> {
        Vec::new()
    }
}

/// Destination for exported files.
pub trait Storage: Send + Sync {
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}
