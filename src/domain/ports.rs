use crate::domain::model::{Dataset, DashboardReport, ReportSettings};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn input_path(&self) -> &str;
    fn output_path(&self) -> &str;
    /// 報表日期未決定時回傳 `MissingConfigError`
    fn report_settings(&self) -> Result<ReportSettings>;
    fn export_enabled(&self) -> bool;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Dataset>;
    async fn transform(&self, data: Dataset) -> Result<DashboardReport>;
    /// 輸出報表；未啟用匯出時回傳 `None`
    async fn load(&self, report: &DashboardReport) -> Result<Option<String>>;
}
