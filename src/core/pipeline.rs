use crate::core::loader::parse_transactions;
use crate::core::report::{breakdown_table, build_report, ticket_type_table};
use crate::core::{ConfigProvider, DashboardReport, Dataset, Pipeline, Storage};
use crate::utils::error::Result;
use std::io::Write;
use zip::write::{FileOptions, ZipWriter};

pub const REPORT_ARCHIVE: &str = "dashboard_report.zip";

pub struct DashboardPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
}

impl<S: Storage, C: ConfigProvider> DashboardPipeline<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        Self { storage, config }
    }

    fn archive_path(&self) -> String {
        format!("{}/{}", self.config.output_path().trim_end_matches('/'), REPORT_ARCHIVE)
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for DashboardPipeline<S, C> {
    async fn extract(&self) -> Result<Dataset> {
        tracing::debug!("Reading sales file: {}", self.config.input_path());
        let bytes = self.storage.read_file(self.config.input_path()).await?;
        tracing::debug!("Read {} bytes", bytes.len());

        let dataset = parse_transactions(&bytes)?;
        if dataset.is_empty() {
            tracing::warn!("Sales file contains no transactions");
        }
        Ok(dataset)
    }

    async fn transform(&self, data: Dataset) -> Result<DashboardReport> {
        let settings = self.config.report_settings()?;
        tracing::debug!(
            "Summarising {} transactions as of {} (windows {:?}, period {})",
            data.len(),
            settings.as_of,
            settings.windows,
            settings.period.name()
        );
        build_report(&data, &settings)
    }

    async fn load(&self, report: &DashboardReport) -> Result<Option<String>> {
        if !self.config.export_enabled() {
            tracing::debug!("Export disabled, skipping archive");
            return Ok(None);
        }

        let zip_data = {
            let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));

            zip.start_file::<_, ()>("breakdown.csv", FileOptions::default())?;
            zip.write_all(breakdown_table(&report.breakdown, b',')?.as_bytes())?;

            zip.start_file::<_, ()>("breakdown.tsv", FileOptions::default())?;
            zip.write_all(breakdown_table(&report.breakdown, b'\t')?.as_bytes())?;

            zip.start_file::<_, ()>("ticket_types.csv", FileOptions::default())?;
            zip.write_all(ticket_type_table(&report.ticket_types)?.as_bytes())?;

            zip.start_file::<_, ()>("summary.json", FileOptions::default())?;
            zip.write_all(serde_json::to_string_pretty(report)?.as_bytes())?;

            let cursor = zip.finish()?;
            cursor.into_inner()
        };

        let path = self.archive_path();
        tracing::debug!("Writing report archive ({} bytes) to {}", zip_data.len(), path);
        self.storage.write_file(&path, &zip_data).await?;

        Ok(Some(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{ReportPeriod, ReportSettings};
    use crate::utils::error::EtlError;
    use chrono::NaiveDateTime;
    use std::collections::HashMap;
    use std::io::Read;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    const SALES_CSV: &str = "Payment Date,Order Total,Ticket ID,Ticket Type\n\
                             2024-01-01 00:00:00,10,1,GA\n\
                             2024-01-02 00:00:00,20,2,VIP\n";

    #[derive(Clone)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        fn with_file(path: &str, data: &str) -> Self {
            let mut files = HashMap::new();
            files.insert(path.to_string(), data.as_bytes().to_vec());
            Self {
                files: Arc::new(Mutex::new(files)),
            }
        }

        async fn get_file(&self, path: &str) -> Option<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned()
        }
    }

    impl Storage for MockStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned().ok_or_else(|| {
                EtlError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ))
            })
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            Ok(())
        }
    }

    struct MockConfig {
        input_path: String,
        output_path: String,
        export: bool,
        period: ReportPeriod,
        as_of: Option<NaiveDateTime>,
    }

    impl MockConfig {
        fn new(input_path: &str) -> Self {
            Self {
                input_path: input_path.to_string(),
                output_path: "test_output".to_string(),
                export: true,
                period: ReportPeriod::Day,
                as_of: NaiveDateTime::parse_from_str("2024-01-02 00:00:00", "%Y-%m-%d %H:%M:%S").ok(),
            }
        }
    }

    impl ConfigProvider for MockConfig {
        fn input_path(&self) -> &str {
            &self.input_path
        }

        fn output_path(&self) -> &str {
            &self.output_path
        }

        fn report_settings(&self) -> Result<ReportSettings> {
            let as_of = self.as_of.ok_or_else(|| EtlError::MissingConfigError {
                field: "as_of".to_string(),
            })?;
            Ok(ReportSettings {
                windows: vec![1, 30],
                block_days: 30,
                block_count: 3,
                period: self.period,
                as_of,
            })
        }

        fn export_enabled(&self) -> bool {
            self.export
        }
    }

    #[tokio::test]
    async fn test_extract_parses_sales_file() {
        let storage = MockStorage::with_file("sales.csv", SALES_CSV);
        let pipeline = DashboardPipeline::new(storage, MockConfig::new("sales.csv"));

        let dataset = pipeline.extract().await.unwrap();
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.records()[1].ticket_type, "VIP");
    }

    #[tokio::test]
    async fn test_extract_missing_file() {
        let storage = MockStorage::with_file("sales.csv", SALES_CSV);
        let pipeline = DashboardPipeline::new(storage, MockConfig::new("other.csv"));

        assert!(matches!(pipeline.extract().await, Err(EtlError::IoError(_))));
    }

    #[tokio::test]
    async fn test_transform_builds_report() {
        let storage = MockStorage::with_file("sales.csv", SALES_CSV);
        let mut config = MockConfig::new("sales.csv");
        config.period = ReportPeriod::Month;
        let pipeline = DashboardPipeline::new(storage, config);

        let dataset = pipeline.extract().await.unwrap();
        let report = pipeline.transform(dataset).await.unwrap();

        assert_eq!(report.summaries[0].summary.sales, 20.0);
        assert_eq!(report.blocks.len(), 3);
        assert_eq!(report.breakdown.len(), 1);
        assert_eq!(report.breakdown[0].label, "2024-01");
        assert_eq!(report.breakdown[0].ticket_count, 2);
    }

    #[tokio::test]
    async fn test_transform_without_report_date_fails() {
        let storage = MockStorage::with_file("sales.csv", SALES_CSV);
        let mut config = MockConfig::new("sales.csv");
        config.as_of = None;
        let pipeline = DashboardPipeline::new(storage, config);

        let dataset = pipeline.extract().await.unwrap();
        assert!(matches!(
            pipeline.transform(dataset).await,
            Err(EtlError::MissingConfigError { .. })
        ));
    }

    #[tokio::test]
    async fn test_load_writes_archive() {
        let storage = MockStorage::with_file("sales.csv", SALES_CSV);
        let pipeline = DashboardPipeline::new(storage.clone(), MockConfig::new("sales.csv"));

        let dataset = pipeline.extract().await.unwrap();
        let report = pipeline.transform(dataset).await.unwrap();
        let path = pipeline.load(&report).await.unwrap();

        assert_eq!(path.as_deref(), Some("test_output/dashboard_report.zip"));

        let zip_data = storage.get_file("test_output/dashboard_report.zip").await.unwrap();
        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(zip_data)).unwrap();
        assert_eq!(archive.len(), 4);

        let mut summary = String::new();
        archive
            .by_name("summary.json")
            .unwrap()
            .read_to_string(&mut summary)
            .unwrap();
        let json: serde_json::Value = serde_json::from_str(&summary).unwrap();
        assert_eq!(json["record_count"], 2);
        assert_eq!(json["summaries"][0]["summary"]["trend"], "increased");
    }

    #[tokio::test]
    async fn test_load_skipped_when_export_disabled() {
        let storage = MockStorage::with_file("sales.csv", SALES_CSV);
        let mut config = MockConfig::new("sales.csv");
        config.export = false;
        let pipeline = DashboardPipeline::new(storage.clone(), config);

        let dataset = pipeline.extract().await.unwrap();
        let report = pipeline.transform(dataset).await.unwrap();

        assert_eq!(pipeline.load(&report).await.unwrap(), None);
        assert!(storage.get_file("test_output/dashboard_report.zip").await.is_none());
    }
}
