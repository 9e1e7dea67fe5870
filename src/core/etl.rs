use crate::core::{DashboardReport, Pipeline};
use crate::utils::error::Result;
use std::time::Instant;

#[derive(Debug)]
pub struct EtlOutcome {
    pub report: DashboardReport,
    pub output_path: Option<String>,
}

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub async fn run(&self) -> Result<EtlOutcome> {
        let started = Instant::now();
        tracing::info!("Starting ticket sales ETL");

        // Extract
        let dataset = self.pipeline.extract().await?;
        tracing::info!("Extracted {} transactions", dataset.len());

        // Transform
        let report = self.pipeline.transform(dataset).await?;
        tracing::info!(
            "Computed {} window summaries and {} breakdown rows",
            report.summaries.len(),
            report.breakdown.len()
        );

        // Load
        let output_path = self.pipeline.load(&report).await?;
        if let Some(path) = &output_path {
            tracing::info!("Report saved to: {}", path);
        }

        tracing::info!("ETL finished in {:?}", started.elapsed());
        Ok(EtlOutcome { report, output_path })
    }
}
