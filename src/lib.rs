pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use config::{cli::LocalStorage, toml_config::TomlConfig};
pub use core::{etl::EtlEngine, pipeline::DashboardPipeline};
pub use domain::model::{
    BreakdownRow, DashboardReport, Dataset, Granularity, Transaction, Trend, WindowSummary,
};
pub use utils::error::{EtlError, Result};
