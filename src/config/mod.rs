pub mod cli;
pub mod toml_config;

use crate::core::aggregate::end_of_day;
use crate::domain::model::{ReportPeriod, ReportSettings};
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{
    validate_date_range, validate_file_extension, validate_non_empty, validate_path,
    validate_positive_number, validate_required_field, Validate,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const DEFAULT_WINDOWS: [i64; 3] = [30, 60, 90];
pub const DEFAULT_BLOCK_DAYS: i64 = 30;
pub const DEFAULT_BLOCK_COUNT: usize = 3;

/// 明細表的期間選項
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum PeriodKind {
    #[default]
    Day,
    Week,
    Month,
    Year,
    Custom,
}

impl PeriodKind {
    pub fn to_report_period(self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> ReportPeriod {
        match self {
            PeriodKind::Day => ReportPeriod::Day,
            PeriodKind::Week => ReportPeriod::Week,
            PeriodKind::Month => ReportPeriod::Month,
            PeriodKind::Year => ReportPeriod::Year,
            PeriodKind::Custom => ReportPeriod::Custom { start, end },
        }
    }
}

/// CLI 與 TOML 共用的報表參數
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ReportOptions<'a> {
    pub input: &'a str,
    pub output_path: &'a str,
    pub windows: Vec<i64>,
    pub block_days: i64,
    pub block_count: usize,
    pub period: PeriodKind,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub as_of: Option<NaiveDate>,
}

impl ReportOptions<'_> {
    /// 轉成報表設定；報表日期必須已由呼叫端決定
    pub fn settings(&self) -> Result<ReportSettings> {
        let as_of = self.as_of.ok_or_else(|| EtlError::MissingConfigError {
            field: "as_of".to_string(),
        })?;

        Ok(ReportSettings {
            windows: self.windows.clone(),
            block_days: self.block_days,
            block_count: self.block_count,
            period: self.period.to_report_period(self.start, self.end),
            as_of: end_of_day(as_of),
        })
    }
}

impl Validate for ReportOptions<'_> {
    fn validate(&self) -> Result<()> {
        validate_path("input", self.input)?;
        validate_file_extension("input", self.input, &["csv"])?;
        validate_path("output_path", self.output_path)?;

        validate_non_empty("windows", &self.windows)?;
        for &days in &self.windows {
            validate_positive_number("windows", days, 1)?;
        }
        validate_positive_number("block_days", self.block_days, 1)?;
        validate_required_field("as_of", &self.as_of)?;

        if self.period == PeriodKind::Custom {
            if let (Some(start), Some(end)) = (self.start, self.end) {
                validate_date_range("custom range", start, end)?;
            }
        }

        Ok(())
    }
}

#[cfg(feature = "cli")]
pub use cli_args::CliConfig;

#[cfg(feature = "cli")]
mod cli_args {
    use super::*;
    use crate::core::ConfigProvider;
    use clap::Parser;

    #[derive(Debug, Clone, Serialize, Deserialize, Parser)]
    #[command(name = "ticket-sales-etl")]
    #[command(about = "Summarise a ticket sales CSV into a dashboard report")]
    pub struct CliConfig {
        /// Ticket sales CSV (columns: Payment Date, Order Total, Ticket ID, Ticket Type)
        #[arg(short, long)]
        pub input: String,

        #[arg(long, default_value = "./output")]
        pub output_path: String,

        /// Summary window lengths in days
        #[arg(long, value_delimiter = ',', default_value = "30,60,90")]
        pub windows: Vec<i64>,

        #[arg(long, default_value_t = DEFAULT_BLOCK_DAYS)]
        pub block_days: i64,

        #[arg(long, default_value_t = DEFAULT_BLOCK_COUNT)]
        pub block_count: usize,

        #[arg(long, value_enum, default_value_t = PeriodKind::Day)]
        pub period: PeriodKind,

        /// First day of a custom period (YYYY-MM-DD)
        #[arg(long)]
        pub start: Option<NaiveDate>,

        /// Last day of a custom period (YYYY-MM-DD)
        #[arg(long)]
        pub end: Option<NaiveDate>,

        /// Report date (YYYY-MM-DD); defaults to today
        #[arg(long)]
        pub as_of: Option<NaiveDate>,

        #[arg(long, help = "Skip writing the report archive")]
        pub no_export: bool,

        #[arg(long, help = "Emit logs as JSON")]
        pub json_logs: bool,

        #[arg(long, help = "Enable verbose output")]
        pub verbose: bool,
    }

    impl CliConfig {
        /// 未指定報表日期時使用呼叫端提供的「今天」
        pub fn resolve_as_of(&mut self, today: NaiveDate) {
            self.as_of.get_or_insert(today);
        }

        fn report_options(&self) -> ReportOptions<'_> {
            ReportOptions {
                input: &self.input,
                output_path: &self.output_path,
                windows: self.windows.clone(),
                block_days: self.block_days,
                block_count: self.block_count,
                period: self.period,
                start: self.start,
                end: self.end,
                as_of: self.as_of,
            }
        }
    }

    impl ConfigProvider for CliConfig {
        fn input_path(&self) -> &str {
            &self.input
        }

        fn output_path(&self) -> &str {
            &self.output_path
        }

        fn report_settings(&self) -> Result<ReportSettings> {
            self.report_options().settings()
        }

        fn export_enabled(&self) -> bool {
            !self.no_export
        }
    }

    impl Validate for CliConfig {
        fn validate(&self) -> Result<()> {
            self.report_options().validate()
        }
    }

}
