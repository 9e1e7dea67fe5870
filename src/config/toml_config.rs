use crate::config::{
    PeriodKind, ReportOptions, DEFAULT_BLOCK_COUNT, DEFAULT_BLOCK_DAYS, DEFAULT_WINDOWS,
};
use crate::core::ConfigProvider;
use crate::domain::model::ReportSettings;
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::Validate;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub dashboard: DashboardConfig,
    pub source: SourceConfig,
    #[serde(default)]
    pub summary: SummaryConfig,
    #[serde(default)]
    pub breakdown: BreakdownConfig,
    pub load: LoadConfig,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub path: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SummaryConfig {
    pub windows: Option<Vec<i64>>,
    pub block_days: Option<i64>,
    pub block_count: Option<usize>,
    pub as_of: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BreakdownConfig {
    #[serde(default)]
    pub period: PeriodKind,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadConfig {
    pub output_path: String,
    pub export: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub verbose: Option<bool>,
    /// "compact"（預設）或 "json"
    pub log_format: Option<String>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EtlError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        // 處理環境變數替換
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| EtlError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${SALES_DIR})；未設定的變數保留原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| EtlError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 未指定報表日期時使用呼叫端提供的「今天」
    pub fn resolve_as_of(&mut self, today: NaiveDate) {
        self.summary.as_of.get_or_insert(today);
    }

    /// 取得摘要視窗（預設 30/60/90 天）
    pub fn windows(&self) -> Vec<i64> {
        self.summary
            .windows
            .clone()
            .unwrap_or_else(|| DEFAULT_WINDOWS.to_vec())
    }

    pub fn block_days(&self) -> i64 {
        self.summary.block_days.unwrap_or(DEFAULT_BLOCK_DAYS)
    }

    pub fn block_count(&self) -> usize {
        self.summary.block_count.unwrap_or(DEFAULT_BLOCK_COUNT)
    }

    pub fn verbose(&self) -> bool {
        self.monitoring
            .as_ref()
            .and_then(|m| m.verbose)
            .unwrap_or(false)
    }

    pub fn json_logs(&self) -> bool {
        self.monitoring
            .as_ref()
            .and_then(|m| m.log_format.as_deref())
            .map(|f| f.eq_ignore_ascii_case("json"))
            .unwrap_or(false)
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        if let Some(format) = self.monitoring.as_ref().and_then(|m| m.log_format.as_deref()) {
            let valid_formats = ["compact", "json"];
            if !valid_formats.contains(&format.to_ascii_lowercase().as_str()) {
                return Err(EtlError::InvalidConfigValueError {
                    field: "monitoring.log_format".to_string(),
                    value: format.to_string(),
                    reason: format!("Unsupported format. Valid formats: {}", valid_formats.join(", ")),
                });
            }
        }

        self.report_options().validate()
    }

    fn report_options(&self) -> ReportOptions<'_> {
        ReportOptions {
            input: &self.source.path,
            output_path: &self.load.output_path,
            windows: self.windows(),
            block_days: self.block_days(),
            block_count: self.block_count(),
            period: self.breakdown.period,
            start: self.breakdown.start,
            end: self.breakdown.end,
            as_of: self.summary.as_of,
        }
    }
}

impl ConfigProvider for TomlConfig {
    fn input_path(&self) -> &str {
        &self.source.path
    }

    fn output_path(&self) -> &str {
        &self.load.output_path
    }

    fn report_settings(&self) -> Result<ReportSettings> {
        self.report_options().settings()
    }

    fn export_enabled(&self) -> bool {
        self.load.export.unwrap_or(true)
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::ReportPeriod;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const MINIMAL: &str = r#"
[dashboard]
name = "box-office"

[source]
path = "data/sales.csv"

[load]
output_path = "./reports"
"#;

    #[test]
    fn test_parse_minimal_config_uses_defaults() {
        let mut config = TomlConfig::from_toml_str(MINIMAL).unwrap();
        config.resolve_as_of(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());

        assert_eq!(config.dashboard.name, "box-office");
        assert_eq!(config.windows(), vec![30, 60, 90]);
        assert_eq!(config.block_days(), 30);
        assert_eq!(config.block_count(), 3);
        assert_eq!(config.breakdown.period, PeriodKind::Day);
        assert!(config.export_enabled());
        assert!(!config.json_logs());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[dashboard]
name = "festival"
description = "Summer festival sales"

[source]
path = "sales.csv"

[summary]
windows = [7, 14]
block_days = 7
block_count = 4
as_of = "2024-07-31"

[breakdown]
period = "custom"
start = "2024-07-01"
end = "2024-07-31"

[load]
output_path = "./out"
export = false

[monitoring]
verbose = true
log_format = "json"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert!(config.validate().is_ok());
        assert!(!config.export_enabled());
        assert!(config.verbose());
        assert!(config.json_logs());

        let settings = config.report_settings().unwrap();
        assert_eq!(settings.windows, vec![7, 14]);
        assert_eq!(settings.block_count, 4);
        assert_eq!(settings.as_of.date(), NaiveDate::from_ymd_opt(2024, 7, 31).unwrap());
        assert_eq!(
            settings.period,
            ReportPeriod::Custom {
                start: NaiveDate::from_ymd_opt(2024, 7, 1),
                end: NaiveDate::from_ymd_opt(2024, 7, 31),
            }
        );
    }

    #[test]
    fn test_missing_report_date_is_an_error() {
        let config = TomlConfig::from_toml_str(MINIMAL).unwrap();
        assert!(matches!(
            config.report_settings(),
            Err(EtlError::MissingConfigError { ref field }) if field == "as_of"
        ));
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("TICKET_SALES_TEST_DIR", "/srv/box-office");

        let toml_content = r#"
[dashboard]
name = "env"

[source]
path = "${TICKET_SALES_TEST_DIR}/sales.csv"

[load]
output_path = "${TICKET_SALES_UNSET_VAR}"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.source.path, "/srv/box-office/sales.csv");
        assert_eq!(config.load.output_path, "${TICKET_SALES_UNSET_VAR}");

        std::env::remove_var("TICKET_SALES_TEST_DIR");
    }

    #[test]
    fn test_config_validation() {
        let toml_content = r#"
[dashboard]
name = "bad"

[source]
path = "sales.csv"

[summary]
windows = [30, -1]
as_of = "2024-01-01"

[load]
output_path = "./output"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_log_format() {
        let toml_content = format!("{}\n[monitoring]\nlog_format = \"xml\"\n", MINIMAL);
        let mut config = TomlConfig::from_toml_str(&toml_content).unwrap();
        config.resolve_as_of(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        assert!(matches!(
            config.validate(),
            Err(EtlError::InvalidConfigValueError { .. })
        ));
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        assert!(matches!(
            TomlConfig::from_toml_str("[dashboard"),
            Err(EtlError::ConfigError { .. })
        ));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(MINIMAL.as_bytes()).unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.source.path, "data/sales.csv");
    }
}
