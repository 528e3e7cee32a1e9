pub mod toml_config;

pub use toml_config::DashboardConfig;

use crate::domain::model::DetailKey;
use crate::utils::error::{DashboardError, Result};
use crate::utils::validation::{validate_path, validate_period, Validate};
#[cfg(feature = "cli")]
use clap::Parser;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(Parser))]
#[cfg_attr(feature = "cli", command(name = "service-dashboard"))]
#[cfg_attr(
    feature = "cli",
    command(about = "Repeated-services dashboard for the service-order admin panel")
)]
pub struct CliConfig {
    /// Path to a TOML configuration file
    #[cfg_attr(feature = "cli", arg(short, long))]
    pub config: Option<String>,

    /// Backend base URL (overrides the config file)
    #[cfg_attr(feature = "cli", arg(long))]
    pub base_url: Option<String>,

    /// Month to load (1-12), defaults to the current month
    #[cfg_attr(feature = "cli", arg(long))]
    pub month: Option<u32>,

    /// Year to load, defaults to the current year
    #[cfg_attr(feature = "cli", arg(long))]
    pub year: Option<i32>,

    /// Page of contract groups to show
    #[cfg_attr(feature = "cli", arg(long, default_value = "1"))]
    pub page: usize,

    /// Viewport width in pixels used for truncation
    #[cfg_attr(feature = "cli", arg(long))]
    pub width: Option<u32>,

    /// Contracts to expand (comma-separated)
    #[cfg_attr(feature = "cli", arg(long, value_delimiter = ','))]
    pub expand: Vec<String>,

    /// Expand every group on the page
    #[cfg_attr(feature = "cli", arg(long))]
    pub expand_all: bool,

    /// Open the detail popup for CONTRACT:FIRST_ID:SECOND_ID
    #[cfg_attr(feature = "cli", arg(long))]
    pub detail: Option<String>,

    /// Set the rework flag of the most recent service in the detail popup
    #[cfg_attr(feature = "cli", arg(long, requires = "detail"))]
    pub rework: Option<bool>,

    /// Export all sorted repeated services to this CSV file
    #[cfg_attr(feature = "cli", arg(long))]
    pub export_csv: Option<String>,

    /// Request timeout in seconds
    #[cfg_attr(feature = "cli", arg(long))]
    pub timeout_secs: Option<u64>,

    /// Enable verbose output
    #[cfg_attr(feature = "cli", arg(short, long))]
    pub verbose: bool,

    /// Emit logs as JSON
    #[cfg_attr(feature = "cli", arg(long))]
    pub log_json: bool,
}

impl CliConfig {
    /// 合併設定檔與命令列參數，命令列優先
    pub fn resolve(&self) -> Result<DashboardConfig> {
        let mut config = match &self.config {
            Some(path) => DashboardConfig::from_file(path)?,
            None => DashboardConfig::default(),
        };

        if let Some(base_url) = &self.base_url {
            config.api.base_url = base_url.clone();
        }
        if let Some(timeout) = self.timeout_secs {
            config.api.timeout_seconds = Some(timeout);
        }
        if let Some(width) = self.width {
            config.display.viewport_width = Some(width);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn detail_key(&self) -> Result<Option<DetailKey>> {
        self.detail.as_deref().map(parse_detail_key).transpose()
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        if let (Some(month), Some(year)) = (self.month, self.year) {
            validate_period(month, year)?;
        } else if let Some(month) = self.month {
            crate::utils::validation::validate_range("month", month, 1, 12)?;
        }
        if self.page == 0 {
            return Err(DashboardError::InvalidConfigValueError {
                field: "page".to_string(),
                value: "0".to_string(),
                reason: "Pages start at 1".to_string(),
            });
        }
        if let Some(path) = &self.export_csv {
            validate_path("export_csv", path)?;
        }
        self.detail_key()?;
        Ok(())
    }
}

/// `CONTRACT:FIRST_ID:SECOND_ID`; the contract itself may contain `:`.
pub fn parse_detail_key(raw: &str) -> Result<DetailKey> {
    let invalid = || DashboardError::InvalidConfigValueError {
        field: "detail".to_string(),
        value: raw.to_string(),
        reason: "Expected CONTRACT:FIRST_ID:SECOND_ID".to_string(),
    };

    let mut parts = raw.rsplitn(3, ':');
    let second = parts.next().ok_or_else(invalid)?;
    let first = parts.next().ok_or_else(invalid)?;
    let contract = parts.next().ok_or_else(invalid)?;

    Ok(DetailKey {
        contract: contract.to_string(),
        first_service_id: first.trim().parse().map_err(|_| invalid())?,
        second_service_id: second.trim().parse().map_err(|_| invalid())?,
    })
}
