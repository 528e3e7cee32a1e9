use crate::core::debounce::DEFAULT_RESIZE_DEBOUNCE;
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{DashboardError, Result};
use crate::utils::validation::Validate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
pub const DEFAULT_VIEWPORT_WIDTH: u32 = 1280;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    pub api: ApiConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_seconds: Option<u64>,
    pub headers: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DisplayConfig {
    pub viewport_width: Option<u32>,
    pub resize_debounce_ms: Option<u64>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                base_url: DEFAULT_BASE_URL.to_string(),
                timeout_seconds: None,
                headers: None,
            },
            display: DisplayConfig::default(),
        }
    }
}

impl DashboardConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(DashboardError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| DashboardError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${API_TOKEN})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| DashboardError::ConfigError {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }
}

impl Validate for DashboardConfig {
    fn validate(&self) -> Result<()> {
        crate::utils::validation::validate_url("api.base_url", &self.api.base_url)?;

        if let Some(timeout) = self.api.timeout_seconds {
            crate::utils::validation::validate_positive_number("api.timeout_seconds", timeout, 1)?;
        }

        if let Some(width) = self.display.viewport_width {
            crate::utils::validation::validate_positive_number(
                "display.viewport_width",
                u64::from(width),
                1,
            )?;
        }

        if let Some(headers) = &self.api.headers {
            for (name, value) in headers {
                if value.contains("${") {
                    return Err(DashboardError::MissingConfigError {
                        field: format!("api.headers.{} (unresolved {})", name, value),
                    });
                }
            }
        }

        Ok(())
    }
}

impl ConfigProvider for DashboardConfig {
    fn base_url(&self) -> &str {
        &self.api.base_url
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS))
    }

    fn viewport_width(&self) -> u32 {
        self.display.viewport_width.unwrap_or(DEFAULT_VIEWPORT_WIDTH)
    }

    fn resize_debounce(&self) -> Duration {
        self.display
            .resize_debounce_ms
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_RESIZE_DEBOUNCE)
    }

    fn extra_headers(&self) -> Vec<(String, String)> {
        self.api
            .headers
            .as_ref()
            .map(|headers| {
                headers
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }
}
