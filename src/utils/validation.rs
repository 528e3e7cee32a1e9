use crate::utils::error::{DashboardError, Result};
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

/// 最早可查詢的年份（與後端檢查一致）
pub const MIN_YEAR: i32 = 2000;

fn invalid(field_name: &str, value: impl ToString, reason: impl Into<String>) -> DashboardError {
    DashboardError::InvalidConfigValueError {
        field: field_name.to_string(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

/// 只接受 http/https 的後端位址
pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(invalid(field_name, url_str, "URL cannot be empty"));
    }

    let url = Url::parse(url_str)
        .map_err(|e| invalid(field_name, url_str, format!("Invalid URL format: {}", e)))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(invalid(
            field_name,
            url_str,
            format!("Unsupported URL scheme: {}", scheme),
        )),
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.trim().is_empty() {
        return Err(invalid(field_name, path, "Path cannot be empty"));
    }
    if path.contains('\0') {
        return Err(invalid(field_name, path, "Path contains null bytes"));
    }
    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: u64, min_value: u64) -> Result<()> {
    if value < min_value {
        return Err(invalid(
            field_name,
            value,
            format!("Value must be at least {}", min_value),
        ));
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(invalid(
            field_name,
            value,
            format!("Value must be between {} and {}", min, max),
        ));
    }
    Ok(())
}

/// 月份 1..=12，年份不得早於 [`MIN_YEAR`]
pub fn validate_period(month: u32, year: i32) -> Result<()> {
    validate_range("month", month, 1, 12).map_err(|_| DashboardError::ValidationError {
        message: "Mês inválido. Use valores de 1 a 12.".to_string(),
    })?;
    if year < MIN_YEAR {
        return Err(DashboardError::ValidationError {
            message: "Ano inválido.".to_string(),
        });
    }
    Ok(())
}
