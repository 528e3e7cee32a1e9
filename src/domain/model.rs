use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};

/// 同一合約、同一類別被判定為「重複」的兩次服務
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepeatedServiceRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    pub contract: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub category: String,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub experts: Vec<String>,
    #[serde(default)]
    pub first_service_id: Option<i64>,
    #[serde(default)]
    pub second_service_id: Option<i64>,
    #[serde(default, deserialize_with = "lenient_date")]
    pub first_service_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient_date")]
    pub second_service_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient_days")]
    pub days_between: u32,
}

impl RepeatedServiceRecord {
    /// Drill-down key, available only when both service ids are known.
    pub fn detail_key(&self) -> Option<DetailKey> {
        Some(DetailKey {
            contract: self.contract.clone(),
            first_service_id: self.first_service_id?,
            second_service_id: self.second_service_id?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractGroup {
    pub contract: String,
    pub items: Vec<RepeatedServiceRecord>,
}

impl ContractGroup {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardMetrics {
    #[serde(default, deserialize_with = "lenient_count")]
    pub total_services: u64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub total_experts: u64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub services_with_assist: u64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub repeated_services: u64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChartSeries {
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub data: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartDataset {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub data: Vec<f64>,
    #[serde(default)]
    pub background_color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MultiSeriesChart {
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub datasets: Vec<ChartDataset>,
}

/// `/api/data` 的 `data` 欄位
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardData {
    #[serde(flatten)]
    pub metrics: DashboardMetrics,
    #[serde(default)]
    pub services_by_expert: Option<ChartSeries>,
    #[serde(default)]
    pub services_by_category: Option<ChartSeries>,
    #[serde(default)]
    pub services_with_assist_chart: Option<ChartSeries>,
    #[serde(default)]
    pub assistance_network: Option<MultiSeriesChart>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub repeated_services_list: Vec<RepeatedServiceRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DashboardFilters {
    #[serde(default)]
    pub month: Option<u32>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub month_name: Option<String>,
}

/// Generic `{success, data, filters, error}` envelope used by the dashboard routes.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(default)]
    pub success: bool,
    pub data: Option<T>,
    #[serde(default)]
    pub filters: Option<DashboardFilters>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardPayload {
    pub data: DashboardData,
    pub filters: Option<DashboardFilters>,
}

/// Outcome of a dashboard fetch that reached the server.
#[derive(Debug, Clone, PartialEq)]
pub enum DashboardLoad {
    Loaded(DashboardPayload),
    /// `success: false` or no `data`; rendered as "no data", not as an error.
    Empty { reason: Option<String> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Period {
    pub month: u32,
    pub year: i32,
}

impl Period {
    pub fn new(month: u32, year: i32) -> Self {
        Self { month, year }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailableMonth {
    pub year: i32,
    pub month: u32,
    #[serde(default)]
    pub month_name: Option<String>,
    #[serde(default)]
    pub display: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DetailKey {
    pub contract: String,
    pub first_service_id: i64,
    pub second_service_id: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DetailRequest<'a> {
    pub contract_id: &'a str,
    pub id_order_first: i64,
    pub id_order_secund: i64,
}

impl<'a> From<&'a DetailKey> for DetailRequest<'a> {
    fn from(key: &'a DetailKey) -> Self {
        Self {
            contract_id: &key.contract,
            id_order_first: key.first_service_id,
            id_order_secund: key.second_service_id,
        }
    }
}

/// 單一服務單明細
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDetail {
    pub id: i64,
    #[serde(rename = "descricao", default)]
    pub description: Option<String>,
    #[serde(rename = "resolucao", default)]
    pub resolution: Option<String>,
    #[serde(
        rename = "data_finalizacao",
        default,
        deserialize_with = "lenient_datetime",
        skip_serializing
    )]
    pub completed_at: Option<NaiveDateTime>,
    #[serde(rename = "retrabalho", default, deserialize_with = "lenient_bool")]
    pub rework: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReworkUpdate {
    pub os_id: i64,
    pub retrabalho: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OperationOutcome {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => s,
        Some(serde_json::Value::Number(n)) => n.to_string(),
        Some(serde_json::Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    })
}

fn lenient_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

fn lenient_days<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value
        .and_then(|v| v.as_f64())
        .map(|days| days.max(0.0).min(u32::MAX as f64) as u32)
        .unwrap_or(0))
}

fn lenient_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value
        .and_then(|v| v.as_f64())
        .map(|count| count.max(0.0) as u64)
        .unwrap_or(0))
}

fn lenient_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Bool(b)) => b,
        Some(serde_json::Value::Number(n)) => n.as_i64().unwrap_or(0) != 0,
        Some(serde_json::Value::String(s)) => matches!(s.as_str(), "true" | "1"),
        _ => false,
    })
}

fn lenient_date<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<NaiveDate>, D::Error> {
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(|v| v.as_str()).and_then(parse_date))
}

fn lenient_datetime<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<NaiveDateTime>, D::Error> {
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(|v| v.as_str()).and_then(parse_datetime))
}

/// `YYYY-MM-DD`，允許帶時間後綴
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let date_part = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

pub fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt);
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.naive_utc());
    }
    // Flask 預設輸出 "Tue, 05 Mar 2024 10:00:00 GMT"
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%a, %d %b %Y %H:%M:%S GMT") {
        return Some(dt);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}
