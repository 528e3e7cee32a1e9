use crate::domain::model::{
    ApiEnvelope, AvailableMonth, DashboardData, DashboardLoad, DashboardPayload, DetailKey,
    DetailRequest, OperationOutcome, Period, ReworkUpdate, ServiceDetail,
};
use crate::domain::ports::{ConfigProvider, DashboardApi};
use crate::utils::error::{DashboardError, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Response};
use url::Url;

/// Builds the shared `reqwest` client with timeout and default headers.
pub fn build_client<C: ConfigProvider>(config: &C) -> Result<Client> {
    let mut headers = HeaderMap::new();
    for (name, value) in config.extra_headers() {
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
            DashboardError::ConfigValidationError {
                field: format!("api.headers.{}", name),
                message: e.to_string(),
            }
        })?;
        let value = HeaderValue::from_str(&value).map_err(|e| {
            DashboardError::ConfigValidationError {
                field: format!("api.headers.{}", name),
                message: e.to_string(),
            }
        })?;
        headers.insert(name, value);
    }

    Ok(Client::builder()
        .timeout(config.request_timeout())
        .default_headers(headers)
        .build()?)
}

/// 將 base URL 補上結尾斜線，讓 `join` 保留路徑前綴
pub fn normalize_base_url(base_url: &str) -> Result<Url> {
    let trimmed = base_url.trim();
    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{}/", trimmed)
    };
    Ok(Url::parse(&with_slash)?)
}

/// Turns non-2xx responses into [`DashboardError::HttpStatusError`], using the body's `error` field when present.
pub(crate) async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<OperationOutcome>(&body)
        .ok()
        .and_then(|outcome| outcome.error)
        .unwrap_or(body);
    tracing::debug!("Request failed with status {}: {}", status, message);
    Err(DashboardError::HttpStatusError {
        status: status.as_u16(),
        message,
    })
}

#[derive(Debug, Clone)]
pub struct HttpDashboardApi {
    client: Client,
    base_url: Url,
}

impl HttpDashboardApi {
    pub fn new(client: Client, base_url: &str) -> Result<Self> {
        Ok(Self {
            client,
            base_url: normalize_base_url(base_url)?,
        })
    }

    pub fn from_config<C: ConfigProvider>(config: &C) -> Result<Self> {
        Self::new(build_client(config)?, config.base_url())
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }
}

#[async_trait]
impl DashboardApi for HttpDashboardApi {
    async fn available_months(&self) -> Result<Vec<AvailableMonth>> {
        let url = self.endpoint("api/available-months")?;
        tracing::debug!("Making API request to: {}", url);
        let response = ensure_success(self.client.get(url).send().await?).await?;

        let envelope: ApiEnvelope<Vec<AvailableMonth>> = response.json().await?;
        if !envelope.success {
            tracing::warn!(
                "Available months request unsuccessful: {}",
                envelope.error.as_deref().unwrap_or("unknown error")
            );
            return Ok(Vec::new());
        }
        Ok(envelope.data.unwrap_or_default())
    }

    async fn dashboard_data(&self, period: Period) -> Result<DashboardLoad> {
        let url = self.endpoint("api/data")?;
        tracing::debug!("Making API request to: {} ({:?})", url, period);
        let response = self
            .client
            .get(url)
            .query(&[
                ("month", period.month.to_string()),
                ("year", period.year.to_string()),
            ])
            .send()
            .await?;
        let response = ensure_success(response).await?;
        tracing::debug!("API response status: {}", response.status());

        let envelope: ApiEnvelope<DashboardData> = response.json().await?;
        Ok(match (envelope.success, envelope.data) {
            (true, Some(data)) => DashboardLoad::Loaded(DashboardPayload {
                data,
                filters: envelope.filters,
            }),
            _ => DashboardLoad::Empty {
                reason: envelope.error,
            },
        })
    }

    async fn service_details(&self, key: &DetailKey) -> Result<Vec<ServiceDetail>> {
        let url = self.endpoint("api/details-order-service")?;
        tracing::debug!("Fetching service details for {:?}", key);
        let response = self
            .client
            .post(url)
            .json(&DetailRequest::from(key))
            .send()
            .await?;
        let response = ensure_success(response).await?;

        let body: serde_json::Value = response.json().await?;
        match body {
            serde_json::Value::Array(_) => Ok(serde_json::from_value(body)?),
            serde_json::Value::Null => Ok(Vec::new()),
            // 部分版本會包在 {success, data} 裡
            other => {
                let envelope: ApiEnvelope<Vec<ServiceDetail>> = serde_json::from_value(other)?;
                Ok(envelope.data.unwrap_or_default())
            }
        }
    }

    async fn update_rework(&self, os_id: i64, rework: bool) -> Result<()> {
        let url = self.endpoint("api/update-order-service")?;
        tracing::debug!("Updating rework flag for OS {} to {}", os_id, rework);
        let response = self
            .client
            .post(url)
            .json(&ReworkUpdate {
                os_id,
                retrabalho: rework,
            })
            .send()
            .await?;
        let response = ensure_success(response).await?;

        let outcome: OperationOutcome = response.json().await?;
        if outcome.success {
            Ok(())
        } else {
            Err(DashboardError::ValidationError {
                message: outcome
                    .error
                    .unwrap_or_else(|| "Erro ao atualizar ordem de serviço".to_string()),
            })
        }
    }
}
