use crate::adapters::http::{build_client, ensure_success, normalize_base_url};
use crate::domain::model::OperationOutcome;
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{DashboardError, Result};
use reqwest::Client;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use url::Url;

/// Resources managed through the `/admin/api` CRUD routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminResource {
    Customers,
    Experts,
    TypeServices,
    ServiceOrders,
}

impl AdminResource {
    pub fn path(self) -> &'static str {
        match self {
            AdminResource::Customers => "customers",
            AdminResource::Experts => "experts",
            AdminResource::TypeServices => "typeservices",
            AdminResource::ServiceOrders => "serviceorders",
        }
    }
}

impl fmt::Display for AdminResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

impl FromStr for AdminResource {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "customers" => Ok(AdminResource::Customers),
            "experts" => Ok(AdminResource::Experts),
            "typeservices" => Ok(AdminResource::TypeServices),
            "serviceorders" => Ok(AdminResource::ServiceOrders),
            other => Err(DashboardError::ValidationError {
                message: format!("Unknown admin resource: {}", other),
            }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AdminClient {
    client: Client,
    api_root: Url,
}

impl AdminClient {
    pub fn new(client: Client, base_url: &str) -> Result<Self> {
        let api_root = normalize_base_url(base_url)?.join("admin/api/")?;
        Ok(Self { client, api_root })
    }

    pub fn from_config<C: ConfigProvider>(config: &C) -> Result<Self> {
        Self::new(build_client(config)?, config.base_url())
    }

    fn collection_url(&self, resource: AdminResource) -> Result<Url> {
        Ok(self.api_root.join(resource.path())?)
    }

    fn item_url(&self, resource: AdminResource, id: i64) -> Result<Url> {
        Ok(self.api_root.join(&format!("{}/{}", resource.path(), id))?)
    }

    pub async fn list(&self, resource: AdminResource) -> Result<Value> {
        let url = self.collection_url(resource)?;
        tracing::debug!("Listing {}", resource);
        let response = ensure_success(self.client.get(url).send().await?).await?;
        Ok(response.json().await?)
    }

    pub async fn get(&self, resource: AdminResource, id: i64) -> Result<Value> {
        let url = self.item_url(resource, id)?;
        let response = ensure_success(self.client.get(url).send().await?).await?;
        Ok(response.json().await?)
    }

    /// `POST` without an id, `PUT` with one.
    pub async fn save(&self, resource: AdminResource, id: Option<i64>, payload: &Value) -> Result<()> {
        let request = match id {
            Some(id) => self.client.put(self.item_url(resource, id)?),
            None => self.client.post(self.collection_url(resource)?),
        };
        tracing::info!(
            "{} {} record",
            if id.is_some() { "Updating" } else { "Creating" },
            resource
        );
        let response = ensure_success(request.json(payload).send().await?).await?;
        into_result(response.json().await?)
    }

    pub async fn delete(&self, resource: AdminResource, id: i64) -> Result<()> {
        let url = self.item_url(resource, id)?;
        tracing::info!("Deleting {} #{}", resource, id);
        let response = ensure_success(self.client.delete(url).send().await?).await?;
        into_result(response.json().await?)
    }

    pub async fn complete_order(&self, id: i64) -> Result<()> {
        let url = self
            .api_root
            .join(&format!("{}/{}/complete", AdminResource::ServiceOrders.path(), id))?;
        tracing::info!("Completing service order #{}", id);
        let response = ensure_success(self.client.post(url).send().await?).await?;
        into_result(response.json().await?)
    }
}

fn into_result(outcome: OperationOutcome) -> Result<()> {
    if outcome.success {
        Ok(())
    } else {
        Err(DashboardError::ValidationError {
            message: outcome
                .error
                .unwrap_or_else(|| "Operação não concluída".to_string()),
        })
    }
}
