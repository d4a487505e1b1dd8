use crate::{config::EcoscoreConfig, entities::product, errors::ServiceError};
use async_trait::async_trait;
use serde::Deserialize;
use std::{sync::Arc, time::Duration};
use tracing::{debug, warn};

/// Source of environmental grades shown next to products.
///
/// Lookups never fail the caller: any problem yields `None` and the grade is
/// simply left out of the response.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EcoscoreProvider: Send + Sync {
    async fn fetch_grade(&self, product: &product::Model) -> Option<String>;
}

#[derive(Debug, Deserialize)]
struct OpenFoodFactsResponse {
    product: Option<OpenFoodFactsProduct>,
}

#[derive(Debug, Deserialize)]
struct OpenFoodFactsProduct {
    ecoscore_grade: Option<String>,
}

/// Open Food Facts lookup by barcode.
///
/// Catalog products carry no barcode, so every lookup uses the single
/// configured one.
#[derive(Clone)]
pub struct OpenFoodFactsClient {
    client: reqwest::Client,
    base_url: String,
    barcode: String,
}

impl OpenFoodFactsClient {
    pub fn new(config: &EcoscoreConfig) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                ServiceError::InternalError(format!("failed to build ecoscore client: {e}"))
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            barcode: config.barcode.clone(),
        })
    }

    fn product_url(&self) -> String {
        format!("{}/api/v0/product/{}.json", self.base_url, self.barcode)
    }
}

#[async_trait]
impl EcoscoreProvider for OpenFoodFactsClient {
    async fn fetch_grade(&self, product: &product::Model) -> Option<String> {
        let url = self.product_url();

        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(product_id = product.id, error = %e, "ecoscore lookup failed");
                return None;
            }
        };

        if response.status() != reqwest::StatusCode::OK {
            warn!(
                product_id = product.id,
                status = %response.status(),
                "ecoscore lookup returned a non-200 status"
            );
            return None;
        }

        match response.json::<OpenFoodFactsResponse>().await {
            Ok(body) => {
                let grade = body.product.and_then(|p| p.ecoscore_grade);
                debug!(product_id = product.id, grade = ?grade, "ecoscore fetched");
                grade
            }
            Err(e) => {
                warn!(product_id = product.id, error = %e, "ecoscore response could not be parsed");
                None
            }
        }
    }
}

/// Used when lookups are switched off in configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledEcoscore;

#[async_trait]
impl EcoscoreProvider for DisabledEcoscore {
    async fn fetch_grade(&self, _product: &product::Model) -> Option<String> {
        None
    }
}

pub fn provider_from_config(
    config: &EcoscoreConfig,
) -> Result<Arc<dyn EcoscoreProvider>, ServiceError> {
    if config.enabled {
        Ok(Arc::new(OpenFoodFactsClient::new(config)?))
    } else {
        Ok(Arc::new(DisabledEcoscore))
    }
}
