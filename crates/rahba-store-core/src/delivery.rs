//! Delivery carriers and wilaya fee resolution

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use reqwest::Client;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use rahba_db::{DeliveryZoneRepository, DeliveryZoneRow};

use crate::error::StoreError;

/// Fee charged when a wilaya has no configured zone, in dinars.
pub const DEFAULT_DELIVERY_FEE: Decimal = dec!(500);

/// How long a resolved wilaya fee may be served from cache.
pub const FEE_CACHE_TTL_SECS: u64 = 60;

/// Shipment details sent to a carrier when an order ships.
#[derive(Debug, Clone, Serialize)]
pub struct ShipmentRequest {
    pub order_number: String,
    pub customer_name: String,
    pub customer_phone: String,
    pub wilaya: String,
    pub commune: String,
    pub address: String,
    /// Cash-on-delivery amount the courier collects.
    pub cod_amount: Decimal,
}

/// A shipment registered with a carrier.
#[derive(Debug, Clone)]
pub struct Shipment {
    pub tracking_number: String,
    pub label_url: Option<String>,
}

/// Delivery carrier abstraction
///
/// Abstracts shipment registration to allow different carriers
/// (Yalidine-style HTTP APIs, a mock for development).
#[async_trait]
pub trait DeliveryProvider: Send + Sync {
    /// Register a shipment and obtain a tracking number
    async fn create_shipment(&self, request: &ShipmentRequest) -> Result<Shipment, StoreError>;
}

/// Carrier connection settings.
#[derive(Debug, Clone)]
pub struct CarrierConfig {
    /// Base URL of the carrier API, without a trailing slash.
    pub api_base: String,
    /// Bearer token for the carrier API.
    pub api_token: String,
}

/// HTTP carrier client
#[derive(Clone)]
pub struct HttpCarrier {
    client: Client,
    config: CarrierConfig,
}

#[derive(Debug, Deserialize)]
struct CarrierShipmentResponse {
    tracking_number: String,
    #[serde(default)]
    label_url: Option<String>,
}

impl HttpCarrier {
    /// Create a new HTTP carrier client
    pub fn new(config: CarrierConfig) -> Self {
        let client = Client::new();
        Self { client, config }
    }

    /// Make an authenticated request to the carrier
    async fn carrier_request<B: Serialize, T: for<'de> Deserialize<'de>>(
        &self,
        method: reqwest::Method,
        endpoint: &str,
        body: Option<&B>,
    ) -> Result<T, StoreError> {
        let url = format!("{}{}", self.config.api_base, endpoint);

        let mut request = self
            .client
            .request(method, &url)
            .bearer_auth(&self.config.api_token);

        if let Some(json) = body {
            request = request.json(json);
        }

        let response = request.send().await.map_err(|e| {
            error!(error = %e, "Carrier API request failed");
            StoreError::Provider(e.to_string())
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, "Carrier API error");
            return Err(StoreError::Provider(format!("carrier API error: {status}")));
        }

        response.json::<T>().await.map_err(|e| {
            error!(error = %e, "Failed to parse carrier response");
            StoreError::Provider(format!("unparseable carrier response: {e}"))
        })
    }
}

#[async_trait]
impl DeliveryProvider for HttpCarrier {
    #[instrument(skip(self, request), fields(order_number = %request.order_number))]
    async fn create_shipment(&self, request: &ShipmentRequest) -> Result<Shipment, StoreError> {
        debug!(wilaya = %request.wilaya, "Registering shipment with carrier");

        let response: CarrierShipmentResponse = self
            .carrier_request(reqwest::Method::POST, "/shipments", Some(request))
            .await?;

        Ok(Shipment {
            tracking_number: response.tracking_number,
            label_url: response.label_url,
        })
    }
}

/// Carrier stand-in for development and tests.
///
/// Produces a deterministic tracking number derived from the order
/// number and never talks to the network.
#[derive(Debug, Clone, Default)]
pub struct MockCarrier;

impl MockCarrier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DeliveryProvider for MockCarrier {
    async fn create_shipment(&self, request: &ShipmentRequest) -> Result<Shipment, StoreError> {
        Ok(Shipment {
            tracking_number: format!("MOCK-{}", request.order_number),
            label_url: None,
        })
    }
}

/// Wilaya fee resolver with caching
pub struct ZoneFeeResolver<Z: DeliveryZoneRepository> {
    zones: Arc<Z>,
    /// Cache of lowercase wilaya -> fee
    fee_cache: Cache<String, Decimal>,
}

impl<Z: DeliveryZoneRepository> ZoneFeeResolver<Z> {
    /// Create a new resolver with the default cache TTL
    pub fn new(zones: Arc<Z>) -> Self {
        Self::with_cache_ttl(zones, Duration::from_secs(FEE_CACHE_TTL_SECS))
    }

    /// Create with a custom cache TTL
    pub fn with_cache_ttl(zones: Arc<Z>, ttl: Duration) -> Self {
        Self {
            zones,
            fee_cache: Cache::builder()
                .time_to_live(ttl)
                .max_capacity(1_000)
                .build(),
        }
    }

    /// Delivery fee for a wilaya, falling back to [`DEFAULT_DELIVERY_FEE`]
    /// for wilayas without a configured zone. Unknown wilayas are cached
    /// too, so repeated checkouts do not hammer the zones table.
    pub async fn fee_for(&self, wilaya: &str) -> Result<Decimal, StoreError> {
        let key = wilaya.trim().to_lowercase();

        if let Some(fee) = self.fee_cache.get(&key).await {
            return Ok(fee);
        }

        let fee = match self.zones.find_by_wilaya(&key).await? {
            Some(zone) => zone.fee,
            None => DEFAULT_DELIVERY_FEE,
        };

        self.fee_cache.insert(key, fee).await;
        Ok(fee)
    }

    /// All configured zones, for the public fee table.
    pub async fn list_zones(&self) -> Result<Vec<DeliveryZoneRow>, StoreError> {
        Ok(self.zones.list().await?)
    }

    /// Create or change a zone fee, dropping the stale cache entry.
    pub async fn upsert_zone(&self, wilaya: &str, fee: Decimal) -> Result<(), StoreError> {
        let wilaya = wilaya.trim();
        if wilaya.is_empty() {
            return Err(StoreError::Validation("wilaya is required".to_string()));
        }
        if fee < Decimal::ZERO {
            return Err(StoreError::Validation(
                "delivery fee cannot be negative".to_string(),
            ));
        }

        self.zones.upsert(wilaya, fee).await?;
        self.fee_cache.invalidate(&wilaya.to_lowercase()).await;
        debug!(wilaya = %wilaya, fee = %fee, "delivery zone updated");
        Ok(())
    }
}

impl<Z: DeliveryZoneRepository> Clone for ZoneFeeResolver<Z> {
    fn clone(&self) -> Self {
        Self {
            zones: Arc::clone(&self.zones),
            fee_cache: self.fee_cache.clone(),
        }
    }
}

impl<Z: DeliveryZoneRepository> std::fmt::Debug for ZoneFeeResolver<Z> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZoneFeeResolver").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_carrier_is_deterministic() {
        let carrier = MockCarrier::new();
        let request = ShipmentRequest {
            order_number: "ORD-1700000000000-A1B2C3".to_string(),
            customer_name: "Karim".to_string(),
            customer_phone: "0550123456".to_string(),
            wilaya: "Alger".to_string(),
            commune: "Bab El Oued".to_string(),
            address: "12 Rue Didouche".to_string(),
            cod_amount: dec!(3500),
        };

        let first = carrier.create_shipment(&request).await.unwrap();
        let second = carrier.create_shipment(&request).await.unwrap();
        assert_eq!(first.tracking_number, "MOCK-ORD-1700000000000-A1B2C3");
        assert_eq!(first.tracking_number, second.tracking_number);
        assert!(first.label_url.is_none());
    }
}
