//! Equipment catalog access.
//!
//! The sizing pipeline reads one snapshot of available panels and inverters
//! per calculation. A failing or empty catalog never fails the calculation:
//! hardcoded fallback equipment is substituted and a warning is logged.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, error, warn};
use utoipa::ToSchema;

use crate::config::{CatalogConfig, EquipmentConfig};
use crate::errors::CatalogError;
use crate::models::equipment::{Inverter, Panel};

/// Read-only source of equipment rows.
#[async_trait]
pub trait EquipmentCatalog: Send + Sync {
    /// Available panels, lowest power first.
    async fn fetch_available_panels(&self) -> Result<Vec<Panel>, CatalogError>;

    /// Available inverters rated at least `min_power_kw`, cheapest first.
    async fn fetch_available_inverters(
        &self,
        min_power_kw: f64,
    ) -> Result<Vec<Inverter>, CatalogError>;

    /// Source name for logging
    fn name(&self) -> &str;
}

// ─── REST catalog ────────────────────────────────────────────────────────────

/// PostgREST-style catalog (`/panels`, `/inverters` tables).
#[derive(Debug, Clone)]
pub struct RestCatalog {
    base_url: String,
    api_key: Option<String>,
    client: Client,
    max_retries: u32,
    retry_delay: Duration,
}

impl RestCatalog {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, CatalogError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CatalogError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            client,
            max_retries: 3,
            retry_delay: Duration::from_millis(500),
        })
    }

    /// Builds the client from config, taking the key from `CATALOG_API_KEY` when not configured.
    pub fn from_config(config: &CatalogConfig) -> Result<Self, CatalogError> {
        if config.base_url.trim().is_empty() {
            return Err(CatalogError::Config("catalog base_url is empty".to_string()));
        }
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("CATALOG_API_KEY").ok());

        let timeout = Duration::from_secs(config.timeout_secs);
        let retry_delay = Duration::from_millis(config.retry_delay_ms);
        Ok(Self::new(&config.base_url, api_key, timeout)?
            .with_retry_config(config.max_retries, retry_delay))
    }

    pub fn with_retry_config(mut self, max_retries: u32, retry_delay: Duration) -> Self {
        self.max_retries = max_retries.max(1);
        self.retry_delay = retry_delay;
        self
    }

    async fn get_rows<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, CatalogError> {
        let url = format!("{}/{}", self.base_url, table);
        debug!("Catalog query: {} {:?}", url, query);

        let response = self
            .retry_request(|| {
                let mut request = self.client.get(&url).query(query);
                if let Some(key) = &self.api_key {
                    request = request.header("apikey", key).bearer_auth(key);
                }
                request.send()
            })
            .await?;

        match response.status() {
            status if status.is_success() => response
                .json::<Vec<T>>()
                .await
                .map_err(|e| CatalogError::Decode(e.to_string())),
            status => {
                let message = response.text().await.unwrap_or_default();
                Err(CatalogError::Api { status: status.as_u16(), message })
            }
        }
    }

    /// Retries transport failures and 5xx responses with exponential backoff.
    /// The attempt counter lives in this call only. The last 5xx response is
    /// returned as-is once attempts run out.
    async fn retry_request<F, Fut>(&self, mut request_fn: F) -> Result<Response, CatalogError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<Response, reqwest::Error>>,
    {
        let mut attempts = 0;
        let mut delay = self.retry_delay;

        loop {
            attempts += 1;
            match request_fn().await {
                Ok(response)
                    if response.status().is_server_error() && attempts < self.max_retries =>
                {
                    warn!(
                        "Catalog returned {} (attempt {}/{}). Retrying in {:?}",
                        response.status(),
                        attempts,
                        self.max_retries,
                        delay
                    );
                }
                Ok(response) => return Ok(response),
                Err(e) if attempts >= self.max_retries => {
                    error!("Catalog request failed after {} attempts: {}", attempts, e);
                    return Err(CatalogError::Http(e));
                }
                Err(e) => {
                    warn!(
                        "Catalog request failed (attempt {}/{}): {}. Retrying in {:?}",
                        attempts, self.max_retries, e, delay
                    );
                }
            }
            tokio::time::sleep(delay).await;
            delay *= 2;
        }
    }
}

#[async_trait]
impl EquipmentCatalog for RestCatalog {
    async fn fetch_available_panels(&self) -> Result<Vec<Panel>, CatalogError> {
        self.get_rows(
            "panels",
            &[
                ("select", "id,brand,power,price,default_choice,availability".to_string()),
                ("availability", "eq.true".to_string()),
                ("order", "power.asc".to_string()),
            ],
        )
        .await
    }

    async fn fetch_available_inverters(
        &self,
        min_power_kw: f64,
    ) -> Result<Vec<Inverter>, CatalogError> {
        self.get_rows(
            "inverters",
            &[
                ("select", "id,brand,power,price,availability".to_string()),
                ("availability", "eq.true".to_string()),
                ("power", format!("gte.{}", min_power_kw)),
                ("order", "price.asc".to_string()),
            ],
        )
        .await
    }

    fn name(&self) -> &str {
        "rest"
    }
}

// ─── Static catalog ──────────────────────────────────────────────────────────

/// In-memory catalog, used in offline mode.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    panels: Vec<Panel>,
    inverters: Vec<Inverter>,
}

impl StaticCatalog {
    pub fn new(panels: Vec<Panel>, inverters: Vec<Inverter>) -> Self {
        Self { panels, inverters }
    }

    pub fn from_config(config: &EquipmentConfig) -> Self {
        Self::new(config.panels.clone(), config.inverters.clone())
    }
}

#[async_trait]
impl EquipmentCatalog for StaticCatalog {
    async fn fetch_available_panels(&self) -> Result<Vec<Panel>, CatalogError> {
        let mut panels: Vec<Panel> =
            self.panels.iter().filter(|p| p.availability).cloned().collect();
        panels.sort_by_key(|p| p.power);
        Ok(panels)
    }

    async fn fetch_available_inverters(
        &self,
        min_power_kw: f64,
    ) -> Result<Vec<Inverter>, CatalogError> {
        let mut inverters: Vec<Inverter> = self
            .inverters
            .iter()
            .filter(|i| i.availability && i.power >= min_power_kw)
            .cloned()
            .collect();
        inverters.sort_by_key(|i| i.price);
        Ok(inverters)
    }

    fn name(&self) -> &str {
        "static"
    }
}

// ─── Snapshot with fallback ──────────────────────────────────────────────────

/// Equipment used for one calculation.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSnapshot {
    pub panels: Vec<Panel>,
    pub inverters: Vec<Inverter>,
    pub panels_fallback: bool,
    pub inverters_fallback: bool,
}

impl CatalogSnapshot {
    pub fn used_fallback(&self) -> bool {
        self.panels_fallback || self.inverters_fallback
    }
}

pub fn fallback_panels() -> Vec<Panel> {
    vec![Panel {
        id: Some("fallback-panel-450".to_string()),
        brand: "Default Panel".to_string(),
        power: 450,
        price: 45000,
        default_choice: true,
        availability: true,
    }]
}

/// Fallback inverters rated at least `min_power_kw`.
pub fn fallback_inverters(min_power_kw: f64) -> Vec<Inverter> {
    [(5.0, 120000), (10.0, 180000), (15.0, 250000)]
        .into_iter()
        .filter(|(power, _)| *power >= min_power_kw)
        .map(|(power, price)| Inverter {
            id: Some(format!("fallback-inverter-{}", power)),
            brand: "Default Inverter".to_string(),
            power,
            price,
            availability: true,
        })
        .collect()
}

fn usable_panel(panel: &Panel) -> bool {
    panel.availability && panel.power > 0
}

fn usable_inverter(inverter: &Inverter) -> bool {
    inverter.availability && inverter.power.is_finite() && inverter.power > 0.0
}

/// Reads panels and inverters, substituting fallback equipment for any list
/// that cannot be fetched or comes back empty.
pub async fn fetch_snapshot(
    catalog: &dyn EquipmentCatalog,
    min_inverter_power_kw: f64,
) -> CatalogSnapshot {
    let source = catalog.name();

    let (panels, panels_fallback) = match catalog.fetch_available_panels().await {
        Ok(rows) => {
            let panels: Vec<Panel> = rows.into_iter().filter(usable_panel).collect();
            if panels.is_empty() {
                warn!("No panels found in {} catalog, using fallback values", source);
                (fallback_panels(), true)
            } else {
                (panels, false)
            }
        }
        Err(e) => {
            warn!("Error fetching panels from {} catalog: {}. Using fallback values", source, e);
            (fallback_panels(), true)
        }
    };

    let inverter_rows = catalog.fetch_available_inverters(min_inverter_power_kw).await;
    let (inverters, inverters_fallback) = match inverter_rows {
        Ok(rows) => {
            let inverters: Vec<Inverter> = rows.into_iter().filter(usable_inverter).collect();
            if inverters.is_empty() {
                warn!(
                    "No suitable inverters (>= {} kW) found in {} catalog, using fallback values",
                    min_inverter_power_kw, source
                );
                (fallback_inverters(min_inverter_power_kw), true)
            } else {
                (inverters, false)
            }
        }
        Err(e) => {
            warn!("Error fetching inverters from {} catalog: {}. Using fallback values", source, e);
            (fallback_inverters(min_inverter_power_kw), true)
        }
    };

    CatalogSnapshot {
        panels,
        inverters,
        panels_fallback,
        inverters_fallback,
    }
}

/// Reads the catalog as-is, surfacing failures instead of substituting.
pub async fn fetch_exact(
    catalog: &dyn EquipmentCatalog,
    min_inverter_power_kw: f64,
) -> Result<CatalogSnapshot, CatalogError> {
    let panels = catalog.fetch_available_panels().await?;
    let inverters = catalog.fetch_available_inverters(min_inverter_power_kw).await?;

    Ok(CatalogSnapshot {
        panels: panels.into_iter().filter(usable_panel).collect(),
        inverters: inverters.into_iter().filter(usable_inverter).collect(),
        panels_fallback: false,
        inverters_fallback: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;

    /// Catalog whose every read fails.
    struct BrokenCatalog;

    #[async_trait]
    impl EquipmentCatalog for BrokenCatalog {
        async fn fetch_available_panels(&self) -> Result<Vec<Panel>, CatalogError> {
            Err(CatalogError::Api { status: 503, message: "down".into() })
        }

        async fn fetch_available_inverters(
            &self,
            _min_power_kw: f64,
        ) -> Result<Vec<Inverter>, CatalogError> {
            Err(CatalogError::Api { status: 503, message: "down".into() })
        }

        fn name(&self) -> &str {
            "broken"
        }
    }

    fn rest(server: &mockito::ServerGuard) -> RestCatalog {
        RestCatalog::new(server.url(), Some("secret".to_string()), Duration::from_secs(5))
            .unwrap()
            .with_retry_config(1, Duration::from_millis(1))
    }

    fn panel(brand: &str, power: u32, price: u64, availability: bool) -> Panel {
        Panel {
            id: Some(brand.to_lowercase()),
            brand: brand.to_string(),
            power,
            price,
            default_choice: false,
            availability,
        }
    }

    fn inverter(brand: &str, power: f64, price: u64) -> Inverter {
        Inverter {
            id: Some(brand.to_lowercase()),
            brand: brand.to_string(),
            power,
            price,
            availability: true,
        }
    }

    #[tokio::test]
    async fn test_rest_panels_query() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/panels")
            .match_header("apikey", "secret")
            .match_header("authorization", "Bearer secret")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("availability".into(), "eq.true".into()),
                Matcher::UrlEncoded("order".into(), "power.asc".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!([
                    {
                        "id": "p1",
                        "brand": "Longi",
                        "power": 450,
                        "price": 42000,
                        "default_choice": true,
                        "availability": true
                    },
                    { "id": "p2", "brand": "Jinko", "power": 550, "price": 51000 }
                ])
                .to_string(),
            )
            .create_async()
            .await;

        let panels = rest(&server).fetch_available_panels().await.unwrap();
        assert_eq!(panels.len(), 2);
        assert_eq!(panels[0].brand, "Longi");
        assert!(panels[0].default_choice);
        // Missing flags take their defaults
        assert!(!panels[1].default_choice);
        assert!(panels[1].availability);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_rest_inverters_filter_by_power() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/inverters")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("power".into(), "gte.6.5".into()),
                Matcher::UrlEncoded("order".into(), "price.asc".into()),
            ]))
            .with_status(200)
            .with_body(
                json!([{ "id": "i8", "brand": "Growatt", "power": 8.0, "price": 150000 }])
                    .to_string(),
            )
            .create_async()
            .await;

        let inverters = rest(&server).fetch_available_inverters(6.5).await.unwrap();
        assert_eq!(inverters.len(), 1);
        assert_eq!(inverters[0].power, 8.0);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_rest_numeric_prices_keep_the_real_catalog() {
        let mut server = Server::new_async().await;
        let panels = server
            .mock("GET", "/panels")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"[{ "id": "p1", "brand": "Longi", "power": 450, "price": 45000.00 }]"#)
            .create_async()
            .await;
        let inverters = server
            .mock("GET", "/inverters")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"[{ "id": "i8", "brand": "Growatt", "power": 8.0, "price": 149999.60 }]"#)
            .create_async()
            .await;

        let snapshot = fetch_snapshot(&rest(&server), 6.0).await;
        assert!(!snapshot.used_fallback());
        assert_eq!(snapshot.panels[0].brand, "Longi");
        assert_eq!(snapshot.panels[0].price, 45000);
        assert_eq!(snapshot.inverters[0].price, 150000);
        panels.assert_async().await;
        inverters.assert_async().await;
    }

    #[tokio::test]
    async fn test_rest_error_status() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/panels")
            .match_query(Matcher::Any)
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let result = rest(&server).fetch_available_panels().await;
        assert!(matches!(result, Err(CatalogError::Api { status: 500, .. })));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_rest_retries_server_errors() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/panels")
            .match_query(Matcher::Any)
            .with_status(503)
            .expect(3)
            .create_async()
            .await;

        let catalog = rest(&server).with_retry_config(3, Duration::from_millis(1));
        let result = catalog.fetch_available_panels().await;
        assert!(matches!(result, Err(CatalogError::Api { status: 503, .. })));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_rest_client_errors_are_not_retried() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/panels")
            .match_query(Matcher::Any)
            .with_status(404)
            .expect(1)
            .create_async()
            .await;

        let catalog = rest(&server).with_retry_config(3, Duration::from_millis(1));
        let result = catalog.fetch_available_panels().await;
        assert!(matches!(result, Err(CatalogError::Api { status: 404, .. })));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_rest_unreachable_after_retries() {
        let catalog = RestCatalog::new("http://127.0.0.1:9", None, Duration::from_millis(200))
            .unwrap()
            .with_retry_config(2, Duration::from_millis(1));

        let result = catalog.fetch_available_panels().await;
        assert!(matches!(result, Err(CatalogError::Http(_))));
    }

    #[tokio::test]
    async fn test_static_catalog_filters_and_orders() {
        let catalog = StaticCatalog::new(
            vec![
                panel("Big", 600, 60000, true),
                panel("Gone", 500, 50000, false),
                panel("Small", 400, 40000, true),
            ],
            vec![
                inverter("Pricey", 10.0, 200000),
                inverter("Tiny", 3.0, 60000),
                inverter("Cheap", 8.0, 140000),
            ],
        );

        let panels = catalog.fetch_available_panels().await.unwrap();
        let brands: Vec<_> = panels.iter().map(|p| p.brand.as_str()).collect();
        assert_eq!(brands, ["Small", "Big"]);

        let inverters = catalog.fetch_available_inverters(6.0).await.unwrap();
        let brands: Vec<_> = inverters.iter().map(|i| i.brand.as_str()).collect();
        assert_eq!(brands, ["Cheap", "Pricey"]);
    }

    #[tokio::test]
    async fn test_snapshot_falls_back_on_errors() {
        let snapshot = fetch_snapshot(&BrokenCatalog, 6.0).await;
        assert!(snapshot.panels_fallback && snapshot.inverters_fallback);
        assert_eq!(snapshot.panels, fallback_panels());
        // Only the 10 and 15 kW fallback units can carry 6 kW
        let powers: Vec<f64> = snapshot.inverters.iter().map(|i| i.power).collect();
        assert_eq!(powers, [10.0, 15.0]);
    }

    #[tokio::test]
    async fn test_snapshot_falls_back_on_empty_lists() {
        let snapshot = fetch_snapshot(&StaticCatalog::default(), 2.0).await;
        assert!(snapshot.used_fallback());
        assert_eq!(snapshot.panels.len(), 1);
        assert_eq!(snapshot.inverters.len(), 3);
        assert_eq!(snapshot.inverters[0].id.as_deref(), Some("fallback-inverter-5"));
    }

    #[tokio::test]
    async fn test_snapshot_keeps_catalog_rows() {
        let catalog = StaticCatalog::new(
            vec![panel("Zero", 0, 1, true), panel("Real", 450, 40000, true)],
            vec![inverter("Twelve", 12.0, 200000)],
        );
        let snapshot = fetch_snapshot(&catalog, 6.0).await;
        assert!(!snapshot.used_fallback());
        // Zero-rated rows are dropped
        assert_eq!(snapshot.panels.len(), 1);
        assert_eq!(snapshot.panels[0].id.as_deref(), Some("real"));
    }

    #[tokio::test]
    async fn test_exact_read_surfaces_errors() {
        let result = fetch_exact(&BrokenCatalog, 6.0).await;
        assert!(matches!(result, Err(CatalogError::Api { status: 503, .. })));

        let snapshot = fetch_exact(&StaticCatalog::default(), 6.0).await.unwrap();
        assert!(snapshot.panels.is_empty() && snapshot.inverters.is_empty());
        assert!(!snapshot.used_fallback());
    }

    #[test]
    fn test_fallback_inverters_above_range_are_empty() {
        assert!(fallback_inverters(40.0).is_empty());
        assert_eq!(fallback_inverters(15.0).len(), 1);
    }
}
