mod routes;
mod controllers;
mod services;
mod models;
mod api_docs;
mod shared_state;
mod config;
mod errors;

use std::net::SocketAddr;
use std::sync::Arc;
use axum::{Router, routing::get, response::Html};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_scalar::Scalar;
use crate::api_docs::ApiDoc;
use crate::config::Config;
use crate::routes::sizing_routes::api_routes;
use crate::services::catalog::{EquipmentCatalog, RestCatalog, StaticCatalog};
use crate::shared_state::{AppState, SharedState};

#[cfg(feature = "verbose_log")]
const DEFAULT_LOG_FILTER: &str = "debug";
#[cfg(not(feature = "verbose_log"))]
const DEFAULT_LOG_FILTER: &str = "info";

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    // 1. Load configuration
    let config_path =
        std::env::var("SOLAR_SIZING_CONFIG").unwrap_or_else(|_| "config.json".to_string());
    let config = match Config::load(&config_path) {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load {}: {}", config_path, e);
            return;
        }
    };
    info!(
        "Configuration loaded: {} static panels, {} static inverters",
        config.equipment.panels.len(),
        config.equipment.inverters.len()
    );

    // 2. Equipment catalogs
    let remote_catalog: Option<Arc<dyn EquipmentCatalog>> = match &config.catalog {
        Some(catalog_config) => match RestCatalog::from_config(catalog_config) {
            Ok(catalog) => {
                info!("Remote equipment catalog: {}", catalog_config.base_url);
                Some(Arc::new(catalog))
            }
            Err(e) => {
                warn!("Remote catalog disabled: {}", e);
                None
            }
        },
        None => {
            info!("No remote catalog configured, serving static equipment");
            None
        }
    };
    let offline_catalog = StaticCatalog::from_config(&config.equipment);

    // 3. Shared state
    let state = AppState::new(remote_catalog, offline_catalog, config.offline_mode);
    let shared = SharedState::new(state, config.calculation.clone());

    // 4. Start Axum HTTP server
    let server_port = config.server.port;
    let app = Router::new()
        .nest("/api", api_routes(shared))
        .route("/scalar", get(|| async {
            Html(Scalar::new(ApiDoc::openapi()).to_html())
        }))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = SocketAddr::from(([0, 0, 0, 0], server_port));
    info!("API Server listening on http://{}", addr);
    info!("Scalar UI: http://{}/scalar", addr);

    if let Err(e) = axum_server::bind(addr)
        .serve(app.into_make_service())
        .await
    {
        error!("HTTP server error: {}", e);
    }
}
