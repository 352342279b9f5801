use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    response::{IntoResponse, Response},
    Json,
};

use crate::config::CalculationTable;
use crate::errors::SizingError;
use crate::models::api::{EquipmentQuery, ErrorResponse, HealthResponse, OfflineMode, SizingOptions};
use crate::models::sizing::{SizingInput, SizingRequest, SizingResult};
use crate::services::catalog::{fetch_exact, fetch_snapshot, CatalogSnapshot};
use crate::services::sizing_service;
use crate::shared_state::AppState;

/// POST /api/solar-sizing
/// Size a grid-tied system from monthly consumption
///
/// Validates the request, sizes the system, picks panels and an inverter
/// from the equipment catalog and returns the complete quote.
#[utoipa::path(
    post,
    path = "/api/solar-sizing",
    request_body = SizingRequest,
    responses(
        (status = 200, description = "Complete sizing quote", body = SizingResult),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 422, description = "No inverter can carry the system", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn calculate_sizing(
    State(state): State<AppState>,
    State(table): State<Arc<CalculationTable>>,
    payload: Result<Json<SizingRequest>, JsonRejection>,
) -> Result<Json<SizingResult>, SizingError> {
    let Json(request) = payload.map_err(|rejection| {
        SizingError::validation(
            "body",
            format!("Invalid request body: {}", rejection.body_text()),
        )
    })?;
    let input = SizingInput::try_from(request)?;

    let catalog = state.catalog();
    let result = sizing_service::calculate(catalog.as_ref(), &table, &input).await?;
    Ok(Json(result))
}

/// GET /api/solar-sizing/options
/// Accepted site parameters
///
/// Lists every accepted value of each site parameter with its multiplier,
/// the default used when it is omitted, and the forced-size bounds.
#[utoipa::path(
    get,
    path = "/api/solar-sizing/options",
    responses(
        (status = 200, description = "Accepted request values", body = SizingOptions)
    )
)]
pub async fn get_sizing_options() -> impl IntoResponse {
    Json(SizingOptions::current())
}

/// GET /api/equipment
/// Current equipment catalog
#[utoipa::path(
    get,
    path = "/api/equipment",
    params(EquipmentQuery),
    responses(
        (status = 200, description = "Available panels and inverters", body = CatalogSnapshot),
        (status = 400, description = "Invalid query", body = ErrorResponse),
        (
            status = 502,
            description = "Catalog unavailable and fallback disabled",
            body = ErrorResponse
        )
    )
)]
pub async fn get_equipment(
    State(state): State<AppState>,
    query: Result<Query<EquipmentQuery>, QueryRejection>,
) -> Response {
    let Query(query) = match query {
        Ok(q) => q,
        Err(rejection) => {
            return SizingError::validation("minPower", rejection.body_text()).into_response()
        }
    };

    let min_power = query.min_power.unwrap_or(0.0);
    if !min_power.is_finite() || min_power < 0.0 {
        return SizingError::validation("minPower", "minPower must be a non-negative number of kW")
            .into_response();
    }

    let catalog = state.catalog();
    if query.fallback.unwrap_or(true) {
        Json(fetch_snapshot(catalog.as_ref(), min_power).await).into_response()
    } else {
        match fetch_exact(catalog.as_ref(), min_power).await {
            Ok(snapshot) => Json(snapshot).into_response(),
            Err(e) => e.into_response(),
        }
    }
}

/// GET /api/health
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Service status", body = HealthResponse)
    )
)]
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        catalog: state.catalog().name().to_string(),
        offline_mode: state.is_offline(),
    })
}

/// GET /api/settings/offline-mode
/// Whether equipment is served from the local catalog
#[utoipa::path(
    get,
    path = "/api/settings/offline-mode",
    responses(
        (status = 200, description = "Current offline flag", body = OfflineMode)
    )
)]
pub async fn get_offline_mode(State(state): State<AppState>) -> impl IntoResponse {
    Json(OfflineMode { offline: state.is_offline() })
}

/// POST /api/settings/offline-mode
/// Switch between the remote and the local equipment catalog
#[utoipa::path(
    post,
    path = "/api/settings/offline-mode",
    request_body = OfflineMode,
    responses(
        (status = 200, description = "Updated offline flag", body = OfflineMode)
    )
)]
pub async fn set_offline_mode(
    State(state): State<AppState>,
    Json(body): Json<OfflineMode>,
) -> impl IntoResponse {
    state.set_offline(body.offline);
    tracing::info!("Offline mode set to {}", body.offline);
    Json(OfflineMode { offline: state.is_offline() })
}
