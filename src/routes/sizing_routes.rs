use axum::{routing::{get, post}, Router};
use crate::controllers::sizing_controller::{
    // Sizing
    calculate_sizing, get_sizing_options,
    // Catalog
    get_equipment,
    // Service
    health, get_offline_mode, set_offline_mode,
};
use crate::shared_state::SharedState;

/// Build the `/api/*` sub-router.
/// Handlers extract `State<AppState>` and/or `State<Arc<CalculationTable>>`
/// via `FromRef<SharedState>`; a single `.with_state(shared)` covers both.
pub fn api_routes(shared: SharedState) -> Router {
    Router::new()
        .route("/solar-sizing", post(calculate_sizing))
        .route("/solar-sizing/options", get(get_sizing_options))
        .route("/equipment", get(get_equipment))
        .route("/health", get(health))
        .route("/settings/offline-mode", get(get_offline_mode).post(set_offline_mode))
        .with_state(shared)
}
