use utoipa::OpenApi;
use crate::controllers::sizing_controller;
use crate::models::{api, equipment, site, sizing};
use crate::services::catalog;

#[derive(OpenApi)]
#[openapi(
    paths(
        sizing_controller::calculate_sizing,
        sizing_controller::get_sizing_options,
        sizing_controller::get_equipment,
        sizing_controller::health,
        sizing_controller::get_offline_mode,
        sizing_controller::set_offline_mode
    ),
    components(
        schemas(
            sizing::SizingRequest,
            sizing::SizingResult,
            site::Location,
            site::RoofDirection,
            site::RoofType,
            site::Shading,
            equipment::Panel,
            equipment::Inverter,
            equipment::PanelOption,
            equipment::InverterOption,
            catalog::CatalogSnapshot,
            api::ErrorResponse,
            api::SizingOptions,
            api::HealthResponse,
            api::OfflineMode
        )
    ),
    tags(
        (name = "solar-sizing", description = "Solar System Sizing API")
    )
)]
pub struct ApiDoc;
