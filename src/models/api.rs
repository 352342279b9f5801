use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::models::site::{Location, RoofDirection, RoofType, Shading};
use crate::models::sizing::FORCED_SIZE_KW;

/// Error body returned by every failing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error: String,
    /// `ValidationError`, `NoSuitableEquipmentError`, `CatalogError` or `InternalError`
    pub error_type: String,
    /// Offending request field, validation errors only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OfflineMode {
    pub offline: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// Catalog currently answering equipment reads
    pub catalog: String,
    pub offline_mode: bool,
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct EquipmentQuery {
    /// Smallest inverter rating to list (kW)
    pub min_power: Option<f64>,
    /// Substitute hardcoded equipment when the catalog is unavailable (default true)
    pub fallback: Option<bool>,
}

// ─── Options ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ParameterValue {
    pub value: String,
    pub factor: f64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ParameterOptions {
    pub field: String,
    pub default: String,
    pub values: Vec<ParameterValue>,
}

#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
pub struct SizeBounds {
    pub min: f64,
    pub max: f64,
}

/// Accepted request values with their multipliers.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SizingOptions {
    pub location: ParameterOptions,
    pub roof_direction: ParameterOptions,
    pub roof_type: ParameterOptions,
    pub shading: ParameterOptions,
    /// Accepted `forceSize` range (kW)
    pub force_size: SizeBounds,
}

macro_rules! parameter_options {
    ($ty:ty) => {
        ParameterOptions {
            field: <$ty>::FIELD.to_string(),
            default: <$ty>::default().to_string(),
            values: <$ty>::ALL
                .iter()
                .map(|v| ParameterValue { value: v.to_string(), factor: v.factor() })
                .collect(),
        }
    };
}

impl SizingOptions {
    pub fn current() -> Self {
        Self {
            location: parameter_options!(Location),
            roof_direction: parameter_options!(RoofDirection),
            roof_type: parameter_options!(RoofType),
            shading: parameter_options!(Shading),
            force_size: SizeBounds {
                min: *FORCED_SIZE_KW.start(),
                max: *FORCED_SIZE_KW.end(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_cover_every_value() {
        let options = SizingOptions::current();
        assert_eq!(options.location.values.len(), Location::ALL.len());
        assert_eq!(options.location.default, "Central Pakistan");
        assert_eq!(options.shading.default, "minimal");
        assert_eq!(options.roof_direction.field, "roofDirection");
        assert_eq!(options.force_size.min, 1.0);
        assert_eq!(options.force_size.max, 15.0);

        let quetta = options.location.values.iter().find(|v| v.value == "Quetta").unwrap();
        assert_eq!(quetta.factor, 5.8);
    }

    #[test]
    fn test_error_body_omits_empty_field() {
        let body = ErrorResponse {
            error: "boom".into(),
            error_type: "InternalError".into(),
            field: None,
        };
        let value = serde_json::to_value(body).unwrap();
        assert_eq!(value, serde_json::json!({ "error": "boom", "errorType": "InternalError" }));
    }
}
