use std::ops::RangeInclusive;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::{Result, SizingError};
use crate::models::equipment::{InverterOption, PanelOption};
use crate::models::site::{parse_or_default, Location, RoofDirection, RoofType, Shading};

/// Accepted range for a caller-forced system size (kW).
pub const FORCED_SIZE_KW: RangeInclusive<f64> = 1.0..=15.0;

// ─── Request ─────────────────────────────────────────────────────────────────

/// Sizing request as it arrives over the wire, before validation.
///
/// Numbers may be sent as JSON numbers or numeric strings; site parameters
/// are plain strings checked against their closed sets.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SizingRequest {
    /// Monthly consumption in kWh (> 0)
    #[schema(value_type = f64)]
    pub monthly_usage: Option<Value>,
    pub location: Option<String>,
    pub roof_direction: Option<String>,
    pub roof_type: Option<String>,
    pub shading: Option<String>,
    /// System size override in kW, within [1, 15]
    #[schema(value_type = Option<f64>)]
    pub force_size: Option<Value>,
    /// Catalog id of the panel to quote instead of the default choice
    pub panel_id: Option<String>,
    /// Catalog id of the inverter to quote instead of the cheapest one
    pub inverter_id: Option<String>,
}

fn as_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|n| n.is_finite())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

// ─── Validated input ─────────────────────────────────────────────────────────

/// Validated, typed sizing input. Absent site parameters hold their defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct SizingInput {
    pub monthly_usage_kwh: f64,
    pub location: Location,
    pub roof_direction: RoofDirection,
    pub roof_type: RoofType,
    pub shading: Shading,
    pub forced_size_kw: Option<f64>,
    pub panel_id: Option<String>,
    pub inverter_id: Option<String>,
}

impl SizingInput {
    pub fn new(monthly_usage_kwh: f64) -> Self {
        Self {
            monthly_usage_kwh,
            location: Location::default(),
            roof_direction: RoofDirection::default(),
            roof_type: RoofType::default(),
            shading: Shading::default(),
            forced_size_kw: None,
            panel_id: None,
            inverter_id: None,
        }
    }

    pub fn with_site(
        mut self,
        location: Location,
        roof_direction: RoofDirection,
        roof_type: RoofType,
        shading: Shading,
    ) -> Self {
        self.location = location;
        self.roof_direction = roof_direction;
        self.roof_type = roof_type;
        self.shading = shading;
        self
    }

    /// Checks the numeric bounds. Site parameters are valid by construction.
    pub fn validate(&self) -> Result<()> {
        let usage = self.monthly_usage_kwh;
        if !usage.is_finite() || usage <= 0.0 {
            return Err(SizingError::validation(
                "monthlyUsage",
                "Valid monthly usage in kWh is required",
            ));
        }

        if let Some(size) = self.forced_size_kw
            && !FORCED_SIZE_KW.contains(&size)
        {
            return Err(SizingError::validation(
                "forceSize",
                format!(
                    "Force size must be between {} and {} kW",
                    FORCED_SIZE_KW.start(),
                    FORCED_SIZE_KW.end()
                ),
            ));
        }

        Ok(())
    }
}

impl TryFrom<SizingRequest> for SizingInput {
    type Error = SizingError;

    fn try_from(request: SizingRequest) -> Result<Self> {
        let monthly_usage_kwh = request
            .monthly_usage
            .as_ref()
            .and_then(as_number)
            .ok_or_else(|| {
                SizingError::validation("monthlyUsage", "Valid monthly usage in kWh is required")
            })?;

        // A present but non-numeric forceSize must not be read as "absent"
        let forced_size_kw = match request.force_size.as_ref() {
            None | Some(Value::Null) => None,
            Some(raw) => Some(as_number(raw).unwrap_or(f64::NAN)),
        };

        let mut input = SizingInput::new(monthly_usage_kwh).with_site(
            parse_or_default(request.location.as_deref())?,
            parse_or_default(request.roof_direction.as_deref())?,
            parse_or_default(request.roof_type.as_deref())?,
            parse_or_default(request.shading.as_deref())?,
        );
        input.forced_size_kw = forced_size_kw;
        input.panel_id = non_blank(request.panel_id);
        input.inverter_id = non_blank(request.inverter_id);
        input.validate()?;
        Ok(input)
    }
}

#[cfg(test)]
impl SizingInput {
    pub fn with_forced_size(mut self, size_kw: f64) -> Self {
        self.forced_size_kw = Some(size_kw);
        self
    }

    pub fn with_panel(mut self, panel_id: impl Into<String>) -> Self {
        self.panel_id = Some(panel_id.into());
        self
    }

    pub fn with_inverter(mut self, inverter_id: impl Into<String>) -> Self {
        self.inverter_id = Some(inverter_id.into());
        self
    }
}

// ─── Result ──────────────────────────────────────────────────────────────────

/// Complete quote produced by one sizing calculation.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SizingResult {
    /// Quoted system size (kW)
    pub system_size: f64,
    pub recommended_range: RecommendedRange,
    pub efficiency_factors: EfficiencyFactors,
    pub equipment: EquipmentSelection,
    pub costs: CostBreakdown,
    pub roof: RoofRequirements,
    pub battery: BatteryRecommendation,
    pub production: ProductionEstimate,
    pub consumption: ConsumptionProfile,
    pub weather: WeatherImpact,
    pub metadata: CalculationMetadata,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct RecommendedRange {
    pub minimum: f64,
    pub recommended: f64,
    pub maximum: f64,
}

/// Derating chain as whole percentages; irradiance in peak sun hours.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EfficiencyFactors {
    pub system_efficiency: u32,
    pub irradiance: f64,
    pub direction: u32,
    pub roof_type: u32,
    pub shading: u32,
    pub temperature: u32,
    pub inverter: u32,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EquipmentSelection {
    pub panel_options: Vec<PanelOption>,
    pub inverters: Vec<InverterOption>,
    pub selected_panel: PanelOption,
    pub selected_inverter: InverterOption,
}

/// Itemized installation cost. `total` is the sum of the eight lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CostBreakdown {
    pub panels: u64,
    pub inverter: u64,
    pub dc_cable: u64,
    pub ac_cable: u64,
    pub mounting: u64,
    pub installation: u64,
    pub net_metering: u64,
    pub transport: u64,
    pub total: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoofRequirements {
    /// m²
    pub required_area: f64,
    pub layout_efficiency: f64,
    pub orientation: RoofDirection,
    /// Production lost to shading (%)
    pub shading_impact: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BatteryRecommendation {
    /// kWh
    pub recommended_capacity: f64,
    pub autonomy_days: u32,
    pub estimated_cost: u64,
    pub efficiency_rating: f64,
    pub lifespan_years: u32,
}

/// Production forecast in kWh.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductionEstimate {
    pub daily: f64,
    pub monthly: f64,
    pub annual: f64,
    /// January first
    pub by_month: Vec<f64>,
    pub peak_sun_hours: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConsumptionProfile {
    pub monthly: f64,
    pub peak: PeakUsage,
    pub off_peak: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PeakUsage {
    pub percentage: u32,
    #[serde(rename = "kWh")]
    pub kwh: f64,
    pub time: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WeatherImpact {
    pub sun_hours: f64,
    /// System efficiency (%)
    pub efficiency: u32,
    /// Output lost to heat (%)
    pub temperature_impact: u32,
    pub annual_production: f64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CalculationMetadata {
    pub calculation_id: Uuid,
    pub calculation_version: String,
    pub calculation_date: DateTime<Utc>,
    pub location: Location,
    pub roof_direction: RoofDirection,
    pub roof_type: RoofType,
    pub shading: Shading,
    pub forced_size: Option<f64>,
    /// True when hardcoded equipment replaced an unavailable catalog
    pub fallback_equipment: bool,
}
