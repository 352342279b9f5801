//! Cost & production estimator.
//!
//! Each cost line is computed on its own and `total` is their plain sum.
//! Production is the per-kW yield scaled by system size, with a fixed
//! seasonal profile. The battery figures are linear placeholder heuristics.

use crate::config::CalculationTable;
use crate::models::equipment::{InverterOption, PanelOption};
use crate::models::site::RoofDirection;
use crate::models::sizing::{
    BatteryRecommendation, ConsumptionProfile, CostBreakdown, PeakUsage, ProductionEstimate,
    RoofRequirements, WeatherImpact,
};
use crate::services::efficiency::Efficiency;
use crate::services::size_resolver::SizePlan;

/// Cable run for an array of `roof_area_m2` (m), rounded up.
pub fn cable_length_m(roof_area_m2: f64, table: &CalculationTable) -> u64 {
    (roof_area_m2.sqrt() * table.cable_length_factor).ceil() as u64
}

pub fn costs(
    panel: &PanelOption,
    inverter: &InverterOption,
    table: &CalculationTable,
) -> CostBreakdown {
    let rates = &table.costs;
    let cable_length = cable_length_m(panel.roof_area, table);

    let panels = panel.total_cost;
    let inverter = inverter.total_cost;
    let dc_cable = cable_length * rates.dc_cable_per_meter;
    let ac_cable = cable_length * rates.ac_cable_per_meter;
    let mounting = u64::from(panel.count) * rates.mounting_per_panel;
    let installation = rates.installation;
    let net_metering = rates.net_metering;
    let transport = rates.transport;

    CostBreakdown {
        panels,
        inverter,
        dc_cable,
        ac_cable,
        mounting,
        installation,
        net_metering,
        transport,
        total: panels
            + inverter
            + dc_cable
            + ac_cable
            + mounting
            + installation
            + net_metering
            + transport,
    }
}

pub fn production(
    plan: &SizePlan,
    efficiency: &Efficiency,
    table: &CalculationTable,
) -> ProductionEstimate {
    let size = plan.system_size_kw;
    let daily = size * plan.daily_production_per_kw;
    let monthly = size * plan.monthly_production_per_kw;

    ProductionEstimate {
        daily: daily.round(),
        monthly: monthly.round(),
        annual: (daily * table.days_per_year).round(),
        by_month: table
            .monthly_variation
            .iter()
            .map(|factor| (monthly * factor).round())
            .collect(),
        peak_sun_hours: efficiency.irradiance,
    }
}

pub fn consumption(monthly_usage_kwh: f64, table: &CalculationTable) -> ConsumptionProfile {
    let percentage = table.peak_usage_percent;
    let peak = (monthly_usage_kwh * f64::from(percentage) / 100.0).round();

    ConsumptionProfile {
        monthly: monthly_usage_kwh,
        peak: PeakUsage {
            percentage,
            kwh: peak,
            time: table.peak_window.clone(),
        },
        off_peak: monthly_usage_kwh - peak,
    }
}

pub fn battery(monthly_usage_kwh: f64, table: &CalculationTable) -> BatteryRecommendation {
    let rules = &table.battery;
    BatteryRecommendation {
        recommended_capacity: monthly_usage_kwh * rules.capacity_ratio,
        autonomy_days: rules.autonomy_days,
        estimated_cost: (monthly_usage_kwh * rules.cost_per_usage_kwh).round() as u64,
        efficiency_rating: rules.efficiency_rating,
        lifespan_years: rules.lifespan_years,
    }
}

pub fn roof(
    panel: &PanelOption,
    orientation: RoofDirection,
    efficiency: &Efficiency,
) -> RoofRequirements {
    RoofRequirements {
        required_area: panel.roof_area,
        layout_efficiency: (efficiency.roof_type * 100.0).round(),
        orientation,
        shading_impact: ((1.0 - efficiency.shading) * 100.0).round(),
    }
}

pub fn weather(efficiency: &Efficiency, production: &ProductionEstimate) -> WeatherImpact {
    WeatherImpact {
        sun_hours: efficiency.irradiance,
        efficiency: efficiency.factors().system_efficiency,
        temperature_impact: ((1.0 - efficiency.losses.temperature) * 100.0).round() as u32,
        annual_production: production.annual,
    }
}
