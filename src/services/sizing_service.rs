//! Sizing pipeline: validate → compose efficiency → resolve size → read the
//! catalog → select equipment → estimate → assemble the quote.

use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;

use crate::config::CalculationTable;
use crate::errors::{Result, SizingError};
use crate::models::sizing::{CalculationMetadata, EquipmentSelection, SizingInput, SizingResult};
use crate::services::catalog::{fetch_snapshot, CatalogSnapshot, EquipmentCatalog};
use crate::services::efficiency::{compose, Efficiency};
use crate::services::equipment_selector::select;
use crate::services::estimator;
use crate::services::size_resolver::{resolve, SizePlan};

/// Catalog-independent part of a calculation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizingPlan {
    pub efficiency: Efficiency,
    pub size: SizePlan,
}

impl SizingPlan {
    /// Smallest unit rating worth asking the catalog for.
    pub fn min_inverter_power_kw(&self, table: &CalculationTable) -> f64 {
        self.size.system_size_kw / f64::from(table.parallel_inverter_limit())
    }
}

pub fn plan(input: &SizingInput, table: &CalculationTable) -> Result<SizingPlan> {
    input.validate()?;
    table.validate().map_err(SizingError::Internal)?;

    let efficiency = compose(
        &table.losses,
        input.location,
        input.roof_direction,
        input.roof_type,
        input.shading,
    );
    let size = resolve(input.monthly_usage_kwh, &efficiency, input.forced_size_kw, table);

    Ok(SizingPlan { efficiency, size })
}

/// Builds the quote for a planned size from one catalog snapshot.
pub fn quote(
    input: &SizingInput,
    table: &CalculationTable,
    plan: &SizingPlan,
    snapshot: &CatalogSnapshot,
    calculated_at: DateTime<Utc>,
) -> Result<SizingResult> {
    let SizingPlan { efficiency, size } = plan;

    let selection = select(
        size.system_size_kw,
        &snapshot.panels,
        &snapshot.inverters,
        table,
        input.panel_id.as_deref(),
        input.inverter_id.as_deref(),
    )?;

    let costs = estimator::costs(&selection.selected_panel, &selection.selected_inverter, table);
    let production = estimator::production(size, efficiency, table);
    let roof = estimator::roof(&selection.selected_panel, input.roof_direction, efficiency);
    let weather = estimator::weather(efficiency, &production);

    Ok(SizingResult {
        system_size: size.system_size_kw,
        recommended_range: size.range,
        efficiency_factors: efficiency.factors(),
        equipment: EquipmentSelection {
            panel_options: selection.panel_options,
            inverters: selection.inverter_options,
            selected_panel: selection.selected_panel,
            selected_inverter: selection.selected_inverter,
        },
        costs,
        roof,
        battery: estimator::battery(input.monthly_usage_kwh, table),
        production,
        consumption: estimator::consumption(input.monthly_usage_kwh, table),
        weather,
        metadata: CalculationMetadata {
            calculation_id: Uuid::new_v4(),
            calculation_version: table.calculation_version.clone(),
            calculation_date: calculated_at,
            location: input.location,
            roof_direction: input.roof_direction,
            roof_type: input.roof_type,
            shading: input.shading,
            forced_size: input.forced_size_kw,
            fallback_equipment: snapshot.used_fallback(),
        },
    })
}

/// Runs a full calculation against `catalog`.
pub async fn calculate(
    catalog: &dyn EquipmentCatalog,
    table: &CalculationTable,
    input: &SizingInput,
) -> Result<SizingResult> {
    let plan = plan(input, table)?;
    let snapshot = fetch_snapshot(catalog, plan.min_inverter_power_kw(table)).await;
    let result = quote(input, table, &plan, &snapshot, Utc::now())?;

    info!(
        "Sized {} kW for {} kWh/month ({}): {} x {} W panels, {} kW inverter capacity, total {}{}",
        result.system_size,
        input.monthly_usage_kwh,
        input.location,
        result.equipment.selected_panel.count,
        result.equipment.selected_panel.power,
        result.equipment.selected_inverter.total_power(),
        result.costs.total,
        if snapshot.used_fallback() { " [fallback equipment]" } else { "" }
    );

    Ok(result)
}
