//! Equipment selector.
//!
//! Sizes every panel model and every inverter model against the system size,
//! then picks one of each. Panels: the caller's pick, else the catalog default,
//! else the cheapest. Inverters: the caller's pick, else the cheapest viable
//! option. Ties go to the earlier catalog entry.

use tracing::debug;

use crate::config::CalculationTable;
use crate::errors::{Result, SizingError};
use crate::models::equipment::{Inverter, InverterOption, Panel, PanelOption};

#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub panel_options: Vec<PanelOption>,
    pub inverter_options: Vec<InverterOption>,
    pub selected_panel: PanelOption,
    pub selected_inverter: InverterOption,
}

pub fn panel_count(system_size_kw: f64, panel_power_w: u32) -> u32 {
    (system_size_kw * 1000.0 / f64::from(panel_power_w)).ceil() as u32
}

pub fn panel_options(
    system_size_kw: f64,
    panels: &[Panel],
    table: &CalculationTable,
) -> Vec<PanelOption> {
    panels
        .iter()
        .map(|panel| {
            let count = panel_count(system_size_kw, panel.power);
            PanelOption {
                id: panel.id.clone(),
                brand: panel.brand.clone(),
                power: panel.power,
                unit_price: panel.price,
                count,
                roof_area: f64::from(count) * table.area_per_panel_m2,
                total_cost: u64::from(count) * panel.price,
                default_choice: panel.default_choice,
            }
        })
        .collect()
}

/// Inverter options able to carry `system_size_kw` within the parallel-unit limit.
pub fn inverter_options(
    system_size_kw: f64,
    inverters: &[Inverter],
    table: &CalculationTable,
) -> Vec<InverterOption> {
    inverters
        .iter()
        .filter_map(|inverter| {
            let count = (system_size_kw / inverter.power).ceil().max(1.0) as u32;
            if count > table.parallel_inverter_limit() {
                debug!(
                    "Skipping inverter {} ({} kW): needs {} units for {} kW",
                    inverter.brand, inverter.power, count, system_size_kw
                );
                return None;
            }
            Some(InverterOption {
                id: inverter.id.clone(),
                brand: inverter.brand.clone(),
                power: inverter.power,
                unit_price: inverter.price,
                count,
                total_cost: u64::from(count) * inverter.price,
                efficiency_rating: table.losses.inverter_efficiency,
            })
        })
        .collect()
}

/// First option with the lowest total cost.
fn cheapest<T>(options: &[T], cost: impl Fn(&T) -> u64) -> Option<&T> {
    options.iter().fold(None, |best, current| match best {
        Some(b) if cost(b) <= cost(current) => Some(b),
        _ => Some(current),
    })
}

fn find_by_id<'a, T>(
    options: &'a [T],
    wanted: &str,
    id: impl Fn(&T) -> Option<&str>,
    field: &'static str,
    label: &str,
) -> Result<&'a T> {
    options.iter().find(|o| id(o) == Some(wanted)).ok_or_else(|| {
        let accepted: Vec<&str> = options.iter().filter_map(|o| id(o)).collect();
        SizingError::invalid_choice(field, label, &accepted)
    })
}

pub fn select(
    system_size_kw: f64,
    panels: &[Panel],
    inverters: &[Inverter],
    table: &CalculationTable,
    panel_id: Option<&str>,
    inverter_id: Option<&str>,
) -> Result<Selection> {
    let panel_options = panel_options(system_size_kw, panels, table);
    let inverter_options = inverter_options(system_size_kw, inverters, table);

    if inverter_options.is_empty() {
        return Err(SizingError::NoSuitableEquipment { system_size_kw });
    }

    let selected_panel = match panel_id {
        Some(wanted) => {
            find_by_id(&panel_options, wanted, |p| p.id.as_deref(), "panelId", "panel")?
        }
        None => panel_options
            .iter()
            .find(|p| p.default_choice)
            .or_else(|| cheapest(&panel_options, |p| p.total_cost))
            .ok_or_else(|| {
                SizingError::Internal("no panels available for selection".to_string())
            })?,
    }
    .clone();

    let selected_inverter = match inverter_id {
        Some(wanted) => find_by_id(
            &inverter_options,
            wanted,
            |i| i.id.as_deref(),
            "inverterId",
            "inverter",
        )?,
        None => cheapest(&inverter_options, |i| i.total_cost)
            .ok_or(SizingError::NoSuitableEquipment { system_size_kw })?,
    }
    .clone();

    Ok(Selection {
        panel_options,
        inverter_options,
        selected_panel,
        selected_inverter,
    })
}
