//! Efficiency composer.
//!
//! Net efficiency is a plain derating chain: the fixed system losses
//! (inverter, wiring, soiling, temperature, mismatch) multiplied by the
//! three site multipliers. No weighting, no averaging.

use crate::config::SystemLosses;
use crate::models::site::{Location, RoofDirection, RoofType, Shading};
use crate::models::sizing::EfficiencyFactors;

/// Composed efficiency of one site, with the factors that produced it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Efficiency {
    /// Net multiplier in (0, 1]
    pub system_efficiency: f64,
    /// Peak sun hours per day for the location
    pub irradiance: f64,
    pub direction: f64,
    pub roof_type: f64,
    pub shading: f64,
    pub losses: SystemLosses,
}

pub fn compose(
    losses: &SystemLosses,
    location: Location,
    roof_direction: RoofDirection,
    roof_type: RoofType,
    shading: Shading,
) -> Efficiency {
    let direction = roof_direction.factor();
    let roof = roof_type.factor();
    let shade = shading.factor();

    let system_efficiency = losses.combined() * direction * roof * shade;

    Efficiency {
        system_efficiency,
        irradiance: location.irradiance(),
        direction,
        roof_type: roof,
        shading: shade,
        losses: *losses,
    }
}

fn percent(fraction: f64) -> u32 {
    (fraction * 100.0).round() as u32
}

impl Efficiency {
    /// Usable kWh per installed kW per day.
    pub fn daily_production_per_kw(&self) -> f64 {
        self.irradiance * self.system_efficiency
    }

    /// Whole-percent view for display and audit.
    pub fn factors(&self) -> EfficiencyFactors {
        EfficiencyFactors {
            system_efficiency: percent(self.system_efficiency),
            irradiance: self.irradiance,
            direction: percent(self.direction),
            roof_type: percent(self.roof_type),
            shading: percent(self.shading),
            temperature: percent(self.losses.temperature),
            inverter: percent(self.losses.inverter_efficiency),
        }
    }
}
