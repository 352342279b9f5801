use serde::Deserialize;

use crate::models::equipment::{Inverter, Panel};

fn default_offline_mode() -> bool { false }
fn default_timeout_secs() -> u64 { 10 }
fn default_max_retries() -> u32 { 3 }
fn default_retry_delay_ms() -> u64 { 500 }

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default = "default_offline_mode")]
    pub offline_mode: bool,
    /// Remote equipment catalog. Without it the static `equipment` lists are used.
    #[serde(default)]
    pub catalog: Option<CatalogConfig>,
    #[serde(default)]
    pub equipment: EquipmentConfig,
    #[serde(default)]
    pub calculation: CalculationTable,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CatalogConfig {
    pub base_url: String,
    /// Falls back to the `CATALOG_API_KEY` environment variable.
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

/// Equipment served by the offline catalog.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct EquipmentConfig {
    #[serde(default)]
    pub panels: Vec<Panel>,
    #[serde(default)]
    pub inverters: Vec<Inverter>,
}

impl Config {
    pub fn load(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        config.calculation.validate()?;
        Ok(config)
    }
}

// ─── Calculation table ───────────────────────────────────────────────────────

/// Policy and calibration constants of the sizing model.
///
/// Everything here can be tuned from `config.json` without touching the
/// composition logic. Site multipliers (irradiance, orientation, roof type,
/// shading) are carried by the site enums instead.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct CalculationTable {
    pub losses: SystemLosses,
    /// Margin applied to usage-based sizes
    pub grid_reliability_factor: f64,
    /// Roof area taken by one panel (m²)
    pub area_per_panel_m2: f64,
    pub days_per_month: f64,
    pub days_per_year: f64,
    /// Sizes are rounded up to multiples of this (kW)
    pub size_step_kw: f64,
    pub range_minimum_factor: f64,
    pub range_maximum_factor: f64,
    /// Floor of the recommended range (kW)
    pub minimum_system_kw: f64,
    /// Seasonal production multipliers, January first
    pub monthly_variation: [f64; 12],
    pub costs: CostRates,
    /// Cable run per √m² of array area (m)
    pub cable_length_factor: f64,
    pub peak_usage_percent: u32,
    pub peak_window: String,
    pub battery: BatteryHeuristics,
    /// Most inverter units that may be paralleled for one system
    pub max_parallel_inverters: u32,
    pub calculation_version: String,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct SystemLosses {
    pub inverter_efficiency: f64,
    pub wiring: f64,
    pub dust_soiling: f64,
    pub temperature: f64,
    pub mismatch: f64,
}

/// Installation cost rates in whole currency units.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct CostRates {
    pub dc_cable_per_meter: u64,
    pub ac_cable_per_meter: u64,
    pub mounting_per_panel: u64,
    pub installation: u64,
    pub net_metering: u64,
    pub transport: u64,
}

/// Linear placeholder rules for battery recommendations.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct BatteryHeuristics {
    /// Share of monthly usage recommended as storage capacity
    pub capacity_ratio: f64,
    pub autonomy_days: u32,
    /// Cost per kWh of monthly usage
    pub cost_per_usage_kwh: f64,
    pub efficiency_rating: f64,
    pub lifespan_years: u32,
}

impl Default for SystemLosses {
    fn default() -> Self {
        Self {
            inverter_efficiency: 0.96,
            wiring: 0.98,
            dust_soiling: 0.95,
            temperature: 0.91,
            mismatch: 0.97,
        }
    }
}

impl SystemLosses {
    /// Product of the fixed derating factors.
    pub fn combined(&self) -> f64 {
        self.inverter_efficiency
            * self.wiring
            * self.dust_soiling
            * self.temperature
            * self.mismatch
    }
}

fn require_positive(name: &str, value: f64) -> Result<(), String> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(format!("calculation.{} must be a positive number, got {}", name, value))
    }
}

fn require_non_negative(name: &str, value: f64) -> Result<(), String> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(format!("calculation.{} must be zero or more, got {}", name, value))
    }
}

fn require_fraction(name: &str, value: f64) -> Result<(), String> {
    if value.is_finite() && value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(format!("calculation.{} must be in (0, 1], got {}", name, value))
    }
}

impl CalculationTable {
    /// Parallel-unit limit, never below one.
    pub fn parallel_inverter_limit(&self) -> u32 {
        self.max_parallel_inverters.max(1)
    }

    /// Rejects values that would make sizes or costs NaN, infinite or negative.
    pub fn validate(&self) -> Result<(), String> {
        let losses = &self.losses;
        require_fraction("losses.inverter_efficiency", losses.inverter_efficiency)?;
        require_fraction("losses.wiring", losses.wiring)?;
        require_fraction("losses.dust_soiling", losses.dust_soiling)?;
        require_fraction("losses.temperature", losses.temperature)?;
        require_fraction("losses.mismatch", losses.mismatch)?;

        require_positive("grid_reliability_factor", self.grid_reliability_factor)?;
        require_positive("area_per_panel_m2", self.area_per_panel_m2)?;
        require_positive("days_per_month", self.days_per_month)?;
        require_positive("days_per_year", self.days_per_year)?;
        require_positive("size_step_kw", self.size_step_kw)?;
        require_positive("range_minimum_factor", self.range_minimum_factor)?;
        require_positive("range_maximum_factor", self.range_maximum_factor)?;
        require_positive("cable_length_factor", self.cable_length_factor)?;
        require_non_negative("minimum_system_kw", self.minimum_system_kw)?;
        if self.range_minimum_factor > self.range_maximum_factor {
            let message = "calculation.range_minimum_factor exceeds range_maximum_factor";
            return Err(message.to_string());
        }

        for (month, factor) in self.monthly_variation.iter().enumerate() {
            require_non_negative(&format!("monthly_variation[{}]", month), *factor)?;
        }

        if self.peak_usage_percent > 100 {
            return Err(format!(
                "calculation.peak_usage_percent must be at most 100, got {}",
                self.peak_usage_percent
            ));
        }

        let battery = &self.battery;
        require_non_negative("battery.capacity_ratio", battery.capacity_ratio)?;
        require_non_negative("battery.cost_per_usage_kwh", battery.cost_per_usage_kwh)?;
        require_fraction("battery.efficiency_rating", battery.efficiency_rating)?;

        Ok(())
    }
}

impl Default for CostRates {
    fn default() -> Self {
        Self {
            dc_cable_per_meter: 300,
            ac_cable_per_meter: 400,
            mounting_per_panel: 8000,
            installation: 25000,
            net_metering: 50000,
            transport: 15000,
        }
    }
}

impl Default for BatteryHeuristics {
    fn default() -> Self {
        Self {
            capacity_ratio: 0.3,
            autonomy_days: 1,
            cost_per_usage_kwh: 200.0,
            efficiency_rating: 0.95,
            lifespan_years: 10,
        }
    }
}

impl Default for CalculationTable {
    fn default() -> Self {
        Self {
            losses: SystemLosses::default(),
            grid_reliability_factor: 1.05,
            area_per_panel_m2: 1.8,
            days_per_month: 30.5,
            days_per_year: 365.0,
            size_step_kw: 0.5,
            range_minimum_factor: 0.8,
            range_maximum_factor: 1.2,
            minimum_system_kw: 1.0,
            monthly_variation: [
                0.85, 0.90, 1.00, 1.10, 1.15, 1.15, 1.05, 0.95, 1.05, 1.00, 0.90, 0.85,
            ],
            costs: CostRates::default(),
            cable_length_factor: 4.0,
            peak_usage_percent: 42,
            peak_window: "6:00 PM - 9:00 PM".to_string(),
            battery: BatteryHeuristics::default(),
            max_parallel_inverters: 1,
            calculation_version: "1.0".to_string(),
        }
    }
}
