//! Size resolver: monthly consumption → system size in kW.
//!
//! Usage-based sizes are always rounded *up* to the size step, then widened by
//! the grid reliability margin and rounded up again. A forced size is taken
//! verbatim. The recommended range is always derived from the usage-based
//! figure so it stays meaningful next to a forced size.

use crate::config::CalculationTable;
use crate::models::sizing::RecommendedRange;
use crate::services::efficiency::Efficiency;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizePlan {
    /// Size that gets quoted (kW)
    pub system_size_kw: f64,
    pub forced: bool,
    /// Unrounded usage-based requirement (kW)
    pub raw_requirement_kw: f64,
    /// Usage-based size before the reliability margin (kW)
    pub base_recommendation_kw: f64,
    /// Usage-based size after the margin (kW)
    pub recommended_kw: f64,
    pub range: RecommendedRange,
    pub daily_production_per_kw: f64,
    pub monthly_production_per_kw: f64,
}

pub fn round_up_to_step(value: f64, step: f64) -> f64 {
    (value / step).ceil() * step
}

pub fn round_down_to_step(value: f64, step: f64) -> f64 {
    (value / step).floor() * step
}

pub fn resolve(
    monthly_usage_kwh: f64,
    efficiency: &Efficiency,
    forced_size_kw: Option<f64>,
    table: &CalculationTable,
) -> SizePlan {
    let step = table.size_step_kw;
    let daily_production_per_kw = efficiency.daily_production_per_kw();
    let monthly_production_per_kw = daily_production_per_kw * table.days_per_month;

    let raw_requirement_kw = monthly_usage_kwh / monthly_production_per_kw;
    let base_recommendation_kw = round_up_to_step(raw_requirement_kw, step);
    let recommended_kw =
        round_up_to_step(base_recommendation_kw * table.grid_reliability_factor, step);

    let range = RecommendedRange {
        minimum: round_down_to_step(base_recommendation_kw * table.range_minimum_factor, step)
            .max(table.minimum_system_kw),
        recommended: recommended_kw,
        maximum: round_up_to_step(base_recommendation_kw * table.range_maximum_factor, step),
    };

    let (system_size_kw, forced) = match forced_size_kw {
        Some(size) => (size, true),
        None => (recommended_kw, false),
    };

    SizePlan {
        system_size_kw,
        forced,
        raw_requirement_kw,
        base_recommendation_kw,
        recommended_kw,
        range,
        daily_production_per_kw,
        monthly_production_per_kw,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::site::{Location, RoofDirection, RoofType, Shading};
    use crate::services::efficiency::compose;

    fn default_efficiency(table: &CalculationTable) -> Efficiency {
        compose(
            &table.losses,
            Location::CentralPakistan,
            RoofDirection::South,
            RoofType::Standard,
            Shading::Minimal,
        )
    }

    fn is_step_multiple(value: f64, step: f64) -> bool {
        let ratio = value / step;
        (ratio - ratio.round()).abs() < 1e-9
    }

    #[test]
    fn test_rounding_helpers() {
        assert_eq!(round_up_to_step(4.01, 0.5), 4.5);
        assert_eq!(round_up_to_step(4.5, 0.5), 4.5);
        assert_eq!(round_down_to_step(4.49, 0.5), 4.0);
        assert_eq!(round_down_to_step(0.3, 0.5), 0.0);
    }

    #[test]
    fn test_typical_household() {
        let table = CalculationTable::default();
        let eff = default_efficiency(&table);
        let plan = resolve(600.0, &eff, None, &table);

        // 5.3 h × ~0.7195 × 30.5 d ≈ 116.3 kWh per kW-month → 5.16 kW raw
        assert!((plan.raw_requirement_kw - 5.159).abs() < 0.01, "{}", plan.raw_requirement_kw);
        assert_eq!(plan.base_recommendation_kw, 5.5);
        // 5.5 × 1.05 = 5.775 → 6.0
        assert_eq!(plan.system_size_kw, 6.0);
        assert!(!plan.forced);
        assert_eq!(plan.range.minimum, 4.0);
        assert_eq!(plan.range.recommended, 6.0);
        assert_eq!(plan.range.maximum, 7.0);
    }

    #[test]
    fn test_forced_size_is_passed_through() {
        let table = CalculationTable::default();
        let eff = default_efficiency(&table);

        for forced in [1.0, 5.0, 7.3, 15.0] {
            let plan = resolve(600.0, &eff, Some(forced), &table);
            assert_eq!(plan.system_size_kw, forced);
            assert!(plan.forced);
            // Range still reflects consumption, not the override
            assert_eq!(plan.range.recommended, 6.0);
        }
    }

    #[test]
    fn test_sizes_are_step_multiples_and_never_undersized() {
        let table = CalculationTable::default();
        let eff = default_efficiency(&table);

        let mut usage = 10.0;
        while usage < 5000.0 {
            let plan = resolve(usage, &eff, None, &table);
            assert!(is_step_multiple(plan.system_size_kw, 0.5), "{usage}: {}", plan.system_size_kw);
            assert!(plan.system_size_kw >= plan.raw_requirement_kw);
            assert!(plan.range.minimum >= 1.0);
            assert!(plan.range.minimum <= plan.range.recommended);
            assert!(plan.range.recommended <= plan.range.maximum);
            usage += 37.5;
        }
    }

    #[test]
    fn test_size_is_monotonic_in_usage() {
        let table = CalculationTable::default();
        let eff = default_efficiency(&table);

        let mut previous = 0.0;
        for usage in (1..=400).map(|i| f64::from(i) * 12.5) {
            let size = resolve(usage, &eff, None, &table).system_size_kw;
            assert!(size >= previous, "size dropped at {usage} kWh");
            previous = size;
        }
    }

    #[test]
    fn test_tiny_usage_clamps_range_minimum() {
        let table = CalculationTable::default();
        let eff = default_efficiency(&table);
        let plan = resolve(5.0, &eff, None, &table);

        assert_eq!(plan.base_recommendation_kw, 0.5);
        assert_eq!(plan.system_size_kw, 1.0);
        assert_eq!(plan.range.minimum, 1.0);
    }
}
