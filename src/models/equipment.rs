use serde::{de, Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

fn default_available() -> bool { true }

/// Reads a price sent as any JSON number (`45000`, `45000.00`), rounded to
/// whole currency units.
fn whole_currency<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = f64::deserialize(deserializer)?;
    if !value.is_finite() || value < 0.0 {
        return Err(de::Error::custom(format!("invalid price {}", value)));
    }
    Ok(value.round() as u64)
}

// ─── Catalog rows ────────────────────────────────────────────────────────────

/// Solar panel model as stored in the equipment catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Panel {
    #[serde(default)]
    pub id: Option<String>,
    pub brand: String,
    /// Rated power (W)
    pub power: u32,
    /// Unit price (whole currency units)
    #[serde(deserialize_with = "whole_currency")]
    pub price: u64,
    #[serde(default)]
    pub default_choice: bool,
    #[serde(default = "default_available")]
    pub availability: bool,
}

/// Inverter model as stored in the equipment catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Inverter {
    #[serde(default)]
    pub id: Option<String>,
    pub brand: String,
    /// Rated power (kW)
    pub power: f64,
    /// Unit price (whole currency units)
    #[serde(deserialize_with = "whole_currency")]
    pub price: u64,
    #[serde(default = "default_available")]
    pub availability: bool,
}

// ─── Computed options ────────────────────────────────────────────────────────

/// A panel model sized for one system: how many units, how much roof, what cost.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PanelOption {
    pub id: Option<String>,
    pub brand: String,
    pub power: u32,
    pub unit_price: u64,
    pub count: u32,
    /// Roof area needed for `count` panels (m²)
    pub roof_area: f64,
    pub total_cost: u64,
    pub default_choice: bool,
}

/// An inverter model able to carry the system, possibly as parallel units.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InverterOption {
    pub id: Option<String>,
    pub brand: String,
    pub power: f64,
    pub unit_price: u64,
    pub count: u32,
    pub total_cost: u64,
    pub efficiency_rating: f64,
}

impl InverterOption {
    /// Combined rating of all units (kW).
    pub fn total_power(&self) -> f64 {
        self.power * f64::from(self.count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decimal_prices_round_to_whole_units() {
        let panels: Vec<Panel> = serde_json::from_str(
            r#"[
                { "brand": "A", "power": 450, "price": 45000.00 },
                { "brand": "B", "power": 550, "price": 51999.5 },
                { "brand": "C", "power": 600, "price": 60000 }
            ]"#,
        )
        .unwrap();
        let prices: Vec<u64> = panels.iter().map(|p| p.price).collect();
        assert_eq!(prices, [45000, 52000, 60000]);

        let inverter: Inverter =
            serde_json::from_str(r#"{ "brand": "I", "power": 8.0, "price": 149999.99 }"#).unwrap();
        assert_eq!(inverter.price, 150000);
    }

    #[test]
    fn test_negative_or_textual_price_is_rejected() {
        let negative = r#"{ "brand": "A", "power": 450, "price": -1 }"#;
        let textual = r#"{ "brand": "A", "power": 450, "price": "cheap" }"#;
        assert!(serde_json::from_str::<Panel>(negative).is_err());
        assert!(serde_json::from_str::<Panel>(textual).is_err());
    }

    #[test]
    fn test_total_power_counts_every_unit() {
        let option = InverterOption {
            id: None,
            brand: "G".into(),
            power: 5.0,
            unit_price: 90000,
            count: 3,
            total_cost: 270000,
            efficiency_rating: 0.96,
        };
        assert_eq!(option.total_power(), 15.0);
    }
}
