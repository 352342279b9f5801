use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::errors::SizingError;

/// Declares a closed site parameter: wire names, the multiplier each value
/// contributes and the value substituted when the caller omits it.
macro_rules! site_parameter {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            field: $field:literal,
            label: $label:literal,
            default: $default:ident,
            $( $variant:ident = $wire:literal => $factor:expr ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
        pub enum $name {
            $( #[serde(rename = $wire)] $variant, )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];
            /// Name of the request field carrying this parameter.
            pub const FIELD: &'static str = $field;

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $wire,)+
                }
            }

            pub fn factor(self) -> f64 {
                match self {
                    $($name::$variant => $factor,)+
                }
            }

            pub fn accepted_values() -> Vec<&'static str> {
                Self::ALL.iter().map(|v| v.as_str()).collect()
            }
        }

        impl Default for $name {
            fn default() -> Self {
                $name::$default
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = SizingError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str() == s)
                    .ok_or_else(|| {
                        SizingError::invalid_choice($field, $label, &Self::accepted_values())
                    })
            }
        }
    };
}

site_parameter! {
    /// Region of the installation. The factor is the average usable solar
    /// input as equivalent full-sun hours per day.
    pub enum Location {
        field: "location",
        label: "location",
        default: CentralPakistan,
        NorthernPakistan = "Northern Pakistan" => 4.8,
        CentralPakistan = "Central Pakistan" => 5.3,
        SouthernPakistan = "Southern Pakistan" => 5.7,
        Islamabad = "Islamabad" => 5.3,
        Lahore = "Lahore" => 5.2,
        Karachi = "Karachi" => 5.6,
        Peshawar = "Peshawar" => 5.4,
        Quetta = "Quetta" => 5.8,
    }
}

site_parameter! {
    /// Compass direction the panels face.
    pub enum RoofDirection {
        field: "roofDirection",
        label: "roof direction",
        default: South,
        South = "south" => 1.00,
        Southeast = "southeast" => 0.96,
        Southwest = "southwest" => 0.96,
        East = "east" => 0.88,
        West = "west" => 0.88,
        North = "north" => 0.75,
        Northeast = "northeast" => 0.78,
        Northwest = "northwest" => 0.78,
    }
}

site_parameter! {
    /// Roof pitch class. `Optimal` is a 25-30° pitch.
    pub enum RoofType {
        field: "roofType",
        label: "roof type",
        default: Standard,
        Flat = "flat" => 0.90,
        Standard = "standard" => 0.96,
        Steep = "steep" => 0.93,
        Optimal = "optimal" => 1.00,
    }
}

site_parameter! {
    /// Shading over the array. `Significant` means more than 25% shade in peak hours.
    pub enum Shading {
        field: "shading",
        label: "shading",
        default: Minimal,
        Clear = "none" => 1.00,
        Minimal = "minimal" => 0.95,
        Moderate = "moderate" => 0.85,
        Significant = "significant" => 0.70,
    }
}

impl Location {
    /// Peak sun hours per day for the region.
    pub fn irradiance(self) -> f64 {
        self.factor()
    }
}

/// Parses an optional wire value, substituting the default when absent or blank.
pub fn parse_or_default<T>(raw: Option<&str>) -> Result<T, SizingError>
where
    T: FromStr<Err = SizingError> + Default,
{
    match raw.map(str::trim) {
        Some(value) if !value.is_empty() => value.parse(),
        _ => Ok(T::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names_round_trip() {
        for location in Location::ALL {
            assert_eq!(location.as_str().parse::<Location>().unwrap(), *location);
        }
        assert_eq!("southwest".parse::<RoofDirection>().unwrap(), RoofDirection::Southwest);
        assert_eq!(serde_json::to_string(&Location::Karachi).unwrap(), "\"Karachi\"");
    }

    #[test]
    fn test_factor_ranges() {
        for l in Location::ALL {
            assert!((4.8..=5.8).contains(&l.irradiance()));
        }
        for d in RoofDirection::ALL {
            assert!((0.75..=1.0).contains(&d.factor()));
        }
        for r in RoofType::ALL {
            assert!((0.90..=1.0).contains(&r.factor()));
        }
        for s in Shading::ALL {
            assert!((0.70..=1.0).contains(&s.factor()));
        }
    }

    #[test]
    fn test_defaults() {
        assert_eq!(Location::default(), Location::CentralPakistan);
        assert_eq!(RoofDirection::default(), RoofDirection::South);
        assert_eq!(RoofType::default(), RoofType::Standard);
        assert_eq!(Shading::default(), Shading::Minimal);
    }

    #[test]
    fn test_unknown_value_is_rejected_with_accepted_list() {
        let err = "upward".parse::<RoofDirection>().unwrap_err();
        match err {
            SizingError::Validation { field, message } => {
                assert_eq!(field, "roofDirection");
                assert!(message.contains("south, southeast"), "{message}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        // Lookups are exact
        assert!("South".parse::<RoofDirection>().is_err());
    }

    #[test]
    fn test_parse_or_default() {
        assert_eq!(parse_or_default::<Shading>(None).unwrap(), Shading::Minimal);
        assert_eq!(parse_or_default::<Shading>(Some("")).unwrap(), Shading::Minimal);
        assert_eq!(parse_or_default::<Shading>(Some("none")).unwrap(), Shading::Clear);
        assert!(parse_or_default::<Shading>(Some("heavy")).is_err());
    }
}
