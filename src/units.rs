use std::{fmt, str::FromStr};

use crate::error::{Error, Result};

/// Distance units accepted by address queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DistanceUnit {
    /// `m`
    Meters,
    /// `km`
    Kilometers,
    /// `in`
    Inches,
    /// `ft`
    Feet,
    /// `yd`
    Yards,
    /// `mi`
    Miles,
}

impl DistanceUnit {
    /// Every unit, in the order error messages list them.
    pub const ALL: [DistanceUnit; 6] = [
        DistanceUnit::Meters,
        DistanceUnit::Kilometers,
        DistanceUnit::Inches,
        DistanceUnit::Feet,
        DistanceUnit::Yards,
        DistanceUnit::Miles,
    ];

    /// The symbol accepted by [`str::parse`].
    pub fn symbol(self) -> &'static str {
        match self {
            DistanceUnit::Meters => "m",
            DistanceUnit::Kilometers => "km",
            DistanceUnit::Inches => "in",
            DistanceUnit::Feet => "ft",
            DistanceUnit::Yards => "yd",
            DistanceUnit::Miles => "mi",
        }
    }

    /// Length of one unit in meters.
    pub fn meters(self) -> f64 {
        match self {
            DistanceUnit::Meters => 1.0,
            DistanceUnit::Kilometers => 1000.0,
            DistanceUnit::Inches => 0.0254,
            DistanceUnit::Feet => 0.3048,
            DistanceUnit::Yards => 0.9144,
            DistanceUnit::Miles => 1609.34,
        }
    }

    /// Converts `value` of this unit into meters.
    pub fn to_meters(self, value: f64) -> f64 {
        value * self.meters()
    }
}

impl FromStr for DistanceUnit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        DistanceUnit::ALL
            .into_iter()
            .find(|unit| unit.symbol() == s)
            .ok_or_else(|| Error::InvalidUnit {
                unit: s.to_owned(),
                valid: DistanceUnit::ALL.map(DistanceUnit::symbol).join(", "),
            })
    }
}

impl fmt::Display for DistanceUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Converts `value` expressed in the unit named by `unit` into meters.
pub fn to_meters(value: f64, unit: &str) -> Result<f64> {
    Ok(unit.parse::<DistanceUnit>()?.to_meters(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_every_unit() {
        assert_eq!(to_meters(1.0, "m").unwrap(), 1.0);
        assert_eq!(to_meters(1.0, "km").unwrap(), 1000.0);
        assert_eq!(to_meters(1.0, "mi").unwrap(), 1609.34);
        assert_eq!(to_meters(100.0, "in").unwrap(), 2.54);
        assert_eq!(to_meters(10.0, "ft").unwrap(), 3.048);
        assert_eq!(to_meters(2.0, "yd").unwrap(), 1.8288);
    }

    #[test]
    fn unknown_unit_names_the_valid_set() {
        let err = to_meters(1.0, "furlong").unwrap_err();
        match err {
            Error::InvalidUnit { unit, valid } => {
                assert_eq!(unit, "furlong");
                assert_eq!(valid, "m, km, in, ft, yd, mi");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn symbols_are_case_sensitive() {
        assert!("KM".parse::<DistanceUnit>().is_err());
        assert_eq!("km".parse::<DistanceUnit>().unwrap(), DistanceUnit::Kilometers);
    }
}
