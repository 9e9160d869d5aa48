//! Measurement units for road distance and speed.

use core::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

const SECONDS_PER_HOUR: f64 = 3600.0;

/// Unit system of the configured road distance and of reported speeds.
///
/// Imperial distances are miles and speeds MPH; metric distances are
/// kilometres and speeds km/h.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    #[default]
    Imperial,
    Metric,
}

impl UnitSystem {
    /// Display label for speeds in this unit system.
    pub fn label(&self) -> &'static str {
        match self {
            UnitSystem::Imperial => "MPH",
            UnitSystem::Metric => "km/h",
        }
    }

    /// Speed of covering `distance` (miles or km) in `elapsed`.
    ///
    /// Returns `None` when `elapsed` is zero.
    pub fn speed(&self, distance: f64, elapsed: Duration) -> Option<Speed> {
        let hours = elapsed.as_secs_f64() / SECONDS_PER_HOUR;
        if hours <= 0.0 {
            return None;
        }
        Some(Speed {
            value: distance / hours,
            units: *self,
        })
    }
}

impl FromStr for UnitSystem {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "imperial" => Ok(UnitSystem::Imperial),
            "metric" => Ok(UnitSystem::Metric),
            other => Err(Error::InvalidConfiguration(format!(
                "unknown unit system '{other}', expected 'imperial' or 'metric'"
            ))),
        }
    }
}

impl fmt::Display for UnitSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitSystem::Imperial => f.write_str("imperial"),
            UnitSystem::Metric => f.write_str("metric"),
        }
    }
}

/// A measured speed and its unit system.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Speed {
    pub value: f64,
    pub units: UnitSystem,
}

impl Speed {
    pub fn exceeds(&self, limit: f64) -> bool {
        self.value > limit
    }
}

impl fmt::Display for Speed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1} {}", self.value, self.units.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels() {
        assert_eq!(UnitSystem::Imperial.label(), "MPH");
        assert_eq!(UnitSystem::Metric.label(), "km/h");
    }

    #[test]
    fn test_from_str() {
        assert_eq!("imperial".parse::<UnitSystem>().unwrap(), UnitSystem::Imperial);
        assert_eq!(" Metric ".parse::<UnitSystem>().unwrap(), UnitSystem::Metric);
        assert!(matches!(
            "nautical".parse::<UnitSystem>(),
            Err(Error::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_speed_over_one_hour() {
        let speed = UnitSystem::Metric
            .speed(50.0, Duration::from_secs(3600))
            .unwrap();
        assert!((speed.value - 50.0).abs() < 1e-12);
        assert_eq!(speed.units, UnitSystem::Metric);
    }

    #[test]
    fn test_speed_short_interval() {
        // 0.01 miles in 1.8 s is 20 MPH
        let speed = UnitSystem::Imperial
            .speed(0.01, Duration::from_millis(1800))
            .unwrap();
        assert!((speed.value - 20.0).abs() < 1e-9);
        assert_eq!(speed.to_string(), "20.0 MPH");
        assert!(speed.exceeds(19.9));
        assert!(!speed.exceeds(20.0));
    }

    #[test]
    fn test_zero_elapsed_has_no_speed() {
        assert!(UnitSystem::Imperial.speed(0.01, Duration::ZERO).is_none());
    }
}
