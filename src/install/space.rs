//! Free-space parsing and normalisation to megabytes
//!
//! Hosts report free space as a number with a unit suffix (`2.5G`, `512M`,
//! `2048K`). Anything that cannot be understood becomes [`SpaceUnit::Unknown`],
//! and an unknown measurement never blocks the installation.

use std::fmt;

/// Unit suffix of a space measurement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpaceUnit {
    Kilo,
    Mega,
    Giga,
    Tera,
    Unknown,
}

impl SpaceUnit {
    /// Parse a suffix such as `G`, `g`, `GB`, `Gi` or `GiB`
    pub fn parse(suffix: &str) -> Self {
        let upper = suffix.trim().to_ascii_uppercase();
        let mut chars = upper.chars();
        let unit = match chars.next() {
            Some('K') => Self::Kilo,
            Some('M') => Self::Mega,
            Some('G') => Self::Giga,
            Some('T') => Self::Tera,
            _ => return Self::Unknown,
        };
        match chars.as_str() {
            "" | "B" | "I" | "IB" => unit,
            _ => Self::Unknown,
        }
    }
}

/// Which arithmetic a reading is normalised with
///
/// `Rounding` is used for human-readable readings. `Truncating` is the
/// integer-only path used for the kilobyte fallback reading: it drops the
/// fractional part of the value before scaling and rounds the result down, so
/// the same text can normalise differently on the two paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arithmetic {
    Rounding,
    Truncating,
}

/// A raw free-space string as reported by the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpaceReading {
    pub raw: String,
    pub arithmetic: Arithmetic,
}

impl SpaceReading {
    pub fn human(raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            arithmetic: Arithmetic::Rounding,
        }
    }

    pub fn kilobytes(kb: u64) -> Self {
        Self {
            raw: format!("{kb}K"),
            arithmetic: Arithmetic::Truncating,
        }
    }
}

/// Parsed and normalised free space
#[derive(Debug, Clone, PartialEq)]
pub struct SpaceMeasurement {
    pub raw: String,
    pub numeric_value: Option<f64>,
    pub unit: SpaceUnit,
    /// `None` exactly when `unit` is `Unknown`
    pub normalized_mb: Option<u64>,
}

impl SpaceMeasurement {
    pub fn parse(raw: &str) -> Self {
        Self::parse_with(raw, Arithmetic::Rounding)
    }

    pub fn from_reading(reading: &SpaceReading) -> Self {
        Self::parse_with(&reading.raw, reading.arithmetic)
    }

    pub fn parse_with(raw: &str, arithmetic: Arithmetic) -> Self {
        let trimmed = raw.trim();
        let split = trimmed
            .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == ','))
            .unwrap_or(trimmed.len());
        let (number, suffix) = trimmed.split_at(split);

        let numeric_value = number
            .replace(',', ".")
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && *v >= 0.0);
        let unit = match numeric_value {
            Some(_) => SpaceUnit::parse(suffix),
            None => SpaceUnit::Unknown,
        };
        let normalized_mb = numeric_value.and_then(|value| normalize(value, unit, arithmetic));

        Self {
            raw: raw.to_string(),
            numeric_value,
            unit,
            normalized_mb: if unit == SpaceUnit::Unknown { None } else { normalized_mb },
        }
    }

    /// Whether at least `threshold_mb` is free. Unknown readings pass.
    pub fn is_sufficient(&self, threshold_mb: u64) -> bool {
        match self.normalized_mb {
            Some(mb) => mb >= threshold_mb,
            None => true,
        }
    }
}

impl fmt::Display for SpaceMeasurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.normalized_mb {
            Some(mb) => write!(f, "{mb} MB"),
            None => write!(f, "unknown ({})", self.raw.trim()),
        }
    }
}

fn normalize(value: f64, unit: SpaceUnit, arithmetic: Arithmetic) -> Option<u64> {
    match arithmetic {
        Arithmetic::Rounding => {
            let mb = match unit {
                SpaceUnit::Kilo => value / 1024.0,
                SpaceUnit::Mega => value,
                SpaceUnit::Giga => value * 1024.0,
                SpaceUnit::Tera => value * 1024.0 * 1024.0,
                SpaceUnit::Unknown => return None,
            };
            Some(mb.round() as u64)
        }
        Arithmetic::Truncating => {
            let whole = value.trunc() as u64;
            match unit {
                SpaceUnit::Kilo => Some(whole / 1024),
                SpaceUnit::Mega => Some(whole),
                SpaceUnit::Giga => whole.checked_mul(1024),
                SpaceUnit::Tera => whole.checked_mul(1024 * 1024),
                SpaceUnit::Unknown => None,
            }
        }
    }
}
