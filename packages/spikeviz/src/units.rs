//! Unit-carrying values.
//!
//! Spike times, sample times, time steps and positions travel as an explicit
//! magnitude + [`Unit`] pair. Conversions are only defined inside a single
//! physical dimension; asking for anything else is a [`VizError::UnitMismatch`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, VizError};

/// Physical dimension a [`Unit`] belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Time,
    Angle,
    Dimensionless,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Unit {
    #[serde(rename = "s")]
    Second,
    #[serde(rename = "ms")]
    Millisecond,
    #[serde(rename = "us")]
    Microsecond,
    #[serde(rename = "min")]
    Minute,
    #[serde(rename = "deg")]
    Degree,
    #[serde(rename = "rad")]
    Radian,
    #[default]
    #[serde(rename = "dimensionless")]
    Dimensionless,
}

impl Unit {
    pub fn symbol(&self) -> &'static str {
        match self {
            Unit::Second => "s",
            Unit::Millisecond => "ms",
            Unit::Microsecond => "us",
            Unit::Minute => "min",
            Unit::Degree => "deg",
            Unit::Radian => "rad",
            Unit::Dimensionless => "dimensionless",
        }
    }

    pub fn dimension(&self) -> Dimension {
        match self {
            Unit::Second | Unit::Millisecond | Unit::Microsecond | Unit::Minute => Dimension::Time,
            Unit::Degree | Unit::Radian => Dimension::Angle,
            Unit::Dimensionless => Dimension::Dimensionless,
        }
    }

    /// Size of one unit expressed in the base unit of its dimension (s, rad, 1)
    fn base_scale(&self) -> f64 {
        match self {
            Unit::Second => 1.0,
            Unit::Millisecond => 1e-3,
            Unit::Microsecond => 1e-6,
            Unit::Minute => 60.0,
            Unit::Degree => std::f64::consts::PI / 180.0,
            Unit::Radian => 1.0,
            Unit::Dimensionless => 1.0,
        }
    }

    /// Factor `f` such that `x [self] == x * f [to]`
    pub fn conversion_factor(&self, to: Unit) -> Result<f64> {
        if *self == to {
            return Ok(1.0);
        }
        if self.dimension() != to.dimension() {
            return Err(VizError::UnitMismatch {
                from: self.symbol().to_string(),
                to: to.symbol().to_string(),
            });
        }
        Ok(self.base_scale() / to.base_scale())
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Unit {
    type Err = VizError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "s" | "sec" | "second" | "seconds" => Ok(Unit::Second),
            "ms" | "millisecond" | "milliseconds" => Ok(Unit::Millisecond),
            "us" | "µs" | "microsecond" | "microseconds" => Ok(Unit::Microsecond),
            "min" | "minute" | "minutes" => Ok(Unit::Minute),
            "deg" | "degree" | "degrees" => Ok(Unit::Degree),
            "rad" | "radian" | "radians" => Ok(Unit::Radian),
            "" | "dimensionless" => Ok(Unit::Dimensionless),
            other => Err(VizError::InvalidParameter(format!("Unknown unit '{}'", other))),
        }
    }
}

/// A scalar with a unit attached
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quantity {
    pub value: f64,
    #[serde(default)]
    pub unit: Unit,
}

impl Quantity {
    pub fn new(value: f64, unit: Unit) -> Self {
        Self { value, unit }
    }

    pub fn rescale(&self, unit: Unit) -> Result<Quantity> {
        let factor = self.unit.conversion_factor(unit)?;
        Ok(Quantity::new(self.value * factor, unit))
    }

    /// Dimensionless ratio `self / other`, converting `self` into `other`'s unit first
    pub fn ratio(&self, other: &Quantity) -> Result<f64> {
        Ok(self.rescale(other.unit)?.value / other.value)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.unit)
    }
}

/// A sequence of magnitudes sharing one unit (sample times, positions)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QuantityArray {
    pub values: Vec<f64>,
    #[serde(default)]
    pub unit: Unit,
}

impl QuantityArray {
    pub fn new(values: Vec<f64>, unit: Unit) -> Self {
        Self { values, unit }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Quantity> {
        self.values.get(index).map(|&v| Quantity::new(v, self.unit))
    }

    /// Magnitudes expressed in `unit`
    pub fn values_in(&self, unit: Unit) -> Result<Vec<f64>> {
        let factor = self.unit.conversion_factor(unit)?;
        Ok(self.values.iter().map(|v| v * factor).collect())
    }
}

/// Spike timestamps of a single location
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SpikeTrain {
    pub times: Vec<f64>,
    #[serde(default)]
    pub unit: Unit,
}

impl SpikeTrain {
    pub fn new(times: Vec<f64>, unit: Unit) -> Self {
        Self { times, unit }
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn times_in(&self, unit: Unit) -> Result<Vec<f64>> {
        let factor = self.unit.conversion_factor(unit)?;
        Ok(self.times.iter().map(|t| t * factor).collect())
    }
}
