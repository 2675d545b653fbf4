//! Parameter declarations and their value shapes.
//!
//! A `Parameter` pairs a declared value shape with a `Vary` mode and a
//! `Distribution`. The shapes form an explicit tagged union; the resolver
//! matches exhaustively on `(vary, shape)`, so an unsupported pairing is a
//! diagnosed error rather than a silently skipped branch.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Sampling/interpolation space for a varied parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Distribution {
    #[default]
    Uniform,
    #[serde(rename = "logarithmic")]
    Log,
}

impl fmt::Display for Distribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Distribution::Uniform => "uniform",
            Distribution::Log => "logarithmic",
        })
    }
}

/// How a parameter's value differs across and within datapoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Vary {
    /// Copy the declared value verbatim into every datapoint.
    #[default]
    Fixed,
    /// One scalar per datapoint, ramped from min to max across the ensemble.
    #[serde(rename = "const_within_datapoint")]
    Const,
    /// Spatially varying within a datapoint (noise field or random heat pump
    /// location), fresh per datapoint.
    #[serde(rename = "spatially_vary_within_datapoint")]
    Space,
    List,
}

impl fmt::Display for Vary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Vary::Fixed => "fixed",
            Vary::Const => "const_within_datapoint",
            Vary::Space => "spatially_vary_within_datapoint",
            Vary::List => "list",
        })
    }
}

/// An inclusive `[min, max]` range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MinMax {
    pub min: f64,
    pub max: f64,
}

impl MinMax {
    pub fn new(min: f64, max: f64) -> Result<Self, EngineError> {
        if max < min {
            return Err(EngineError::InvalidRange { min, max });
        }
        Ok(Self { min, max })
    }
}

impl fmt::Display for MinMax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} <= {}]", self.min, self.max)
    }
}

/// A single entry of a time series: either already concrete or a range to be
/// resolved by one random draw.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SeriesValue {
    Range(MinMax),
    Scalar(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesEntry {
    pub time: f64,
    pub value: SeriesValue,
}

/// Time-indexed values, e.g. an injection schedule. Entry order is the
/// declaration order and is preserved through resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    #[serde(default = "default_time_unit")]
    pub time_unit: String,
    pub entries: Vec<SeriesEntry>,
}

fn default_time_unit() -> String {
    "year".to_string()
}

impl TimeSeries {
    /// A series with a single entry at time 0.
    pub fn at_time_zero(value: SeriesValue) -> Self {
        Self {
            time_unit: default_time_unit(),
            entries: vec![SeriesEntry { time: 0.0, value }],
        }
    }
}

/// Frequency of a perlin spec: either three fixed per-axis factors or a range
/// from which the three factors are drawn at field-generation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Frequency {
    Range(MinMax),
    Fixed(Vec<f64>),
}

/// Descriptor of a spatially varying noise field. Larger frequency values
/// yield a finer-grained field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PerlinSpec {
    pub frequency: Frequency,
    pub min: f64,
    pub max: f64,
}

/// A plain three-component vector value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Xyz {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// A heat pump location, tagged by unit. Expansion produces 1-based cell
/// indices; the conversion pass rewrites them to physical coordinates exactly
/// once, and the tag is what makes a second conversion detectable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Location {
    Cells([f64; 3]),
    Coords([f64; 3]),
}

impl Location {
    pub fn triple(&self) -> [f64; 3] {
        match self {
            Location::Cells(v) | Location::Coords(v) => *v,
        }
    }
}

/// An operational heat pump value (injection temperature or rate).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HeatPumpValue {
    Series(TimeSeries),
    Range(MinMax),
    Scalar(f64),
}

/// A single heat pump: a point source/sink with a location and time-varying
/// injection temperature (°C) and rate (m³/s).
///
/// `location == None` means the pump is placed randomly per datapoint and is
/// only legal under `Vary::Space`, sparing the user from inventing unique
/// placeholder locations that would trip the duplicates check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HeatPump {
    pub location: Option<Location>,
    pub injection_temp: HeatPumpValue,
    pub injection_rate: HeatPumpValue,
}

/// A generator spec: expanded into `number` concrete `HeatPump`s with
/// randomized, collision-free locations before variation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HeatPumpGroup {
    pub number: usize,
    pub injection_temp: HeatPumpValue,
    pub injection_rate: HeatPumpValue,
}

/// All shapes a parameter value can take in a settings file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamValue {
    Scalar(f64),
    IntList(Vec<i64>),
    MinMax(MinMax),
    TimeSeries(TimeSeries),
    Perlin(PerlinSpec),
    Xyz(Xyz),
    HeatPump(HeatPump),
    HeatPumpGroup(HeatPumpGroup),
    /// Deferred: an external loading step replaces this with one of the other
    /// shapes before variation starts.
    File(PathBuf),
}

impl ParamValue {
    /// Shape name for diagnostics.
    pub fn shape(&self) -> &'static str {
        match self {
            ParamValue::Scalar(_) => "scalar",
            ParamValue::IntList(_) => "int_list",
            ParamValue::MinMax(_) => "min_max",
            ParamValue::TimeSeries(_) => "time_series",
            ParamValue::Perlin(_) => "perlin",
            ParamValue::Xyz(_) => "xyz",
            ParamValue::HeatPump(_) => "heat_pump",
            ParamValue::HeatPumpGroup(_) => "heat_pump_group",
            ParamValue::File(_) => "file",
        }
    }
}

/// A named declaration of how one quantity is produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    #[serde(default)]
    pub name: String,
    pub value: ParamValue,
    #[serde(default)]
    pub distribution: Distribution,
    #[serde(default)]
    pub vary: Vary,
}

impl Parameter {
    pub fn new(name: impl Into<String>, value: ParamValue, vary: Vary) -> Self {
        Self {
            name: name.into(),
            value,
            distribution: Distribution::Uniform,
            vary,
        }
    }

    /// Structural checks and fixups run once at settings load: range ordering,
    /// three-dimensionality (two-component frequencies get a trailing `1`),
    /// and the location/vary coupling for heat pumps.
    pub fn normalize(&mut self) -> Result<(), EngineError> {
        match &mut self.value {
            ParamValue::MinMax(range) => check_range(range)?,
            ParamValue::Perlin(spec) => {
                check_order(spec.min, spec.max)?;
                match &mut spec.frequency {
                    Frequency::Range(range) => check_range(range)?,
                    Frequency::Fixed(factors) => make_three_dimensional(factors)?,
                }
            }
            ParamValue::HeatPump(hp) => {
                if hp.location.is_none() && self.vary != Vary::Space {
                    return Err(EngineError::MissingHeatPumpLocation {
                        name: self.name.clone(),
                    });
                }
                check_heatpump_value(&hp.injection_temp)?;
                check_heatpump_value(&hp.injection_rate)?;
            }
            ParamValue::HeatPumpGroup(group) => {
                if group.number == 0 {
                    return Err(EngineError::InvalidSettings {
                        reason: format!("heat pump group `{}` must generate at least one heat pump", self.name),
                    });
                }
                check_heatpump_value(&group.injection_temp)?;
                check_heatpump_value(&group.injection_rate)?;
            }
            ParamValue::TimeSeries(series) => check_series(series)?,
            ParamValue::Scalar(_)
            | ParamValue::IntList(_)
            | ParamValue::Xyz(_)
            | ParamValue::File(_) => {}
        }
        Ok(())
    }
}

fn check_order(min: f64, max: f64) -> Result<(), EngineError> {
    if max < min {
        return Err(EngineError::InvalidRange { min, max });
    }
    Ok(())
}

fn check_range(range: &MinMax) -> Result<(), EngineError> {
    check_order(range.min, range.max)
}

fn check_series(series: &TimeSeries) -> Result<(), EngineError> {
    for entry in &series.entries {
        if let SeriesValue::Range(range) = &entry.value {
            check_range(range)?;
        }
    }
    Ok(())
}

fn check_heatpump_value(value: &HeatPumpValue) -> Result<(), EngineError> {
    match value {
        HeatPumpValue::Series(series) => check_series(series),
        HeatPumpValue::Range(range) => check_range(range),
        HeatPumpValue::Scalar(_) => Ok(()),
    }
}

/// Pad a two-component value with a trailing `1`; anything other than two or
/// three components is rejected.
pub fn make_three_dimensional(value: &mut Vec<f64>) -> Result<(), EngineError> {
    if value.len() == 2 {
        value.push(1.0);
    }
    if value.len() != 3 {
        return Err(EngineError::NotThreeDimensional { got: value.len() });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn min_max_rejects_inverted_bounds() {
        assert!(MinMax::new(2.0, 1.0).is_err());
        assert!(MinMax::new(1.0, 1.0).is_ok());
    }

    #[test]
    fn two_dimensional_frequency_gets_padded() {
        let mut parameter = Parameter::new(
            "permeability",
            ParamValue::Perlin(PerlinSpec {
                frequency: Frequency::Fixed(vec![4.0, 8.0]),
                min: 1.0,
                max: 2.0,
            }),
            Vary::Space,
        );
        parameter.normalize().unwrap();
        match parameter.value {
            ParamValue::Perlin(PerlinSpec {
                frequency: Frequency::Fixed(factors),
                ..
            }) => assert_eq!(factors, vec![4.0, 8.0, 1.0]),
            other => panic!("unexpected shape {other:?}"),
        }
    }

    #[test]
    fn four_dimensional_frequency_is_rejected() {
        let mut parameter = Parameter::new(
            "permeability",
            ParamValue::Perlin(PerlinSpec {
                frequency: Frequency::Fixed(vec![1.0, 2.0, 3.0, 4.0]),
                min: 1.0,
                max: 2.0,
            }),
            Vary::Space,
        );
        assert!(matches!(
            parameter.normalize(),
            Err(EngineError::NotThreeDimensional { got: 4 })
        ));
    }

    #[test]
    fn unlocated_heatpump_needs_space_vary() {
        let pump = HeatPump {
            location: None,
            injection_temp: HeatPumpValue::Scalar(13.6),
            injection_rate: HeatPumpValue::Scalar(0.00024),
        };
        let mut fixed = Parameter::new("hp1", ParamValue::HeatPump(pump.clone()), Vary::Fixed);
        assert!(matches!(
            fixed.normalize(),
            Err(EngineError::MissingHeatPumpLocation { .. })
        ));

        let mut spaced = Parameter::new("hp1", ParamValue::HeatPump(pump), Vary::Space);
        spaced.normalize().unwrap();
    }

    #[test]
    fn vary_modes_parse_from_settings_strings() {
        let vary: Vary = serde_json::from_str("\"const_within_datapoint\"").unwrap();
        assert_eq!(vary, Vary::Const);
        let vary: Vary = serde_json::from_str("\"spatially_vary_within_datapoint\"").unwrap();
        assert_eq!(vary, Vary::Space);
        let distribution: Distribution = serde_json::from_str("\"logarithmic\"").unwrap();
        assert_eq!(distribution, Distribution::Log);
    }

    #[test]
    fn heatpump_value_parses_scalar_range_and_series() {
        let scalar: HeatPumpValue = serde_json::from_str("13.6").unwrap();
        assert_eq!(scalar, HeatPumpValue::Scalar(13.6));

        let range: HeatPumpValue = serde_json::from_str(r#"{"min": 0.0, "max": 0.002}"#).unwrap();
        assert_eq!(range, HeatPumpValue::Range(MinMax { min: 0.0, max: 0.002 }));

        let series: HeatPumpValue = serde_json::from_str(
            r#"{"time_unit": "year", "entries": [{"time": 0.0, "value": 10.0}]}"#,
        )
        .unwrap();
        assert!(matches!(series, HeatPumpValue::Series(_)));
    }
}
