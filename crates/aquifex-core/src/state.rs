//! Run configuration and the mutable state threaded through the pipeline.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::EngineError;
use crate::data::Datapoint;
use crate::rng::RandomSource;
use crate::value::{HeatPump, HeatPumpValue, Location, ParamValue, Parameter, Vary};

/// The simulated timespan, carried through for the downstream render stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TimeSpan {
    pub final_time: f64,
    #[serde(default = "default_time_unit")]
    pub unit: String,
}

fn default_time_unit() -> String {
    "year".to_string()
}

impl Default for TimeSpan {
    fn default() -> Self {
        Self {
            final_time: 27.5,
            unit: default_time_unit(),
        }
    }
}

/// Settings that do not change during a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct GeneralSettings {
    /// Cell counts per axis. Two-dimensional settings pad to `[x, y, 1]`.
    #[serde(deserialize_with = "deserialize_cells")]
    pub number_cells: [usize; 3],
    /// Edge length of the (cubic) cells.
    pub cell_resolution: f64,
    /// Whether to decorrelate per-parameter values across datapoints after
    /// assembly.
    pub shuffle_datapoints: bool,
    /// Seed for the run-wide random source. `null` draws the seed from OS
    /// entropy and makes the run nondeterministic.
    pub random_seed: Option<u64>,
    pub number_datapoints: usize,
    pub time_to_simulate: TimeSpan,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            number_cells: [32, 256, 1],
            cell_resolution: 5.0,
            shuffle_datapoints: true,
            random_seed: Some(0),
            number_datapoints: 1,
            time_to_simulate: TimeSpan::default(),
        }
    }
}

impl GeneralSettings {
    pub fn cell_count(&self) -> usize {
        self.number_cells[0] * self.number_cells[1] * self.number_cells[2]
    }

    fn check(&self) -> Result<(), EngineError> {
        if self.number_cells.contains(&0) {
            return Err(EngineError::InvalidSettings {
                reason: format!("number_cells {:?} must be positive on every axis", self.number_cells),
            });
        }
        if self.number_datapoints == 0 {
            return Err(EngineError::InvalidSettings {
                reason: "number_datapoints must be at least 1".to_string(),
            });
        }
        if self.cell_resolution <= 0.0 {
            return Err(EngineError::InvalidSettings {
                reason: format!("cell_resolution {} must be positive", self.cell_resolution),
            });
        }
        Ok(())
    }
}

fn deserialize_cells<'de, D>(deserializer: D) -> Result<[usize; 3], D::Error>
where
    D: Deserializer<'de>,
{
    let mut cells = Vec::<usize>::deserialize(deserializer)?;
    if cells.len() == 2 {
        cells.push(1);
    }
    if cells.len() != 3 {
        return Err(serde::de::Error::custom(format!(
            "number_cells must have two or three components, got {}",
            cells.len()
        )));
    }
    Ok([cells[0], cells[1], cells[2]])
}

/// The raw, deserialized form of a settings file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    #[serde(default)]
    pub general: GeneralSettings,
    #[serde(default)]
    pub hydrogeological_parameters: IndexMap<String, Parameter>,
    #[serde(default)]
    pub heatpump_parameters: IndexMap<String, Parameter>,
}

/// Everything a run needs: settings, the two parameter families, the
/// accumulated datapoints, and the single shared random source.
#[derive(Debug)]
pub struct RunState {
    pub general: GeneralSettings,
    pub hydrogeological_parameters: IndexMap<String, Parameter>,
    pub heatpump_parameters: IndexMap<String, Parameter>,
    pub datapoints: Vec<Datapoint>,
    /// Instantiated exactly once, from `general.random_seed`, and never
    /// re-seeded mid-run.
    pub rng: RandomSource,
}

impl RunState {
    /// A state with the default parameter families.
    pub fn new(general: GeneralSettings) -> Result<Self, EngineError> {
        general.check()?;
        let rng = RandomSource::new(general.random_seed);
        Ok(Self {
            general,
            hydrogeological_parameters: default_hydrogeological(),
            heatpump_parameters: default_heatpumps(),
            datapoints: Vec::new(),
            rng,
        })
    }

    /// Build a state from a settings file.
    ///
    /// User hydrogeological parameters merge key-by-key over the defaults, so
    /// supplying only `porosity` still yields the default `permeability`,
    /// `pressure_gradient` and `temperature`. Heat pump parameters are
    /// different: any user entry replaces the default map wholesale, so a
    /// settings file declaring `hp2` and `hp3` drops the default `hp1`.
    pub fn from_settings(settings: Settings) -> Result<Self, EngineError> {
        let mut state = Self::new(settings.general)?;

        for (name, mut parameter) in settings.hydrogeological_parameters {
            parameter.name = name.clone();
            parameter.normalize()?;
            state.hydrogeological_parameters.insert(name, parameter);
        }

        if !settings.heatpump_parameters.is_empty() {
            let mut heatpumps = IndexMap::new();
            for (name, mut parameter) in settings.heatpump_parameters {
                parameter.name = name.clone();
                parameter.normalize()?;
                heatpumps.insert(name, parameter);
            }
            state.heatpump_parameters = heatpumps;
        }

        Ok(state)
    }

    /// All parameters in resolution order: the hydrogeological family first,
    /// then heat pumps, each in insertion order.
    pub fn parameters(&self) -> impl Iterator<Item = &Parameter> {
        self.hydrogeological_parameters
            .values()
            .chain(self.heatpump_parameters.values())
    }
}

fn default_hydrogeological() -> IndexMap<String, Parameter> {
    let mut parameters = IndexMap::new();
    for (name, value) in [
        ("permeability", 1.29e-10),
        ("pressure_gradient", -0.0025),
        ("temperature", 10.6),
        ("porosity", 0.25),
    ] {
        parameters.insert(
            name.to_string(),
            Parameter::new(name, ParamValue::Scalar(value), Vary::Fixed),
        );
    }
    parameters
}

fn default_heatpumps() -> IndexMap<String, Parameter> {
    let mut parameters = IndexMap::new();
    parameters.insert(
        "hp1".to_string(),
        Parameter::new(
            "hp1",
            ParamValue::HeatPump(HeatPump {
                location: Some(Location::Cells([16.0, 32.0, 1.0])),
                injection_temp: HeatPumpValue::Scalar(13.6),
                injection_rate: HeatPumpValue::Scalar(0.00024),
            }),
            Vary::Fixed,
        ),
    );
    parameters
}
