//! Resolution of one parameter into one concrete `Data` value.
//!
//! The dispatch is a single exhaustive match over `(vary, value shape)`.
//! Resolution is pure with respect to the parameter (the declared value is
//! cloned, never mutated) but consumes the shared random source, so the call
//! order across parameters and datapoints is significant.

use crate::data::{Data, DataValue};
use crate::error::EngineError;
use crate::field::Field3;
use crate::heatpump;
use crate::perlin;
use crate::rng::RandomSource;
use crate::state::GeneralSettings;
use crate::value::{
    Distribution, Frequency, Location, ParamValue, Parameter, PerlinSpec, Vary,
};

/// Parameter name that triggers the gradient-to-pressure transform on its
/// spatially varied field.
const PRESSURE_GRADIENT: &str = "pressure_gradient";

/// Resolve `parameter` for the datapoint at `index`.
pub fn resolve(
    parameter: &Parameter,
    general: &GeneralSettings,
    rng: &mut RandomSource,
    index: usize,
) -> Result<Data, EngineError> {
    // Groups are expanded before variation ever starts; one reaching the
    // resolver is a bug in the expansion stage, not a user error.
    if matches!(parameter.value, ParamValue::HeatPumpGroup(_)) {
        return Err(EngineError::ResidualHeatPumpGroup {
            name: parameter.name.clone(),
        });
    }

    match parameter.vary {
        Vary::Fixed => copy_parameter(parameter, general, rng),
        Vary::Const => resolve_const(parameter, general, index),
        Vary::Space => resolve_space(parameter, general, rng),
        Vary::List => Err(unsupported(parameter)),
    }
}

fn unsupported(parameter: &Parameter) -> EngineError {
    EngineError::UnsupportedCombination {
        name: parameter.name.clone(),
        vary: parameter.vary,
        shape: parameter.value.shape(),
    }
}

/// The no-variation path: copy the declared value verbatim. Heat pumps still
/// resolve their operational values, but keep the declared location.
fn copy_parameter(
    parameter: &Parameter,
    general: &GeneralSettings,
    rng: &mut RandomSource,
) -> Result<Data, EngineError> {
    let value = match &parameter.value {
        ParamValue::HeatPump(_) => return vary_heatpump(parameter, general, rng),
        ParamValue::Scalar(v) => DataValue::Scalar(*v),
        ParamValue::IntList(v) => DataValue::IntList(v.clone()),
        ParamValue::Xyz(v) => DataValue::Xyz(*v),
        ParamValue::File(_) => {
            return Err(EngineError::UnresolvedFile {
                name: parameter.name.clone(),
            });
        }
        ParamValue::MinMax(_)
        | ParamValue::TimeSeries(_)
        | ParamValue::Perlin(_)
        | ParamValue::HeatPumpGroup(_) => return Err(unsupported(parameter)),
    };
    Ok(Data {
        name: parameter.name.clone(),
        value,
    })
}

/// One scalar per datapoint, ramped across the ensemble: datapoint `i` of
/// `N` gets `min + (i / (N-1)) * (max - min)`, interpolated in log10 space
/// under a logarithmic distribution. `N == 1` yields `min`.
///
/// The ramp is deterministic in `i`; the cross-datapoint shuffle is what
/// keeps two const parameters from covarying across the ensemble.
fn resolve_const(
    parameter: &Parameter,
    general: &GeneralSettings,
    index: usize,
) -> Result<Data, EngineError> {
    let range = match &parameter.value {
        ParamValue::MinMax(range) => range,
        _ => return Err(unsupported(parameter)),
    };

    let n = general.number_datapoints;
    if n == 1 {
        // A single datapoint leaves no room for a ramp; the division below
        // would be by zero, so the value is pinned to `min` exactly.
        return Ok(Data {
            name: parameter.name.clone(),
            value: DataValue::Scalar(range.min),
        });
    }

    let (mut min, mut max) = (range.min, range.max);
    if parameter.distribution == Distribution::Log {
        check_log_bounds(&parameter.name, min, max)?;
        min = min.log10();
        max = max.log10();
    }

    let step_width = (max - min) / (n - 1) as f64;
    let mut value = min + step_width * index as f64;

    if parameter.distribution == Distribution::Log {
        value = 10f64.powf(value);
    }

    Ok(Data {
        name: parameter.name.clone(),
        value: DataValue::Scalar(value),
    })
}

fn resolve_space(
    parameter: &Parameter,
    general: &GeneralSettings,
    rng: &mut RandomSource,
) -> Result<Data, EngineError> {
    match &parameter.value {
        ParamValue::Perlin(spec) => {
            let field = perlin_field(parameter, spec, general, rng)?;
            Ok(Data {
                name: parameter.name.clone(),
                value: DataValue::Field(field),
            })
        }
        ParamValue::Scalar(_) => Err(EngineError::SpaceScalar {
            name: parameter.name.clone(),
        }),
        ParamValue::MinMax(_) => Err(EngineError::SpaceMinMax {
            name: parameter.name.clone(),
        }),
        ParamValue::HeatPump(_) => vary_heatpump(parameter, general, rng),
        ParamValue::File(_) => Err(EngineError::UnresolvedFile {
            name: parameter.name.clone(),
        }),
        ParamValue::IntList(_) | ParamValue::TimeSeries(_) | ParamValue::Xyz(_) => {
            Err(unsupported(parameter))
        }
        // Caught at the top of `resolve`.
        ParamValue::HeatPumpGroup(_) => unreachable!("groups never reach resolve_space"),
    }
}

/// Generate one noise field for a perlin-specced parameter.
///
/// Draw order from the shared source: the three offset components first,
/// then, for a range-valued frequency, the three per-axis factors.
fn perlin_field(
    parameter: &Parameter,
    spec: &PerlinSpec,
    general: &GeneralSettings,
    rng: &mut RandomSource,
) -> Result<Field3, EngineError> {
    let offset = rng.uniform3().map(|u| u * perlin::OFFSET_SCALE);

    let frequency = match &spec.frequency {
        Frequency::Fixed(factors) => [factors[0], factors[1], factors[2]],
        Frequency::Range(range) => {
            let mut draw = || range.max - rng.uniform() * (range.max - range.min);
            let f0 = draw();
            let f1 = draw();
            let f2 = draw();
            [f0, f1, f2]
        }
    };

    let (mut min, mut max) = (spec.min, spec.max);
    if parameter.distribution == Distribution::Log {
        check_log_bounds(&parameter.name, min, max)?;
        min = min.log10();
        max = max.log10();
    }

    let mut field = perlin::generate(general.number_cells, min, max, offset, frequency);

    if parameter.distribution == Distribution::Log {
        field.map_in_place(|v| 10f64.powf(v));
    }

    if parameter.name == PRESSURE_GRADIENT {
        field = perlin::pressure_from_gradient(field, spec.min, spec.max, general.cell_resolution);
    }

    Ok(field)
}

fn check_log_bounds(name: &str, min: f64, max: f64) -> Result<(), EngineError> {
    if min <= 0.0 || max <= 0.0 {
        return Err(EngineError::NonPositiveLogRange {
            name: name.to_string(),
            min,
            max,
        });
    }
    Ok(())
}

/// Resolve a heat pump: operational values first, then, under `Space`, a
/// fresh random location converted to physical coordinates inline. Fixed
/// pumps keep the location they declared.
///
/// Cross-datapoint location collisions are deliberately not tracked here;
/// collision checking happens once, at expansion time, within a run.
fn vary_heatpump(
    parameter: &Parameter,
    general: &GeneralSettings,
    rng: &mut RandomSource,
) -> Result<Data, EngineError> {
    let mut hp = match &parameter.value {
        ParamValue::HeatPump(hp) => hp.clone(),
        _ => return Err(unsupported(parameter)),
    };

    heatpump::resolve_operational_values(rng, &mut hp);

    if parameter.vary == Vary::Space {
        let cells = heatpump::draw_cell_location(general, rng);
        hp.location = Some(Location::Coords(heatpump::cell_to_coords(
            cells,
            general.cell_resolution,
        )));
    } else if hp.location.is_none() {
        return Err(EngineError::MissingHeatPumpLocation {
            name: parameter.name.clone(),
        });
    }

    Ok(Data {
        name: parameter.name.clone(),
        value: DataValue::HeatPump(hp),
    })
}
