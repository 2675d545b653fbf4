//! Structural invariants checked after assembly.
//!
//! Every check raises its own error variant so a failing configuration names
//! the exact rule it broke. Only the missing-heat-pump case is a warning:
//! simulating without any heat source is unusual but not forbidden.

use tracing::warn;

use crate::error::EngineError;
use crate::state::RunState;
use crate::value::{ParamValue, Parameter, Vary};

/// Background parameters every run must declare.
pub const MANDATORY_PARAMETERS: [&str; 3] = ["permeability", "pressure_gradient", "temperature"];

/// Run all invariant checks on a fully assembled state.
pub fn gate(state: &RunState) -> Result<(), EngineError> {
    mandatory_parameters_present(state)?;
    warn_if_no_heatpumps(state);
    no_heatpumps_in_background(state)?;
    no_duplicate_locations(state)?;
    consistent_file_references(state)?;
    Ok(())
}

fn mandatory_parameters_present(state: &RunState) -> Result<(), EngineError> {
    for name in MANDATORY_PARAMETERS {
        if !state.hydrogeological_parameters.contains_key(name) {
            return Err(EngineError::MissingMandatoryParameter { name });
        }
    }
    Ok(())
}

fn warn_if_no_heatpumps(state: &RunState) {
    let any = state.heatpump_parameters.values().any(|parameter| {
        matches!(
            parameter.value,
            ParamValue::HeatPump(_) | ParamValue::HeatPumpGroup(_)
        )
    });
    if !any {
        warn!("there are no heat pumps in this simulation, which usually doesn't make much sense");
    }
}

fn no_heatpumps_in_background(state: &RunState) -> Result<(), EngineError> {
    for (name, parameter) in &state.hydrogeological_parameters {
        if matches!(
            parameter.value,
            ParamValue::HeatPump(_) | ParamValue::HeatPumpGroup(_)
        ) {
            return Err(EngineError::HeatPumpInBackground { name: name.clone() });
        }
    }
    Ok(())
}

fn no_duplicate_locations(state: &RunState) -> Result<(), EngineError> {
    let located: Vec<(&String, [f64; 3])> = state
        .heatpump_parameters
        .iter()
        .filter_map(|(name, parameter)| match &parameter.value {
            ParamValue::HeatPump(hp) => hp.location.map(|l| (name, l.triple())),
            _ => None,
        })
        .collect();

    for (i, (first, a)) in located.iter().enumerate() {
        for (second, b) in &located[i + 1..] {
            if a == b {
                return Err(EngineError::DuplicateHeatPumpLocations {
                    first: (*first).clone(),
                    second: (*second).clone(),
                    location: *a,
                });
            }
        }
    }
    Ok(())
}

/// The three mandatory parameters may be deferred file references, but only
/// as a group: mixing files with inline values desynchronizes the grids the
/// files were exported on. File-valued parameters must also stay fixed.
fn consistent_file_references(state: &RunState) -> Result<(), EngineError> {
    let mut as_file = [false; MANDATORY_PARAMETERS.len()];
    for (slot, name) in MANDATORY_PARAMETERS.iter().enumerate() {
        let Some(parameter) = state.hydrogeological_parameters.get(*name) else {
            continue;
        };
        if is_file(parameter) {
            if parameter.vary != Vary::Fixed {
                return Err(EngineError::FileVaryMode {
                    name: parameter.name.clone(),
                });
            }
            as_file[slot] = true;
        }
    }

    if as_file.iter().any(|&f| f) && !as_file.iter().all(|&f| f) {
        return Err(EngineError::MixedFileReferences);
    }
    Ok(())
}

fn is_file(parameter: &Parameter) -> bool {
    matches!(parameter.value, ParamValue::File(_))
}
