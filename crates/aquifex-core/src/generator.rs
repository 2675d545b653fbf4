//! Pipeline orchestrator: runs the variation stages in order.

use tracing::debug;

use crate::assemble;
use crate::error::EngineError;
use crate::heatpump;
use crate::state::RunState;
use crate::validate;

/// Drives a `RunState` from declared parameters to resolved datapoints.
///
/// Stage order:
///   1. Heat pump group expansion (collision-free cell locations).
///   2. Cell-to-coordinate conversion (exactly once).
///   3. Operational value normalization to time series.
///   4. Datapoint assembly (+ optional cross-datapoint shuffle).
///   5. Validation gate.
///
/// The run either completes all stages or aborts on the first error; no
/// partial dataset is ever left behind as valid.
pub struct EnsembleGenerator;

impl EnsembleGenerator {
    pub fn new() -> Self {
        Self
    }

    pub fn generate(&self, state: &mut RunState) -> Result<(), EngineError> {
        heatpump::expand(state)?;
        debug!(
            heatpumps = state.heatpump_parameters.len(),
            "expanded heat pump groups"
        );
        heatpump::convert_coordinates(state)?;
        heatpump::normalize_time_series(state)?;

        assemble::assemble(state)?;
        debug!(datapoints = state.datapoints.len(), "assembled datapoints");

        validate::gate(state)?;
        Ok(())
    }
}

impl Default for EnsembleGenerator {
    fn default() -> Self {
        Self::new()
    }
}
