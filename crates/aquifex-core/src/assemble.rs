//! Datapoint assembly and the cross-datapoint shuffle.

use indexmap::IndexMap;
use tracing::debug;

use crate::data::{Data, Datapoint};
use crate::error::EngineError;
use crate::resolver;
use crate::rng::RandomSource;
use crate::state::RunState;

/// Resolve every parameter for every datapoint, in one forward pass.
///
/// Iteration order is fixed: datapoint index ascending; within a datapoint,
/// the hydrogeological map first, then heat pumps, each in insertion order.
/// The order determines how the shared random stream is consumed and must not
/// change between runs. Afterwards, if `shuffle_datapoints` is set, values
/// are permuted across datapoints per parameter.
pub fn assemble(state: &mut RunState) -> Result<(), EngineError> {
    let RunState {
        general,
        hydrogeological_parameters,
        heatpump_parameters,
        datapoints,
        rng,
    } = state;

    for index in 0..general.number_datapoints {
        let mut data = IndexMap::new();
        for parameter in hydrogeological_parameters
            .values()
            .chain(heatpump_parameters.values())
        {
            let resolved = resolver::resolve(parameter, general, rng, index)?;
            data.insert(parameter.name.clone(), resolved);
        }
        datapoints.push(Datapoint { index, data });
    }

    if general.shuffle_datapoints {
        shuffle_columns(datapoints, rng);
        debug!("shuffled datapoints");
    }

    Ok(())
}

/// Permute each parameter's values independently across datapoints.
///
/// Two parameters assembled as deterministic ramps would otherwise both sit
/// at their minimum in datapoint 0 and their maximum in datapoint N-1,
/// correlating quantities that are supposed to vary independently. Shuffling
/// per parameter name breaks that coupling while keeping every datapoint's
/// key set and every parameter's value multiset intact.
pub fn shuffle_columns(datapoints: &mut [Datapoint], rng: &mut RandomSource) {
    let Some(first) = datapoints.first() else {
        return;
    };
    let names: Vec<String> = first.data.keys().cloned().collect();

    for name in &names {
        let mut column: Vec<Data> = datapoints
            .iter()
            .map(|datapoint| datapoint.data[name].clone())
            .collect();
        rng.shuffle(&mut column);
        for (datapoint, value) in datapoints.iter_mut().zip(column) {
            datapoint.data.insert(name.clone(), value);
        }
    }
}
