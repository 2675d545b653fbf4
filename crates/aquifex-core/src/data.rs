//! Resolved per-datapoint values.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::field::Field3;
use crate::value::{HeatPump, Xyz};

/// A concrete value produced by the resolver. Always an owned copy; mutating
/// a `DataValue` can never reach back into the originating `Parameter`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataValue {
    Scalar(f64),
    IntList(Vec<i64>),
    Xyz(Xyz),
    Field(Field3),
    HeatPump(HeatPump),
}

/// The resolved output for one parameter in one datapoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Data {
    pub name: String,
    pub value: DataValue,
}

/// One fully resolved parameter set, i.e. one simulation run.
/// Key order is discovery order: hydrogeological parameters first, then heat
/// pumps, each in map insertion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Datapoint {
    pub index: usize,
    pub data: IndexMap<String, Data>,
}
