//! aquifex-core: ensemble generation for groundwater heat-transport
//! simulations.
//!
//! The crate takes a declarative parameter specification (what varies, how,
//! over which distribution) and expands it into N concrete, internally
//! consistent datapoints, each one the fully resolved parameter set of a
//! single simulation run. Stochastic values come from one seeded random
//! source shared across the whole run, so a given settings file reproduces
//! its dataset bit for bit.
//!
//! Reading in settings files, rendering simulator input decks and launching
//! the simulator live outside this crate; it consumes a validated `RunState`
//! and fills in its `datapoints`.

pub mod assemble;
pub mod data;
pub mod error;
pub mod field;
pub mod generator;
pub mod heatpump;
pub mod perlin;
pub mod resolver;
pub mod rng;
pub mod state;
pub mod validate;
pub mod value;

pub use data::{Data, DataValue, Datapoint};
pub use error::EngineError;
pub use field::Field3;
pub use generator::EnsembleGenerator;
pub use rng::RandomSource;
pub use state::{GeneralSettings, RunState, Settings};
pub use value::{
    Distribution, Frequency, HeatPump, HeatPumpGroup, HeatPumpValue, Location, MinMax,
    ParamValue, Parameter, PerlinSpec, TimeSeries, Vary,
};
