//! Error taxonomy for the variation engine.
//!
//! Two classes share one enum: configuration/usage errors a settings file can
//! trigger, and invariant violations that indicate a bug in an earlier stage
//! (`ResidualHeatPumpGroup`, `LocationAlreadyConverted`, `NotAHeatPump`).
//! Neither class is ever retried; any error aborts the whole run.

use thiserror::Error;

use crate::value::Vary;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("`max` value {max} must be greater or equal to `min` value {min}")]
    InvalidRange { min: f64, max: f64 },

    #[error("value must be given in three dimensional space, got {got} components")]
    NotThreeDimensional { got: usize },

    #[error("invalid general settings: {reason}")]
    InvalidSettings { reason: String },

    #[error(
        "parameter `{name}` is varied spatially but has a scalar value, \
         it should be fixed, or const with a min/max range instead"
    )]
    SpaceScalar { name: String },

    #[error(
        "parameter `{name}` is varied spatially but has a min/max value, \
         it should carry a perlin spec instead"
    )]
    SpaceMinMax { name: String },

    #[error("no implementation for vary mode `{vary}` and value shape `{shape}` in parameter `{name}`")]
    UnsupportedCombination {
        name: String,
        vary: Vary,
        shape: &'static str,
    },

    #[error(
        "parameter `{name}`: logarithmic distribution needs strictly positive \
         bounds, got [{min}, {max}]"
    )]
    NonPositiveLogRange { name: String, min: f64, max: f64 },

    #[error("parameter `{name}` is an unresolved file reference, files must be read in before variation")]
    UnresolvedFile { name: String },

    #[error("heat pump `{name}` has no location but its vary mode is not `space`")]
    MissingHeatPumpLocation { name: String },

    #[error("there is a naming clash for generated heat pump `{name}`")]
    HeatPumpNameClash { name: String },

    #[error("could not place heat pump `{name}`: gave up after {attempts} location draws")]
    LocationsExhausted { name: String, attempts: usize },

    #[error("parameter `{name}` in the heat pump map is neither a heat pump nor a heat pump group")]
    NotAHeatPump { name: String },

    #[error("heat pump group `{name}` survived expansion, this is a bug in the expansion stage")]
    ResidualHeatPumpGroup { name: String },

    #[error(
        "heat pump `{name}` location is already in physical coordinates, \
         the cell-to-coordinate conversion must run exactly once"
    )]
    LocationAlreadyConverted { name: String },

    #[error("mandatory parameter `{name}` is missing from the hydrogeological parameters")]
    MissingMandatoryParameter { name: &'static str },

    #[error("heat pump value `{name}` must not appear in the hydrogeological parameters")]
    HeatPumpInBackground { name: String },

    #[error("heat pumps `{first}` and `{second}` share the location {location:?}")]
    DuplicateHeatPumpLocations {
        first: String,
        second: String,
        location: [f64; 3],
    },

    #[error(
        "if any of `permeability`, `pressure_gradient` or `temperature` is a \
         file reference, all of them must be"
    )]
    MixedFileReferences,

    #[error("parameter `{name}`: file references require vary mode `fixed`")]
    FileVaryMode { name: String },
}
