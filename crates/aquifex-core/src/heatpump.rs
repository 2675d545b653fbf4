//! Heat pump expansion and preparation.
//!
//! Order of operations: `expand` turns every `HeatPumpGroup` into concrete,
//! collision-free `HeatPump` parameters (cell-indexed locations),
//! `convert_coordinates` rewrites cell indices to physical coordinates, and
//! `normalize_time_series` lifts scalar/range injection values into
//! single-entry time series so the resolver can treat them uniformly.

use indexmap::IndexMap;
use tracing::debug;

use crate::error::EngineError;
use crate::rng::RandomSource;
use crate::state::{GeneralSettings, RunState};
use crate::value::{
    HeatPump, HeatPumpValue, Location, ParamValue, Parameter, SeriesValue, TimeSeries,
};

/// Draw a uniformly random 1-based cell location over the grid.
pub fn draw_cell_location(general: &GeneralSettings, rng: &mut RandomSource) -> [f64; 3] {
    let u = rng.uniform3();
    [
        (u[0] * general.number_cells[0] as f64).ceil(),
        (u[1] * general.number_cells[1] as f64).ceil(),
        (u[2] * general.number_cells[2] as f64).ceil(),
    ]
}

/// Cell-center physical coordinate of a 1-based cell index.
pub fn cell_to_coords(cells: [f64; 3], resolution: f64) -> [f64; 3] {
    [
        (cells[0] - 1.0) * resolution + resolution * 0.5,
        (cells[1] - 1.0) * resolution + resolution * 0.5,
        (cells[2] - 1.0) * resolution + resolution * 0.5,
    ]
}

/// Expand every `HeatPumpGroup` into `number` concrete heat pumps named
/// `{group}_{index}`, replacing the heat pump parameter map.
///
/// Explicit heat pumps are kept first, verbatim, and register their locations
/// so group-generated pumps redraw on collision. A generated name that
/// collides with an explicit or already-generated parameter is a settings bug
/// and fails immediately, without retry.
pub fn expand(state: &mut RunState) -> Result<(), EngineError> {
    let expanded = {
        let general = &state.general;
        let source = &state.heatpump_parameters;
        let rng = &mut state.rng;

        let mut expanded: IndexMap<String, Parameter> = IndexMap::new();
        for (name, parameter) in source {
            if matches!(parameter.value, ParamValue::HeatPump(_)) {
                expanded.insert(name.clone(), parameter.clone());
            }
        }

        let mut taken: Vec<[f64; 3]> = expanded
            .values()
            .filter_map(|parameter| match &parameter.value {
                ParamValue::HeatPump(hp) => hp.location.map(|l| l.triple()),
                _ => None,
            })
            .collect();

        for (name, parameter) in source {
            let group = match &parameter.value {
                ParamValue::HeatPump(_) => continue,
                ParamValue::HeatPumpGroup(group) => group,
                _ => {
                    return Err(EngineError::NotAHeatPump { name: name.clone() });
                }
            };

            for index in 0..group.number {
                let generated = format!("{name}_{index}");
                if source.contains_key(&generated) || expanded.contains_key(&generated) {
                    return Err(EngineError::HeatPumpNameClash { name: generated });
                }

                let location = draw_free_location(general, rng, &taken, &generated)?;
                taken.push(location);

                debug!(
                    heatpump = generated.as_str(),
                    ?location,
                    "generated heat pump from group"
                );
                let heatpump = HeatPump {
                    location: Some(Location::Cells(location)),
                    injection_temp: group.injection_temp.clone(),
                    injection_rate: group.injection_rate.clone(),
                };
                expanded.insert(
                    generated.clone(),
                    Parameter {
                        name: generated,
                        value: ParamValue::HeatPump(heatpump),
                        distribution: parameter.distribution,
                        vary: parameter.vary,
                    },
                );
            }
        }

        for (name, parameter) in &expanded {
            if matches!(parameter.value, ParamValue::HeatPumpGroup(_)) {
                return Err(EngineError::ResidualHeatPumpGroup { name: name.clone() });
            }
        }

        expanded
    };

    state.heatpump_parameters = expanded;
    Ok(())
}

/// Redraw until the location is free. The grid is finite and pumps are
/// expected to be sparse, so the retry budget of `10 × cell count` is only
/// ever exhausted by a genuinely overfull configuration.
fn draw_free_location(
    general: &GeneralSettings,
    rng: &mut RandomSource,
    taken: &[[f64; 3]],
    name: &str,
) -> Result<[f64; 3], EngineError> {
    let attempts = 10 * general.cell_count();
    for _ in 0..attempts {
        let location = draw_cell_location(general, rng);
        if !taken.contains(&location) {
            return Ok(location);
        }
    }
    Err(EngineError::LocationsExhausted {
        name: name.to_string(),
        attempts,
    })
}

/// Rewrite every cell-indexed heat pump location to physical coordinates.
/// Must run exactly once per pump; a location already in coordinates is an
/// invariant violation, not a request to convert again.
pub fn convert_coordinates(state: &mut RunState) -> Result<(), EngineError> {
    let resolution = state.general.cell_resolution;
    for (name, parameter) in state.heatpump_parameters.iter_mut() {
        let hp = match &mut parameter.value {
            ParamValue::HeatPump(hp) => hp,
            _ => return Err(EngineError::NotAHeatPump { name: name.clone() }),
        };
        match hp.location {
            // Placed randomly per datapoint during variation.
            None => continue,
            Some(Location::Coords(_)) => {
                return Err(EngineError::LocationAlreadyConverted { name: name.clone() });
            }
            Some(Location::Cells(cells)) => {
                hp.location = Some(Location::Coords(cell_to_coords(cells, resolution)));
            }
        }
    }
    Ok(())
}

/// Lift scalar and range injection values into single-entry time series at
/// time 0.
pub fn normalize_time_series(state: &mut RunState) -> Result<(), EngineError> {
    for (name, parameter) in state.heatpump_parameters.iter_mut() {
        let hp = match &mut parameter.value {
            ParamValue::HeatPump(hp) => hp,
            _ => return Err(EngineError::NotAHeatPump { name: name.clone() }),
        };
        normalize_value(&mut hp.injection_temp);
        normalize_value(&mut hp.injection_rate);
    }
    Ok(())
}

fn normalize_value(value: &mut HeatPumpValue) {
    let series = match value {
        HeatPumpValue::Series(_) => return,
        HeatPumpValue::Scalar(v) => TimeSeries::at_time_zero(SeriesValue::Scalar(*v)),
        HeatPumpValue::Range(range) => TimeSeries::at_time_zero(SeriesValue::Range(*range)),
    };
    *value = HeatPumpValue::Series(series);
}

/// Resolve the operational values of one heat pump in place: every range
/// entry becomes one draw of `max - u * (max - min)`, temperature series
/// first, then rate. Scalars pass through untouched. The count-down-from-max
/// form fixes the draw sequence consumed from the shared source.
pub fn resolve_operational_values(rng: &mut RandomSource, hp: &mut HeatPump) {
    resolve_value(rng, &mut hp.injection_temp);
    resolve_value(rng, &mut hp.injection_rate);
}

fn resolve_value(rng: &mut RandomSource, value: &mut HeatPumpValue) {
    match value {
        HeatPumpValue::Series(series) => {
            for entry in &mut series.entries {
                if let SeriesValue::Range(range) = entry.value {
                    let drawn = range.max - rng.uniform() * (range.max - range.min);
                    entry.value = SeriesValue::Scalar(drawn);
                }
            }
        }
        HeatPumpValue::Range(range) => {
            let drawn = range.max - rng.uniform() * (range.max - range.min);
            *value = HeatPumpValue::Scalar(drawn);
        }
        HeatPumpValue::Scalar(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::GeneralSettings;
    use crate::value::{HeatPumpGroup, MinMax, SeriesEntry, Vary};

    fn state_with_heatpumps(parameters: Vec<Parameter>) -> RunState {
        let mut state = RunState::new(GeneralSettings::default()).unwrap();
        state.heatpump_parameters = parameters
            .into_iter()
            .map(|p| (p.name.clone(), p))
            .collect();
        state
    }

    fn group(name: &str, number: usize) -> Parameter {
        Parameter::new(
            name,
            ParamValue::HeatPumpGroup(HeatPumpGroup {
                number,
                injection_temp: HeatPumpValue::Range(MinMax { min: 14.0, max: 18.0 }),
                injection_rate: HeatPumpValue::Scalar(0.002),
            }),
            Vary::Fixed,
        )
    }

    #[test]
    fn coordinate_conversion_uses_cell_centers() {
        assert_eq!(
            cell_to_coords([16.0, 32.0, 1.0], 5.0),
            [77.5, 157.5, 2.5]
        );
    }

    #[test]
    fn conversion_happens_exactly_once() {
        let mut state = state_with_heatpumps(vec![Parameter::new(
            "hp1",
            ParamValue::HeatPump(HeatPump {
                location: Some(Location::Cells([16.0, 32.0, 1.0])),
                injection_temp: HeatPumpValue::Scalar(13.6),
                injection_rate: HeatPumpValue::Scalar(0.00024),
            }),
            Vary::Fixed,
        )]);

        convert_coordinates(&mut state).unwrap();
        match state.heatpump_parameters["hp1"].value {
            ParamValue::HeatPump(HeatPump {
                location: Some(Location::Coords(coords)),
                ..
            }) => assert_eq!(coords, [77.5, 157.5, 2.5]),
            ref other => panic!("unexpected value {other:?}"),
        }

        // Running the conversion again must fail loudly, not corrupt.
        assert!(matches!(
            convert_coordinates(&mut state),
            Err(EngineError::LocationAlreadyConverted { .. })
        ));
    }

    #[test]
    fn group_expansion_produces_numbered_pumps() {
        let mut state = state_with_heatpumps(vec![group("hps", 10)]);
        expand(&mut state).unwrap();

        assert_eq!(state.heatpump_parameters.len(), 10);
        for index in 0..10 {
            let parameter = &state.heatpump_parameters[&format!("hps_{index}")];
            match &parameter.value {
                ParamValue::HeatPump(hp) => {
                    assert!(matches!(hp.location, Some(Location::Cells(_))));
                }
                other => panic!("unexpected value {other:?}"),
            }
        }
    }

    #[test]
    fn expanded_locations_never_collide() {
        // 15 pumps on a 4x4x1 grid fills the grid save one cell.
        let general = GeneralSettings {
            number_cells: [4, 4, 1],
            ..GeneralSettings::default()
        };
        let mut state = RunState::new(general).unwrap();
        state.heatpump_parameters = IndexMap::new();
        state
            .heatpump_parameters
            .insert("hps".to_string(), group("hps", 15));

        expand(&mut state).unwrap();

        let locations: Vec<[f64; 3]> = state
            .heatpump_parameters
            .values()
            .filter_map(|p| match &p.value {
                ParamValue::HeatPump(hp) => hp.location.map(|l| l.triple()),
                _ => None,
            })
            .collect();
        for (i, a) in locations.iter().enumerate() {
            for b in &locations[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn generated_name_clash_is_fatal() {
        let explicit = Parameter::new(
            "hp_0",
            ParamValue::HeatPump(HeatPump {
                location: Some(Location::Cells([16.0, 32.0, 1.0])),
                injection_temp: HeatPumpValue::Scalar(10.5),
                injection_rate: HeatPumpValue::Scalar(0.002),
            }),
            Vary::Fixed,
        );
        let mut state = state_with_heatpumps(vec![explicit, group("hp", 1)]);
        assert!(matches!(
            expand(&mut state),
            Err(EngineError::HeatPumpNameClash { .. })
        ));
    }

    #[test]
    fn explicit_pumps_survive_expansion_verbatim() {
        let explicit = Parameter::new(
            "hp1",
            ParamValue::HeatPump(HeatPump {
                location: Some(Location::Cells([2.0, 3.0, 1.0])),
                injection_temp: HeatPumpValue::Scalar(13.6),
                injection_rate: HeatPumpValue::Scalar(0.00024),
            }),
            Vary::Fixed,
        );
        let mut state = state_with_heatpumps(vec![explicit.clone(), group("hps", 3)]);
        expand(&mut state).unwrap();

        assert_eq!(state.heatpump_parameters["hp1"], explicit);
        assert_eq!(state.heatpump_parameters.len(), 4);
    }

    #[test]
    fn range_valued_series_entries_resolve_within_bounds() {
        let mut rng = RandomSource::new(Some(0));
        let mut hp = HeatPump {
            location: Some(Location::Cells([1.0, 1.0, 1.0])),
            injection_temp: HeatPumpValue::Series(TimeSeries::at_time_zero(SeriesValue::Range(
                MinMax { min: 14.0, max: 18.0 },
            ))),
            injection_rate: HeatPumpValue::Series(TimeSeries {
                time_unit: "year".to_string(),
                entries: vec![
                    SeriesEntry { time: 0.0, value: SeriesValue::Range(MinMax { min: 0.0, max: 0.002 }) },
                    SeriesEntry { time: 1.0, value: SeriesValue::Scalar(0.0) },
                ],
            }),
        };

        resolve_operational_values(&mut rng, &mut hp);

        match &hp.injection_temp {
            HeatPumpValue::Series(series) => match series.entries[0].value {
                SeriesValue::Scalar(v) => assert!((14.0..=18.0).contains(&v)),
                ref other => panic!("range was not resolved: {other:?}"),
            },
            other => panic!("unexpected shape {other:?}"),
        }
        match &hp.injection_rate {
            HeatPumpValue::Series(series) => {
                assert!(matches!(series.entries[0].value, SeriesValue::Scalar(_)));
                // The already-scalar entry is untouched.
                assert_eq!(series.entries[1].value, SeriesValue::Scalar(0.0));
            }
            other => panic!("unexpected shape {other:?}"),
        }
    }
}
