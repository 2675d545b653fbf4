//! 3D gradient noise fields on the simulation grid.
//!
//! Fields are sampled from a single unbounded Perlin volume. Randomness enters
//! through the sampling offset alone: the permutation table is fixed, and the
//! per-run offset (drawn from the shared `RandomSource`, scaled by
//! `OFFSET_SCALE`) moves each field into its own noise neighbourhood so
//! independently varied parameters never alias.

use noise::{NoiseFn, Perlin};

use crate::field::Field3;

/// Fixed permutation seed. Offsets, not the table, carry the randomness.
const PERMUTATION_SEED: u32 = 0;

/// Scale applied to the `[0, 1)³` offset draw before sampling.
pub const OFFSET_SCALE: f64 = 4242.0;

/// Standard atmosphere in Pa, the reference for the pressure integration.
pub const REFERENCE_PRESSURE: f64 = 101_325.0;

/// Sample one noise field over the grid and rescale it onto `[min, max]`.
///
/// The simulation box is scaled into a unit cube (`scale = n_axis / max(n)`),
/// so a given frequency means the same spatial wavelength on every axis.
/// Rescaling uses the field's own observed extrema; two fields with the same
/// frequency but different offsets therefore rescale differently.
pub fn generate(
    cells: [usize; 3],
    min: f64,
    max: f64,
    offset: [f64; 3],
    frequency: [f64; 3],
) -> Field3 {
    let longest = cells.iter().copied().max().unwrap_or(1).max(1) as f64;
    let scale = [
        cells[0] as f64 / longest,
        cells[1] as f64 / longest,
        cells[2] as f64 / longest,
    ];

    let perlin = Perlin::new(PERMUTATION_SEED);
    let mut field = Field3::from_cells(cells, 0.0);
    for i in 0..cells[0] {
        for j in 0..cells[1] {
            for k in 0..cells[2] {
                let x = (i as f64 / cells[0] as f64 * scale[0] + offset[0]) * frequency[0];
                let y = (j as f64 / cells[1] as f64 * scale[1] + offset[1]) * frequency[1];
                let z = (k as f64 / cells[2] as f64 * scale[2] + offset[2]) * frequency[2];
                field.set(i, j, k, perlin.get([x, y, z]));
            }
        }
    }

    field.rescale_into(min, max);
    field
}

/// Derive a pressure field from a gradient field.
///
/// The gradient field is rescaled onto `[min, max]`, then integrated along y
/// from a standard-atmosphere reference at `j == 0`:
/// `p[i][j][k] = p[i][j-1][k] + g[i][j][k] * resolution * 1000`,
/// and finally the integration axis is reversed.
pub fn pressure_from_gradient(
    mut gradient: Field3,
    min: f64,
    max: f64,
    resolution: f64,
) -> Field3 {
    gradient.rescale_into(min, max);

    let mut pressure = Field3::new(gradient.nx, gradient.ny, gradient.nz, 0.0);
    for i in 0..gradient.nx {
        for k in 0..gradient.nz {
            pressure.set(i, 0, k, REFERENCE_PRESSURE);
            for j in 1..gradient.ny {
                let value = pressure.get(i, j - 1, k) + gradient.get(i, j, k) * resolution * 1000.0;
                pressure.set(i, j, k, value);
            }
        }
    }
    pressure.reverse_y();
    pressure
}
