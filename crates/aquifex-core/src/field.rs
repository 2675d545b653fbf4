//! A dense 3D scalar grid matching the simulation cell layout.

use serde::{Deserialize, Serialize};

/// Cell values stored row-major with x outermost: `idx = (i*ny + j)*nz + k`,
/// axis order matching the grid's `[x, y, z]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field3 {
    pub data: Vec<f64>,
    pub nx: usize,
    pub ny: usize,
    pub nz: usize,
}

impl Field3 {
    pub fn new(nx: usize, ny: usize, nz: usize, fill: f64) -> Self {
        Self {
            data: vec![fill; nx * ny * nz],
            nx,
            ny,
            nz,
        }
    }

    pub fn from_cells(cells: [usize; 3], fill: f64) -> Self {
        Self::new(cells[0], cells[1], cells[2], fill)
    }

    #[inline]
    fn idx(&self, i: usize, j: usize, k: usize) -> usize {
        (i * self.ny + j) * self.nz + k
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize, k: usize) -> f64 {
        self.data[self.idx(i, j, k)]
    }

    #[inline]
    pub fn set(&mut self, i: usize, j: usize, k: usize, value: f64) {
        let idx = self.idx(i, j, k);
        self.data[idx] = value;
    }

    pub fn min_value(&self) -> f64 {
        self.data.iter().cloned().fold(f64::INFINITY, f64::min)
    }

    pub fn max_value(&self) -> f64 {
        self.data.iter().cloned().fold(f64::NEG_INFINITY, f64::max)
    }

    /// Linearly rescale the observed value range onto `[min, max]`.
    /// A flat input field maps to `min` everywhere, keeping the output free
    /// of NaN when the observed span is zero.
    pub fn rescale_into(&mut self, min: f64, max: f64) {
        let current_min = self.min_value();
        let span = self.max_value() - current_min;
        for value in &mut self.data {
            let t = if span == 0.0 {
                0.0
            } else {
                (*value - current_min) / span
            };
            *value = min + t * (max - min);
        }
    }

    pub fn map_in_place(&mut self, f: impl Fn(f64) -> f64) {
        for value in &mut self.data {
            *value = f(*value);
        }
    }

    /// Reverse the field along the y axis.
    pub fn reverse_y(&mut self) {
        for i in 0..self.nx {
            for k in 0..self.nz {
                let mut lo = 0;
                let mut hi = self.ny - 1;
                while lo < hi {
                    let a = self.idx(i, lo, k);
                    let b = self.idx(i, hi, k);
                    self.data.swap(a, b);
                    lo += 1;
                    hi -= 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_layout_is_row_major_x_outermost() {
        let mut field = Field3::new(2, 3, 4, 0.0);
        field.set(1, 2, 3, 9.0);
        assert_eq!(field.data[(1 * 3 + 2) * 4 + 3], 9.0);
    }

    #[test]
    fn rescale_maps_observed_range_onto_target() {
        let mut field = Field3::new(1, 4, 1, 0.0);
        for (j, v) in [2.0, 4.0, 6.0, 8.0].into_iter().enumerate() {
            field.set(0, j, 0, v);
        }
        field.rescale_into(-1.0, 1.0);
        assert_eq!(field.get(0, 0, 0), -1.0);
        assert_eq!(field.get(0, 3, 0), 1.0);
        assert!((field.get(0, 1, 0) - (-1.0 / 3.0)).abs() < 1e-12);
    }

    #[test]
    fn rescale_of_flat_field_yields_min() {
        let mut field = Field3::new(2, 2, 2, 5.0);
        field.rescale_into(10.0, 20.0);
        assert!(field.data.iter().all(|&v| v == 10.0));
    }

    #[test]
    fn reverse_y_flips_columns() {
        let mut field = Field3::new(1, 3, 1, 0.0);
        field.set(0, 0, 0, 1.0);
        field.set(0, 1, 0, 2.0);
        field.set(0, 2, 0, 3.0);
        field.reverse_y();
        assert_eq!(
            (field.get(0, 0, 0), field.get(0, 1, 0), field.get(0, 2, 0)),
            (3.0, 2.0, 1.0)
        );
    }
}
