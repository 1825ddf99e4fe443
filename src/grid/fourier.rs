use crate::grid::{FftGrid, GridError, GridTransform};
use ndarray::prelude::*;
use ndarray::Zip;
use ndarray_linalg::c64;
use std::f64::consts::PI;

/// Trigonometric interpolation of a periodic field between two grids of the same cell.
/// Every axis is transformed separately: the field is expanded in the plane waves that
/// both grids can represent and the expansion is evaluated on the destination points.
/// The normalization uses the source length, so the values of the field are preserved
/// (a constant stays the same constant).
#[derive(Debug, Clone, Copy, Default)]
pub struct FourierInterpolation;

impl GridTransform for FourierInterpolation {
    fn resample(
        &self,
        field: ArrayView3<f64>,
        source: &FftGrid,
        dest: &FftGrid,
    ) -> Result<Array3<f64>, GridError> {
        if field.shape() != &source.shape()[..] {
            return Err(GridError::ShapeMismatch {
                expected: source.shape(),
                found: field.shape().to_vec(),
            });
        }
        if source.n123() == 0 {
            return Err(GridError::EmptyGrid(*source));
        }
        if dest.n123() == 0 {
            return Err(GridError::EmptyGrid(*dest));
        }
        if source == dest {
            return Ok(field.to_owned());
        }

        let mut data: Array3<c64> = field.mapv(|val| c64::new(val, 0.0));
        let axes = [
            (source.n1, dest.n1),
            (source.n2, dest.n2),
            (source.n3, dest.n3),
        ];
        for (idx, (n, m)) in axes.iter().enumerate() {
            if n != m {
                data = resample_axis(data.view(), Axis(idx), *m);
            }
        }
        Ok(data.mapv(|val| val.re))
    }
}

/// Signed frequencies k with |k| <= (min(n, m) - 1) / 2. The Nyquist component of an
/// even grid is dropped.
fn common_frequencies(n: usize, m: usize) -> Vec<i64> {
    let kmax: i64 = ((n.min(m) - 1) / 2) as i64;
    (-kmax..=kmax).collect()
}

fn resample_axis(data: ArrayView3<c64>, axis: Axis, m: usize) -> Array3<c64> {
    let n: usize = data.len_of(axis);
    let freqs: Vec<i64> = common_frequencies(n, m);

    // e^{-2 pi i k x / n}
    let forward: Array2<c64> = Array2::from_shape_fn((freqs.len(), n), |(ik, x)| {
        let phase: i64 = (freqs[ik] * x as i64).rem_euclid(n as i64);
        c64::from_polar(1.0, -2.0 * PI * phase as f64 / n as f64)
    });
    // 1/n e^{2 pi i k y / m}
    let backward: Array2<c64> = Array2::from_shape_fn((m, freqs.len()), |(y, ik)| {
        let phase: i64 = (freqs[ik] * y as i64).rem_euclid(m as i64);
        c64::from_polar(1.0 / n as f64, 2.0 * PI * phase as f64 / m as f64)
    });
    // the combined m x n interpolation matrix is applied to every line along the axis
    let transfer: Array2<c64> = backward.dot(&forward);

    let mut shape = data.raw_dim();
    shape[axis.index()] = m;
    let mut out: Array3<c64> = Array3::zeros(shape);
    Zip::from(out.lanes_mut(axis))
        .and(data.lanes(axis))
        .for_each(|mut line_out, line_in| line_out.assign(&transfer.dot(&line_in)));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::AbsDiffEq;

    pub const EPSILON: f64 = 1e-12;

    fn cosine_along_x(grid: &FftGrid) -> Array3<f64> {
        Array3::from_shape_fn(grid.shape(), |(i, _j, _k)| {
            (2.0 * PI * i as f64 / grid.n1 as f64).cos()
        })
    }

    #[test]
    fn same_grid_is_identity() {
        let grid = FftGrid::new(4, 3, 5);
        let field: Array3<f64> = Array3::from_shape_fn(grid.shape(), |(i, j, k)| {
            (i * 15 + j * 5 + k) as f64 * 0.1
        });
        let out = FourierInterpolation
            .resample(field.view(), &grid, &grid)
            .unwrap();
        assert_eq!(out, field);
    }

    #[test]
    fn constant_field_stays_constant() {
        let source = FftGrid::new(4, 4, 4);
        let dest = FftGrid::new(8, 6, 3);
        let field: Array3<f64> = Array3::from_elem(source.shape(), 0.75);
        let out = FourierInterpolation
            .resample(field.view(), &source, &dest)
            .unwrap();
        let reference: Array3<f64> = Array3::from_elem(dest.shape(), 0.75);
        assert_eq!(out.shape(), &dest.shape()[..]);
        assert!(
            out.abs_diff_eq(&reference, EPSILON),
            "constant field changed: {}",
            out
        );
    }

    #[test]
    fn band_limited_field_is_interpolated_exactly() {
        let coarse = FftGrid::new(8, 2, 2);
        let fine = FftGrid::new(16, 2, 2);
        let up = FourierInterpolation
            .resample(cosine_along_x(&coarse).view(), &coarse, &fine)
            .unwrap();
        assert!(up.abs_diff_eq(&cosine_along_x(&fine), EPSILON));

        let down = FourierInterpolation
            .resample(cosine_along_x(&fine).view(), &fine, &coarse)
            .unwrap();
        assert!(down.abs_diff_eq(&cosine_along_x(&coarse), EPSILON));
    }

    #[test]
    fn wrong_source_shape_is_rejected() {
        let source = FftGrid::new(4, 4, 4);
        let dest = FftGrid::new(2, 2, 2);
        let field: Array3<f64> = Array3::zeros((4, 4, 2));
        let result = FourierInterpolation.resample(field.view(), &source, &dest);
        assert!(matches!(result, Err(GridError::ShapeMismatch { .. })));
    }
}
