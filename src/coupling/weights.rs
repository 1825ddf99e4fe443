use crate::coupling::overlaps::orbital_matrix;
use crate::coupling::CouplingError;
use crate::grid::{FftGrid, GridTransform};
use crate::initialization::{Sample, Wavefunction};
use ndarray::prelude::*;
use ndarray_linalg::c64;

/// Mean of the constraint potentials of both states, `(Vc_1 + Vc_2) / 2` of the first spin
/// channel, interpolated onto the wavefunction grid. The potentials already contain the
/// Lagrange multipliers.
pub fn average_constraint_potential<S: Sample, T: GridTransform>(
    sample1: &S,
    sample2: &S,
    wgrid: &FftGrid,
    transform: &T,
) -> Result<Array3<f64>, CouplingError> {
    let vc_dense: Array3<f64> =
        0.5 * (&sample1.vc_tot().index_axis(Axis(0), 0) + &sample2.vc_tot().index_axis(Axis(0), 0));
    Ok(transform.resample(vc_dense.view(), sample1.grid(), wgrid)?)
}

/// Off-diagonal coupling W_01 = V_ab = Tr(P12 C) with the orbital matrix elements
/// P12_ij = <phi1_i | Vc | phi2_j> and the cofactors C of O; W_10 = conj(V_ab).
/// The diagonal is not needed for the coupling and stays zero.
pub fn weight_matrix<W: Wavefunction>(
    wfc1: &W,
    wfc2: &W,
    vc: ArrayView3<f64>,
    c: ArrayView2<c64>,
    dv: f64,
) -> Array2<c64> {
    let p12: Array2<c64> = orbital_matrix(wfc1, wfc2, Some(vc), dv);
    let vab: c64 = p12.dot(&c).diag().sum();

    let mut w: Array2<c64> = Array2::zeros([2, 2]);
    w[[0, 1]] = vab;
    w[[1, 0]] = vab.conj();
    w
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::AbsDiffEq;
    use crate::coupling::tests::{close, line_state};
    use crate::grid::FourierInterpolation;

    #[test]
    fn potentials_are_averaged_over_the_states() {
        let state1 = line_state([0.5; 4], [0.4, 0.0, 0.4, 0.0], 0.0, 0.0);
        let state2 = line_state([0.5; 4], [0.2, 0.2, 0.0, 0.0], 0.0, 0.0);
        let vc = average_constraint_potential(
            &state1.sample,
            &state2.sample,
            &FftGrid::new(4, 1, 1),
            &FourierInterpolation,
        )
        .unwrap();
        let expected: Array3<f64> =
            Array3::from_shape_vec((4, 1, 1), vec![0.3, 0.1, 0.2, 0.0]).unwrap();
        assert!(vc.abs_diff_eq(&expected, 1e-14));
    }

    #[test]
    fn weight_matrix_is_hermitian_with_zero_diagonal() {
        let state1 = line_state([0.5, 0.5, 0.5, 0.5], [0.0; 4], 0.0, 0.0);
        let state2 = line_state([0.7, -0.1, 0.7, -0.1], [0.0; 4], 0.0, 0.0);
        let vc: Array3<f64> = Array3::from_shape_vec((4, 1, 1), vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let c: Array2<c64> = array![[c64::new(2.0, 0.0)]];
        let w = weight_matrix(&state1.wfc, &state2.wfc, vc.view(), c.view(), 1.0);

        // P12 = 0.5 * (0.7 - 0.2 + 2.1 - 0.4) = 1.1
        assert!(close(w[[0, 1]], c64::new(2.2, 0.0)));
        assert!(close(w[[1, 0]], w[[0, 1]].conj()));
        assert_eq!(w[[0, 0]], c64::new(0.0, 0.0));
        assert_eq!(w[[1, 1]], c64::new(0.0, 0.0));
    }
}
