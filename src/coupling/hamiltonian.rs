use crate::coupling::helpers::inverse_sqrt;
use crate::coupling::CouplingError;
use ndarray::prelude::*;
use ndarray_linalg::c64;

/// Diabatic Hamiltonian of two nonorthogonal constrained states, given as
/// `(Ed, Ec)` pairs of energy without constraint and constraint energy.
/// The diagonal holds Ed of every state, the off-diagonal is the symmetrized
/// H_ab = 1/2 (F_b S_ab + F_a S_ba) - 1/2 (W_ab + W_ba) with F = Ed + Ec.
pub fn diabatic_hamiltonian(
    energies1: (f64, f64),
    energies2: (f64, f64),
    s: ArrayView2<c64>,
    w: ArrayView2<c64>,
) -> Array2<c64> {
    let (ed1, ec1) = energies1;
    let (ed2, ec2) = energies2;
    let fa: f64 = ed1 + ec1;
    let fb: f64 = ed2 + ec2;

    let mut h: Array2<c64> = Array2::zeros([2, 2]);
    h[[0, 0]] = c64::new(ed1, 0.0);
    h[[1, 1]] = c64::new(ed2, 0.0);
    h[[0, 1]] = (s[[0, 1]] * fb + s[[1, 0]] * fa) * 0.5 - (w[[0, 1]] + w[[1, 0]]) * 0.5;
    h[[1, 0]] = h[[0, 1]].conj();
    h
}

/// Hsymm = S^(-1/2) H S^(-1/2)
pub fn lowdin_orthogonalization(
    h: ArrayView2<c64>,
    s: ArrayView2<c64>,
    max_condition_number: f64,
) -> Result<Array2<c64>, CouplingError> {
    let x: Array2<c64> = inverse_sqrt(s, max_condition_number)?;
    if x == Array2::<c64>::eye(x.nrows()) {
        return Ok(h.to_owned());
    }
    Ok(x.dot(&h).dot(&x))
}
