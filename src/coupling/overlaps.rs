use crate::coupling::CouplingError;
use crate::initialization::Wavefunction;
use ndarray::prelude::*;
use ndarray::Zip;
use ndarray_linalg::{c64, Determinant};

/// Matrix elements `dv * sum_r conj(psi1_i(r)) op(r) psi2_j(r)` between the orbitals of two
/// wavefunctions, where `op` is either one or a local potential on the wavefunction grid.
/// Orbitals of different spin are orthogonal, only the Gamma point is taken into account.
pub(crate) fn orbital_matrix<W: Wavefunction>(
    wfc1: &W,
    wfc2: &W,
    potential: Option<ArrayView3<f64>>,
    dv: f64,
) -> Array2<c64> {
    let norb: usize = wfc1.norb();
    let mut matrix: Array2<c64> = Array2::zeros([norb, norb]);
    let zero: c64 = c64::new(0.0, 0.0);

    for ispin in 0..wfc1.nspin() {
        let nbnd: usize = wfc1.nbnd()[[ispin, 0]];
        for ibnd in 0..nbnd {
            let i: usize = wfc1.skb2idx(ispin, 0, ibnd);
            let psi_i: ArrayView3<c64> = wfc1.psi_r(i);
            for jbnd in 0..nbnd {
                let j: usize = wfc2.skb2idx(ispin, 0, jbnd);
                let psi_j: ArrayView3<c64> = wfc2.psi_r(j);
                let value: c64 = match potential {
                    Some(v) => Zip::from(&psi_i)
                        .and(&v)
                        .and(&psi_j)
                        .fold(zero, |acc, a, &v, b| acc + a.conj() * v * b),
                    None => Zip::from(&psi_i)
                        .and(&psi_j)
                        .fold(zero, |acc, a, b| acc + a.conj() * b),
                };
                matrix[[i, j]] = value * dv;
            }
        }
    }
    matrix
}

/// Overlap O_ij = <phi1_i | phi2_j> of the Kohn-Sham orbitals of two states.
pub fn orbital_overlap<W: Wavefunction>(wfc1: &W, wfc2: &W, dv: f64) -> Array2<c64> {
    orbital_matrix(wfc1, wfc2, None, dv)
}

/// Overlap of the two Slater determinants and det(O). The states are normalized, the
/// off-diagonal elements are S_10 = det(O) and S_01 = conj(det(O)).
pub fn state_overlap(o: ArrayView2<c64>) -> Result<(Array2<c64>, c64), CouplingError> {
    // a singular O gives det(O) = 0
    let odet: c64 = o.det()?;
    let one: c64 = c64::new(1.0, 0.0);
    let s: Array2<c64> = array![[one, odet.conj()], [odet, one]];
    Ok((s, odet))
}
