use crate::coupling::CouplingError;
use ndarray::prelude::*;
use ndarray_linalg::{c64, Determinant, Eigh, Inverse, UPLO};

/// Cofactor matrix of `o`, i.e. the transpose of its adjugate `det(O) O^-1`.
/// If `o` is singular the cofactors are expanded from the signed minors instead, the
/// cofactor matrix of a 1 x 1 matrix is [[1]].
pub fn cofactor_matrix(o: ArrayView2<c64>, odet: c64) -> Result<Array2<c64>, CouplingError> {
    if odet.norm() > 0.0 {
        if let Ok(o_inv) = o.inv() {
            return Ok((o_inv * odet).reversed_axes());
        }
    }
    cofactor_expansion(o)
}

fn cofactor_expansion(o: ArrayView2<c64>) -> Result<Array2<c64>, CouplingError> {
    let n: usize = o.nrows();
    let mut c: Array2<c64> = Array2::zeros([n, n]);
    if n == 1 {
        c[[0, 0]] = c64::new(1.0, 0.0);
        return Ok(c);
    }
    for i in 0..n {
        let rows: Vec<usize> = (0..n).filter(|k| *k != i).collect();
        for j in 0..n {
            let cols: Vec<usize> = (0..n).filter(|k| *k != j).collect();
            let minor: Array2<c64> = o.select(Axis(0), &rows).select(Axis(1), &cols);
            let sign: f64 = if (i + j) % 2 == 0 { 1.0 } else { -1.0 };
            c[[i, j]] = minor.det()? * sign;
        }
    }
    Ok(c)
}

/// Inverse square root S^(-1/2) = U diag(lambda^-1/2) U^H of a Hermitian positive definite
/// matrix. Fails if the smallest eigenvalue is not positive or the condition number
/// exceeds `max_condition_number`.
pub fn inverse_sqrt(
    s: ArrayView2<c64>,
    max_condition_number: f64,
) -> Result<Array2<c64>, CouplingError> {
    let n: usize = s.nrows();
    if s == Array2::<c64>::eye(n) {
        return Ok(Array2::eye(n));
    }

    // S = U Lambda U^H
    let (lambdas, evecs): (Array1<f64>, Array2<c64>) = s.eigh(UPLO::Lower)?;
    let smallest: f64 = lambdas.iter().cloned().fold(f64::INFINITY, f64::min);
    let largest: f64 = lambdas.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let condition_number: f64 = if smallest > 0.0 {
        largest / smallest
    } else {
        f64::INFINITY
    };
    // a non-positive eigenvalue has no real inverse square root, whatever the threshold
    if smallest <= 0.0 || condition_number > max_condition_number {
        return Err(CouplingError::NumericalInstability {
            smallest_eigenvalue: smallest,
            condition_number,
        });
    }

    let invsqrt: Array1<c64> = lambdas.mapv(|x| c64::new(1.0 / x.sqrt(), 0.0));
    let evecs_h: Array2<c64> = evecs.t().mapv(|z| z.conj());
    Ok(evecs.dot(&Array2::from_diag(&invsqrt)).dot(&evecs_h))
}
