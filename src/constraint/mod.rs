//! Constraints on the electron density that are imposed during the SCF cycle by means of
//! a Lagrange multiplier `V`. A constraint is characterized by a weight function `w(r)`;
//! it is fulfilled if `N = Int rho(r) w(r) dr` equals the target value `N0`.
//!
//! The weight is a derived field and is never recomputed implicitly. The driver has to
//! call [Constraint::update_weight] whenever the fragment densities change, before any
//! gradient, force, electron number or potential is requested. Requests on a stale
//! weight fail with [ConstraintError::StaleWeight].
pub use charge_transfer::ChargeTransferConstraint;

mod charge_transfer;
pub mod logging;

use crate::initialization::Sample;
use ndarray::prelude::*;
use ndarray::{aview1, Zip};
use rayon::prelude::*;
use std::error;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum ConstraintError {
    /// The weight was never computed or the fragments changed since the last update.
    StaleWeight,
    ShapeMismatch {
        quantity: &'static str,
        expected: Vec<usize>,
        found: Vec<usize>,
    },
    AtomOutOfRange {
        atom: usize,
        n_atoms: usize,
    },
}

impl fmt::Display for ConstraintError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstraintError::StaleWeight => write!(
                f,
                "the weight function is not up to date, update_weight has to be called first"
            ),
            ConstraintError::ShapeMismatch {
                quantity,
                expected,
                found,
            } => write!(
                f,
                "{} has the shape {:?}, but {:?} was expected",
                quantity, found, expected
            ),
            ConstraintError::AtomOutOfRange { atom, n_atoms } => {
                write!(f, "atom {} does not exist, the sample has {} atoms", atom, n_atoms)
            }
        }
    }
}

impl error::Error for ConstraintError {}

/// State of the Lagrange multiplier of a single constraint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Multiplier {
    /// Target value of the constrained electron number.
    pub n0: f64,
    /// Current value of the multiplier.
    pub v: f64,
    /// Bracket in which the solver searches for `v`.
    pub v_brak: (f64, f64),
    pub n_tol: f64,
    /// Electron number of the last call to [Constraint::compute_n].
    pub n: Option<f64>,
}

impl Multiplier {
    pub fn new(n0: f64, v_init: f64, v_brak: (f64, f64), n_tol: f64) -> Self {
        Self {
            n0,
            v: v_init,
            v_brak,
            n_tol,
            n: None,
        }
    }
}

/// Weight function `w` of shape `(vspin, n1, n2, n3)` together with its freshness.
#[derive(Debug, Clone, Default)]
pub struct WeightField {
    w: Option<Array4<f64>>,
    fresh: bool,
}

impl WeightField {
    pub fn set(&mut self, w: Array4<f64>) {
        self.w = Some(w);
        self.fresh = true;
    }

    /// Marks the weight as outdated, e.g. after the fragment densities were changed.
    pub fn invalidate(&mut self) {
        self.fresh = false;
    }

    pub fn is_fresh(&self) -> bool {
        self.fresh && self.w.is_some()
    }

    pub fn get(&self) -> Result<ArrayView4<f64>, ConstraintError> {
        match (&self.w, self.fresh) {
            (Some(w), true) => Ok(w.view()),
            _ => Err(ConstraintError::StaleWeight),
        }
    }
}

pub trait Constraint {
    fn kind(&self) -> &'static str;
    fn multiplier(&self) -> &Multiplier;
    fn multiplier_mut(&mut self) -> &mut Multiplier;
    fn weight(&self) -> &WeightField;

    /// Recomputes the weight function from the current fragment densities.
    fn update_weight<S: Sample>(&mut self, sample: &S) -> Result<(), ConstraintError>;

    /// Derivative of the weight function with respect to the position of `atom`,
    /// shape `(3, vspin, n1, n2, n3)`.
    fn compute_weight_gradient<S: Sample>(
        &self,
        sample: &S,
        atom: usize,
    ) -> Result<Array5<f64>, ConstraintError>;

    /// The up to date weight function, checked against the grid and spin layout of the sample.
    fn checked_weight<S: Sample>(&self, sample: &S) -> Result<ArrayView4<f64>, ConstraintError> {
        let w: ArrayView4<f64> = self.weight().get()?;
        let expected = sample.grid().spin_shape(sample.vspin());
        if w.shape() != &expected[..] {
            return Err(ConstraintError::ShapeMismatch {
                quantity: "w",
                expected: expected.to_vec(),
                found: w.shape().to_vec(),
            });
        }
        Ok(w)
    }

    /// Constrained electron number `N = omega / n123 * sum(rho * w)`. The value is also
    /// stored in the multiplier.
    fn compute_n<S: Sample>(&mut self, sample: &S) -> Result<f64, ConstraintError> {
        let w: ArrayView4<f64> = self.checked_weight(sample)?;
        let dv: f64 = sample.omega() / sample.grid().n123() as f64;
        let n: f64 = dv
            * Zip::from(&sample.rho_r())
                .and(&w)
                .fold(0.0, |acc, rho, w| acc + rho * w);
        self.multiplier_mut().n = Some(n);
        Ok(n)
    }

    /// `|N - N0| < N_tol` for the last computed electron number.
    fn is_converged(&self) -> bool {
        let multiplier = self.multiplier();
        match multiplier.n {
            Some(n) => (n - multiplier.n0).abs() < multiplier.n_tol,
            None => false,
        }
    }

    /// Contribution `V * w` of this constraint to the constraint potential `Vc_tot`.
    fn potential<S: Sample>(&self, sample: &S) -> Result<Array4<f64>, ConstraintError> {
        let w: ArrayView4<f64> = self.checked_weight(sample)?;
        Ok(self.multiplier().v * &w)
    }

    /// Constraint energy `V * (N - N0)`, available after [Constraint::compute_n].
    fn free_energy(&self) -> Option<f64> {
        let multiplier = self.multiplier();
        multiplier.n.map(|n| multiplier.v * (n - multiplier.n0))
    }

    /// Force on every atom `V * omega / n123 * sum(rho * grad_w)`, shape `(natoms, 3)`, where
    /// `grad_w` is built from the spatial gradient of the atomic density.
    /// The atoms are independent of each other and are computed in parallel.
    fn compute_force<S: Sample + Sync>(&self, sample: &S) -> Result<Array2<f64>, ConstraintError>
    where
        Self: Sync,
    {
        // fail early instead of once per atom
        self.checked_weight(sample)?;
        let n_atoms: usize = sample.n_atoms();
        let v: f64 = self.multiplier().v;
        let dv: f64 = sample.omega() / sample.grid().n123() as f64;
        let rho_r: ArrayView4<f64> = sample.rho_r();

        let rows: Vec<[f64; 3]> = (0..n_atoms)
            .into_par_iter()
            .map(|atom| -> Result<[f64; 3], ConstraintError> {
                let w_grad: Array5<f64> = self.compute_weight_gradient(sample, atom)?;
                let mut force: [f64; 3] = [0.0; 3];
                for (f, grad_cart) in force.iter_mut().zip(w_grad.outer_iter()) {
                    *f = v
                        * dv
                        * Zip::from(&rho_r)
                            .and(&grad_cart)
                            .fold(0.0, |acc, rho, grad| acc + rho * grad);
                }
                Ok(force)
            })
            .collect::<Result<Vec<[f64; 3]>, ConstraintError>>()?;

        let mut forces: Array2<f64> = Array2::zeros([n_atoms, 3]);
        for (mut row, force) in forces.outer_iter_mut().zip(rows.iter()) {
            row.assign(&aview1(&force[..]));
        }
        Ok(forces)
    }
}
