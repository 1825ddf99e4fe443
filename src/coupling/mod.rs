//! Electronic coupling `Hab` between two converged diabatic states.
//!
//! The states are Slater determinants of Kohn-Sham orbitals that are, in general, not
//! orthogonal to each other. Following Oberhofer and Blumberger (2010) the coupling is
//! obtained in five steps: the orbital overlap O, the state overlap S = f(det O), the
//! constraint coupling W with the cofactors C of O, the diabatic Hamiltonian H and finally
//! its Löwdin orthogonalized form Hsymm = S^(-1/2) H S^(-1/2).
//!
//! Only the Gamma point and a single density spin channel are supported. The orbitals
//! are complex numbers nevertheless.
mod hamiltonian;
mod helpers;
pub mod logging;
mod overlaps;
mod weights;

pub use hamiltonian::{diabatic_hamiltonian, lowdin_orthogonalization};
pub use helpers::{cofactor_matrix, inverse_sqrt};
pub use overlaps::{orbital_overlap, state_overlap};
pub use weights::{average_constraint_potential, weight_matrix};

use crate::constants::{HARTREE_TO_EV, HARTREE_TO_MILLIHARTREE};
use crate::grid::{FftGrid, GridError, GridTransform};
use crate::initialization::{Sample, Wavefunction};
use crate::utils::Timer;
use log::info;
use ndarray::prelude::*;
use ndarray_linalg::c64;
use ndarray_linalg::error::LinalgError;
use std::error;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum CouplingError {
    SpinMismatch { vspin1: usize, vspin2: usize },
    /// Only densities with a single spin channel are implemented.
    UnsupportedSpin(usize),
    UnsupportedKpoints(usize),
    UnsupportedSpinChannels(usize),
    /// Both states need the same number of bands for every spin and k-point.
    BandMismatch,
    GridMismatch { grid1: FftGrid, grid2: FftGrid },
    NoOrbitals,
    /// The diabatic overlap matrix is (nearly) singular, the states are (nearly) linearly
    /// dependent.
    NumericalInstability {
        smallest_eigenvalue: f64,
        condition_number: f64,
    },
    Grid(GridError),
    Linalg(String),
}

impl fmt::Display for CouplingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CouplingError::SpinMismatch { vspin1, vspin2 } => write!(
                f,
                "the states have {} and {} spin channels",
                vspin1, vspin2
            ),
            CouplingError::UnsupportedSpin(vspin) => write!(
                f,
                "the coupling is only implemented for vspin = 1, got {}",
                vspin
            ),
            CouplingError::UnsupportedKpoints(nkpt) => write!(
                f,
                "the coupling is only implemented for the Gamma point, got {} k-points",
                nkpt
            ),
            CouplingError::UnsupportedSpinChannels(nspin) => write!(
                f,
                "wavefunctions with {} spin channels are not supported",
                nspin
            ),
            CouplingError::BandMismatch => {
                write!(f, "the band counts of the two wavefunctions differ")
            }
            CouplingError::GridMismatch { grid1, grid2 } => write!(
                f,
                "the states live on different grids: {} and {}",
                grid1, grid2
            ),
            CouplingError::NoOrbitals => write!(f, "the wavefunctions contain no orbitals"),
            CouplingError::NumericalInstability {
                smallest_eigenvalue,
                condition_number,
            } => write!(
                f,
                "the state overlap matrix is ill-conditioned (smallest eigenvalue {:.3e}, \
                 condition number {:.3e}), the Löwdin orthogonalization is not possible",
                smallest_eigenvalue, condition_number
            ),
            CouplingError::Grid(err) => write!(f, "{}", err),
            CouplingError::Linalg(msg) => write!(f, "linear algebra failure: {}", msg),
        }
    }
}

impl error::Error for CouplingError {}

impl From<GridError> for CouplingError {
    fn from(err: GridError) -> Self {
        CouplingError::Grid(err)
    }
}

impl From<LinalgError> for CouplingError {
    fn from(err: LinalgError) -> Self {
        CouplingError::Linalg(err.to_string())
    }
}

/// Handle of the external DFT calculation that produced a state.
pub trait DftDriver {
    /// Releases the resources of the driver. Called at most once.
    fn exit(&mut self);
}

/// A converged constrained state: its density data, its orbitals and optionally the
/// driver that is still attached to it.
pub struct DiabaticState<S, W> {
    pub sample: S,
    pub wfc: W,
    driver: Option<Box<dyn DftDriver>>,
}

impl<S: Sample, W: Wavefunction> DiabaticState<S, W> {
    pub fn new(sample: S, wfc: W) -> Self {
        Self {
            sample,
            wfc,
            driver: None,
        }
    }

    pub fn with_driver(sample: S, wfc: W, driver: Box<dyn DftDriver>) -> Self {
        Self {
            sample,
            wfc,
            driver: Some(driver),
        }
    }

    pub fn has_driver(&self) -> bool {
        self.driver.is_some()
    }

    /// Shuts the driver down, a second call does nothing.
    pub fn close_driver(&mut self) {
        if let Some(mut driver) = self.driver.take() {
            driver.exit();
        }
    }
}

/// All intermediate matrices of a coupling calculation.
#[derive(Debug, Clone)]
pub struct ElectronicCoupling {
    /// orbital overlap, norb x norb
    pub o: Array2<c64>,
    pub odet: c64,
    /// overlap of the diabatic states, 2 x 2
    pub s: Array2<c64>,
    /// constraint potential between the states, 2 x 2, zero diagonal
    pub w: Array2<c64>,
    /// cofactor matrix of O
    pub c: Array2<c64>,
    /// diabatic Hamiltonian, 2 x 2
    pub h: Array2<c64>,
    /// Löwdin orthogonalized H
    pub hsymm: Array2<c64>,
    /// |Hsymm[0, 1]| in Hartree
    pub hab: f64,
}

impl ElectronicCoupling {
    pub fn compute<S, W, T>(
        state1: &DiabaticState<S, W>,
        state2: &DiabaticState<S, W>,
        transform: &T,
        max_condition_number: f64,
    ) -> Result<Self, CouplingError>
    where
        S: Sample,
        W: Wavefunction,
        T: GridTransform,
    {
        check_compatibility(state1, state2)?;
        let (sample1, wfc1) = (&state1.sample, &state1.wfc);
        let (sample2, wfc2) = (&state2.sample, &state2.wfc);
        logging::print_coupling_init(wfc1);

        // volume element of the wavefunction grid
        let dv: f64 = sample1.omega() / wfc1.wgrid().n123() as f64;

        let o: Array2<c64> = orbital_overlap(wfc1, wfc2, dv);
        let (s, odet): (Array2<c64>, c64) = state_overlap(o.view())?;

        let vc: Array3<f64> =
            average_constraint_potential(sample1, sample2, wfc1.wgrid(), transform)?;
        let c: Array2<c64> = cofactor_matrix(o.view(), odet)?;
        let w: Array2<c64> = weight_matrix(wfc1, wfc2, vc.view(), c.view(), dv);

        let h: Array2<c64> = diabatic_hamiltonian(
            (sample1.ed(), sample1.ec()),
            (sample2.ed(), sample2.ec()),
            s.view(),
            w.view(),
        );
        let hsymm: Array2<c64> =
            lowdin_orthogonalization(h.view(), s.view(), max_condition_number)?;
        let hab: f64 = hsymm[[0, 1]].norm();

        Ok(Self {
            o,
            odet,
            s,
            w,
            c,
            h,
            hsymm,
            hab,
        })
    }

    pub fn hab_millihartree(&self) -> f64 {
        self.hab * HARTREE_TO_MILLIHARTREE
    }

    pub fn hab_ev(&self) -> f64 {
        self.hab * HARTREE_TO_EV
    }
}

fn check_compatibility<S: Sample, W: Wavefunction>(
    state1: &DiabaticState<S, W>,
    state2: &DiabaticState<S, W>,
) -> Result<(), CouplingError> {
    let (vspin1, vspin2) = (state1.sample.vspin(), state2.sample.vspin());
    if vspin1 != vspin2 {
        return Err(CouplingError::SpinMismatch { vspin1, vspin2 });
    }
    if vspin1 != 1 {
        return Err(CouplingError::UnsupportedSpin(vspin1));
    }
    let (wfc1, wfc2) = (&state1.wfc, &state2.wfc);
    if wfc1.nspin() != wfc2.nspin() || wfc1.nkpt() != wfc2.nkpt() || wfc1.nbnd() != wfc2.nbnd()
    {
        return Err(CouplingError::BandMismatch);
    }
    if wfc1.nspin() != 1 && wfc1.nspin() != 2 {
        return Err(CouplingError::UnsupportedSpinChannels(wfc1.nspin()));
    }
    if wfc1.nkpt() != 1 {
        return Err(CouplingError::UnsupportedKpoints(wfc1.nkpt()));
    }
    if wfc1.wgrid() != wfc2.wgrid() {
        return Err(CouplingError::GridMismatch {
            grid1: *wfc1.wgrid(),
            grid2: *wfc2.wgrid(),
        });
    }
    if state1.sample.grid() != state2.sample.grid() {
        return Err(CouplingError::GridMismatch {
            grid1: *state1.sample.grid(),
            grid2: *state2.sample.grid(),
        });
    }
    if wfc1.norb() == 0 {
        return Err(CouplingError::NoOrbitals);
    }
    Ok(())
}

/// Computes |Hab| in Hartree between two diabatic states. On success the drivers of both
/// states are shut down if `close_driver` is set.
pub fn compute_coupling<S, W, T>(
    state1: &mut DiabaticState<S, W>,
    state2: &mut DiabaticState<S, W>,
    close_driver: bool,
    transform: &T,
    max_condition_number: f64,
) -> Result<f64, CouplingError>
where
    S: Sample,
    W: Wavefunction,
    T: GridTransform,
{
    let timer: Timer = Timer::start();
    info!("{:=^80}", " Hab calculation ");
    let coupling = ElectronicCoupling::compute(state1, state2, transform, max_condition_number)?;
    logging::print_matrices(&coupling);
    logging::print_hab(&coupling);
    info!("{}", timer);

    if close_driver {
        state1.close_driver();
        state2.close_driver();
    }
    Ok(coupling.hab)
}
