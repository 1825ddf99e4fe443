use crate::grid::FftGrid;
use crate::initialization::StateError;
use ndarray::prelude::*;
use ndarray_linalg::c64;

/// Kohn-Sham orbitals of a converged state on the (possibly coarser) wavefunction grid.
/// Orbitals are addressed by a flat index that is obtained from the (spin, k-point, band)
/// triple with [Wavefunction::skb2idx].
pub trait Wavefunction {
    fn nspin(&self) -> usize;
    fn nkpt(&self) -> usize;
    /// Number of bands for every spin channel and k-point, shape `(nspin, nkpt)`.
    fn nbnd(&self) -> ArrayView2<usize>;
    /// Total number of orbitals.
    fn norb(&self) -> usize;
    fn wgrid(&self) -> &FftGrid;
    fn skb2idx(&self, ispin: usize, ikpt: usize, ibnd: usize) -> usize;
    fn psi_r(&self, idx: usize) -> ArrayView3<c64>;
}

/// In-memory orbitals stored as `(norb, m1, m2, m3)`, ordered by spin, then k-point,
/// then band.
#[derive(Debug, Clone)]
pub struct GridWavefunction {
    wgrid: FftGrid,
    nbnd: Array2<usize>,
    offsets: Array2<usize>,
    psi_r: Array4<c64>,
}

impl GridWavefunction {
    pub fn new(
        wgrid: FftGrid,
        nbnd: Array2<usize>,
        psi_r: Array4<c64>,
    ) -> Result<Self, StateError> {
        let norb: usize = psi_r.dim().0;
        let n_bands: usize = nbnd.sum();
        if n_bands != norb {
            return Err(StateError::BandCount { norb, n_bands });
        }
        let expected = [norb, wgrid.n1, wgrid.n2, wgrid.n3];
        if psi_r.shape() != &expected[..] {
            return Err(StateError::shape("psi_r", &expected, psi_r.shape()));
        }

        // position of the first band of every (spin, k-point) block in the flat storage
        let mut offsets: Array2<usize> = Array2::zeros(nbnd.raw_dim());
        let mut start: usize = 0;
        for (offset, n) in offsets.iter_mut().zip(nbnd.iter()) {
            *offset = start;
            start += n;
        }

        Ok(Self {
            wgrid,
            nbnd,
            offsets,
            psi_r,
        })
    }

    /// Gamma-point orbitals are real, they are stored as complex numbers nevertheless.
    pub fn from_real(
        wgrid: FftGrid,
        nbnd: Array2<usize>,
        psi_r: Array4<f64>,
    ) -> Result<Self, StateError> {
        Self::new(wgrid, nbnd, psi_r.mapv(|val| c64::new(val, 0.0)))
    }
}

impl Wavefunction for GridWavefunction {
    fn nspin(&self) -> usize {
        self.nbnd.nrows()
    }

    fn nkpt(&self) -> usize {
        self.nbnd.ncols()
    }

    fn nbnd(&self) -> ArrayView2<usize> {
        self.nbnd.view()
    }

    fn norb(&self) -> usize {
        self.psi_r.dim().0
    }

    fn wgrid(&self) -> &FftGrid {
        &self.wgrid
    }

    fn skb2idx(&self, ispin: usize, ikpt: usize, ibnd: usize) -> usize {
        debug_assert!(ibnd < self.nbnd[[ispin, ikpt]]);
        self.offsets[[ispin, ikpt]] + ibnd
    }

    fn psi_r(&self, idx: usize) -> ArrayView3<c64> {
        self.psi_r.index_axis(Axis(0), idx)
    }
}
