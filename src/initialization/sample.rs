use crate::grid::FftGrid;
use crate::initialization::StateError;
use ndarray::prelude::*;

/// Read access to the electronic structure of one (diabatic) state on the density grid.
///
/// Spin resolved fields have the layout `(vspin, n1, n2, n3)`, fields of a single atom
/// `(n1, n2, n3)` and the gradients of atomic densities `(3, n1, n2, n3)`.
pub trait Sample {
    /// Volume of the simulation cell.
    fn omega(&self) -> f64;
    /// The density grid.
    fn grid(&self) -> &FftGrid;
    /// Number of spin channels, 1 or 2.
    fn vspin(&self) -> usize;
    fn n_atoms(&self) -> usize;
    /// Total electron density.
    fn rho_r(&self) -> ArrayView4<f64>;
    /// Projected (promolecular) density of a single atom.
    fn rhoatom_r(&self, atom: usize) -> ArrayView3<f64>;
    /// Sum of the projected densities of all atoms.
    fn rhopro_tot_r(&self) -> ArrayView3<f64>;
    /// Converged constraint potential, i.e. the sum of V * w over all constraints.
    fn vc_tot(&self) -> ArrayView4<f64>;
    /// Energy of the constrained state without the constraint contribution.
    fn ed(&self) -> f64;
    /// Constraint energy V * (N - N0) of the state.
    fn ec(&self) -> f64;
    /// Spatial gradient (d/dx, d/dy, d/dz) of the projected density of `atom`.
    fn compute_rhoatom_grad_r(&self, atom: usize) -> Array4<f64>;
}

/// A [Sample] that keeps every field in memory.
#[derive(Debug, Clone)]
pub struct GridSample {
    pub omega: f64,
    pub grid: FftGrid,
    pub vspin: usize,
    pub ed: f64,
    pub ec: f64,
    rho_r: Array4<f64>,
    vc_tot: Array4<f64>,
    rhoatom_r: Array4<f64>,
    rhoatom_grad_r: Array5<f64>,
    rhopro_tot_r: Array3<f64>,
}

impl GridSample {
    /// Creates a sample without atoms whose fields are all zero.
    pub fn new(omega: f64, grid: FftGrid, vspin: usize) -> Result<Self, StateError> {
        if vspin != 1 && vspin != 2 {
            return Err(StateError::InvalidSpin(vspin));
        }
        let [n1, n2, n3] = grid.shape();
        Ok(Self {
            omega,
            grid,
            vspin,
            ed: 0.0,
            ec: 0.0,
            rho_r: Array4::zeros(grid.spin_shape(vspin)),
            vc_tot: Array4::zeros(grid.spin_shape(vspin)),
            rhoatom_r: Array4::zeros((0, n1, n2, n3)),
            rhoatom_grad_r: Array5::zeros((0, 3, n1, n2, n3)),
            rhopro_tot_r: Array3::zeros(grid.shape()),
        })
    }

    pub fn set_energies(&mut self, ed: f64, ec: f64) {
        self.ed = ed;
        self.ec = ec;
    }

    pub fn set_rho_r(&mut self, rho_r: Array4<f64>) -> Result<(), StateError> {
        let expected = self.grid.spin_shape(self.vspin);
        if rho_r.shape() != &expected[..] {
            return Err(StateError::shape("rho_r", &expected, rho_r.shape()));
        }
        self.rho_r = rho_r;
        Ok(())
    }

    pub fn set_vc_tot(&mut self, vc_tot: Array4<f64>) -> Result<(), StateError> {
        let expected = self.grid.spin_shape(self.vspin);
        if vc_tot.shape() != &expected[..] {
            return Err(StateError::shape("Vc_tot", &expected, vc_tot.shape()));
        }
        self.vc_tot = vc_tot;
        Ok(())
    }

    /// Sets the projected densities of all atoms `(natoms, n1, n2, n3)` together with
    /// their spatial gradients `(natoms, 3, n1, n2, n3)`. The total projected density
    /// is rebuilt from them.
    pub fn set_atomic_densities(
        &mut self,
        rhoatom_r: Array4<f64>,
        rhoatom_grad_r: Array5<f64>,
    ) -> Result<(), StateError> {
        let [n1, n2, n3] = self.grid.shape();
        let n_atoms: usize = rhoatom_r.dim().0;
        if rhoatom_r.shape() != &[n_atoms, n1, n2, n3][..] {
            return Err(StateError::shape(
                "rhoatom_r",
                &[n_atoms, n1, n2, n3],
                rhoatom_r.shape(),
            ));
        }
        if rhoatom_grad_r.shape() != &[n_atoms, 3, n1, n2, n3][..] {
            return Err(StateError::shape(
                "rhoatom_grad_r",
                &[n_atoms, 3, n1, n2, n3],
                rhoatom_grad_r.shape(),
            ));
        }
        self.rhopro_tot_r = rhoatom_r.sum_axis(Axis(0));
        self.rhoatom_r = rhoatom_r;
        self.rhoatom_grad_r = rhoatom_grad_r;
        Ok(())
    }
}

impl Sample for GridSample {
    fn omega(&self) -> f64 {
        self.omega
    }

    fn grid(&self) -> &FftGrid {
        &self.grid
    }

    fn vspin(&self) -> usize {
        self.vspin
    }

    fn n_atoms(&self) -> usize {
        self.rhoatom_r.dim().0
    }

    fn rho_r(&self) -> ArrayView4<f64> {
        self.rho_r.view()
    }

    fn rhoatom_r(&self, atom: usize) -> ArrayView3<f64> {
        self.rhoatom_r.index_axis(Axis(0), atom)
    }

    fn rhopro_tot_r(&self) -> ArrayView3<f64> {
        self.rhopro_tot_r.view()
    }

    fn vc_tot(&self) -> ArrayView4<f64> {
        self.vc_tot.view()
    }

    fn ed(&self) -> f64 {
        self.ed
    }

    fn ec(&self) -> f64 {
        self.ec
    }

    fn compute_rhoatom_grad_r(&self, atom: usize) -> Array4<f64> {
        self.rhoatom_grad_r.index_axis(Axis(0), atom).to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_projected_density_is_the_atomic_sum() {
        let grid = FftGrid::new(2, 2, 2);
        let mut sample = GridSample::new(8.0, grid, 1).unwrap();
        let mut rhoatom: Array4<f64> = Array4::zeros((2, 2, 2, 2));
        rhoatom.index_axis_mut(Axis(0), 0).fill(0.25);
        rhoatom.index_axis_mut(Axis(0), 1).fill(0.5);
        sample
            .set_atomic_densities(rhoatom, Array5::zeros((2, 3, 2, 2, 2)))
            .unwrap();

        assert_eq!(sample.n_atoms(), 2);
        assert!(sample.rhopro_tot_r().iter().all(|val| *val == 0.75));
    }

    #[test]
    fn invalid_layouts_are_rejected() {
        let grid = FftGrid::new(2, 2, 2);
        assert_eq!(
            GridSample::new(1.0, grid, 3).unwrap_err(),
            StateError::InvalidSpin(3)
        );
        let mut sample = GridSample::new(1.0, grid, 2).unwrap();
        assert!(sample.set_rho_r(Array4::zeros((1, 2, 2, 2))).is_err());
        assert!(sample
            .set_atomic_densities(Array4::zeros((1, 2, 2, 2)), Array5::zeros((2, 3, 2, 2, 2)))
            .is_err());
    }
}
