use crate::constraint::logging::print_constraint_init;
use crate::constraint::{Constraint, ConstraintError, Multiplier, WeightField};
use crate::initialization::{AtomFragment, Fragment, Sample};
use ndarray::prelude::*;
use ndarray::Zip;

/// Constraint on the difference of the electron numbers of a donor and an acceptor
/// fragment. The Hirshfeld weight is
///
/// w(r) = (sum_{I in D} rho_I(r) - sum_{I in A} rho_I(r)) / sum_I rho_I(r)
///
/// i.e. a positive `N` means an excess of electrons on the donor. Wherever the total
/// projected density is below `eps` the weight and all of its gradients are set to zero.
#[derive(Debug, Clone)]
pub struct ChargeTransferConstraint<F: Fragment = AtomFragment> {
    donor: F,
    acceptor: F,
    eps: f64,
    multiplier: Multiplier,
    weight: WeightField,
}

impl<F: Fragment> ChargeTransferConstraint<F> {
    pub const KIND: &'static str = "charge transfer";

    pub fn new(donor: F, acceptor: F, multiplier: Multiplier, eps: f64) -> Self {
        print_constraint_init(Self::KIND, multiplier.n_tol, eps);
        Self {
            donor,
            acceptor,
            eps,
            multiplier,
            weight: WeightField::default(),
        }
    }

    pub fn donor(&self) -> &F {
        &self.donor
    }

    pub fn acceptor(&self) -> &F {
        &self.acceptor
    }

    pub fn eps(&self) -> f64 {
        self.eps
    }

    /// Changes the density threshold of the mask, the weight has to be updated afterwards.
    pub fn set_eps(&mut self, eps: f64) {
        self.eps = eps;
        self.weight.invalidate();
    }

    /// Mutable access to the donor invalidates the weight.
    pub fn donor_mut(&mut self) -> &mut F {
        self.weight.invalidate();
        &mut self.donor
    }

    /// Mutable access to the acceptor invalidates the weight.
    pub fn acceptor_mut(&mut self) -> &mut F {
        self.weight.invalidate();
        &mut self.acceptor
    }

    /// +1 for donor atoms, -1 for acceptor atoms and 0 for all others.
    fn delta(&self, atom: usize) -> f64 {
        if self.donor.contains(atom) {
            1.0
        } else if self.acceptor.contains(atom) {
            -1.0
        } else {
            0.0
        }
    }
}

impl ChargeTransferConstraint<AtomFragment> {
    /// Rebuilds the projected densities of both fragments from the sample. The weight
    /// has to be updated afterwards.
    pub fn update_fragments<S: Sample>(&mut self, sample: &S) {
        self.donor.update_rhopro(sample);
        self.acceptor.update_rhopro(sample);
        self.weight.invalidate();
    }
}

fn check_grid_shape(
    quantity: &'static str,
    field: &[usize],
    expected: &[usize],
) -> Result<(), ConstraintError> {
    if field != expected {
        return Err(ConstraintError::ShapeMismatch {
            quantity,
            expected: expected.to_vec(),
            found: field.to_vec(),
        });
    }
    Ok(())
}

impl<F: Fragment> Constraint for ChargeTransferConstraint<F> {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn multiplier(&self) -> &Multiplier {
        &self.multiplier
    }

    fn multiplier_mut(&mut self) -> &mut Multiplier {
        &mut self.multiplier
    }

    fn weight(&self) -> &WeightField {
        &self.weight
    }

    fn update_weight<S: Sample>(&mut self, sample: &S) -> Result<(), ConstraintError> {
        let grid = sample.grid();
        let rho_tot: ArrayView3<f64> = sample.rhopro_tot_r();
        let rho_donor: ArrayView3<f64> = self.donor.rhopro_r();
        let rho_acceptor: ArrayView3<f64> = self.acceptor.rhopro_r();
        check_grid_shape("rhopro_tot_r", rho_tot.shape(), &grid.shape())?;
        check_grid_shape("donor rhopro_r", rho_donor.shape(), &grid.shape())?;
        check_grid_shape("acceptor rhopro_r", rho_acceptor.shape(), &grid.shape())?;

        let eps: f64 = self.eps;
        let mut w: Array3<f64> = Array3::zeros(grid.shape());
        Zip::from(&mut w)
            .and(&rho_donor)
            .and(&rho_acceptor)
            .and(&rho_tot)
            .for_each(|w, d, a, tot| {
                if *tot >= eps {
                    *w = (d - a) / tot;
                }
            });

        // both spin channels share the same weight
        let w_spin: Array4<f64> =
            Array4::from_shape_fn(grid.spin_shape(sample.vspin()), |(_, i, j, k)| {
                w[[i, j, k]]
            });
        self.weight.set(w_spin);
        Ok(())
    }

    fn compute_weight_gradient<S: Sample>(
        &self,
        sample: &S,
        atom: usize,
    ) -> Result<Array5<f64>, ConstraintError> {
        let w: ArrayView4<f64> = self.checked_weight(sample)?;
        let n_atoms: usize = sample.n_atoms();
        if atom >= n_atoms {
            return Err(ConstraintError::AtomOutOfRange { atom, n_atoms });
        }
        let delta: f64 = self.delta(atom);
        let grid = sample.grid();
        let rho_grad: Array4<f64> = sample.compute_rhoatom_grad_r(atom);
        let [n1, n2, n3] = grid.shape();
        check_grid_shape("rhoatom_grad_r", rho_grad.shape(), &[3, n1, n2, n3])?;
        let rho_tot: ArrayView3<f64> = sample.rhopro_tot_r();

        // dw/dR = (delta - w) * drho_atom/dR / rho_tot
        let eps: f64 = self.eps;
        let mut w_grad: Array5<f64> = Array5::zeros((3, sample.vspin(), n1, n2, n3));
        for (mut grad_cart, rho_grad_cart) in w_grad.outer_iter_mut().zip(rho_grad.outer_iter()) {
            for (mut grad_spin, w_spin) in grad_cart.outer_iter_mut().zip(w.outer_iter()) {
                Zip::from(&mut grad_spin)
                    .and(&w_spin)
                    .and(&rho_grad_cart)
                    .and(&rho_tot)
                    .for_each(|grad, w, drho, tot| {
                        if *tot >= eps {
                            *grad = (delta - w) * drho / tot;
                        }
                    });
            }
        }
        Ok(w_grad)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::AbsDiffEq;
    use crate::grid::FftGrid;
    use crate::initialization::GridSample;

    pub const EPSILON: f64 = 1e-14;

    const LENGTH: f64 = 16.0;
    const SIGMA: f64 = 1.0;

    /// Gaussian atoms placed along x in a periodic cell of length 16 bohr, together with the
    /// spatial gradients of their densities.
    /// A `background` > 0 adds one more atom with a constant density.
    fn gaussian_sample(centers: &[f64], background: f64, vspin: usize, n1: usize) -> GridSample {
        let grid = FftGrid::new(n1, 2, 2);
        let mut sample = GridSample::new(LENGTH, grid, vspin).unwrap();
        let n_atoms: usize = centers.len() + (background > 0.0) as usize;
        let mut rhoatom: Array4<f64> = Array4::zeros((n_atoms, n1, 2, 2));
        let mut rhoatom_grad: Array5<f64> = Array5::zeros((n_atoms, 3, n1, 2, 2));
        for (atom, center) in centers.iter().enumerate() {
            for i in 0..n1 {
                let x: f64 = i as f64 * LENGTH / n1 as f64;
                // minimum image
                let dx: f64 = x - center - LENGTH * ((x - center) / LENGTH).round();
                let rho: f64 = (-(dx / SIGMA).powi(2)).exp();
                rhoatom.slice_mut(s![atom, i, .., ..]).fill(rho);
                rhoatom_grad
                    .slice_mut(s![atom, 0, i, .., ..])
                    .fill(-2.0 * dx / SIGMA.powi(2) * rho);
            }
        }
        if background > 0.0 {
            rhoatom.index_axis_mut(Axis(0), n_atoms - 1).fill(background);
        }
        sample
            .set_atomic_densities(rhoatom, rhoatom_grad)
            .unwrap();
        sample
            .set_rho_r(Array4::from_elem(grid.spin_shape(vspin), 1.0))
            .unwrap();
        sample
    }

    fn constraint(
        sample: &GridSample,
        donor: Vec<usize>,
        acceptor: Vec<usize>,
        eps: f64,
    ) -> ChargeTransferConstraint {
        ChargeTransferConstraint::new(
            AtomFragment::new(sample, donor).unwrap(),
            AtomFragment::new(sample, acceptor).unwrap(),
            Multiplier::new(0.0, 0.5, (-1.0, 1.0), 1.0e-3),
            eps,
        )
    }

    #[test]
    fn weight_is_antisymmetric_under_donor_acceptor_swap() {
        let sample = gaussian_sample(&[5.0, 11.0], 0.1, 1, 32);
        let mut ct = constraint(&sample, vec![0], vec![1], 1.0e-6);
        let mut tc = constraint(&sample, vec![1], vec![0], 1.0e-6);
        ct.update_weight(&sample).unwrap();
        tc.update_weight(&sample).unwrap();
        let w: Array4<f64> = ct.weight().get().unwrap().to_owned();
        let w_swapped: Array4<f64> = tc.weight().get().unwrap().to_owned();

        assert!(w.iter().any(|val| val.abs() > 0.5));
        assert!(w.abs_diff_eq(&(-&w_swapped), EPSILON));
    }

    #[test]
    fn weight_is_bounded_and_masked() {
        // no background: far away from both atoms the projected density vanishes
        let eps: f64 = 1.0e-6;
        let sample = gaussian_sample(&[5.0, 7.0], 0.0, 1, 64);
        let mut ct = constraint(&sample, vec![0], vec![1], eps);
        ct.update_weight(&sample).unwrap();
        let w: ArrayView4<f64> = ct.weight().get().unwrap();
        let rho_tot: ArrayView3<f64> = sample.rhopro_tot_r();

        let n_masked: usize = rho_tot.iter().filter(|val| **val < eps).count();
        assert!(n_masked > 0);
        for ((_, i, j, k), val) in w.indexed_iter() {
            if rho_tot[[i, j, k]] < eps {
                assert_eq!(*val, 0.0);
            } else {
                assert!(val.abs() <= 1.0);
            }
        }

        for atom in 0..2 {
            let w_grad: Array5<f64> = ct.compute_weight_gradient(&sample, atom).unwrap();
            for ((_, _, i, j, k), val) in w_grad.indexed_iter() {
                if rho_tot[[i, j, k]] < eps {
                    assert_eq!(*val, 0.0);
                }
            }
        }
    }

    #[test]
    fn weight_is_shared_by_both_spin_channels() {
        let sample = gaussian_sample(&[5.0, 11.0], 0.1, 2, 16);
        let mut ct = constraint(&sample, vec![0], vec![1], 1.0e-6);
        ct.update_weight(&sample).unwrap();
        let w: ArrayView4<f64> = ct.weight().get().unwrap();
        assert_eq!(w.shape(), &[2, 16, 2, 2]);
        assert_eq!(w.index_axis(Axis(0), 0), w.index_axis(Axis(0), 1));

        let w_grad: Array5<f64> = ct.compute_weight_gradient(&sample, 0).unwrap();
        assert_eq!(w_grad.shape(), &[3, 2, 16, 2, 2]);
    }

    #[test]
    fn gradient_of_a_spectator_atom_has_no_delta_term() {
        let sample = gaussian_sample(&[4.0, 12.0, 8.0], 0.1, 1, 32);
        let mut ct = constraint(&sample, vec![0], vec![1], 1.0e-6);
        ct.update_weight(&sample).unwrap();
        let w: ArrayView4<f64> = ct.weight().get().unwrap();
        let rho_grad: Array4<f64> = sample.compute_rhoatom_grad_r(2);
        let rho_tot: ArrayView3<f64> = sample.rhopro_tot_r();

        let w_grad: Array5<f64> = ct.compute_weight_gradient(&sample, 2).unwrap();
        let reference: Array3<f64> =
            -&w.index_axis(Axis(0), 0) * &rho_grad.index_axis(Axis(0), 0) / &rho_tot;
        assert!(w_grad
            .slice(s![0, 0, .., .., ..])
            .abs_diff_eq(&reference, EPSILON));
        // the densities only vary along x
        assert!(w_grad.slice(s![1.., .., .., .., ..]).iter().all(|val| *val == 0.0));
    }

    #[test]
    fn stale_weight_is_rejected() {
        let sample = gaussian_sample(&[5.0, 11.0], 0.1, 1, 16);
        let mut ct = constraint(&sample, vec![0], vec![1], 1.0e-6);
        assert_eq!(
            ct.compute_weight_gradient(&sample, 0).unwrap_err(),
            ConstraintError::StaleWeight
        );
        assert_eq!(
            ct.compute_force(&sample).unwrap_err(),
            ConstraintError::StaleWeight
        );

        ct.update_weight(&sample).unwrap();
        assert!(ct.compute_force(&sample).is_ok());

        ct.update_fragments(&sample);
        assert!(!ct.weight().is_fresh());
        assert_eq!(
            ct.compute_n(&sample).unwrap_err(),
            ConstraintError::StaleWeight
        );
    }

    #[test]
    fn weight_of_another_grid_is_rejected() {
        let sample = gaussian_sample(&[5.0, 11.0], 0.1, 1, 16);
        let other = gaussian_sample(&[5.0, 11.0], 0.1, 2, 16);
        let mut ct = constraint(&sample, vec![0], vec![1], 1.0e-6);
        ct.update_weight(&sample).unwrap();
        assert!(matches!(
            ct.compute_force(&other),
            Err(ConstraintError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn electron_number_and_convergence() {
        let sample = gaussian_sample(&[5.0, 11.0], 0.1, 1, 32);
        let mut ct = constraint(&sample, vec![0], vec![1], 1.0e-6);
        ct.update_weight(&sample).unwrap();
        assert!(!ct.is_converged());

        // rho = 1 and the weight is odd with respect to the center of the cell
        let n: f64 = ct.compute_n(&sample).unwrap();
        assert!(n.abs() < 1.0e-10);
        assert!(ct.is_converged());
        assert!(ct.free_energy().unwrap().abs() < 1.0e-10);

        let potential: Array4<f64> = ct.potential(&sample).unwrap();
        let w: ArrayView4<f64> = ct.weight().get().unwrap();
        assert!(potential.abs_diff_eq(&(0.5 * &w), EPSILON));
    }

    #[test]
    fn constraint_forces_sum_to_zero() {
        let sample = gaussian_sample(&[5.0, 11.0, 8.0], 1.0, 1, 64);
        let mut ct = constraint(&sample, vec![0], vec![1], 1.0e-6);
        ct.update_weight(&sample).unwrap();
        let forces: Array2<f64> = ct.compute_force(&sample).unwrap();

        assert_eq!(forces.shape(), &[4, 3]);
        assert!(forces[[0, 0]] > 1.0e-3);
        assert!(forces[[2, 0]] < -1.0e-3);
        let net: Array1<f64> = forces.sum_axis(Axis(0));
        assert!(
            net.iter().all(|val| val.abs() < 1.0e-9),
            "net force: {}",
            net
        );
    }

    #[test]
    fn force_is_the_density_weighted_weight_gradient() {
        let sample = gaussian_sample(&[5.0, 11.0, 8.0], 1.0, 1, 64);
        let mut ct = constraint(&sample, vec![0], vec![1], 1.0e-6);
        ct.update_weight(&sample).unwrap();
        let forces: Array2<f64> = ct.compute_force(&sample).unwrap();

        // F = V * omega / n123 * sum(rho * grad_w) with V = 0.5 and rho = 1
        let dv: f64 = LENGTH / sample.grid().n123() as f64;
        for atom in [0, 2] {
            let w_grad: Array5<f64> = ct.compute_weight_gradient(&sample, atom).unwrap();
            let expected: f64 = 0.5 * dv * w_grad.slice(s![0, .., .., .., ..]).sum();
            assert!(expected.abs() > 1.0e-3);
            assert!(forces[[atom, 0]].abs_diff_eq(&expected, 1.0e-12));
        }
    }

    #[test]
    fn changing_eps_invalidates_the_weight() {
        let sample = gaussian_sample(&[5.0, 7.0], 0.0, 1, 64);
        let mut ct = constraint(&sample, vec![0], vec![1], 1.0e-6);
        ct.update_weight(&sample).unwrap();
        assert!(ct.weight().is_fresh());

        ct.set_eps(1.0e-2);
        assert_eq!(ct.eps(), 1.0e-2);
        assert!(!ct.weight().is_fresh());
        assert_eq!(
            ct.compute_weight_gradient(&sample, 0).unwrap_err(),
            ConstraintError::StaleWeight
        );

        // weight and gradient share the new mask
        ct.update_weight(&sample).unwrap();
        let rho_tot: ArrayView3<f64> = sample.rhopro_tot_r();
        let w: ArrayView4<f64> = ct.weight().get().unwrap();
        let w_grad: Array5<f64> = ct.compute_weight_gradient(&sample, 0).unwrap();
        for ((i, j, k), tot) in rho_tot.indexed_iter() {
            if *tot < 1.0e-2 {
                assert_eq!(w[[0, i, j, k]], 0.0);
                assert_eq!(w_grad[[0, 0, i, j, k]], 0.0);
            }
        }
    }
}
