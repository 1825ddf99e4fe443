use crate::initialization::{Sample, StateError};
use ndarray::prelude::*;

/// A group of atoms (e.g. the donor or the acceptor) and its projected density.
pub trait Fragment {
    fn atoms(&self) -> &[usize];
    /// Projected density of the fragment on the density grid.
    fn rhopro_r(&self) -> ArrayView3<f64>;

    fn contains(&self, atom: usize) -> bool {
        self.atoms().contains(&atom)
    }
}

/// Fragment whose projected density is the sum of the projected densities of its atoms.
#[derive(Debug, Clone)]
pub struct AtomFragment {
    atoms: Vec<usize>,
    rhopro_r: Array3<f64>,
}

impl AtomFragment {
    pub fn new<S: Sample>(sample: &S, atoms: Vec<usize>) -> Result<Self, StateError> {
        if atoms.is_empty() {
            return Err(StateError::EmptyFragment);
        }
        let n_atoms: usize = sample.n_atoms();
        if let Some(atom) = atoms.iter().find(|atom| **atom >= n_atoms) {
            return Err(StateError::AtomOutOfRange {
                atom: *atom,
                n_atoms,
            });
        }
        let mut fragment = Self {
            atoms,
            rhopro_r: Array3::zeros(sample.grid().shape()),
        };
        fragment.update_rhopro(sample);
        Ok(fragment)
    }

    /// Rebuilds the projected density after the atomic densities of the sample changed.
    pub fn update_rhopro<S: Sample>(&mut self, sample: &S) {
        let mut rhopro: Array3<f64> = Array3::zeros(sample.grid().shape());
        for atom in self.atoms.iter() {
            rhopro += &sample.rhoatom_r(*atom);
        }
        self.rhopro_r = rhopro;
    }
}

impl Fragment for AtomFragment {
    fn atoms(&self) -> &[usize] {
        &self.atoms
    }

    fn rhopro_r(&self) -> ArrayView3<f64> {
        self.rhopro_r.view()
    }
}
