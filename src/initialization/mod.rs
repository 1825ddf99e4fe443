//! The quantities of a (constrained) DFT calculation that the constraint and the coupling
//! are computed from. The SCF driver owns them; everything in this crate only reads them
//! through the [Sample], [Fragment] and [Wavefunction] traits.
pub use fragment::*;
pub use sample::*;
pub use wavefunction::*;

mod fragment;
mod sample;
mod wavefunction;

use std::error;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum StateError {
    ShapeMismatch {
        quantity: &'static str,
        expected: Vec<usize>,
        found: Vec<usize>,
    },
    InvalidSpin(usize),
    AtomOutOfRange { atom: usize, n_atoms: usize },
    EmptyFragment,
    BandCount { norb: usize, n_bands: usize },
}

impl StateError {
    pub(crate) fn shape(quantity: &'static str, expected: &[usize], found: &[usize]) -> Self {
        StateError::ShapeMismatch {
            quantity,
            expected: expected.to_vec(),
            found: found.to_vec(),
        }
    }
}

impl fmt::Display for StateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateError::ShapeMismatch {
                quantity,
                expected,
                found,
            } => write!(
                f,
                "{} has the shape {:?}, but {:?} was expected",
                quantity, found, expected
            ),
            StateError::InvalidSpin(vspin) => {
                write!(f, "{} spin channels are not possible, use 1 or 2", vspin)
            }
            StateError::AtomOutOfRange { atom, n_atoms } => {
                write!(f, "atom {} does not exist, the sample has {} atoms", atom, n_atoms)
            }
            StateError::EmptyFragment => write!(f, "a fragment needs at least one atom"),
            StateError::BandCount { norb, n_bands } => write!(
                f,
                "the wavefunction stores {} orbitals, but the band counts sum up to {}",
                norb, n_bands
            ),
        }
    }
}

impl error::Error for StateError {}
