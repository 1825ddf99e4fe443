mod fourier;

pub use fourier::FourierInterpolation;

use ndarray::prelude::*;
use serde::{Deserialize, Serialize};
use std::error;
use std::fmt;

/// Dimensions of a uniform real-space grid spanning the simulation cell.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct FftGrid {
    pub n1: usize,
    pub n2: usize,
    pub n3: usize,
}

impl FftGrid {
    pub fn new(n1: usize, n2: usize, n3: usize) -> Self {
        Self { n1, n2, n3 }
    }

    /// Total number of grid points.
    pub fn n123(&self) -> usize {
        self.n1 * self.n2 * self.n3
    }

    pub fn shape(&self) -> [usize; 3] {
        [self.n1, self.n2, self.n3]
    }

    /// Shape of a spin resolved field on this grid.
    pub fn spin_shape(&self, vspin: usize) -> [usize; 4] {
        [vspin, self.n1, self.n2, self.n3]
    }
}

impl fmt::Display for FftGrid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} x {} x {}", self.n1, self.n2, self.n3)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GridError {
    /// The field does not live on the grid it was declared on.
    ShapeMismatch {
        expected: [usize; 3],
        found: Vec<usize>,
    },
    EmptyGrid(FftGrid),
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GridError::ShapeMismatch { expected, found } => write!(
                f,
                "field of shape {:?} does not match the source grid {:?}",
                found, expected
            ),
            GridError::EmptyGrid(grid) => write!(f, "grid {} has no points", grid),
        }
    }
}

impl error::Error for GridError {}

/// Maps a real scalar field between two real-space grids of the same cell.
pub trait GridTransform {
    fn resample(
        &self,
        field: ArrayView3<f64>,
        source: &FftGrid,
        dest: &FftGrid,
    ) -> Result<Array3<f64>, GridError>;
}
