use crate::defaults::STATE_FILE_NAME;
use crate::grid::FftGrid;
use crate::initialization::{GridSample, GridWavefunction};
use anyhow::{bail, Context, Result};
use ndarray::prelude::*;
use ndarray::Zip;
use ndarray_linalg::c64;
use ndarray_npy::read_npy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Scalar data of a converged constrained state, stored as `state.toml`.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct StateInfo {
    pub omega: f64,
    pub ed: f64,
    pub ec: f64,
    pub vspin: usize,
    pub grid: FftGrid,
    pub wgrid: FftGrid,
    /// Number of bands per spin channel and k-point.
    pub nbnd: Vec<Vec<usize>>,
    /// Converged Lagrange multiplier of the constraint of this state.
    #[serde(default)]
    pub v: Option<f64>,
}

impl StateInfo {
    fn nbnd_array(&self) -> Result<Array2<usize>> {
        let nspin: usize = self.nbnd.len();
        let nkpt: usize = self.nbnd.first().map_or(0, |row| row.len());
        let flat: Vec<usize> = self.nbnd.iter().flatten().copied().collect();
        Array2::from_shape_vec((nspin, nkpt), flat)
            .context("nbnd must have the same number of k-points for every spin channel")
    }
}

fn read_array<T, D>(dir: &Path, name: &str) -> Result<Array<T, D>>
where
    T: ndarray_npy::ReadableElement,
    D: Dimension,
{
    let path = dir.join(format!("{}.npy", name));
    read_npy(&path).with_context(|| format!("Unable to read {}", path.display()))
}

fn read_state_info(dir: &Path) -> Result<StateInfo> {
    let info_path = dir.join(STATE_FILE_NAME);
    let info_string: String = fs::read_to_string(&info_path)
        .with_context(|| format!("Unable to read state file {}", info_path.display()))?;
    toml::from_str(&info_string)
        .with_context(|| format!("Unable to parse state file {}", info_path.display()))
}

fn read_sample(dir: &Path, info: &StateInfo) -> Result<GridSample> {
    let mut sample = GridSample::new(info.omega, info.grid, info.vspin)?;
    sample.set_energies(info.ed, info.ec);
    sample.set_vc_tot(read_array(dir, "vc_tot")?)?;
    if dir.join("rho_r.npy").exists() {
        sample.set_rho_r(read_array(dir, "rho_r")?)?;
    }
    if dir.join("rhoatom_r.npy").exists() {
        sample.set_atomic_densities(
            read_array(dir, "rhoatom_r")?,
            read_array(dir, "rhoatom_grad_r")?,
        )?;
    }
    Ok(sample)
}

/// Loads the sample needed for constraint forces together with the converged multiplier
/// `v` of `state.toml`, if it is stored there. The density `rho_r` and the atomic
/// densities have to be present, the orbitals are not read.
pub fn load_force_state(dir: &Path) -> Result<(GridSample, Option<f64>)> {
    for name in ["rho_r", "rhoatom_r", "rhoatom_grad_r"] {
        let path = dir.join(format!("{}.npy", name));
        if !path.exists() {
            bail!(
                "{} is missing, constraint forces need the densities of the state",
                path.display()
            );
        }
    }
    let info: StateInfo = read_state_info(dir)?;
    let sample: GridSample = read_sample(dir, &info)?;
    Ok((sample, info.v))
}

/// Loads the sample and the orbitals of one state directory. The densities `rho_r` and the
/// atomic densities (`rhoatom_r`, `rhoatom_grad_r`) are optional here.
pub fn load_state(dir: &Path) -> Result<(GridSample, GridWavefunction)> {
    let info: StateInfo = read_state_info(dir)?;
    let sample: GridSample = read_sample(dir, &info)?;

    let psi_re: Array4<f64> = read_array(dir, "psi_r")?;
    let wfc = if dir.join("psi_r_imag.npy").exists() {
        let psi_im: Array4<f64> = read_array(dir, "psi_r_imag")?;
        if psi_im.shape() != psi_re.shape() {
            bail!(
                "psi_r_imag has shape {:?} but psi_r has shape {:?}",
                psi_im.shape(),
                psi_re.shape()
            );
        }
        let mut psi: Array4<c64> = Array4::zeros(psi_re.raw_dim());
        Zip::from(&mut psi)
            .and(&psi_re)
            .and(&psi_im)
            .for_each(|psi, &re, &im| *psi = c64::new(re, im));
        GridWavefunction::new(info.wgrid, info.nbnd_array()?, psi)?
    } else {
        GridWavefunction::from_real(info.wgrid, info.nbnd_array()?, psi_re)?
    };
    Ok((sample, wfc))
}
