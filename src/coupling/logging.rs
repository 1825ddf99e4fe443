use crate::coupling::ElectronicCoupling;
use crate::initialization::Wavefunction;
use log::{debug, info};
use ndarray::prelude::*;
use ndarray_linalg::c64;

pub fn print_coupling_init<W: Wavefunction>(wfc: &W) {
    info!(
        "{: <25} nspin: {}, nkpt: {}, nbnd: {:?}, norb: {}",
        "diabatic states:",
        wfc.nspin(),
        wfc.nkpt(),
        wfc.nbnd().iter().collect::<Vec<_>>(),
        wfc.norb()
    );
    info!("{: <25} {}", "wavefunction grid:", wfc.wgrid());
}

fn print_matrix(name: &str, matrix: ArrayView2<c64>) {
    debug!("{}:", name);
    for row in matrix.outer_iter() {
        let line: String = row
            .iter()
            .map(|z| format!("{:>14.8} {:>+14.8}i", z.re, z.im))
            .collect::<Vec<String>>()
            .join("  ");
        debug!("{}", line);
    }
}

pub fn print_matrices(coupling: &ElectronicCoupling) {
    print_matrix("O matrix", coupling.o.view());
    debug!("|O|: {:.10}", coupling.odet);
    print_matrix("S matrix", coupling.s.view());
    print_matrix("W matrix", coupling.w.view());
    print_matrix("Cofactor matrix", coupling.c.view());
    print_matrix("H matrix", coupling.h.view());
    print_matrix("H ortho. Lowdin", coupling.hsymm.view());
}

pub fn print_hab(coupling: &ElectronicCoupling) {
    info!("{:~^80}", " Electronic Coupling ");
    info!("{: <25} {:>18.10e}", "|Hab| (H):", coupling.hab);
    info!("{: <25} {:>18.10e}", "|Hab| (mH):", coupling.hab_millihartree());
    info!("{: <25} {:>18.10e}", "|Hab| (eV):", coupling.hab_ev());
}
