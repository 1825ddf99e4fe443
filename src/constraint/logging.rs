use crate::constraint::Multiplier;
use log::{debug, info};
use ndarray::ArrayView2;

pub fn print_constraint_init(kind: &str, n_tol: f64, eps: f64) {
    info!(
        "Constraint: type = {}, N_tol = {:.5}, eps = {:.2E}",
        kind, n_tol, eps
    );
}

pub fn print_constraint_status(kind: &str, multiplier: &Multiplier) {
    info!("{: <25} {}", "constraint:", kind);
    info!("{: <25} {:>18.10}", "multiplier V:", multiplier.v);
    info!("{: <25} {:>18.10}", "target N0:", multiplier.n0);
    if let Some(n) = multiplier.n {
        info!("{: <25} {:>18.10}", "electron number N:", n);
        info!("{: <25} {:>18.10e}", "N - N0:", n - multiplier.n0);
    }
}

pub fn print_forces(forces: ArrayView2<f64>) {
    info!("{:^80}", "");
    info!("{: <45} ", "Constraint forces: all quantities are in atomic units");
    info!("{:-^62} ", "");
    info!(
        "{: <5} {: >18} {: >18} {: >18}",
        "Atom", "F_x", "F_y", "F_z"
    );
    info!("{:-^62} ", "");
    for (idx, f) in forces.outer_iter().enumerate() {
        info!(
            "{: >5} {:>18.10e} {:>18.10e} {:>18.10e}",
            idx + 1,
            f[0],
            f[1],
            f[2]
        );
    }
    info!("{:-^62} ", "");
    debug!(
        "net constraint force: {:?}",
        forces.sum_axis(ndarray::Axis(0)).to_vec()
    );
}
