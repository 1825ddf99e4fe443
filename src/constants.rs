// CODATA 2018
pub const HARTREE_TO_EV: f64 = 27.211386245988;
pub const HARTREE_TO_MILLIHARTREE: f64 = 1000.0;
