//! Constrained density functional theory: charge transfer constraints between a donor and
//! an acceptor fragment, their forces, and the electronic coupling between two diabatic
//! states obtained from constrained calculations.
pub mod constants;
pub mod constraint;
pub mod coupling;
pub mod defaults;
pub mod grid;
pub mod initialization;
pub mod io;
pub mod utils;
