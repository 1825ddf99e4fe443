// config file
pub const CONFIG_FILE_NAME: &str = "cdft.toml";
// jobtype
pub const JOBTYPE: &str = "coupling";
// file inside of every state directory that holds the scalar data of the state
pub const STATE_FILE_NAME: &str = "state.toml";

// CONSTRAINT
// the weight function and its gradient are set to zero wherever the total
// promolecular density drops below this value
pub const WEIGHT_EPS: f64 = 1.0e-6;
// convergence threshold for the constrained electron number
pub const N_TOL: f64 = 1.0e-3;
// initial value and bracket of the Lagrange multiplier
pub const V_INIT: f64 = 0.0;
pub const V_BRAK: (f64, f64) = (-1.0, 1.0);
// target electron number difference between donor and acceptor
pub const N0: f64 = 0.0;

// ELECTRONIC COUPLING
// the Loewdin orthogonalization is refused if the condition number of the
// diabatic overlap matrix exceeds this value
pub const MAX_CONDITION_NUMBER: f64 = 1.0e8;
// release the DFT drivers of both states once Hab is known
pub const CLOSE_DFT_DRIVER: bool = true;
