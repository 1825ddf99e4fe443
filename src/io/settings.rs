use crate::defaults::*;
use serde::{Deserialize, Serialize};

fn default_jobtype() -> String {
    String::from(JOBTYPE)
}
fn default_verbose() -> i8 {
    0
}
fn default_eps() -> f64 {
    WEIGHT_EPS
}
fn default_n0() -> f64 {
    N0
}
fn default_v_init() -> f64 {
    V_INIT
}
fn default_v_brak() -> (f64, f64) {
    V_BRAK
}
fn default_n_tol() -> f64 {
    N_TOL
}
fn default_donor() -> Vec<usize> {
    vec![0]
}
fn default_acceptor() -> Vec<usize> {
    vec![1]
}
fn default_close_dft_driver() -> bool {
    CLOSE_DFT_DRIVER
}
fn default_max_condition_number() -> f64 {
    MAX_CONDITION_NUMBER
}
fn default_state1() -> String {
    String::from("state1")
}
fn default_state2() -> String {
    String::from("state2")
}
fn default_constraint_config() -> ConstraintConfig {
    let config: ConstraintConfig = toml::from_str("").unwrap();
    config
}
fn default_coupling_config() -> CouplingConfig {
    let config: CouplingConfig = toml::from_str("").unwrap();
    config
}
fn default_states_config() -> StatesConfig {
    let config: StatesConfig = toml::from_str("").unwrap();
    config
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Configuration {
    #[serde(default = "default_jobtype")]
    pub jobtype: String,
    #[serde(default = "default_verbose")]
    pub verbose: i8,
    #[serde(default = "default_constraint_config")]
    pub constraint: ConstraintConfig,
    #[serde(default = "default_coupling_config")]
    pub coupling: CouplingConfig,
    #[serde(default = "default_states_config")]
    pub states: StatesConfig,
}

/// Charge transfer constraint between the donor and the acceptor atoms (0-based indices).
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ConstraintConfig {
    #[serde(default = "default_eps")]
    pub eps: f64,
    #[serde(default = "default_n0")]
    pub n0: f64,
    #[serde(default = "default_v_init")]
    pub v: f64,
    #[serde(default = "default_v_brak")]
    pub v_brak: (f64, f64),
    #[serde(default = "default_n_tol")]
    pub n_tol: f64,
    #[serde(default = "default_donor")]
    pub donor: Vec<usize>,
    #[serde(default = "default_acceptor")]
    pub acceptor: Vec<usize>,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug)]
pub struct CouplingConfig {
    #[serde(default = "default_close_dft_driver")]
    pub close_dft_driver: bool,
    #[serde(default = "default_max_condition_number")]
    pub max_condition_number: f64,
}

/// Directories that hold the two converged diabatic states.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct StatesConfig {
    #[serde(default = "default_state1")]
    pub state1: String,
    #[serde(default = "default_state2")]
    pub state2: String,
}
