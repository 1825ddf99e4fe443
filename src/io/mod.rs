mod imprint;
mod input;
pub(crate) mod settings;
mod state;

pub use imprint::{write_footer, write_header};
pub use input::*;
pub use settings::{Configuration, ConstraintConfig, CouplingConfig, StatesConfig};
pub use state::{load_force_state, load_state, StateInfo};
