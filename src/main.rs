use anyhow::{Context, Result};
use cdft::constraint::logging::{print_constraint_status, print_forces};
use cdft::constraint::{ChargeTransferConstraint, Constraint, Multiplier};
use cdft::coupling::{compute_coupling, DiabaticState};
use cdft::defaults::CONFIG_FILE_NAME;
use cdft::grid::FourierInterpolation;
use cdft::initialization::AtomFragment;
use cdft::io::{load_force_state, load_state, read_config, write_footer, write_header, Configuration};
use cdft::utils::Timer;
use clap::{crate_name, crate_version, App, Arg};
use env_logger::Builder;
use log::{error, info, warn, LevelFilter};
use ndarray::Array2;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process;

fn main() {
    // Input.
    let matches = App::new(crate_name!())
        .version(crate_version!())
        .about("charge transfer constraints and electronic couplings from constrained DFT")
        .arg(
            Arg::new("config-File")
                .help("Sets the configuration file to use, default: cdft.toml")
                .required(false)
                .index(1),
        )
        .get_matches();
    let config_path: PathBuf = matches
        .value_of("config-File")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));
    let config: Configuration = match read_config(&config_path) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Error: {:?}", err);
            process::exit(1);
        }
    };

    // Logging.
    let log_level: LevelFilter = match config.verbose {
        2 => LevelFilter::Trace,
        1 => LevelFilter::Debug,
        0 => LevelFilter::Info,
        -1 => LevelFilter::Warn,
        -2 => LevelFilter::Error,
        _ => LevelFilter::Info,
    };
    Builder::new()
        .format(|buf, record| writeln!(buf, "{}", record.args()))
        .filter(None, log_level)
        .init();

    write_header();
    let timer: Timer = Timer::start();

    let result: Result<()> = match config.jobtype.as_str() {
        "coupling" => run_coupling(&config),
        "force" => run_force(&config),
        jtype => Err(anyhow::anyhow!(
            "Jobtype: {} is not available. Choose one of the available types: coupling, force",
            jtype
        )),
    };
    if let Err(err) = result {
        error!("Error: {:?}", err);
        process::exit(1);
    }

    write_footer(timer);
}

/// Electronic coupling between the two states of the configuration.
fn run_coupling(config: &Configuration) -> Result<()> {
    let (sample1, wfc1) = load_state(Path::new(&config.states.state1))
        .with_context(|| format!("Unable to load state {}", config.states.state1))?;
    let (sample2, wfc2) = load_state(Path::new(&config.states.state2))
        .with_context(|| format!("Unable to load state {}", config.states.state2))?;
    let mut state1 = DiabaticState::new(sample1, wfc1);
    let mut state2 = DiabaticState::new(sample2, wfc2);

    let hab: f64 = compute_coupling(
        &mut state1,
        &mut state2,
        config.coupling.close_dft_driver,
        &FourierInterpolation,
        config.coupling.max_condition_number,
    )?;
    info!("{: <25} {:>18.10e}", "coupling |Hab| (H):", hab);
    Ok(())
}

/// Charge transfer constraint of the first state: electron number and forces.
fn run_force(config: &Configuration) -> Result<()> {
    let (sample, state_v) = load_force_state(Path::new(&config.states.state1))
        .with_context(|| format!("Unable to load state {}", config.states.state1))?;

    let settings = &config.constraint;
    // the converged multiplier of the state takes precedence over the configuration
    let v: f64 = state_v.unwrap_or(settings.v);
    if v == 0.0 {
        warn!("the Lagrange multiplier V is zero, all constraint forces vanish");
    }
    let donor = AtomFragment::new(&sample, settings.donor.clone())?;
    let acceptor = AtomFragment::new(&sample, settings.acceptor.clone())?;
    let multiplier = Multiplier::new(settings.n0, v, settings.v_brak, settings.n_tol);
    let mut constraint = ChargeTransferConstraint::new(donor, acceptor, multiplier, settings.eps);

    constraint.update_weight(&sample)?;
    constraint.compute_n(&sample)?;
    print_constraint_status(constraint.kind(), constraint.multiplier());
    if !constraint.is_converged() {
        info!("the constraint is not converged for V = {}", v);
    }

    let forces: Array2<f64> = constraint.compute_force(&sample)?;
    print_forces(forces.view());
    Ok(())
}
