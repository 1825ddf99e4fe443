use crate::utils::Timer;
use clap::{crate_name, crate_version};
use log::warn;

const LOG_WIDTH: usize = 80;

pub fn write_header() {
    warn!("{: ^LOG_WIDTH$}", "-----------------");
    warn!("{: ^LOG_WIDTH$}", crate_name!().to_uppercase());
    warn!("{: ^LOG_WIDTH$}", "-----------------");
    warn!("{: ^LOG_WIDTH$}", format!("version: {}", crate_version!()));
    warn!("{: ^LOG_WIDTH$}", "");
    warn!("{: ^LOG_WIDTH$}", format!("{::^55}", ""));
    warn!(
        "{: ^LOG_WIDTH$}",
        "::        Constrained density functional theory      ::"
    );
    warn!(
        "{: ^LOG_WIDTH$}",
        "::   charge transfer constraints and diabatic Hab    ::"
    );
    warn!("{: ^LOG_WIDTH$}", format!("{::^55}", ""));
    warn!("{: ^LOG_WIDTH$}", "");
}

pub fn write_footer(timer: Timer) {
    warn!(
        "{:>68} {:>8.2} s",
        "total elapsed time:",
        timer.time.elapsed().as_secs_f32()
    );
    warn!("{: ^LOG_WIDTH$}", "");
    warn!("{: ^LOG_WIDTH$}", "::::::::::::::::::::::::::::::::::::::");
    warn!(
        "{: ^LOG_WIDTH$}",
        format!(
            "::   Thank you for using {}    ::",
            crate_name!().to_uppercase()
        )
    );
    warn!("{: ^LOG_WIDTH$}", "::::::::::::::::::::::::::::::::::::::");
    warn!("{: ^LOG_WIDTH$}", "");
}
