//! mercflash - configuration flash programmer for the Mercury FPGA board
//!
//! The Mercury board connects an FPGA and its AT45DB DataFlash to the data
//! bus of an FTDI FT232R. mercflash drives that bus in bit-bang mode, holds
//! the FPGA off the shared SPI lines while it talks to the flash, erases the
//! whole chip and writes a bitstream into it page by page.
//!
//! # Architecture
//!
//! - `mercflash-core` turns bytes into pin vectors and runs the DataFlash
//!   command protocol and the erase-then-program state machine
//! - transport crates (`mercflash-ftdi`, `mercflash-dummy`) only move pin
//!   states, behind the `GpioTransport` trait
//! - this binary selects a transport from a programmer string and reports
//!   progress

mod cli;
mod commands;
mod programmers;

use clap::Parser;
use cli::{Cli, Commands};
use mercflash_core::flash::ProgramOptions;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logger; RUST_LOG still overrides the verbosity flags
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(log_filter(cli.verbose)),
    )
    .init();

    let options = ProgramOptions {
        poll_budget: cli.poll_budget,
    };
    log::debug!("Poll budget: {} status reads", options.poll_budget);

    let result = match cli.command {
        Commands::Probe { programmer } => {
            programmers::with_transport(&programmer, commands::run_probe)
        }
        Commands::Erase { programmer } => programmers::with_transport(&programmer, |t| {
            commands::run_erase(t, options)
        }),
        Commands::Program { programmer, input } => {
            programmers::with_transport(&programmer, |t| {
                commands::run_program(t, &input, options)
            })
        }
        Commands::ListProgrammers => {
            commands::list_programmers();
            Ok(())
        }
        Commands::ListChips => {
            commands::list_chips();
            Ok(())
        }
    };

    if let Err(e) = result {
        log::error!("{}", e);
        std::process::exit(1);
    }
    Ok(())
}

/// Default log filter for a `-v` count
fn log_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_log_filter_follows_verbosity() {
        assert_eq!(log_filter(0), "info");
        assert_eq!(log_filter(1), "debug");
        assert_eq!(log_filter(2), "trace");
        assert_eq!(log_filter(5), "trace");
    }

    #[test]
    fn test_verbose_flags_reach_the_filter() {
        let cli = Cli::try_parse_from(["mercflash", "-vv", "list-chips"]).unwrap();
        assert_eq!(log_filter(cli.verbose), "trace");
        let cli = Cli::try_parse_from(["mercflash", "probe", "-v"]).unwrap();
        assert_eq!(log_filter(cli.verbose), "debug");
    }

    #[test]
    fn test_filter_enables_debug_records() {
        let logger = env_logger::Builder::new()
            .parse_filters(log_filter(1))
            .build();
        let record = log::Metadata::builder()
            .level(log::Level::Debug)
            .target("mercflash")
            .build();
        assert!(log::Log::enabled(&logger, &record));
        let trace = log::Metadata::builder()
            .level(log::Level::Trace)
            .target("mercflash")
            .build();
        assert!(!log::Log::enabled(&logger, &trace));
    }
}
