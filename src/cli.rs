//! CLI argument parsing

use crate::programmers;
use clap::{Parser, Subcommand};
use mercflash_core::protocol::DEFAULT_POLL_BUDGET;
use std::path::PathBuf;

/// Parse a poll budget, rejecting zero
fn parse_poll_budget(s: &str) -> Result<u32, String> {
    match s.parse::<u32>() {
        Ok(0) => Err("Poll budget must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(format!("Invalid number: {}", e)),
    }
}

/// Generate dynamic help text for the programmer argument
fn programmer_help() -> String {
    format!(
        "Programmer to use, with options as name:key=value,... [available: {}]",
        programmers::programmer_names_short()
    )
}

#[derive(Parser)]
#[command(name = "mercflash")]
#[command(
    author,
    version,
    about = "Configuration flash programmer for the Mercury FPGA board",
    long_about = None
)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Status reads allowed per erase or page write before giving up
    #[arg(long, global = true, default_value_t = DEFAULT_POLL_BUDGET, value_parser = parse_poll_budget)]
    pub poll_budget: u32,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Identify the flash chip on the board
    Probe {
        #[arg(short, long, default_value = programmers::DEFAULT_PROGRAMMER, help = programmer_help())]
        programmer: String,
    },

    /// Erase the whole flash chip
    Erase {
        #[arg(short, long, default_value = programmers::DEFAULT_PROGRAMMER, help = programmer_help())]
        programmer: String,
    },

    /// Erase the flash chip and program a bitstream into it
    Program {
        #[arg(short, long, default_value = programmers::DEFAULT_PROGRAMMER, help = programmer_help())]
        programmer: String,

        /// Bitstream file to program, starting at page 0
        input: PathBuf,
    },

    /// List available programmers
    ListProgrammers,

    /// List supported flash chips
    ListChips,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poll_budget_defaults_to_core_value() {
        let cli = Cli::try_parse_from(["mercflash", "list-chips"]).unwrap();
        assert_eq!(cli.poll_budget, DEFAULT_POLL_BUDGET);
        assert_eq!(
            cli.poll_budget,
            mercflash_core::flash::ProgramOptions::default().poll_budget
        );
    }

    #[test]
    fn test_poll_budget_rejects_zero() {
        assert!(Cli::try_parse_from(["mercflash", "--poll-budget", "0", "list-chips"]).is_err());
        let cli = Cli::try_parse_from(["mercflash", "erase", "--poll-budget", "12"]).unwrap();
        assert_eq!(cli.poll_budget, 12);
    }
}
