//! Programmer registration and dispatch
//!
//! This module provides a centralized registry for all programmers, with support
//! for feature-gated inclusion and dynamic help text generation.

use mercflash_core::programmer::GpioTransport;
use thiserror::Error;

/// Programmer used when `--programmer` is not given
#[cfg(feature = "ftdi")]
pub const DEFAULT_PROGRAMMER: &str = "ftdi";
#[cfg(not(feature = "ftdi"))]
pub const DEFAULT_PROGRAMMER: &str = "dummy";

/// Information about a programmer
pub struct ProgrammerInfo {
    /// Primary name (used for matching)
    pub name: &'static str,
    /// Alternative names/aliases
    pub aliases: &'static [&'static str],
    /// Short description
    pub description: &'static str,
}

/// Errors raised while selecting and configuring a programmer
#[derive(Debug, Error)]
pub enum ProgrammerError {
    #[error("Unknown programmer: {name}\n\n{help}\nUse 'mercflash list-programmers' for more details")]
    Unknown { name: String, help: String },

    #[error("{programmer}: invalid option {key}={value} ({reason})")]
    InvalidOption {
        programmer: &'static str,
        key: String,
        value: String,
        reason: String,
    },
}

/// Get information about all available programmers (enabled at compile time)
#[allow(unused_mut, clippy::vec_init_then_push)]
pub fn available_programmers() -> Vec<ProgrammerInfo> {
    let mut programmers = Vec::new();

    #[cfg(feature = "ftdi")]
    programmers.push(ProgrammerInfo {
        name: "ftdi",
        aliases: &["ft232r", "mercury"],
        description: "Mercury board FT232R in bit-bang mode (baud=<N>,interface=<A-D>,vid=,pid=,description=)",
    });

    #[cfg(feature = "dummy")]
    programmers.push(ProgrammerInfo {
        name: "dummy",
        aliases: &[],
        description: "Emulated Mercury board (chip=<at45db021|at45db081>,busy=<N>,fill=<hex>)",
    });

    programmers
}

/// Generate help text listing all available programmers
pub fn programmer_help() -> String {
    let programmers = available_programmers();

    if programmers.is_empty() {
        return "No programmers available (recompile with programmer features enabled)".to_string();
    }

    let mut help = String::from("Available programmers:\n");
    for p in &programmers {
        help.push_str(&format!("  {:8} - {}\n", p.name, p.description));
    }
    help
}

/// Generate a short list of programmer names for CLI help
pub fn programmer_names_short() -> String {
    let programmers = available_programmers();
    let names: Vec<&str> = programmers.iter().map(|p| p.name).collect();
    names.join(", ")
}

/// Resolve a programmer name or alias to its primary name
pub fn find_programmer(name: &str) -> Option<&'static str> {
    available_programmers()
        .into_iter()
        .find(|p| p.name == name || p.aliases.contains(&name))
        .map(|p| p.name)
}

/// Parse a programmer string into name and options
///
/// Format: "name" or "name:option1=value1,option2=value2"
pub fn parse_programmer_string(s: &str) -> (&str, Vec<(&str, &str)>) {
    if let Some((name, opts)) = s.split_once(':') {
        let options: Vec<_> = opts
            .split(',')
            .filter_map(|opt| opt.split_once('='))
            .collect();
        (name, options)
    } else {
        (s, Vec::new())
    }
}

/// Open the programmer named by `programmer` and run `f` with its transport
///
/// The programmer string can be just the name (e.g., "ftdi") or include
/// parameters (e.g., "ftdi:baud=1000000"). The transport is closed when `f`
/// returns.
#[allow(unused_variables)]
pub fn with_transport<F>(programmer: &str, f: F) -> Result<(), Box<dyn std::error::Error>>
where
    F: FnOnce(&mut dyn GpioTransport) -> Result<(), Box<dyn std::error::Error>>,
{
    let (name, options) = parse_programmer_string(programmer);

    let canonical_name = match find_programmer(name) {
        Some(n) => n,
        None => return Err(unknown_programmer_error(name).into()),
    };
    log::debug!("Using programmer {} with {} option(s)", canonical_name, options.len());

    match canonical_name {
        #[cfg(feature = "ftdi")]
        "ftdi" => {
            let config = mercflash_ftdi::parse_options(&options)?;
            let mut board = mercflash_ftdi::MercuryFtdi::open(&config).map_err(|e| {
                format!(
                    "Failed to open the Mercury board: {}\nMake sure it is connected and you have permissions.",
                    e
                )
            })?;
            f(&mut board)
        }

        #[cfg(feature = "dummy")]
        "dummy" => {
            let config = dummy_config(&options)?;
            log::info!("Emulating a Mercury board with an {}", config.chip);
            let mut board = mercflash_dummy::DummyMercury::new(config);
            f(&mut board)
        }

        _ => Err(unknown_programmer_error(name).into()),
    }
}

fn unknown_programmer_error(name: &str) -> ProgrammerError {
    ProgrammerError::Unknown {
        name: name.to_string(),
        help: programmer_help(),
    }
}

/// Build the emulated board configuration from programmer options
#[cfg(feature = "dummy")]
fn dummy_config(options: &[(&str, &str)]) -> Result<mercflash_dummy::DummyConfig, ProgrammerError> {
    use mercflash_core::chip::ChipModel;
    use mercflash_dummy::{default_id, DummyConfig};

    let invalid = |key: &str, value: &str, reason: &str| ProgrammerError::InvalidOption {
        programmer: "dummy",
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    };

    let mut config = DummyConfig::default();
    for &(key, value) in options {
        match key {
            "chip" => {
                let chip = ChipModel::ALL
                    .into_iter()
                    .find(|c| {
                        let name = c.name();
                        name.eq_ignore_ascii_case(value)
                            || (value.len() == 3 && name.ends_with(value))
                    })
                    .ok_or_else(|| invalid(key, value, "expected at45db021 or at45db081"))?;
                config.chip = chip;
                config.id = default_id(chip);
            }
            "busy" => {
                let polls: u32 = value
                    .parse()
                    .map_err(|_| invalid(key, value, "expected a poll count"))?;
                config.erase_busy_polls = polls;
                config.program_busy_polls = polls;
            }
            "fill" => {
                let digits = value.strip_prefix("0x").unwrap_or(value);
                config.initial_fill = u8::from_str_radix(digits, 16)
                    .map_err(|_| invalid(key, value, "expected a hex byte"))?;
            }
            _ => log::warn!("dummy: Unknown option: {}={}", key, value),
        }
    }
    Ok(config)
}
