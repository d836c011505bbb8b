//! Erase command implementation

use mercflash_core::flash::{ProgramOptions, ProgramSession};
use mercflash_core::programmer::{BitbangStream, GpioTransport};

use super::IndicatifProgress;

/// Identify the chip, then erase all of it
pub fn run_erase(
    transport: &mut dyn GpioTransport,
    options: ProgramOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut stream = BitbangStream::new();
    let mut session = ProgramSession::new(transport, &mut stream, options);
    let mut progress = IndicatifProgress::new();

    let chip = session.identify()?;
    println!("Found: {} ({} bytes)", chip, chip.total_size());

    let commands = session.erase(chip, &mut progress)?;
    progress.finish("Erase complete");

    println!(
        "Erased {} bytes with {} sector erase commands",
        chip.total_size(),
        commands
    );
    Ok(())
}
