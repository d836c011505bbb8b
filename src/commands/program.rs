//! Program command implementation

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use mercflash_core::flash::{ProgramOptions, ProgramSession, ReaderPages, MAX_IMAGE_SIZE};
use mercflash_core::programmer::{BitbangStream, GpioTransport};

use super::IndicatifProgress;

/// Erase the chip and program the bitstream in `input` from page 0
pub fn run_program(
    transport: &mut dyn GpioTransport,
    input: &Path,
    options: ProgramOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let file = File::open(input)
        .map_err(|e| format!("Failed to open {}: {}", input.display(), e))?;
    let len = file.metadata()?.len() as usize;

    log::info!("Programming {} ({} bytes)", input.display(), len);
    if len > MAX_IMAGE_SIZE {
        log::warn!(
            "{} is larger than the {} bytes that can be programmed",
            input.display(),
            MAX_IMAGE_SIZE
        );
    }

    let mut source = ReaderPages::with_len(BufReader::new(file), len);
    let mut stream = BitbangStream::new();
    let mut progress = IndicatifProgress::new();

    ProgramSession::new(transport, &mut stream, options).run(&mut source, &mut progress)?;
    Ok(())
}
