//! Probe command implementation

use mercflash_core::flash;
use mercflash_core::programmer::GpioTransport;

/// Identify the flash chip behind `transport`
pub fn run_probe(transport: &mut dyn GpioTransport) -> Result<(), Box<dyn std::error::Error>> {
    let chip = flash::probe(transport)?;

    println!("Found flash chip:");
    println!("  Name:    {}", chip);
    println!(
        "  Size:    {} bytes ({} KiB)",
        chip.total_size(),
        chip.total_size() / 1024
    );
    println!(
        "  Pages:   {} x {} bytes",
        chip.page_count(),
        flash::PAGE_SIZE
    );
    println!("  Sectors: {}", chip.sector_count());
    println!("  ID:      {:04X}", chip.device_id());
    Ok(())
}

#[cfg(all(test, feature = "dummy"))]
mod tests {
    use super::*;
    use mercflash_core::error::Error;
    use mercflash_dummy::{DummyConfig, DummyMercury};

    #[test]
    fn test_probe_known_chip() {
        let mut board = DummyMercury::new(DummyConfig::default());
        assert!(run_probe(&mut board).is_ok());
    }

    #[test]
    fn test_probe_returns_the_identify_error() {
        let mut board = DummyMercury::new(DummyConfig {
            id: [0xFF; 4],
            ..DummyConfig::default()
        });
        let err = run_probe(&mut board).unwrap_err();
        assert!(matches!(err.downcast_ref::<Error>(), Some(Error::UnsupportedDevice { .. })));
    }
}
