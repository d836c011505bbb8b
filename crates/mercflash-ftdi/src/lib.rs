//! mercflash-ftdi - FT232R bit-bang transport for the Mercury board
//!
//! The Mercury board connects its FPGA and configuration flash to the data
//! bus of an FTDI FT232R. This crate drives that bus in asynchronous
//! bit-bang mode and implements [`GpioTransport`](mercflash_core::programmer::GpioTransport)
//! on top of it.
//!
//! # Example
//!
//! ```ignore
//! use mercflash_ftdi::{MercuryFtdi, FtdiConfig};
//! use mercflash_core::flash::probe;
//!
//! let mut board = MercuryFtdi::open(&FtdiConfig::default())?;
//! println!("Found {}", probe(&mut board)?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Programmer Options
//!
//! When using the CLI, the following options are available:
//!
//! - `baud=<N>` - Bit-bang clock rate (default: 3000000)
//! - `interface=<A|B|C|D>` - Channel to use (default: A)
//! - `vid=<hex>` / `pid=<hex>` - USB IDs (default: 0403:6001)
//! - `description=<text>` - Required USB product string (default: `Mercury FPGA`,
//!   empty or `*` accepts any device)
//!
//! # Pin Assignment
//!
//! | Bit | Signal |
//! |-----|--------|
//! | D0  | CSN0 (FPGA select) |
//! | D1  | CSN1 (flash select) |
//! | D2  | SCLK |
//! | D3  | MISO |
//! | D4  | MOSI |
//! | D5  | PROG (driven only while the FPGA is held) |
//!
//! The USB device itself is only opened with the `libftdi` feature, which
//! needs libftdi1 installed; option parsing is always available.

mod config;
#[cfg(feature = "libftdi")]
mod device;
mod error;

pub use config::{
    parse_options, FtdiConfig, FtdiInterface, DEFAULT_BAUD_RATE, FTDI_FT232R_PID, FTDI_VID,
    MERCURY_DESCRIPTION,
};
#[cfg(feature = "libftdi")]
pub use device::MercuryFtdi;
pub use error::{FtdiError, Result};
