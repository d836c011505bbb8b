//! mercflash-core - Core library for programming the Mercury board's DataFlash
//!
//! The Mercury FPGA board exposes its configuration flash (an Atmel AT45DB
//! DataFlash) through an FTDI chip running in GPIO bit-bang mode. There is no
//! SPI peripheral on the path, so every SPI clock edge is a GPIO vector that
//! this crate computes and hands to a [`GpioTransport`](programmer::GpioTransport).
//!
//! The crate is layered bottom-up:
//!
//! - [`gpio`] - pin vectors and chip-select selectors
//! - [`programmer`] - the transport trait and the bit-level SPI encoder,
//!   decoder and bulk assembler
//! - [`spi`] - DataFlash opcodes and command/address encoding
//! - [`chip`] - the two supported device variants
//! - [`protocol`] - identify, erase, page write and the readiness poll
//! - [`flash`] - the programming state machine and image page sources
//!
//! It is `no_std` so the same engine can drive a bit-bang link from a
//! microcontroller.
//!
//! # Features
//!
//! - `std` - Enable standard library support (includes `alloc`), adds
//!   `std::error::Error` impls and an `io::Read` based page source
//! - `alloc` - Enable heap allocation
//!
//! # Example
//!
//! ```ignore
//! use mercflash_core::flash::{ProgramOptions, ProgramSession, SlicePages, NoProgress};
//! use mercflash_core::programmer::BitbangStream;
//!
//! fn program<T: GpioTransport>(transport: &mut T, image: &[u8]) {
//!     let mut stream = BitbangStream::new();
//!     let mut session = ProgramSession::new(transport, &mut stream, ProgramOptions::default());
//!     match session.run(&mut SlicePages::new(image), &mut NoProgress) {
//!         Ok(stats) => println!("Wrote {} pages", stats.pages_written),
//!         Err(e) => println!("Programming failed: {}", e),
//!     }
//! }
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(any(feature = "std", test))]
extern crate std;

pub mod chip;
pub mod error;
pub mod flash;
pub mod gpio;
pub mod programmer;
pub mod protocol;
pub mod spi;

pub use error::{Error, ProgramError, Result, Step};
