//! Programmer traits and the bit-bang SPI layer
//!
//! [`GpioTransport`] is the only hardware seam. Everything above it speaks
//! bytes; [`bitbang`] turns those bytes into the pin vectors the transport
//! moves.

pub mod bitbang;
mod traits;

pub use bitbang::{BitbangStream, STREAM_CAPACITY};
pub use traits::*;
