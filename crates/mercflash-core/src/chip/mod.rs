//! Supported DataFlash devices
//!
//! The Mercury board ships with one of two Atmel AT45DB parts. Both use
//! 264-byte pages and the same command set; they differ in capacity and in
//! how a sector number is placed in the erase address.

mod types;

pub use types::*;
