//! Protocol implementations
//!
//! This module contains the AT45DB DataFlash command sequences, each built
//! from bit-bang transfers over a [`GpioTransport`](crate::programmer::GpioTransport).

mod dataflash;

pub use dataflash::*;
