//! Transport trait definitions
//!
//! The core only ever talks to hardware through [`GpioTransport`]. Every
//! call blocks until the physical transfer has completed and every call can
//! fail; a failure is reported as [`Error::Transport`](crate::Error::Transport)
//! and is never retried.

use crate::error::Result;
use crate::gpio::{GpioVector, Selector};

/// A GPIO bit-bang controller wired to the Mercury board
///
/// Implementations only move pin states; SPI framing is done by the
/// [`bitbang`](super::bitbang) module.
pub trait GpioTransport {
    /// Hold the FPGA off the shared SPI bus
    fn assert_hold(&mut self) -> Result<()>;

    /// Let the FPGA use the shared SPI bus again
    fn release_hold(&mut self) -> Result<()>;

    /// Drive an ordered sequence of vectors onto the output lines
    ///
    /// The whole slice is one transfer; a partial write is a failure.
    fn write(&mut self, vectors: &[GpioVector]) -> Result<()>;

    /// Sample the current state of the data bus
    fn read_pins(&mut self) -> Result<GpioVector>;

    /// Drive the chip-select lines to `sel` with a single vector write
    ///
    /// Clock and data lines go low.
    fn select(&mut self, sel: Selector) -> Result<()> {
        self.write(&[sel.pins()])
    }
}

impl<T: GpioTransport + ?Sized> GpioTransport for &mut T {
    fn assert_hold(&mut self) -> Result<()> {
        (**self).assert_hold()
    }

    fn release_hold(&mut self) -> Result<()> {
        (**self).release_hold()
    }

    fn write(&mut self, vectors: &[GpioVector]) -> Result<()> {
        (**self).write(vectors)
    }

    fn read_pins(&mut self) -> Result<GpioVector> {
        (**self).read_pins()
    }

    fn select(&mut self, sel: Selector) -> Result<()> {
        (**self).select(sel)
    }
}

// Blanket impl for boxed transports to allow trait objects
#[cfg(feature = "alloc")]
impl GpioTransport for alloc::boxed::Box<dyn GpioTransport + Send> {
    fn assert_hold(&mut self) -> Result<()> {
        (**self).assert_hold()
    }

    fn release_hold(&mut self) -> Result<()> {
        (**self).release_hold()
    }

    fn write(&mut self, vectors: &[GpioVector]) -> Result<()> {
        (**self).write(vectors)
    }

    fn read_pins(&mut self) -> Result<GpioVector> {
        (**self).read_pins()
    }

    fn select(&mut self, sel: Selector) -> Result<()> {
        (**self).select(sel)
    }
}

/// Run `f` with the FPGA held off the bus
///
/// The hold is released whether or not `f` succeeds. If both `f` and the
/// release fail, the error from `f` is returned.
pub fn with_hold<T, R, F>(transport: &mut T, f: F) -> Result<R>
where
    T: GpioTransport + ?Sized,
    F: FnOnce(&mut T) -> Result<R>,
{
    transport.assert_hold()?;
    let result = f(transport);
    let released = transport.release_hold();
    match (result, released) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(e)) => Err(e),
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(release_err)) => {
            log::error!("Failed to release hold after error: {}", release_err);
            Err(e)
        }
    }
}
