//! GPIO vectors and chip-select selectors
//!
//! A [`GpioVector`] is the state of every line the bit-bang controller drives
//! (or samples) at one instant. The Mercury board wires its FT232R data bus
//! as follows:
//!
//! | Bit | Line | Direction | Function |
//! |-----|------|-----------|----------|
//! | 0   | CSN0 | out | chip select, the only one high when the FPGA is addressed |
//! | 1   | CSN1 | out | chip select, the only one high when the flash is addressed |
//! | 2   | SCLK | out | SPI clock (idle low) |
//! | 3   | MISO | in  | SPI data from target |
//! | 4   | MOSI | out | SPI data to target |
//! | 5   | PROG | out when held | holds the FPGA off the shared bus |
//!
//! Both chip-select lines high deselects everything.

use bitflags::bitflags;

bitflags! {
    /// State of the bit-bang controller's data bus
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct GpioVector: u8 {
        /// Chip select line 0
        const CSN0 = 1 << 0;
        /// Chip select line 1
        const CSN1 = 1 << 1;
        /// SPI clock
        const SCLK = 1 << 2;
        /// SPI data in (sampled, never driven)
        const MISO = 1 << 3;
        /// SPI data out
        const MOSI = 1 << 4;
        /// FPGA program/hold line
        const PROG = 1 << 5;

        /// Both chip select lines
        const CS_MASK = Self::CSN0.bits() | Self::CSN1.bits();
    }
}

/// Lines driven as outputs while the FPGA is free to use the bus
pub const OUTPUT_DIRECTION: GpioVector = GpioVector::CSN0
    .union(GpioVector::CSN1)
    .union(GpioVector::SCLK)
    .union(GpioVector::MOSI);

/// Lines driven as outputs while the FPGA is held off the bus
pub const HOLD_DIRECTION: GpioVector = OUTPUT_DIRECTION.union(GpioVector::PROG);

/// Which target on the shared SPI bus is listening
///
/// Exactly one selector is encoded into every vector, so at most one target
/// is ever selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Selector {
    /// The FPGA is selected
    Fpga,
    /// The DataFlash is selected
    Flash,
    /// Both targets deselected
    Idle,
}

impl Selector {
    /// Chip-select lines driven for this selector
    pub const fn pins(self) -> GpioVector {
        match self {
            Self::Fpga => GpioVector::CSN0,
            Self::Flash => GpioVector::CSN1,
            Self::Idle => GpioVector::CS_MASK,
        }
    }

    /// Recover the selector encoded in a vector
    ///
    /// Returns `None` when both chip-select lines are low, which would address
    /// both targets at once.
    pub fn from_pins(pins: GpioVector) -> Option<Self> {
        let cs = pins & GpioVector::CS_MASK;
        if cs == GpioVector::CSN0 {
            Some(Self::Fpga)
        } else if cs == GpioVector::CSN1 {
            Some(Self::Flash)
        } else if cs == GpioVector::CS_MASK {
            Some(Self::Idle)
        } else {
            None
        }
    }
}

impl GpioVector {
    /// Vector for one half of a bit cell: data line, selector and clock
    #[inline]
    pub fn bit_cell(data: bool, sel: Selector, clock_high: bool) -> Self {
        let mut v = sel.pins();
        if data {
            v |= GpioVector::MOSI;
        }
        if clock_high {
            v |= GpioVector::SCLK;
        }
        v
    }

    /// Stream terminator: clock and data low, selector unchanged
    #[inline]
    pub fn sentinel(sel: Selector) -> Self {
        sel.pins()
    }

    /// Whether the sampled data-in line is high
    #[inline]
    pub fn miso(self) -> bool {
        self.contains(GpioVector::MISO)
    }
}
