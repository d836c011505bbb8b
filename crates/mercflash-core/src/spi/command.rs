//! Command frames and page addressing

use crate::error::{Error, Result};

use super::{opcodes, MAX_PAGES};

/// One DataFlash command: an opcode followed by zero to three address bytes
///
/// Any data phase (page contents, read-back) is handled by the caller; the
/// frame only covers the bytes that are the same for every use of the
/// command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlashCommand {
    bytes: [u8; 4],
    len: usize,
}

impl FlashCommand {
    /// A command with no address phase
    pub const fn simple(opcode: u8) -> Self {
        Self {
            bytes: [opcode, 0, 0, 0],
            len: 1,
        }
    }

    /// A command with three address bytes
    pub const fn with_address(opcode: u8, address: [u8; 3]) -> Self {
        Self {
            bytes: [opcode, address[0], address[1], address[2]],
            len: 4,
        }
    }

    /// Read manufacturer and device ID
    pub const fn identify() -> Self {
        Self::simple(opcodes::IDENTIFY)
    }

    /// Read the status register
    pub const fn read_status() -> Self {
        Self::simple(opcodes::READ_STATUS)
    }

    /// Erase a sector
    ///
    /// Sectors 1 and up are selected by the first address byte alone; the
    /// middle byte only splits sector 0 into its 0a and 0b halves.
    pub const fn sector_erase(hi: u8, mid: u8) -> Self {
        Self::with_address(opcodes::SECTOR_ERASE, [hi, mid, 0x00])
    }

    /// Load buffer 1 starting at buffer offset 0
    pub const fn buffer_write() -> Self {
        Self::with_address(opcodes::BUFFER1_WRITE, [0x00, 0x00, 0x00])
    }

    /// Commit buffer 1 to `page`, erasing the page first
    pub const fn buffer_commit(page: PageAddress) -> Self {
        Self::with_address(
            opcodes::BUFFER1_TO_PAGE_ERASE,
            [page.hi(), page.lo(), 0x00],
        )
    }

    /// The opcode byte
    pub const fn opcode(&self) -> u8 {
        self.bytes[0]
    }

    /// Opcode and address bytes, in transmission order
    pub fn bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }
}

/// A page index that the commit command can encode
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PageAddress(u16);

impl PageAddress {
    /// Validate a page index
    pub fn new(page: u32) -> Result<Self> {
        if page < MAX_PAGES {
            Ok(Self(page as u16))
        } else {
            Err(Error::PageOutOfRange { page })
        }
    }

    /// The page index
    pub const fn index(self) -> u32 {
        self.0 as u32
    }

    /// First address byte: page bits 9..7
    pub const fn hi(self) -> u8 {
        ((self.0 >> 7) & 0x07) as u8
    }

    /// Second address byte: page bits 6..0, shifted past the
    /// buffer-address bit
    pub const fn lo(self) -> u8 {
        ((self.0 << 1) & 0xFE) as u8
    }

    /// Recover the page index from the two address bytes
    pub const fn from_bytes(hi: u8, lo: u8) -> u32 {
        ((hi as u32 & 0x07) << 7) | ((lo as u32) >> 1)
    }
}
