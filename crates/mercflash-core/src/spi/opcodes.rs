//! AT45DB DataFlash opcodes
//!
//! Only the subset needed to identify, erase and program the device. The
//! DataFlash command set is not JEDEC-compatible beyond identification.

// ============================================================================
// Identification and status
// ============================================================================

/// Manufacturer and device ID read (4 bytes follow)
pub const IDENTIFY: u8 = 0x9F;
/// Status register read (1 byte follows)
pub const READ_STATUS: u8 = 0xD7;

/// Status register: device ready (not busy)
pub const STATUS_READY: u8 = 0x80;

// ============================================================================
// Erase
// ============================================================================

/// Sector erase (3 address bytes)
pub const SECTOR_ERASE: u8 = 0x7C;

// ============================================================================
// Program
// ============================================================================

/// Write data into SRAM buffer 1 (3 address bytes, then data)
pub const BUFFER1_WRITE: u8 = 0x84;
/// Buffer 1 to main memory page program with built-in erase
pub const BUFFER1_TO_PAGE_ERASE: u8 = 0x88;
