//! Error types for mercflash-core
//!
//! This module provides a no_std compatible error type that can be used
//! throughout the crate, plus [`ProgramError`] which records the step of a
//! programming run that failed.

use core::fmt;

use crate::chip::EraseTarget;

/// Core error type - no_std compatible, Copy for efficiency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    // Transport errors
    /// The GPIO transport reported a communication failure
    Transport,

    // Device errors
    /// Identify returned an ID that matches neither supported DataFlash
    UnsupportedDevice {
        /// Raw 32-bit identity as read back from the device
        id: u32,
    },
    /// The device did not report ready within the poll budget
    PollTimeout {
        /// Number of status reads issued before giving up
        attempts: u32,
    },

    // Image errors
    /// The image source failed to produce data (not end-of-image)
    ImageRead,
    /// The image needs a page the address encoding cannot reach
    PageOutOfRange {
        /// Offending page index
        page: u32,
    },

    // Bit-bang stream invariants
    /// The bit-bang stream would exceed its fixed capacity
    StreamOverflow {
        /// Number of vectors the operation required
        needed: usize,
        /// Capacity of the stream
        capacity: usize,
    },
    /// The assembled stream has a different length than the bytes encoded
    StreamLength {
        /// Length implied by the encoded byte count
        expected: usize,
        /// Length actually present in the stream
        actual: usize,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport => write!(f, "GPIO transport failure"),
            Self::UnsupportedDevice { id } => write!(
                f,
                "unsupported or absent flash device (ID 0x{:08X}, expected 0x231F or 0x251F in low 16 bits)",
                id
            ),
            Self::PollTimeout { attempts } => {
                write!(f, "device not ready after {} status polls", attempts)
            }
            Self::ImageRead => write!(f, "failed to read image data"),
            Self::PageOutOfRange { page } => {
                write!(f, "page {} is beyond the addressable range (0-1023)", page)
            }
            Self::StreamOverflow { needed, capacity } => write!(
                f,
                "bit-bang stream overflow: {} vectors needed, capacity {}",
                needed, capacity
            ),
            Self::StreamLength { expected, actual } => write!(
                f,
                "bit-bang stream length mismatch: expected {} vectors, found {}",
                expected, actual
            ),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;

/// The step of a programming run an error belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Reading the device identity
    Identify,
    /// Erasing one region of the device
    Erase(EraseTarget),
    /// Writing one page
    WritePage(u32),
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identify => write!(f, "identify"),
            Self::Erase(target) => write!(f, "erase of {}", target),
            Self::WritePage(page) => write!(f, "page {} write", page),
        }
    }
}

/// An [`Error`] together with the step that produced it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgramError {
    /// Step that failed
    pub step: Step,
    /// Underlying cause
    pub error: Error,
}

impl ProgramError {
    /// Attach a step to an error
    pub fn new(step: Step, error: Error) -> Self {
        Self { step, error }
    }
}

impl fmt::Display for ProgramError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed: {}", self.step, self.error)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ProgramError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}
