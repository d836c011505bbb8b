//! DataFlash command encoding
//!
//! This module provides the AT45DB opcodes used by the programmer and the
//! fixed-size command frames (opcode plus up to three address bytes) that
//! are clocked out ahead of any data.

mod command;
pub mod opcodes;

pub use command::{FlashCommand, PageAddress};
pub use opcodes::*;

/// Size of one DataFlash page (and of one image record) in bytes
pub const PAGE_SIZE: usize = 264;

/// Number of pages the commit command's page address can reach
pub const MAX_PAGES: u32 = 1024;
