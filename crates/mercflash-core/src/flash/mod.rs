//! High-level programming operations
//!
//! This module provides the erase-then-program state machine and the page
//! sources it reads the image from.

mod image;
mod program;

pub use image::*;
pub use program::*;
