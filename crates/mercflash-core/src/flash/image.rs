//! Image page sources
//!
//! An image is consumed as a sequence of page-sized records. A source fills
//! as much of a record as it has data for and reports how many bytes are
//! real; the programmer zero-pads the rest.

use crate::error::Result;

pub use crate::spi::{MAX_PAGES, PAGE_SIZE};

/// Largest image the page addressing can place, in bytes
pub const MAX_IMAGE_SIZE: usize = MAX_PAGES as usize * PAGE_SIZE;

/// A producer of page-sized image records
pub trait PageSource {
    /// Fill `buf` with the next record
    ///
    /// Returns the number of real bytes placed at the start of `buf`. Only
    /// the final record may be short; `0` means the image has ended.
    fn read_record(&mut self, buf: &mut [u8; PAGE_SIZE]) -> Result<usize>;

    /// Total image length in bytes, if known up front
    fn len_hint(&self) -> Option<usize> {
        None
    }
}

impl<P: PageSource + ?Sized> PageSource for &mut P {
    fn read_record(&mut self, buf: &mut [u8; PAGE_SIZE]) -> Result<usize> {
        (**self).read_record(buf)
    }

    fn len_hint(&self) -> Option<usize> {
        (**self).len_hint()
    }
}

/// Pages from an in-memory image
pub struct SlicePages<'a> {
    data: &'a [u8],
    total: usize,
}

impl<'a> SlicePages<'a> {
    /// Read pages from `data`
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            total: data.len(),
        }
    }
}

impl PageSource for SlicePages<'_> {
    fn read_record(&mut self, buf: &mut [u8; PAGE_SIZE]) -> Result<usize> {
        let n = self.data.len().min(PAGE_SIZE);
        let (record, rest) = self.data.split_at(n);
        buf[..n].copy_from_slice(record);
        self.data = rest;
        Ok(n)
    }

    fn len_hint(&self) -> Option<usize> {
        Some(self.total)
    }
}

/// Pages from any [`std::io::Read`]
///
/// Short reads are stitched together so every record except the last is
/// full.
#[cfg(feature = "std")]
pub struct ReaderPages<R> {
    reader: R,
    len: Option<usize>,
}

#[cfg(feature = "std")]
impl<R: std::io::Read> ReaderPages<R> {
    /// Read pages from `reader`, length unknown
    pub fn new(reader: R) -> Self {
        Self { reader, len: None }
    }

    /// Read pages from `reader`, which will yield `len` bytes
    pub fn with_len(reader: R, len: usize) -> Self {
        Self {
            reader,
            len: Some(len),
        }
    }
}

#[cfg(feature = "std")]
impl<R: std::io::Read> PageSource for ReaderPages<R> {
    fn read_record(&mut self, buf: &mut [u8; PAGE_SIZE]) -> Result<usize> {
        let mut filled = 0;
        while filled < PAGE_SIZE {
            match self.reader.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    log::error!("Image read failed: {}", e);
                    return Err(crate::error::Error::ImageRead);
                }
            }
        }
        Ok(filled)
    }

    fn len_hint(&self) -> Option<usize> {
        self.len
    }
}
