//! Bit-level SPI encoder, decoder and bulk assembler
//!
//! The bit-bang controller has no SPI engine: every clock edge is a vector
//! written to the data bus. This module turns bytes into those vectors and
//! samples bytes back out of the bus.
//!
//! ## Encoding (SPI mode 0)
//!
//! Each byte becomes 16 vectors, MSB first. For every bit the data line is
//! set with the clock low, then the same data is repeated with the clock
//! high, so the target samples on the rising edge:
//!
//! ```text
//!   bit:     7       6             0
//! MOSI:  ==d7==d7==d6==d6== ... ==d0==d0==
//! SCLK:  __/‾‾\__/‾‾\__ ... __/‾‾
//! ```
//!
//! A [`BitbangStream`] holds the vectors for one or more byte sequences,
//! always followed by one sentinel vector that keeps the selector of the
//! last segment with clock and data low.
//!
//! ## Decoding
//!
//! On read-back the target's data is valid *before* the rising edge, so each
//! bit is sampled with [`GpioTransport::read_pins`] first, then the clock is
//! pulsed high and low. Decoding always ends by returning the bus to
//! [`Selector::Idle`].
//!
//! ## Bulk assembly
//!
//! [`BitbangStream::append`] places a byte sequence at a caller-owned offset
//! and returns the next free offset, so several commands (each with its own
//! selector) can be chained into a single transport write.

use crate::error::{Error, Result};
use crate::gpio::{GpioVector, Selector};
use crate::programmer::GpioTransport;
use crate::spi::PAGE_SIZE;

/// Number of vectors needed to clock out one byte
pub const VECTORS_PER_BYTE: usize = 16;

/// Bytes in the largest burst: load-buffer command, a full page, idle,
/// commit command, idle
pub const BURST_BYTES: usize = 4 + PAGE_SIZE + 1 + 4 + 1;

/// Capacity of a [`BitbangStream`]: the largest burst plus its sentinel
pub const STREAM_CAPACITY: usize = VECTORS_PER_BYTE * BURST_BYTES + 1;

/// Encode one byte as 16 vectors, MSB first
pub fn encode_byte(byte: u8, sel: Selector) -> [GpioVector; VECTORS_PER_BYTE] {
    let mut out = [sel.pins(); VECTORS_PER_BYTE];
    for (i, cell) in out.chunks_exact_mut(2).enumerate() {
        let bit = byte & (0x80 >> i) != 0;
        cell[0] = GpioVector::bit_cell(bit, sel, false);
        cell[1] = GpioVector::bit_cell(bit, sel, true);
    }
    out
}

/// Fixed-capacity buffer of GPIO vectors for one burst
///
/// The stream is a scratch resource: each burst overwrites it from offset 0,
/// nothing from a previous burst is ever transmitted again.
pub struct BitbangStream {
    vectors: heapless::Vec<GpioVector, STREAM_CAPACITY>,
}

impl BitbangStream {
    /// Create an empty stream
    pub const fn new() -> Self {
        Self {
            vectors: heapless::Vec::new(),
        }
    }

    /// Drop all vectors
    pub fn clear(&mut self) {
        self.vectors.clear();
    }

    /// Number of vectors, including the sentinel
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    /// Whether the stream holds no vectors at all
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Vectors to transmit, including the sentinel
    pub fn as_slice(&self) -> &[GpioVector] {
        &self.vectors
    }

    /// Encode `bytes` at `offset` and terminate the stream with a sentinel
    ///
    /// Anything at or after `offset` is overwritten, including the sentinel
    /// of a previous segment. Returns the offset of the new sentinel, which
    /// is where the next segment should start.
    pub fn append(&mut self, bytes: &[u8], sel: Selector, offset: usize) -> Result<usize> {
        if offset > self.vectors.len() {
            return Err(Error::StreamLength {
                expected: offset,
                actual: self.vectors.len(),
            });
        }

        let end = offset + bytes.len() * VECTORS_PER_BYTE;
        if end + 1 > STREAM_CAPACITY {
            return Err(Error::StreamOverflow {
                needed: end + 1,
                capacity: STREAM_CAPACITY,
            });
        }

        self.vectors.truncate(offset);
        for &byte in bytes {
            self.vectors
                .extend_from_slice(&encode_byte(byte, sel))
                .map_err(|_| Error::StreamOverflow {
                    needed: end + 1,
                    capacity: STREAM_CAPACITY,
                })?;
        }

        if self.vectors.len() != end {
            return Err(Error::StreamLength {
                expected: end,
                actual: self.vectors.len(),
            });
        }

        self.vectors
            .push(GpioVector::sentinel(sel))
            .map_err(|_| Error::StreamOverflow {
                needed: end + 1,
                capacity: STREAM_CAPACITY,
            })?;

        Ok(end)
    }

    /// Replace the stream contents with the encoding of `bytes`
    pub fn encode(&mut self, bytes: &[u8], sel: Selector) -> Result<usize> {
        self.append(bytes, sel, 0)
    }
}

impl Default for BitbangStream {
    fn default() -> Self {
        Self::new()
    }
}

/// Encode `bytes` into `stream` and transmit it
///
/// The selector stays asserted afterwards; the caller decides when the
/// command ends (deselecting is what commits a DataFlash command).
pub fn send<T: GpioTransport + ?Sized>(
    transport: &mut T,
    stream: &mut BitbangStream,
    bytes: &[u8],
    sel: Selector,
) -> Result<()> {
    stream.encode(bytes, sel)?;
    log::trace!("bitbang: sending {} byte(s) as {} vectors", bytes.len(), stream.len());
    transport.write(stream.as_slice())
}

/// Clock one byte in from the target, MSB first
pub fn read_byte<T: GpioTransport + ?Sized>(transport: &mut T, sel: Selector) -> Result<u8> {
    let high = GpioVector::bit_cell(false, sel, true);
    let low = GpioVector::bit_cell(false, sel, false);
    let mut byte = 0u8;
    for _ in 0..8 {
        // Data is valid before the rising edge on read-back
        let pins = transport.read_pins()?;
        byte = (byte << 1) | pins.miso() as u8;
        transport.write(&[high])?;
        transport.write(&[low])?;
    }
    Ok(byte)
}

/// Clock `buf.len()` bytes in from the target, then return the bus to idle
pub fn recv<T: GpioTransport + ?Sized>(
    transport: &mut T,
    buf: &mut [u8],
    sel: Selector,
) -> Result<()> {
    let mut result = Ok(());
    for byte in buf.iter_mut() {
        match read_byte(transport, sel) {
            Ok(b) => *byte = b,
            Err(e) => {
                result = Err(e);
                break;
            }
        }
    }

    let idle = transport.select(Selector::Idle);
    result.and(idle)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::vec::Vec;

    /// SPI target that answers every byte it receives with the same byte
    pub(crate) struct EchoTarget {
        last: GpioVector,
        shift_in: u8,
        bits_in: u8,
        out: u8,
        out_bit: u8,
        pub(crate) writes: Vec<GpioVector>,
    }

    impl EchoTarget {
        pub(crate) fn new() -> Self {
            Self {
                last: Selector::Idle.pins(),
                shift_in: 0,
                bits_in: 0,
                out: 0,
                out_bit: 8,
                writes: Vec::new(),
            }
        }
    }

    impl GpioTransport for EchoTarget {
        fn assert_hold(&mut self) -> Result<()> {
            Ok(())
        }

        fn release_hold(&mut self) -> Result<()> {
            Ok(())
        }

        fn write(&mut self, vectors: &[GpioVector]) -> Result<()> {
            for &v in vectors {
                let selected = Selector::from_pins(v).is_some_and(|s| s != Selector::Idle);
                if !selected {
                    self.shift_in = 0;
                    self.bits_in = 0;
                } else if v.contains(GpioVector::SCLK) && !self.last.contains(GpioVector::SCLK) {
                    self.shift_in = (self.shift_in << 1) | v.contains(GpioVector::MOSI) as u8;
                    self.bits_in += 1;
                    self.out_bit = self.out_bit.saturating_add(1);
                    if self.bits_in == 8 {
                        self.out = self.shift_in;
                        self.out_bit = 0;
                        self.shift_in = 0;
                        self.bits_in = 0;
                    }
                }
                self.last = v;
                self.writes.push(v);
            }
            Ok(())
        }

        fn read_pins(&mut self) -> Result<GpioVector> {
            let mut pins = self.last;
            if self.out_bit < 8 && self.out & (0x80 >> self.out_bit) != 0 {
                pins |= GpioVector::MISO;
            }
            Ok(pins)
        }
    }

    #[test]
    fn test_encode_byte_msb_first() {
        let v = encode_byte(0xA5, Selector::Flash);
        let bits: Vec<bool> = v.chunks(2).map(|c| c[0].contains(GpioVector::MOSI)).collect();
        assert_eq!(
            bits,
            [true, false, true, false, false, true, false, true]
        );
        for cell in v.chunks(2) {
            // Same data on both halves, clock rises on the second
            assert!(!cell[0].contains(GpioVector::SCLK));
            assert!(cell[1].contains(GpioVector::SCLK));
            assert_eq!(
                cell[0].contains(GpioVector::MOSI),
                cell[1].contains(GpioVector::MOSI)
            );
            assert_eq!(Selector::from_pins(cell[0]), Some(Selector::Flash));
            assert_eq!(Selector::from_pins(cell[1]), Some(Selector::Flash));
        }
    }

    #[test]
    fn test_stream_length_invariant() {
        let data = [0x5Au8; BURST_BYTES];
        let mut stream = BitbangStream::new();
        for len in [0usize, 1, 4, 17, PAGE_SIZE, BURST_BYTES] {
            let end = stream.encode(&data[..len], Selector::Flash).unwrap();
            assert_eq!(end, VECTORS_PER_BYTE * len);
            assert_eq!(stream.len(), VECTORS_PER_BYTE * len + 1);
            let last = stream.as_slice()[stream.len() - 1];
            assert_eq!(last, GpioVector::sentinel(Selector::Flash));
        }
    }

    #[test]
    fn test_append_overwrites_sentinel() {
        let mut stream = BitbangStream::new();
        let off = stream.append(&[0x84, 0, 0, 0], Selector::Flash, 0).unwrap();
        assert_eq!(off, 64);
        let off = stream.append(&[0x00], Selector::Idle, off).unwrap();
        assert_eq!(off, 80);
        assert_eq!(stream.len(), 81);
        // The first segment's sentinel was replaced by the idle byte
        assert_eq!(Selector::from_pins(stream.as_slice()[64]), Some(Selector::Idle));
        assert_eq!(stream.as_slice()[80], GpioVector::sentinel(Selector::Idle));
    }

    #[test]
    fn test_encode_overwrites_previous_burst() {
        let mut stream = BitbangStream::new();
        stream.encode(&[0xFF; 10], Selector::Flash).unwrap();
        stream.encode(&[0x00], Selector::Fpga).unwrap();
        assert_eq!(stream.len(), VECTORS_PER_BYTE + 1);
        assert!(stream
            .as_slice()
            .iter()
            .all(|v| !v.contains(GpioVector::MOSI)));
    }

    #[test]
    fn test_append_rejects_gap() {
        let mut stream = BitbangStream::new();
        let err = stream.append(&[0x00], Selector::Flash, 5).unwrap_err();
        assert_eq!(
            err,
            Error::StreamLength {
                expected: 5,
                actual: 0
            }
        );
    }

    #[test]
    fn test_append_overflow() {
        let data = [0u8; BURST_BYTES + 1];
        let mut stream = BitbangStream::new();
        let err = stream.encode(&data, Selector::Flash).unwrap_err();
        assert_eq!(
            err,
            Error::StreamOverflow {
                needed: STREAM_CAPACITY + VECTORS_PER_BYTE,
                capacity: STREAM_CAPACITY
            }
        );
        // Nothing was written
        assert!(stream.is_empty());
    }

    #[test]
    fn test_round_trip_all_bytes() {
        let mut stream = BitbangStream::new();
        for sel in [Selector::Fpga, Selector::Flash] {
            for b in 0..=255u8 {
                let mut target = EchoTarget::new();
                send(&mut target, &mut stream, &[b], sel).unwrap();
                let mut buf = [0u8; 1];
                recv(&mut target, &mut buf, sel).unwrap();
                assert_eq!(buf[0], b, "round trip of 0x{:02X} via {:?}", b, sel);
            }
        }
    }

    #[test]
    fn test_recv_returns_to_idle() {
        let mut stream = BitbangStream::new();
        let mut target = EchoTarget::new();
        send(&mut target, &mut stream, &[0x42], Selector::Flash).unwrap();
        let mut buf = [0u8; 2];
        recv(&mut target, &mut buf, Selector::Flash).unwrap();
        let last = *target.writes.last().unwrap();
        assert_eq!(last, Selector::Idle.pins());
        // 17 vectors for the send, 2 per bit read, 1 for the idle select
        assert_eq!(target.writes.len(), 17 + 2 * 16 + 1);
    }
}
