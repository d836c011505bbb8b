//! AT45DB DataFlash command sequences
//!
//! Every sequence selects the flash, clocks out a command frame and then
//! either reads a response or deselects the flash. Deselecting is what
//! starts an erase or program cycle inside the device, so each of those is
//! followed by [`wait_ready`].
//!
//! None of these functions touch the hold line; the caller decides which
//! sequences run with the FPGA held off the bus.

use crate::chip::{ChipModel, EraseTarget};
use crate::error::{Error, Result};
use crate::gpio::Selector;
use crate::programmer::bitbang::{self, BitbangStream, BURST_BYTES, VECTORS_PER_BYTE};
use crate::programmer::GpioTransport;
use crate::spi::{opcodes, FlashCommand, PageAddress, PAGE_SIZE};

/// Default number of status reads before a busy device is given up on
pub const DEFAULT_POLL_BUDGET: u32 = 300_000;

/// Read the raw 32-bit identity
///
/// The four response bytes are assembled least significant first.
pub fn read_id<T: GpioTransport + ?Sized>(
    transport: &mut T,
    stream: &mut BitbangStream,
) -> Result<u32> {
    bitbang::send(transport, stream, FlashCommand::identify().bytes(), Selector::Flash)?;
    let mut buf = [0u8; 4];
    bitbang::recv(transport, &mut buf, Selector::Flash)?;
    transport.select(Selector::Idle)?;
    Ok(u32::from_le_bytes(buf))
}

/// Read the identity and match it against the supported devices
pub fn identify<T: GpioTransport + ?Sized>(
    transport: &mut T,
    stream: &mut BitbangStream,
) -> Result<ChipModel> {
    let id = read_id(transport, stream)?;
    log::debug!("Flash ID 0x{:08X}", id);
    ChipModel::from_id(id)
}

/// Read the status register once
pub fn read_status<T: GpioTransport + ?Sized>(
    transport: &mut T,
    stream: &mut BitbangStream,
) -> Result<u8> {
    bitbang::send(transport, stream, FlashCommand::read_status().bytes(), Selector::Flash)?;
    let mut status = [0u8; 1];
    bitbang::recv(transport, &mut status, Selector::Flash)?;
    transport.select(Selector::Idle)?;
    Ok(status[0])
}

/// Poll the status register until the device reports ready
///
/// Returns the number of status reads issued, which is `k` if the device
/// first reports ready on read `k`. Gives up after `budget` reads with
/// [`Error::PollTimeout`]. Transport failures end the poll immediately.
pub fn wait_ready<T: GpioTransport + ?Sized>(
    transport: &mut T,
    stream: &mut BitbangStream,
    budget: u32,
) -> Result<u32> {
    for attempt in 1..=budget {
        if read_status(transport, stream)? & opcodes::STATUS_READY != 0 {
            log::trace!("Ready after {} status poll(s)", attempt);
            return Ok(attempt);
        }
    }
    Err(Error::PollTimeout { attempts: budget })
}

/// Erase one region and wait for the erase to finish
///
/// Returns the number of status reads the wait took.
pub fn erase_target<T: GpioTransport + ?Sized>(
    transport: &mut T,
    stream: &mut BitbangStream,
    chip: ChipModel,
    target: EraseTarget,
    budget: u32,
) -> Result<u32> {
    let cmd = target.command(chip);
    log::debug!("Erasing {} ({:02X?})", target, cmd.bytes());
    bitbang::send(transport, stream, cmd.bytes(), Selector::Flash)?;
    // The erase starts when the flash is deselected
    transport.select(Selector::Idle)?;
    wait_ready(transport, stream, budget)
}

/// Erase the whole device, sector 0a first
///
/// `on_erased` is called after each region completes with the region and
/// the number of regions done so far. The first failure stops the erase and
/// is returned together with the region it happened on. On success the
/// total number of status reads is returned.
pub fn erase_chip<T, F>(
    transport: &mut T,
    stream: &mut BitbangStream,
    chip: ChipModel,
    budget: u32,
    mut on_erased: F,
) -> core::result::Result<u32, (EraseTarget, Error)>
where
    T: GpioTransport + ?Sized,
    F: FnMut(EraseTarget, u32),
{
    let mut polls = 0u32;
    for (done, target) in chip.erase_targets().enumerate() {
        polls += erase_target(transport, stream, chip, target, budget)
            .map_err(|e| (target, e))?;
        on_erased(target, done as u32 + 1);
    }
    Ok(polls)
}

/// Assemble the whole page-write burst into `stream`
///
/// Load buffer 1 with `data`, deselect, commit the buffer to `page`,
/// deselect. Returns the number of vectors before the sentinel.
pub fn assemble_page_write(
    stream: &mut BitbangStream,
    page: PageAddress,
    data: &[u8; PAGE_SIZE],
) -> Result<usize> {
    let idle = [0x00u8];
    let mut offset = stream.append(FlashCommand::buffer_write().bytes(), Selector::Flash, 0)?;
    offset = stream.append(data, Selector::Flash, offset)?;
    offset = stream.append(&idle, Selector::Idle, offset)?;
    offset = stream.append(FlashCommand::buffer_commit(page).bytes(), Selector::Flash, offset)?;
    offset = stream.append(&idle, Selector::Idle, offset)?;

    let expected = VECTORS_PER_BYTE * BURST_BYTES;
    if offset != expected {
        return Err(Error::StreamLength {
            expected,
            actual: offset,
        });
    }
    Ok(offset)
}

/// Program one page and wait for the program cycle to finish
///
/// The whole transaction goes out in a single transport write. Returns the
/// number of status reads the wait took.
pub fn write_page<T: GpioTransport + ?Sized>(
    transport: &mut T,
    stream: &mut BitbangStream,
    page: PageAddress,
    data: &[u8; PAGE_SIZE],
    budget: u32,
) -> Result<u32> {
    assemble_page_write(stream, page, data)?;
    log::trace!(
        "Writing page {} as a {}-vector burst",
        page.index(),
        stream.len()
    );
    transport.write(stream.as_slice())?;
    wait_ready(transport, stream, budget)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpio::GpioVector;
    use std::collections::VecDeque;
    use std::vec::Vec;

    /// Transport that answers every byte read with the next scripted byte
    struct Scripted {
        replies: VecDeque<u8>,
        current: u8,
        bit: u8,
        bytes_read: u32,
        writes: Vec<Vec<GpioVector>>,
    }

    impl Scripted {
        fn new(replies: &[u8]) -> Self {
            Self {
                replies: replies.iter().copied().collect(),
                current: 0,
                bit: 0,
                bytes_read: 0,
                writes: Vec::new(),
            }
        }
    }

    impl GpioTransport for Scripted {
        fn assert_hold(&mut self) -> Result<()> {
            Ok(())
        }

        fn release_hold(&mut self) -> Result<()> {
            Ok(())
        }

        fn write(&mut self, vectors: &[GpioVector]) -> Result<()> {
            self.writes.push(vectors.to_vec());
            Ok(())
        }

        fn read_pins(&mut self) -> Result<GpioVector> {
            if self.bit == 0 {
                self.current = self.replies.pop_front().unwrap_or(0);
                self.bytes_read += 1;
            }
            let high = self.current & (0x80 >> self.bit) != 0;
            self.bit = (self.bit + 1) % 8;
            Ok(if high {
                GpioVector::MISO
            } else {
                GpioVector::empty()
            })
        }
    }

    #[test]
    fn test_read_id_little_endian() {
        let mut t = Scripted::new(&[0x1F, 0x25, 0x00, 0x01]);
        let mut stream = BitbangStream::new();
        assert_eq!(read_id(&mut t, &mut stream).unwrap(), 0x0100_251F);
    }

    #[test]
    fn test_identify_rejects_unknown() {
        let mut t = Scripted::new(&[0xFF, 0xFF, 0xFF, 0xFF]);
        let mut stream = BitbangStream::new();
        assert_eq!(
            identify(&mut t, &mut stream),
            Err(Error::UnsupportedDevice { id: 0xFFFF_FFFF })
        );

        let mut t = Scripted::new(&[0x1F, 0x23, 0x00, 0x00]);
        assert_eq!(identify(&mut t, &mut stream), Ok(ChipModel::At45db021));
    }

    #[test]
    fn test_wait_ready_exact_attempts() {
        let mut stream = BitbangStream::new();
        for k in 1..=6u32 {
            let mut script = std::vec![0x00u8; (k - 1) as usize];
            script.push(0x80);
            let mut t = Scripted::new(&script);
            assert_eq!(wait_ready(&mut t, &mut stream, 10), Ok(k));
            assert_eq!(t.bytes_read, k);
        }
    }

    #[test]
    fn test_wait_ready_ignores_other_status_bits() {
        let mut t = Scripted::new(&[0x7F, 0x24 | 0x80]);
        let mut stream = BitbangStream::new();
        assert_eq!(wait_ready(&mut t, &mut stream, 10), Ok(2));
    }

    #[test]
    fn test_wait_ready_budget_exhausted() {
        let mut t = Scripted::new(&[]);
        let mut stream = BitbangStream::new();
        assert_eq!(
            wait_ready(&mut t, &mut stream, 5),
            Err(Error::PollTimeout { attempts: 5 })
        );
        assert_eq!(t.bytes_read, 5);

        // Ready on the read after the last allowed one
        let mut t = Scripted::new(&[0, 0, 0, 0x80]);
        assert_eq!(
            wait_ready(&mut t, &mut stream, 3),
            Err(Error::PollTimeout { attempts: 3 })
        );
        assert_eq!(t.bytes_read, 3);
    }

    #[test]
    fn test_write_page_single_burst() {
        let mut t = Scripted::new(&[0x80]);
        let mut stream = BitbangStream::new();
        let data = [0xA5u8; PAGE_SIZE];
        let page = PageAddress::new(12).unwrap();
        assert_eq!(write_page(&mut t, &mut stream, page, &data, 10), Ok(1));
        // The burst is the first write; the status read follows it
        let burst = &t.writes[0];
        assert_eq!(burst.len(), VECTORS_PER_BYTE * BURST_BYTES + 1);
        assert_eq!(burst[..], stream_for(page, &data)[..]);
        assert!(t.writes.len() > 1);

        // Burst layout by selector: 4 + 264 flash bytes, 1 idle, 4 flash, 1 idle
        let sels: Vec<_> = burst[..VECTORS_PER_BYTE * BURST_BYTES]
            .chunks(VECTORS_PER_BYTE)
            .map(|byte| Selector::from_pins(byte[0]).unwrap())
            .collect();
        assert!(sels[..268].iter().all(|&s| s == Selector::Flash));
        assert_eq!(sels[268], Selector::Idle);
        assert!(sels[269..273].iter().all(|&s| s == Selector::Flash));
        assert_eq!(sels[273], Selector::Idle);
        assert_eq!(
            burst[VECTORS_PER_BYTE * BURST_BYTES],
            GpioVector::sentinel(Selector::Idle)
        );
    }

    fn stream_for(page: PageAddress, data: &[u8; PAGE_SIZE]) -> Vec<GpioVector> {
        let mut stream = BitbangStream::new();
        assemble_page_write(&mut stream, page, data).unwrap();
        stream.as_slice().to_vec()
    }

    #[test]
    fn test_erase_chip_stops_on_timeout() {
        // Sector 0a ready, 0b never ready
        let mut t = Scripted::new(&[0x80]);
        let mut stream = BitbangStream::new();
        let mut erased = Vec::new();
        let err = erase_chip(&mut t, &mut stream, ChipModel::At45db021, 4, |target, _| {
            erased.push(target)
        })
        .unwrap_err();
        assert_eq!(
            err,
            (EraseTarget::Sector0High, Error::PollTimeout { attempts: 4 })
        );
        assert_eq!(erased, [EraseTarget::Sector0Low]);
    }
}
