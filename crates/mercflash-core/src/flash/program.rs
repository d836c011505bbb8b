//! Erase-then-program state machine
//!
//! A [`ProgramSession`] owns the transport and the bit-bang stream for the
//! duration of a run and moves through
//!
//! ```text
//! Idle -> Identifying -> Erasing -> Programming { page } -> Idle
//! ```
//!
//! with [`ProgramState::Failed`] reachable from every step. The FPGA is held
//! off the bus for the whole erase and for each page write including its
//! readiness poll, and the hold is released again whether or not the step
//! succeeded.

use crate::chip::{ChipModel, EraseTarget};
use crate::error::{Error, ProgramError, Result, Step};
use crate::programmer::{with_hold, BitbangStream, GpioTransport};
use crate::protocol::{self, DEFAULT_POLL_BUDGET};
use crate::spi::PageAddress;

use super::image::{PageSource, MAX_IMAGE_SIZE, MAX_PAGES, PAGE_SIZE};

/// Where a [`ProgramSession`] is in its run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgramState {
    /// Not running; the hold line is released
    Idle,
    /// Reading the device identity
    Identifying,
    /// Erasing the whole device
    Erasing,
    /// Writing one page
    Programming {
        /// Page being written
        page: u32,
    },
    /// A step failed; nothing more will be issued
    Failed {
        /// The step that failed
        step: Step,
    },
}

/// Tunables for a programming run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgramOptions {
    /// Status reads allowed per erase or page write before giving up
    pub poll_budget: u32,
}

impl Default for ProgramOptions {
    fn default() -> Self {
        Self {
            poll_budget: DEFAULT_POLL_BUDGET,
        }
    }
}

/// Summary of a successful run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgramStats {
    /// Device that was programmed
    pub chip: ChipModel,
    /// Sector-erase commands issued
    pub erase_commands: u32,
    /// Pages written
    pub pages_written: u32,
    /// Image bytes written (excluding padding)
    pub image_bytes: usize,
    /// Status reads issued across all erases and writes
    pub status_polls: u64,
}

/// Callback for progress reporting during a programming run
pub trait ProgramProgress {
    /// Called once the device has been identified
    fn identified(&mut self, chip: ChipModel);

    /// Called when starting the erase
    fn erasing(&mut self, commands: u32);

    /// Called after each region is erased
    fn erase_progress(&mut self, target: EraseTarget, done: u32);

    /// Called when starting to write pages
    fn programming(&mut self, total_bytes: Option<usize>);

    /// Called after each page is written, with the number of image bytes it
    /// carried
    fn page_written(&mut self, page: u32, bytes: usize);

    /// Called when the run is complete
    fn complete(&mut self, stats: &ProgramStats);
}

/// A no-op progress reporter
pub struct NoProgress;

impl ProgramProgress for NoProgress {
    fn identified(&mut self, _chip: ChipModel) {}
    fn erasing(&mut self, _commands: u32) {}
    fn erase_progress(&mut self, _target: EraseTarget, _done: u32) {}
    fn programming(&mut self, _total_bytes: Option<usize>) {}
    fn page_written(&mut self, _page: u32, _bytes: usize) {}
    fn complete(&mut self, _stats: &ProgramStats) {}
}

/// One programming run over a transport
pub struct ProgramSession<'a, T: GpioTransport + ?Sized> {
    transport: &'a mut T,
    stream: &'a mut BitbangStream,
    options: ProgramOptions,
    state: ProgramState,
    status_polls: u64,
}

impl<'a, T: GpioTransport + ?Sized> ProgramSession<'a, T> {
    /// Start a session; nothing is sent until a phase is run
    pub fn new(transport: &'a mut T, stream: &'a mut BitbangStream, options: ProgramOptions) -> Self {
        Self {
            transport,
            stream,
            options,
            state: ProgramState::Idle,
            status_polls: 0,
        }
    }

    /// Current state
    pub fn state(&self) -> ProgramState {
        self.state
    }

    /// Status reads issued so far
    pub fn status_polls(&self) -> u64 {
        self.status_polls
    }

    fn fail(&mut self, step: Step, error: Error) -> ProgramError {
        self.state = ProgramState::Failed { step };
        log::debug!("{} failed: {}", step, error);
        ProgramError::new(step, error)
    }

    /// Release the hold and identify the device
    ///
    /// An unknown device fails with [`Error::UnsupportedDevice`] before any
    /// erase or write is issued.
    pub fn identify(&mut self) -> core::result::Result<ChipModel, ProgramError> {
        self.state = ProgramState::Identifying;

        let result = match self.transport.release_hold() {
            Ok(()) => protocol::identify(&mut *self.transport, &mut *self.stream),
            Err(e) => Err(e),
        };

        match result {
            Ok(chip) => {
                log::info!("Found {} ({} bytes)", chip, chip.total_size());
                self.state = ProgramState::Idle;
                Ok(chip)
            }
            Err(e) => Err(self.fail(Step::Identify, e)),
        }
    }

    /// Erase every region of `chip`, sector 0a first
    ///
    /// Returns the number of erase commands issued.
    pub fn erase<P: ProgramProgress + ?Sized>(
        &mut self,
        chip: ChipModel,
        progress: &mut P,
    ) -> core::result::Result<u32, ProgramError> {
        self.state = ProgramState::Erasing;
        let commands = chip.erase_command_count();
        log::info!("Erasing {} ({} sector erase commands)", chip, commands);
        progress.erasing(commands);

        let budget = self.options.poll_budget;
        let stream = &mut *self.stream;
        let mut current = EraseTarget::Sector0Low;
        let result = with_hold(&mut *self.transport, |t| {
            protocol::erase_chip(t, stream, chip, budget, |target, done| {
                current = target;
                progress.erase_progress(target, done);
            })
            .map_err(|(target, e)| {
                current = target;
                e
            })
        });

        match result {
            Ok(polls) => {
                self.status_polls += polls as u64;
                self.state = ProgramState::Idle;
                Ok(commands)
            }
            Err(e) => Err(self.fail(Step::Erase(current), e)),
        }
    }

    /// Write every record of `source`, starting at page 0
    ///
    /// The last record is zero-padded to a full page. Returns the number of
    /// pages written and the number of image bytes they carried.
    pub fn program_pages<S, P>(
        &mut self,
        source: &mut S,
        progress: &mut P,
    ) -> core::result::Result<(u32, usize), ProgramError>
    where
        S: PageSource + ?Sized,
        P: ProgramProgress + ?Sized,
    {
        progress.programming(source.len_hint());

        let budget = self.options.poll_budget;
        let mut buf = [0u8; PAGE_SIZE];
        let mut page = 0u32;
        let mut bytes = 0usize;

        loop {
            buf.fill(0);
            let n = match source.read_record(&mut buf) {
                Ok(n) => n.min(PAGE_SIZE),
                Err(e) => return Err(self.fail(Step::WritePage(page), e)),
            };
            if n == 0 {
                break;
            }

            let addr = match PageAddress::new(page) {
                Ok(addr) => addr,
                Err(e) => return Err(self.fail(Step::WritePage(page), e)),
            };

            self.state = ProgramState::Programming { page };
            log::debug!("Writing page {} ({} image bytes)", page, n);

            let stream = &mut *self.stream;
            let data = &buf;
            match with_hold(&mut *self.transport, |t| {
                protocol::write_page(t, stream, addr, data, budget)
            }) {
                Ok(polls) => self.status_polls += polls as u64,
                Err(e) => return Err(self.fail(Step::WritePage(page), e)),
            }

            progress.page_written(page, n);
            bytes += n;
            page += 1;
        }

        self.state = ProgramState::Idle;
        Ok((page, bytes))
    }

    /// Identify, erase and program `source` in one go
    pub fn run<S, P>(
        &mut self,
        source: &mut S,
        progress: &mut P,
    ) -> core::result::Result<ProgramStats, ProgramError>
    where
        S: PageSource + ?Sized,
        P: ProgramProgress + ?Sized,
    {
        let chip = self.identify()?;
        progress.identified(chip);

        // Refuse an image that cannot fit before erasing anything
        if let Some(len) = source.len_hint() {
            if len > MAX_IMAGE_SIZE {
                return Err(self.fail(
                    Step::WritePage(MAX_PAGES),
                    Error::PageOutOfRange { page: MAX_PAGES },
                ));
            }
        }

        let erase_commands = self.erase(chip, progress)?;
        let (pages_written, image_bytes) = self.program_pages(source, progress)?;

        let stats = ProgramStats {
            chip,
            erase_commands,
            pages_written,
            image_bytes,
            status_polls: self.status_polls,
        };
        log::info!(
            "Programmed {} pages ({} bytes) in {} status polls",
            stats.pages_written,
            stats.image_bytes,
            stats.status_polls
        );
        progress.complete(&stats);
        Ok(stats)
    }
}

/// Identify, erase and program `source` with a fresh stream and default
/// progress
pub fn program<T, S>(
    transport: &mut T,
    source: &mut S,
    options: ProgramOptions,
) -> core::result::Result<ProgramStats, ProgramError>
where
    T: GpioTransport + ?Sized,
    S: PageSource + ?Sized,
{
    let mut stream = BitbangStream::new();
    ProgramSession::new(transport, &mut stream, options).run(source, &mut NoProgress)
}

/// Identify the device behind `transport`
pub fn probe<T: GpioTransport + ?Sized>(transport: &mut T) -> Result<ChipModel> {
    let mut stream = BitbangStream::new();
    ProgramSession::new(transport, &mut stream, ProgramOptions::default())
        .identify()
        .map_err(|e| e.error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flash::SlicePages;
    use crate::gpio::GpioVector;
    use std::vec::Vec;

    /// Transport that always reads MISO high: every status read is ready and
    /// every identity is 0xFFFFFFFF
    #[derive(Default)]
    struct Floating {
        hold: Vec<bool>,
    }

    impl GpioTransport for Floating {
        fn assert_hold(&mut self) -> Result<()> {
            self.hold.push(true);
            Ok(())
        }

        fn release_hold(&mut self) -> Result<()> {
            self.hold.push(false);
            Ok(())
        }

        fn write(&mut self, _vectors: &[GpioVector]) -> Result<()> {
            Ok(())
        }

        fn read_pins(&mut self) -> Result<GpioVector> {
            Ok(GpioVector::MISO)
        }
    }

    #[test]
    fn test_unknown_device_stops_before_erase() {
        let mut t = Floating::default();
        let mut stream = BitbangStream::new();
        let mut session = ProgramSession::new(&mut t, &mut stream, ProgramOptions::default());
        let err = session
            .run(&mut SlicePages::new(&[1, 2, 3]), &mut NoProgress)
            .unwrap_err();
        assert_eq!(err.step, Step::Identify);
        assert_eq!(err.error, Error::UnsupportedDevice { id: 0xFFFF_FFFF });
        assert_eq!(session.state(), ProgramState::Failed { step: Step::Identify });
        // Hold was never asserted, only released
        assert_eq!(t.hold, [false]);
    }

    #[test]
    fn test_probe_maps_error() {
        let mut t = Floating::default();
        assert_eq!(
            probe(&mut t),
            Err(Error::UnsupportedDevice { id: 0xFFFF_FFFF })
        );
    }

    #[test]
    fn test_default_options() {
        assert_eq!(ProgramOptions::default().poll_budget, 300_000);
    }

    #[test]
    fn test_error_display() {
        let err = ProgramError::new(Step::WritePage(12), Error::PollTimeout { attempts: 300_000 });
        assert_eq!(
            std::format!("{}", err),
            "page 12 write failed: device not ready after 300000 status polls"
        );
        let err = ProgramError::new(
            Step::Erase(EraseTarget::Sector0High),
            Error::Transport,
        );
        assert_eq!(
            std::format!("{}", err),
            "erase of sector 0b failed: GPIO transport failure"
        );
    }
}
