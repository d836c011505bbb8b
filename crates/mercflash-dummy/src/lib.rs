//! mercflash-dummy - Emulated Mercury board for testing
//!
//! This crate provides a [`GpioTransport`] that emulates the Mercury board
//! at the pin level: an SPI target that decodes the bit-bang vectors it is
//! fed, in front of an AT45DB DataFlash model held in memory. It's useful
//! for testing and development without real hardware.
//!
//! The emulation follows the vectors exactly: a command starts when the
//! flash is selected, MOSI is sampled on every rising clock edge, the
//! response is shifted out on MISO one bit per rising edge, and erase and
//! program commands take effect when the flash is deselected.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(feature = "alloc")]
use alloc::vec;
#[cfg(feature = "alloc")]
use alloc::vec::Vec;

use mercflash_core::chip::{ChipModel, EraseTarget, SECTOR0_LOW_PAGES};
use mercflash_core::error::{Error, Result};
use mercflash_core::gpio::{GpioVector, Selector};
use mercflash_core::programmer::GpioTransport;
use mercflash_core::spi::{opcodes, PAGE_SIZE};

/// Configuration for the emulated board
#[derive(Debug, Clone)]
pub struct DummyConfig {
    /// Device behind the flash chip select
    pub chip: ChipModel,
    /// Bytes returned by the identify command
    pub id: [u8; 4],
    /// Status reads that report busy after each sector erase
    pub erase_busy_polls: u32,
    /// Status reads that report busy after each page program
    pub program_busy_polls: u32,
    /// Never report ready
    pub never_ready: bool,
    /// Fail every transport write after this many have succeeded
    pub fail_after_writes: Option<usize>,
    /// Byte the memory array holds before anything is erased
    pub initial_fill: u8,
}

impl DummyConfig {
    /// Configuration for a board fitted with `chip`
    pub fn new(chip: ChipModel) -> Self {
        Self {
            chip,
            id: default_id(chip),
            erase_busy_polls: 0,
            program_busy_polls: 0,
            never_ready: false,
            fail_after_writes: None,
            initial_fill: 0x00,
        }
    }
}

impl Default for DummyConfig {
    fn default() -> Self {
        Self::new(ChipModel::At45db081)
    }
}

/// Identify response of a genuine part
pub fn default_id(chip: ChipModel) -> [u8; 4] {
    match chip {
        ChipModel::At45db021 => [0x1F, 0x23, 0x00, 0x00],
        ChipModel::At45db081 => [0x1F, 0x25, 0x00, 0x01],
    }
}

/// Density bits of the status register
fn density_bits(chip: ChipModel) -> u8 {
    match chip {
        ChipModel::At45db021 => 0x14,
        ChipModel::At45db081 => 0x24,
    }
}

/// Something the emulated board observed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// The FPGA was held off the bus
    HoldAsserted,
    /// The hold line was released
    HoldReleased,
    /// A flash command completed (status reads are only counted)
    Command {
        /// Opcode
        opcode: u8,
        /// The three address bytes, zero for commands without an address
        address: [u8; 3],
        /// Bytes clocked after the opcode and address
        payload: usize,
        /// Whether the FPGA was held off the bus when the command ran
        held: bool,
    },
    /// A vector selected both targets at once
    BusConflict,
}

/// Emulated Mercury board
#[cfg(feature = "alloc")]
pub struct DummyMercury {
    config: DummyConfig,
    memory: Vec<u8>,
    buffer: [u8; PAGE_SIZE],
    held: bool,
    last: GpioVector,
    // Command in progress
    mosi: Vec<u8>,
    shift_in: u8,
    bits_in: u8,
    response: Vec<u8>,
    miso_pos: usize,
    // Device state
    busy_remaining: u32,
    status_reads: u64,
    writes: usize,
    events: Vec<Event>,
}

#[cfg(feature = "alloc")]
impl DummyMercury {
    /// Create a board with the given configuration
    pub fn new(config: DummyConfig) -> Self {
        let memory = vec![config.initial_fill; config.chip.total_size() as usize];
        Self {
            config,
            memory,
            buffer: [0; PAGE_SIZE],
            held: false,
            last: Selector::Idle.pins(),
            mosi: Vec::new(),
            shift_in: 0,
            bits_in: 0,
            response: Vec::new(),
            miso_pos: 0,
            busy_remaining: 0,
            status_reads: 0,
            writes: 0,
            events: Vec::new(),
        }
    }

    /// Create a board with an AT45DB081 and no busy time
    pub fn new_default() -> Self {
        Self::new(DummyConfig::default())
    }

    /// Get the configuration
    pub fn config(&self) -> &DummyConfig {
        &self.config
    }

    /// The whole memory array
    pub fn memory(&self) -> &[u8] {
        &self.memory
    }

    /// Contents of one page
    pub fn page(&self, page: u32) -> &[u8] {
        let start = page as usize * PAGE_SIZE;
        &self.memory[start..start + PAGE_SIZE]
    }

    /// Everything observed so far
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Completed flash commands, in order
    pub fn commands(&self) -> impl Iterator<Item = &Event> + '_ {
        self.events
            .iter()
            .filter(|e| matches!(e, Event::Command { .. }))
    }

    /// Status register reads served
    pub fn status_reads(&self) -> u64 {
        self.status_reads
    }

    /// Transport writes accepted
    pub fn write_calls(&self) -> usize {
        self.writes
    }

    /// Whether the FPGA is currently held off the bus
    pub fn is_held(&self) -> bool {
        self.held
    }

    fn flash_selected(pins: GpioVector) -> bool {
        Selector::from_pins(pins) == Some(Selector::Flash)
    }

    fn step(&mut self, v: GpioVector) {
        if Selector::from_pins(v).is_none() {
            log::warn!("dummy: both targets selected by vector 0x{:02X}", v.bits());
            self.events.push(Event::BusConflict);
        }

        let was = Self::flash_selected(self.last);
        let now = Self::flash_selected(v);

        if now && !was {
            self.begin_command();
        } else if was && !now {
            self.end_command();
        }

        let rising = v.contains(GpioVector::SCLK) && !self.last.contains(GpioVector::SCLK);
        if now && rising {
            self.clock_edge(v.contains(GpioVector::MOSI));
        }

        self.last = v;
    }

    fn begin_command(&mut self) {
        self.mosi.clear();
        self.shift_in = 0;
        self.bits_in = 0;
        self.response.clear();
        self.miso_pos = 0;
    }

    fn clock_edge(&mut self, mosi: bool) {
        let opcode_done = self.mosi.is_empty() && self.bits_in == 7;

        self.shift_in = (self.shift_in << 1) | mosi as u8;
        self.bits_in += 1;
        if self.bits_in == 8 {
            self.mosi.push(self.shift_in);
            self.shift_in = 0;
            self.bits_in = 0;
        }

        if opcode_done {
            self.load_response();
        } else if !self.response.is_empty() {
            self.miso_pos += 1;
        }
    }

    fn load_response(&mut self) {
        match self.mosi[0] {
            opcodes::IDENTIFY => self.response = self.config.id.to_vec(),
            opcodes::READ_STATUS => {
                self.status_reads += 1;
                let mut status = density_bits(self.config.chip);
                if self.config.never_ready {
                    // busy forever
                } else if self.busy_remaining > 0 {
                    self.busy_remaining -= 1;
                } else {
                    status |= opcodes::STATUS_READY;
                }
                self.response = vec![status];
            }
            _ => {}
        }
    }

    fn miso(&self) -> bool {
        if !Self::flash_selected(self.last) {
            return false;
        }
        self.response
            .get(self.miso_pos / 8)
            .is_some_and(|b| b & (0x80 >> (self.miso_pos % 8)) != 0)
    }

    fn end_command(&mut self) {
        let Some(&opcode) = self.mosi.first() else {
            return;
        };
        if opcode == opcodes::READ_STATUS {
            return;
        }

        let frame = match opcode {
            opcodes::IDENTIFY => 1,
            _ => 4,
        };
        let mut address = [0u8; 3];
        if frame == 4 && self.mosi.len() >= 4 {
            address.copy_from_slice(&self.mosi[1..4]);
        }
        let payload = self.mosi.len().saturating_sub(frame);
        let page = (((address[0] as u32) << 7) | ((address[1] as u32) >> 1))
            % self.config.chip.page_count();

        match opcode {
            opcodes::IDENTIFY => {}
            opcodes::SECTOR_ERASE => {
                let target = self.sector_of(page);
                let range = target.pages(self.config.chip);
                log::debug!("dummy: erasing {} (pages {:?})", target, range);
                let start = range.start as usize * PAGE_SIZE;
                let end = range.end as usize * PAGE_SIZE;
                self.memory[start..end].fill(0xFF);
                self.busy_remaining = self.config.erase_busy_polls;
            }
            opcodes::BUFFER1_WRITE => {
                let offset = ((address[1] as usize & 0x01) << 8) | address[2] as usize;
                for (i, &byte) in self.mosi.get(4..).unwrap_or(&[]).iter().enumerate() {
                    self.buffer[(offset + i) % PAGE_SIZE] = byte;
                }
            }
            opcodes::BUFFER1_TO_PAGE_ERASE => {
                log::debug!("dummy: programming page {}", page);
                let start = page as usize * PAGE_SIZE;
                self.memory[start..start + PAGE_SIZE].copy_from_slice(&self.buffer);
                self.busy_remaining = self.config.program_busy_polls;
            }
            other => log::warn!("dummy: ignoring unknown opcode 0x{:02X}", other),
        }

        self.events.push(Event::Command {
            opcode,
            address,
            payload,
            held: self.held,
        });
    }

    fn sector_of(&self, page: u32) -> EraseTarget {
        let per_sector = self.config.chip.pages_per_sector();
        if page < SECTOR0_LOW_PAGES {
            EraseTarget::Sector0Low
        } else if page < per_sector {
            EraseTarget::Sector0High
        } else {
            EraseTarget::Sector((page / per_sector) as u8)
        }
    }
}

#[cfg(feature = "alloc")]
impl GpioTransport for DummyMercury {
    fn assert_hold(&mut self) -> Result<()> {
        self.held = true;
        self.events.push(Event::HoldAsserted);
        Ok(())
    }

    fn release_hold(&mut self) -> Result<()> {
        self.held = false;
        self.events.push(Event::HoldReleased);
        Ok(())
    }

    fn write(&mut self, vectors: &[GpioVector]) -> Result<()> {
        if let Some(limit) = self.config.fail_after_writes {
            if self.writes >= limit {
                log::error!("dummy: injected write failure after {} writes", limit);
                return Err(Error::Transport);
            }
        }
        self.writes += 1;
        for &v in vectors {
            self.step(v);
        }
        Ok(())
    }

    fn read_pins(&mut self) -> Result<GpioVector> {
        let mut pins = self.last;
        pins.set(GpioVector::MISO, self.miso());
        Ok(pins)
    }
}
