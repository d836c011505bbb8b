//! FT232R asynchronous bit-bang transport
//!
//! The data bus of the FT232R is driven directly: every byte written is
//! latched onto D0..D7 in turn, and the direction mask decides which of
//! those lines are outputs. Holding the FPGA off the bus is done by adding
//! the PROG line to the direction mask, so the hold needs no data write.

use std::io::Write;
use std::os::raw::{c_char, c_int};
use std::ptr;

use ftdi::{find_by_vid_pid, BitMode, Device, Interface};
use mercflash_core::error::{Error as CoreError, Result as CoreResult};
use mercflash_core::gpio::{GpioVector, Selector, HOLD_DIRECTION, OUTPUT_DIRECTION};
use mercflash_core::programmer::GpioTransport;

use crate::config::{FtdiConfig, FtdiInterface};
use crate::error::{FtdiError, Result};

/// Mercury board behind an FT232R in asynchronous bit-bang mode
pub struct MercuryFtdi {
    /// libftdi device context
    device: Device,
}

impl MercuryFtdi {
    /// Open the board, release the hold and deselect both targets
    ///
    /// A device whose product string does not match the configured
    /// description is closed again without being driven.
    pub fn open(config: &FtdiConfig) -> Result<Self> {
        log::info!(
            "Opening {:04X}:{:04X} channel {} (product '{}')",
            config.vendor_id,
            config.product_id,
            config.interface.letter(),
            config.description.as_deref().unwrap_or("*")
        );

        let interface = match config.interface {
            FtdiInterface::A => Interface::A,
            FtdiInterface::B => Interface::B,
            FtdiInterface::C => Interface::C,
            FtdiInterface::D => Interface::D,
        };

        let mut device = find_by_vid_pid(config.vendor_id, config.product_id)
            .interface(interface)
            .open()
            .map_err(|e| FtdiError::OpenFailed {
                vid: config.vendor_id,
                pid: config.product_id,
                reason: e.to_string(),
            })?;

        let (product, serial) = device_strings(&mut device)?;
        if !config.accepts_product(&product) {
            return Err(FtdiError::WrongDevice {
                expected: config.description.clone().unwrap_or_default(),
                found: product,
                serial,
            });
        }
        log::info!("Found '{}', serial number {}", product, serial);

        let mut ftdi = MercuryFtdi { device };

        ftdi.device
            .set_baud_rate(config.baud_rate)
            .map_err(|e| FtdiError::ConfigFailed(format!("Set baud rate failed: {}", e)))?;
        log::debug!("Bit-bang clock set to {} baud", config.baud_rate);

        ftdi.set_direction(OUTPUT_DIRECTION)?;
        ftdi.send(&[Selector::Idle.pins().bits()])?;

        Ok(ftdi)
    }

    /// Open the board with default settings
    pub fn open_default() -> Result<Self> {
        Self::open(&FtdiConfig::default())
    }

    fn set_direction(&mut self, direction: GpioVector) -> Result<()> {
        self.device
            .set_bitmode(direction.bits(), BitMode::Bitbang)
            .map_err(|e| FtdiError::ConfigFailed(format!("Set bit-bang mode failed: {}", e)))
    }

    /// Send data to the FTDI device
    fn send(&mut self, data: &[u8]) -> Result<()> {
        self.device
            .write_all(data)
            .map_err(|e| FtdiError::TransferFailed(format!("Write failed: {}", e)))?;
        log::trace!("Sent {} bytes", data.len());
        Ok(())
    }

    /// Sample the data bus
    fn pins(&mut self) -> Result<u8> {
        let mut pins = 0u8;
        // SAFETY: the context pointer is owned by `self.device` and stays
        // valid for its lifetime; `pins` is a valid out-pointer.
        let rc = unsafe {
            libftdi1_sys::ftdi_read_pins(self.device.libftdi_context(), &mut pins)
        };
        if rc < 0 {
            return Err(FtdiError::ReadPinsFailed(rc));
        }
        Ok(pins)
    }
}

/// Product and serial strings as programmed into the FT232R EEPROM
fn device_strings(device: &mut Device) -> Result<(String, String)> {
    let mut product = [0 as c_char; 128];
    let mut serial = [0 as c_char; 64];
    let ctx = device.libftdi_context();
    // SAFETY: the context is owned by `device` and open; the buffers are
    // valid for the lengths passed and libftdi accepts a null manufacturer.
    let rc = unsafe {
        match libftdi1_sys::ftdi_read_eeprom(ctx) {
            rc if rc < 0 => rc,
            _ => match libftdi1_sys::ftdi_eeprom_decode(ctx, 0) {
                rc if rc < 0 => rc,
                _ => libftdi1_sys::ftdi_eeprom_get_strings(
                    ctx,
                    ptr::null_mut(),
                    0,
                    product.as_mut_ptr(),
                    product.len() as c_int,
                    serial.as_mut_ptr(),
                    serial.len() as c_int,
                ),
            },
        }
    };
    if rc < 0 {
        return Err(FtdiError::EepromFailed(rc));
    }
    Ok((c_string(&product), c_string(&serial)))
}

fn c_string(buf: &[c_char]) -> String {
    let bytes: Vec<u8> = buf.iter().take_while(|&&c| c != 0).map(|&c| c as u8).collect();
    String::from_utf8_lossy(&bytes).into_owned()
}

impl Drop for MercuryFtdi {
    fn drop(&mut self) {
        // Leave the FPGA free to use the bus on close
        if let Err(e) = self.set_direction(OUTPUT_DIRECTION) {
            log::warn!("Failed to release hold on close: {}", e);
        }
        if let Err(e) = self.send(&[Selector::Idle.pins().bits()]) {
            log::warn!("Failed to deselect on close: {}", e);
        }
    }
}

fn transport_error(e: FtdiError) -> CoreError {
    log::error!("{}", e);
    CoreError::Transport
}

impl GpioTransport for MercuryFtdi {
    fn assert_hold(&mut self) -> CoreResult<()> {
        self.set_direction(HOLD_DIRECTION).map_err(transport_error)
    }

    fn release_hold(&mut self) -> CoreResult<()> {
        self.set_direction(OUTPUT_DIRECTION).map_err(transport_error)
    }

    fn write(&mut self, vectors: &[GpioVector]) -> CoreResult<()> {
        let bytes: Vec<u8> = vectors.iter().map(|v| v.bits()).collect();
        self.send(&bytes).map_err(transport_error)
    }

    fn read_pins(&mut self) -> CoreResult<GpioVector> {
        self.pins()
            .map(GpioVector::from_bits_truncate)
            .map_err(transport_error)
    }
}
