//! Device variants and erase regions

use core::fmt;

use crate::error::{Error, Result};
use crate::spi::{FlashCommand, PAGE_SIZE};

/// Pages in each half of sector 0 ("0a" is the low half)
pub const SECTOR0_LOW_PAGES: u32 = 8;

/// A DataFlash variant the programmer knows how to erase and program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChipModel {
    /// AT45DB021, 2 Mbit, 8 sectors
    At45db021,
    /// AT45DB081, 8 Mbit, 16 sectors
    At45db081,
}

impl ChipModel {
    /// All supported variants
    pub const ALL: [ChipModel; 2] = [ChipModel::At45db021, ChipModel::At45db081];

    /// Match the low 16 bits of an identify response
    pub fn from_id(id: u32) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|chip| chip.device_id() == (id & 0xFFFF) as u16)
            .ok_or(Error::UnsupportedDevice { id })
    }

    /// Manufacturer byte (low) and density byte (high) of the identify
    /// response
    pub const fn device_id(self) -> u16 {
        match self {
            Self::At45db021 => 0x231F,
            Self::At45db081 => 0x251F,
        }
    }

    /// Part name
    pub const fn name(self) -> &'static str {
        match self {
            Self::At45db021 => "AT45DB021",
            Self::At45db081 => "AT45DB081",
        }
    }

    /// Number of erase sectors (sector 0 counts once)
    pub const fn sector_count(self) -> u8 {
        match self {
            Self::At45db021 => 8,
            Self::At45db081 => 16,
        }
    }

    /// Number of pages in the device
    pub const fn page_count(self) -> u32 {
        match self {
            Self::At45db021 => 1024,
            Self::At45db081 => 4096,
        }
    }

    /// Number of pages in each sector from 1 upwards
    pub const fn pages_per_sector(self) -> u32 {
        self.page_count() / self.sector_count() as u32
    }

    /// Device capacity in bytes
    pub const fn total_size(self) -> u32 {
        self.page_count() * PAGE_SIZE as u32
    }

    /// First address byte of the erase command for sector `n` (n >= 1)
    ///
    /// The larger part has more page address bits, so its sectors start one
    /// address bit higher.
    pub const fn sector_address(self, n: u8) -> u8 {
        match self {
            Self::At45db021 => n,
            Self::At45db081 => n << 1,
        }
    }

    /// Erase regions in the order they must be erased
    pub fn erase_targets(self) -> impl Iterator<Item = EraseTarget> {
        [EraseTarget::Sector0Low, EraseTarget::Sector0High]
            .into_iter()
            .chain((1..self.sector_count()).map(EraseTarget::Sector))
    }

    /// Number of erase commands a full erase issues
    pub const fn erase_command_count(self) -> u32 {
        self.sector_count() as u32 + 1
    }
}

impl fmt::Display for ChipModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One region erased by a single sector-erase command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EraseTarget {
    /// Sector 0a, the first eight pages
    Sector0Low,
    /// Sector 0b, the rest of sector 0
    Sector0High,
    /// Sector n, n >= 1
    Sector(u8),
}

impl EraseTarget {
    /// The erase command for this region on `chip`
    pub const fn command(self, chip: ChipModel) -> FlashCommand {
        match self {
            Self::Sector0Low => FlashCommand::sector_erase(0x00, 0x00),
            Self::Sector0High => FlashCommand::sector_erase(0x00, 0x10),
            Self::Sector(n) => FlashCommand::sector_erase(chip.sector_address(n), 0x00),
        }
    }

    /// Range of pages this region covers on `chip`
    pub const fn pages(self, chip: ChipModel) -> core::ops::Range<u32> {
        let per_sector = chip.pages_per_sector();
        match self {
            Self::Sector0Low => 0..SECTOR0_LOW_PAGES,
            Self::Sector0High => SECTOR0_LOW_PAGES..per_sector,
            Self::Sector(n) => (n as u32 * per_sector)..((n as u32 + 1) * per_sector),
        }
    }
}

impl fmt::Display for EraseTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sector0Low => write!(f, "sector 0a"),
            Self::Sector0High => write!(f, "sector 0b"),
            Self::Sector(n) => write!(f, "sector {}", n),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::vec::Vec;

    #[test]
    fn test_from_id() {
        assert_eq!(ChipModel::from_id(0x0000_231F), Ok(ChipModel::At45db021));
        assert_eq!(ChipModel::from_id(0x0100_251F), Ok(ChipModel::At45db081));
        // Upper bytes are ignored
        assert_eq!(ChipModel::from_id(0xDEAD_251F), Ok(ChipModel::At45db081));
        assert_eq!(
            ChipModel::from_id(0x0000_261F),
            Err(Error::UnsupportedDevice { id: 0x261F })
        );
        assert_eq!(
            ChipModel::from_id(0xFFFF_FFFF),
            Err(Error::UnsupportedDevice { id: 0xFFFF_FFFF })
        );
    }

    #[test]
    fn test_sector_address_mapping() {
        for i in 1..16u8 {
            assert_eq!(ChipModel::At45db081.sector_address(i), i << 1);
        }
        for i in 1..8u8 {
            assert_eq!(ChipModel::At45db021.sector_address(i), i);
        }
    }

    #[test]
    fn test_erase_order() {
        let targets: Vec<_> = ChipModel::At45db021.erase_targets().collect();
        assert_eq!(targets.len(), 9);
        assert_eq!(targets[0], EraseTarget::Sector0Low);
        assert_eq!(targets[1], EraseTarget::Sector0High);
        assert_eq!(&targets[2..], &(1..8).map(EraseTarget::Sector).collect::<Vec<_>>()[..]);
        assert_eq!(ChipModel::At45db081.erase_targets().count(), 17);
        assert_eq!(ChipModel::At45db081.erase_command_count(), 17);
    }

    #[test]
    fn test_erase_commands() {
        let chip = ChipModel::At45db081;
        assert_eq!(
            EraseTarget::Sector0Low.command(chip).bytes(),
            &[0x7C, 0x00, 0x00, 0x00]
        );
        assert_eq!(
            EraseTarget::Sector0High.command(chip).bytes(),
            &[0x7C, 0x00, 0x10, 0x00]
        );
        assert_eq!(
            EraseTarget::Sector(3).command(chip).bytes(),
            &[0x7C, 0x06, 0x00, 0x00]
        );
        assert_eq!(
            EraseTarget::Sector(3).command(ChipModel::At45db021).bytes(),
            &[0x7C, 0x03, 0x00, 0x00]
        );
    }

    #[test]
    fn test_erase_regions_cover_device() {
        for chip in ChipModel::ALL {
            let mut next = 0;
            for target in chip.erase_targets() {
                let pages = target.pages(chip);
                assert_eq!(pages.start, next, "{} on {}", target, chip);
                next = pages.end;
            }
            assert_eq!(next, chip.page_count());
        }
    }

    #[test]
    fn test_sizes() {
        assert_eq!(ChipModel::At45db021.total_size(), 270_336);
        assert_eq!(ChipModel::At45db081.total_size(), 1_081_344);
    }

    #[test]
    fn test_erase_target_display() {
        assert_eq!(std::format!("{}", EraseTarget::Sector0Low), "sector 0a");
        assert_eq!(std::format!("{}", EraseTarget::Sector0High), "sector 0b");
        assert_eq!(std::format!("{}", EraseTarget::Sector(7)), "sector 7");
    }
}
