use crate::error::{EdgeError, RomSizeMismatchSnafu, SaveStateRamSizeSnafu};
use crate::memory::addressable::Addressable;
use crate::memory::mapper::battery::CartridgeRam;
use crate::memory::mapper::header::{CartridgeHeader, MapperKind, ROM_BANK_SIZE};
use crate::memory::mapper::mbc1::Mbc1;
use crate::memory::mapper::mbc2::Mbc2;
use crate::memory::mapper::mbc3::Mbc3;
use crate::memory::mapper::rom::Rom;
use crate::memory::mapper::rtc::{Rtc, RtcState};
use log::{info, warn};
use snafu::ensure;
use std::path::Path;

pub mod battery;
pub mod header;
pub mod mbc1;
pub mod mbc2;
pub mod mbc3;
pub mod rom;
pub mod rtc;

pub const RAM_ENABLE_RANGE: std::ops::RangeInclusive<u16> = 0x0000..=0x1fff;
pub const ROM_BANK_RANGE: std::ops::RangeInclusive<u16> = 0x2000..=0x3fff;
pub const SECONDARY_BANK_RANGE: std::ops::RangeInclusive<u16> = 0x4000..=0x5fff;
pub const BANKING_MODE_RANGE: std::ops::RangeInclusive<u16> = 0x6000..=0x7fff;
pub const ROM_SLOT_0_RANGE: std::ops::RangeInclusive<u16> = 0x0000..=0x3fff;
pub const ROM_SLOT_1_RANGE: std::ops::RangeInclusive<u16> = 0x4000..=0x7fff;
pub const EXTERNAL_RAM_RANGE: std::ops::RangeInclusive<u16> = 0xa000..=0xbfff;

/// Bank registers as seen by save states.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MapperState {
    pub rom_bank: u8,
    pub ram_select: u8,
    pub ram_enabled: bool,
    pub banking_mode: u8,
}

pub trait Mapper {
    fn read(&self, addr: u16) -> u8;
    fn write(&mut self, addr: u16, data: u8);
    fn ram(&self) -> &CartridgeRam;
    fn ram_mut(&mut self) -> &mut CartridgeRam;
    fn state(&self) -> MapperState;
    fn set_state(&mut self, state: &MapperState);
    fn current_rom_bank(&self) -> u16;
    fn current_ram_bank(&self) -> u8;
    fn name(&self) -> String;

    fn rtc(&self) -> Option<&Rtc> {
        None
    }

    fn rtc_mut(&mut self) -> Option<&mut Rtc> {
        None
    }
}

/// Writes a byte above $0a are treated as $00, only a low nibble of $a enables RAM.
#[inline]
pub(crate) fn ram_enable_value(data: u8) -> bool {
    let data = if data > 0x0a { 0x00 } else { data };
    data & 0x0f == 0x0a
}

/// Bank 0 is always mapped at $0000, asking for it in the switchable slot selects bank 1.
/// A bank past the end of the ROM is an emulator bug, not a game quirk.
#[inline]
pub(crate) fn checked_rom_bank(name: &str, bank: u16, bank_count: usize) -> u16 {
    let bank = if bank == 0 { 1 } else { bank };
    if bank as usize >= bank_count {
        panic!("{}: ROM bank {} out of range, cartridge has {} banks", name, bank, bank_count);
    }
    bank
}

#[inline]
pub(crate) fn read_banked_rom(rom: &[u8], bank: u16, addr: u16) -> u8 {
    let offset = (addr as usize % ROM_BANK_SIZE) + bank as usize * ROM_BANK_SIZE;
    rom.get(offset).copied().unwrap_or(0xff)
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CartridgeState {
    pub rtc: RtcState,
    pub mapper: MapperState,
    pub ram: Vec<u8>,
}

pub struct Cartridge {
    header: CartridgeHeader,
    mapper: Box<dyn Mapper>,
}

impl Cartridge {
    /// Parses the header and builds the matching mapper. Battery backed RAM lives in
    /// `ram_directory` when one is given, otherwise it is only kept in memory.
    pub fn new(rom: Vec<u8>, ram_directory: Option<&Path>) -> Result<Cartridge, EdgeError> {
        let header = CartridgeHeader::parse(&rom)?;
        ensure!(
            rom.len() >= header.rom_size(),
            RomSizeMismatchSnafu {
                expected: header.rom_size(),
                actual: rom.len()
            }
        );
        if rom.len() > header.rom_size() {
            warn!(
                "ROM is {} bytes but header declares {}, ignoring the excess",
                rom.len(),
                header.rom_size()
            );
        }

        let ram = match ram_directory {
            Some(directory) if header.has_battery() => CartridgeRam::battery(directory, header.ram_size())?,
            _ => CartridgeRam::volatile(header.ram_size()),
        };

        let bank_count = header.rom_bank_count();
        let mapper: Box<dyn Mapper> = match header.kind {
            MapperKind::RomOnly => Box::new(Rom::new(rom, ram)),
            MapperKind::Mbc1 => Box::new(Mbc1::new(rom, bank_count, ram)),
            MapperKind::Mbc2 => Box::new(Mbc2::new(rom, bank_count, ram)),
            MapperKind::Mbc3 => Box::new(Mbc3::new(rom, bank_count, ram)),
        };

        info!("Loaded cartridge {} using {}", header.describe(), mapper.name());

        Ok(Cartridge { header, mapper })
    }

    #[inline]
    pub fn header(&self) -> &CartridgeHeader {
        &self.header
    }

    pub fn title(&self) -> &str {
        &self.header.title
    }

    pub fn current_rom_bank(&self) -> u16 {
        self.mapper.current_rom_bank()
    }

    pub fn current_ram_bank(&self) -> u8 {
        self.mapper.current_ram_bank()
    }

    pub fn rtc(&self) -> Option<&Rtc> {
        self.mapper.rtc()
    }

    pub fn rtc_mut(&mut self) -> Option<&mut Rtc> {
        self.mapper.rtc_mut()
    }

    /// Flushes battery backed RAM to disk.
    pub fn sync_ram(&mut self) -> Result<(), EdgeError> {
        self.mapper.ram_mut().flush()
    }

    pub fn state(&self) -> CartridgeState {
        CartridgeState {
            rtc: self.mapper.rtc().map(|rtc| rtc.state()).unwrap_or_default(),
            mapper: self.mapper.state(),
            ram: self.mapper.ram().to_vec(),
        }
    }

    pub fn set_state(&mut self, state: &CartridgeState) -> Result<(), EdgeError> {
        let expected = self.mapper.ram().len();
        ensure!(
            state.ram.len() == expected,
            SaveStateRamSizeSnafu {
                found: state.ram.len(),
                expected
            }
        );

        self.mapper.ram_mut().copy_from_slice(&state.ram);
        self.mapper.set_state(&state.mapper);
        if let Some(rtc) = self.mapper.rtc_mut() {
            rtc.set_state(&state.rtc);
        }

        Ok(())
    }
}

impl Addressable for Cartridge {
    #[inline]
    fn read(&self, addr: u16) -> u8 {
        self.mapper.read(addr)
    }

    #[inline]
    fn write(&mut self, addr: u16, data: u8) {
        self.mapper.write(addr, data)
    }
}
