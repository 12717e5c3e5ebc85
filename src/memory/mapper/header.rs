use crate::error::{
    EdgeError, RomTooSmallSnafu, UnsupportedCartridgeTypeSnafu, UnsupportedRamSizeSnafu, UnsupportedRomSizeSnafu,
};
use snafu::ensure;

const TITLE_START: usize = 0x134;
const TITLE_MAX_LENGTH: usize = 16;
const CARTRIDGE_TYPE_ADDRESS: usize = 0x147;
const ROM_SIZE_ADDRESS: usize = 0x148;
const RAM_SIZE_ADDRESS: usize = 0x149;

pub const ROM_BANK_SIZE: usize = 0x4000;
pub const RAM_BANK_SIZE: usize = 0x2000;
/// MBC2 carries 512 half bytes of built-in RAM.
pub const MBC2_RAM_SIZE: usize = 512 * 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapperKind {
    RomOnly,
    Mbc1,
    Mbc2,
    Mbc3,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartridgeHeader {
    pub title: String,
    pub cartridge_type: u8,
    pub rom_size_type: u8,
    pub ram_size_type: u8,
    pub kind: MapperKind,
}

impl CartridgeHeader {
    pub fn parse(rom: &[u8]) -> Result<CartridgeHeader, EdgeError> {
        ensure!(rom.len() > RAM_SIZE_ADDRESS, RomTooSmallSnafu { size: rom.len() });

        let title = rom[TITLE_START..TITLE_START + TITLE_MAX_LENGTH]
            .iter()
            .take_while(|byte| **byte != 0x00)
            .map(|byte| *byte as char)
            .collect::<String>();

        let cartridge_type = rom[CARTRIDGE_TYPE_ADDRESS];
        let kind = match cartridge_type {
            0x00 => MapperKind::RomOnly,
            0x01..=0x03 => MapperKind::Mbc1,
            0x05 | 0x06 => MapperKind::Mbc2,
            0x0f..=0x13 => MapperKind::Mbc3,
            value => return UnsupportedCartridgeTypeSnafu { value }.fail(),
        };

        let header = CartridgeHeader {
            title,
            cartridge_type,
            rom_size_type: rom[ROM_SIZE_ADDRESS],
            ram_size_type: rom[RAM_SIZE_ADDRESS],
            kind,
        };

        // Validate sizes up front so later lookups are infallible
        header.checked_rom_bank_count()?;
        header.checked_ram_size()?;

        Ok(header)
    }

    fn checked_rom_bank_count(&self) -> Result<usize, EdgeError> {
        match self.rom_size_type {
            value @ 0x00..=0x06 => Ok(2 << value),
            value => UnsupportedRomSizeSnafu { value }.fail(),
        }
    }

    fn checked_ram_size(&self) -> Result<usize, EdgeError> {
        if self.kind == MapperKind::Mbc2 {
            return Ok(MBC2_RAM_SIZE);
        }

        match self.ram_size_type {
            0x00 => Ok(0),
            0x02 => Ok(0x2000),
            0x03 => Ok(0x8000),
            0x04 => Ok(0x20000),
            0x05 => Ok(0x10000),
            value => UnsupportedRamSizeSnafu { value }.fail(),
        }
    }

    pub fn rom_bank_count(&self) -> usize {
        self.checked_rom_bank_count().unwrap_or(2)
    }

    pub fn rom_size(&self) -> usize {
        self.rom_bank_count() * ROM_BANK_SIZE
    }

    pub fn ram_size(&self) -> usize {
        self.checked_ram_size().unwrap_or(0)
    }

    pub fn has_battery(&self) -> bool {
        matches!(self.cartridge_type, 0x03 | 0x06 | 0x0f | 0x10 | 0x13)
    }

    pub fn has_rtc(&self) -> bool {
        self.kind == MapperKind::Mbc3
    }

    /// Game title with characters that are awkward in paths replaced.
    pub fn directory_name(&self) -> String {
        let name = self
            .title
            .trim()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect::<String>();

        if name.is_empty() {
            String::from("UNTITLED")
        } else {
            name
        }
    }

    pub fn describe(&self) -> String {
        format!(
            "\"{}\" type=${:02x} ({:?}) rom={} banks ram={} bytes battery={} rtc={}",
            self.title,
            self.cartridge_type,
            self.kind,
            self.rom_bank_count(),
            self.ram_size(),
            self.has_battery(),
            self.has_rtc()
        )
    }
}

#[cfg(test)]
pub(crate) fn rom_with_header(cartridge_type: u8, rom_size_type: u8, ram_size_type: u8) -> Vec<u8> {
    let mut rom = vec![0u8; ROM_BANK_SIZE * (2 << rom_size_type.min(6))];
    rom[TITLE_START..TITLE_START + 4].copy_from_slice(b"EDGE");
    rom[CARTRIDGE_TYPE_ADDRESS] = cartridge_type;
    rom[ROM_SIZE_ADDRESS] = rom_size_type;
    rom[RAM_SIZE_ADDRESS] = ram_size_type;
    // Tag every bank with its number so banking is observable
    for (bank, chunk) in rom.chunks_mut(ROM_BANK_SIZE).enumerate().skip(1) {
        chunk[0] = bank as u8;
    }
    rom
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_title_and_sizes() {
        let rom = rom_with_header(0x13, 0x02, 0x03);
        let header = CartridgeHeader::parse(&rom).unwrap();

        assert_eq!(header.title, "EDGE");
        assert_eq!(header.kind, MapperKind::Mbc3);
        assert_eq!(header.rom_bank_count(), 8);
        assert_eq!(header.ram_size(), 0x8000);
        assert!(header.has_battery());
        assert!(header.has_rtc());
    }

    #[test]
    fn mbc2_always_has_half_byte_ram() {
        let header = CartridgeHeader::parse(&rom_with_header(0x06, 0x00, 0x00)).unwrap();
        assert_eq!(header.ram_size(), MBC2_RAM_SIZE);
        assert!(header.has_battery());
    }

    #[test]
    fn rejects_unsupported_values() {
        assert!(matches!(
            CartridgeHeader::parse(&rom_with_header(0x19, 0x00, 0x00)),
            Err(EdgeError::UnsupportedCartridgeType { value: 0x19 })
        ));
        assert!(matches!(
            CartridgeHeader::parse(&rom_with_header(0x01, 0x00, 0x01)),
            Err(EdgeError::UnsupportedRamSize { value: 0x01 })
        ));

        let mut rom = rom_with_header(0x00, 0x00, 0x00);
        rom[ROM_SIZE_ADDRESS] = 0x52;
        assert!(matches!(
            CartridgeHeader::parse(&rom),
            Err(EdgeError::UnsupportedRomSize { value: 0x52 })
        ));
    }
}
