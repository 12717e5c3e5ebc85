use crate::memory::mapper::battery::CartridgeRam;
use crate::memory::mapper::{
    checked_rom_bank, ram_enable_value, read_banked_rom, Mapper, MapperState, EXTERNAL_RAM_RANGE, ROM_SLOT_0_RANGE,
    ROM_SLOT_1_RANGE,
};
use crate::memory::EXTERNAL_RAM_START;
use log::debug;

// Address bit 8 picks between the two registers in $0000-$3fff
const REGISTER_SELECT_BIT: u16 = 0x0100;
const RAM_ADDRESS_MASK: usize = 0x01ff;

pub struct Mbc2 {
    rom: Vec<u8>,
    bank_count: usize,
    rom_bank: u8,
    ram: CartridgeRam,
    ram_enabled: bool,
}

impl Mbc2 {
    pub fn new(rom: Vec<u8>, bank_count: usize, ram: CartridgeRam) -> Mbc2 {
        Mbc2 {
            rom,
            bank_count,
            rom_bank: 1,
            ram,
            ram_enabled: false,
        }
    }

    /// 512 half bytes, echoed through the whole external RAM window.
    #[inline]
    fn ram_offset(addr: u16) -> usize {
        (addr - EXTERNAL_RAM_START) as usize & RAM_ADDRESS_MASK
    }
}

impl Mapper for Mbc2 {
    #[inline]
    fn read(&self, addr: u16) -> u8 {
        match addr {
            addr if ROM_SLOT_0_RANGE.contains(&addr) => self.rom[addr as usize],
            addr if ROM_SLOT_1_RANGE.contains(&addr) => read_banked_rom(&self.rom, self.rom_bank as u16, addr),
            addr if EXTERNAL_RAM_RANGE.contains(&addr) => {
                if !self.ram_enabled {
                    return 0xff;
                }
                // Only the low nibble exists
                self.ram.get(Mbc2::ram_offset(addr)).map(|byte| byte & 0x0f).unwrap_or(0xff)
            }
            _ => panic!("MBC2: read from unmapped cartridge address ${:04x}", addr),
        }
    }

    #[inline]
    fn write(&mut self, addr: u16, data: u8) {
        match addr {
            0x0000..=0x3fff if addr & REGISTER_SELECT_BIT == 0 => {
                self.ram_enabled = ram_enable_value(data);
                debug!("MBC2: RAM enabled: {}", self.ram_enabled);
            }
            0x0000..=0x3fff => {
                self.rom_bank = checked_rom_bank("MBC2", (data & 0x0f) as u16, self.bank_count) as u8;
                debug!("MBC2: Switched to ROM bank {}", self.rom_bank);
            }
            0x4000..=0x7fff => debug!("MBC2: ignoring write of ${:02x} to ${:04x}", data, addr),
            addr if EXTERNAL_RAM_RANGE.contains(&addr) => {
                if !self.ram_enabled {
                    return;
                }
                if let Some(byte) = self.ram.get_mut(Mbc2::ram_offset(addr)) {
                    *byte = data & 0x0f;
                }
            }
            _ => panic!("MBC2: write to unmapped cartridge address ${:04x}", addr),
        }
    }

    fn ram(&self) -> &CartridgeRam {
        &self.ram
    }

    fn ram_mut(&mut self) -> &mut CartridgeRam {
        &mut self.ram
    }

    fn state(&self) -> MapperState {
        MapperState {
            rom_bank: self.rom_bank,
            ram_select: 0,
            ram_enabled: self.ram_enabled,
            banking_mode: 0,
        }
    }

    fn set_state(&mut self, state: &MapperState) {
        self.rom_bank = state.rom_bank & 0x0f;
        self.ram_enabled = state.ram_enabled;
    }

    #[inline]
    fn current_rom_bank(&self) -> u16 {
        self.rom_bank as u16
    }

    #[inline]
    fn current_ram_bank(&self) -> u8 {
        0
    }

    #[inline]
    fn name(&self) -> String {
        String::from("MBC2")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::mapper::header::{rom_with_header, MBC2_RAM_SIZE};

    fn mbc2() -> Mbc2 {
        Mbc2::new(rom_with_header(0x06, 0x03, 0x00), 16, CartridgeRam::volatile(MBC2_RAM_SIZE))
    }

    #[test]
    fn address_bit_8_selects_register() {
        let mut mbc = mbc2();
        mbc.write(0x2100, 0x07);
        assert_eq!(mbc.read(0x4000), 7);
        assert!(!mbc.ram_enabled);

        mbc.write(0x0000, 0x0a);
        assert!(mbc.ram_enabled);
        assert_eq!(mbc.current_rom_bank(), 7);

        mbc.write(0x0100, 0x00);
        assert_eq!(mbc.current_rom_bank(), 1);
    }

    #[test]
    fn ram_holds_half_bytes() {
        let mut mbc = mbc2();
        mbc.write(0x0000, 0x0a);
        mbc.write(0xa010, 0xab);

        assert_eq!(mbc.read(0xa010), 0x0b);
        assert_eq!(mbc.read(0xa210), 0x0b);
    }
}
