use crate::memory::mapper::battery::CartridgeRam;
use crate::memory::mapper::header::RAM_BANK_SIZE;
use crate::memory::mapper::{
    checked_rom_bank, ram_enable_value, read_banked_rom, Mapper, MapperState, BANKING_MODE_RANGE,
    EXTERNAL_RAM_RANGE, RAM_ENABLE_RANGE, ROM_BANK_RANGE, ROM_SLOT_0_RANGE, ROM_SLOT_1_RANGE,
    SECONDARY_BANK_RANGE,
};
use crate::memory::EXTERNAL_RAM_START;
use log::debug;

pub struct Mbc1 {
    rom: Vec<u8>,
    bank_count: usize,
    rom_bank: u8,
    secondary_bank: u8,
    ram: CartridgeRam,
    ram_enabled: bool,
    banking_mode: bool,
}

impl Mbc1 {
    pub fn new(rom: Vec<u8>, bank_count: usize, ram: CartridgeRam) -> Mbc1 {
        Mbc1 {
            rom,
            bank_count,
            rom_bank: 1,
            secondary_bank: 0,
            ram,
            ram_enabled: false,
            banking_mode: false,
        }
    }

    /// The 2-bit register only reaches ROM on carts larger than 512 KiB.
    #[inline]
    fn large_rom(&self) -> bool {
        self.bank_count > 32
    }

    /// ...and only reaches RAM on carts with more than one RAM bank.
    #[inline]
    fn large_ram(&self) -> bool {
        self.ram.len() > RAM_BANK_SIZE
    }

    fn high_rom_bank(&self) -> u16 {
        let mut bank = self.rom_bank as u16;
        if self.large_rom() {
            bank |= (self.secondary_bank as u16) << 5;
        }
        bank
    }

    fn low_rom_bank(&self) -> u16 {
        if self.banking_mode && self.large_rom() {
            (self.secondary_bank as u16) << 5
        } else {
            0
        }
    }

    fn ram_bank(&self) -> u8 {
        if self.banking_mode && self.large_ram() {
            self.secondary_bank
        } else {
            0
        }
    }

    fn ram_offset(&self, addr: u16) -> usize {
        (addr - EXTERNAL_RAM_START) as usize + self.ram_bank() as usize * RAM_BANK_SIZE
    }
}

impl Mapper for Mbc1 {
    #[inline]
    fn read(&self, addr: u16) -> u8 {
        match addr {
            addr if ROM_SLOT_0_RANGE.contains(&addr) => read_banked_rom(&self.rom, self.low_rom_bank(), addr),
            addr if ROM_SLOT_1_RANGE.contains(&addr) => read_banked_rom(&self.rom, self.high_rom_bank(), addr),
            addr if EXTERNAL_RAM_RANGE.contains(&addr) => {
                if !self.ram_enabled {
                    return 0xff;
                }
                self.ram.get(self.ram_offset(addr)).copied().unwrap_or(0xff)
            }
            _ => panic!("MBC1: read from unmapped cartridge address ${:04x}", addr),
        }
    }

    #[inline]
    fn write(&mut self, addr: u16, data: u8) {
        match addr {
            addr if RAM_ENABLE_RANGE.contains(&addr) => {
                self.ram_enabled = ram_enable_value(data);
                debug!("MBC1: RAM enabled: {}", self.ram_enabled);
            }
            addr if ROM_BANK_RANGE.contains(&addr) => {
                // 5-bit register, writing $e1 selects bank $01
                self.rom_bank = match data & 0b0001_1111 {
                    0 => 1,
                    bank => bank,
                };
                checked_rom_bank("MBC1", self.high_rom_bank(), self.bank_count);
                debug!("MBC1: Switched to ROM bank {}", self.high_rom_bank());
            }
            addr if SECONDARY_BANK_RANGE.contains(&addr) => {
                self.secondary_bank = data & 0b11;
                checked_rom_bank("MBC1", self.high_rom_bank(), self.bank_count);
                debug!("MBC1: Secondary bank register set to {}", self.secondary_bank);
            }
            addr if BANKING_MODE_RANGE.contains(&addr) => {
                self.banking_mode = data & 0b0000_0001 == 1;
                debug!("MBC1: Switched to banking mode: {}", self.banking_mode);
            }
            addr if EXTERNAL_RAM_RANGE.contains(&addr) => {
                if !self.ram_enabled {
                    return;
                }
                let offset = self.ram_offset(addr);
                if let Some(byte) = self.ram.get_mut(offset) {
                    *byte = data;
                }
            }
            _ => panic!("MBC1: write to unmapped cartridge address ${:04x}", addr),
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
            ram_select: self.secondary_bank,
            ram_enabled: self.ram_enabled,
            banking_mode: self.banking_mode as u8,
        }
    }

    fn set_state(&mut self, state: &MapperState) {
        self.rom_bank = state.rom_bank & 0b0001_1111;
        self.secondary_bank = state.ram_select & 0b11;
        self.ram_enabled = state.ram_enabled;
        self.banking_mode = state.banking_mode != 0;
    }

    #[inline]
    fn current_rom_bank(&self) -> u16 {
        self.high_rom_bank()
    }

    #[inline]
    fn current_ram_bank(&self) -> u8 {
        self.ram_bank()
    }

    #[inline]
    fn name(&self) -> String {
        String::from("MBC1")
    }
}
