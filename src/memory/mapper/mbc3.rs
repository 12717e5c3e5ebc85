use crate::memory::mapper::battery::CartridgeRam;
use crate::memory::mapper::header::RAM_BANK_SIZE;
use crate::memory::mapper::rtc::{Rtc, RTC_DAYS_HIGH_REGISTER, RTC_SECONDS_REGISTER};
use crate::memory::mapper::{
    checked_rom_bank, ram_enable_value, read_banked_rom, Mapper, MapperState, BANKING_MODE_RANGE,
    EXTERNAL_RAM_RANGE, RAM_ENABLE_RANGE, ROM_BANK_RANGE, ROM_SLOT_0_RANGE, ROM_SLOT_1_RANGE,
    SECONDARY_BANK_RANGE,
};
use crate::memory::EXTERNAL_RAM_START;
use log::debug;

pub struct Mbc3 {
    rom: Vec<u8>,
    bank_count: usize,
    rom_bank: u8,
    ram: CartridgeRam,
    /// RAM bank $00-$03 or RTC register $08-$0c.
    ram_select: u8,
    ram_enabled: bool,
    rtc: Rtc,
}

impl Mbc3 {
    pub fn new(rom: Vec<u8>, bank_count: usize, ram: CartridgeRam) -> Mbc3 {
        Mbc3 {
            rom,
            bank_count,
            rom_bank: 1,
            ram,
            ram_select: 0,
            ram_enabled: false,
            rtc: Rtc::new(),
        }
    }

    #[inline]
    fn rtc_selected(&self) -> bool {
        self.ram_select >= RTC_SECONDS_REGISTER
    }

    fn ram_offset(&self, addr: u16) -> usize {
        (addr - EXTERNAL_RAM_START) as usize + self.ram_select as usize * RAM_BANK_SIZE
    }
}

impl Mapper for Mbc3 {
    #[inline]
    fn read(&self, addr: u16) -> u8 {
        match addr {
            addr if ROM_SLOT_0_RANGE.contains(&addr) => self.rom[addr as usize],
            addr if ROM_SLOT_1_RANGE.contains(&addr) => read_banked_rom(&self.rom, self.rom_bank as u16, addr),
            addr if EXTERNAL_RAM_RANGE.contains(&addr) => {
                if !self.ram_enabled {
                    0xff
                } else if self.rtc_selected() {
                    self.rtc.read(self.ram_select)
                } else {
                    // Out of range banks read open bus
                    self.ram.get(self.ram_offset(addr)).copied().unwrap_or(0xff)
                }
            }
            _ => panic!("MBC3: read from unmapped cartridge address ${:04x}", addr),
        }
    }

    #[inline]
    fn write(&mut self, addr: u16, data: u8) {
        match addr {
            addr if RAM_ENABLE_RANGE.contains(&addr) => {
                self.ram_enabled = ram_enable_value(data);
                debug!("MBC3: RAM and RTC enabled: {}", self.ram_enabled);
            }
            addr if ROM_BANK_RANGE.contains(&addr) => {
                self.rom_bank = checked_rom_bank("MBC3", (data & 0b0111_1111) as u16, self.bank_count) as u8;
                debug!("MBC3: Switched to ROM bank {}", self.rom_bank);
            }
            addr if SECONDARY_BANK_RANGE.contains(&addr) => {
                if data > RTC_DAYS_HIGH_REGISTER {
                    panic!("MBC3: RAM bank / RTC register select out of range: ${:02x}", data);
                }
                self.ram_select = data;
                debug!("MBC3: Selected RAM bank / RTC register ${:02x}", data);
            }
            addr if BANKING_MODE_RANGE.contains(&addr) => self.rtc.latch(data),
            addr if EXTERNAL_RAM_RANGE.contains(&addr) => {
                if !self.ram_enabled {
                    return;
                }
                if self.rtc_selected() {
                    self.rtc.write(self.ram_select, data);
                } else {
                    let offset = self.ram_offset(addr);
                    if let Some(byte) = self.ram.get_mut(offset) {
                        *byte = data;
                    }
                }
            }
            _ => panic!("MBC3: write to unmapped cartridge address ${:04x}", addr),
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
            ram_select: self.ram_select,
            ram_enabled: self.ram_enabled,
            banking_mode: 0,
        }
    }

    fn set_state(&mut self, state: &MapperState) {
        self.rom_bank = state.rom_bank & 0b0111_1111;
        self.ram_select = state.ram_select.min(RTC_DAYS_HIGH_REGISTER);
        self.ram_enabled = state.ram_enabled;
    }

    fn rtc(&self) -> Option<&Rtc> {
        Some(&self.rtc)
    }

    fn rtc_mut(&mut self) -> Option<&mut Rtc> {
        Some(&mut self.rtc)
    }

    #[inline]
    fn current_rom_bank(&self) -> u16 {
        self.rom_bank as u16
    }

    #[inline]
    fn current_ram_bank(&self) -> u8 {
        self.ram_select
    }

    #[inline]
    fn name(&self) -> String {
        String::from("MBC3")
    }
}
