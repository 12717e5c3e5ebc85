use crate::memory::mapper::battery::CartridgeRam;
use crate::memory::mapper::{Mapper, MapperState, EXTERNAL_RAM_RANGE};
use crate::memory::EXTERNAL_RAM_START;
use log::debug;

pub struct Rom {
    memory: Vec<u8>,
    ram: CartridgeRam,
}

impl Rom {
    pub fn new(memory: Vec<u8>, ram: CartridgeRam) -> Rom {
        Rom { memory, ram }
    }
}

impl Mapper for Rom {
    #[inline]
    fn read(&self, addr: u16) -> u8 {
        match addr {
            0x0000..=0x7fff => self.memory.get(addr as usize).copied().unwrap_or(0xff),
            addr if EXTERNAL_RAM_RANGE.contains(&addr) => {
                self.ram.get((addr - EXTERNAL_RAM_START) as usize).copied().unwrap_or(0xff)
            }
            _ => panic!("ROM: read from unmapped cartridge address ${:04x}", addr),
        }
    }

    #[inline]
    fn write(&mut self, addr: u16, data: u8) {
        match addr {
            // No bank registers, games still poke them
            0x0000..=0x7fff => debug!("ROM: ignoring write of ${:02x} to ${:04x}", data, addr),
            addr if EXTERNAL_RAM_RANGE.contains(&addr) => {
                if let Some(byte) = self.ram.get_mut((addr - EXTERNAL_RAM_START) as usize) {
                    *byte = data;
                }
            }
            _ => panic!("ROM: write to unmapped cartridge address ${:04x}", addr),
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
            rom_bank: 1,
            ram_select: 0,
            ram_enabled: false,
            banking_mode: 0,
        }
    }

    fn set_state(&mut self, _state: &MapperState) {}

    #[inline]
    fn current_rom_bank(&self) -> u16 {
        1
    }

    #[inline]
    fn current_ram_bank(&self) -> u8 {
        0
    }

    #[inline]
    fn name(&self) -> String {
        String::from("ROM")
    }
}
