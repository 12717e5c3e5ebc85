use crate::memory::addressable::Addressable;
use crate::sound::{MASTER_CONTROL_REGISTER, NR10, READ_MASKS, WAVE_RAM_END, WAVE_RAM_START};
use log::debug;

const POWER: u8 = 0b1000_0000;

/// Sound registers without synthesis: values are stored and read back the way the DMG masks them.
pub struct SoundController {
    registers: [u8; 0x20],
    wave_ram: [u8; 0x10],
    cycles: u64,
}

impl SoundController {
    pub fn new() -> SoundController {
        SoundController {
            registers: [0; 0x20],
            wave_ram: [0; 0x10],
            cycles: 0,
        }
    }

    pub fn advance(&mut self, cycles: usize) {
        self.cycles += cycles as u64;
    }

    #[inline]
    pub fn is_powered(&self) -> bool {
        self.registers[(MASTER_CONTROL_REGISTER - NR10) as usize] & POWER != 0
    }

    #[inline]
    pub fn cycles(&self) -> u64 {
        self.cycles
    }
}

impl Addressable for SoundController {
    fn read(&self, addr: u16) -> u8 {
        match addr {
            WAVE_RAM_START..=WAVE_RAM_END => self.wave_ram[(addr - WAVE_RAM_START) as usize],
            NR10..=0xff2f => {
                let index = (addr - NR10) as usize;
                self.registers[index] | READ_MASKS[index]
            }
            _ => panic!("Sound controller does not own ${:04x}", addr),
        }
    }

    fn write(&mut self, addr: u16, data: u8) {
        match addr {
            WAVE_RAM_START..=WAVE_RAM_END => self.wave_ram[(addr - WAVE_RAM_START) as usize] = data,
            MASTER_CONTROL_REGISTER => {
                let index = (addr - NR10) as usize;
                if data & POWER == 0 && self.is_powered() {
                    debug!("Sound powered off");
                    // Everything up to NR51 is cleared
                    self.registers[..index].fill(0);
                }
                // Channel status bits are read only
                self.registers[index] = data & POWER;
            }
            NR10..=0xff2f => {
                if !self.is_powered() {
                    debug!("Sound register ${:04x} written while powered off", addr);
                    return;
                }
                self.registers[(addr - NR10) as usize] = data;
            }
            _ => panic!("Sound controller does not own ${:04x}", addr),
        }
    }
}
