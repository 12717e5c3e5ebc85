use crate::error::{BootRomSizeSnafu, EdgeError};
use crate::memory::addressable::Addressable;
use crate::memory::mapper::Cartridge;
use crate::memory::{
    BOOTROM_MAPPER_REGISTER, BOOTROM_SIZE, ECHO_RAM_END, ECHO_RAM_START, EXTERNAL_RAM_END, EXTERNAL_RAM_START,
    FORBIDDEN_END, FORBIDDEN_START, HIGH_RAM_END, HIGH_RAM_SIZE, HIGH_RAM_START, IO_START, ROM_END, WORK_RAM_END,
    WORK_RAM_SIZE, WORK_RAM_START,
};
use log::{debug, info, warn};
use snafu::ensure;

/// Returned for every read while disassembling.
pub const DISASSEMBLER_FILL_BYTE: u8 = 0xed;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MmuState {
    pub overlay_boot_rom: bool,
    pub work_ram: Vec<u8>,
    pub high_ram: Vec<u8>,
}

pub struct Mmu {
    cartridge: Cartridge,
    work_ram: Vec<u8>,
    high_ram: Vec<u8>,
    bootrom: Vec<u8>,
    overlay_bootrom: bool,
    disassembler_mode: bool,
}

impl Mmu {
    /// The boot ROM, when given, stays mapped over $0000-$00ff until $ff50 is written.
    pub fn new(cartridge: Cartridge, bootrom: Option<Vec<u8>>) -> Result<Mmu, EdgeError> {
        if let Some(bootrom) = &bootrom {
            ensure!(bootrom.len() == BOOTROM_SIZE, BootRomSizeSnafu { size: bootrom.len() });
        }

        Ok(Mmu {
            cartridge,
            work_ram: vec![0; WORK_RAM_SIZE],
            high_ram: vec![0; HIGH_RAM_SIZE],
            overlay_bootrom: bootrom.is_some(),
            bootrom: bootrom.unwrap_or_default(),
            disassembler_mode: false,
        })
    }

    #[inline]
    pub fn is_bootrom_mapped(&self) -> bool {
        self.overlay_bootrom
    }

    pub fn unmap_bootrom(&mut self) {
        if self.overlay_bootrom {
            info!("Boot ROM unmapped");
        }
        self.overlay_bootrom = false;
    }

    pub fn enable_disassembler_mode(&mut self, enabled: bool) {
        self.disassembler_mode = enabled;
    }

    #[inline]
    pub fn cartridge(&self) -> &Cartridge {
        &self.cartridge
    }

    #[inline]
    pub fn cartridge_mut(&mut self) -> &mut Cartridge {
        &mut self.cartridge
    }

    pub fn state(&self) -> MmuState {
        MmuState {
            overlay_boot_rom: self.overlay_bootrom,
            work_ram: self.work_ram.clone(),
            high_ram: self.high_ram.clone(),
        }
    }

    pub fn set_state(&mut self, state: &MmuState) {
        // A state taken during boot is useless without the boot ROM itself
        self.overlay_bootrom = state.overlay_boot_rom && !self.bootrom.is_empty();
        self.work_ram.copy_from_slice(&state.work_ram[..WORK_RAM_SIZE]);
        self.high_ram.copy_from_slice(&state.high_ram[..HIGH_RAM_SIZE]);
    }
}

impl Addressable for Mmu {
    fn read(&self, addr: u16) -> u8 {
        if self.disassembler_mode {
            return DISASSEMBLER_FILL_BYTE;
        }

        match addr {
            0x0000..=0x00ff if self.overlay_bootrom => self.bootrom[addr as usize],
            0x0000..=ROM_END => self.cartridge.read(addr),
            EXTERNAL_RAM_START..=EXTERNAL_RAM_END => self.cartridge.read(addr),
            WORK_RAM_START..=WORK_RAM_END => self.work_ram[(addr - WORK_RAM_START) as usize],
            ECHO_RAM_START..=ECHO_RAM_END => self.work_ram[(addr - ECHO_RAM_START) as usize],
            FORBIDDEN_START..=FORBIDDEN_END => {
                warn!("Read from forbidden address ${:04x}", addr);
                0xff
            }
            HIGH_RAM_START..=HIGH_RAM_END => self.high_ram[(addr - HIGH_RAM_START) as usize],
            IO_START..=0xff7f => {
                debug!("Read from unmapped I/O register ${:04x}", addr);
                0xff
            }
            _ => panic!("MMU does not own ${:04x}", addr),
        }
    }

    fn write(&mut self, addr: u16, data: u8) {
        if self.disassembler_mode {
            return;
        }

        match addr {
            0x0000..=ROM_END => self.cartridge.write(addr, data),
            EXTERNAL_RAM_START..=EXTERNAL_RAM_END => self.cartridge.write(addr, data),
            WORK_RAM_START..=WORK_RAM_END => self.work_ram[(addr - WORK_RAM_START) as usize] = data,
            ECHO_RAM_START..=ECHO_RAM_END => self.work_ram[(addr - ECHO_RAM_START) as usize] = data,
            FORBIDDEN_START..=FORBIDDEN_END => {
                warn!("Write of ${:02x} to forbidden address ${:04x}", data, addr)
            }
            HIGH_RAM_START..=HIGH_RAM_END => self.high_ram[(addr - HIGH_RAM_START) as usize] = data,
            BOOTROM_MAPPER_REGISTER => self.unmap_bootrom(),
            IO_START..=0xff7f => debug!("Write of ${:02x} to unmapped I/O register ${:04x}", data, addr),
            _ => panic!("MMU does not own ${:04x}", addr),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::mapper::header::rom_with_header;

    fn mmu(bootrom: Option<Vec<u8>>) -> Mmu {
        let cartridge = Cartridge::new(rom_with_header(0x00, 0x00, 0x00), None).unwrap();
        Mmu::new(cartridge, bootrom).unwrap()
    }

    #[test]
    fn bootrom_overlays_until_ff50_write() {
        let mut mmu = mmu(Some(vec![0x31; BOOTROM_SIZE]));
        assert_eq!(mmu.read(0x0000), 0x31);
        assert_eq!(mmu.read(0x0147), 0x00);

        mmu.write(BOOTROM_MAPPER_REGISTER, 0x01);
        assert!(!mmu.is_bootrom_mapped());
        assert_eq!(mmu.read(0x0000), 0x00);
    }

    #[test]
    fn bootrom_must_be_256_bytes() {
        let cartridge = Cartridge::new(rom_with_header(0x00, 0x00, 0x00), None).unwrap();
        assert!(matches!(
            Mmu::new(cartridge, Some(vec![0; 0x200])),
            Err(EdgeError::BootRomSize { size: 0x200 })
        ));
    }

    #[test]
    fn echo_ram_mirrors_work_ram() {
        let mut mmu = mmu(None);
        mmu.write(0xc123, 0x42);
        assert_eq!(mmu.read(0xe123), 0x42);

        mmu.write(0xfdff, 0x24);
        assert_eq!(mmu.read(0xddff), 0x24);
    }

    #[test]
    fn forbidden_and_unknown_io_read_ff() {
        let mut mmu = mmu(None);
        mmu.write(0xfea0, 0x12);
        assert_eq!(mmu.read(0xfea0), 0xff);
        mmu.write(0xff4d, 0x12);
        assert_eq!(mmu.read(0xff4d), 0xff);
    }

    #[test]
    fn disassembler_mode_has_no_side_effects() {
        let mut mmu = mmu(None);
        mmu.write(0xc000, 0x11);
        mmu.enable_disassembler_mode(true);

        mmu.write(0xc000, 0x22);
        assert_eq!(mmu.read(0xc000), DISASSEMBLER_FILL_BYTE);

        mmu.enable_disassembler_mode(false);
        assert_eq!(mmu.read(0xc000), 0x11);
    }
}
