use crate::joypad::{Button, Buttons, Joypad};
use crate::lr35902::irq::{InterruptController, InterruptHandler};
use crate::lr35902::timer::Timer;
use crate::memory::addressable::Addressable;
use crate::memory::mmu::Mmu;
use crate::memory::registers::InterruptFlags;
use crate::memory::*;
use crate::serial::Serial;
use crate::sound::controller::SoundController;
use crate::sound::MASTER_CONTROL_REGISTER;
use crate::video::ppu::Ppu;
use crate::video::{OAM_SIZE, WINDOW_X_REGISTER};
use log::{debug, info, trace};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressOwner {
    Mmu,
    Ppu,
    Serial,
    Interrupt,
    Input,
    Dma,
    Timer,
    Sound,
}

impl Display for AddressOwner {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Which component answers for an address. Every address has exactly one owner.
pub fn owner_for_address(addr: u16) -> AddressOwner {
    match addr {
        0x0000..=ROM_END => AddressOwner::Mmu,
        VIDEO_RAM_START..=VIDEO_RAM_END => AddressOwner::Ppu,
        EXTERNAL_RAM_START..=ECHO_RAM_END => AddressOwner::Mmu,
        OAM_START..=OAM_END => AddressOwner::Ppu,
        FORBIDDEN_START..=FORBIDDEN_END => AddressOwner::Mmu,
        OAM_DMA_REGISTER => AddressOwner::Dma,
        IO_START..=WINDOW_X_REGISTER | INTERRUPT_ENABLE_REGISTER => owner_for_io_address(addr),
        _ => AddressOwner::Mmu,
    }
}

fn owner_for_io_address(addr: u16) -> AddressOwner {
    match addr {
        JOYPAD_REGISTER => AddressOwner::Input,
        SERIAL_DATA_REGISTER | SERIAL_CONTROL_REGISTER => AddressOwner::Serial,
        DIV_REGISTER..=TAC_REGISTER => AddressOwner::Timer,
        INTERRUPT_FLAGS_REGISTER | INTERRUPT_ENABLE_REGISTER => AddressOwner::Interrupt,
        SOUND_START..=SOUND_END => AddressOwner::Sound,
        0xff40..=WINDOW_X_REGISTER => AddressOwner::Ppu,
        // Unknown I/O is kept by the MMU so that full memory sweeps work
        _ => AddressOwner::Mmu,
    }
}

/// The CPU's view of the bus. Dispatches every access to the component that owns the address.
pub struct AddressRouter {
    pub(crate) mmu: Mmu,
    pub(crate) ppu: Ppu,
    pub(crate) serial: Serial,
    pub(crate) interrupts: InterruptController,
    pub(crate) joypad: Joypad,
    pub(crate) timer: Timer,
    pub(crate) sound: SoundController,
    dma_base: u8,
    disassembler_mode: bool,
}

impl AddressRouter {
    pub fn new(mmu: Mmu, ppu: Ppu) -> AddressRouter {
        AddressRouter {
            mmu,
            ppu,
            serial: Serial::new(),
            interrupts: InterruptController::new(),
            joypad: Joypad::new(),
            timer: Timer::new(),
            sound: SoundController::new(),
            dma_base: 0,
            disassembler_mode: false,
        }
    }

    fn read_from_owner(&self, owner: AddressOwner, addr: u16) -> u8 {
        match owner {
            AddressOwner::Mmu => self.mmu.read(addr),
            AddressOwner::Ppu => self.ppu.read(addr),
            AddressOwner::Serial => self.serial.read(addr),
            AddressOwner::Interrupt => self.interrupts.read(addr),
            AddressOwner::Input => self.joypad.read(addr),
            AddressOwner::Dma => self.dma_base,
            AddressOwner::Timer => self.timer.read(addr),
            AddressOwner::Sound => self.sound.read(addr),
        }
    }

    fn write_to_owner(&mut self, owner: AddressOwner, addr: u16, data: u8) {
        match owner {
            AddressOwner::Mmu => self.mmu.write(addr, data),
            AddressOwner::Ppu => {
                self.ppu.write(addr, data);
                if self.ppu.take_coincidence_request() {
                    self.interrupts.request_interrupt(InterruptFlags::LCD_STAT);
                }
            }
            AddressOwner::Serial => {
                self.serial.write(addr, data);
                if self.serial.take_transfer_completed() {
                    self.interrupts.request_interrupt(InterruptFlags::SERIAL);
                }
            }
            AddressOwner::Interrupt => self.interrupts.write(addr, data),
            AddressOwner::Input => self.joypad.write(addr, data),
            AddressOwner::Dma => self.perform_dma(data),
            AddressOwner::Timer => self.timer.write(addr, data),
            AddressOwner::Sound => self.sound.write(addr, data),
        }
    }

    /// Little endian word, both bytes must belong to the same owner.
    pub fn read_word(&self, addr: u16) -> u16 {
        let next = addr.wrapping_add(1);
        let owner = self.same_owner(addr, next);
        let low = self.read_from_owner(owner, addr);
        let high = self.read_from_owner(owner, next);
        u16::from_le_bytes([low, high])
    }

    pub fn write_word(&mut self, addr: u16, data: u16) {
        let next = addr.wrapping_add(1);
        self.same_owner(addr, next);
        let [low, high] = data.to_le_bytes();
        self.write(addr, low);
        self.write(next, high);
    }

    fn same_owner(&self, addr: u16, next: u16) -> AddressOwner {
        let owner = owner_for_address(addr);
        let next_owner = owner_for_address(next);
        if owner != next_owner {
            panic!(
                "Word access at ${:04x} crosses from {} to {}",
                addr, owner, next_owner
            );
        }
        owner
    }

    /// Copies 160 bytes from `base << 8` into OAM at once.
    fn perform_dma(&mut self, base: u8) {
        self.dma_base = base;
        let source = (base as u16) << 8;
        trace!("OAM DMA from ${:04x}", source);

        for offset in 0..OAM_SIZE as u16 {
            let byte = self.read(source.wrapping_add(offset));
            self.write(OAM_START + offset, byte);
        }
    }

    pub fn enable_disassembler_mode(&mut self, enabled: bool) {
        self.disassembler_mode = enabled;
        self.mmu.enable_disassembler_mode(enabled);
    }

    #[inline]
    pub fn is_disassembler_mode(&self) -> bool {
        self.disassembler_mode
    }

    /// Advances every clocked component, then lets them raise interrupts.
    pub fn advance(&mut self, cycles: usize) {
        self.ppu.advance(cycles, &mut self.interrupts);
        self.timer.advance(cycles, &mut self.interrupts);
        self.sound.advance(cycles);
        self.interrupts.advance(cycles);
    }

    pub fn set_button(&mut self, button: Button, pressed: bool) {
        if self.joypad.set_button(button, pressed) {
            self.interrupts.request_interrupt(InterruptFlags::JOYPAD);
        }
    }

    pub fn set_buttons(&mut self, buttons: Buttons) {
        if self.joypad.set_buttons(buttons) {
            self.interrupts.request_interrupt(InterruptFlags::JOYPAD);
        }
    }

    /// I/O registers as the boot ROM leaves them.
    pub fn skip_boot_rom(&mut self) {
        // Sound must be powered before its registers accept writes
        const POST_BOOT_IO: [(u16, u8); 20] = [
            (MASTER_CONTROL_REGISTER, 0xf1),
            (JOYPAD_REGISTER, 0xcf),
            (SERIAL_DATA_REGISTER, 0x00),
            (SERIAL_CONTROL_REGISTER, 0x7e),
            (TIMA_REGISTER, 0x00),
            (TMA_REGISTER, 0x00),
            (TAC_REGISTER, 0xf8),
            (INTERRUPT_FLAGS_REGISTER, 0xe1),
            (0xff10, 0x80),
            (0xff23, 0xbf),
            (0xff24, 0x77),
            (0xff25, 0xf3),
            (0xff40, 0x91),
            (0xff41, 0x85),
            (0xff42, 0x00),
            (0xff43, 0x00),
            (0xff45, 0x00),
            (0xff47, 0xfc),
            (0xff4a, 0x00),
            (0xff4b, 0x00),
        ];

        for (addr, data) in POST_BOOT_IO {
            self.write(addr, data);
        }
        self.timer.set_div(0xab);
        self.interrupts.write(INTERRUPT_ENABLE_REGISTER, 0x00);
        self.mmu.unmap_bootrom();
        info!("Skipped boot ROM");
    }
}

impl Addressable for AddressRouter {
    fn read(&self, addr: u16) -> u8 {
        self.read_from_owner(owner_for_address(addr), addr)
    }

    fn write(&mut self, addr: u16, data: u8) {
        if self.disassembler_mode {
            debug!("Dropped write of ${:02x} to ${:04x} while disassembling", data, addr);
            return;
        }
        self.write_to_owner(owner_for_address(addr), addr, data);
    }
}
