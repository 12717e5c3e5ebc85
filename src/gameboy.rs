use crate::error::{EdgeError, NoStateDirectorySnafu};
use crate::joypad::{Button, Buttons};
use crate::lr35902::cpu::Cpu;
use crate::memory::mapper::header::CartridgeHeader;
use crate::memory::mapper::Cartridge;
use crate::memory::mmu::Mmu;
use crate::memory::router::AddressRouter;
use crate::state::save_state::SaveState;
use crate::state::slots::StateController;
use crate::video::palette::{Color, ScreenStyle};
use crate::video::ppu::Ppu;
use crate::video::TOTAL_FRAME_CYCLES;
use snafu::OptionExt;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, Default)]
pub struct SystemConfig {
    /// 256 byte DMG boot ROM. Without one the post-boot state is set up directly.
    pub boot_rom: Option<Vec<u8>>,
    /// Root for per-game battery RAM and save slots. Without one nothing touches the disk.
    pub state_dir: Option<PathBuf>,
    pub screen_style: ScreenStyle,
    /// Saves the main slot every few hundred frames.
    pub autosave: bool,
    /// Logs every executed instruction at trace level.
    pub debug_print: bool,
}

/// The whole machine. Owns the CPU and, through the router, every other component.
pub struct System {
    cpu: Cpu,
    router: AddressRouter,
    states: Option<StateController>,
    autosave: bool,
    frames_run: u64,
}

impl System {
    pub fn new(rom: Vec<u8>, config: SystemConfig) -> Result<System, EdgeError> {
        let header = CartridgeHeader::parse(&rom)?;
        let game_dir = config
            .state_dir
            .as_ref()
            .map(|state_dir| state_dir.join(header.directory_name()));

        let cartridge = Cartridge::new(rom, game_dir.as_deref())?;
        let mmu = Mmu::new(cartridge, config.boot_rom.clone())?;
        let ppu = Ppu::new(config.screen_style);

        let mut cpu = Cpu::new()?;
        cpu.set_debug_print(config.debug_print);
        let mut router = AddressRouter::new(mmu, ppu);

        if config.boot_rom.is_none() {
            cpu.skip_boot_rom();
            router.skip_boot_rom();
        }

        Ok(System {
            cpu,
            router,
            states: game_dir.map(StateController::new),
            autosave: config.autosave,
            frames_run: 0,
        })
    }

    /// Runs one instruction, or one idle slice while halted. Returns the cycles spent.
    pub fn step(&mut self) -> usize {
        let cycles = self.cpu.step(&mut self.router);
        self.advance(cycles);
        cycles
    }

    /// Moves every component forward by `cycles`, then services at most one interrupt.
    pub fn advance(&mut self, cycles: usize) {
        self.router.advance(cycles);
        self.router.interrupts.handle_interrupt_request(&mut self.cpu);
        self.cpu.dispatch_pending(&mut self.router);
    }

    /// Steps until the PPU enters VBlank. Returns how many frames this method has finished so far.
    pub fn run_frame(&mut self) -> Result<u64, EdgeError> {
        // Drop a VBlank left over from stepping outside of this method
        self.router.ppu.take_frame_finished();

        let mut spent = 0;
        while spent < TOTAL_FRAME_CYCLES {
            spent += self.step();
            if self.router.ppu.take_frame_finished() {
                self.frames_run += 1;
                break;
            }
        }

        let frame = self.frames_run;
        if self.autosave && StateController::is_save_frame(frame) {
            let state = self.snapshot();
            if let Some(states) = self.states.as_mut() {
                states.finished_frame(frame, state, self.router.ppu.screen())?;
            }
        }
        Ok(frame)
    }

    /// Steps until at least `cycles` have passed. Returns the exact count.
    pub fn run_cycles(&mut self, cycles: usize) -> usize {
        let mut spent = 0;
        while spent < cycles {
            spent += self.step();
        }
        spent
    }

    /// Walks code without taking jumps or writing memory, for listing instructions.
    pub fn set_disassembler_mode(&mut self, enabled: bool) {
        self.cpu.enable_disassembler_mode(&mut self.router, enabled);
    }

    pub fn set_button(&mut self, button: Button, pressed: bool) {
        self.router.set_button(button, pressed);
    }

    pub fn set_buttons(&mut self, buttons: Buttons) {
        self.router.set_buttons(buttons);
    }

    /// Last completed frame, row major.
    pub fn frame(&self) -> &[Color] {
        self.router.ppu.screen().frame()
    }

    pub fn frame_count(&self) -> u64 {
        self.router.ppu.screen().frame_count()
    }

    pub fn serial_output(&self) -> &str {
        self.router.serial.output()
    }

    pub fn take_screenshot(&self, path: &Path) -> Result<(), EdgeError> {
        self.router.ppu.screen().save_screenshot(path)
    }

    #[inline]
    pub fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    #[inline]
    pub fn cpu_mut(&mut self) -> &mut Cpu {
        &mut self.cpu
    }

    #[inline]
    pub fn router(&self) -> &AddressRouter {
        &self.router
    }

    #[inline]
    pub fn router_mut(&mut self) -> &mut AddressRouter {
        &mut self.router
    }

    pub fn title(&self) -> &str {
        self.router.mmu.cartridge().title()
    }

    pub fn states(&self) -> Option<&StateController> {
        self.states.as_ref()
    }

    pub fn snapshot(&self) -> SaveState {
        SaveState {
            cpu: self.cpu.state(),
            ppu: self.router.ppu.state_snapshot(),
            timer: self.router.timer.state(),
            cartridge: self.router.mmu.cartridge().state(),
            interrupts: self.router.interrupts.state(),
            mmu: self.router.mmu.state(),
        }
    }

    pub fn restore(&mut self, state: &SaveState) -> Result<(), EdgeError> {
        // The cartridge goes first, it is the only part that can refuse
        self.router.mmu.cartridge_mut().set_state(&state.cartridge)?;
        self.cpu.set_state(&state.cpu);
        self.router.mmu.set_state(&state.mmu);
        self.router.interrupts.set_state(&state.interrupts);
        self.router.ppu.restore(&state.ppu);
        self.router.timer.set_state(&state.timer);
        Ok(())
    }

    pub fn save_state(&mut self, slot: usize) -> Result<(), EdgeError> {
        let state = self.snapshot();
        let states = self.states.as_mut().context(NoStateDirectorySnafu)?;
        states.save_state(slot, &state, self.router.ppu.screen())
    }

    pub fn load_state(&mut self, slot: usize) -> Result<(), EdgeError> {
        let states = self.states.as_mut().context(NoStateDirectorySnafu)?;
        let state = states.load_slot(slot)?;
        self.restore(&state)
    }

    pub fn save_rotating_slot(&mut self) -> Result<usize, EdgeError> {
        let state = self.snapshot();
        let states = self.states.as_mut().context(NoStateDirectorySnafu)?;
        states.save_rotating_slot(&state, self.router.ppu.screen())
    }

    /// Returns false when this session has not touched a rotating slot yet.
    pub fn load_latest_rotating_slot(&mut self) -> Result<bool, EdgeError> {
        let states = self.states.as_mut().context(NoStateDirectorySnafu)?;
        match states.load_latest_rotating_slot()? {
            Some(state) => self.restore(&state).map(|_| true),
            None => Ok(false),
        }
    }

    /// Rewinds to an in-memory snapshot about two seconds back. Returns its frame.
    pub fn go_back_in_memory(&mut self) -> Result<Option<u64>, EdgeError> {
        let Some((frame, state)) = self.states.as_mut().and_then(|states| states.go_back_in_memory()) else {
            return Ok(None);
        };
        self.restore(&state)?;
        self.frames_run = frame;
        Ok(Some(frame))
    }

    /// Flushes battery RAM. Dropping the system does the same.
    pub fn sync_ram(&mut self) -> Result<(), EdgeError> {
        self.router.mmu.cartridge_mut().sync_ram()
    }
}
