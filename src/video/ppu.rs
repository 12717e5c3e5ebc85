use crate::lr35902::irq::InterruptHandler;
use crate::memory::addressable::Addressable;
use crate::memory::registers::{InterruptFlags, LcdControl, LcdStatus};
use crate::memory::{OAM_END, OAM_START, VIDEO_RAM_END, VIDEO_RAM_START};
use crate::video::fifo::PixelFifo;
use crate::video::palette::ScreenStyle;
use crate::video::pixel::decode_tile_row;
use crate::video::screen::Screen;
use crate::video::sprite::Sprite;
use crate::video::state::State;
use crate::video::*;
use log::{debug, trace, warn};

/// VRAM, OAM and the LCD registers, shared between the PPU and its FIFO.
pub struct VideoMemory {
    pub vram: Vec<u8>,
    pub oam: Vec<u8>,
    pub lcdc: LcdControl,
    pub stat: u8,
    pub scy: u8,
    pub scx: u8,
    pub ly: u8,
    pub lyc: u8,
    pub bgp: u8,
    pub obp0: u8,
    pub obp1: u8,
    pub wy: u8,
    pub wx: u8,
}

impl VideoMemory {
    pub fn new() -> VideoMemory {
        VideoMemory {
            // Junk so that reads of never-written tiles stand out
            vram: (0..VIDEO_RAM_SIZE).map(|i| (i % 255) as u8).collect(),
            oam: vec![0; OAM_SIZE],
            lcdc: LcdControl::empty(),
            stat: 0,
            scy: 0,
            scx: 0,
            ly: 0,
            lyc: 0,
            bgp: 0,
            obp0: 0,
            obp1: 0,
            wy: 0,
            wx: 0,
        }
    }

    #[inline]
    pub fn vram_byte(&self, addr: u16) -> u8 {
        self.vram[(addr - VIDEO_RAM_START) as usize]
    }

    pub fn sprite_height(&self) -> u8 {
        if self.lcdc.contains(LcdControl::OBJ_SIZE) {
            16
        } else {
            8
        }
    }

    /// Tile data address, $8000 based unsigned or $9000 based signed depending on LCDC bit 4.
    pub fn tile_data_address(&self, tile: u8) -> u16 {
        if self.lcdc.contains(LcdControl::BG_TILE_DATA) {
            TILE_DATA_UNSIGNED_ADDRESS + tile as u16 * 16
        } else {
            TILE_DATA_SIGNED_ADDRESS.wrapping_add_signed(tile as i8 as i16 * 16)
        }
    }

    /// Eight colors of a tile map starting at pixel (`x` rounded down to a tile, `y`).
    pub fn tile_map_row(&self, map: u16, x: u8, y: u8) -> [u8; 8] {
        let map_index = (y as u16 / 8) * 32 + x as u16 / 8;
        let tile = self.vram_byte(map + map_index);
        let address = self.tile_data_address(tile) + (y as u16 % 8) * 2;
        decode_tile_row(self.vram_byte(address), self.vram_byte(address + 1))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PpuState {
    pub lcdc: u8,
    pub stat: u8,
    pub scy: u8,
    pub scx: u8,
    pub ly: u8,
    pub lyc: u8,
    pub bgp: u8,
    pub obp0: u8,
    pub obp1: u8,
    pub wy: u8,
    pub wx: u8,
    pub vram: Vec<u8>,
    pub oam: Vec<u8>,
}

pub struct Ppu {
    memory: VideoMemory,
    fifo: PixelFifo,
    screen: Screen,
    state: State,
    frame_cycles: usize,
    row_sprites: Vec<Sprite>,
    frame_finished: bool,
    coincidence_pending: bool,
}

impl Ppu {
    pub fn new(style: ScreenStyle) -> Ppu {
        Ppu {
            memory: VideoMemory::new(),
            fifo: PixelFifo::new(),
            screen: Screen::new(style),
            state: State::OamSearch,
            frame_cycles: 0,
            row_sprites: Vec::with_capacity(MAX_SPRITES_PER_ROW),
            frame_finished: false,
            coincidence_pending: false,
        }
    }

    pub fn advance(&mut self, cycles: usize, interrupts: &mut dyn InterruptHandler) {
        let mut remaining = cycles;

        while remaining > 0 {
            let consumed = if self.frame_cycles < VISIBLE_CYCLES {
                self.visible_cycles(remaining.min(VISIBLE_CYCLES - self.frame_cycles), interrupts)
            } else {
                self.invisible_cycles(remaining.min(TOTAL_FRAME_CYCLES - self.frame_cycles), interrupts)
            };
            remaining -= consumed;

            if self.frame_cycles == TOTAL_FRAME_CYCLES {
                self.frame_cycles = 0;
                self.end_vblank();
            }
        }
    }

    /// Handles at most one row of a visible line and returns the cycles used.
    fn visible_cycles(&mut self, max_cycles: usize, interrupts: &mut dyn InterruptHandler) -> usize {
        let row = self.frame_cycles / ROW_CYCLES;
        let mut row_cycles = self.frame_cycles % ROW_CYCLES;
        let budget = max_cycles.min(ROW_CYCLES - row_cycles);
        let mut used = 0;

        if row_cycles == 0 {
            self.begin_row(row, interrupts);
        }

        if row_cycles < OAM_SEARCH_CYCLES {
            let progress = (OAM_SEARCH_CYCLES - row_cycles).min(budget);
            used += progress;
            row_cycles += progress;
        }

        if used < budget && row_cycles == OAM_SEARCH_CYCLES && self.state == State::OamSearch {
            self.state = State::PixelTransfer;
        }

        while used < budget && self.state == State::PixelTransfer {
            let finished = self.fifo.advance(&self.memory, &mut self.screen);
            used += 1;
            row_cycles += 1;

            if finished {
                self.begin_hblank(interrupts);
            } else if row_cycles == ROW_CYCLES {
                warn!("Row {} ended after {} pixels", row, self.fifo.emitted());
                self.begin_hblank(interrupts);
            }
        }

        // The rest of the budget is HBlank
        self.frame_cycles += budget;
        budget
    }

    fn invisible_cycles(&mut self, max_cycles: usize, interrupts: &mut dyn InterruptHandler) -> usize {
        if self.frame_cycles == VISIBLE_CYCLES {
            self.begin_vblank(interrupts);
        }

        let invisible = self.frame_cycles - VISIBLE_CYCLES;
        let row_cycles = invisible % ROW_CYCLES;
        if row_cycles == 0 {
            self.set_ly((SCREEN_HEIGHT + invisible / ROW_CYCLES) as u8, interrupts);
        }

        let progress = max_cycles.min(ROW_CYCLES - row_cycles);
        self.frame_cycles += progress;
        progress
    }

    fn begin_row(&mut self, row: usize, interrupts: &mut dyn InterruptHandler) {
        if row == 0 {
            self.fifo.new_frame();
        } else {
            self.fifo.end_row();
        }

        self.state = State::OamSearch;
        self.oam_search(row, interrupts);
        self.set_ly(row as u8, interrupts);
        self.fifo.new_row(row, &self.row_sprites, &self.memory);
    }

    fn oam_search(&mut self, row: usize, interrupts: &mut dyn InterruptHandler) {
        if self.stat_enabled(LcdStatus::OAM_INTERRUPT) {
            interrupts.request_interrupt(InterruptFlags::LCD_STAT);
        }

        self.row_sprites.clear();
        if !self.memory.lcdc.contains(LcdControl::OBJ_DISPLAY) {
            return;
        }

        let height = self.memory.sprite_height();
        for index in 0..SPRITE_COUNT {
            let sprite = Sprite::from_oam(&self.memory.oam, index);
            if sprite.x == 0 && sprite.y == 0 {
                continue;
            }

            if sprite.is_visible_on_row(row, height) {
                self.row_sprites.push(sprite);
                if self.row_sprites.len() == MAX_SPRITES_PER_ROW {
                    break;
                }
            }
        }
    }

    fn begin_hblank(&mut self, interrupts: &mut dyn InterruptHandler) {
        self.screen.new_line(self.memory.ly as usize);
        self.state = State::HBlank;
        if self.stat_enabled(LcdStatus::HBLANK_INTERRUPT) {
            interrupts.request_interrupt(InterruptFlags::LCD_STAT);
        }
    }

    fn begin_vblank(&mut self, interrupts: &mut dyn InterruptHandler) {
        self.fifo.end_row();
        self.state = State::VBlank;
        self.screen.vblank_began();
        self.frame_finished = true;
        interrupts.request_interrupt(InterruptFlags::VBLANK);
        if self.stat_enabled(LcdStatus::VBLANK_INTERRUPT) {
            interrupts.request_interrupt(InterruptFlags::LCD_STAT);
        }
    }

    fn end_vblank(&mut self) {
        self.screen.vblank_ended();
    }

    fn set_ly(&mut self, value: u8, interrupts: &mut dyn InterruptHandler) {
        self.memory.ly = value;
        if self.coincidence_interrupt_due() {
            interrupts.request_interrupt(InterruptFlags::LCD_STAT);
        }
    }

    #[inline]
    fn coincidence_interrupt_due(&self) -> bool {
        self.memory.ly == self.memory.lyc && self.stat_enabled(LcdStatus::COINCIDENCE_INTERRUPT)
    }

    /// True once after a CPU write to LY matched LYC with the coincidence interrupt selected.
    pub fn take_coincidence_request(&mut self) -> bool {
        std::mem::take(&mut self.coincidence_pending)
    }

    #[inline]
    fn stat_enabled(&self, source: LcdStatus) -> bool {
        LcdStatus::from(self.memory.stat).contains(source)
    }

    /// STAT as read by the CPU: the interrupt selects plus live coincidence and mode bits.
    pub fn stat(&self) -> u8 {
        let mut stat = self.memory.stat & 0b0111_1000;
        if self.memory.ly == self.memory.lyc {
            stat |= LcdStatus::COINCIDENCE.bits();
        }
        stat | self.state.as_u8()
    }

    #[inline]
    pub fn state(&self) -> State {
        self.state
    }

    #[inline]
    pub fn ly(&self) -> u8 {
        self.memory.ly
    }

    #[inline]
    pub fn frame_cycles(&self) -> usize {
        self.frame_cycles
    }

    /// True once per frame, at the start of VBlank.
    pub fn take_frame_finished(&mut self) -> bool {
        std::mem::take(&mut self.frame_finished)
    }

    #[inline]
    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    #[inline]
    pub fn screen_mut(&mut self) -> &mut Screen {
        &mut self.screen
    }

    pub fn row_sprites(&self) -> &[Sprite] {
        &self.row_sprites
    }

    pub fn state_snapshot(&self) -> PpuState {
        PpuState {
            lcdc: self.memory.lcdc.bits(),
            stat: self.memory.stat,
            scy: self.memory.scy,
            scx: self.memory.scx,
            ly: self.memory.ly,
            lyc: self.memory.lyc,
            bgp: self.memory.bgp,
            obp0: self.memory.obp0,
            obp1: self.memory.obp1,
            wy: self.memory.wy,
            wx: self.memory.wx,
            vram: self.memory.vram.clone(),
            oam: self.memory.oam.clone(),
        }
    }

    /// Restores registers and memory, resuming at the start of row LY.
    pub fn restore(&mut self, state: &PpuState) {
        self.memory.lcdc = LcdControl::from(state.lcdc);
        self.memory.stat = state.stat;
        self.memory.scy = state.scy;
        self.memory.scx = state.scx;
        self.memory.ly = state.ly;
        self.memory.lyc = state.lyc;
        self.memory.bgp = state.bgp;
        self.memory.obp0 = state.obp0;
        self.memory.obp1 = state.obp1;
        self.memory.wy = state.wy;
        self.memory.wx = state.wx;
        self.memory.vram.copy_from_slice(&state.vram[..VIDEO_RAM_SIZE]);
        self.memory.oam.copy_from_slice(&state.oam[..OAM_SIZE]);

        let row = (state.ly as usize).min(SCREEN_HEIGHT + VBLANK_ROWS - 1);
        self.frame_cycles = row * ROW_CYCLES;
        self.state = if row < SCREEN_HEIGHT {
            State::OamSearch
        } else {
            State::VBlank
        };
        self.row_sprites.clear();
    }

    fn set_lcdc(&mut self, value: u8) {
        let control = LcdControl::from(value);
        let screen_on = control.contains(LcdControl::LCD_DISPLAY);
        debug!("LCDC ${:02x}, screen {}", value, if screen_on { "on" } else { "off" });
        if !screen_on && self.memory.lcdc.contains(LcdControl::LCD_DISPLAY) && self.state != State::VBlank {
            warn!("Screen turned off outside of VBlank in {:?}", self.state);
        }
        self.memory.lcdc = control;
    }

    fn screen_on(&self) -> bool {
        self.memory.lcdc.contains(LcdControl::LCD_DISPLAY)
    }
}

impl Addressable for Ppu {
    fn read(&self, addr: u16) -> u8 {
        match addr {
            VIDEO_RAM_START..=VIDEO_RAM_END => self.memory.vram_byte(addr),
            OAM_START..=OAM_END => self.memory.oam[(addr - OAM_START) as usize],
            LCD_CONTROL_REGISTER => self.memory.lcdc.bits(),
            LCD_STATUS_REGISTER => self.stat(),
            SCROLL_Y_REGISTER => self.memory.scy,
            SCROLL_X_REGISTER => self.memory.scx,
            SCANLINE_Y_REGISTER => self.memory.ly,
            SCANLINE_Y_COMPARE_REGISTER => self.memory.lyc,
            BG_PALETTE_REGISTER => self.memory.bgp,
            OBJ0_PALETTE_REGISTER => self.memory.obp0,
            OBJ1_PALETTE_REGISTER => self.memory.obp1,
            WINDOW_Y_REGISTER => self.memory.wy,
            WINDOW_X_REGISTER => self.memory.wx,
            _ => panic!("PPU does not own ${:04x}", addr),
        }
    }

    fn write(&mut self, addr: u16, data: u8) {
        match addr {
            VIDEO_RAM_START..=VIDEO_RAM_END => {
                if self.screen_on() && !self.state.can_access_vram() {
                    trace!("VRAM write ${:04x} during {:?}", addr, self.state);
                }
                self.memory.vram[(addr - VIDEO_RAM_START) as usize] = data;
            }
            OAM_START..=OAM_END => {
                if self.screen_on() && !self.state.can_access_oam() {
                    warn!("OAM write ${:04x} during {:?}", addr, self.state);
                }
                self.memory.oam[(addr - OAM_START) as usize] = data;
            }
            LCD_CONTROL_REGISTER => self.set_lcdc(data),
            LCD_STATUS_REGISTER => self.memory.stat = data,
            SCROLL_Y_REGISTER => {
                if !self.state.can_access_vram() && data != self.memory.scy {
                    debug!("SCY ${:02x} -> ${:02x} mid-row", self.memory.scy, data);
                }
                self.memory.scy = data;
            }
            SCROLL_X_REGISTER => self.memory.scx = data,
            SCANLINE_Y_REGISTER => {
                warn!("LY written with ${:02x}", data);
                self.memory.ly = data;
                self.coincidence_pending = self.coincidence_interrupt_due();
            }
            SCANLINE_Y_COMPARE_REGISTER => self.memory.lyc = data,
            BG_PALETTE_REGISTER => self.memory.bgp = data,
            OBJ0_PALETTE_REGISTER => self.memory.obp0 = data,
            OBJ1_PALETTE_REGISTER => self.memory.obp1 = data,
            WINDOW_Y_REGISTER => self.memory.wy = data,
            WINDOW_X_REGISTER => self.memory.wx = data,
            _ => panic!("PPU does not own ${:04x}", addr),
        }
    }
}
