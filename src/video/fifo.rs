use crate::memory::registers::LcdControl;
use crate::video::palette::Palette;
use crate::video::pixel::{decode_tile_row, Pixel, PixelSource};
use crate::video::ppu::VideoMemory;
use crate::video::screen::Screen;
use crate::video::sprite::{Sprite, SpriteFlags};
use crate::video::{MAX_SPRITES_PER_ROW, SCREEN_WIDTH, TILE_MAP_0_ADDRESS, TILE_MAP_1_ADDRESS};

pub const FIFO_CAPACITY: usize = 16;
pub const FETCH_CYCLES: usize = 3;

/// Pixels needed in the queue before anything is shifted out.
const MIN_PIXELS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FetchKind {
    Background,
    Sprite { slot: usize },
}

#[derive(Debug, Clone, Copy)]
struct Fetch {
    kind: FetchKind,
    pixels: [Pixel; 8],
    remaining: usize,
    // Sprite columns hanging off the left edge
    skip: usize,
}

/// Per-row pixel pipeline: fetches tiles 8 pixels at a time and shifts one pixel per cycle.
pub struct PixelFifo {
    buffer: [Pixel; FIFO_CAPACITY],
    head: usize,
    length: usize,
    fetch: Option<Fetch>,
    row: usize,
    emitted: usize,
    discard: usize,
    background_x: u8,
    window_active: bool,
    window_x: u8,
    window_line: u8,
    sprites: Vec<Sprite>,
    fetched: [bool; MAX_SPRITES_PER_ROW],
}

impl PixelFifo {
    pub fn new() -> PixelFifo {
        PixelFifo {
            buffer: [Pixel::default(); FIFO_CAPACITY],
            head: 0,
            length: 0,
            fetch: None,
            row: 0,
            emitted: 0,
            discard: 0,
            background_x: 0,
            window_active: false,
            window_x: 0,
            window_line: 0,
            sprites: Vec::with_capacity(MAX_SPRITES_PER_ROW),
            fetched: [false; MAX_SPRITES_PER_ROW],
        }
    }

    pub fn new_row(&mut self, row: usize, sprites: &[Sprite], memory: &VideoMemory) {
        self.clear();
        self.row = row;
        self.emitted = 0;
        self.discard = (memory.scx % 8) as usize;
        self.background_x = memory.scx & !0b111;
        self.window_active = false;
        self.window_x = 0;
        self.sprites.clear();
        self.sprites.extend_from_slice(&sprites[..sprites.len().min(MAX_SPRITES_PER_ROW)]);
        self.fetched = [false; MAX_SPRITES_PER_ROW];
    }

    /// The window keeps its own line counter, only rows that showed it advance it.
    pub fn end_row(&mut self) {
        if self.window_active {
            self.window_line = self.window_line.wrapping_add(1);
        }
    }

    pub fn new_frame(&mut self) {
        self.window_line = 0;
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.length
    }

    #[inline]
    pub fn emitted(&self) -> usize {
        self.emitted
    }

    #[inline]
    pub fn window_line(&self) -> u8 {
        self.window_line
    }

    /// Runs one cycle. Returns true once the 160th pixel of the row is out.
    pub fn advance(&mut self, memory: &VideoMemory, screen: &mut Screen) -> bool {
        if self.emitted >= SCREEN_WIDTH {
            return true;
        }

        self.tick_fetch();
        self.check_window(memory);

        if self.fetch.is_none() {
            if self.length <= MIN_PIXELS {
                self.start_background_fetch(memory);
            } else if self.discard == 0 {
                if let Some(slot) = self.pending_sprite(memory) {
                    self.start_sprite_fetch(slot, memory);
                }
            }
        }

        // Shifting stalls while sprite data is on its way
        if matches!(self.fetch, Some(Fetch { kind: FetchKind::Sprite { .. }, .. })) {
            return false;
        }
        if self.length < MIN_PIXELS {
            return false;
        }
        if self.discard > 0 {
            self.pop();
            self.discard -= 1;
            return false;
        }
        if self.pending_sprite(memory).is_some() {
            return false;
        }

        let pixel = self.pop();
        screen.draw_pixel(self.emitted, self.row, Self::shade(&pixel, memory));
        self.emitted += 1;
        self.emitted == SCREEN_WIDTH
    }

    fn shade(pixel: &Pixel, memory: &VideoMemory) -> Palette {
        let register = match pixel.source {
            PixelSource::Background => memory.bgp,
            PixelSource::Sprite0 => memory.obp0,
            PixelSource::Sprite1 => memory.obp1,
        };
        Palette::from_register(register, pixel.color)
    }

    fn tick_fetch(&mut self) {
        let Some(mut fetch) = self.fetch.take() else {
            return;
        };

        fetch.remaining -= 1;
        if fetch.remaining > 0 {
            self.fetch = Some(fetch);
            return;
        }

        match fetch.kind {
            FetchKind::Background => {
                for pixel in fetch.pixels {
                    self.push(pixel);
                }
            }
            FetchKind::Sprite { slot } => {
                self.overlay(&fetch);
                self.fetched[slot] = true;
            }
        }
    }

    fn check_window(&mut self, memory: &VideoMemory) {
        if self.window_active
            || !memory.lcdc.contains(LcdControl::WINDOW_DISPLAY)
            || self.row < memory.wy as usize
            || self.emitted + 7 < memory.wx as usize
        {
            return;
        }

        self.window_active = true;
        self.clear();
        self.window_x = 0;
        // WX below 7 starts the window left of the screen
        self.discard = if self.emitted == 0 {
            7usize.saturating_sub(memory.wx as usize)
        } else {
            0
        };
    }

    fn start_background_fetch(&mut self, memory: &VideoMemory) {
        let colors = if self.window_active {
            let map = if memory.lcdc.contains(LcdControl::WINDOW_TILE_MAP) {
                TILE_MAP_1_ADDRESS
            } else {
                TILE_MAP_0_ADDRESS
            };
            let colors = memory.tile_map_row(map, self.window_x, self.window_line);
            self.window_x = self.window_x.wrapping_add(8);
            colors
        } else {
            let map = if memory.lcdc.contains(LcdControl::BG_TILE_MAP) {
                TILE_MAP_1_ADDRESS
            } else {
                TILE_MAP_0_ADDRESS
            };
            let y = (self.row as u8).wrapping_add(memory.scy);
            let colors = memory.tile_map_row(map, self.background_x, y);
            self.background_x = self.background_x.wrapping_add(8);
            colors
        };

        // Background and window both blank to color 0 when disabled
        let colors = if memory.lcdc.contains(LcdControl::BG_DISPLAY) {
            colors
        } else {
            [0; 8]
        };

        self.fetch = Some(Fetch {
            kind: FetchKind::Background,
            pixels: colors.map(Pixel::background),
            remaining: FETCH_CYCLES,
            skip: 0,
        });
    }

    /// First unfetched sprite starting at the next output column.
    fn pending_sprite(&self, memory: &VideoMemory) -> Option<usize> {
        if !memory.lcdc.contains(LcdControl::OBJ_DISPLAY) {
            return None;
        }

        let x = self.emitted as i16;
        self.sprites.iter().enumerate().position(|(slot, sprite)| {
            let origin = sprite.origin_x();
            !self.fetched[slot] && (origin == x || (x == 0 && origin < 0 && origin > -8))
        })
    }

    fn start_sprite_fetch(&mut self, slot: usize, memory: &VideoMemory) {
        let sprite = self.sprites[slot];
        let address = sprite.tile_row_address(self.row, memory.sprite_height());
        let mut colors = decode_tile_row(memory.vram_byte(address), memory.vram_byte(address + 1));
        if sprite.flags.contains(SpriteFlags::FLIP_X) {
            colors.reverse();
        }

        let source = if sprite.flags.contains(SpriteFlags::PALETTE) {
            PixelSource::Sprite1
        } else {
            PixelSource::Sprite0
        };
        let behind_background = sprite.flags.contains(SpriteFlags::PRIORITY);

        self.fetch = Some(Fetch {
            kind: FetchKind::Sprite { slot },
            pixels: colors.map(|color| Pixel {
                color,
                source,
                behind_background,
            }),
            remaining: FETCH_CYCLES,
            skip: (-sprite.origin_x()).max(0) as usize,
        });
    }

    fn overlay(&mut self, fetch: &Fetch) {
        for (offset, sprite_pixel) in fetch.pixels.iter().enumerate().skip(fetch.skip) {
            let target = offset - fetch.skip;
            if sprite_pixel.color == 0 || target >= self.length {
                continue;
            }

            let index = (self.head + target) % FIFO_CAPACITY;
            let existing = self.buffer[index];
            // Sprites fetched earlier keep their opaque pixels
            if existing.is_sprite() {
                continue;
            }
            if !sprite_pixel.behind_background || existing.color == 0 {
                self.buffer[index] = *sprite_pixel;
            }
        }
    }

    fn push(&mut self, pixel: Pixel) {
        assert!(self.length < FIFO_CAPACITY, "Pixel FIFO overflow on row {}", self.row);
        self.buffer[(self.head + self.length) % FIFO_CAPACITY] = pixel;
        self.length += 1;
    }

    fn pop(&mut self) -> Pixel {
        assert!(self.length > 0, "Pixel FIFO underflow on row {}", self.row);
        let pixel = self.buffer[self.head];
        self.head = (self.head + 1) % FIFO_CAPACITY;
        self.length -= 1;
        pixel
    }

    fn clear(&mut self) {
        self.head = 0;
        self.length = 0;
        self.fetch = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::video::palette::ScreenStyle;

    const BLACK: [u8; 3] = [0x00, 0x00, 0x00];
    const WHITE: [u8; 3] = [0xff, 0xff, 0xff];
    const LIGHT: [u8; 3] = [0xaa, 0xaa, 0xaa];

    fn memory() -> VideoMemory {
        let mut memory = VideoMemory::new();
        memory.vram.fill(0);
        memory.lcdc = LcdControl::from(0x93);
        memory.bgp = 0b1110_0100;
        memory.obp0 = 0b1110_0100;
        memory.obp1 = 0b1110_0100;
        memory
    }

    /// Tile 1 is solid color 3, tile 2 solid color 1.
    fn with_tiles(memory: &mut VideoMemory) {
        for line in 0..8 {
            memory.vram[0x10 + line * 2] = 0xff;
            memory.vram[0x10 + line * 2 + 1] = 0xff;
            memory.vram[0x20 + line * 2] = 0xff;
        }
    }

    fn run_row(fifo: &mut PixelFifo, memory: &VideoMemory, screen: &mut Screen) -> usize {
        let mut cycles = 0;
        while !fifo.advance(memory, screen) {
            assert!(fifo.len() <= FIFO_CAPACITY);
            cycles += 1;
            assert!(cycles < 376, "row did not finish");
        }
        screen.vblank_began();
        cycles
    }

    #[test]
    fn background_row_emits_160_pixels() {
        let mut memory = memory();
        with_tiles(&mut memory);
        // Every other tile of the first map row is black
        for column in (0..32).step_by(2) {
            memory.vram[0x1800 + column] = 1;
        }
        let mut screen = Screen::new(ScreenStyle::White);
        let mut fifo = PixelFifo::new();

        fifo.new_row(0, &[], &memory);
        run_row(&mut fifo, &memory, &mut screen);

        assert_eq!(fifo.emitted(), SCREEN_WIDTH);
        assert_eq!(screen.pixel(0, 0), BLACK);
        assert_eq!(screen.pixel(7, 0), BLACK);
        assert_eq!(screen.pixel(8, 0), WHITE);
        assert_eq!(screen.pixel(159, 0), WHITE);
    }

    #[test]
    fn fine_scroll_discards_leading_pixels() {
        let mut memory = memory();
        with_tiles(&mut memory);
        memory.vram[0x1800] = 1;
        memory.scx = 3;
        let mut screen = Screen::new(ScreenStyle::White);
        let mut fifo = PixelFifo::new();

        fifo.new_row(0, &[], &memory);
        run_row(&mut fifo, &memory, &mut screen);

        assert_eq!(screen.pixel(4, 0), BLACK);
        assert_eq!(screen.pixel(5, 0), WHITE);
    }

    #[test]
    fn sprites_draw_over_color_zero_and_respect_priority() {
        let mut memory = memory();
        with_tiles(&mut memory);
        // Columns 8..16 are background color 3 (black)
        memory.vram[0x1801] = 1;
        let front = Sprite {
            x: 8,
            y: 16,
            tile_index: 2,
            flags: SpriteFlags::empty(),
        };
        let behind = Sprite {
            x: 16,
            y: 16,
            tile_index: 2,
            flags: SpriteFlags::PRIORITY,
        };
        let mut screen = Screen::new(ScreenStyle::White);
        let mut fifo = PixelFifo::new();

        fifo.new_row(0, &[front, behind], &memory);
        run_row(&mut fifo, &memory, &mut screen);

        // Over a white background both kinds show
        assert_eq!(screen.pixel(0, 0), LIGHT);
        // Behind-background sprites lose against non-zero background colors
        assert_eq!(screen.pixel(8, 0), BLACK);
    }

    #[test]
    fn first_sprite_keeps_overlapping_pixels() {
        let mut memory = memory();
        with_tiles(&mut memory);
        let light = Sprite {
            x: 8,
            y: 16,
            tile_index: 2,
            flags: SpriteFlags::empty(),
        };
        let black = Sprite {
            x: 12,
            y: 16,
            tile_index: 1,
            flags: SpriteFlags::empty(),
        };
        let mut screen = Screen::new(ScreenStyle::White);
        let mut fifo = PixelFifo::new();

        fifo.new_row(0, &[light, black], &memory);
        run_row(&mut fifo, &memory, &mut screen);

        assert_eq!(screen.pixel(5, 0), LIGHT);
        assert_eq!(screen.pixel(8, 0), BLACK);
        assert_eq!(screen.pixel(11, 0), BLACK);
        assert_eq!(screen.pixel(12, 0), WHITE);
    }

    #[test]
    fn sprites_clipped_by_the_left_edge_still_show() {
        let mut memory = memory();
        with_tiles(&mut memory);
        let sprite = Sprite {
            x: 3,
            y: 16,
            tile_index: 1,
            flags: SpriteFlags::empty(),
        };
        let mut screen = Screen::new(ScreenStyle::White);
        let mut fifo = PixelFifo::new();

        fifo.new_row(0, &[sprite], &memory);
        run_row(&mut fifo, &memory, &mut screen);

        assert_eq!(screen.pixel(2, 0), BLACK);
        assert_eq!(screen.pixel(3, 0), WHITE);
    }

    #[test]
    fn window_replaces_background_from_wx() {
        let mut memory = memory();
        with_tiles(&mut memory);
        // Window map at $9c00 is all black tiles
        memory.vram[0x1c00..0x1c20].fill(1);
        memory.lcdc = LcdControl::from(0x93 | 0x20 | 0x40);
        memory.wy = 0;
        memory.wx = 7 + 80;
        let mut screen = Screen::new(ScreenStyle::White);
        let mut fifo = PixelFifo::new();

        fifo.new_row(0, &[], &memory);
        run_row(&mut fifo, &memory, &mut screen);
        fifo.end_row();

        assert_eq!(screen.pixel(79, 0), WHITE);
        assert_eq!(screen.pixel(80, 0), BLACK);
        assert_eq!(screen.pixel(159, 0), BLACK);
        assert_eq!(fifo.window_line(), 1);

        fifo.new_frame();
        assert_eq!(fifo.window_line(), 0);
    }

    #[test]
    fn disabled_background_draws_color_zero() {
        let mut memory = memory();
        with_tiles(&mut memory);
        memory.vram[0x1800] = 1;
        memory.lcdc = LcdControl::from(0x92);
        memory.bgp = 0b1110_0101;
        let mut screen = Screen::new(ScreenStyle::White);
        let mut fifo = PixelFifo::new();

        fifo.new_row(0, &[], &memory);
        run_row(&mut fifo, &memory, &mut screen);

        assert_eq!(screen.pixel(0, 0), LIGHT);
    }
}
