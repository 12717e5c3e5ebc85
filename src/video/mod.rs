pub mod fifo;
pub mod palette;
pub mod pixel;
pub mod ppu;
pub mod screen;
pub mod sprite;
pub mod state;

pub const SCREEN_WIDTH: usize = 160;
pub const SCREEN_HEIGHT: usize = 144;

pub const OAM_SEARCH_CYCLES: usize = 80;
pub const PIXEL_TRANSFER_CYCLES: usize = 172;
pub const HBLANK_CYCLES: usize = 204;
pub const ROW_CYCLES: usize = OAM_SEARCH_CYCLES + PIXEL_TRANSFER_CYCLES + HBLANK_CYCLES;
pub const VBLANK_ROWS: usize = 10;
pub const VISIBLE_CYCLES: usize = SCREEN_HEIGHT * ROW_CYCLES;
pub const TOTAL_FRAME_CYCLES: usize = (SCREEN_HEIGHT + VBLANK_ROWS) * ROW_CYCLES;

pub const VIDEO_RAM_SIZE: usize = 0x2000;
pub const OAM_SIZE: usize = 0xa0;
pub const SPRITE_COUNT: usize = 40;
pub const MAX_SPRITES_PER_ROW: usize = 10;

pub const TILE_DATA_UNSIGNED_ADDRESS: u16 = 0x8000;
pub const TILE_DATA_SIGNED_ADDRESS: u16 = 0x9000;
pub const TILE_MAP_0_ADDRESS: u16 = 0x9800;
pub const TILE_MAP_1_ADDRESS: u16 = 0x9c00;

pub const LCD_CONTROL_REGISTER: u16 = 0xff40;
pub const LCD_STATUS_REGISTER: u16 = 0xff41;
pub const SCROLL_Y_REGISTER: u16 = 0xff42;
pub const SCROLL_X_REGISTER: u16 = 0xff43;
pub const SCANLINE_Y_REGISTER: u16 = 0xff44;
pub const SCANLINE_Y_COMPARE_REGISTER: u16 = 0xff45;
pub const BG_PALETTE_REGISTER: u16 = 0xff47;
pub const OBJ0_PALETTE_REGISTER: u16 = 0xff48;
pub const OBJ1_PALETTE_REGISTER: u16 = 0xff49;
pub const WINDOW_Y_REGISTER: u16 = 0xff4a;
pub const WINDOW_X_REGISTER: u16 = 0xff4b;
