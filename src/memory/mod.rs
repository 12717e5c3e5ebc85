pub mod addressable;
pub mod mapper;
pub mod mmu;
pub mod registers;
pub mod router;

pub const BOOTROM_SIZE: usize = 0x100;

pub const ROM_END: u16 = 0x7fff;
pub const VIDEO_RAM_START: u16 = 0x8000;
pub const VIDEO_RAM_END: u16 = 0x9fff;
pub const EXTERNAL_RAM_START: u16 = 0xa000;
pub const EXTERNAL_RAM_END: u16 = 0xbfff;
pub const WORK_RAM_START: u16 = 0xc000;
pub const WORK_RAM_END: u16 = 0xdfff;
pub const ECHO_RAM_START: u16 = 0xe000;
pub const ECHO_RAM_END: u16 = 0xfdff;
pub const OAM_START: u16 = 0xfe00;
pub const OAM_END: u16 = 0xfe9f;
pub const FORBIDDEN_START: u16 = 0xfea0;
pub const FORBIDDEN_END: u16 = 0xfeff;
pub const IO_START: u16 = 0xff00;
pub const HIGH_RAM_START: u16 = 0xff80;
pub const HIGH_RAM_END: u16 = 0xfffe;

pub const WORK_RAM_SIZE: usize = 0x2000;
pub const HIGH_RAM_SIZE: usize = 0x7f;

pub const JOYPAD_REGISTER: u16 = 0xff00;
pub const SERIAL_DATA_REGISTER: u16 = 0xff01;
pub const SERIAL_CONTROL_REGISTER: u16 = 0xff02;
pub const DIV_REGISTER: u16 = 0xff04;
pub const TIMA_REGISTER: u16 = 0xff05;
pub const TMA_REGISTER: u16 = 0xff06;
pub const TAC_REGISTER: u16 = 0xff07;
pub const INTERRUPT_FLAGS_REGISTER: u16 = 0xff0f;
pub const SOUND_START: u16 = 0xff10;
pub const SOUND_END: u16 = 0xff3f;
pub const OAM_DMA_REGISTER: u16 = 0xff46;
pub const BOOTROM_MAPPER_REGISTER: u16 = 0xff50;
pub const INTERRUPT_ENABLE_REGISTER: u16 = 0xffff;
