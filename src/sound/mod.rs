pub mod controller;

pub const NR10: u16 = 0xff10;
pub const NR11: u16 = 0xff11;
pub const NR14: u16 = 0xff14;
pub const NR21: u16 = 0xff16;
pub const NR30: u16 = 0xff1a;
pub const NR44: u16 = 0xff23;
pub const MASTER_VOLUME_REGISTER: u16 = 0xff24; // NR50
pub const OUTPUT_SELECT_REGISTER: u16 = 0xff25; // NR51
pub const MASTER_CONTROL_REGISTER: u16 = 0xff26; // NR52
pub const WAVE_RAM_START: u16 = 0xff30;
pub const WAVE_RAM_END: u16 = 0xff3f;

/// Bits that always read back as 1, indexed from NR10.
pub const READ_MASKS: [u8; 0x20] = [
    0x80, 0x3f, 0x00, 0xff, 0xbf, // NR10-NR14
    0xff, 0x3f, 0x00, 0xff, 0xbf, // NR20-NR24
    0x7f, 0xff, 0x9f, 0xff, 0xbf, // NR30-NR34
    0xff, 0xff, 0x00, 0x00, 0xbf, // NR40-NR44
    0x00, 0x00, 0x70, // NR50-NR52
    0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, // unused
];
