use bitflags::bitflags;

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct InterruptFlags: u8 {
        const VBLANK    = 0b00001;
        const LCD_STAT  = 0b00010;
        const TIMER     = 0b00100;
        const SERIAL    = 0b01000;
        const JOYPAD    = 0b10000;
    }
}

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct LcdControl: u8 {
        const BG_DISPLAY = 0b0000_0001;
        const OBJ_DISPLAY = 0b0000_0010;
        const OBJ_SIZE = 0b0000_0100;
        const BG_TILE_MAP = 0b0000_1000;
        const BG_TILE_DATA = 0b0001_0000;
        const WINDOW_DISPLAY = 0b0010_0000;
        const WINDOW_TILE_MAP = 0b0100_0000;
        const LCD_DISPLAY = 0b1000_0000;
    }
}

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct LcdStatus: u8 {
        const COINCIDENCE = 0b0000_0100;
        const HBLANK_INTERRUPT = 0b0000_1000;
        const VBLANK_INTERRUPT = 0b0001_0000;
        const OAM_INTERRUPT = 0b0010_0000;
        const COINCIDENCE_INTERRUPT = 0b0100_0000;
    }
}

impl From<u8> for InterruptFlags {
    fn from(byte: u8) -> Self {
        Self::from_bits_truncate(byte)
    }
}

impl From<u8> for LcdControl {
    fn from(byte: u8) -> Self {
        Self::from_bits_truncate(byte)
    }
}

impl From<u8> for LcdStatus {
    fn from(byte: u8) -> Self {
        Self::from_bits_truncate(byte)
    }
}

impl InterruptFlags {
    /// Interrupts in servicing order.
    pub const PRIORITY: [InterruptFlags; 5] = [
        InterruptFlags::VBLANK,
        InterruptFlags::LCD_STAT,
        InterruptFlags::TIMER,
        InterruptFlags::SERIAL,
        InterruptFlags::JOYPAD,
    ];

    /// Restart address of a single interrupt kind.
    pub fn to_vector(&self) -> Option<u16> {
        if self.contains(InterruptFlags::VBLANK) {
            Some(0x0040)
        } else if self.contains(InterruptFlags::LCD_STAT) {
            Some(0x0048)
        } else if self.contains(InterruptFlags::TIMER) {
            Some(0x0050)
        } else if self.contains(InterruptFlags::SERIAL) {
            Some(0x0058)
        } else if self.contains(InterruptFlags::JOYPAD) {
            Some(0x0060)
        } else {
            None
        }
    }
}

impl std::fmt::Display for InterruptFlags {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let name = match *self {
            InterruptFlags::VBLANK => "VBLANK",
            InterruptFlags::LCD_STAT => "STAT",
            InterruptFlags::TIMER => "TIMER",
            InterruptFlags::SERIAL => "SERIAL",
            InterruptFlags::JOYPAD => "JOYPAD",
            _ => return write!(f, "{:05b}", self.bits()),
        };
        write!(f, "{}", name)
    }
}
