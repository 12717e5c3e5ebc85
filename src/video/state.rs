#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum State {
    HBlank,        // H-Blank
    VBlank,        // V-Blank
    OamSearch,     // OAM Search
    PixelTransfer, // Pixel Transfer
}

impl State {
    /// Value of the two mode bits in STAT.
    pub fn as_u8(self) -> u8 {
        match self {
            State::HBlank => 0,
            State::VBlank => 1,
            State::OamSearch => 2,
            State::PixelTransfer => 3,
        }
    }

    /// VRAM is locked while pixels are being pushed to the LCD.
    pub fn can_access_vram(self) -> bool {
        self != State::PixelTransfer
    }

    pub fn can_access_oam(self) -> bool {
        matches!(self, State::HBlank | State::VBlank)
    }
}
