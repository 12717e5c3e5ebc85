use std::fmt::{Display, Formatter};
use std::str::FromStr;

pub type Color = [u8; 3];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Palette {
    White,
    LightGray,
    DarkGray,
    Black,
}

impl Palette {
    /// Looks a 2-bit color up in one of the BGP/OBP0/OBP1 registers.
    pub fn from_register(register: u8, color: u8) -> Palette {
        match (register >> ((color & 0b11) * 2)) & 0b11 {
            0b00 => Palette::White,
            0b01 => Palette::LightGray,
            0b10 => Palette::DarkGray,
            _ => Palette::Black,
        }
    }

    pub fn to_color(self, style: ScreenStyle) -> Color {
        match style {
            ScreenStyle::White => match self {
                Palette::White => [0xff, 0xff, 0xff],
                Palette::LightGray => [0xaa, 0xaa, 0xaa],
                Palette::DarkGray => [0x55, 0x55, 0x55],
                Palette::Black => [0x00, 0x00, 0x00],
            },
            ScreenStyle::Green => match self {
                Palette::White => [0x9b, 0xbc, 0x0f],
                Palette::LightGray => [0x8b, 0xac, 0x0f],
                Palette::DarkGray => [0x30, 0x62, 0x30],
                Palette::Black => [0x0f, 0x38, 0x0f],
            },
        }
    }
}

impl Default for Palette {
    fn default() -> Palette {
        Palette::White
    }
}

/// Colors used for the four shades.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScreenStyle {
    #[default]
    White,
    Green,
}

impl FromStr for ScreenStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "white" => Ok(ScreenStyle::White),
            "green" => Ok(ScreenStyle::Green),
            _ => Err(format!("Unknown screen style: {}", s)),
        }
    }
}

impl Display for ScreenStyle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ScreenStyle::White => write!(f, "white"),
            ScreenStyle::Green => write!(f, "green"),
        }
    }
}
