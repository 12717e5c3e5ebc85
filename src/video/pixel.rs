#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PixelSource {
    #[default]
    Background,
    Sprite0,
    Sprite1,
}

/// A pixel waiting in the FIFO. Colors stay as raw 2-bit values until drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pixel {
    pub color: u8,
    pub source: PixelSource,
    pub behind_background: bool,
}

impl Pixel {
    pub fn background(color: u8) -> Pixel {
        Pixel {
            color,
            source: PixelSource::Background,
            behind_background: false,
        }
    }

    #[inline]
    pub fn is_sprite(&self) -> bool {
        self.source != PixelSource::Background
    }
}

/// Expands one row of a tile from its two bit planes, leftmost pixel first.
pub fn decode_tile_row(low: u8, high: u8) -> [u8; 8] {
    let mut colors = [0; 8];
    for (x, color) in colors.iter_mut().enumerate() {
        let bit = 7 - x;
        *color = (((high >> bit) & 1) << 1) | ((low >> bit) & 1);
    }
    colors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tile_rows_combine_both_planes() {
        assert_eq!(decode_tile_row(0b1010_0000, 0b1100_0001), [3, 2, 1, 0, 0, 0, 0, 2]);
        assert_eq!(decode_tile_row(0, 0), [0; 8]);
    }
}
