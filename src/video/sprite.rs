use bitflags::bitflags;

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
    pub struct SpriteFlags: u8 {
        const PALETTE   = 0b0001_0000;
        const FLIP_X    = 0b0010_0000;
        const FLIP_Y    = 0b0100_0000;
        const PRIORITY  = 0b1000_0000;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Sprite {
    pub x: u8,
    pub y: u8,
    pub tile_index: u8,
    pub flags: SpriteFlags,
}

impl Sprite {
    /// Decodes entry `index` of the 40 four-byte OAM records.
    pub fn from_oam(oam: &[u8], index: usize) -> Sprite {
        let entry = &oam[index * 4..index * 4 + 4];

        Sprite {
            y: entry[0],
            x: entry[1],
            tile_index: entry[2],
            flags: SpriteFlags::from_bits_truncate(entry[3]),
        }
    }

    /// Screen column of the sprite's left edge, may be negative.
    #[inline]
    pub fn origin_x(&self) -> i16 {
        self.x as i16 - 8
    }

    #[inline]
    pub fn origin_y(&self) -> i16 {
        self.y as i16 - 16
    }

    pub fn is_visible_on_row(&self, row: usize, height: u8) -> bool {
        let row = row as i16;
        row >= self.origin_y() && row < self.origin_y() + height as i16
    }

    /// Address of the tile row covering screen `row`, flips applied.
    pub fn tile_row_address(&self, row: usize, height: u8) -> u16 {
        let mut line = (row as i16 - self.origin_y()) as u16;
        if self.flags.contains(SpriteFlags::FLIP_Y) {
            line = height as u16 - 1 - line;
        }

        let tile = if height == 16 {
            self.tile_index & 0xfe
        } else {
            self.tile_index
        };

        super::TILE_DATA_UNSIGNED_ADDRESS + tile as u16 * 16 + line * 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visibility_uses_the_offset_origin() {
        let sprite = Sprite {
            x: 8,
            y: 16,
            ..Sprite::default()
        };
        assert!(sprite.is_visible_on_row(0, 8));
        assert!(sprite.is_visible_on_row(7, 8));
        assert!(!sprite.is_visible_on_row(8, 8));
        assert!(sprite.is_visible_on_row(15, 16));

        let partially_above = Sprite { y: 10, ..sprite };
        assert!(partially_above.is_visible_on_row(0, 8));
        assert!(!partially_above.is_visible_on_row(2, 8));
    }

    #[test]
    fn tall_sprites_ignore_the_low_tile_bit_and_flip_vertically() {
        let sprite = Sprite {
            x: 8,
            y: 16,
            tile_index: 0x03,
            flags: SpriteFlags::FLIP_Y,
        };
        assert_eq!(sprite.tile_row_address(0, 16), 0x8000 + 0x02 * 16 + 15 * 2);
        assert_eq!(sprite.tile_row_address(0, 8), 0x8000 + 0x03 * 16 + 7 * 2);
    }
}
