use crate::error::{EdgeError, ScreenshotSnafu};
use crate::video::palette::{Color, Palette, ScreenStyle};
use crate::video::{SCREEN_HEIGHT, SCREEN_WIDTH};
use image::RgbImage;
use log::{info, trace};
use snafu::ResultExt;
use std::path::Path;

/// Double-buffered LCD. The PPU draws into the back buffer and publishes it at VBlank.
pub struct Screen {
    back: Vec<Color>,
    front: Vec<Color>,
    style: ScreenStyle,
    row: usize,
    frames: u64,
}

impl Screen {
    pub fn new(style: ScreenStyle) -> Screen {
        let blank = Palette::White.to_color(style);

        Screen {
            back: vec![blank; SCREEN_WIDTH * SCREEN_HEIGHT],
            front: vec![blank; SCREEN_WIDTH * SCREEN_HEIGHT],
            style,
            row: 0,
            frames: 0,
        }
    }

    #[inline]
    pub fn draw_pixel(&mut self, x: usize, y: usize, shade: Palette) {
        self.back[y * SCREEN_WIDTH + x] = shade.to_color(self.style);
    }

    pub fn new_line(&mut self, row: usize) {
        self.row = row;
    }

    pub fn vblank_began(&mut self) {
        std::mem::swap(&mut self.front, &mut self.back);
        trace!("Frame {} published after row {}", self.frames, self.row);
    }

    pub fn vblank_ended(&mut self) {
        self.frames += 1;
    }

    /// The last completed frame, row-major.
    #[inline]
    pub fn frame(&self) -> &[Color] {
        &self.front
    }

    #[inline]
    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    #[inline]
    pub fn style(&self) -> ScreenStyle {
        self.style
    }

    pub fn set_style(&mut self, style: ScreenStyle) {
        self.style = style;
    }

    pub fn pixel(&self, x: usize, y: usize) -> Color {
        self.front[y * SCREEN_WIDTH + x]
    }

    pub fn save_screenshot(&self, path: &Path) -> Result<(), EdgeError> {
        let mut buffer = RgbImage::new(SCREEN_WIDTH as u32, SCREEN_HEIGHT as u32);
        for (index, color) in self.front.iter().enumerate() {
            let x = (index % SCREEN_WIDTH) as u32;
            let y = (index / SCREEN_WIDTH) as u32;
            buffer.put_pixel(x, y, image::Rgb(*color));
        }

        buffer.save(path).context(ScreenshotSnafu { path })?;
        info!("Saved screenshot to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drawing_is_invisible_until_vblank() {
        let mut screen = Screen::new(ScreenStyle::White);
        screen.draw_pixel(3, 2, Palette::Black);
        assert_eq!(screen.pixel(3, 2), [0xff, 0xff, 0xff]);

        screen.vblank_began();
        assert_eq!(screen.pixel(3, 2), [0x00, 0x00, 0x00]);
        assert_eq!(screen.frame_count(), 0);
        screen.vblank_ended();
        assert_eq!(screen.frame_count(), 1);
    }

    #[test]
    fn screenshot_is_a_png_of_the_front_buffer() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("shot.png");
        let mut screen = Screen::new(ScreenStyle::Green);
        screen.draw_pixel(0, 0, Palette::Black);
        screen.vblank_began();

        screen.save_screenshot(&path).unwrap();
        let image = image::open(&path).unwrap().to_rgb8();
        assert_eq!(image.dimensions(), (160, 144));
        assert_eq!(image.get_pixel(0, 0).0, [0x0f, 0x38, 0x0f]);
        assert_eq!(image.get_pixel(1, 0).0, [0x9b, 0xbc, 0x0f]);
    }
}
