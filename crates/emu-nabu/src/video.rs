//! Composite video output.
//!
//! The VDP's 256×192 picture sits in a 320×240 frame with a 32-pixel
//! border either side and 24 lines above and below, all in the backdrop
//! colour. When the control register's video-enable bit is clear the RF
//! modulator shows static instead.

use ti_tms9918::{ACTIVE_LINES, PALETTE, SCREEN_WIDTH, Tms9918};

pub const FRAME_WIDTH: usize = 320;
pub const FRAME_HEIGHT: usize = 240;

/// First frame line showing VDP output.
const TOP_BORDER: usize = 24;
const LEFT_BORDER: usize = (FRAME_WIDTH - SCREEN_WIDTH) / 2;

/// ARGB framebuffer for one frame.
pub struct Display {
    pixels: Vec<u32>,
    /// xorshift state for the static pattern.
    noise: u32,
}

impl Display {
    #[must_use]
    pub fn new() -> Self {
        Self {
            pixels: vec![0xFF00_0000; FRAME_WIDTH * FRAME_HEIGHT],
            noise: 0x2545_F491,
        }
    }

    #[must_use]
    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    /// Produce frame line `line` (0–239).
    pub fn render_line(&mut self, line: usize, vdp: &mut Tms9918, video_enabled: bool) {
        if line >= FRAME_HEIGHT {
            return;
        }
        let start = line * FRAME_WIDTH;

        if !video_enabled {
            for x in 0..FRAME_WIDTH {
                let level = self.next_noise();
                self.pixels[start + x] = 0xFF00_0000 | (level << 16) | (level << 8) | level;
            }
            return;
        }

        let row = &mut self.pixels[start..start + FRAME_WIDTH];
        let border = PALETTE[usize::from(vdp.backdrop())];
        let active = line.checked_sub(TOP_BORDER).filter(|&l| l < ACTIVE_LINES);
        let Some(vdp_line) = active else {
            row.fill(border);
            return;
        };

        let mut indices = [0u8; SCREEN_WIDTH];
        vdp.render_scanline(vdp_line, &mut indices);
        row[..LEFT_BORDER].fill(border);
        row[LEFT_BORDER + SCREEN_WIDTH..].fill(border);
        for (dst, &idx) in row[LEFT_BORDER..LEFT_BORDER + SCREEN_WIDTH]
            .iter_mut()
            .zip(indices.iter())
        {
            *dst = PALETTE[usize::from(idx)];
        }
    }

    fn next_noise(&mut self) -> u32 {
        let mut x = self.noise;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.noise = x;
        x & 0xFF
    }
}

impl Default for Display {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_vdp(backdrop: u8) -> Tms9918 {
        let mut vdp = Tms9918::new();
        vdp.write_control(0x40);
        vdp.write_control(0x81);
        vdp.write_control(backdrop);
        vdp.write_control(0x87);
        vdp
    }

    #[test]
    fn border_lines_use_backdrop() {
        let mut vdp = make_vdp(0x04);
        let mut display = Display::new();
        display.render_line(0, &mut vdp, true);
        assert!(display.pixels()[..FRAME_WIDTH].iter().all(|&p| p == PALETTE[4]));
    }

    #[test]
    fn active_line_has_side_borders() {
        let mut vdp = make_vdp(0x07);
        let mut display = Display::new();
        display.render_line(TOP_BORDER, &mut vdp, true);
        let row = &display.pixels()[TOP_BORDER * FRAME_WIDTH..][..FRAME_WIDTH];
        assert_eq!(row[0], PALETTE[7]);
        assert_eq!(row[FRAME_WIDTH - 1], PALETTE[7]);
    }

    #[test]
    fn disabled_video_shows_static() {
        let mut vdp = make_vdp(0x04);
        let mut display = Display::new();
        display.render_line(100, &mut vdp, false);
        let row = &display.pixels()[100 * FRAME_WIDTH..][..FRAME_WIDTH];
        let first = row[0];
        assert!(row.iter().any(|&p| p != first), "static varies across the line");
        assert!(row.iter().all(|&p| p >> 24 == 0xFF));
    }
}
