//! Line-at-a-time pixel generation.
//!
//! Each call produces one row of palette indices. Background layers are
//! drawn first, then sprites in priority order (sprite 0 on top). The
//! sprite pass also updates the 5S / C status bits for that line.

use crate::{Mode, STATUS_5S, STATUS_C, Tms9918};

/// Active pixels per line.
pub const SCREEN_WIDTH: usize = 256;

/// Active lines per frame.
pub const ACTIVE_LINES: usize = 192;

/// Sprite Y value that terminates the attribute table scan.
const SPRITE_TERMINATOR: u8 = 0xD0;

const SPRITES_PER_LINE: usize = 4;

impl Tms9918 {
    /// Render active line `line` (0-191) into `out` as palette indices.
    ///
    /// Transparent pixels are resolved to the backdrop colour, so every
    /// entry of `out` indexes [`PALETTE`](crate::PALETTE) directly.
    pub fn render_scanline(&mut self, line: usize, out: &mut [u8; SCREEN_WIDTH]) {
        let backdrop = self.backdrop();
        if line >= ACTIVE_LINES || !self.display_enabled() {
            out.fill(backdrop);
            return;
        }

        match self.mode() {
            Mode::Graphics1 => self.graphics1_line(line, out),
            Mode::Graphics2 => self.graphics2_line(line, out),
            Mode::Multicolor => self.multicolor_line(line, out),
            Mode::Text => self.text_line(line, out),
        }

        if self.mode() != Mode::Text {
            self.sprite_line(line, out);
        }

        for px in out.iter_mut() {
            if *px == 0 {
                *px = backdrop;
            }
        }
    }

    fn name_table(&self) -> usize {
        usize::from(self.regs[2] & 0x0F) << 10
    }

    fn pattern_table(&self) -> usize {
        usize::from(self.regs[4] & 0x07) << 11
    }

    fn byte(&self, address: usize) -> u8 {
        self.vram[address & 0x3FFF]
    }

    fn draw_pattern(out: &mut [u8], x: usize, pattern: u8, colour: u8) {
        let fg = colour >> 4;
        let bg = colour & 0x0F;
        for bit in 0..8 {
            out[x + bit] = if pattern & (0x80 >> bit) != 0 { fg } else { bg };
        }
    }

    fn graphics1_line(&self, line: usize, out: &mut [u8; SCREEN_WIDTH]) {
        let row = line / 8;
        let colour_table = usize::from(self.regs[3]) << 6;
        for col in 0..32 {
            let name = usize::from(self.byte(self.name_table() + row * 32 + col));
            let pattern = self.byte(self.pattern_table() + name * 8 + line % 8);
            let colour = self.byte(colour_table + name / 8);
            Self::draw_pattern(out, col * 8, pattern, colour);
        }
    }

    fn graphics2_line(&self, line: usize, out: &mut [u8; SCREEN_WIDTH]) {
        let row = line / 8;
        let third = line / 64;
        let pattern_base = usize::from(self.regs[4] & 0x04) << 11;
        let pattern_mask = (usize::from(self.regs[4] & 0x03) << 11) | 0x7FF;
        let colour_base = usize::from(self.regs[3] & 0x80) << 6;
        let colour_mask = (usize::from(self.regs[3] & 0x7F) << 6) | 0x3F;

        for col in 0..32 {
            let name = usize::from(self.byte(self.name_table() + row * 32 + col));
            let offset = (third * 256 + name) * 8 + line % 8;
            let pattern = self.byte(pattern_base + (offset & pattern_mask));
            let colour = self.byte(colour_base + (offset & colour_mask));
            Self::draw_pattern(out, col * 8, pattern, colour);
        }
    }

    fn multicolor_line(&self, line: usize, out: &mut [u8; SCREEN_WIDTH]) {
        let row = line / 8;
        for col in 0..32 {
            let name = usize::from(self.byte(self.name_table() + row * 32 + col));
            let block = self.byte(self.pattern_table() + name * 8 + (row & 3) * 2 + (line % 8) / 4);
            out[col * 8..col * 8 + 4].fill(block >> 4);
            out[col * 8 + 4..col * 8 + 8].fill(block & 0x0F);
        }
    }

    fn text_line(&self, line: usize, out: &mut [u8; SCREEN_WIDTH]) {
        let fg = self.regs[7] >> 4;
        let bg = self.regs[7] & 0x0F;
        let row = line / 8;

        out[..8].fill(bg);
        out[248..].fill(bg);
        for col in 0..40 {
            let name = usize::from(self.byte(self.name_table() + row * 40 + col));
            let pattern = self.byte(self.pattern_table() + name * 8 + line % 8);
            for bit in 0..6 {
                out[8 + col * 6 + bit] = if pattern & (0x80 >> bit) != 0 { fg } else { bg };
            }
        }
    }

    fn sprite_line(&mut self, line: usize, out: &mut [u8; SCREEN_WIDTH]) {
        let attributes = usize::from(self.regs[5] & 0x7F) << 7;
        let patterns = usize::from(self.regs[6] & 0x07) << 11;
        let large = self.regs[1] & 0x02 != 0;
        let magnify = u32::from(self.regs[1] & 0x01);
        let size = (if large { 16 } else { 8 }) << magnify;

        let mut occupied = [false; SCREEN_WIDTH];
        let mut on_line = 0;

        for sprite in 0..32 {
            let entry = attributes + sprite * 4;
            let y = self.byte(entry);
            if y == SPRITE_TERMINATOR {
                break;
            }

            // Y is one less than the first line; values past 0xE0 wrap to
            // partially visible sprites at the top edge.
            let top = if y > 0xE0 { i32::from(y) - 255 } else { i32::from(y) + 1 };
            let dy = line as i32 - top;
            if dy < 0 || dy >= size {
                continue;
            }

            on_line += 1;
            if on_line > SPRITES_PER_LINE {
                if self.status & STATUS_5S == 0 {
                    self.status = (self.status & 0xE0) | STATUS_5S | sprite as u8;
                }
                break;
            }

            let mut x = i32::from(self.byte(entry + 1));
            let mut name = usize::from(self.byte(entry + 2));
            let attr = self.byte(entry + 3);
            if attr & 0x80 != 0 {
                x -= 32;
            }
            if large {
                name &= 0xFC;
            }
            let colour = attr & 0x0F;
            let row = (dy >> magnify) as usize;

            let width = if large { 16 } else { 8 };
            for px in 0..width {
                let half = px / 8;
                let pattern = self.byte(patterns + name * 8 + half * 16 + row);
                if pattern & (0x80 >> (px % 8)) == 0 {
                    continue;
                }
                for rep in 0..(1 << magnify) {
                    let sx = x + ((px << magnify) + rep) as i32;
                    if !(0..SCREEN_WIDTH as i32).contains(&sx) {
                        continue;
                    }
                    let sx = sx as usize;
                    if occupied[sx] {
                        self.status |= STATUS_C;
                        continue;
                    }
                    occupied[sx] = true;
                    if colour != 0 {
                        out[sx] = colour;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{Mode, PALETTE, STATUS_5S, STATUS_C, Tms9918};

    use super::SCREEN_WIDTH;

    fn make_vdp(reg0: u8, reg1: u8) -> Tms9918 {
        let mut vdp = Tms9918::new();
        // Name 0x1800, colour 0x2000, patterns 0x0000, sprites 0x1B00/0x3800.
        let regs = [reg0, reg1, 0x06, 0x80, 0x00, 0x36, 0x07, 0x04];
        for (i, value) in regs.into_iter().enumerate() {
            vdp.write_control(value);
            vdp.write_control(0x80 | i as u8);
        }
        vdp
    }

    fn poke(vdp: &mut Tms9918, address: u16, bytes: &[u8]) {
        vdp.write_control(address as u8);
        vdp.write_control(0x40 | (address >> 8) as u8);
        for &b in bytes {
            vdp.write_data(b);
        }
    }

    fn line(vdp: &mut Tms9918, n: usize) -> [u8; SCREEN_WIDTH] {
        let mut out = [0u8; SCREEN_WIDTH];
        vdp.render_scanline(n, &mut out);
        out
    }

    #[test]
    fn blank_display_shows_backdrop() {
        let mut vdp = make_vdp(0, 0x00);
        let out = line(&mut vdp, 10);
        assert!(out.iter().all(|&c| c == 4));
    }

    #[test]
    fn graphics1_draws_pattern_colours() {
        let mut vdp = make_vdp(0, 0x40);
        assert_eq!(vdp.mode(), Mode::Graphics1);
        poke(&mut vdp, 0x1800, &[1]); // top-left cell uses pattern 1
        poke(&mut vdp, 0x0008, &[0xF0]); // pattern 1, row 0
        poke(&mut vdp, 0x2000, &[0xF1]); // colours for patterns 0-7: white on black

        let out = line(&mut vdp, 0);
        assert_eq!(&out[..8], &[15, 15, 15, 15, 1, 1, 1, 1]);
    }

    #[test]
    fn transparent_background_resolves_to_backdrop() {
        let mut vdp = make_vdp(0, 0x40);
        let out = line(&mut vdp, 0);
        assert!(out.iter().all(|&c| c == 4), "colour 0 everywhere shows R7");
    }

    #[test]
    fn text_mode_has_side_borders() {
        let mut vdp = make_vdp(0, 0x50);
        vdp.write_control(0xF4);
        vdp.write_control(0x87);
        poke(&mut vdp, 0x1800, &[1]);
        poke(&mut vdp, 0x0008, &[0xFC]);

        let out = line(&mut vdp, 0);
        assert!(out[..8].iter().all(|&c| c == 4), "left border");
        assert_eq!(&out[8..14], &[15; 6]);
        assert!(out[248..].iter().all(|&c| c == 4), "right border");
    }

    #[test]
    fn sprite_drawn_over_background() {
        let mut vdp = make_vdp(0, 0x40);
        // Sprite 0 at line 10, x 20, pattern 0, colour 8; then terminator.
        poke(&mut vdp, 0x1B00, &[9, 20, 0, 8, 0xD0]);
        poke(&mut vdp, 0x3800, &[0x80]);

        let out = line(&mut vdp, 10);
        assert_eq!(out[20], 8);
        assert_eq!(out[21], 4);
        assert_eq!(PALETTE[usize::from(out[20])], 0xFFFC_5554);
    }

    #[test]
    fn fifth_sprite_sets_flag() {
        let mut vdp = make_vdp(0, 0x40);
        let mut table = Vec::new();
        for i in 0..5u8 {
            table.extend_from_slice(&[0, i * 16, 0, 15]);
        }
        table.push(0xD0);
        poke(&mut vdp, 0x1B00, &table);

        let _ = line(&mut vdp, 1);
        let status = vdp.read_status();
        assert_eq!(status & STATUS_5S, STATUS_5S);
        assert_eq!(status & 0x1F, 4, "fifth sprite number");
    }

    #[test]
    fn overlapping_sprites_set_coincidence() {
        let mut vdp = make_vdp(0, 0x40);
        poke(&mut vdp, 0x1B00, &[0, 10, 0, 15, 0, 12, 0, 6, 0xD0]);
        poke(&mut vdp, 0x3800, &[0xFF]);

        let out = line(&mut vdp, 1);
        assert_eq!(vdp.peek_status() & STATUS_C, STATUS_C);
        assert_eq!(out[12], 15, "sprite 0 has priority");
    }
}
