//! Scanline compositor: background, window and objects to palette indices.

use crate::memory::{OAM_SIZE, VRAM_BANK_SIZE};
use crate::renderer::SCREEN_WIDTH;

// Sprite limits
const MAX_SPRITES_PER_LINE: usize = 10;
const TOTAL_SPRITES: usize = 40;

// Window X position is clipped if greater than this value
const WINDOW_X_MAX: u8 = 166;

// VRAM layout constants (offsets into a bank)
const BG_MAP_0_BASE: usize = 0x1800;
const BG_MAP_1_BASE: usize = 0x1C00;
const TILE_DATA_0_BASE: usize = 0x0000;
const TILE_DATA_1_BASE: usize = 0x0800;

/// Index bit marking an object palette in CGB output.
pub const OBJECT_PALETTE_BIT: u8 = 0x20;

/// Register state and memory visible to the compositor for one line.
pub struct LineInput<'a> {
    pub cgb: bool,
    pub lcdc: u8,
    pub scy: u8,
    pub scx: u8,
    pub wy: u8,
    pub wx: u8,
    pub bgp: u8,
    pub obp0: u8,
    pub obp1: u8,
    pub vram: [&'a [u8; VRAM_BANK_SIZE]; 2],
    pub oam: &'a [u8; OAM_SIZE],
}

#[derive(Clone, Copy, Default)]
struct Sprite {
    x: i16,
    y: i16,
    tile: u8,
    flags: u8,
    oam_index: usize,
}

/// Per-pixel background facts objects need for priority resolution.
#[derive(Clone, Copy, Default)]
struct BgPixel {
    color_zero: bool,
    priority: bool,
}

fn dmg_shade(palette: u8, color_id: u8) -> u8 {
    (palette >> (color_id * 2)) & 0x03
}

fn tile_pixel(lo: u8, hi: u8, bit: usize) -> u8 {
    (((hi >> bit) & 1) << 1) | ((lo >> bit) & 1)
}

impl LineInput<'_> {
    fn tile_addr(&self, tile_index: u8) -> usize {
        if self.lcdc & 0x10 != 0 {
            TILE_DATA_0_BASE + tile_index as usize * 16
        } else {
            TILE_DATA_1_BASE + ((tile_index as i8 as i16 + 128) as usize) * 16
        }
    }

    /// Colour id and attribute-derived facts for one background/window
    /// pixel at map coordinates (`map_x`, `map_y`).
    fn map_pixel(&self, map_base: usize, map_x: usize, map_y: usize) -> (u8, u8, bool) {
        let entry = map_base + (map_y / 8) * 32 + map_x / 8;
        let tile_index = self.vram[0][entry];
        let mut tile_y = map_y % 8;
        let mut bit = 7 - map_x % 8;
        let mut palette = 0u8;
        let mut bank = 0usize;
        let mut priority = false;
        if self.cgb {
            let attr = self.vram[1][entry];
            palette = attr & 0x07;
            bank = ((attr >> 3) & 0x01) as usize;
            if attr & 0x20 != 0 {
                bit = map_x % 8;
            }
            if attr & 0x40 != 0 {
                tile_y = 7 - tile_y;
            }
            priority = attr & 0x80 != 0;
        }
        let addr = self.tile_addr(tile_index) + tile_y * 2;
        let color_id = tile_pixel(self.vram[bank][addr], self.vram[bank][addr + 1], bit);
        (color_id, palette, priority)
    }

    fn bg_index(&self, color_id: u8, palette: u8) -> u8 {
        if self.cgb {
            (palette << 2) | color_id
        } else {
            dmg_shade(self.bgp, color_id)
        }
    }

    fn sprites_on(&self, line: u8) -> ([Sprite; MAX_SPRITES_PER_LINE], usize) {
        let height: i16 = if self.lcdc & 0x04 != 0 { 16 } else { 8 };
        let mut sprites = [Sprite::default(); MAX_SPRITES_PER_LINE];
        let mut count = 0;
        for i in 0..TOTAL_SPRITES {
            if count >= MAX_SPRITES_PER_LINE {
                break;
            }
            let base = i * 4;
            let y = self.oam[base] as i16 - 16;
            if (line as i16) >= y && (line as i16) < y + height {
                sprites[count] = Sprite {
                    x: self.oam[base + 1] as i16 - 8,
                    y,
                    tile: self.oam[base + 2],
                    flags: self.oam[base + 3],
                    oam_index: i,
                };
                count += 1;
            }
        }
        if !self.cgb {
            // DMG priority: smaller X wins, ties go to the earlier OAM entry.
            sprites[..count].sort_by_key(|s| (s.x, s.oam_index));
        }
        (sprites, count)
    }
}

/// Composite `line` into palette indices. `window_line` is the window's
/// internal line counter and advances only on lines where the window shows.
pub fn render_scanline(input: &LineInput<'_>, line: u8, window_line: &mut u8) -> [u8; SCREEN_WIDTH] {
    let mut out = [0u8; SCREEN_WIDTH];
    let mut bg = [BgPixel {
        color_zero: true,
        priority: false,
    }; SCREEN_WIDTH];

    // On DMG LCDC bit 0 blanks background and window; on CGB it only drops
    // their priority over objects.
    let bg_enabled = input.cgb || input.lcdc & 0x01 != 0;
    let master_priority = !input.cgb || input.lcdc & 0x01 != 0;

    out.fill(input.bg_index(0, 0));

    if bg_enabled {
        let map = if input.lcdc & 0x08 != 0 {
            BG_MAP_1_BASE
        } else {
            BG_MAP_0_BASE
        };
        let map_y = line.wrapping_add(input.scy) as usize;
        for x in 0..SCREEN_WIDTH {
            let map_x = (x as u8).wrapping_add(input.scx) as usize;
            let (color_id, palette, priority) = input.map_pixel(map, map_x, map_y);
            out[x] = input.bg_index(color_id, palette);
            bg[x] = BgPixel {
                color_zero: color_id == 0,
                priority,
            };
        }

        if input.lcdc & 0x20 != 0 && line >= input.wy && input.wx <= WINDOW_X_MAX {
            let map = if input.lcdc & 0x40 != 0 {
                BG_MAP_1_BASE
            } else {
                BG_MAP_0_BASE
            };
            let start = input.wx as i16 - 7;
            let map_y = *window_line as usize;
            for x in start.max(0) as usize..SCREEN_WIDTH {
                let map_x = (x as i16 - start) as usize;
                let (color_id, palette, priority) = input.map_pixel(map, map_x, map_y);
                out[x] = input.bg_index(color_id, palette);
                bg[x] = BgPixel {
                    color_zero: color_id == 0,
                    priority,
                };
            }
            *window_line = window_line.wrapping_add(1);
        }
    }

    if input.lcdc & 0x02 != 0 {
        let height: i16 = if input.lcdc & 0x04 != 0 { 16 } else { 8 };
        let (sprites, count) = input.sprites_on(line);
        let mut drawn = [false; SCREEN_WIDTH];
        for s in &sprites[..count] {
            let tile = if height == 16 { s.tile & 0xFE } else { s.tile };
            let mut row = line as i16 - s.y;
            if s.flags & 0x40 != 0 {
                row = height - 1 - row;
            }
            let bank = if input.cgb {
                ((s.flags >> 3) & 0x01) as usize
            } else {
                0
            };
            let addr = tile as usize * 16 + row as usize * 2;
            let lo = input.vram[bank][addr];
            let hi = input.vram[bank][addr + 1];
            for px in 0..8usize {
                let sx = s.x + px as i16;
                if !(0..SCREEN_WIDTH as i16).contains(&sx) || drawn[sx as usize] {
                    continue;
                }
                let bit = if s.flags & 0x20 != 0 { px } else { 7 - px };
                let color_id = tile_pixel(lo, hi, bit);
                if color_id == 0 {
                    continue;
                }
                let sx = sx as usize;
                // The first opaque object pixel owns the column even when the
                // background then hides it.
                drawn[sx] = true;
                let behind = s.flags & 0x80 != 0 || (input.cgb && bg[sx].priority);
                if master_priority && behind && !bg[sx].color_zero {
                    continue;
                }
                out[sx] = if input.cgb {
                    OBJECT_PALETTE_BIT | ((s.flags & 0x07) << 2) | color_id
                } else if s.flags & 0x10 != 0 {
                    dmg_shade(input.obp1, color_id)
                } else {
                    dmg_shade(input.obp0, color_id)
                };
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input<'a>(
        vram: &'a [u8; VRAM_BANK_SIZE],
        vram1: &'a [u8; VRAM_BANK_SIZE],
        oam: &'a [u8; OAM_SIZE],
    ) -> LineInput<'a> {
        LineInput {
            cgb: false,
            lcdc: 0x91,
            scy: 0,
            scx: 0,
            wy: 0,
            wx: 0,
            bgp: 0xE4,
            obp0: 0xE4,
            obp1: 0x1B,
            vram: [vram, vram1],
            oam,
        }
    }

    #[test]
    fn background_uses_bgp_shades() {
        let mut vram = [0u8; VRAM_BANK_SIZE];
        let vram1 = [0u8; VRAM_BANK_SIZE];
        let oam = [0u8; OAM_SIZE];
        // Tile 0, row 0: colour 3 on the leftmost pixel, colour 1 next.
        vram[0] = 0xC0;
        vram[1] = 0x80;
        let mut regs = input(&vram, &vram1, &oam);
        let mut wl = 0;
        let line = render_scanline(&regs, 0, &mut wl);
        assert_eq!(&line[..3], &[3, 1, 0]);

        regs.bgp = 0x1B;
        let line = render_scanline(&regs, 0, &mut wl);
        assert_eq!(&line[..3], &[0, 2, 3]);
        assert_eq!(wl, 0);
    }

    #[test]
    fn sprite_draws_over_background_colour_zero() {
        let mut vram = [0u8; VRAM_BANK_SIZE];
        let vram1 = [0u8; VRAM_BANK_SIZE];
        let mut oam = [0u8; OAM_SIZE];
        // Tile 1 row 0: all pixels colour 2.
        vram[16] = 0x00;
        vram[17] = 0xFF;
        oam[0] = 16;
        oam[1] = 8 + 4;
        oam[2] = 1;
        let mut regs = input(&vram, &vram1, &oam);
        regs.lcdc = 0x93;
        let mut wl = 0;
        let line = render_scanline(&regs, 0, &mut wl);
        assert_eq!(line[3], 0);
        assert_eq!(&line[4..12], &[2; 8]);
        assert_eq!(line[12], 0);
    }

    #[test]
    fn window_advances_its_line_counter() {
        let vram = [0u8; VRAM_BANK_SIZE];
        let vram1 = [0u8; VRAM_BANK_SIZE];
        let oam = [0u8; OAM_SIZE];
        let mut regs = input(&vram, &vram1, &oam);
        regs.lcdc = 0xB1;
        regs.wy = 5;
        regs.wx = 7;
        let mut wl = 0;
        render_scanline(&regs, 4, &mut wl);
        assert_eq!(wl, 0);
        render_scanline(&regs, 5, &mut wl);
        render_scanline(&regs, 6, &mut wl);
        assert_eq!(wl, 2);
    }
}
