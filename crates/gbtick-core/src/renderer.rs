//! Presentation collaborator. The core hands it one scanline of palette
//! indices at a time and never looks at what it does with them.

pub const SCREEN_WIDTH: usize = 160;
pub const SCREEN_HEIGHT: usize = 144;

/// Region of the 160x144 frame, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl Rect {
    pub const fn scanline(line: usize) -> Self {
        Self {
            x: 0,
            y: line,
            width: SCREEN_WIDTH,
            height: 1,
        }
    }
}

pub trait Renderer {
    /// Present `pixels` (row-major, `rect.width * rect.height` indices).
    ///
    /// On DMG each index is a shade 0-3. On CGB bits 0-1 hold the colour,
    /// bits 2-4 the palette number and bit 5 is set for object palettes.
    fn present(&mut self, rect: Rect, pixels: &[u8]);

    /// The display was switched off.
    fn clear(&mut self);
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn present(&mut self, _rect: Rect, _pixels: &[u8]) {}

    fn clear(&mut self) {}
}
