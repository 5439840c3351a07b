//! Line and mode as pure functions of elapsed base cycles.

use crate::clock::BASE_CYCLES_PER_FRAME;

// Timing constants per LCD mode in base machine cycles (T-cycles / 4)
pub const OAM_SEARCH_CYCLES: u64 = 20;
pub const TRANSFER_CYCLES: u64 = 43;
pub const HBLANK_CYCLES: u64 = 51;
pub const LINE_CYCLES: u64 = OAM_SEARCH_CYCLES + TRANSFER_CYCLES + HBLANK_CYCLES;

pub const VISIBLE_LINES: u8 = 144;
// Number of lines spent in VBlank
pub const VBLANK_LINES: u8 = 10;
pub const TOTAL_LINES: u8 = VISIBLE_LINES + VBLANK_LINES;

const _: () = assert!(LINE_CYCLES * TOTAL_LINES as u64 == BASE_CYCLES_PER_FRAME);

/// STAT mode field values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    HBlank = 0,
    VBlank = 1,
    OamSearch = 2,
    Transfer = 3,
}

/// Scanline and mode `elapsed` base cycles after the display was enabled.
pub fn position(elapsed: u64) -> (u8, Mode) {
    let in_frame = elapsed % BASE_CYCLES_PER_FRAME;
    let line = (in_frame / LINE_CYCLES) as u8;
    let dot = in_frame % LINE_CYCLES;
    let mode = if line >= VISIBLE_LINES {
        Mode::VBlank
    } else if dot < OAM_SEARCH_CYCLES {
        Mode::OamSearch
    } else if dot < OAM_SEARCH_CYCLES + TRANSFER_CYCLES {
        Mode::Transfer
    } else {
        Mode::HBlank
    };
    (line, mode)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_phases() {
        assert_eq!(position(0), (0, Mode::OamSearch));
        assert_eq!(position(19), (0, Mode::OamSearch));
        assert_eq!(position(20), (0, Mode::Transfer));
        assert_eq!(position(63), (0, Mode::HBlank));
        assert_eq!(position(113), (0, Mode::HBlank));
        assert_eq!(position(114), (1, Mode::OamSearch));
    }

    #[test]
    fn vblank_spans_ten_lines_and_wraps() {
        assert_eq!(position(144 * LINE_CYCLES), (144, Mode::VBlank));
        assert_eq!(position(BASE_CYCLES_PER_FRAME - 1), (153, Mode::VBlank));
        assert_eq!(position(BASE_CYCLES_PER_FRAME), (0, Mode::OamSearch));
        assert_eq!(position(7 * BASE_CYCLES_PER_FRAME + 20), (0, Mode::Transfer));
    }
}
