//! Display controller: LCD registers and the mode/timing state machine.
//!
//! Line and mode are derived from the base-cycle count since the LCD was
//! switched on (see [`timing::position`]). The controller only remembers the
//! previous position so each mode boundary fires its side effects once.

pub mod render;
pub mod timing;

use crate::interrupts::{Interrupt, InterruptController};
use crate::memory::{Oam, Vram};
use crate::renderer::{Rect, Renderer, SCREEN_HEIGHT, SCREEN_WIDTH};

pub use timing::Mode;

const PAL_RAM_SIZE: usize = 0x40;
const PAL_INDEX_MASK: u8 = 0x3F;
const PAL_AUTO_INCREMENT_BIT: u8 = 0x80;

/// Writable bits of STAT (the interrupt source selects).
const STAT_WRITE_MASK: u8 = 0x78;
const STAT_HBLANK: u8 = 0x08;
const STAT_VBLANK: u8 = 0x10;
const STAT_OAM: u8 = 0x20;
const STAT_LYC: u8 = 0x40;

pub struct Display {
    cgb: bool,

    lcdc: u8,
    stat: u8,
    scy: u8,
    scx: u8,
    lyc: u8,
    bgp: u8,
    obp0: u8,
    obp1: u8,
    wy: u8,
    wx: u8,

    bcps: u8,
    bg_palette: [u8; PAL_RAM_SIZE],
    ocps: u8,
    obj_palette: [u8; PAL_RAM_SIZE],

    /// Base cycle at which the LCD was last switched on.
    origin: u64,
    /// Base cycle of the most recent step.
    now: u64,
    line: u8,
    mode: Mode,
    coincidence: bool,
    locked: bool,
    /// Internal window line counter
    window_line: u8,

    frame: Box<[u8; SCREEN_WIDTH * SCREEN_HEIGHT]>,
    frames: u64,
    renderer: Box<dyn Renderer + Send>,
}

impl Display {
    pub fn new(cgb: bool, renderer: Box<dyn Renderer + Send>) -> Self {
        Self {
            cgb,
            lcdc: 0,
            stat: 0,
            scy: 0,
            scx: 0,
            lyc: 0,
            bgp: 0,
            obp0: 0,
            obp1: 0,
            wy: 0,
            wx: 0,
            bcps: 0,
            bg_palette: [0xFF; PAL_RAM_SIZE],
            ocps: 0,
            obj_palette: [0; PAL_RAM_SIZE],
            origin: 0,
            now: 0,
            line: 0,
            mode: Mode::OamSearch,
            coincidence: false,
            locked: false,
            window_line: 0,
            frame: Box::new([0; SCREEN_WIDTH * SCREEN_HEIGHT]),
            frames: 0,
            renderer,
        }
    }

    pub fn enabled(&self) -> bool {
        self.lcdc & 0x80 != 0
    }

    pub fn line(&self) -> u8 {
        self.line
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn coincidence(&self) -> bool {
        self.coincidence
    }

    /// VRAM is unreachable by the CPU during pixel transfer.
    pub fn vram_locked(&self) -> bool {
        self.locked
    }

    /// OAM is unreachable by the CPU during pixel transfer.
    pub fn oam_locked(&self) -> bool {
        self.locked
    }

    /// Completed frames (v-blank entries) since power-on.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn frame(&self) -> &[u8; SCREEN_WIDTH * SCREEN_HEIGHT] {
        &self.frame
    }

    pub fn palettes(&self) -> (u8, u8, u8) {
        (self.bgp, self.obp0, self.obp1)
    }

    pub fn bg_palette_ram(&self) -> &[u8; PAL_RAM_SIZE] {
        &self.bg_palette
    }

    pub fn obj_palette_ram(&self) -> &[u8; PAL_RAM_SIZE] {
        &self.obj_palette
    }

    /// Swap the presentation collaborator, returning the previous one.
    pub fn replace_renderer(
        &mut self,
        renderer: Box<dyn Renderer + Send>,
    ) -> Box<dyn Renderer + Send> {
        std::mem::replace(&mut self.renderer, renderer)
    }

    pub fn read_register(&self, addr: u16) -> u8 {
        match addr {
            0xFF40 => self.lcdc,
            0xFF41 => {
                let coincidence = if self.coincidence { 0x04 } else { 0x00 };
                0x80 | (self.stat & STAT_WRITE_MASK) | coincidence | self.mode as u8
            }
            0xFF42 => self.scy,
            0xFF43 => self.scx,
            0xFF44 => self.line,
            0xFF45 => self.lyc,
            0xFF47 => self.bgp,
            0xFF48 => self.obp0,
            0xFF49 => self.obp1,
            0xFF4A => self.wy,
            0xFF4B => self.wx,
            0xFF68 if self.cgb => self.bcps | 0x40,
            0xFF69 if self.cgb => self.bg_palette[(self.bcps & PAL_INDEX_MASK) as usize],
            0xFF6A if self.cgb => self.ocps | 0x40,
            0xFF6B if self.cgb => self.obj_palette[(self.ocps & PAL_INDEX_MASK) as usize],
            _ => 0xFF,
        }
    }

    pub fn write_register(&mut self, addr: u16, val: u8) {
        match addr {
            0xFF40 => {
                let was_on = self.enabled();
                self.lcdc = val;
                match (was_on, self.enabled()) {
                    (true, false) => {
                        log::debug!("LCD off at LY={}", self.line);
                        self.switch_off();
                    }
                    (false, true) => {
                        log::debug!("LCD on");
                        self.switch_on();
                    }
                    _ => {}
                }
            }
            0xFF41 => self.stat = val & STAT_WRITE_MASK,
            0xFF42 => self.scy = val,
            0xFF43 => self.scx = val,
            // LY is read-only.
            0xFF44 => {}
            0xFF45 => self.lyc = val,
            0xFF47 => self.bgp = val,
            0xFF48 => self.obp0 = val,
            0xFF49 => self.obp1 = val,
            0xFF4A => self.wy = val,
            0xFF4B => self.wx = val,
            0xFF68 if self.cgb => self.bcps = val & (PAL_AUTO_INCREMENT_BIT | PAL_INDEX_MASK),
            0xFF69 if self.cgb => {
                self.bg_palette[(self.bcps & PAL_INDEX_MASK) as usize] = val;
                Self::step_palette_index(&mut self.bcps);
            }
            0xFF6A if self.cgb => self.ocps = val & (PAL_AUTO_INCREMENT_BIT | PAL_INDEX_MASK),
            0xFF6B if self.cgb => {
                self.obj_palette[(self.ocps & PAL_INDEX_MASK) as usize] = val;
                Self::step_palette_index(&mut self.ocps);
            }
            _ => {}
        }
    }

    fn step_palette_index(index: &mut u8) {
        if *index & PAL_AUTO_INCREMENT_BIT != 0 {
            *index = PAL_AUTO_INCREMENT_BIT | ((*index + 1) & PAL_INDEX_MASK);
        }
    }

    fn switch_off(&mut self) {
        self.line = 0;
        self.mode = Mode::OamSearch;
        self.locked = false;
        self.window_line = 0;
        self.frame.fill(0);
        self.renderer.clear();
    }

    fn switch_on(&mut self) {
        self.origin = self.now;
        self.line = 0;
        self.mode = Mode::OamSearch;
        self.window_line = 0;
    }

    /// Advance to base cycle `now`.
    pub fn step(
        &mut self,
        now: u64,
        vram: &Vram,
        oam: &Oam,
        interrupts: &mut InterruptController,
    ) {
        self.now = now;
        if !self.enabled() {
            return;
        }

        let (line, mode) = timing::position(now - self.origin);
        if mode != self.mode {
            self.enter_mode(line, mode, vram, oam, interrupts);
        }
        self.line = line;
        self.mode = mode;

        let coincidence = self.line == self.lyc;
        if coincidence && !self.coincidence && self.stat & STAT_LYC != 0 {
            interrupts.request(Interrupt::LcdStat);
        }
        self.coincidence = coincidence;
    }

    fn enter_mode(
        &mut self,
        line: u8,
        mode: Mode,
        vram: &Vram,
        oam: &Oam,
        interrupts: &mut InterruptController,
    ) {
        match mode {
            Mode::Transfer => {
                self.locked = true;
                self.composite(line, vram, oam);
            }
            Mode::HBlank => {
                self.locked = false;
                if self.stat & STAT_HBLANK != 0 {
                    interrupts.request(Interrupt::LcdStat);
                }
            }
            Mode::VBlank => {
                self.frames += 1;
                interrupts.request(Interrupt::VBlank);
                if self.stat & STAT_VBLANK != 0 {
                    interrupts.request(Interrupt::LcdStat);
                }
            }
            Mode::OamSearch => {
                if line == 0 {
                    self.window_line = 0;
                }
                if self.stat & STAT_OAM != 0 {
                    interrupts.request(Interrupt::LcdStat);
                }
            }
        }
    }

    fn composite(&mut self, line: u8, vram: &Vram, oam: &Oam) {
        let input = render::LineInput {
            cgb: self.cgb,
            lcdc: self.lcdc,
            scy: self.scy,
            scx: self.scx,
            wy: self.wy,
            wx: self.wx,
            bgp: self.bgp,
            obp0: self.obp0,
            obp1: self.obp1,
            vram: [vram.bank_data(0), vram.bank_data(1)],
            oam: oam.bytes(),
        };
        let pixels = render::render_scanline(&input, line, &mut self.window_line);
        let start = line as usize * SCREEN_WIDTH;
        self.frame[start..start + SCREEN_WIDTH].copy_from_slice(&pixels);
        self.renderer.present(Rect::scanline(line as usize), &pixels);
    }
}
