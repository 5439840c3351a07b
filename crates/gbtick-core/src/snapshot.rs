//! Value copies of machine state handed across threads.
//!
//! Nothing here borrows from the live machine; every field is copied at the
//! moment the snapshot is taken.

use crate::gameboy::GameBoy;
use crate::renderer::{SCREEN_HEIGHT, SCREEN_WIDTH};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CpuSnapshot {
    pub af: u16,
    pub bc: u16,
    pub de: u16,
    pub hl: u16,
    pub sp: u16,
    pub pc: u16,
    pub ime: bool,
    pub cycles: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PresentationSnapshot {
    pub frame_counter: u64,
    pub cgb: bool,

    pub bgp: u8,
    pub obp0: u8,
    pub obp1: u8,
    /// CGB background palette RAM (8 palettes x 4 colours, little-endian RGB555).
    pub bg_palette_ram: [u8; 0x40],
    /// CGB object palette RAM.
    pub obj_palette_ram: [u8; 0x40],

    pub vram0: Vec<u8>,
    pub vram1: Vec<u8>,
    pub oam: Vec<u8>,

    /// Last composited frame, one palette index per pixel, row-major.
    pub frame: Vec<u8>,

    pub cpu: CpuSnapshot,
}

impl PresentationSnapshot {
    pub fn capture(gb: &GameBoy) -> Self {
        let mmu = &gb.mmu;
        let display = &mmu.display;
        let (bgp, obp0, obp1) = display.palettes();
        let regs = &gb.cpu.regs;
        Self {
            frame_counter: display.frames(),
            cgb: mmu.is_cgb(),
            bgp,
            obp0,
            obp1,
            bg_palette_ram: *display.bg_palette_ram(),
            obj_palette_ram: *display.obj_palette_ram(),
            vram0: mmu.vram.bank_data(0).to_vec(),
            vram1: mmu.vram.bank_data(1).to_vec(),
            oam: mmu.oam.bytes().to_vec(),
            frame: display.frame().to_vec(),
            cpu: CpuSnapshot {
                af: regs.af(),
                bc: regs.bc(),
                de: regs.de(),
                hl: regs.hl(),
                sp: regs.sp,
                pc: regs.pc,
                ime: gb.cpu.ime,
                cycles: gb.clock.cycles(),
            },
        }
    }

    pub fn vram_bank(&self, bank: usize) -> &[u8] {
        match bank {
            0 => &self.vram0,
            _ => &self.vram1,
        }
    }

    pub fn obp(&self, which: u8) -> u8 {
        match which {
            0 => self.obp0,
            _ => self.obp1,
        }
    }

    pub fn pixel(&self, x: usize, y: usize) -> u8 {
        debug_assert!(x < SCREEN_WIDTH && y < SCREEN_HEIGHT);
        self.frame[y * SCREEN_WIDTH + x]
    }
}
