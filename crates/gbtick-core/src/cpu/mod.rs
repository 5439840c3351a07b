//! SM83 (LR35902) CPU core.
//!
//! The CPU never counts cycles itself: every operation issues its memory
//! accesses and internal delays through a [`BusContext`], and the bus ticks
//! the clock once per call.

pub mod alu;
mod extended;
mod primary;
pub mod registers;

pub use extended::EXTENDED;
pub use primary::PRIMARY;
pub use registers::Registers;

use crate::bus::BusContext;
use crate::hardware::{DmgRevision, Model};

// Post-boot CPU state from gbdev.io/pandocs/Power_Up_State.html
const BOOT_PC: u16 = 0x0100;
const BOOT_SP: u16 = 0xFFFE;

const DMG0_BOOT: [u8; 8] = [0x01, 0x00, 0xFF, 0x13, 0x00, 0xC1, 0x84, 0x03];
const DMG_ABC_BOOT: [u8; 8] = [0x01, 0xB0, 0x00, 0x13, 0x00, 0xD8, 0x01, 0x4D];
const CGB_BOOT: [u8; 8] = [0x11, 0x80, 0x00, 0x00, 0x00, 0x08, 0x00, 0x7C];

/// Signature shared by every table entry: the CPU, the bus, and the opcode
/// byte itself so one handler can decode a whole register group.
pub type Execute = fn(&mut Cpu, &mut dyn BusContext, u8);

/// One entry of an opcode table.
#[derive(Clone, Copy)]
pub struct Opcode {
    pub mnemonic: &'static str,
    pub execute: Execute,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CpuMode {
    Running,
    Halted,
    /// STOP low-power state; left on a joypad request.
    Stopped,
    /// Hung on an illegal opcode. Only a reset leaves this state.
    Locked,
}

/// EI takes effect after the instruction that follows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ImeLatch {
    Idle,
    Requested,
    Armed,
}

pub struct Cpu {
    pub regs: Registers,
    pub ime: bool,
    mode: CpuMode,
    ime_latch: ImeLatch,
    lockup_reported: bool,
}

impl Cpu {
    /// Power-on state for executing a boot ROM from 0x0000.
    pub fn new() -> Self {
        Self {
            regs: Registers::default(),
            ime: false,
            mode: CpuMode::Running,
            ime_latch: ImeLatch::Idle,
            lockup_reported: false,
        }
    }

    /// Register state the boot ROM of `model` leaves behind.
    pub fn post_boot(model: Model) -> Self {
        let preset = match model {
            Model::Cgb => CGB_BOOT,
            Model::Dmg(DmgRevision::Rev0) => DMG0_BOOT,
            Model::Dmg(_) => DMG_ABC_BOOT,
        };
        let mut cpu = Self::new();
        let [a, f, b, c, d, e, h, l] = preset;
        cpu.regs.set_af(((a as u16) << 8) | f as u16);
        cpu.regs.set_bc(((b as u16) << 8) | c as u16);
        cpu.regs.set_de(((d as u16) << 8) | e as u16);
        cpu.regs.set_hl(((h as u16) << 8) | l as u16);
        cpu.regs.pc = BOOT_PC;
        cpu.regs.sp = BOOT_SP;
        cpu
    }

    pub fn mode(&self) -> CpuMode {
        self.mode
    }

    pub fn is_halted(&self) -> bool {
        self.mode == CpuMode::Halted
    }

    /// Leave HALT or STOP. A locked CPU stays locked.
    pub fn wake(&mut self) {
        if matches!(self.mode, CpuMode::Halted | CpuMode::Stopped) {
            self.mode = CpuMode::Running;
        }
    }

    /// Execute one instruction, or spend one cycle idling in HALT, STOP or
    /// lockup.
    pub fn step(&mut self, bus: &mut dyn BusContext) {
        let commit = self.ime_latch == ImeLatch::Armed;

        if self.mode != CpuMode::Running {
            bus.tick_cycle();
        } else {
            let opcode = self.fetch8(bus);
            let entry = &PRIMARY[opcode as usize];
            #[cfg(feature = "cpu-trace")]
            log::trace!(
                "{:04X}: {:02X} {}",
                self.regs.pc.wrapping_sub(1),
                opcode,
                entry.mnemonic
            );
            (entry.execute)(self, bus, opcode);
        }

        match self.ime_latch {
            ImeLatch::Armed if commit => {
                self.ime = true;
                self.ime_latch = ImeLatch::Idle;
            }
            ImeLatch::Requested => self.ime_latch = ImeLatch::Armed,
            _ => {}
        }
    }

    /// Formatted CPU state string for debugging.
    pub fn debug_state(&self) -> String {
        format!(
            "AF:{:04X} BC:{:04X} DE:{:04X} HL:{:04X} PC:{:04X} SP:{:04X} IME:{} {:?}",
            self.regs.af(),
            self.regs.bc(),
            self.regs.de(),
            self.regs.hl(),
            self.regs.pc,
            self.regs.sp,
            self.ime as u8,
            self.mode,
        )
    }

    #[inline]
    fn fetch8(&mut self, bus: &mut dyn BusContext) -> u8 {
        let val = bus.read_cycle(self.regs.pc);
        self.regs.pc = self.regs.pc.wrapping_add(1);
        val
    }

    #[inline]
    fn fetch16(&mut self, bus: &mut dyn BusContext) -> u16 {
        let lo = self.fetch8(bus) as u16;
        let hi = self.fetch8(bus) as u16;
        (hi << 8) | lo
    }

    fn push16(&mut self, bus: &mut dyn BusContext, val: u16) {
        self.regs.sp = self.regs.sp.wrapping_sub(1);
        bus.write_cycle(self.regs.sp, (val >> 8) as u8);
        self.regs.sp = self.regs.sp.wrapping_sub(1);
        bus.write_cycle(self.regs.sp, val as u8);
    }

    fn pop16(&mut self, bus: &mut dyn BusContext) -> u16 {
        let val = bus.read_word_cycle(self.regs.sp);
        self.regs.sp = self.regs.sp.wrapping_add(2);
        val
    }

    /// Operand selected by a 3-bit register field; index 6 reads (HL).
    fn read_operand(&mut self, bus: &mut dyn BusContext, index: u8) -> u8 {
        if index & 0x07 == 6 {
            bus.read_cycle(self.regs.hl())
        } else {
            self.regs.reg8(index)
        }
    }

    fn write_operand(&mut self, bus: &mut dyn BusContext, index: u8, val: u8) {
        if index & 0x07 == 6 {
            bus.write_cycle(self.regs.hl(), val);
        } else {
            self.regs.set_reg8(index, val);
        }
    }

    fn request_ime(&mut self) {
        if self.ime_latch == ImeLatch::Idle {
            self.ime_latch = ImeLatch::Requested;
        }
    }

    fn cancel_ime(&mut self) {
        self.ime = false;
        self.ime_latch = ImeLatch::Idle;
    }

    fn lock_up(&mut self, opcode: u8) {
        if !self.lockup_reported {
            log::error!(
                "illegal opcode {:02X} at {:04X}, CPU locked up",
                opcode,
                self.regs.pc.wrapping_sub(1)
            );
            self.lockup_reported = true;
        }
        self.mode = CpuMode::Locked;
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}
