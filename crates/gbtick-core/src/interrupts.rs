//! Interrupt controller: IE/IF registers, priority and dispatch.

use crate::bus::BusContext;
use crate::cpu::{Cpu, CpuMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupt {
    VBlank,
    LcdStat,
    Timer,
    Serial,
    Joypad,
}

impl Interrupt {
    /// Dispatch order, highest priority first.
    pub const PRIORITY: [Interrupt; 5] = [
        Interrupt::VBlank,
        Interrupt::LcdStat,
        Interrupt::Timer,
        Interrupt::Serial,
        Interrupt::Joypad,
    ];

    pub const fn bit(self) -> u8 {
        match self {
            Interrupt::VBlank => 0x01,
            Interrupt::LcdStat => 0x02,
            Interrupt::Timer => 0x04,
            Interrupt::Serial => 0x08,
            Interrupt::Joypad => 0x10,
        }
    }

    // Interrupt vectors (gbdev.io/pandocs/Interrupts.html)
    pub const fn vector(self) -> u16 {
        match self {
            Interrupt::VBlank => 0x40,
            Interrupt::LcdStat => 0x48,
            Interrupt::Timer => 0x50,
            Interrupt::Serial => 0x58,
            Interrupt::Joypad => 0x60,
        }
    }

    /// Highest-priority source present in a 5-bit request mask.
    pub fn highest(mask: u8) -> Option<Interrupt> {
        Self::PRIORITY.into_iter().find(|i| mask & i.bit() != 0)
    }
}

/// The enable mask (IE, 0xFFFF) and request flags (IF, 0xFF0F).
#[derive(Debug, Default, Clone)]
pub struct InterruptController {
    enable: u8,
    flags: u8,
}

impl InterruptController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&mut self, interrupt: Interrupt) {
        self.flags |= interrupt.bit();
    }

    pub fn is_requested(&self, interrupt: Interrupt) -> bool {
        self.flags & interrupt.bit() != 0
    }

    pub fn acknowledge(&mut self, interrupt: Interrupt) {
        self.flags &= !interrupt.bit();
    }

    /// Sources both enabled and requested.
    pub fn pending(&self) -> u8 {
        self.enable & self.flags & 0x1F
    }

    pub fn read_if(&self) -> u8 {
        self.flags | 0xE0
    }

    pub fn write_if(&mut self, val: u8) {
        self.flags = val & 0x1F;
    }

    pub fn read_ie(&self) -> u8 {
        self.enable
    }

    pub fn write_ie(&mut self, val: u8) {
        self.enable = val;
    }
}

/// Access to the interrupt lines from the dispatcher's side of the bus.
pub trait InterruptLines {
    /// `IE & IF`, low five bits.
    fn pending_interrupts(&self) -> u8;
    fn acknowledge(&mut self, interrupt: Interrupt);
}

/// Runs after every instruction.
///
/// Nothing is dispatched to a locked CPU or to one in STOP; only a joypad
/// request releases STOP, and the caller handles that.
/// A CPU halted with IME clear is released without servicing anything.
/// Otherwise, with IME set, the highest-priority pending source is taken:
/// its request bit is cleared, IME drops, the CPU wakes, two internal cycles
/// pass, PC is pushed (high byte first) and execution continues at the
/// source's vector.
pub fn service<B>(cpu: &mut Cpu, bus: &mut B) -> Option<Interrupt>
where
    B: BusContext + InterruptLines,
{
    if matches!(cpu.mode(), CpuMode::Locked | CpuMode::Stopped) {
        return None;
    }
    if cpu.is_halted() && !cpu.ime {
        cpu.wake();
        return None;
    }
    if !cpu.ime {
        return None;
    }

    let interrupt = Interrupt::highest(bus.pending_interrupts())?;
    bus.acknowledge(interrupt);
    cpu.ime = false;
    cpu.wake();

    bus.tick_cycle();
    bus.tick_cycle();

    let pc = cpu.regs.pc;
    cpu.regs.sp = cpu.regs.sp.wrapping_sub(1);
    bus.write_cycle(cpu.regs.sp, (pc >> 8) as u8);
    cpu.regs.sp = cpu.regs.sp.wrapping_sub(1);
    bus.write_cycle(cpu.regs.sp, pc as u8);

    cpu.regs.pc = interrupt.vector();
    Some(interrupt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_picks_lowest_bit() {
        assert_eq!(Interrupt::highest(0x14), Some(Interrupt::Timer));
        assert_eq!(Interrupt::highest(0x1F), Some(Interrupt::VBlank));
        assert_eq!(Interrupt::highest(0x00), None);
    }

    #[test]
    fn if_reads_back_upper_bits_set() {
        let mut ic = InterruptController::new();
        ic.write_if(0xFF);
        assert_eq!(ic.read_if(), 0xFF);
        ic.acknowledge(Interrupt::Serial);
        assert_eq!(ic.read_if(), 0xF7);
        ic.write_ie(0x08);
        assert_eq!(ic.pending(), 0x00);
    }
}
