//! The bus context the CPU executes against.
//!
//! Every access advances the shared clock by exactly one machine cycle, so an
//! instruction's duration is the number of bus calls it makes.

use crate::clock::Clock;
use crate::interrupts::{Interrupt, InterruptLines};
use crate::mmu::Mmu;

pub trait BusContext {
    /// Read one byte and advance one machine cycle.
    fn read_cycle(&mut self, addr: u16) -> u8;

    /// Write one byte and advance one machine cycle.
    fn write_cycle(&mut self, addr: u16, val: u8);

    /// Advance one machine cycle without memory traffic.
    fn tick_cycle(&mut self);

    /// Second cycle of STOP. Resets DIV, performs a prepared CGB speed switch
    /// and returns whether one happened. Advances one machine cycle.
    fn stop_and_maybe_change_speed(&mut self) -> bool;

    /// Little-endian word read: low byte at `addr`, then high byte.
    fn read_word_cycle(&mut self, addr: u16) -> u16 {
        let lo = self.read_cycle(addr) as u16;
        let hi = self.read_cycle(addr.wrapping_add(1)) as u16;
        (hi << 8) | lo
    }

    /// Little-endian word write: low byte at `addr`, then high byte.
    fn write_word_cycle(&mut self, addr: u16, val: u16) {
        self.write_cycle(addr, val as u8);
        self.write_cycle(addr.wrapping_add(1), (val >> 8) as u8);
    }
}

/// Bus context over the live machine: the MMU and the clock it ticks.
pub struct SystemBus<'a> {
    mmu: &'a mut Mmu,
    clock: &'a mut Clock,
}

impl<'a> SystemBus<'a> {
    pub fn new(mmu: &'a mut Mmu, clock: &'a mut Clock) -> Self {
        Self { mmu, clock }
    }

    pub fn mmu(&mut self) -> &mut Mmu {
        self.mmu
    }
}

impl BusContext for SystemBus<'_> {
    #[inline]
    fn read_cycle(&mut self, addr: u16) -> u8 {
        let val = self.mmu.read(addr);
        self.tick_cycle();
        val
    }

    #[inline]
    fn write_cycle(&mut self, addr: u16, val: u8) {
        self.mmu.write(addr, val);
        self.tick_cycle();
    }

    #[inline]
    fn tick_cycle(&mut self) {
        let base = self.clock.tick();
        self.mmu.step_cycle(base, self.clock.base_cycles());
    }

    fn stop_and_maybe_change_speed(&mut self) -> bool {
        self.mmu.reset_div();
        let switched = self.mmu.take_speed_switch();
        if switched {
            self.clock.set_double_speed(!self.clock.double_speed());
            self.mmu.set_double_speed(self.clock.double_speed());
        }
        self.tick_cycle();
        switched
    }
}

impl InterruptLines for SystemBus<'_> {
    fn pending_interrupts(&self) -> u8 {
        self.mmu.interrupts.pending()
    }

    fn acknowledge(&mut self, interrupt: Interrupt) {
        self.mmu.interrupts.acknowledge(interrupt);
    }
}
