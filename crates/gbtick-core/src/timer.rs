use crate::interrupts::{Interrupt, InterruptController};

/// Divider/timer unit (DIV, TIMA, TMA, TAC). Stepped once per CPU machine
/// cycle, so it runs twice as fast in CGB double speed.
pub struct Timer {
    /// 16-bit internal divider counter. DIV register is the upper 8 bits.
    pub div: u16,
    /// Timer counter
    pub tima: u8,
    /// Timer modulo
    pub tma: u8,
    /// Timer control
    pub tac: u8,
    last_signal: bool,
    /// TIMA overflowed last cycle; it reads 0 until TMA is loaded.
    reload_pending: bool,
    /// TMA was loaded this cycle; writes to TIMA are ignored.
    reloading: bool,
}

impl Timer {
    pub fn new() -> Self {
        Self {
            div: 0,
            tima: 0,
            tma: 0,
            tac: 0,
            last_signal: false,
            reload_pending: false,
            reloading: false,
        }
    }

    pub fn read(&self, addr: u16) -> u8 {
        match addr {
            0xFF04 => (self.div >> 8) as u8,
            0xFF05 => self.tima,
            0xFF06 => self.tma,
            0xFF07 => self.tac | 0xF8,
            _ => 0xFF,
        }
    }

    pub fn write(&mut self, addr: u16, val: u8) {
        match addr {
            0xFF04 => self.reset_div(),
            0xFF05 => {
                if self.reloading {
                    return;
                }
                // Writing during the overflow cycle cancels the reload.
                self.reload_pending = false;
                self.tima = val;
            }
            0xFF06 => {
                self.tma = val;
                if self.reloading {
                    self.tima = val;
                }
            }
            0xFF07 => {
                self.tac = val & 0x07;
                self.update_signal();
            }
            _ => {}
        }
    }

    /// Advance one machine cycle (four divider ticks).
    pub fn step(&mut self, interrupts: &mut InterruptController) {
        self.reloading = false;
        if self.reload_pending {
            self.reload_pending = false;
            self.tima = self.tma;
            self.reloading = true;
            interrupts.request(Interrupt::Timer);
        }
        self.div = self.div.wrapping_add(4);
        self.update_signal();
    }

    /// DIV write or STOP: clear the divider, which can itself produce a
    /// falling edge on the selected bit.
    pub fn reset_div(&mut self) {
        self.div = 0;
        self.update_signal();
    }

    fn update_signal(&mut self) {
        let new = Self::signal_with(self.div, self.tac);
        if self.last_signal && !new {
            self.increment();
        }
        self.last_signal = new;
    }

    fn increment(&mut self) {
        if self.tima == 0xFF {
            self.tima = 0;
            self.reload_pending = true;
        } else {
            self.tima = self.tima.wrapping_add(1);
        }
    }

    fn timer_bit_with(div: u16, tac: u8) -> u8 {
        match tac & 0x03 {
            0x00 => ((div >> 9) & 1) as u8,
            0x01 => ((div >> 3) & 1) as u8,
            0x02 => ((div >> 5) & 1) as u8,
            _ => ((div >> 7) & 1) as u8,
        }
    }

    fn signal_with(div: u16, tac: u8) -> bool {
        tac & 0x04 != 0 && Self::timer_bit_with(div, tac) != 0
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tima_counts_at_selected_rate() {
        let mut ic = InterruptController::new();
        let mut timer = Timer::new();
        // 262144 Hz: one increment every 4 machine cycles.
        timer.write(0xFF07, 0x05);
        for _ in 0..16 {
            timer.step(&mut ic);
        }
        assert_eq!(timer.tima, 4);
    }

    #[test]
    fn overflow_reloads_one_cycle_late() {
        let mut ic = InterruptController::new();
        let mut timer = Timer::new();
        timer.write(0xFF06, 0xAB);
        timer.write(0xFF05, 0xFF);
        timer.write(0xFF07, 0x05);
        for _ in 0..4 {
            timer.step(&mut ic);
        }
        assert_eq!(timer.tima, 0x00);
        assert!(!ic.is_requested(Interrupt::Timer));

        timer.step(&mut ic);
        assert_eq!(timer.tima, 0xAB);
        assert!(ic.is_requested(Interrupt::Timer));
    }

    #[test]
    fn div_write_resets_divider() {
        let mut ic = InterruptController::new();
        let mut timer = Timer::new();
        for _ in 0..100 {
            timer.step(&mut ic);
        }
        assert_eq!(timer.read(0xFF04), 1);
        timer.write(0xFF04, 0x55);
        assert_eq!(timer.read(0xFF04), 0);
    }
}
